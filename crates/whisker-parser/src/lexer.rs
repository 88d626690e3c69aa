//! Lexical analyzer for template source.
//!
//! The [`Lexer`] is a state machine over a located character stream. Outside
//! of tags it produces [`SymbolKind::Text`] and [`SymbolKind::WhiteSpace`]
//! symbols; inside `{{ ... }}` it produces delimiters, prefixes, literals,
//! identifiers and punctuation. Symbols are produced on demand through the
//! [`Iterator`] implementation, so the parser only lexes as far as it reads.
//!
//! Lexical errors are attached to the symbol where they were detected and
//! are also collected on the lexer. An unterminated string literal ends the
//! literal and lexing continues; an unexpected character or a malformed
//! delimiter stops lexing, and the remainder of input is returned as a single
//! symbol that carries the error.

use log::trace;
use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, not, opt, peek, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    location::LineIndex,
    span::Span,
    symbol::{KEYWORDS, Symbol, SymbolKind},
};

/// Diagnostic information attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Parse a run of whitespace, line breaks included.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    take_while(1.., char::is_whitespace).parse_next(input)
}

/// Parse template text up to whitespace or an unescaped `{{`.
///
/// `\{` is kept verbatim and never starts a tag.
fn text<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    repeat(
        1..,
        alt((
            literal("\\{").void(),
            terminated('{', not('{')).void(),
            none_of(|c: char| c == '{' || c.is_whitespace()).void(),
        )),
    )
    .fold(|| (), |(), ()| ())
    .take()
    .parse_next(input)
}

/// Parse an identifier, classifying reserved words as keywords.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, (SymbolKind, &'a str)> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | '$' | '@')
        }),
    )
        .take()
        .map(|word: &str| {
            let kind = if KEYWORDS.contains(&word) {
                SymbolKind::Keyword
            } else {
                SymbolKind::Identifier
            };
            (kind, word)
        })
        .parse_next(input)
}

/// Parse an integer, hex integer or real literal.
fn numeric_literal<'a>(input: &mut Input<'a>) -> IResult<'a, (SymbolKind, &'a str)> {
    let hex = (
        alt(("0x", "0X")),
        take_while(1.., |c: char| c.is_ascii_hexdigit()),
    )
        .take()
        .map(|text| (SymbolKind::IntegerLiteral, text));

    let decimal = (
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .with_taken()
        .map(|((_, fraction, exponent), text)| {
            let kind = if fraction.is_some() || exponent.is_some() {
                SymbolKind::RealLiteral
            } else {
                SymbolKind::IntegerLiteral
            };
            (kind, text)
        });

    alt((hex, decimal)).parse_next(input)
}

/// Parse a single or double quoted literal, quotes included.
///
/// A backslash escapes the quote character or another backslash. Reaching a
/// line break or the end of input before the closing quote is a cut error.
fn quoted_literal<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    let quote = peek(one_of(['"', '\''])).parse_next(input)?;

    let escape = ('\\', opt(one_of([quote, '\\']))).void();
    let plain = none_of([quote, '\\', '\n', '\r']).void();

    (
        quote,
        cut_err(terminated(
            repeat(0.., alt((escape, plain))).fold(|| (), |(), ()| ()),
            quote,
        ))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "Unterminated string literal",
        }),
    )
        .take()
        .parse_next(input)
}

/// Parse single and compound punctuation inside a tag.
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, SymbolKind> {
    alt((
        literal("../").value(SymbolKind::ParentContext),
        literal("./").value(SymbolKind::CurrentContext),
        '.'.value(SymbolKind::Dot),
        '/'.value(SymbolKind::Slash),
        '@'.value(SymbolKind::At),
        '='.value(SymbolKind::Assign),
        '('.value(SymbolKind::OpenParenthesis),
        ')'.value(SymbolKind::CloseParenthesis),
    ))
    .parse_next(input)
}

/// Parse one token of tag content.
fn tag_token<'a>(input: &mut Input<'a>) -> IResult<'a, (SymbolKind, &'a str)> {
    alt((
        whitespace.map(|text| (SymbolKind::WhiteSpace, text)),
        quoted_literal.map(|text| (SymbolKind::StringLiteral, text)),
        numeric_literal,
        identifier,
        punctuation.with_taken(),
    ))
    .parse_next(input)
}

/// Parse the body of a comment tag.
///
/// `{{!-- ... --}}` runs to the first `--}}` and keeps both `--` markers;
/// `{{! ... }}` runs to the first `}}`.
fn comment<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    cut_err(alt((
        terminated("--", peek("}}")),
        ("--", take_until(0.., "--}}"), "--").take(),
        take_until(0.., "}}"),
    )))
    .context(LexerDiagnostic {
        code: ErrorCode::E005,
        message: "Unterminated comment",
    })
    .parse_next(input)
}

/// Lexer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Plain template text.
    Data,
    /// At `{{` or `{{{`.
    TagOpen,
    /// Directly after an opening delimiter, where prefixes are recognized.
    TagStart { raw: bool },
    /// Inside a tag.
    TagContent { raw: bool },
    /// After `{{!`.
    Comment,
    /// At `}}` or `}}}`.
    TagClose { raw: bool },
    /// No more symbols will be produced.
    Stopped,
}

/// A pull-based template lexer.
///
/// # Example
///
/// ```
/// # use whisker_parser::lexer::Lexer;
/// # use whisker_parser::SymbolKind;
///
/// let kinds: Vec<SymbolKind> = Lexer::new("Hi {{name}}").map(|s| s.kind()).collect();
/// assert_eq!(
///     kinds,
///     [
///         SymbolKind::Text,
///         SymbolKind::WhiteSpace,
///         SymbolKind::OpenTag,
///         SymbolKind::Identifier,
///         SymbolKind::CloseTag,
///     ]
/// );
/// ```
pub struct Lexer<'src> {
    source: &'src str,
    input: Input<'src>,
    lines: LineIndex<'src>,
    state: State,
    diagnostics: DiagnosticCollector,
}

impl<'src> Lexer<'src> {
    /// Create a lexer positioned at the start of `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            input: LocatingSlice::new(source),
            lines: LineIndex::new(source),
            state: State::Data,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Returns `true` if any lexical error has been recorded so far.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Consume the lexer, returning every diagnostic it recorded.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_diagnostics()
    }

    /// Line index of the source being lexed.
    pub fn lines(&self) -> &LineIndex<'src> {
        &self.lines
    }

    fn offset(&self) -> usize {
        self.input.current_token_start()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.chars().next()
    }

    fn symbol(&self, start: usize, content: &str, kind: SymbolKind) -> Symbol {
        Symbol::new(self.lines.location(start), content, kind)
    }

    /// Run the current state once, possibly producing a symbol.
    fn step(&mut self) -> Option<Symbol> {
        match self.state {
            State::Data => self.data(),
            State::TagOpen => self.tag_open(),
            State::TagStart { raw } => self.tag_start(raw),
            State::TagContent { raw } => self.tag_content(raw),
            State::Comment => self.comment(),
            State::TagClose { raw } => self.tag_close(raw),
            State::Stopped => None,
        }
    }

    fn data(&mut self) -> Option<Symbol> {
        if self.input.is_empty() {
            self.state = State::Stopped;
            return None;
        }
        if self.input.starts_with("{{") {
            self.state = State::TagOpen;
            return None;
        }

        let start = self.offset();
        let parsed = alt((
            whitespace.map(|text| (SymbolKind::WhiteSpace, text)),
            text.map(|text| (SymbolKind::Text, text)),
        ))
        .parse_next(&mut self.input);

        match parsed {
            Ok((kind, content)) => Some(self.symbol(start, content, kind)),
            Err(_) => self.stop(start, 1, SymbolKind::Text, ErrorCode::E002, "Unexpected text"),
        }
    }

    fn tag_open(&mut self) -> Option<Symbol> {
        let start = self.offset();
        let parsed: IResult<'_, _> = alt((
            literal("{{{").value(SymbolKind::RawOpenTag),
            literal("{{").value(SymbolKind::OpenTag),
        ))
        .with_taken()
        .parse_next(&mut self.input);

        match parsed {
            Ok((kind, content)) => {
                self.state = State::TagStart {
                    raw: kind == SymbolKind::RawOpenTag,
                };
                Some(self.symbol(start, content, kind))
            }
            Err(_) => self.stop(start, 1, SymbolKind::Text, ErrorCode::E003, "Expected '{'"),
        }
    }

    fn tag_start(&mut self, raw: bool) -> Option<Symbol> {
        let start = self.offset();
        let Some(c) = self.peek_char() else {
            self.state = State::TagContent { raw };
            return None;
        };

        let kind = match c {
            '~' => SymbolKind::Tilde,
            '!' => SymbolKind::Bang,
            '>' => SymbolKind::RightArrow,
            '^' => SymbolKind::Negate,
            '#' => SymbolKind::Hash,
            '&' => SymbolKind::Ampersand,
            _ => {
                self.state = State::TagContent { raw };
                return None;
            }
        };

        if raw && matches!(c, '!' | '>' | '^' | '#') {
            let message = format!("Character '{c}' is not allowed in a raw tag");
            return self.stop(start, 1, SymbolKind::Text, ErrorCode::E004, message);
        }

        let content = self.input.next_slice(c.len_utf8());
        self.state = match kind {
            SymbolKind::Tilde => State::TagStart { raw },
            SymbolKind::Bang => State::Comment,
            _ => State::TagContent { raw },
        };
        Some(self.symbol(start, content, kind))
    }

    fn tag_content(&mut self, raw: bool) -> Option<Symbol> {
        let start = self.offset();
        match self.peek_char() {
            None => {
                return self.stop(start, 0, SymbolKind::Text, ErrorCode::E003, "Expected '}'");
            }
            Some('~') => {
                let content = self.input.next_slice(1);
                self.state = State::TagClose { raw };
                return Some(self.symbol(start, content, SymbolKind::Tilde));
            }
            Some('}') => {
                self.state = State::TagClose { raw };
                return None;
            }
            Some(_) => {}
        }

        match tag_token.parse_next(&mut self.input) {
            Ok((kind, content)) => Some(self.symbol(start, content, kind)),
            Err(ErrMode::Cut(err)) => {
                // The literal ends where the error was detected; lexing resumes there.
                let end = self.offset();
                let diagnostic = self.diagnostic(err, start, end);
                self.diagnostics.emit(diagnostic.clone());
                let content = &self.source[start..end];
                Some(
                    self.symbol(start, content, SymbolKind::StringLiteral)
                        .with_error(diagnostic),
                )
            }
            Err(_) => {
                let c = self.peek_char().unwrap_or_default();
                let message = format!("Unexpected character: {c}");
                self.stop(start, c.len_utf8(), SymbolKind::Text, ErrorCode::E002, message)
            }
        }
    }

    fn comment(&mut self) -> Option<Symbol> {
        let start = self.offset();
        match comment.parse_next(&mut self.input) {
            Ok(content) => {
                self.state = State::TagClose { raw: false };
                Some(self.symbol(start, content, SymbolKind::Comment))
            }
            Err(_) => self.stop(
                start,
                0,
                SymbolKind::Comment,
                ErrorCode::E005,
                "Unterminated comment",
            ),
        }
    }

    fn tag_close(&mut self, raw: bool) -> Option<Symbol> {
        let start = self.offset();
        let (delimiter, kind) = if raw {
            ("}}}", SymbolKind::RawCloseTag)
        } else {
            ("}}", SymbolKind::CloseTag)
        };

        let parsed: IResult<'_, &str> = literal(delimiter).parse_next(&mut self.input);
        match parsed {
            Ok(content) => {
                self.state = State::Data;
                Some(self.symbol(start, content, kind))
            }
            Err(_) => self.stop(start, 1, SymbolKind::Text, ErrorCode::E003, "Expected '}'"),
        }
    }

    /// Record a fatal lexical error and stop.
    ///
    /// The remainder of input, if any, becomes one symbol of `kind` carrying
    /// the error.
    fn stop(
        &mut self,
        start: usize,
        len: usize,
        kind: SymbolKind,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Option<Symbol> {
        let end = (start + len).min(self.source.len());
        let diagnostic = Diagnostic::error(message)
            .with_code(code)
            .with_label(Span::new(start..end), code.description())
            .with_location(self.lines.location(start));
        self.diagnostics.emit(diagnostic.clone());
        self.state = State::Stopped;

        let rest = self.input.next_slice(self.input.eof_offset());
        if rest.is_empty() {
            None
        } else {
            Some(self.symbol(start, rest, kind).with_error(diagnostic))
        }
    }

    /// Convert a winnow context error into a diagnostic covering `start..end`.
    fn diagnostic(
        &self,
        err: ContextError<LexerDiagnostic>,
        start: usize,
        end: usize,
    ) -> Diagnostic {
        let (code, message) = err
            .context()
            .next()
            .map_or((ErrorCode::E002, "Unexpected character"), |ctx| {
                (ctx.code, ctx.message)
            });
        Diagnostic::error(message)
            .with_code(code)
            .with_label(Span::new(start..end), code.description())
            .with_location(self.lines.location(start))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        while self.state != State::Stopped {
            if let Some(symbol) = self.step() {
                trace!(symbol:?; "Lexed symbol");
                return Some(symbol);
            }
        }
        None
    }
}

/// Lex a whole template, returning its symbols and lexical diagnostics.
pub fn tokenize(source: &str) -> (Vec<Symbol>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(source);
    let symbols = lexer.by_ref().collect();
    (symbols, lexer.into_diagnostics())
}
