//! Lexical symbols produced by the [`Lexer`](crate::lexer::Lexer).

use std::fmt;

use crate::{error::Diagnostic, location::SourceLocation, span::Span};

/// Words that lex as [`SymbolKind::Keyword`] instead of identifiers.
pub const KEYWORDS: &[&str] = &[
    "if", "elseif", "else", "unless", "each", "with", "is", "elseis", "this",
];

/// Classification of a lexical symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Literal template text outside of tags.
    Text,
    /// A run of whitespace, including line breaks.
    WhiteSpace,
    /// Body of a comment tag, including `--` markers of the long form.
    Comment,

    /// `{{`
    OpenTag,
    /// `{{{`
    RawOpenTag,
    /// `}}`
    CloseTag,
    /// `}}}`
    RawCloseTag,

    Identifier,
    Keyword,
    IntegerLiteral,
    RealLiteral,
    /// A quoted literal, quotes included.
    StringLiteral,

    /// `~`
    Tilde,
    /// `#`
    Hash,
    /// `!`
    Bang,
    /// `>`
    RightArrow,
    /// `^`
    Negate,
    /// `&`
    Ampersand,
    /// `@`
    At,
    /// `=`
    Assign,
    /// `.`
    Dot,
    /// `/`
    Slash,
    /// `(`
    OpenParenthesis,
    /// `)`
    CloseParenthesis,
    /// `./`
    CurrentContext,
    /// `../`
    ParentContext,
}

impl SymbolKind {
    /// Returns `true` for the two tag opening delimiters.
    pub fn is_open_tag(self) -> bool {
        matches!(self, SymbolKind::OpenTag | SymbolKind::RawOpenTag)
    }

    /// Returns `true` for the two tag closing delimiters.
    pub fn is_close_tag(self) -> bool {
        matches!(self, SymbolKind::CloseTag | SymbolKind::RawCloseTag)
    }
}

/// A lexical unit: where it starts, its exact source text and its kind.
///
/// Lexical errors are attached to the symbol where they were detected.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    start: SourceLocation,
    content: String,
    kind: SymbolKind,
    errors: Vec<Diagnostic>,
}

impl Symbol {
    pub fn new(start: SourceLocation, content: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            start,
            content: content.into(),
            kind,
            errors: Vec::new(),
        }
    }

    pub(crate) fn with_error(mut self, error: Diagnostic) -> Self {
        self.errors.push(error);
        self
    }

    pub fn start(&self) -> SourceLocation {
        self.start
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Errors detected while lexing this symbol.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Byte range of this symbol in the source.
    pub fn span(&self) -> Span {
        let start = self.start.offset();
        Span::new(start..start + self.content.len())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} at {}", self.kind, self.content, self.start)
    }
}
