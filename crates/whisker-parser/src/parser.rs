//! Parser from lexical symbols to a [`Document`] tree.
//!
//! The parser pulls symbols from the [`Lexer`] through a small lookahead
//! buffer and keeps all of its working state in a [`ParserState`]: the stack
//! of open blocks, the symbols accepted but not yet emitted as a span, the
//! tree arena and the diagnostics collected so far. Grammar functions take
//! that state explicitly.
//!
//! Accepted symbols accumulate until they are emitted as one span of the
//! innermost open block. Blocks become immutable tree nodes when they are
//! closed. Structural problems are recorded as diagnostics and parsing
//! continues; any error makes the [`ParseResult`] unsuccessful.

use std::{collections::VecDeque, sync::Arc};

use log::{debug, trace};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    lexer::Lexer,
    span::Span,
    symbol::{Symbol, SymbolKind},
    tags::{TagDescriptor, TagRegistry},
    tree::{BlockKind, Document, NodeId, SpanKind, TreeBuilder},
};

/// Symbols that end the name of an expression.
const NAME_END: &[SymbolKind] = &[
    SymbolKind::WhiteSpace,
    SymbolKind::CloseTag,
    SymbolKind::RawCloseTag,
    SymbolKind::Tilde,
    SymbolKind::OpenParenthesis,
    SymbolKind::CloseParenthesis,
];

/// Symbols that end the argument list of an expression.
const BODY_END: &[SymbolKind] = &[
    SymbolKind::CloseTag,
    SymbolKind::RawCloseTag,
    SymbolKind::Tilde,
    SymbolKind::CloseParenthesis,
];

/// Symbols that end a positional argument.
const ARGUMENT_END: &[SymbolKind] = &[
    SymbolKind::Assign,
    SymbolKind::WhiteSpace,
    SymbolKind::CloseTag,
    SymbolKind::RawCloseTag,
    SymbolKind::Tilde,
    SymbolKind::OpenParenthesis,
    SymbolKind::CloseParenthesis,
];

/// Outcome of parsing a template.
#[derive(Debug)]
pub struct ParseResult {
    success: bool,
    tree: Option<Document>,
    errors: Vec<Diagnostic>,
}

impl ParseResult {
    /// Returns `true` if no error was recorded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The parsed tree; only present on success.
    pub fn tree(&self) -> Option<&Document> {
        self.tree.as_ref()
    }

    /// All diagnostics, warnings included, in source order.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Convert into the tree, or a [`ParseError`] carrying every diagnostic.
    pub fn into_result(self) -> Result<Document, ParseError> {
        match self.tree {
            Some(tree) if self.success => Ok(tree),
            _ => Err(ParseError::new(self.errors)),
        }
    }
}

/// Lookahead buffer over the lexer.
struct Cursor<'src> {
    lexer: Lexer<'src>,
    buffer: VecDeque<Symbol>,
}

impl<'src> Cursor<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            buffer: VecDeque::new(),
        }
    }

    fn peek(&mut self, n: usize) -> Option<&Symbol> {
        while self.buffer.len() <= n {
            let symbol = self.lexer.next()?;
            self.buffer.push_back(symbol);
        }
        self.buffer.get(n)
    }

    fn peek_kind(&mut self, n: usize) -> Option<SymbolKind> {
        self.peek(n).map(Symbol::kind)
    }

    fn next(&mut self) -> Option<Symbol> {
        self.peek(0)?;
        self.buffer.pop_front()
    }
}

/// A block that is still open.
struct Frame {
    kind: BlockKind,
    name: Option<String>,
    descriptor: Option<Arc<TagDescriptor>>,
    children: Vec<NodeId>,
    /// Source of the tag that opened the block.
    opened: Span,
}

/// Everything the grammar functions read and write.
struct ParserState<'src, 'reg> {
    cursor: Cursor<'src>,
    registry: &'reg TagRegistry,
    stack: Vec<Frame>,
    pending: Vec<Symbol>,
    tree: TreeBuilder,
    diagnostics: DiagnosticCollector,
    end: usize,
}

impl<'src, 'reg> ParserState<'src, 'reg> {
    fn new(source: &'src str, registry: &'reg TagRegistry) -> Self {
        Self {
            cursor: Cursor::new(source),
            registry,
            stack: vec![Frame {
                kind: BlockKind::Document,
                name: None,
                descriptor: None,
                children: Vec::new(),
                opened: Span::default(),
            }],
            pending: Vec::new(),
            tree: TreeBuilder::new(),
            diagnostics: DiagnosticCollector::new(),
            end: source.len(),
        }
    }

    fn current_kind(&mut self) -> Option<SymbolKind> {
        self.cursor.peek_kind(0)
    }

    fn at(&mut self, kind: SymbolKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_any(&mut self, kinds: &[SymbolKind]) -> bool {
        self.current_kind().is_some_and(|kind| kinds.contains(&kind))
    }

    fn is_at_end(&mut self) -> bool {
        self.current_kind().is_none()
    }

    /// Byte offset of the current symbol, or the end of input.
    fn offset(&mut self) -> usize {
        let end = self.end;
        self.cursor
            .peek(0)
            .map_or(end, |symbol| symbol.start().offset())
    }

    fn accept(&mut self) {
        if let Some(symbol) = self.cursor.next() {
            self.pending.push(symbol);
        }
    }

    fn accept_while(&mut self, kinds: &[SymbolKind]) {
        while self.at_any(kinds) {
            self.accept();
        }
    }

    fn accept_until(&mut self, kinds: &[SymbolKind]) {
        while !self.is_at_end() && !self.at_any(kinds) {
            self.accept();
        }
    }

    /// Accept and emit the current symbol if it is of `kind`.
    fn optional(&mut self, kind: SymbolKind, span_kind: SpanKind) -> bool {
        if self.at(kind) {
            self.accept();
            self.output(span_kind);
            true
        } else {
            false
        }
    }

    /// Emit the pending symbols as a span of the innermost open block.
    fn output(&mut self, kind: SpanKind) -> Option<NodeId> {
        if self.pending.is_empty() {
            return None;
        }
        let symbols = std::mem::take(&mut self.pending);
        let id = self.tree.push_span(kind, symbols);
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(id);
        }
        Some(id)
    }

    fn start_block(&mut self, kind: BlockKind) {
        let start = self.offset();
        trace!(kind:?, offset = start; "Start block");
        self.stack.push(Frame {
            kind,
            name: None,
            descriptor: None,
            children: Vec::new(),
            opened: Span::new(start..start),
        });
    }

    /// Close the innermost block; the document root is never closed here.
    ///
    /// An expression body with no children is discarded.
    fn end_block(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        trace!(kind:? = frame.kind, name:? = frame.name; "End block");
        if frame.kind == BlockKind::ExpressionBody && frame.children.is_empty() {
            return;
        }
        let id = self
            .tree
            .push_block(frame.kind, frame.name, frame.descriptor, frame.children);
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(id);
        }
    }

    /// Fold the innermost block's children into its parent.
    fn merge_with_parent(&mut self) {
        if self.stack.len() < 3 {
            return;
        }
        if let Some(frame) = self.stack.pop()
            && let Some(parent) = self.stack.last_mut()
        {
            parent.children.extend(frame.children);
        }
    }

    fn frame(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    /// Content of the innermost block's last child, if it is a span.
    fn last_span_content(&self) -> Option<&str> {
        let id = *self.stack.last()?.children.last()?;
        self.tree.span(id).map(|span| span.content())
    }

    fn span_content(&self, id: Option<NodeId>) -> Option<String> {
        id.and_then(|id| self.tree.span(id))
            .map(|span| span.content().to_string())
    }

    fn report(&mut self, diagnostic: Diagnostic, at: usize) {
        let location = self.cursor.lexer.lines().location(at);
        self.diagnostics.emit(diagnostic.with_location(location));
    }

    /// Require the current symbol to be `kind`.
    ///
    /// At the end of input nothing is reported; the lexer has already
    /// recorded why the tag is incomplete.
    fn expect(&mut self, kind: SymbolKind, expected: &str) {
        let Some(symbol) = self.cursor.peek(0) else {
            return;
        };
        if symbol.kind() == kind
            || (kind == SymbolKind::CloseTag && symbol.kind().is_close_tag())
        {
            self.accept();
            self.output(SpanKind::MetaCode);
            return;
        }

        let span = symbol.span();
        let message = format!("Expected '{expected}' but found '{}'", symbol.content());
        self.report(
            Diagnostic::error(message)
                .with_code(ErrorCode::E102)
                .with_label(span, format!("expected '{expected}'")),
            span.start(),
        );
    }

    fn finish(mut self) -> ParseResult {
        while self.stack.len() > 1 {
            if let Some(frame) = self.stack.last() {
                let name = frame.name.clone().unwrap_or_default();
                let opened = frame.opened;
                self.report(
                    Diagnostic::error(format!("Unclosed block '{name}'"))
                        .with_code(ErrorCode::E101)
                        .with_label(opened, "block opened here")
                        .with_help(format!("add {{{{/{name}}}}} to close the block")),
                    opened.start(),
                );
            }
            self.end_block();
        }

        let Self {
            cursor,
            mut stack,
            mut tree,
            mut diagnostics,
            ..
        } = self;

        let children = stack.pop().map(|frame| frame.children).unwrap_or_default();
        let root = tree.push_block(BlockKind::Document, None, None, children);
        let document = tree.finish(root);

        diagnostics.extend(cursor.lexer.into_diagnostics());
        let success = !diagnostics.has_errors();
        let errors = diagnostics.into_diagnostics();
        debug!(nodes = document.len(), diagnostics = errors.len(), success = success; "Parsed template");

        ParseResult {
            success,
            tree: success.then_some(document),
            errors,
        }
    }
}

/// Parse a template into a [`Document`].
///
/// Block tag names are resolved against `registry`.
pub fn parse(source: &str, registry: &TagRegistry) -> ParseResult {
    let mut state = ParserState::new(source, registry);
    while !state.is_at_end() {
        parse_block(&mut state);
    }
    state.finish()
}

/// Parse leading whitespace, text, and at most one tag.
fn parse_block(state: &mut ParserState<'_, '_>) {
    state.accept_while(&[SymbolKind::WhiteSpace]);
    state.output(SpanKind::WhiteSpace);

    state.accept_until(&[
        SymbolKind::OpenTag,
        SymbolKind::RawOpenTag,
        SymbolKind::WhiteSpace,
    ]);
    state.output(SpanKind::Text);

    if state.current_kind().is_some_and(SymbolKind::is_open_tag) {
        at_tag(state);
    }
}

/// Dispatch on the symbol after the opening delimiter and optional `~`.
fn at_tag(state: &mut ParserState<'_, '_>) {
    let prefix = if state.cursor.peek_kind(1) == Some(SymbolKind::Tilde) {
        2
    } else {
        1
    };

    match state.cursor.peek_kind(prefix) {
        Some(SymbolKind::Hash) => at_block_tag(state, SymbolKind::Hash),
        Some(SymbolKind::Bang) => at_comment_tag(state),
        Some(SymbolKind::Slash) => at_block_end_tag(state),
        Some(SymbolKind::RightArrow) => at_partial_tag(state),
        Some(SymbolKind::Negate) => {
            let closes = match state.cursor.peek_kind(prefix + 1) {
                Some(SymbolKind::Tilde) => state
                    .cursor
                    .peek_kind(prefix + 2)
                    .is_some_and(SymbolKind::is_close_tag),
                kind => kind.is_some_and(SymbolKind::is_close_tag),
            };
            if closes {
                at_expression_tag(state, Some((SymbolKind::Negate, SpanKind::Expression)));
            } else {
                at_block_tag(state, SymbolKind::Negate);
            }
        }
        Some(SymbolKind::Ampersand) => {
            at_expression_tag(state, Some((SymbolKind::Ampersand, SpanKind::MetaCode)));
        }
        _ => at_expression_tag(state, None),
    }
}

/// Emit the opening delimiter and an optional `~`.
fn open_tag(state: &mut ParserState<'_, '_>) {
    state.accept();
    state.output(SpanKind::MetaCode);
    state.optional(SymbolKind::Tilde, SpanKind::MetaCode);
}

/// Emit an optional `~` and the closing delimiter.
fn close_tag(state: &mut ParserState<'_, '_>) {
    state.optional(SymbolKind::Tilde, SpanKind::MetaCode);
    state.expect(SymbolKind::CloseTag, "}}");
}

/// `{{#name args}}` or `{{^name}}`: opens a Tag block.
fn at_block_tag(state: &mut ParserState<'_, '_>, prefix: SymbolKind) {
    let parent_name = state.stack.last().and_then(|frame| frame.name.clone());
    let start = state.offset();

    state.start_block(BlockKind::Tag);
    state.start_block(BlockKind::TagElement);
    open_tag(state);
    state.optional(prefix, SpanKind::MetaCode);
    at_expression_body(state);
    let name = state
        .frame()
        .and_then(|frame| frame.name.clone())
        .unwrap_or_default();
    close_tag(state);
    state.end_block();

    let opened = Span::new(start..state.offset());
    if name == "elseif" && parent_name.as_deref() == Some("if") {
        trace!("Merging elseif into enclosing if");
        state.merge_with_parent();
    } else {
        let descriptor = state.registry.resolve(&name);
        trace!(tag = name.as_str(), renderer = descriptor.renderer(); "Resolved tag");
        let has_child_content = descriptor.has_child_content();
        if let Some(frame) = state.frame() {
            frame.name = Some(name);
            frame.descriptor = Some(descriptor);
            frame.opened = opened;
        }
        // Complete after its opening tag.
        if !has_child_content {
            state.end_block();
            return;
        }
    }

    parse_block(state);
}

/// `{{/name}}`: closes the innermost Tag block.
fn at_block_end_tag(state: &mut ParserState<'_, '_>) {
    let open = state
        .stack
        .last()
        .filter(|frame| frame.kind == BlockKind::Tag)
        .map(|frame| (frame.name.clone().unwrap_or_default(), frame.opened));

    state.start_block(BlockKind::TagElement);
    open_tag(state);
    state.optional(SymbolKind::Slash, SpanKind::MetaCode);

    let name_start = state.offset();
    state.accept_until(&[SymbolKind::CloseTag, SymbolKind::RawCloseTag, SymbolKind::Tilde]);
    let name_span = Span::new(name_start..state.offset());
    let name_span_id = state.output(SpanKind::Expression);
    let name = state.span_content(name_span_id).unwrap_or_default();
    let name = name.trim().to_string();

    match &open {
        Some((expected, _)) if *expected == name => {}
        Some((expected, opened)) => {
            let message = format!(
                "Unbalanced tags - expected a closing tag for '{expected}' but instead found '{name}'"
            );
            state.report(
                Diagnostic::error(message)
                    .with_code(ErrorCode::E100)
                    .with_label(name_span, "closing tag")
                    .with_secondary_label(*opened, "block opened here"),
                name_start,
            );
        }
        None => {
            state.report(
                Diagnostic::error(format!("Unexpected closing tag for '{name}'"))
                    .with_code(ErrorCode::E100)
                    .with_label(name_span, "no block is open"),
                name_start,
            );
        }
    }

    if let Some(frame) = state.frame() {
        frame.name = Some(name);
    }
    close_tag(state);
    state.end_block();

    if open.is_some() {
        state.end_block();
    }
}

/// `{{! comment }}` or `{{!-- comment --}}`.
fn at_comment_tag(state: &mut ParserState<'_, '_>) {
    state.start_block(BlockKind::Comment);
    open_tag(state);
    state.optional(SymbolKind::Bang, SpanKind::MetaCode);
    state.optional(SymbolKind::Comment, SpanKind::Comment);
    close_tag(state);
    state.end_block();
}

/// `{{name args}}`, `{{&name}}`, `{{else}}` or `{{^}}`.
fn at_expression_tag(state: &mut ParserState<'_, '_>, prefix: Option<(SymbolKind, SpanKind)>) {
    let start = state.offset();
    state.start_block(BlockKind::Expression);
    open_tag(state);
    if let Some((kind, span_kind)) = prefix {
        state.optional(kind, span_kind);
    }
    at_expression_body(state);
    close_tag(state);

    if state.frame().is_some_and(|frame| frame.name.is_none()) {
        let end = state.offset();
        state.report(
            Diagnostic::warning("Empty tag").with_label(Span::new(start..end), "renders nothing"),
            start,
        );
    }
    state.end_block();
}

/// `{{> name args}}`.
fn at_partial_tag(state: &mut ParserState<'_, '_>) {
    state.start_block(BlockKind::Partial);
    open_tag(state);
    state.optional(SymbolKind::RightArrow, SpanKind::MetaCode);
    at_expression_body(state);
    close_tag(state);
    state.end_block();
}

/// `(name args)` in argument position.
fn at_sub_expression(state: &mut ParserState<'_, '_>) {
    state.start_block(BlockKind::SubExpression);
    state.accept();
    state.output(SpanKind::MetaCode);
    at_expression_body(state);
    state.expect(SymbolKind::CloseParenthesis, ")");
    state.end_block();
}

/// The name and arguments of a tag.
///
/// Names the enclosing block after the expression. `else`, `elseis` and a
/// bare `^` turn the enclosing block into a [`BlockKind::TagElement`] that
/// separates branches of a block tag.
fn at_expression_body(state: &mut ParserState<'_, '_>) {
    let negated = state.last_span_content() == Some("^");

    state.start_block(BlockKind::ExpressionBody);
    state.accept_while(&[SymbolKind::WhiteSpace]);
    state.output(SpanKind::WhiteSpace);

    state.accept_until(NAME_END);
    let expression = state.output(SpanKind::Expression);
    let mut name = state.span_content(expression);
    if negated && name.as_deref().is_none_or(str::is_empty) {
        name = Some("^".to_string());
    }
    let separator = negated || matches!(name.as_deref(), Some("else" | "elseis"));

    loop {
        if state.is_at_end() || state.at_any(BODY_END) {
            break;
        }
        if state.at(SymbolKind::WhiteSpace) {
            state.accept_while(&[SymbolKind::WhiteSpace]);
            state.output(SpanKind::WhiteSpace);
        } else if state.at(SymbolKind::OpenParenthesis) {
            at_sub_expression(state);
        } else if state.at(SymbolKind::Assign) {
            // The key is still pending; the map span holds `key`, `=` and the value.
            state.accept();
            state.accept_until(NAME_END);
            state.output(SpanKind::Map);
        } else {
            state.accept_until(ARGUMENT_END);
            if !state.at(SymbolKind::Assign) {
                state.output(SpanKind::Parameter);
            }
        }
    }

    state.end_block();

    if let Some(frame) = state.frame() {
        if separator {
            frame.kind = BlockKind::TagElement;
        }
        frame.name = name;
    }
}
