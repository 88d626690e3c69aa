use whisker_parser::{
    Block, BlockKind, Document, ErrorCode, NodeId, SpanKind, TagRegistry, compile,
};

fn parse(source: &str) -> Document {
    compile(source, &TagRegistry::standard()).expect("Failed to compile")
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    compile(source, &TagRegistry::standard())
        .expect_err("Expected a compile error")
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| diagnostic.code())
        .collect()
}

/// Every block in the document, depth first.
fn blocks(document: &Document) -> Vec<(NodeId, &Block)> {
    let mut found = Vec::new();
    let mut pending = vec![document.root()];
    while let Some(id) = pending.pop() {
        if let Some(block) = document.block(id) {
            found.push((id, block));
            pending.extend(document.children(id).iter().rev().copied());
        }
    }
    found
}

fn first_block<'a>(document: &'a Document, kind: BlockKind) -> (NodeId, &'a Block) {
    blocks(document)
        .into_iter()
        .find(|(_, block)| block.kind() == kind)
        .unwrap_or_else(|| panic!("No {kind:?} block"))
}

#[test]
fn test_round_trip_reconstruction() {
    let source = r#"<h1>{{title}}</h1>
{{! comment }}{{!-- long }} comment --}}
{{#each items}}
  {{~#if @first}}first{{#elseif done}}done{{else}}{{name}}{{/if~}}
{{/each}}
{{> footer author}} {{{raw}}} {{&also}} {{helper (inner x "y") key=1}}"#;

    assert_eq!(parse(source).reconstruct(), source);
}

#[test]
fn test_each_block_structure() {
    let document = parse("{{#each items}}{{name}}{{/each}}");
    let (id, tag) = first_block(&document, BlockKind::Tag);

    assert_eq!(tag.name(), Some("each"));
    let descriptor = tag.descriptor().expect("Tag should be bound");
    assert_eq!(descriptor.name(), "each");
    assert!(!descriptor.is_implicit());

    let children = document.children(id);
    let kind = |id: NodeId| document.block(id).map(Block::kind);
    assert_eq!(kind(children[0]), Some(BlockKind::TagElement));
    assert_eq!(kind(children[children.len() - 1]), Some(BlockKind::TagElement));
    assert!(
        children
            .iter()
            .any(|&child| kind(child) == Some(BlockKind::Expression))
    );
}

#[test]
fn test_else_becomes_tag_element() {
    let document = parse("{{#if a}}x{{else}}y{{/if}}");
    let (id, _) = first_block(&document, BlockKind::Tag);

    let names: Vec<_> = document
        .children(id)
        .iter()
        .filter_map(|&child| document.block(child))
        .filter(|block| block.kind() == BlockKind::TagElement)
        .map(|block| block.name().unwrap_or_default())
        .collect();
    assert!(names.contains(&"else"), "{names:?}");
}

#[test]
fn test_unknown_block_name_is_implicit() {
    let document = parse("{{#people}}{{name}}{{/people}}");
    let (_, tag) = first_block(&document, BlockKind::Tag);

    assert_eq!(tag.name(), Some("people"));
    assert!(tag.descriptor().is_some_and(|descriptor| descriptor.is_implicit()));
}

#[test]
fn test_partial_and_sub_expression() {
    let document = parse("{{> header}}{{format (upper name)}}");

    let (_, partial) = first_block(&document, BlockKind::Partial);
    assert_eq!(partial.name(), Some("header"));

    let (_, sub) = first_block(&document, BlockKind::SubExpression);
    assert_eq!(sub.name(), Some("upper"));
}

#[test]
fn test_comments_are_comment_spans() {
    let document = parse("a{{! hidden }}b");
    assert!(
        document
            .spans()
            .any(|(_, span)| span.kind() == SpanKind::Comment)
    );
}

#[test]
fn test_tilde_collapses_whitespace() {
    let document = parse("a {{~x~}} b");
    let collapsed: Vec<_> = document
        .collapsed_spans()
        .map(|(_, span)| span.content().to_string())
        .collect();
    assert_eq!(collapsed, [" ", " "]);

    let document = parse("a {{x}} b");
    assert_eq!(document.collapsed_spans().count(), 0);
}

#[test]
fn test_structural_errors() {
    assert!(error_codes("{{#if a}}x{{/each}}").contains(&ErrorCode::E100));
    assert!(error_codes("{{#each items}}x").contains(&ErrorCode::E101));
    assert!(error_codes("x{{/if}}").contains(&ErrorCode::E100));
}

#[test]
fn test_lexical_errors() {
    assert!(error_codes("{{name \"open}}").contains(&ErrorCode::E001));
    assert!(error_codes("{{{#x}}}").contains(&ErrorCode::E004));
    assert!(error_codes("{{! never closed").contains(&ErrorCode::E005));
}

#[test]
fn test_custom_tag_registration() {
    let mut registry = TagRegistry::standard();
    registry.register(whisker_parser::TagDescriptor::new("repeat", "repeat", 1, 1));

    let document = compile("{{#REPEAT 3}}x{{/REPEAT}}", &registry).expect("Failed to compile");
    let (_, tag) = first_block(&document, BlockKind::Tag);
    let descriptor = tag.descriptor().expect("Tag should be bound");
    assert_eq!(descriptor.name(), "repeat");
    assert!(!descriptor.is_implicit());
}
