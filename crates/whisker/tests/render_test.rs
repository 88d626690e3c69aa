//! Render scenarios over the public Engine API.

use proptest::prelude::*;
use serde_json::json;

use whisker::{Engine, Value};

fn render(source: &str, model: serde_json::Value) -> String {
    Engine::default()
        .compile(source)
        .expect("Failed to compile")
        .render(&Value::from(model))
        .expect("Failed to render")
}

#[test]
fn test_hello_world() {
    assert_eq!(render("{{hello}}", json!({"hello": "World"})), "World");
}

#[test]
fn test_if_else_scenario() {
    let source = "{{#if cond}}True!{{else}}False!{{/if}}";
    assert_eq!(render(source, json!({"cond": false})), "False!");
    assert_eq!(render(source, json!({"cond": true})), "True!");
}

#[test]
fn test_each_list_scenario() {
    let source = "<ul>{{#each items}}<li>{{name}}</li>{{/each}}</ul>";
    assert_eq!(
        render(source, json!({"items": [{"name": "A"}, {"name": "B"}]})),
        "<ul><li>A</li><li>B</li></ul>"
    );
}

#[test]
fn test_each_index_sequence() {
    let output = render(
        "{{#each seq}}{{@index}}{{/each}}",
        json!({"seq": ["a", "b", "c", "d"]}),
    );
    assert_eq!(output, "0123");
}

#[test]
fn test_escaping_scenario() {
    assert_eq!(render("{{this}}", json!("<b>x</b>")), "&lt;b&gt;x&lt;/b&gt;");
    assert_eq!(render("{{{this}}}", json!("<b>x</b>")), "<b>x</b>");
}

#[test]
fn test_is_scenario() {
    assert_eq!(
        render(r#"{{#is x ">" y}}true{{/is}}"#, json!({"x": 2, "y": 1})),
        "true"
    );
}

#[test]
fn test_tilde_trims_one_side() {
    let model = json!({"world": "World!"});
    assert_eq!(render("Hello {{~world}}", model.clone()), "HelloWorld!");
    assert_eq!(render("Hello  {{world~}} !", model.clone()), "Hello  World!!");
    assert_eq!(render("a {{~world~}} b", model), "aWorld!b");
}

#[test]
fn test_with_parent_lookup() {
    let model = json!({"a": {"b": "inner"}, "b": "outer"});
    assert_eq!(render("{{#with a}}{{../b}}{{/with}}", model.clone()), "outer");
    assert_eq!(render("{{#with a}}{{b}}{{/with}}", model), "inner");
}

#[test]
fn test_root_variable() {
    let model = json!({"title": "T", "groups": [{"items": [1, 2]}]});
    let source = "{{#each groups}}{{#each items}}{{@root.title}}{{this}}{{/each}}{{/each}}";
    assert_eq!(render(source, model), "T1T2");
}

#[test]
fn test_nested_each_variables_are_scoped() {
    let model = json!({"rows": [["a", "b"], ["c"]]});
    let source = "{{#each rows}}[{{@index}}:{{#each this}}{{@index}}{{/each}}{{@index}}]{{/each}}";
    assert_eq!(render(source, model), "[0:010][1:01]");
}

#[test]
fn test_loop_variables_stay_in_iteration_scope() {
    let model = json!({"items": [{}, {}]});
    assert_eq!(
        render("{{#each items}}{{#with this}}[{{@index}}]{{/with}}{{/each}}", model.clone()),
        "[][]"
    );
    assert_eq!(
        render("{{#each items}}{{#with this}}{{@../index}}{{/with}}{{/each}}", model),
        "01"
    );
}

#[test]
fn test_block_whitespace_control() {
    let source = "<ul>\n  {{~#each items~}}\n  <li>{{this}}</li>\n  {{~/each~}}\n</ul>";
    assert_eq!(
        render(source, json!({"items": [1, 2]})),
        "<ul><li>1</li><li>2</li></ul>"
    );
}

#[test]
fn test_numbers_and_booleans() {
    let model = json!({"int": 3, "whole": 2.0, "real": 1.5, "flag": true, "list": [1, 2]});
    assert_eq!(
        render("{{int}} {{whole}} {{real}} {{flag}} {{list}}", model),
        "3 2 1.5 true 1,2"
    );
}

#[test]
fn test_escaped_open_brace() {
    assert_eq!(render(r"\{{name}}", json!({"name": "x"})), "{{name}}");
}

// ===================
// Strategies
// ===================

fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,;:<>&\"'\n\t-]{0,40}"
}

// ===================
// Property Test Functions
// ===================

/// A template without tags renders to itself.
fn check_plain_text_renders_verbatim(text: String) -> Result<(), TestCaseError> {
    let output = Engine::default()
        .compile(&text)
        .map_err(|err| TestCaseError::fail(err.to_string()))?
        .render(&Value::Null)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert_eq!(output, text);
    Ok(())
}

/// Escaped output never contains markup characters.
fn check_escaped_output_is_inert(text: String) -> Result<(), TestCaseError> {
    let output = Engine::default()
        .compile("{{this}}")
        .map_err(|err| TestCaseError::fail(err.to_string()))?
        .render(&Value::from(text.clone()))
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert!(!output.contains(['<', '>', '"', '\'']));

    let raw = Engine::default()
        .compile("{{{this}}}")
        .map_err(|err| TestCaseError::fail(err.to_string()))?
        .render(&Value::from(text.clone()))
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert_eq!(raw, text);
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn plain_text_renders_verbatim(text in text_strategy()) {
        check_plain_text_renders_verbatim(text)?;
    }

    #[test]
    fn escaped_output_is_inert(text in text_strategy()) {
        check_escaped_output_is_inert(text)?;
    }
}
