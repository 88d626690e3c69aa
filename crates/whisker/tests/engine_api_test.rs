//! Integration tests for the Engine API
//!
//! These tests verify that the public API works and is usable.

use serde::Serialize;
use serde_json::json;

use whisker::{
    Engine, HelperOptions, Object, RenderError, TagDescriptor, Value, WhiskerError,
    config::EngineConfig, operator::FnOperator,
};

fn model(value: serde_json::Value) -> Value {
    Value::from(value)
}

#[test]
fn test_engine_api_exists() {
    // Just verify the API compiles and can be constructed
    let _engine = Engine::default();
    let _engine = Engine::new(EngineConfig::default());
}

#[test]
fn test_compile_and_render() {
    let engine = Engine::default();
    let template = engine.compile("Hello {{name}}!").expect("Failed to compile");

    assert_eq!(
        template.render(&model(json!({"name": "World"}))).unwrap(),
        "Hello World!"
    );
    assert_eq!(
        template.render(&model(json!({"name": "Again"}))).unwrap(),
        "Hello Again!"
    );
}

#[test]
fn test_compile_invalid_template_returns_error() {
    let engine = Engine::default();
    let result = engine.compile("{{#if a}}x{{/each}}{{#with b}}");

    let Err(WhiskerError::Parse { err, src }) = result else {
        panic!("Should return parse error");
    };
    assert_eq!(src, "{{#if a}}x{{/each}}{{#with b}}");
    assert!(err.diagnostics().len() >= 2);
    let message = WhiskerError::new_parse_error(err, src).to_string();
    assert!(message.starts_with("1:14: Unbalanced tags"), "{message}");
}

#[test]
fn test_named_templates() {
    let engine = Engine::default();
    let data = model(json!({"n": 1}));

    assert_eq!(engine.compile_and_run("t", "n={{n}}", &data).unwrap(), "n=1");
    // Cached under the name: the new source is ignored.
    assert_eq!(engine.compile_and_run("t", "other", &data).unwrap(), "n=1");
    assert_eq!(engine.run("t", &data).unwrap(), "n=1");

    assert!(engine.remove_template("t"));
    assert!(matches!(
        engine.run("t", &data),
        Err(WhiskerError::Render(RenderError::UnknownTemplate(_)))
    ));
}

#[test]
fn test_engine_clones_share_state() {
    let engine = Engine::default();
    let clone = engine.clone();

    clone.compile_named("shared", "ok").unwrap();
    clone.register_helper("h", |_: &HelperOptions<'_>| Ok(Value::Null));

    assert_eq!(engine.run("shared", &Value::Null).unwrap(), "ok");
    assert!(engine.has_helper("h"));
}

#[test]
fn test_helpers() {
    let engine = Engine::default();
    engine.register_helper("join", |options: &HelperOptions<'_>| {
        let separator = options
            .parameters()
            .get("sep")
            .map(Value::to_string)
            .unwrap_or_else(|| ",".to_string());
        let parts: Vec<String> = options.arguments().iter().map(Value::to_string).collect();
        Ok(Value::from(parts.join(&separator)))
    });
    engine.register_helper("bold", |options: &HelperOptions<'_>| {
        let inner = options.render_children(None)?;
        Ok(Value::from(format!("<b>{inner}</b>")))
    });
    engine.register_helper("fail", |_: &HelperOptions<'_>| {
        Err(RenderError::helper("helper failed"))
    });

    let data = model(json!({"a": "x", "b": "y", "name": "Matt"}));
    let render = |source: &str| engine.compile(source).unwrap().render(&data);

    assert_eq!(render("{{join a b}}").unwrap(), "x,y");
    assert_eq!(render(r#"{{join a b sep="-"}}"#).unwrap(), "x-y");
    assert_eq!(render("{{#bold}}{{name}}{{/bold}}").unwrap(), "<b>Matt</b>");
    assert_eq!(
        render("{{fail}}"),
        Err(RenderError::Helper("helper failed".to_string()))
    );
}

#[test]
fn test_sub_expressions() {
    let engine = Engine::default();
    engine.register_helper("add", |options: &HelperOptions<'_>| {
        let sum: i64 = options
            .arguments()
            .iter()
            .filter_map(|value| match value {
                Value::Int(i) => Some(*i),
                _ => None,
            })
            .sum();
        Ok(Value::from(sum))
    });
    engine.register_helper("show", |options: &HelperOptions<'_>| {
        let label = options.parameters().get("label").cloned().unwrap_or_default();
        Ok(Value::from(format!("{label}:{}", options.data())))
    });

    let data = model(json!({"x": 2}));
    let render = |source: &str| engine.compile(source).unwrap().render(&data).unwrap();

    assert_eq!(render("{{show (add x 3)}}"), ":5");
    assert_eq!(render("{{show (add x (add 1 1)) label=(add 10 0)}}"), "10:4");
    // Without a helper the sub-expression resolves as a path.
    assert_eq!(render("{{show (x)}}"), ":2");
}

#[test]
fn test_partials() {
    let engine = Engine::default();
    engine
        .register_partial("person", "<{{name}}>")
        .expect("Failed to register partial");
    engine.register_partial_fn("shout", |model: &Value| {
        Ok(model.to_string().to_uppercase())
    });

    let data = model(json!({"name": "Top", "friend": {"name": "Chris"}, "word": "hey"}));
    let render = |source: &str| engine.compile(source).unwrap().render(&data);

    assert_eq!(render("{{> person}}").unwrap(), "<Top>");
    assert_eq!(render("{{> person friend}}").unwrap(), "<Chris>");
    assert_eq!(render("{{> shout word}}").unwrap(), "HEY");
    assert_eq!(
        render("{{> missing}}"),
        Err(RenderError::UnknownPartial("missing".to_string()))
    );
}

#[test]
fn test_partial_sees_parent_scopes() {
    let engine = Engine::default();
    engine.register_partial("item", "{{../title}}:{{this}} ").unwrap();

    let data = model(json!({"title": "T", "items": [1, 2]}));
    let output = engine
        .compile("{{#each items}}{{> item}}{{/each}}")
        .unwrap()
        .render(&data)
        .unwrap();
    assert_eq!(output, "T:1 T:2 ");
}

#[test]
fn test_custom_operator() {
    let engine = Engine::default();
    assert!(engine.register_operator(FnOperator::new("startsWith", |x, y| {
        x.to_string().starts_with(&y.to_string())
    })));

    let template = engine
        .compile(r#"{{#is name "startsWith" "Ma"}}yes{{else}}no{{/is}}"#)
        .unwrap();
    assert_eq!(template.render(&model(json!({"name": "Matt"}))).unwrap(), "yes");
    assert_eq!(template.render(&model(json!({"name": "Chris"}))).unwrap(), "no");
}

#[test]
fn test_custom_tag_with_parameters() {
    let engine = Engine::default();
    engine.register_tag(
        TagDescriptor::new("repeat", "repeat", 0, 0).with_map_parameters(true),
        |tag: &whisker::TagBlock<'_>,
         context: &whisker::RenderContext<'_>,
         out: &mut String| {
            let times = match tag.arguments().parameters().get("times") {
                Some(Value::Int(n)) => *n,
                _ => 1,
            };
            for _ in 0..times {
                tag.render(tag.primary(), context, out)?;
            }
            Ok(())
        },
    );

    let render = |source: &str| engine.compile(source).unwrap().render(&Value::Null);
    assert_eq!(render("{{#repeat times=3}}a{{/repeat}}").unwrap(), "aaa");
    assert_eq!(
        render("{{#repeat}}a{{/repeat}}"),
        Err(RenderError::ExpectedParameters("repeat".to_string()))
    );
}

#[test]
fn test_custom_tag_without_child_content() {
    let engine = Engine::default();
    engine.register_tag(
        TagDescriptor::new("stamp", "stamp", 1, 1).with_child_content(false),
        |tag: &whisker::TagBlock<'_>,
         _context: &whisker::RenderContext<'_>,
         out: &mut String| {
            assert!(tag.content().is_empty());
            out.push_str(&format!("<{}>", tag.arguments().positional()[0]));
            Ok(())
        },
    );

    let template = engine.compile("a{{#stamp name}}b{{name}}").unwrap();
    assert_eq!(template.render(&model(json!({"name": "Matt"}))).unwrap(), "a<Matt>bMatt");
}

#[derive(Serialize)]
struct Person {
    name: String,
    tags: Vec<String>,
}

#[test]
fn test_serializable_model() {
    let person = Person {
        name: "Matt".to_string(),
        tags: vec!["a".to_string(), "b".to_string()],
    };
    let data = Value::from_serialize(&person).unwrap();

    let output = Engine::default()
        .compile("{{name}}:{{#each tags}}{{this}}{{/each}}")
        .unwrap()
        .render(&data)
        .unwrap();
    assert_eq!(output, "Matt:ab");
}

#[derive(Debug)]
struct Clock;

impl std::fmt::Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("clock")
    }
}

impl Object for Clock {
    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "hour" => Some(Value::from(12)),
            _ => None,
        }
    }
}

#[test]
fn test_object_model() {
    let data: Value = [("clock", Value::object(Clock))].into_iter().collect();
    let output = Engine::default()
        .compile("{{clock.hour}} {{clock.minute}} {{clock}}")
        .unwrap()
        .render(&data)
        .unwrap();
    assert_eq!(output, "12  clock");
}
