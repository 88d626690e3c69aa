//! Resolution of expression symbols against the context chain.

use log::trace;

use whisker_core::Value;
use whisker_parser::{Symbol, SymbolKind};

use crate::context::RenderContext;

/// Supplies a value for a path that resolved to nothing.
pub type Resolver<'a> = dyn Fn(&str) -> Value + 'a;

/// Resolve the symbols of an expression or argument to a value.
///
/// An empty symbol list yields the current model. A single literal yields
/// its typed value. Otherwise the symbols form a path: `../` moves to the
/// parent scope, `./` and a leading `this` stay on the current one, `@`
/// reads a variable of that scope only, and `@root.` restarts at the
/// outermost model. A path that resolves to nothing, including one that
/// climbs past the outermost scope, goes to `resolver`.
pub(crate) fn resolve(
    symbols: &[Symbol],
    context: &RenderContext<'_>,
    resolver: Option<&Resolver<'_>>,
) -> Value {
    let [first, rest @ ..] = symbols else {
        return context.model().clone();
    };
    if rest.is_empty()
        && let Some(value) = literal(first)
    {
        return value;
    }

    let mut scope = Some(context);
    let mut variable = false;
    let mut path = String::new();
    for symbol in symbols {
        match symbol.kind() {
            SymbolKind::At => variable = true,
            SymbolKind::CurrentContext => {}
            SymbolKind::ParentContext => scope = scope.and_then(RenderContext::parent),
            SymbolKind::Dot | SymbolKind::Slash => path.push('.'),
            _ if symbol.content() == "this" && path.is_empty() => {}
            _ => path.push_str(symbol.content()),
        }
    }
    let path = path.strip_prefix('.').unwrap_or(&path);
    trace!(path = path, variable = variable; "Resolving path");

    // `../` past the outermost scope.
    let Some(scope) = scope else {
        return match resolver {
            Some(fallback) if !variable => fallback(path),
            _ => Value::Null,
        };
    };

    if variable {
        if path == "root" {
            return scope.root().model().clone();
        }
        return match path.strip_prefix("root.") {
            Some(rest) => lookup(scope.root().model(), rest, resolver),
            None => scope.variable(path).cloned().unwrap_or_default(),
        };
    }
    lookup(scope.model(), path, resolver)
}

fn lookup(model: &Value, path: &str, resolver: Option<&Resolver<'_>>) -> Value {
    match model.lookup_path(path) {
        Some(value) => value,
        None => resolver.map(|fallback| fallback(path)).unwrap_or_default(),
    }
}

/// The typed value of a literal symbol.
fn literal(symbol: &Symbol) -> Option<Value> {
    let content = symbol.content();
    match symbol.kind() {
        SymbolKind::StringLiteral => Some(Value::String(unquote(content))),
        SymbolKind::IntegerLiteral => Some(integer(content)),
        SymbolKind::RealLiteral => content.parse().ok().map(Value::Float),
        SymbolKind::Identifier | SymbolKind::Keyword => match content {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn integer(content: &str) -> Value {
    let parsed = match content
        .strip_prefix("0x")
        .or_else(|| content.strip_prefix("0X"))
    {
        Some(digits) => i64::from_str_radix(digits, 16).ok(),
        None => content.parse().ok(),
    };
    match parsed {
        Some(value) => Value::Int(value),
        // Out of range for i64.
        None => content
            .parse()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(content.to_string())),
    }
}

/// Strip the quotes of a string literal and unescape `\"`, `\'` and `\\`.
fn unquote(content: &str) -> String {
    let mut chars = content.chars();
    let Some(quote) = chars.next() else {
        return String::new();
    };
    let inner = chars.as_str();
    let inner = inner.strip_suffix(quote).unwrap_or(inner);

    let mut unquoted = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            if c != quote && c != '\\' {
                unquoted.push('\\');
            }
            unquoted.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            unquoted.push(c);
        }
    }
    if escaped {
        unquoted.push('\\');
    }
    unquoted
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use whisker_parser::{Document, SpanKind, TagRegistry, compile};

    /// Symbols of the first expression or parameter span in `source`.
    fn symbols_of(source: &str, kind: SpanKind) -> Vec<Symbol> {
        let document: Document = compile(source, &TagRegistry::standard()).unwrap();
        document
            .spans()
            .find(|(_, span)| span.kind() == kind)
            .map(|(_, span)| span.symbols().to_vec())
            .unwrap()
    }

    fn resolve_in(source: &str, context: &RenderContext<'_>) -> Value {
        resolve(&symbols_of(source, SpanKind::Expression), context, None)
    }

    #[test]
    fn test_resolve_paths() {
        let context = RenderContext::new(Value::from(json!({
            "name": "Matt",
            "person": {"address": {"city": "Leeds"}},
            "items": [10, 20],
        })));

        assert_eq!(resolve_in("{{name}}", &context), Value::from("Matt"));
        assert_eq!(resolve_in("{{this.name}}", &context), Value::from("Matt"));
        assert_eq!(resolve_in("{{./name}}", &context), Value::from("Matt"));
        assert_eq!(
            resolve_in("{{person.address.city}}", &context),
            Value::from("Leeds")
        );
        assert_eq!(
            resolve_in("{{person/address/city}}", &context),
            Value::from("Leeds")
        );
        assert_eq!(resolve_in("{{items.1}}", &context), Value::Int(20));
        assert_eq!(resolve_in("{{missing}}", &context), Value::Null);
        assert_eq!(resolve_in("{{this}}", &context), context.model().clone());
    }

    #[test]
    fn test_resolve_parent_and_root() {
        let root = RenderContext::new(Value::from(json!({"title": "Top"})));
        let mut child = root.scope(Value::from(json!({"title": "Inner"})));
        child.set_variable("index", 2);

        assert_eq!(resolve_in("{{title}}", &child), Value::from("Inner"));
        assert_eq!(resolve_in("{{../title}}", &child), Value::from("Top"));
        assert_eq!(resolve_in("{{@root.title}}", &child), Value::from("Top"));
        assert_eq!(resolve_in("{{@index}}", &child), Value::Int(2));
        assert_eq!(resolve_in("{{@first}}", &child), Value::Null);
        assert_eq!(resolve_in("{{../title}}", &root), Value::Null);
    }

    #[test]
    fn test_variables_do_not_leak_into_child_scopes() {
        let root = RenderContext::new(Value::from(json!({"items": [{}]})));
        let mut item = root.scope(Value::from(json!({})));
        item.set_variable("index", 1);
        let nested = item.scope(Value::from(json!({})));

        assert_eq!(resolve_in("{{@index}}", &item), Value::Int(1));
        assert_eq!(resolve_in("{{@index}}", &nested), Value::Null);
        assert_eq!(resolve_in("{{@../index}}", &nested), Value::Int(1));
    }

    #[test]
    fn test_parent_past_root_uses_resolver() {
        let root = RenderContext::new(Value::from(json!({"title": "Top"})));
        let resolver = |path: &str| Value::from(format!("<{path}>"));

        let symbols = symbols_of("{{../title}}", SpanKind::Expression);
        assert_eq!(
            resolve(&symbols, &root, Some(&resolver)),
            Value::from("<title>")
        );
        assert_eq!(resolve(&symbols, &root, None), Value::Null);

        let symbols = symbols_of("{{@../index}}", SpanKind::Expression);
        assert_eq!(resolve(&symbols, &root, Some(&resolver)), Value::Null);
    }

    #[test]
    fn test_resolve_literals() {
        let context = RenderContext::new(Value::Null);
        let argument = |source: &str| {
            resolve(&symbols_of(source, SpanKind::Parameter), &context, None)
        };

        assert_eq!(argument(r#"{{x "Matt"}}"#), Value::from("Matt"));
        assert_eq!(argument(r#"{{x 'it\'s'}}"#), Value::from("it's"));
        assert_eq!(argument("{{x 42}}"), Value::Int(42));
        assert_eq!(argument("{{x 0x1F}}"), Value::Int(31));
        assert_eq!(argument("{{x 1.5}}"), Value::Float(1.5));
        assert_eq!(argument("{{x true}}"), Value::Bool(true));
    }

    #[test]
    fn test_unknown_value_resolver() {
        let context = RenderContext::new(Value::from(json!({"name": null})));
        let resolver = |path: &str| Value::from(format!("<{path}>"));

        let symbols = symbols_of("{{person.name}}", SpanKind::Expression);
        assert_eq!(
            resolve(&symbols, &context, Some(&resolver)),
            Value::from("<person.name>")
        );

        let symbols = symbols_of("{{name}}", SpanKind::Expression);
        assert_eq!(resolve(&symbols, &context, Some(&resolver)), Value::Null);
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a\"b""#), r#"a"b"#);
        assert_eq!(unquote(r#""a\\b""#), r"a\b");
        assert_eq!(unquote(r#""a\nb""#), r"a\nb");
        assert_eq!(unquote("''"), "");
    }
}
