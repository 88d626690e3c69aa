//! Render-time scopes.

use indexmap::IndexMap;

use whisker_core::Value;

/// One scope of the context chain a template renders against.
///
/// Each scope holds a model and the `@` variables defined at that level,
/// and borrows its parent. Block helpers such as `each` and `with` push a
/// child scope for their content; `../` walks back up the chain.
#[derive(Debug)]
pub struct RenderContext<'p> {
    model: Value,
    parent: Option<&'p RenderContext<'p>>,
    variables: IndexMap<String, Value>,
}

impl<'p> RenderContext<'p> {
    /// Create a root scope.
    pub fn new(model: Value) -> Self {
        Self {
            model,
            parent: None,
            variables: IndexMap::new(),
        }
    }

    /// Create a child scope whose model is `model`.
    pub fn scope(&self, model: Value) -> RenderContext<'_> {
        RenderContext {
            model,
            parent: Some(self),
            variables: IndexMap::new(),
        }
    }

    pub fn model(&self) -> &Value {
        &self.model
    }

    pub fn parent(&self) -> Option<&'p RenderContext<'p>> {
        self.parent
    }

    /// The outermost scope of the chain.
    pub fn root(&self) -> &RenderContext<'p> {
        let mut current = self;
        while let Some(parent) = current.parent {
            current = parent;
        }
        current
    }

    /// Define a variable in this scope, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Look up a variable defined in this scope.
    ///
    /// Variables of enclosing scopes are not visible; `@../name` reaches them.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_belong_to_their_scope() {
        let mut root = RenderContext::new(Value::from("root"));
        root.set_variable("index", 0);
        root.set_variable("first", true);

        let mut child = root.scope(Value::from("child"));
        child.set_variable("index", 3);

        assert_eq!(child.variable("index"), Some(&Value::Int(3)));
        assert_eq!(child.variable("first"), None);
        assert_eq!(child.variable("last"), None);
        assert_eq!(root.variable("index"), Some(&Value::Int(0)));

        let grandchild = child.scope(Value::from("grandchild"));
        assert_eq!(grandchild.variable("index"), None);
    }

    #[test]
    fn test_root_and_parent() {
        let root = RenderContext::new(Value::from("root"));
        let child = root.scope(Value::from("child"));
        let grandchild = child.scope(Value::from("grandchild"));

        assert_eq!(grandchild.root().model(), &Value::from("root"));
        assert_eq!(
            grandchild.parent().map(RenderContext::model),
            Some(&Value::from("child"))
        );
        assert!(root.parent().is_none());
        assert_eq!(root.root().model(), &Value::from("root"));
    }
}
