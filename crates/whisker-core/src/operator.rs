//! Binary comparison operators used by the `is` tag.
//!
//! The [`OperatorRegistry`] is a name-keyed table of [`Operator`]s. The
//! standard set covers loose and strict equality, their negations, numeric
//! ordering and membership:
//!
//! | Name | Meaning |
//! |---|---|
//! | `==` | equal after coercing the right operand to the left operand's type |
//! | `===` | equal with identical runtime types |
//! | `!=`, `not` | negation of `==` |
//! | `!==` | negation of `===` |
//! | `>`, `>=`, `<`, `<=` | ordering after coercion |
//! | `in` | membership in a comma separated string or a collection |
//!
//! # Example
//!
//! ```
//! # use whisker_core::{operator::OperatorRegistry, Value};
//! let operators = OperatorRegistry::standard();
//! assert!(operators.apply(">", &Value::Int(2), &Value::from("1")).unwrap());
//! assert!(operators.apply("in", &Value::from("b"), &Value::from("a, b, c")).unwrap());
//! ```

use std::{cmp::Ordering, fmt, sync::Arc};

use indexmap::IndexMap;
use log::{debug, warn};
use thiserror::Error;

use crate::value::{Value, ValueKind};

/// Errors raised when applying operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    #[error("The operator '{0}' is not supported.")]
    Unknown(String),
}

/// A named binary predicate over two values.
pub trait Operator: fmt::Debug + Send + Sync {
    /// The name the operator is registered and looked up under.
    fn name(&self) -> &str;

    /// Apply the operator to `x` and `y`.
    fn apply(&self, x: &Value, y: &Value) -> bool;
}

/// Loose (`==`) or strict (`===`) equality.
#[derive(Debug, Clone, Copy)]
pub struct Equality {
    strict: bool,
}

impl Equality {
    /// Loose equality, coercing the right operand.
    pub fn loose() -> Self {
        Self { strict: false }
    }

    /// Strict equality, requiring identical runtime types.
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl Operator for Equality {
    fn name(&self) -> &str {
        if self.strict { "===" } else { "==" }
    }

    fn apply(&self, x: &Value, y: &Value) -> bool {
        if self.strict {
            x.strict_eq(y)
        } else {
            x.loose_eq(y)
        }
    }
}

/// Negated equality (`!=`, `not`, `!==`).
#[derive(Debug, Clone)]
pub struct NegatedEquality {
    name: String,
    inner: Equality,
}

impl NegatedEquality {
    /// Create a negated equality operator with the given name.
    pub fn new(name: impl Into<String>, strict: bool) -> Self {
        Self {
            name: name.into(),
            inner: Equality { strict },
        }
    }
}

impl Operator for NegatedEquality {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, x: &Value, y: &Value) -> bool {
        !self.inner.apply(x, y)
    }
}

/// The ordering tests supported by [`Numeric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOperation {
    GreaterThan,
    GreaterThanEqualTo,
    LessThan,
    LessThanEqualTo,
}

impl NumericOperation {
    fn symbol(self) -> &'static str {
        match self {
            NumericOperation::GreaterThan => ">",
            NumericOperation::GreaterThanEqualTo => ">=",
            NumericOperation::LessThan => "<",
            NumericOperation::LessThanEqualTo => "<=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            NumericOperation::GreaterThan => ordering.is_gt(),
            NumericOperation::GreaterThanEqualTo => ordering.is_ge(),
            NumericOperation::LessThan => ordering.is_lt(),
            NumericOperation::LessThanEqualTo => ordering.is_le(),
        }
    }
}

/// Ordering comparison (`>`, `>=`, `<`, `<=`).
///
/// Scalars coerce the right operand to the left operand's type. Strings
/// only compare against strings. Anything involving null is `false`.
#[derive(Debug, Clone, Copy)]
pub struct Numeric {
    operation: NumericOperation,
}

impl Numeric {
    /// Create an ordering operator.
    pub fn new(operation: NumericOperation) -> Self {
        Self { operation }
    }
}

impl Operator for Numeric {
    fn name(&self) -> &str {
        self.operation.symbol()
    }

    fn apply(&self, x: &Value, y: &Value) -> bool {
        if x.kind() == ValueKind::String && y.kind() != ValueKind::String {
            return false;
        }

        x.loose_cmp(y)
            .is_some_and(|ordering| self.operation.accepts(ordering))
    }
}

/// Membership (`in`).
///
/// A string right operand is treated as a comma separated list whose
/// trimmed items are compared with the left operand's text. A collection
/// right operand is searched by value equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct In;

impl Operator for In {
    fn name(&self) -> &str {
        "in"
    }

    fn apply(&self, x: &Value, y: &Value) -> bool {
        if x.is_null() || y.is_null() {
            return false;
        }

        if let Some(list) = y.as_str() {
            let needle = x.to_string();
            return list
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .any(|item| item == needle);
        }

        match y.entries() {
            Some(entries) => entries.iter().any(|entry| entry.value == *x),
            None => false,
        }
    }
}

/// An operator backed by a closure.
pub struct FnOperator {
    name: String,
    func: Box<dyn Fn(&Value, &Value) -> bool + Send + Sync>,
}

impl FnOperator {
    /// Create an operator from a name and a predicate.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Operator for FnOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, x: &Value, y: &Value) -> bool {
        (self.func)(x, y)
    }
}

/// A name-keyed table of operators.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: IndexMap<String, Arc<dyn Operator>>,
}

impl OperatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the standard operators.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Equality::loose());
        registry.register(Equality::strict());
        registry.register(NegatedEquality::new("!=", false));
        registry.register(NegatedEquality::new("not", false));
        registry.register(NegatedEquality::new("!==", true));
        registry.register(Numeric::new(NumericOperation::GreaterThanEqualTo));
        registry.register(Numeric::new(NumericOperation::GreaterThan));
        registry.register(Numeric::new(NumericOperation::LessThanEqualTo));
        registry.register(Numeric::new(NumericOperation::LessThan));
        registry.register(In);
        registry
    }

    /// Register an operator unless one with the same name already exists.
    ///
    /// Returns `true` if the operator was added.
    pub fn register(&mut self, operator: impl Operator + 'static) -> bool {
        self.register_shared(Arc::new(operator))
    }

    /// Register a shared operator unless one with the same name already exists.
    pub fn register_shared(&mut self, operator: Arc<dyn Operator>) -> bool {
        let name = operator.name().to_string();
        if self.operators.contains_key(&name) {
            warn!(operator = name; "Operator already registered, ignoring");
            return false;
        }

        debug!(operator = name; "Registered operator");
        self.operators.insert(name, operator);
        true
    }

    /// Look up an operator by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Operator>> {
        self.operators.get(name)
    }

    /// Returns `true` if an operator with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Names of all registered operators, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns `true` if no operators are registered.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Apply the named operator.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorError::Unknown`] if no operator is registered under
    /// `name`.
    pub fn apply(&self, name: &str, x: &Value, y: &Value) -> Result<bool, OperatorError> {
        self.get(name)
            .map(|operator| operator.apply(x, y))
            .ok_or_else(|| OperatorError::Unknown(name.to_string()))
    }
}
