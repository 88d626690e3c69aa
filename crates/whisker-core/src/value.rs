//! Runtime values that templates are rendered against.
//!
//! A [`Value`] is the single shape every model, argument, helper result and
//! loop variable takes at render time. Host data enters either through the
//! `From` conversions, through [`Value::from_serialize`] for any
//! [`serde::Serialize`] type, or through the [`Object`] trait for
//! dynamically shaped hosts that resolve members on demand.

use std::{cmp::Ordering, fmt, sync::Arc};

use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeSeq};
use thiserror::Error;

/// Errors raised while converting host data into a [`Value`].
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("Failed to convert model: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A host object that resolves members by name.
///
/// Implement this for data that is not a plain record or map, such as a
/// lazily computed view over another structure.
pub trait Object: fmt::Debug + fmt::Display + Send + Sync {
    /// Look up a named member. Returns `None` when the member does not exist.
    fn get_member(&self, name: &str) -> Option<Value>;

    /// Ordered key/value pairs when the object can be iterated.
    fn entries(&self) -> Option<Vec<(String, Value)>> {
        None
    }
}

/// The runtime type of a [`Value`], used for strict comparisons and coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Map,
    Object,
}

/// A dynamically typed template value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Text that is already rendered and must not be escaped again.
    Safe(String),
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(Arc<dyn Object>),
}

/// One step of an iteration over an enumerable value.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The key of the entry for keyed collections.
    pub key: Option<String>,
    /// The entry value.
    pub value: Value,
}

impl Value {
    /// Convert any serializable host value into a [`Value`].
    ///
    /// Field order of structs and maps is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Serialize`] if the value cannot be represented,
    /// for example a map with non-string keys.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ValueError> {
        let json = serde_json::to_value(value)?;
        Ok(Self::from(json))
    }

    /// Wrap already-rendered text so that it bypasses HTML escaping.
    pub fn safe(text: impl Into<String>) -> Self {
        Self::Safe(text.into())
    }

    /// Wrap a host object.
    pub fn object(object: impl Object + 'static) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Returns the runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) | Value::Safe(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Returns `true` if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this value is already-rendered text.
    pub fn is_safe(&self) -> bool {
        matches!(self, Value::Safe(_))
    }

    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Safe(s) => Some(s),
            _ => None,
        }
    }

    /// Template truthiness.
    ///
    /// Null, `false`, numeric zero, the empty string and empty collections
    /// are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) | Value::Safe(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Look up a named member.
    ///
    /// Maps resolve by key, arrays by decimal index and objects through
    /// [`Object::get_member`]. Scalars have no members.
    pub fn get_member(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::Array(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned(),
            Value::Object(object) => object.get_member(name),
            _ => None,
        }
    }

    /// Resolve a dotted member path such as `person.address.city`.
    ///
    /// An empty path resolves to the value itself.
    pub fn lookup_path(&self, path: &str) -> Option<Value> {
        if path.is_empty() {
            return Some(self.clone());
        }

        let mut segments = path.split('.').filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        let mut current = self.get_member(first)?;
        for segment in segments {
            current = current.get_member(segment)?;
        }
        Some(current)
    }

    /// Entries of an enumerable value, or `None` for scalars and strings.
    pub fn entries(&self) -> Option<Vec<Entry>> {
        match self {
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|value| Entry {
                        key: None,
                        value: value.clone(),
                    })
                    .collect(),
            ),
            Value::Map(map) => Some(
                map.iter()
                    .map(|(key, value)| Entry {
                        key: Some(key.clone()),
                        value: value.clone(),
                    })
                    .collect(),
            ),
            Value::Object(object) => object.entries().map(|entries| {
                entries
                    .into_iter()
                    .map(|(key, value)| Entry {
                        key: Some(key),
                        value,
                    })
                    .collect()
            }),
            _ => None,
        }
    }

    /// Best-effort conversion of this value to another runtime kind.
    ///
    /// Returns `None` when no sensible conversion exists.
    pub fn coerce_to(&self, kind: ValueKind) -> Option<Value> {
        if self.kind() == kind {
            return Some(self.clone());
        }

        match (kind, self) {
            (ValueKind::Bool, Value::Int(i)) => Some(Value::Bool(*i != 0)),
            (ValueKind::Bool, Value::Float(f)) => Some(Value::Bool(*f != 0.0)),
            (ValueKind::Bool, Value::String(s) | Value::Safe(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                }
            }
            (ValueKind::Int, Value::Bool(b)) => Some(Value::Int(i64::from(*b))),
            (ValueKind::Int, Value::Float(f)) => {
                let rounded = f.round();
                (rounded.is_finite() && rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64)
                    .then(|| Value::Int(rounded as i64))
            }
            (ValueKind::Int, Value::String(s) | Value::Safe(s)) => {
                s.trim().parse::<i64>().ok().map(Value::Int)
            }
            (ValueKind::Float, Value::Bool(b)) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            (ValueKind::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
            (ValueKind::Float, Value::String(s) | Value::Safe(s)) => {
                s.trim().parse::<f64>().ok().map(Value::Float)
            }
            (ValueKind::String, Value::Bool(_) | Value::Int(_) | Value::Float(_)) => {
                Some(Value::String(self.to_string()))
            }
            (ValueKind::String, Value::Object(object)) => Some(Value::String(object.to_string())),
            _ => None,
        }
    }

    /// Equality after coercing `other` to the kind of `self`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => other
                .coerce_to(self.kind())
                .is_some_and(|converted| *self == converted),
        }
    }

    /// Equality that requires both values to share a runtime kind.
    pub fn strict_eq(&self, other: &Value) -> bool {
        self.kind() == other.kind() && self == other
    }

    /// Ordering after coercing `other` to the kind of `self`.
    ///
    /// Only scalars are ordered. Returns `None` when either side is null or
    /// the values cannot be compared.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }

        let other = other.coerce_to(self.kind())?;
        match (self, &other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a) | Value::Safe(a), Value::String(b) | Value::Safe(b)) => {
                Some(a.cmp(b))
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a) | Value::Safe(a), Value::String(b) | Value::Safe(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) | Value::Safe(s) => f.write_str(s),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            Value::Object(object) => write!(f, "{object}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::String(s) | Value::Safe(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Object(object) => serializer.collect_str(object),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or(Value::Float(i as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[derive(Debug)]
    struct Counter {
        count: i64,
    }

    impl fmt::Display for Counter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "counter({})", self.count)
        }
    }

    impl Object for Counter {
        fn get_member(&self, name: &str) -> Option<Value> {
            match name {
                "count" => Some(Value::Int(self.count)),
                "double" => Some(Value::Int(self.count * 2)),
                _ => None,
            }
        }
    }

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(!Value::Map(IndexMap::new()).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(vec![Value::Null]).is_truthy());
        assert!(Value::object(Counter { count: 0 }).is_truthy());
    }

    #[test]
    fn test_from_serialize_preserves_field_order() {
        let person = Person {
            name: "Matt".to_string(),
            age: 33,
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let value = Value::from_serialize(&person).unwrap();
        let Value::Map(map) = &value else {
            panic!("Expected a map, got {value:?}");
        };

        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "age", "tags"]);
        assert_eq!(value.get_member("age"), Some(Value::Int(33)));
    }

    #[test]
    fn test_lookup_path() {
        let value: Value = [(
            "person",
            [("address", [("city", "Leeds")].into_iter().collect::<Value>())]
                .into_iter()
                .collect::<Value>(),
        )]
        .into_iter()
        .collect();

        assert_eq!(
            value.lookup_path("person.address.city"),
            Some(Value::from("Leeds"))
        );
        assert_eq!(value.lookup_path("person.missing"), None);
        assert_eq!(value.lookup_path(""), Some(value.clone()));
    }

    #[test]
    fn test_array_member_by_index() {
        let value = Value::from(vec!["a", "b"]);

        assert_eq!(value.get_member("1"), Some(Value::from("b")));
        assert_eq!(value.get_member("2"), None);
        assert_eq!(value.get_member("first"), None);
    }

    #[test]
    fn test_object_member() {
        let value = Value::object(Counter { count: 4 });

        assert_eq!(value.get_member("double"), Some(Value::Int(8)));
        assert_eq!(value.get_member("missing"), None);
        assert_eq!(value.to_string(), "counter(4)");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::from(vec![1, 2, 3]).to_string(), "1,2,3");

        let map: Value = [("a", 1)].into_iter().collect();
        assert_eq!(map.to_string(), r#"{"a":1}"#);
    }

    #[test]
    fn test_coerce_string_to_numbers() {
        assert_eq!(
            Value::from("42").coerce_to(ValueKind::Int),
            Some(Value::Int(42))
        );
        assert_eq!(Value::from("x").coerce_to(ValueKind::Int), None);

        let Some(Value::Float(x)) = Value::from(" 1.25 ").coerce_to(ValueKind::Float) else {
            panic!("Expected a float");
        };
        assert!(approx_eq!(f64, x, 1.25));
    }

    #[test]
    fn test_coerce_float_to_int_rounds() {
        assert_eq!(
            Value::Float(2.6).coerce_to(ValueKind::Int),
            Some(Value::Int(3))
        );
        assert_eq!(Value::Float(f64::NAN).coerce_to(ValueKind::Int), None);
    }

    #[test]
    fn test_loose_eq_coerces_right_operand() {
        assert!(Value::Int(1).loose_eq(&Value::from("1")));
        assert!(Value::from("1").loose_eq(&Value::Int(1)));
        assert!(Value::Bool(true).loose_eq(&Value::from("True")));
        assert!(!Value::Int(1).loose_eq(&Value::from("one")));
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::Null.loose_eq(&Value::Int(0)));
    }

    #[test]
    fn test_strict_eq_requires_same_kind() {
        assert!(Value::Int(1).strict_eq(&Value::Int(1)));
        assert!(!Value::Int(1).strict_eq(&Value::from("1")));
        assert!(!Value::Int(1).strict_eq(&Value::Float(1.0)));
        assert!(Value::from("a").strict_eq(&Value::safe("a")));
    }

    #[test]
    fn test_loose_cmp() {
        assert_eq!(
            Value::Int(2).loose_cmp(&Value::from("1")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Float(1.5).loose_cmp(&Value::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("abc").loose_cmp(&Value::from("abd")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Null.loose_cmp(&Value::Int(1)), None);
        assert_eq!(Value::from(vec![1]).loose_cmp(&Value::from(vec![1])), None);
    }

    #[test]
    fn test_entries() {
        let map: Value = [("x", 1), ("y", 2)].into_iter().collect();
        let entries = map.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].key.as_deref(), Some("y"));
        assert_eq!(entries[1].value, Value::Int(2));

        assert!(Value::from("abc").entries().is_none());
        assert!(Value::Int(3).entries().is_none());
    }
}
