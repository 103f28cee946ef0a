use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use super::Documented;

/// A captured value, classified once at the boundary.
///
/// Everything that flows into [`create_schema`](super::create_schema) is a `SchemaValue`.
/// Plain JSON converts losslessly through `From<serde_json::Value>`; the extra variants carry
/// what JSON cannot express: an absent value ([`SchemaValue::Undefined`]), an author-documented
/// value ([`SchemaValue::Documented`]) and a non-JSON runtime value ([`SchemaValue::Opaque`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaValue {
    /// No value at all (an omitted field).
    #[default]
    Undefined,
    /// JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// An ordered list of values.
    Array(Vec<SchemaValue>),
    /// A keyed mapping, in insertion order.
    Object(IndexMap<String, SchemaValue>),
    /// A value wrapped with documentation metadata.
    Documented(Box<Documented>),
    /// A value with no JSON representation, described by a short label.
    Opaque(String),
}

/// The dispatch key of a [`SchemaValue`], used by the generator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// [`SchemaValue::Undefined`]
    Undefined,
    /// [`SchemaValue::Null`]
    Null,
    /// [`SchemaValue::Bool`]
    Bool,
    /// [`SchemaValue::Number`]
    Number,
    /// [`SchemaValue::String`]
    String,
    /// [`SchemaValue::Array`]
    Array,
    /// [`SchemaValue::Object`]
    Object,
    /// [`SchemaValue::Documented`]
    Documented,
    /// [`SchemaValue::Opaque`]
    Opaque,
}

impl SchemaValue {
    /// Builds an object value from `(key, value)` pairs, keeping their order.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SchemaValue>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Builds an array value.
    pub fn array<V>(items: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<SchemaValue>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Converts any serializable value.
    ///
    /// # Errors
    ///
    /// Fails when `serde_json` cannot represent the value.
    pub fn from_serialize<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_value(value).map(Self::from)
    }

    /// Returns the dispatch key of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Undefined => ValueKind::Undefined,
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
            Self::Documented(_) => ValueKind::Documented,
            Self::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// `true` for [`SchemaValue::Undefined`] and [`SchemaValue::Null`].
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// The plain JSON this value stands for, as sent on the wire.
    ///
    /// Documented wrappers are replaced by their example, object entries without a JSON
    /// representation are dropped, and array items without one become `null`.
    /// Returns `None` when the value itself has no JSON representation.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Undefined | Self::Opaque(_) => None,
            Self::Null => Some(Value::Null),
            Self::Bool(value) => Some(Value::Bool(*value)),
            Self::Number(value) => Some(Value::Number(value.clone())),
            Self::String(value) => Some(Value::String(value.clone())),
            Self::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(Value::Null))
                    .collect(),
            )),
            Self::Object(entries) => Some(Value::Object(
                entries
                    .iter()
                    .filter_map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
                    .collect(),
            )),
            Self::Documented(documented) => documented.example().to_json(),
        }
    }
}

impl Serialize for SchemaValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().unwrap_or(Value::Null).serialize(serializer)
    }
}

impl From<Value> for SchemaValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(value) => Self::Number(value),
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Documented> for SchemaValue {
    fn from(value: Documented) -> Self {
        Self::Documented(Box::new(value))
    }
}

impl From<&str> for SchemaValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SchemaValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for SchemaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SchemaValue {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for SchemaValue {
    fn from(value: f64) -> Self {
        // NaN and infinities are not JSON numbers
        Number::from_f64(value).map_or_else(|| Self::Opaque(value.to_string()), Self::Number)
    }
}

impl<T> From<Option<T>> for SchemaValue
where
    T: Into<SchemaValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

impl<T> From<Vec<T>> for SchemaValue
where
    T: Into<SchemaValue>,
{
    fn from(value: Vec<T>) -> Self {
        Self::array(value)
    }
}

impl<V> From<IndexMap<String, V>> for SchemaValue
where
    V: Into<SchemaValue>,
{
    fn from(value: IndexMap<String, V>) -> Self {
        Self::object(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_convert_json_keeping_key_order() {
        let value = SchemaValue::from(json!({"zeta": 1, "alpha": [true, null]}));

        let SchemaValue::Object(entries) = &value else {
            panic!("expected an object, got {value:?}");
        };
        let keys = entries.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(value.to_json(), Some(json!({"zeta": 1, "alpha": [true, null]})));
    }

    #[test]
    fn should_strip_documented_wrappers_for_the_wire() {
        let value = SchemaValue::object([
            (
                "name",
                SchemaValue::from(Documented::new("Ada").with_description("user name")),
            ),
            ("missing", SchemaValue::Undefined),
            ("callback", SchemaValue::Opaque("fn".to_string())),
        ]);

        assert_eq!(value.to_json(), Some(json!({"name": "Ada"})));
    }

    #[test]
    fn should_map_non_finite_floats_to_opaque() {
        assert_eq!(SchemaValue::from(f64::NAN).kind(), ValueKind::Opaque);
        assert_eq!(SchemaValue::from(1.5).kind(), ValueKind::Number);
    }

    #[test]
    fn should_treat_none_as_undefined() {
        let value = SchemaValue::from(None::<String>);
        assert_eq!(value, SchemaValue::Undefined);
        assert!(value.is_nullish());
        assert_eq!(value.to_json(), None);
    }
}
