use serde_json::Value;

use super::SchemaValue;

/// An example value the test author documents on purpose.
///
/// Wrapping a value marks it as part of the documented contract instead of an incidental
/// detail of the captured exchange. The wrapper is transparent on the wire: only its example
/// is sent, while [`create_schema`](super::create_schema) uses the metadata.
///
/// # Example
///
/// ```rust
/// use exemplar_core::schema::{Documented, SchemaValue, create_schema};
///
/// let email = Documented::new("ada@example.com")
///     .with_description("Contact address")
///     .required(true);
///
/// let body = SchemaValue::object([("email", SchemaValue::from(email))]);
/// let schema = create_schema(&body, true);
/// assert_eq!(schema.required.as_deref(), Some(&["email".to_string()][..]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Documented {
    example: SchemaValue,
    description: Option<String>,
    required: Option<bool>,
    format: Option<String>,
    enum_values: Option<Vec<Value>>,
    pattern: Option<String>,
}

/// Shorthand for [`Documented::new`].
pub fn documented(example: impl Into<SchemaValue>) -> Documented {
    Documented::new(example)
}

impl Documented {
    /// Wraps an example value.
    pub fn new(example: impl Into<SchemaValue>) -> Self {
        Self {
            example: example.into(),
            description: None,
            required: None,
            format: None,
            enum_values: None,
            pattern: None,
        }
    }

    /// Sets the field description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the value as required (or not) in its parent object.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Overrides the detected format (e.g. `"password"`).
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Restricts the value to a list of allowed values.
    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the pattern the value matches.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// The example value.
    pub fn example(&self) -> &SchemaValue {
        &self.example
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The explicit `required` flag, `None` when the author did not set it.
    pub fn is_required(&self) -> Option<bool> {
        self.required
    }

    /// The explicit format, if any.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// The allowed values, if any.
    pub fn enum_values(&self) -> Option<&[Value]> {
        self.enum_values.as_deref()
    }

    /// The pattern, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}
