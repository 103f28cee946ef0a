use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, SchemaFormat, Type};
use utoipa::openapi::{RefOr, Schema};

/// The `type` keyword of a [`SchemaFragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"boolean"`
    Boolean,
    /// `"array"`
    Array,
    /// `"object"`
    Object,
    /// `"null"`
    Null,
}

/// A minimal OpenAPI schema, built bottom-up by [`create_schema`](super::create_schema).
///
/// Serializes to the plain JSON form (`type`, `format`, `example`, `description`, `enum`,
/// `pattern`, `properties`, `required`, `items`), omitting absent keywords.
/// Every fragment has exactly one `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaFragment {
    /// The single JSON type of the value.
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    /// Detected or explicit string format, e.g. `"email"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// The observed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Regular expression the value matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Object properties, in insertion order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaFragment>>,
    /// Property names that must be present, never empty when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Shape of the array items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,
}

impl SchemaFragment {
    /// A bare fragment of the given type.
    pub fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            format: None,
            example: None,
            description: None,
            enum_values: None,
            pattern: None,
            properties: None,
            required: None,
            items: None,
        }
    }

    /// An `array` fragment with the given item shape.
    pub fn array_of(items: SchemaFragment) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    /// The plain JSON form of this fragment.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Converts the fragment into a `utoipa` schema, for assemblers built on `utoipa`.
    ///
    /// Formats are emitted as [`SchemaFormat::Custom`] so every detected format survives
    /// regardless of the `utoipa` features enabled.
    ///
    /// The `utoipa` array model has no `format`, `enum` or `pattern`: on an `array`
    /// fragment these keywords are dropped, while the same keywords on its `items` are kept.
    pub fn to_utoipa(&self) -> RefOr<Schema> {
        if self.schema_type == SchemaType::Array {
            let items = self.items.as_deref().map_or_else(
                || ObjectBuilder::new().schema_type(Type::String).into(),
                SchemaFragment::to_utoipa,
            );
            let builder = ArrayBuilder::new()
                .items(items)
                .description(self.description.clone())
                .examples(self.example.clone());
            return builder.into();
        }

        let schema_type = match self.schema_type {
            SchemaType::String => Type::String,
            SchemaType::Number => Type::Number,
            SchemaType::Boolean => Type::Boolean,
            SchemaType::Object | SchemaType::Array => Type::Object,
            SchemaType::Null => Type::Null,
        };

        let mut builder = ObjectBuilder::new()
            .schema_type(schema_type)
            .format(self.format.clone().map(SchemaFormat::Custom))
            .description(self.description.clone())
            .enum_values(self.enum_values.clone())
            .pattern(self.pattern.clone())
            .examples(self.example.clone());

        for (name, property) in self.properties.iter().flatten() {
            builder = builder.property(name, property.to_utoipa());
        }
        for name in self.required.iter().flatten() {
            builder = builder.required(name);
        }

        builder.into()
    }
}
