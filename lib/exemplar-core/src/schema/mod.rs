//! Schema synthesis from captured values.
//!
//! [`create_schema`] turns any [`SchemaValue`] into a minimal OpenAPI [`SchemaFragment`],
//! recursively and without ever failing:
//!
//! | Value | Fragment |
//! |---|---|
//! | undefined | `{type: "object"}` |
//! | `null` | `{type: "null"}` |
//! | [`Documented`] | schema of its example, enriched with its metadata |
//! | array | `{type: "array", items}`, items from the first element (`string` when empty) |
//! | object | `{type: "object", properties, required}` |
//! | string / number / boolean | `{type, format?, example?}` |
//! | anything else | `{type: "string"}` |
//!
//! Generators live in a table keyed by [`ValueKind`]; a [`SchemaFactory`] can replace any
//! of them with [`SchemaFactory::register_generator`].
//!
//! ```rust
//! use exemplar_core::schema::{SchemaValue, create_schema};
//! use serde_json::json;
//!
//! let schema = create_schema(&SchemaValue::from(json!("a@b.com")), true);
//! assert_eq!(
//!     schema.to_json(),
//!     json!({"type": "string", "format": "email", "example": "a@b.com"})
//! );
//! ```

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;

mod documented;
pub use self::documented::{Documented, documented};

mod format;
pub use self::format::detect_format;

mod fragment;
pub use self::fragment::{SchemaFragment, SchemaType};

mod generators;

mod value;
pub use self::value::{SchemaValue, ValueKind};

static DEFAULT_FACTORY: LazyLock<SchemaFactory> = LazyLock::new(SchemaFactory::default);

/// Builds the schema fragment of a value with the built-in generators.
///
/// When `include_example` is `false`, no `example` keyword is emitted anywhere in the tree.
pub fn create_schema(value: &SchemaValue, include_example: bool) -> SchemaFragment {
    DEFAULT_FACTORY.create_schema(value, include_example)
}

/// Produces the fragment of one kind of value.
///
/// The factory is passed along so generators can recurse into nested values.
/// Any `Fn(&SchemaValue, bool, &SchemaFactory) -> SchemaFragment` closure is a generator.
pub trait SchemaGenerator: Send + Sync {
    /// Builds the fragment of `value`.
    fn generate(
        &self,
        value: &SchemaValue,
        include_example: bool,
        factory: &SchemaFactory,
    ) -> SchemaFragment;
}

impl<F> SchemaGenerator for F
where
    F: Fn(&SchemaValue, bool, &SchemaFactory) -> SchemaFragment + Send + Sync,
{
    fn generate(
        &self,
        value: &SchemaValue,
        include_example: bool,
        factory: &SchemaFactory,
    ) -> SchemaFragment {
        self(value, include_example, factory)
    }
}

/// A generator table dispatching on [`ValueKind`].
pub struct SchemaFactory {
    generators: IndexMap<ValueKind, Box<dyn SchemaGenerator>>,
}

impl Default for SchemaFactory {
    fn default() -> Self {
        Self {
            generators: generators::defaults(),
        }
    }
}

impl fmt::Debug for SchemaFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self.generators.keys().collect::<Vec<_>>();
        f.debug_tuple("SchemaFactory").field(&kinds).finish()
    }
}

impl SchemaFactory {
    /// Creates a factory with the built-in generators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the generator of one kind of value.
    pub fn register_generator(
        &mut self,
        kind: ValueKind,
        generator: impl SchemaGenerator + 'static,
    ) -> &mut Self {
        self.generators.insert(kind, Box::new(generator));
        self
    }

    /// Builds the fragment of `value`, degrading to `{type: "string"}` when no generator
    /// handles its kind.
    pub fn create_schema(&self, value: &SchemaValue, include_example: bool) -> SchemaFragment {
        match self.generators.get(&value.kind()) {
            Some(generator) => generator.generate(value, include_example, self),
            None => generators::fallback(value, include_example, self),
        }
    }
}
