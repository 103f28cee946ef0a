use indexmap::IndexMap;
use serde_json::Value;

use super::format::detect_format;
use super::{SchemaFactory, SchemaFragment, SchemaGenerator, SchemaType, SchemaValue, ValueKind};

/// The built-in generator for every [`ValueKind`].
pub(super) fn defaults() -> IndexMap<ValueKind, Box<dyn SchemaGenerator>> {
    let mut generators: IndexMap<ValueKind, Box<dyn SchemaGenerator>> = IndexMap::new();
    generators.insert(ValueKind::Undefined, Box::new(undefined));
    generators.insert(ValueKind::Null, Box::new(null));
    generators.insert(ValueKind::Bool, Box::new(primitive));
    generators.insert(ValueKind::Number, Box::new(primitive));
    generators.insert(ValueKind::String, Box::new(primitive));
    generators.insert(ValueKind::Array, Box::new(array));
    generators.insert(ValueKind::Object, Box::new(object));
    generators.insert(ValueKind::Documented, Box::new(documented));
    generators.insert(ValueKind::Opaque, Box::new(fallback));
    generators
}

fn undefined(_: &SchemaValue, _: bool, _: &SchemaFactory) -> SchemaFragment {
    SchemaFragment::of(SchemaType::Object)
}

fn null(_: &SchemaValue, _: bool, _: &SchemaFactory) -> SchemaFragment {
    SchemaFragment::of(SchemaType::Null)
}

/// Placeholder for values we cannot describe.
pub(super) fn fallback(_: &SchemaValue, _: bool, _: &SchemaFactory) -> SchemaFragment {
    SchemaFragment::of(SchemaType::String)
}

fn primitive(value: &SchemaValue, include_example: bool, factory: &SchemaFactory) -> SchemaFragment {
    let (mut fragment, example) = match value {
        SchemaValue::Bool(flag) => (SchemaFragment::of(SchemaType::Boolean), Value::Bool(*flag)),
        SchemaValue::Number(number) => (
            SchemaFragment::of(SchemaType::Number),
            Value::Number(number.clone()),
        ),
        SchemaValue::String(text) => {
            let fragment = SchemaFragment {
                format: detect_format(text).map(str::to_string),
                ..SchemaFragment::of(SchemaType::String)
            };
            (fragment, Value::String(text.clone()))
        }
        _ => return fallback(value, include_example, factory),
    };

    if include_example {
        fragment.example = Some(example);
    }
    fragment
}

fn array(value: &SchemaValue, include_example: bool, factory: &SchemaFactory) -> SchemaFragment {
    let SchemaValue::Array(items) = value else {
        return fallback(value, include_example, factory);
    };

    // only the first element drives the item shape
    let items = items.first().map_or_else(
        || SchemaFragment::of(SchemaType::String),
        |first| factory.create_schema(first, include_example),
    );
    SchemaFragment::array_of(items)
}

fn object(value: &SchemaValue, include_example: bool, factory: &SchemaFactory) -> SchemaFragment {
    let SchemaValue::Object(entries) = value else {
        return fallback(value, include_example, factory);
    };

    let mut properties = IndexMap::with_capacity(entries.len());
    let mut required = Vec::new();
    for (name, property) in entries {
        let is_required = match property {
            SchemaValue::Documented(documented) => documented.is_required() == Some(true),
            other => !other.is_nullish(),
        };
        if is_required {
            required.push(name.clone());
        }
        properties.insert(name.clone(), factory.create_schema(property, include_example));
    }

    SchemaFragment {
        properties: Some(properties),
        required: (!required.is_empty()).then_some(required),
        ..SchemaFragment::of(SchemaType::Object)
    }
}

fn documented(value: &SchemaValue, include_example: bool, factory: &SchemaFactory) -> SchemaFragment {
    let SchemaValue::Documented(documented) = value else {
        return fallback(value, include_example, factory);
    };

    let mut fragment = factory.create_schema(documented.example(), include_example);
    if let Some(description) = documented.description() {
        fragment.description = Some(description.to_string());
    }
    if let Some(format) = documented.format() {
        fragment.format = Some(format.to_string());
    }
    if let Some(values) = documented.enum_values() {
        fragment.enum_values = Some(values.to_vec());
    }
    if let Some(pattern) = documented.pattern() {
        fragment.pattern = Some(pattern.to_string());
    }
    if include_example {
        // opaque examples have no JSON form and stay undocumented
        if let Some(example) = documented.example().to_json() {
            fragment.example = Some(example);
        }
    }
    fragment
}
