//! Item documents.
//!
//! Items are edited and exported as JSON in one of two shapes:
//!
//! - **simple**: plain JSON, `{"id": "a", "age": 30, "tags": ["x"]}`
//! - **raw**: every value tagged with its DynamoDB type,
//!   `{"id": {"s": "a"}, "age": {"n": "30"}, "tags": {"ss": ["x"]}}`
//!
//! The raw tags are `s`, `n`, `bool`, `nul`, `l`, `m`, `ss` and `ns`. Binary values
//! have no raw representation.
//!
//! Numbers keep their exact text in both shapes, up to DynamoDB's 38 digits.

use crate::common;
use crate::error::{Error, Result};

use aws_sdk_dynamodb::types;
use serde_json::{Map, Value};

/// The shape of a JSON item document.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DocumentFormat {
    /// Plain JSON values.
    #[default]
    Simple,
    /// Type-tagged values.
    Raw,
}

/// Parse a plain JSON object into an item.
pub fn from_simple_json(text: &str) -> Result<common::Item> {
    let value: Value = serde_json::from_str(text)?;
    from_simple_value(value)
}

fn from_simple_value(value: Value) -> Result<common::Item> {
    match value {
        Value::Object(object) => from_simple_object(object),
        other => Err(Error::UnsupportedValue(format!(
            "expected a JSON object, found {other}"
        ))),
    }
}

fn from_simple_object(object: Map<String, Value>) -> Result<common::Item> {
    object
        .into_iter()
        .map(|(name, value)| from_simple_attribute(value).map(|value| (name, value)))
        .collect()
}

// Numbers keep their exact text in both directions.
fn from_simple_attribute(value: Value) -> Result<types::AttributeValue> {
    let attribute_value = match value {
        Value::Number(number) => types::AttributeValue::N(number.to_string()),
        Value::Array(values) => types::AttributeValue::L(
            values
                .into_iter()
                .map(from_simple_attribute)
                .collect::<Result<_>>()?,
        ),
        Value::Object(object) => types::AttributeValue::M(from_simple_object(object)?),
        other => serde_dynamo::to_attribute_value(other)?,
    };
    Ok(attribute_value)
}

fn number_value(number: &str) -> Result<Value> {
    number
        .parse::<serde_json::Number>()
        .map(Value::Number)
        .map_err(|_| Error::UnsupportedValue(format!("'{number}' is not a JSON number")))
}

fn to_simple_attribute(value: &types::AttributeValue) -> Result<Value> {
    let simple = match value {
        types::AttributeValue::N(number) => number_value(number)?,
        types::AttributeValue::Ns(numbers) => Value::Array(
            numbers
                .iter()
                .map(|number| number_value(number))
                .collect::<Result<_>>()?,
        ),
        types::AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(to_simple_attribute)
                .collect::<Result<_>>()?,
        ),
        types::AttributeValue::M(values) => to_simple_value(values)?,
        other => serde_dynamo::from_attribute_value(other.clone())?,
    };
    Ok(simple)
}

fn to_simple_value(item: &common::Item) -> Result<Value> {
    let object = item
        .iter()
        .map(|(name, value)| to_simple_attribute(value).map(|value| (name.clone(), value)))
        .collect::<Result<Map<_, _>>>()?;
    Ok(Value::Object(object))
}

/// Render an item as pretty-printed plain JSON, keys sorted.
pub fn to_simple_json(item: &common::Item) -> Result<String> {
    let text = serde_json::to_string_pretty(&to_simple_value(item)?)?;
    Ok(text)
}

fn raw_text<'a>(tag: &str, value: &'a Value) -> Result<std::borrow::Cow<'a, str>> {
    match value {
        Value::String(text) => Ok(text.as_str().into()),
        Value::Number(number) => Ok(number.to_string().into()),
        Value::Bool(flag) => Ok(flag.to_string().into()),
        _ => Err(Error::InvalidRawDocument(format!(
            "'{tag}' expects a scalar, found {value}"
        ))),
    }
}

fn raw_array<'a>(tag: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::InvalidRawDocument(format!("'{tag}' expects an array, found {value}")))
}

fn from_raw_value(value: &Value) -> Result<types::AttributeValue> {
    let (tag, inner) = match value.as_object() {
        Some(object) if object.len() == 1 => object
            .iter()
            .next()
            .ok_or_else(|| Error::InvalidRawDocument(value.to_string()))?,
        _ => {
            return Err(Error::InvalidRawDocument(format!(
                "expected an object with a single type tag, found {value}"
            )));
        }
    };
    let attribute_value = match tag.as_str() {
        "s" => types::AttributeValue::S(raw_text(tag, inner)?.into_owned()),
        "n" => types::AttributeValue::N(raw_text(tag, inner)?.into_owned()),
        "bool" => {
            let flag = match inner {
                Value::Bool(flag) => *flag,
                other => raw_text(tag, other)?.eq_ignore_ascii_case("true"),
            };
            types::AttributeValue::Bool(flag)
        }
        "nul" => types::AttributeValue::Null(true),
        "l" => types::AttributeValue::L(
            raw_array(tag, inner)?
                .iter()
                .map(from_raw_value)
                .collect::<Result<_>>()?,
        ),
        "m" => {
            let object = inner.as_object().ok_or_else(|| {
                Error::InvalidRawDocument(format!("'m' expects an object, found {inner}"))
            })?;
            types::AttributeValue::M(from_raw_object(object)?)
        }
        "ss" => types::AttributeValue::Ss(
            raw_array(tag, inner)?
                .iter()
                .map(|element| raw_text(tag, element).map(|text| text.into_owned()))
                .collect::<Result<_>>()?,
        ),
        "ns" => types::AttributeValue::Ns(
            raw_array(tag, inner)?
                .iter()
                .map(|element| raw_text(tag, element).map(|text| text.into_owned()))
                .collect::<Result<_>>()?,
        ),
        other => return Err(Error::InvalidRawDocument(format!("unsupported type tag '{other}'"))),
    };
    Ok(attribute_value)
}

fn from_raw_object(object: &Map<String, Value>) -> Result<common::Item> {
    object
        .iter()
        .map(|(name, value)| from_raw_value(value).map(|value| (name.clone(), value)))
        .collect()
}

fn tagged(tag: &str, value: Value) -> Value {
    Value::Object(Map::from_iter([(tag.to_string(), value)]))
}

fn to_raw_value(value: &types::AttributeValue) -> Result<Value> {
    let raw = match value {
        types::AttributeValue::S(text) => tagged("s", Value::String(text.clone())),
        types::AttributeValue::N(number) => tagged("n", Value::String(number.clone())),
        types::AttributeValue::Bool(flag) => tagged("bool", Value::Bool(*flag)),
        types::AttributeValue::Null(_) => tagged("nul", Value::Bool(true)),
        types::AttributeValue::L(values) => tagged(
            "l",
            Value::Array(values.iter().map(to_raw_value).collect::<Result<_>>()?),
        ),
        types::AttributeValue::M(values) => tagged("m", to_raw_object(values)?),
        types::AttributeValue::Ss(values) => tagged(
            "ss",
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        ),
        types::AttributeValue::Ns(values) => tagged(
            "ns",
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        ),
        types::AttributeValue::B(_) | types::AttributeValue::Bs(_) => {
            return Err(Error::UnsupportedValue(
                "binary values have no raw representation".to_string(),
            ));
        }
        other => return Err(Error::UnsupportedValue(format!("{other:?}"))),
    };
    Ok(raw)
}

fn to_raw_object(item: &common::Item) -> Result<Value> {
    let object = item
        .iter()
        .map(|(name, value)| to_raw_value(value).map(|value| (name.clone(), value)))
        .collect::<Result<Map<_, _>>>()?;
    Ok(Value::Object(object))
}

/// Parse a type-tagged JSON object into an item.
pub fn from_raw_json(text: &str) -> Result<common::Item> {
    let value: Value = serde_json::from_str(text)?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidRawDocument("expected a JSON object".to_string()))?;
    from_raw_object(object)
}

/// Render an item as pretty-printed type-tagged JSON, keys sorted.
pub fn to_raw_json(item: &common::Item) -> Result<String> {
    let text = serde_json::to_string_pretty(&to_raw_object(item)?)?;
    Ok(text)
}

/// Parse a document in the given format.
pub fn parse_item(text: &str, format: DocumentFormat) -> Result<common::Item> {
    match format {
        DocumentFormat::Simple => from_simple_json(text),
        DocumentFormat::Raw => from_raw_json(text),
    }
}

/// Render an item in the given format.
pub fn render_item(item: &common::Item, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Simple => to_simple_json(item),
        DocumentFormat::Raw => to_raw_json(item),
    }
}

/// Convert a document from one format to the other.
///
/// ```rust
/// use dynamodb_browser::codec;
///
/// let raw = codec::convert_document(r#"{"id": "a"}"#, codec::DocumentFormat::Raw).unwrap();
/// assert_eq!(raw, "{\n  \"id\": {\n    \"s\": \"a\"\n  }\n}");
/// ```
pub fn convert_document(text: &str, to: DocumentFormat) -> Result<String> {
    let from = match to {
        DocumentFormat::Simple => DocumentFormat::Raw,
        DocumentFormat::Raw => DocumentFormat::Simple,
    };
    render_item(&parse_item(text, from)?, to)
}

/// Render items as a JSON array of simple documents.
pub fn export_items(items: &[common::Item]) -> Result<String> {
    let values = items
        .iter()
        .map(to_simple_value)
        .collect::<Result<Vec<_>>>()?;
    let text = serde_json::to_string_pretty(&values)?;
    Ok(text)
}

/// Parse a JSON array of simple documents.
pub fn import_items(text: &str) -> Result<Vec<common::Item>> {
    let values: Vec<Value> = serde_json::from_str(text)?;
    values.into_iter().map(from_simple_value).collect()
}
