use crate::common;

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::fmt;
use std::fmt::Write as _;

/// Attribute name to declared or sampled type.
pub type AttributeTypeMap = IndexMap<String, AttributeType>;

/// The kind of value a stored attribute holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeType {
    /// `S`
    String,
    /// `N`
    Number,
    /// `BOOL`
    Boolean,
    /// `B`
    Binary,
    /// `NULL`
    Null,
    /// `L`
    List,
    /// `M`
    Map,
    /// `SS`
    StringSet,
    /// `NS`
    NumberSet,
    /// `BS`
    BinarySet,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Binary => "BINARY",
            Self::Null => "NULL",
            Self::List => "LIST",
            Self::Map => "MAP",
            Self::StringSet => "STRING_SET",
            Self::NumberSet => "NUMBER_SET",
            Self::BinarySet => "BINARY_SET",
        };
        f.write_str(name)
    }
}

impl AttributeType {
    /// The type of a stored value, `None` for variants unknown to this SDK version.
    #[must_use]
    pub fn of(value: &types::AttributeValue) -> Option<Self> {
        let attribute_type = match value {
            types::AttributeValue::S(_) => Self::String,
            types::AttributeValue::N(_) => Self::Number,
            types::AttributeValue::B(_) => Self::Binary,
            types::AttributeValue::Bool(_) => Self::Boolean,
            types::AttributeValue::Null(_) => Self::Null,
            types::AttributeValue::L(_) => Self::List,
            types::AttributeValue::M(_) => Self::Map,
            types::AttributeValue::Ss(_) => Self::StringSet,
            types::AttributeValue::Ns(_) => Self::NumberSet,
            types::AttributeValue::Bs(_) => Self::BinarySet,
            _ => return None,
        };
        Some(attribute_type)
    }

    /// The type declared by an attribute definition (`S`, `N` or `B`).
    #[must_use]
    pub fn from_scalar(scalar: &types::ScalarAttributeType) -> Option<Self> {
        match scalar {
            types::ScalarAttributeType::S => Some(Self::String),
            types::ScalarAttributeType::N => Some(Self::Number),
            types::ScalarAttributeType::B => Some(Self::Binary),
            _ => None,
        }
    }

    /// Build the value a filter term compares against.
    ///
    /// Numbers are re-serialized canonically and booleans parse `true` case-insensitively.
    /// A term that is not a number is kept as a string and reported back as a
    /// [`CoercionFallback`].
    #[must_use]
    pub fn typed_value(
        declared: Option<Self>,
        attribute: &str,
        term: &str,
    ) -> (types::AttributeValue, Option<CoercionFallback>) {
        match declared {
            Some(Self::Number) => match canonical_number(term) {
                Some(number) => (types::AttributeValue::N(number), None),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        attribute,
                        term,
                        "filter term is not a number, comparing as a string"
                    );
                    let fallback = CoercionFallback {
                        attribute: attribute.to_string(),
                        declared: Self::Number,
                        term: term.to_string(),
                    };
                    (types::AttributeValue::S(term.to_string()), Some(fallback))
                }
            },
            Some(Self::Boolean) => (
                types::AttributeValue::Bool(term.eq_ignore_ascii_case("true")),
                None,
            ),
            _ => (types::AttributeValue::S(term.to_string()), None),
        }
    }
}

/// A filter term that could not be coerced to the declared attribute type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoercionFallback {
    /// The filtered attribute.
    pub attribute: String,
    /// The type the attribute is declared with.
    pub declared: AttributeType,
    /// The term that was stored as a string instead.
    pub term: String,
}

impl fmt::Display for CoercionFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid {} for attribute '{}', compared as a string",
            self.term, self.declared, self.attribute
        )
    }
}

/// Validate a decimal literal and render it canonically.
///
/// Accepts `[+-]digits[.digits][(e|E)[+-]digits]` with at least one digit in the
/// mantissa. The literal is read as an unscaled integer and a scale, the number of
/// fraction digits less the exponent, so `25E-02` and `0.25` are the same number.
/// It is written plainly when the scale is not negative and the adjusted exponent
/// is at least `-6`, otherwise as one digit, the remaining digits and `E+n` / `E-n`.
/// Trailing fraction zeros are kept and negative zero loses its sign.
///
/// ```rust
/// use dynamodb_browser::common::attribute::canonical_number;
///
/// assert_eq!(canonical_number("12.5e1").as_deref(), Some("125"));
/// assert_eq!(canonical_number("1e3").as_deref(), Some("1E+3"));
/// assert_eq!(canonical_number("12a"), None);
/// ```
#[must_use]
pub fn canonical_number(text: &str) -> Option<String> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(position) => (&unsigned[..position], Some(&unsigned[position + 1..])),
        None => (unsigned, None),
    };
    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let is_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if !is_digits(integer) || !is_digits(fraction) || integer.len() + fraction.len() == 0 {
        return None;
    }
    let exponent: i64 = match exponent {
        Some(exponent) => {
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if digits.is_empty() || !is_digits(digits) {
                return None;
            }
            exponent.parse().ok()?
        }
        None => 0,
    };
    let digits = format!("{integer}{fraction}");
    let coefficient = match digits.trim_start_matches('0') {
        "" => "0",
        coefficient => coefficient,
    };
    let scale = i64::try_from(fraction.len()).ok()?.checked_sub(exponent)?;
    let adjusted = i64::try_from(coefficient.len() - 1)
        .ok()?
        .checked_sub(scale)?;
    let mut number = String::with_capacity(coefficient.len() + 8);
    if negative && coefficient != "0" {
        number.push('-');
    }
    match usize::try_from(scale) {
        Ok(0) if adjusted >= -6 => number.push_str(coefficient),
        Ok(scale) if adjusted >= -6 => {
            if coefficient.len() > scale {
                let (integer, fraction) = coefficient.split_at(coefficient.len() - scale);
                number.push_str(integer);
                number.push('.');
                number.push_str(fraction);
            } else {
                number.push_str("0.");
                number.push_str(&"0".repeat(scale - coefficient.len()));
                number.push_str(coefficient);
            }
        }
        _ => {
            let (first, rest) = coefficient.split_at(1);
            number.push_str(first);
            if !rest.is_empty() {
                number.push('.');
                number.push_str(rest);
            }
            if adjusted != 0 {
                let _ = write!(number, "E{adjusted:+}");
            }
        }
    }
    Some(number)
}

/// Sample the type of every attribute of the given items.
///
/// When the sampled values of an attribute disagree, the first observed type wins.
#[must_use]
pub fn infer_attribute_types(items: &[common::Item]) -> AttributeTypeMap {
    let mut attribute_types = AttributeTypeMap::new();
    merge_attribute_types(&mut attribute_types, items);
    attribute_types
}

/// Add the types sampled from `items` to `attribute_types` without overriding known types.
pub fn merge_attribute_types(attribute_types: &mut AttributeTypeMap, items: &[common::Item]) {
    for item in items {
        for (name, value) in item {
            if let Some(attribute_type) = AttributeType::of(value) {
                attribute_types
                    .entry(name.clone())
                    .or_insert(attribute_type);
            }
        }
    }
}

/// Sort the map so the hash key comes first, then the range key, then the rest by name.
pub fn order_keys_first(attribute_types: &mut AttributeTypeMap, key_schema: &common::key::KeySchema) {
    let rank = |name: &str| {
        if name == key_schema.hash_key {
            0
        } else if key_schema.range_key.as_deref() == Some(name) {
            1
        } else {
            2
        }
    };
    attribute_types.sort_by(|left, _, right, _| {
        rank(left.as_str())
            .cmp(&rank(right.as_str()))
            .then_with(|| left.cmp(right))
    });
}
