use crate::common;

use aws_sdk_dynamodb::types;
use std::collections;

/// The comparison a filter fragment performs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `~term`: `contains(#a, :a)`.
    Contains,
    /// `^term`: `begins_with(#a, :a)`.
    BeginsWith,
    /// `$`: `attribute_exists(#a)`.
    Exists,
    /// `!=term`: `#a <> :a`.
    NotEquals,
    /// `!~term`: `not contains(#a, :a)`.
    NotContains,
    /// `!$`: `attribute_not_exists(#a)`.
    NotExists,
    /// Anything else: `#a = :a`.
    Equals,
}

/// One compiled condition on one attribute.
///
/// The expression holds exactly one name placeholder (`#attribute`) and at most one
/// value placeholder (`:attribute`).
#[derive(Clone, Debug, PartialEq)]
pub struct FilterFragment {
    /// The operator the fragment was compiled from.
    pub operator: Operator,
    /// The condition expression.
    pub expression: String,
    /// Name placeholder to attribute name, exactly one entry.
    pub names: collections::HashMap<String, String>,
    /// Value placeholder to value, empty for existence checks.
    pub values: collections::HashMap<String, types::AttributeValue>,
    /// Set when the term could not be coerced to the declared type.
    pub fallback: Option<common::attribute::CoercionFallback>,
}

impl FilterFragment {
    /// A fragment without a value placeholder, `template` receives the name placeholder.
    pub(crate) fn unary(
        operator: Operator,
        attribute: &str,
        template: impl FnOnce(&str) -> String,
    ) -> Self {
        let name_placeholder = common::name_placeholder(attribute);
        Self {
            operator,
            expression: template(&name_placeholder),
            names: collections::HashMap::from([(name_placeholder, attribute.to_string())]),
            values: collections::HashMap::new(),
            fallback: None,
        }
    }

    /// A fragment comparing against `value`, `template` receives both placeholders.
    pub(crate) fn binary(
        operator: Operator,
        attribute: &str,
        value: types::AttributeValue,
        fallback: Option<common::attribute::CoercionFallback>,
        template: impl FnOnce(&str, &str) -> String,
    ) -> Self {
        let name_placeholder = common::name_placeholder(attribute);
        let value_placeholder = common::value_placeholder(attribute);
        Self {
            operator,
            expression: template(&name_placeholder, &value_placeholder),
            names: collections::HashMap::from([(name_placeholder, attribute.to_string())]),
            values: collections::HashMap::from([(value_placeholder, value)]),
            fallback,
        }
    }

    /// The compared value, `None` for existence checks.
    #[must_use]
    pub fn value(&self) -> Option<&types::AttributeValue> {
        self.values.values().next()
    }
}

impl From<FilterFragment> for common::ExpressionInput {
    fn from(fragment: FilterFragment) -> Self {
        Self {
            expression: fragment.expression,
            expression_attribute_names: fragment.names,
            expression_attribute_values: fragment.values,
        }
    }
}
