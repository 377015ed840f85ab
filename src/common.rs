//! Common types for DynamoDB expressions and table metadata.
//!
//! This module provides the types shared by the filter compiler, the read path and
//! the write path: attribute types, key schemas, and the expression input that
//! carries an expression string together with its placeholder maps.

/// Attribute types, type inference and typed value construction.
pub mod attribute;

/// Key schemas, secondary indexes and table descriptions.
pub mod key;

use aws_sdk_dynamodb::types;
use std::fmt::Write as _;
use std::{collections, ops};

/// A DynamoDB item: attribute name to attribute value.
pub type Item = collections::HashMap<String, types::AttributeValue>;

/// Logical operator for combining expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all expressions must be true.
    And,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
        }
    }
}

/// Tokens of the key condition placeholders built by `read::query`.
pub(crate) const KEY_PLACEHOLDER_TOKENS: [&str; 4] = ["hk", "hkval", "rk", "rkval"];

/// Placeholder token of an attribute name.
///
/// ASCII letters and digits are kept, any other character becomes `_<hex>_`, so
/// distinct names give distinct tokens that DynamoDB accepts. Names equal to a key
/// placeholder token have their first character escaped.
fn placeholder_token(attribute: &str) -> String {
    let reserved = KEY_PLACEHOLDER_TOKENS.contains(&attribute);
    let mut token = String::with_capacity(attribute.len());
    for (position, character) in attribute.chars().enumerate() {
        if character.is_ascii_alphanumeric() && !(reserved && position == 0) {
            token.push(character);
        } else {
            let _ = write!(token, "_{:x}_", u32::from(character));
        }
    }
    token
}

pub(crate) fn name_placeholder(attribute: &str) -> String {
    format!("#{}", placeholder_token(attribute))
}

pub(crate) fn value_placeholder(attribute: &str) -> String {
    format!(":{}", placeholder_token(attribute))
}

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// An expression string with its attribute name and value placeholders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionInput {
    /// The expression, e.g. `(#age = :age) AND (attribute_exists(#name))`.
    pub expression: String,
    /// Placeholder (`#name`) to attribute name.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Placeholder (`:name`) to attribute value.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    /// Move the placeholders into the given request maps and return the expression.
    ///
    /// Empty maps stay `None`: DynamoDB rejects empty placeholder maps.
    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        if !self.expression_attribute_names.is_empty() {
            names
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.expression_attribute_names);
        }
        if !self.expression_attribute_values.is_empty() {
            values
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.expression_attribute_values);
        }
        self.expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn input(expression: &str, name: &str, value: Option<&str>) -> ExpressionInput {
        ExpressionInput {
            expression: expression.to_string(),
            expression_attribute_names: collections::HashMap::from([(
                format!("#{name}"),
                name.to_string(),
            )]),
            expression_attribute_values: value
                .map(|value| {
                    collections::HashMap::from([(
                        format!(":{name}"),
                        types::AttributeValue::S(value.to_string()),
                    )])
                })
                .unwrap_or_default(),
        }
    }

    #[rstest]
    #[case::empty(LogicalOperator::And, vec![], "")]
    #[case::single(
        LogicalOperator::And,
        vec![input("#a = :a", "a", Some("x"))],
        "#a = :a"
    )]
    #[case::and(
        LogicalOperator::And,
        vec![input("#a = :a", "a", Some("x")), input("attribute_exists(#b)", "b", None)],
        "#a = :a AND attribute_exists(#b)"
    )]
    fn test_merge(
        #[case] operator: LogicalOperator,
        #[case] items: Vec<ExpressionInput>,
        #[case] expected: &str,
    ) {
        let count = items.len();
        let merged = ExpressionInput::merge(&operator, items);
        assert_eq!(merged.expression, expected);
        assert_eq!(merged.expression_attribute_names.len(), count);
    }

    #[rstest]
    #[case::plain("age", "#age", ":age")]
    #[case::dash("first-name", "#first_2d_name", ":first_2d_name")]
    #[case::underscore("first_name", "#first_5f_name", ":first_5f_name")]
    #[case::dot_and_space("a.b c", "#a_2e_b_20_c", ":a_2e_b_20_c")]
    #[case::unicode("größe", "#gr_f6__df_e", ":gr_f6__df_e")]
    #[case::hash_key_token("hk", "#_68_k", ":_68_k")]
    #[case::range_value_token("rkval", "#_72_kval", ":_72_kval")]
    #[case::token_prefix("hkx", "#hkx", ":hkx")]
    fn test_placeholders(
        #[case] attribute: &str,
        #[case] expected_name: &str,
        #[case] expected_value: &str,
    ) {
        assert_eq!(name_placeholder(attribute), expected_name);
        assert_eq!(value_placeholder(attribute), expected_value);
    }

    #[test]
    fn test_placeholders_are_distinct() {
        let attributes = ["a-b", "a_2d_b", "a_b", "a b", "hk", "_68_k", "h", "k"];
        let placeholders = attributes
            .iter()
            .map(|attribute| name_placeholder(attribute))
            .collect::<collections::HashSet<_>>();
        assert_eq!(placeholders.len(), attributes.len());
        assert!(!placeholders.contains("#hk"));
    }

    #[rstest]
    #[case::into_empty(None, None, Some(1), None)]
    #[case::into_existing(
        Some(collections::HashMap::from([("#k".to_string(), "k".to_string())])),
        Some(collections::HashMap::from([(":k".to_string(), types::AttributeValue::S("v".to_string()))])),
        Some(2),
        Some(1)
    )]
    fn test_merge_into(
        #[case] mut names: Option<collections::HashMap<String, String>>,
        #[case] mut values: Option<collections::HashMap<String, types::AttributeValue>>,
        #[case] expected_names: Option<usize>,
        #[case] expected_values: Option<usize>,
    ) {
        let expression = input("attribute_exists(#a)", "a", None).merge_into(&mut names, &mut values);
        assert_eq!(expression, "attribute_exists(#a)");
        assert_eq!(names.map(|names| names.len()), expected_names);
        assert_eq!(values.map(|values| values.len()), expected_values);
    }
}
