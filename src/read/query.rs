use crate::error::{Error, Result};
use crate::{common, filter, read, store};

use common::attribute::{AttributeType, CoercionFallback};
use filter::fragment::Operator;

const HASH_NAME: &str = "#hk";
const HASH_VALUE: &str = ":hkval";
const RANGE_NAME: &str = "#rk";
const RANGE_VALUE: &str = ":rkval";

/// A key condition built from the column filters of the key attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyCondition {
    /// `#hk = :hkval`, optionally followed by a range key condition.
    pub input: common::ExpressionInput,
    /// Key attributes used by the condition, to keep them out of the filter.
    pub consumed: Vec<String>,
    /// Key terms compared as strings instead of their declared type.
    pub fallbacks: Vec<CoercionFallback>,
}

/// The operator and term a key attribute's filter text compiles to.
fn key_term<'a>(filters: &'a filter::AttributeFilterMap, attribute: &str) -> Option<(Operator, &'a str)> {
    let trimmed = filter::active_text(filters, attribute)?.trim();
    filter::parser::PARSERS.iter().find_map(|parser| {
        parser
            .term(trimmed)
            .map(|term| (parser.operator(), term))
    })
}

fn declared_type(
    table_name: &str,
    attribute_types: &common::attribute::AttributeTypeMap,
    attribute: &str,
) -> Result<AttributeType> {
    attribute_types.get(attribute).copied().ok_or_else(|| {
        Error::missing_metadata(
            table_name,
            format!("no declared type for key attribute '{attribute}'"),
        )
    })
}

fn key_input(
    name_placeholder: &str,
    value_placeholder: &str,
    attribute: &str,
    value: aws_sdk_dynamodb::types::AttributeValue,
    template: impl FnOnce(&str, &str) -> String,
) -> common::ExpressionInput {
    common::ExpressionInput {
        expression: template(name_placeholder, value_placeholder),
        expression_attribute_names: [(name_placeholder.to_string(), attribute.to_string())].into(),
        expression_attribute_values: [(value_placeholder.to_string(), value)].into(),
    }
}

impl KeyCondition {
    /// Build the key condition of `key_schema` from the column filters.
    ///
    /// Returns `None` unless the hash key filter is a plain equality. The range key
    /// joins the condition when its filter is an equality, or a `^prefix` on a string
    /// key; any other range filter is left to the filter expression.
    pub fn build(
        table_name: &str,
        key_schema: &common::key::KeySchema,
        filters: &filter::AttributeFilterMap,
        attribute_types: &common::attribute::AttributeTypeMap,
    ) -> Result<Option<Self>> {
        let Some((Operator::Equals, hash_term)) = key_term(filters, &key_schema.hash_key) else {
            return Ok(None);
        };
        let mut fallbacks = Vec::new();
        let declared = declared_type(table_name, attribute_types, &key_schema.hash_key)?;
        let (value, fallback) =
            AttributeType::typed_value(Some(declared), &key_schema.hash_key, hash_term);
        fallbacks.extend(fallback);
        let mut inputs = vec![key_input(
            HASH_NAME,
            HASH_VALUE,
            &key_schema.hash_key,
            value,
            |name, value| format!("{name} = {value}"),
        )];
        let mut consumed = vec![key_schema.hash_key.clone()];
        if let Some(range_key) = &key_schema.range_key {
            let range_input = match key_term(filters, range_key) {
                Some((Operator::Equals, term)) => {
                    let declared = declared_type(table_name, attribute_types, range_key)?;
                    let (value, fallback) = AttributeType::typed_value(Some(declared), range_key, term);
                    fallbacks.extend(fallback);
                    Some(key_input(RANGE_NAME, RANGE_VALUE, range_key, value, |name, value| {
                        format!("{name} = {value}")
                    }))
                }
                Some((Operator::BeginsWith, term)) => {
                    let declared = declared_type(table_name, attribute_types, range_key)?;
                    (declared == AttributeType::String).then(|| {
                        let value = aws_sdk_dynamodb::types::AttributeValue::S(term.to_string());
                        key_input(RANGE_NAME, RANGE_VALUE, range_key, value, |name, value| {
                            format!("begins_with({name}, {value})")
                        })
                    })
                }
                _ => None,
            };
            if let Some(range_input) = range_input {
                inputs.push(range_input);
                consumed.push(range_key.clone());
            }
        }
        let key_condition = Self {
            input: common::ExpressionInput::merge(" and ", inputs),
            consumed,
            fallbacks,
        };
        Ok(Some(key_condition))
    }

    /// Whether every key attribute of `key_schema` is part of the condition.
    #[must_use]
    pub fn covers(&self, key_schema: &common::key::KeySchema) -> bool {
        key_schema
            .names()
            .all(|name| self.consumed.iter().any(|consumed| consumed == name))
    }
}

/// Query operation, against the base table or a secondary index.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_browser::{common, filter, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let key_schema = common::key::KeySchema {
///     hash_key: "id".to_string(),
///     range_key: None,
/// };
/// let filters = filter::AttributeFilterMap::from([("id".to_string(), Some("PROD-001".to_string()))]);
/// let attribute_types = common::attribute::AttributeTypeMap::from([
///     ("id".to_string(), common::attribute::AttributeType::String),
/// ]);
/// let key_condition =
///     read::query::KeyCondition::build("products", &key_schema, &filters, &attribute_types)?
///         .expect("id is filtered by equality");
/// let query = read::query::Query {
///     key_condition,
///     read_args: read::common::ReadArgs {
///         limit: Some(100),
///         table_name: "products".to_string(),
///         ..Default::default()
///     },
/// };
/// let page = query.send(client).await?;
/// println!("{} items", page.items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// The key condition.
    pub key_condition: KeyCondition,
    /// Table, index, filter, page size and start key.
    pub read_args: read::common::ReadArgs,
}

impl From<Query> for read::common::ReadInput {
    fn from(query: Query) -> Self {
        let mut input: Self = query.read_args.into();
        let key_condition_expression = query.key_condition.input.merge_into(
            &mut input.expression_attribute_names,
            &mut input.expression_attribute_values,
        );
        input.key_condition_expression = Some(key_condition_expression);
        input
    }
}

impl Query {
    /// Execute one page of the query.
    pub async fn send(self, store: &dyn store::Store) -> Result<read::common::Page> {
        store.query(self.into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    fn key_schema(range_key: Option<&str>) -> common::key::KeySchema {
        common::key::KeySchema {
            hash_key: "id".to_string(),
            range_key: range_key.map(str::to_string),
        }
    }

    fn attribute_types() -> common::attribute::AttributeTypeMap {
        common::attribute::AttributeTypeMap::from([
            ("id".to_string(), AttributeType::String),
            ("category".to_string(), AttributeType::String),
            ("version".to_string(), AttributeType::Number),
        ])
    }

    fn filters(entries: &[(&str, &str)]) -> filter::AttributeFilterMap {
        entries
            .iter()
            .map(|(name, text)| (name.to_string(), Some(text.to_string())))
            .collect()
    }

    #[rstest]
    #[case::equality(vec![("id", "John")], true)]
    #[case::padded_equality(vec![("id", "  John ")], true)]
    #[case::begins_with(vec![("id", "^John")], false)]
    #[case::contains(vec![("id", "~John")], false)]
    #[case::not_equals(vec![("id", "!=John")], false)]
    #[case::exists(vec![("id", "$")], false)]
    #[case::blank(vec![("id", "  ")], false)]
    #[case::other_attribute(vec![("name", "John")], false)]
    fn test_build_requires_hash_equality(
        #[case] entries: Vec<(&str, &str)>,
        #[case] expected: bool,
    ) {
        let actual =
            KeyCondition::build("t", &key_schema(None), &filters(&entries), &attribute_types())
                .unwrap();
        assert_eq!(actual.is_some(), expected);
    }

    #[test]
    fn test_key_placeholders_are_reserved() {
        for placeholder in [HASH_NAME, HASH_VALUE, RANGE_NAME, RANGE_VALUE] {
            assert!(common::KEY_PLACEHOLDER_TOKENS.contains(&&placeholder[1..]));
        }
    }

    #[test]
    fn test_build_composite_key() {
        let actual = KeyCondition::build(
            "products",
            &key_schema(Some("category")),
            &filters(&[("id", "PROD-001"), ("category", "Electronics")]),
            &attribute_types(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(actual.input.expression, "#hk = :hkval and #rk = :rkval");
        assert_eq!(
            actual.input.expression_attribute_names,
            collections::HashMap::from([
                ("#hk".to_string(), "id".to_string()),
                ("#rk".to_string(), "category".to_string()),
            ])
        );
        assert_eq!(
            actual.input.expression_attribute_values,
            collections::HashMap::from([
                (":hkval".to_string(), types::AttributeValue::S("PROD-001".to_string())),
                (":rkval".to_string(), types::AttributeValue::S("Electronics".to_string())),
            ])
        );
        assert_eq!(actual.consumed, vec!["id".to_string(), "category".to_string()]);
        assert!(actual.covers(&key_schema(Some("category"))));
    }

    #[rstest]
    #[case::unset(vec![("id", "a")], "#hk = :hkval", vec!["id"])]
    #[case::begins_with(
        vec![("id", "a"), ("category", "^Elec")],
        "#hk = :hkval and begins_with(#rk, :rkval)",
        vec!["id", "category"]
    )]
    #[case::contains(vec![("id", "a"), ("category", "~Elec")], "#hk = :hkval", vec!["id"])]
    #[case::not_equals(vec![("id", "a"), ("category", "!=Elec")], "#hk = :hkval", vec!["id"])]
    fn test_build_range_key(
        #[case] entries: Vec<(&str, &str)>,
        #[case] expected: &str,
        #[case] consumed: Vec<&str>,
    ) {
        let actual = KeyCondition::build(
            "t",
            &key_schema(Some("category")),
            &filters(&entries),
            &attribute_types(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(actual.input.expression, expected);
        assert_eq!(actual.consumed, consumed);
    }

    #[test]
    fn test_build_numeric_range_prefix_stays_in_filter() {
        let key_schema = common::key::KeySchema {
            hash_key: "id".to_string(),
            range_key: Some("version".to_string()),
        };
        let actual = KeyCondition::build(
            "t",
            &key_schema,
            &filters(&[("id", "a"), ("version", "^1")]),
            &attribute_types(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(actual.input.expression, "#hk = :hkval");
        assert!(!actual.covers(&key_schema));
    }

    #[test]
    fn test_build_typed_hash_value() {
        let key_schema = common::key::KeySchema {
            hash_key: "version".to_string(),
            range_key: None,
        };
        let actual = KeyCondition::build(
            "t",
            &key_schema,
            &filters(&[("version", "007")]),
            &attribute_types(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            actual.input.expression_attribute_values.get(":hkval"),
            Some(&types::AttributeValue::N("7".to_string()))
        );
    }

    #[test]
    fn test_build_missing_key_type() {
        let error = KeyCondition::build(
            "t",
            &key_schema(None),
            &filters(&[("id", "a")]),
            &common::attribute::AttributeTypeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(error, Error::MissingTableMetadata { table_name, .. } if table_name == "t"));
    }

    #[test]
    fn test_query_into_read_input() {
        let key_condition = KeyCondition::build(
            "a",
            &key_schema(None),
            &filters(&[("id", "b")]),
            &attribute_types(),
        )
        .unwrap()
        .unwrap();
        let filter = filter::aggregate::aggregate(
            &filters(&[("id", "b"), ("name", "$")]),
            &attribute_types(),
            &["id"],
        );
        let query = Query {
            key_condition,
            read_args: read::common::ReadArgs {
                filter,
                index_name: Some("c".to_string()),
                limit: Some(100),
                table_name: "a".to_string(),
                ..Default::default()
            },
        };
        let expected = read::common::ReadInput {
            expression_attribute_names: Some(collections::HashMap::from([
                ("#hk".to_string(), "id".to_string()),
                ("#name".to_string(), "name".to_string()),
            ])),
            expression_attribute_values: Some(collections::HashMap::from([(
                ":hkval".to_string(),
                types::AttributeValue::S("b".to_string()),
            )])),
            filter_expression: Some("(attribute_exists(#name))".to_string()),
            index_name: Some("c".to_string()),
            key_condition_expression: Some("#hk = :hkval".to_string()),
            limit: Some(100),
            table_name: "a".to_string(),
            ..Default::default()
        };
        assert_eq!(read::common::ReadInput::from(query), expected);
    }

    #[tokio::test]
    async fn test_send() {
        let store = store::memory::MemoryStore::with_items(vec![common::Item::from([(
            "id".to_string(),
            types::AttributeValue::S("b".to_string()),
        )])]);
        let query = Query {
            key_condition: KeyCondition::build(
                "a",
                &key_schema(None),
                &filters(&[("id", "b")]),
                &attribute_types(),
            )
            .unwrap()
            .unwrap(),
            read_args: read::common::ReadArgs {
                table_name: "a".to_string(),
                ..Default::default()
            },
        };
        let page = query.send(&store).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.is_last());
        let reads = store.reads.lock();
        assert_eq!(
            reads[0].key_condition_expression.as_deref(),
            Some("#hk = :hkval")
        );
    }
}
