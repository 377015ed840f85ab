use crate::common;
use crate::error::{Error, Result};

use aws_sdk_dynamodb::types;

/// Hash key and optional range key of a table or an index.
///
/// ```rust
/// use dynamodb_browser::common::key;
///
/// let key_schema = key::KeySchema {
///     hash_key: "id".to_string(),
///     range_key: Some("created_at".to_string()),
/// };
/// assert!(key_schema.contains("created_at"));
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeySchema {
    /// The partition key attribute name.
    pub hash_key: String,
    /// The sort key attribute name, for composite keys.
    pub range_key: Option<String>,
}

impl KeySchema {
    /// Read the key schema out of the SDK key schema elements.
    ///
    /// Returns `None` when there is no `HASH` element.
    #[must_use]
    pub fn from_elements(elements: &[types::KeySchemaElement]) -> Option<Self> {
        let lookup = |key_type: types::KeyType| {
            elements
                .iter()
                .find(|element| *element.key_type() == key_type)
                .map(|element| element.attribute_name().to_string())
        };
        let hash_key = lookup(types::KeyType::Hash)?;
        let range_key = lookup(types::KeyType::Range);
        Some(Self {
            hash_key,
            range_key,
        })
    }

    /// Whether `attribute` is the hash or the range key.
    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.hash_key == attribute || self.range_key.as_deref() == Some(attribute)
    }

    /// Key attribute names, hash first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash_key.as_str()).chain(self.range_key.as_deref())
    }

    /// Extract the primary key of `item`.
    pub fn key_of(&self, item: &common::Item) -> Result<common::Item> {
        let mut key = common::Item::with_capacity(2);
        for name in self.names() {
            let value = item
                .get(name)
                .ok_or_else(|| Error::MissingKeyAttribute {
                    attribute: name.to_string(),
                })?;
            key.insert(name.to_string(), value.clone());
        }
        Ok(key)
    }
}

/// How much of the base item a secondary index copies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Projection {
    /// Every attribute (`ALL`): the index can serve any filter.
    All,
    /// Keys only or an explicit attribute list.
    Partial,
}

/// A global or local secondary index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SecondaryIndex {
    /// The index name.
    pub name: String,
    /// The index key schema.
    pub key_schema: KeySchema,
    /// The index projection.
    pub projection: Projection,
}

impl SecondaryIndex {
    fn new(
        name: Option<&str>,
        elements: &[types::KeySchemaElement],
        projection: Option<&types::Projection>,
    ) -> Option<Self> {
        let projection = match projection.and_then(types::Projection::projection_type) {
            Some(types::ProjectionType::All) => Projection::All,
            _ => Projection::Partial,
        };
        Some(Self {
            name: name?.to_string(),
            key_schema: KeySchema::from_elements(elements)?,
            projection,
        })
    }
}

/// The parts of a table description the browser needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableDescription {
    /// The table name.
    pub table_name: String,
    /// The base table key schema.
    pub key_schema: KeySchema,
    /// Declared attribute types, key attributes first.
    pub attribute_types: common::attribute::AttributeTypeMap,
    /// Global secondary indexes followed by local secondary indexes.
    pub secondary_indexes: Vec<SecondaryIndex>,
    /// Approximate item count, as reported by the store.
    pub item_count: Option<i64>,
}

impl TableDescription {
    /// Secondary indexes projecting every attribute, in declaration order.
    pub fn full_projection_indexes(&self) -> impl Iterator<Item = &SecondaryIndex> {
        self.secondary_indexes
            .iter()
            .filter(|index| index.projection == Projection::All)
    }
}

impl TryFrom<&types::TableDescription> for TableDescription {
    type Error = Error;

    fn try_from(description: &types::TableDescription) -> Result<Self> {
        let table_name = description.table_name().unwrap_or_default().to_string();
        let key_schema = KeySchema::from_elements(description.key_schema())
            .ok_or_else(|| Error::missing_metadata(&table_name, "key schema has no hash key"))?;
        let mut attribute_types: common::attribute::AttributeTypeMap = description
            .attribute_definitions()
            .iter()
            .filter_map(|definition| {
                common::attribute::AttributeType::from_scalar(definition.attribute_type())
                    .map(|attribute_type| (definition.attribute_name().to_string(), attribute_type))
            })
            .collect();
        common::attribute::order_keys_first(&mut attribute_types, &key_schema);
        let global_indexes = description.global_secondary_indexes().iter().filter_map(|index| {
            SecondaryIndex::new(index.index_name(), index.key_schema(), index.projection())
        });
        let local_indexes = description.local_secondary_indexes().iter().filter_map(|index| {
            SecondaryIndex::new(index.index_name(), index.key_schema(), index.projection())
        });
        let secondary_indexes = global_indexes.chain(local_indexes).collect();
        let description = Self {
            table_name,
            key_schema,
            attribute_types,
            secondary_indexes,
            item_count: description.item_count(),
        };
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn element(name: &str, key_type: types::KeyType) -> types::KeySchemaElement {
        types::KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .unwrap()
    }

    fn definition(name: &str, scalar: types::ScalarAttributeType) -> types::AttributeDefinition {
        types::AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(scalar)
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::hash_only(
        vec![element("a", types::KeyType::Hash)],
        Some(KeySchema { hash_key: "a".to_string(), range_key: None })
    )]
    #[case::composite(
        vec![element("b", types::KeyType::Range), element("a", types::KeyType::Hash)],
        Some(KeySchema { hash_key: "a".to_string(), range_key: Some("b".to_string()) })
    )]
    #[case::range_only(vec![element("b", types::KeyType::Range)], None)]
    #[case::empty(vec![], None)]
    fn test_key_schema_from_elements(
        #[case] elements: Vec<types::KeySchemaElement>,
        #[case] expected: Option<KeySchema>,
    ) {
        assert_eq!(KeySchema::from_elements(&elements), expected);
    }

    #[rstest]
    #[case::partition_key_only(
        KeySchema { hash_key: "a".to_string(), range_key: None },
        common::Item::from([
            ("a".to_string(), types::AttributeValue::S("b".to_string())),
            ("c".to_string(), types::AttributeValue::N("1".to_string())),
        ]),
        common::Item::from([("a".to_string(), types::AttributeValue::S("b".to_string()))])
    )]
    #[case::partition_key_and_sort_key(
        KeySchema { hash_key: "a".to_string(), range_key: Some("c".to_string()) },
        common::Item::from([
            ("a".to_string(), types::AttributeValue::S("b".to_string())),
            ("c".to_string(), types::AttributeValue::N("1".to_string())),
            ("d".to_string(), types::AttributeValue::Bool(true)),
        ]),
        common::Item::from([
            ("a".to_string(), types::AttributeValue::S("b".to_string())),
            ("c".to_string(), types::AttributeValue::N("1".to_string())),
        ])
    )]
    fn test_key_of(
        #[case] key_schema: KeySchema,
        #[case] item: common::Item,
        #[case] expected: common::Item,
    ) {
        assert_eq!(key_schema.key_of(&item).unwrap(), expected);
    }

    #[test]
    fn test_key_of_missing_range_key() {
        let key_schema = KeySchema {
            hash_key: "a".to_string(),
            range_key: Some("c".to_string()),
        };
        let item = common::Item::from([("a".to_string(), types::AttributeValue::S("b".to_string()))]);
        let error = key_schema.key_of(&item).unwrap_err();
        assert!(matches!(error, Error::MissingKeyAttribute { attribute } if attribute == "c"));
    }

    #[test]
    fn test_table_description_from_sdk() {
        let description = types::TableDescription::builder()
            .table_name("products")
            .key_schema(element("id", types::KeyType::Hash))
            .key_schema(element("category", types::KeyType::Range))
            .attribute_definitions(definition("price", types::ScalarAttributeType::N))
            .attribute_definitions(definition("category", types::ScalarAttributeType::S))
            .attribute_definitions(definition("id", types::ScalarAttributeType::S))
            .global_secondary_indexes(
                types::GlobalSecondaryIndexDescription::builder()
                    .index_name("by_price")
                    .key_schema(element("price", types::KeyType::Hash))
                    .projection(
                        types::Projection::builder()
                            .projection_type(types::ProjectionType::All)
                            .build(),
                    )
                    .build(),
            )
            .global_secondary_indexes(
                types::GlobalSecondaryIndexDescription::builder()
                    .index_name("keys_only")
                    .key_schema(element("category", types::KeyType::Hash))
                    .projection(
                        types::Projection::builder()
                            .projection_type(types::ProjectionType::KeysOnly)
                            .build(),
                    )
                    .build(),
            )
            .item_count(237)
            .build();
        let actual = TableDescription::try_from(&description).unwrap();
        assert_eq!(actual.table_name, "products");
        assert_eq!(
            actual.key_schema,
            KeySchema {
                hash_key: "id".to_string(),
                range_key: Some("category".to_string()),
            }
        );
        let names: Vec<_> = actual.attribute_types.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "category", "price"]);
        assert_eq!(
            actual.attribute_types.get("price"),
            Some(&common::attribute::AttributeType::Number)
        );
        assert_eq!(actual.secondary_indexes.len(), 2);
        let full: Vec<_> = actual
            .full_projection_indexes()
            .map(|index| index.name.as_str())
            .collect();
        assert_eq!(full, vec!["by_price"]);
        assert_eq!(actual.item_count, Some(237));
    }

    #[test]
    fn test_table_description_without_hash_key() {
        let description = types::TableDescription::builder().table_name("a").build();
        let error = TableDescription::try_from(&description).unwrap_err();
        assert!(matches!(error, Error::MissingTableMetadata { .. }));
    }
}
