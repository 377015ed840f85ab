use crate::error::{Error, Result};
use crate::{common, filter, read};

use std::fmt;

/// How a page of the table is read.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum AccessPath {
    /// Query the base table by its hash key.
    QueryBase,
    /// Query a secondary index projecting every attribute.
    QueryIndex {
        /// The index queried.
        index_name: String,
    },
    /// Scan the base table.
    Scan,
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryBase => f.write_str("query"),
            Self::QueryIndex { index_name } => write!(f, "query index '{index_name}'"),
            Self::Scan => f.write_str("scan"),
        }
    }
}

/// Read-only snapshots a request is built from.
#[derive(Clone, Copy, Debug)]
pub struct ReadContext<'a> {
    /// The table to read.
    pub table_name: &'a str,
    /// The table description, `None` until it has been loaded.
    pub description: Option<&'a common::key::TableDescription>,
    /// The column filters.
    pub filters: &'a filter::AttributeFilterMap,
    /// Attribute types sampled from the rows read so far.
    pub attribute_types: &'a common::attribute::AttributeTypeMap,
    /// Items requested per page.
    pub page_size: i32,
}

/// A request ready to be sent, with the path it takes.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadRequest {
    /// The chosen access path.
    pub access_path: AccessPath,
    /// The request.
    pub input: read::common::ReadInput,
    /// Terms compared as strings instead of their declared type.
    pub fallbacks: Vec<common::attribute::CoercionFallback>,
}

/// Declared types override sampled ones.
fn merged_types(
    description: &common::key::TableDescription,
    sampled: &common::attribute::AttributeTypeMap,
) -> common::attribute::AttributeTypeMap {
    let mut attribute_types = sampled.clone();
    for (name, attribute_type) in &description.attribute_types {
        attribute_types.insert(name.clone(), *attribute_type);
    }
    attribute_types
}

/// Pick the secondary index to query.
///
/// The first full-projection index whose whole key schema is consumed by its key
/// condition wins, else the first one whose hash key is filtered by equality. A range
/// key filter that cannot join the key condition, such as `!=10`, does not count.
fn select_index<'a>(
    context: &ReadContext<'_>,
    description: &'a common::key::TableDescription,
    attribute_types: &common::attribute::AttributeTypeMap,
) -> Result<Option<(&'a common::key::SecondaryIndex, read::query::KeyCondition)>> {
    let mut candidate = None;
    for index in description.full_projection_indexes() {
        let Some(key_condition) = read::query::KeyCondition::build(
            context.table_name,
            &index.key_schema,
            context.filters,
            attribute_types,
        )?
        else {
            continue;
        };
        if key_condition.covers(&index.key_schema) {
            return Ok(Some((index, key_condition)));
        }
        if candidate.is_none() {
            candidate = Some((index, key_condition));
        }
    }
    Ok(candidate)
}

/// Choose the access path and build the request for one page.
///
/// The path is recomputed on every call from the current filters.
///
/// ```rust
/// use dynamodb_browser::{common, filter, read};
///
/// let description = common::key::TableDescription {
///     table_name: "users".to_string(),
///     key_schema: common::key::KeySchema {
///         hash_key: "id".to_string(),
///         range_key: None,
///     },
///     attribute_types: common::attribute::AttributeTypeMap::from([
///         ("id".to_string(), common::attribute::AttributeType::String),
///     ]),
///     ..Default::default()
/// };
/// let filters = filter::AttributeFilterMap::from([
///     ("id".to_string(), Some("John".to_string())),
///     ("age".to_string(), Some("$".to_string())),
/// ]);
/// let context = read::access_path::ReadContext {
///     table_name: "users",
///     description: Some(&description),
///     filters: &filters,
///     attribute_types: &common::attribute::AttributeTypeMap::new(),
///     page_size: 100,
/// };
/// let request = read::access_path::build_request(&context, None).unwrap();
/// assert_eq!(request.access_path, read::access_path::AccessPath::QueryBase);
/// assert_eq!(request.input.key_condition_expression.as_deref(), Some("#hk = :hkval"));
/// assert_eq!(request.input.filter_expression.as_deref(), Some("(attribute_exists(#age))"));
/// ```
pub fn build_request(
    context: &ReadContext<'_>,
    exclusive_start_key: Option<common::Item>,
) -> Result<ReadRequest> {
    let description = context
        .description
        .ok_or_else(|| Error::missing_metadata(context.table_name, "table has not been described"))?;
    let attribute_types = merged_types(description, context.attribute_types);
    let base = read::query::KeyCondition::build(
        context.table_name,
        &description.key_schema,
        context.filters,
        &attribute_types,
    )?;
    let (access_path, key_condition) = match base {
        Some(key_condition) => (AccessPath::QueryBase, Some(key_condition)),
        None => match select_index(context, description, &attribute_types)? {
            Some((index, key_condition)) => (
                AccessPath::QueryIndex {
                    index_name: index.name.clone(),
                },
                Some(key_condition),
            ),
            None => (AccessPath::Scan, None),
        },
    };
    let exclude: Vec<&str> = key_condition
        .iter()
        .flat_map(|key_condition| key_condition.consumed.iter().map(String::as_str))
        .collect();
    let filter = filter::aggregate::aggregate(context.filters, &attribute_types, &exclude);
    let mut fallbacks: Vec<_> = key_condition
        .iter()
        .flat_map(|key_condition| key_condition.fallbacks.iter().cloned())
        .collect();
    fallbacks.extend(filter.iter().flat_map(|filter| filter.fallbacks.iter().cloned()));
    let index_name = match &access_path {
        AccessPath::QueryIndex { index_name } => Some(index_name.clone()),
        _ => None,
    };
    let read_args = read::common::ReadArgs {
        exclusive_start_key,
        filter,
        index_name,
        limit: Some(context.page_size),
        table_name: context.table_name.to_string(),
    };
    let input = match key_condition {
        Some(key_condition) => read::query::Query {
            key_condition,
            read_args,
        }
        .into(),
        None => read::scan::Scan { read_args }.into(),
    };
    #[cfg(feature = "tracing")]
    tracing::debug!(table_name = context.table_name, access_path = %access_path, "built read request");
    let request = ReadRequest {
        access_path,
        input,
        fallbacks,
    };
    Ok(request)
}
