use crate::{common, filter};

use aws_sdk_dynamodb::types;
use std::collections;

/// A fully built Query or Scan request, ready for a [`crate::store::Store`].
///
/// Placeholder maps are `None` rather than empty, DynamoDB rejects empty maps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadInput {
    /// Where to resume, from the previous page.
    pub exclusive_start_key: Option<common::Item>,
    /// Name placeholders of the key condition and the filter.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholders of the key condition and the filter.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// The AND-joined column filters.
    pub filter_expression: Option<String>,
    /// The secondary index to read, `None` for the base table.
    pub index_name: Option<String>,
    /// The key condition, only set for queries.
    pub key_condition_expression: Option<String>,
    /// Page size.
    pub limit: Option<i32>,
    /// The table to read.
    pub table_name: String,
}

/// Arguments shared by Query and Scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadArgs {
    /// Where to resume, passed through unchanged.
    pub exclusive_start_key: Option<common::Item>,
    /// The aggregated column filters, if any column is active.
    pub filter: Option<filter::aggregate::AggregatedExpression>,
    /// The secondary index to read.
    pub index_name: Option<String>,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// The table to read.
    pub table_name: String,
}

impl From<ReadArgs> for ReadInput {
    fn from(read_args: ReadArgs) -> Self {
        let mut input = Self {
            exclusive_start_key: read_args.exclusive_start_key,
            index_name: read_args.index_name,
            limit: read_args.limit,
            table_name: read_args.table_name,
            ..Default::default()
        };
        if let Some(filter) = read_args.filter {
            let filter_expression = filter.input.merge_into(
                &mut input.expression_attribute_names,
                &mut input.expression_attribute_values,
            );
            input.filter_expression = Some(filter_expression);
        }
        input
    }
}

/// One page of a Query or Scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// The items of the page.
    pub items: Vec<common::Item>,
    /// The continuation token, `None` on the last page.
    pub last_evaluated_key: Option<common::Item>,
}

impl Page {
    /// Build a page, an empty continuation token counts as absent.
    #[must_use]
    pub fn new(items: Vec<common::Item>, last_evaluated_key: Option<common::Item>) -> Self {
        Self {
            items,
            last_evaluated_key: last_evaluated_key.filter(|key| !key.is_empty()),
        }
    }

    /// Whether no further page follows.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.last_evaluated_key.is_none()
    }
}

/// apply the read input settings shared by Query and Scan to a builder
#[macro_export]
macro_rules! apply_read_input {
    ($builder:expr, $read_input:expr) => {
        $builder
            .set_exclusive_start_key($read_input.exclusive_start_key)
            .set_expression_attribute_names($read_input.expression_attribute_names)
            .set_expression_attribute_values($read_input.expression_attribute_values)
            .set_filter_expression($read_input.filter_expression)
            .set_index_name($read_input.index_name)
            .set_limit($read_input.limit)
            .table_name($read_input.table_name)
    };
}
