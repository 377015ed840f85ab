use crate::error::Result;
use crate::{codec, common, store};

use aws_sdk_dynamodb::types;
use std::collections;

/// An update request for one item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateInput {
    /// Placeholder to attribute name.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Placeholder to attribute value.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    /// The primary key of the item to update.
    pub key: common::Item,
    /// The table to update.
    pub table_name: String,
    /// `SET #a0 = :v0, ...`
    pub update_expression: String,
}

/// Set the same attributes on many items.
///
/// Every attribute of `patch` is assigned on each item with one `SET` expression.
/// Key attributes are left out of the patch, DynamoDB does not allow updating them.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::{Client, types};
/// use dynamodb_browser::{codec, common, write};
///
/// # async fn example(client: &Client, rows: Vec<common::Item>) -> Result<(), Box<dyn std::error::Error>> {
/// let patch_items = write::update_item::PatchItems {
///     items: rows,
///     key_schema: common::key::KeySchema {
///         hash_key: "id".to_string(),
///         range_key: None,
///     },
///     patch: codec::from_simple_json(r#"{"status": "archived"}"#)?,
///     table_name: "orders".to_string(),
/// };
/// let updated = patch_items.send(client).await?;
/// println!("{updated} items patched");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchItems {
    /// The rows to patch, only their key attributes are used.
    pub items: Vec<common::Item>,
    /// The table key schema.
    pub key_schema: common::key::KeySchema,
    /// Attributes to set.
    pub patch: common::Item,
    /// The table to update.
    pub table_name: String,
}

impl PatchItems {
    /// Parse the patch from a JSON document.
    pub fn from_document(
        table_name: impl Into<String>,
        key_schema: common::key::KeySchema,
        items: Vec<common::Item>,
        text: &str,
        format: codec::DocumentFormat,
    ) -> Result<Self> {
        let patch_items = Self {
            items,
            key_schema,
            patch: codec::parse_item(text, format)?,
            table_name: table_name.into(),
        };
        Ok(patch_items)
    }

    /// `SET #a0 = :v0, #a1 = :v1, ...` over the patch attributes in name order.
    ///
    /// Returns `None` when nothing is left to set.
    fn update_expression(&self) -> Option<common::ExpressionInput> {
        let mut attributes: Vec<_> = self
            .patch
            .iter()
            .filter(|(name, _)| !self.key_schema.contains(name))
            .collect();
        if attributes.is_empty() {
            return None;
        }
        attributes.sort_by(|(left, _), (right, _)| left.cmp(right));
        let mut input = common::ExpressionInput::default();
        let mut assignments = Vec::with_capacity(attributes.len());
        for (index, (name, value)) in attributes.into_iter().enumerate() {
            let name_placeholder = format!("#a{index}");
            let value_placeholder = format!(":v{index}");
            assignments.push(format!("{name_placeholder} = {value_placeholder}"));
            input
                .expression_attribute_names
                .insert(name_placeholder, name.clone());
            input
                .expression_attribute_values
                .insert(value_placeholder, value.clone());
        }
        input.expression = format!("SET {}", assignments.join(", "));
        Some(input)
    }

    /// One update request per item.
    pub fn inputs(&self) -> Result<Vec<UpdateInput>> {
        let Some(update) = self.update_expression() else {
            return Ok(Vec::new());
        };
        let mut inputs = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let mut input = UpdateInput {
                key: self.key_schema.key_of(item)?,
                table_name: self.table_name.clone(),
                ..Default::default()
            };
            input.update_expression = update.clone().merge_into(
                &mut input.expression_attribute_names,
                &mut input.expression_attribute_values,
            );
            inputs.push(input);
        }
        Ok(inputs)
    }

    /// Execute the updates one after the other, returning how many were applied.
    ///
    /// Stops at the first failing update.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.write.patch_items",
            skip_all,
            fields(table_name = %self.table_name, items = self.items.len()),
            err
        )
    )]
    pub async fn send(self, store: &dyn store::Store) -> Result<usize> {
        let inputs = self.inputs()?;
        let count = inputs.len();
        for input in inputs {
            store.update_item(input).await?;
        }
        Ok(count)
    }
}
