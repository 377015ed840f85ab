use crate::error::Result;
use crate::{common, store};

/// Delete item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::{Client, types};
/// use dynamodb_browser::{common, write};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let key_schema = common::key::KeySchema {
///     hash_key: "id".to_string(),
///     range_key: None,
/// };
/// let row = common::Item::from([
///     ("id".to_string(), types::AttributeValue::S("1".to_string())),
///     ("name".to_string(), types::AttributeValue::S("John".to_string())),
/// ]);
/// write::delete_item::DeleteItem::for_item("users", &key_schema, &row)?
///     .send(client)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItem {
    /// The primary key of the item to delete.
    pub key: common::Item,
    /// The table to delete from.
    pub table_name: String,
}

impl DeleteItem {
    /// Delete the item a row was read from.
    pub fn for_item(
        table_name: impl Into<String>,
        key_schema: &common::key::KeySchema,
        item: &common::Item,
    ) -> Result<Self> {
        let delete_item = Self {
            key: key_schema.key_of(item)?,
            table_name: table_name.into(),
        };
        Ok(delete_item)
    }

    /// Execute the delete item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.write.delete_item",
            skip_all,
            fields(table_name = %self.table_name),
            err
        )
    )]
    pub async fn send(self, store: &dyn store::Store) -> Result<()> {
        store.delete_item(&self.table_name, self.key).await
    }
}
