use crate::error::Result;
use crate::{codec, common, store};

/// Put item operation, creating an item or replacing it whole.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_browser::{codec, write};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item = write::put_item::PutItem::from_document(
///     "users",
///     r#"{"id": "1", "name": "John"}"#,
///     codec::DocumentFormat::Simple,
/// )?;
/// put_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItem {
    /// The item to write.
    pub item: common::Item,
    /// The table to write to.
    pub table_name: String,
}

impl PutItem {
    /// Parse the item from a JSON document.
    pub fn from_document(
        table_name: impl Into<String>,
        text: &str,
        format: codec::DocumentFormat,
    ) -> Result<Self> {
        let put_item = Self {
            item: codec::parse_item(text, format)?,
            table_name: table_name.into(),
        };
        Ok(put_item)
    }

    /// Execute the put item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.write.put_item",
            skip_all,
            fields(table_name = %self.table_name),
            err
        )
    )]
    pub async fn send(self, store: &dyn store::Store) -> Result<()> {
        store.put_item(&self.table_name, self.item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;

    #[rstest]
    #[case::simple(r#"{"a": "b", "c": 1}"#, codec::DocumentFormat::Simple)]
    #[case::raw(r#"{"a": {"s": "b"}, "c": {"n": "1"}}"#, codec::DocumentFormat::Raw)]
    fn test_from_document(#[case] text: &str, #[case] format: codec::DocumentFormat) {
        let actual = PutItem::from_document("t", text, format).unwrap();
        let expected = PutItem {
            item: common::Item::from([
                ("a".to_string(), types::AttributeValue::S("b".to_string())),
                ("c".to_string(), types::AttributeValue::N("1".to_string())),
            ]),
            table_name: "t".to_string(),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_from_document_invalid() {
        assert!(PutItem::from_document("t", "not json", codec::DocumentFormat::Simple).is_err());
    }

    #[tokio::test]
    async fn test_send() {
        let store = store::memory::MemoryStore::default();
        let put_item =
            PutItem::from_document("t", r#"{"a": "b"}"#, codec::DocumentFormat::Simple).unwrap();
        put_item.clone().send(&store).await.unwrap();
        assert_eq!(*store.puts.lock(), vec![put_item.item]);
    }
}
