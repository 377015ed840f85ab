//! The store client boundary.
//!
//! Every request the browser issues goes through [`Store`]. It is implemented for
//! [`aws_sdk_dynamodb::Client`] and can be implemented for anything else speaking
//! the same operations.

use crate::error::{Error, Result};
use crate::{common, read, write};

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types};

/// One page of table names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TablePage {
    /// The table names of the page.
    pub table_names: Vec<String>,
    /// The name to continue after, `None` on the last page.
    pub last_evaluated_table_name: Option<String>,
}

/// The DynamoDB operations the browser needs.
#[async_trait]
pub trait Store: Send + Sync {
    /// List one page of table names, starting after `exclusive_start_table_name`.
    async fn list_tables_page(
        &self,
        exclusive_start_table_name: Option<String>,
    ) -> Result<TablePage>;

    /// Describe a table: key schema, attribute definitions, indexes, item count.
    async fn describe_table(&self, table_name: &str) -> Result<common::key::TableDescription>;

    /// Run one page of a query.
    async fn query(&self, input: read::common::ReadInput) -> Result<read::common::Page>;

    /// Run one page of a scan.
    async fn scan(&self, input: read::common::ReadInput) -> Result<read::common::Page>;

    /// Create or replace an item.
    async fn put_item(&self, table_name: &str, item: common::Item) -> Result<()>;

    /// Apply an update expression to one item.
    async fn update_item(&self, input: write::update_item::UpdateInput) -> Result<()>;

    /// Delete one item by key.
    async fn delete_item(&self, table_name: &str, key: common::Item) -> Result<()>;

    /// Submit at most 25 write requests, returning the ones left unprocessed.
    async fn batch_write(
        &self,
        table_name: &str,
        requests: Vec<types::WriteRequest>,
    ) -> Result<Vec<types::WriteRequest>>;
}

/// Every table name of the store, following the continuation name page by page.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_browser::store;
///
/// # async fn example(client: &Client) -> dynamodb_browser::error::Result<()> {
/// for table_name in store::list_tables(client).await? {
///     println!("{table_name}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn list_tables(store: &dyn Store) -> Result<Vec<String>> {
    let mut table_names = Vec::new();
    let mut exclusive_start_table_name = None;
    loop {
        let page = store.list_tables_page(exclusive_start_table_name).await?;
        table_names.extend(page.table_names);
        match page.last_evaluated_table_name {
            Some(table_name) => exclusive_start_table_name = Some(table_name),
            None => break,
        }
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(tables = table_names.len(), "listed tables");
    Ok(table_names)
}

#[async_trait]
impl Store for Client {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_browser.list_tables", skip(self), err)
    )]
    async fn list_tables_page(
        &self,
        exclusive_start_table_name: Option<String>,
    ) -> Result<TablePage> {
        let output = Client::list_tables(self)
            .set_exclusive_start_table_name(exclusive_start_table_name.clone())
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "list_tables",
                    exclusive_start_table_name.unwrap_or_default(),
                    None,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        let page = TablePage {
            table_names: output.table_names.unwrap_or_default(),
            last_evaluated_table_name: output.last_evaluated_table_name,
        };
        Ok(page)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_browser.describe_table", skip(self), err)
    )]
    async fn describe_table(&self, table_name: &str) -> Result<common::key::TableDescription> {
        let output = Client::describe_table(self)
            .table_name(table_name)
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "describe_table",
                    table_name,
                    None,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        let description = output
            .table()
            .ok_or_else(|| Error::missing_metadata(table_name, "describe table returned nothing"))?;
        description.try_into()
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.query",
            skip_all,
            fields(table_name = %input.table_name, index_name = ?input.index_name),
            err
        )
    )]
    async fn query(&self, input: read::common::ReadInput) -> Result<read::common::Page> {
        let table_name = input.table_name.clone();
        let index_name = input.index_name.clone();
        let builder =
            Client::query(self).set_key_condition_expression(input.key_condition_expression);
        let output = crate::apply_read_input!(builder, input)
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "query",
                    table_name,
                    index_name,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        let page = read::common::Page::new(
            output.items.unwrap_or_default(),
            output.last_evaluated_key,
        );
        Ok(page)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.scan",
            skip_all,
            fields(table_name = %input.table_name),
            err
        )
    )]
    async fn scan(&self, input: read::common::ReadInput) -> Result<read::common::Page> {
        let table_name = input.table_name.clone();
        let index_name = input.index_name.clone();
        let builder = Client::scan(self);
        let output = crate::apply_read_input!(builder, input)
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "scan",
                    table_name,
                    index_name,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        let page = read::common::Page::new(
            output.items.unwrap_or_default(),
            output.last_evaluated_key,
        );
        Ok(page)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_browser.put_item", skip(self, item), err)
    )]
    async fn put_item(&self, table_name: &str, item: common::Item) -> Result<()> {
        Client::put_item(self)
            .table_name(table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "put_item",
                    table_name,
                    None,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.update_item",
            skip_all,
            fields(table_name = %input.table_name),
            err
        )
    )]
    async fn update_item(&self, input: write::update_item::UpdateInput) -> Result<()> {
        let table_name = input.table_name.clone();
        Client::update_item(self)
            .table_name(input.table_name)
            .set_key(Some(input.key))
            .update_expression(input.update_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "update_item",
                    table_name,
                    None,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_browser.delete_item", skip(self), err)
    )]
    async fn delete_item(&self, table_name: &str, key: common::Item) -> Result<()> {
        Client::delete_item(self)
            .table_name(table_name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "delete_item",
                    table_name,
                    None,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.batch_write",
            skip(self, requests),
            fields(requests = requests.len()),
            err
        )
    )]
    async fn batch_write(
        &self,
        table_name: &str,
        requests: Vec<types::WriteRequest>,
    ) -> Result<Vec<types::WriteRequest>> {
        let output = Client::batch_write_item(self)
            .request_items(table_name, requests)
            .send()
            .await
            .map_err(|error| {
                Error::store(
                    "batch_write",
                    table_name,
                    None,
                    aws_sdk_dynamodb::Error::from(error),
                )
            })?;
        let unprocessed = output
            .unprocessed_items
            .and_then(|mut unprocessed_items| unprocessed_items.remove(table_name))
            .unwrap_or_default();
        Ok(unprocessed)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! An in-memory store for tests.

    use super::*;

    use parking_lot::Mutex;

    const OFFSET: &str = "__offset";

    const TABLE_PAGE_SIZE: usize = 2;

    /// Serves `items` in pages of `limit` and records every request.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub(crate) description: Option<common::key::TableDescription>,
        pub(crate) items: Vec<common::Item>,
        /// Served two names per page.
        pub(crate) tables: Vec<String>,
        pub(crate) table_pages: Mutex<Vec<Option<String>>>,
        /// Query or scan calls that fail outright, by call position.
        pub(crate) failing_reads: Vec<usize>,
        pub(crate) reads: Mutex<Vec<read::common::ReadInput>>,
        pub(crate) puts: Mutex<Vec<common::Item>>,
        pub(crate) updates: Mutex<Vec<write::update_item::UpdateInput>>,
        pub(crate) deletes: Mutex<Vec<common::Item>>,
        pub(crate) batches: Mutex<Vec<Vec<types::WriteRequest>>>,
        /// Number of batch calls that leave their last request unprocessed.
        pub(crate) unprocessed_rounds: Mutex<usize>,
        /// Batch calls that fail outright, by call position.
        pub(crate) failing_batch_calls: Vec<usize>,
    }

    impl MemoryStore {
        pub(crate) fn with_items(items: Vec<common::Item>) -> Self {
            Self {
                items,
                ..Default::default()
            }
        }

        fn page(
            &self,
            operation: &'static str,
            input: read::common::ReadInput,
        ) -> Result<read::common::Page> {
            let call = {
                let mut reads = self.reads.lock();
                reads.push(input.clone());
                reads.len() - 1
            };
            if self.failing_reads.contains(&call) {
                return Err(Error::store(
                    operation,
                    input.table_name,
                    input.index_name,
                    "throttled",
                ));
            }
            let offset = match input
                .exclusive_start_key
                .as_ref()
                .and_then(|key| key.get(OFFSET))
            {
                Some(types::AttributeValue::N(offset)) => offset.parse().unwrap_or(0),
                _ => 0,
            };
            let limit = input.limit.map_or(self.items.len(), |limit| limit as usize);
            let end = (offset + limit).min(self.items.len());
            let items = self.items[offset..end].to_vec();
            let last_evaluated_key = (end < self.items.len()).then(|| {
                common::Item::from([(
                    OFFSET.to_string(),
                    types::AttributeValue::N(end.to_string()),
                )])
            });
            Ok(read::common::Page::new(items, last_evaluated_key))
        }
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn list_tables_page(
            &self,
            exclusive_start_table_name: Option<String>,
        ) -> Result<TablePage> {
            self.table_pages.lock().push(exclusive_start_table_name.clone());
            let start = match &exclusive_start_table_name {
                Some(table_name) => self
                    .tables
                    .iter()
                    .position(|name| name == table_name)
                    .map_or(self.tables.len(), |position| position + 1),
                None => 0,
            };
            let end = (start + TABLE_PAGE_SIZE).min(self.tables.len());
            let table_names = self.tables[start..end].to_vec();
            let last_evaluated_table_name = (end < self.tables.len())
                .then(|| table_names.last().cloned())
                .flatten();
            Ok(TablePage {
                table_names,
                last_evaluated_table_name,
            })
        }

        async fn describe_table(&self, table_name: &str) -> Result<common::key::TableDescription> {
            self.description
                .clone()
                .ok_or_else(|| Error::missing_metadata(table_name, "no such table"))
        }

        async fn query(&self, input: read::common::ReadInput) -> Result<read::common::Page> {
            self.page("query", input)
        }

        async fn scan(&self, input: read::common::ReadInput) -> Result<read::common::Page> {
            self.page("scan", input)
        }

        async fn put_item(&self, _: &str, item: common::Item) -> Result<()> {
            self.puts.lock().push(item);
            Ok(())
        }

        async fn update_item(&self, input: write::update_item::UpdateInput) -> Result<()> {
            self.updates.lock().push(input);
            Ok(())
        }

        async fn delete_item(&self, _: &str, key: common::Item) -> Result<()> {
            self.deletes.lock().push(key);
            Ok(())
        }

        async fn batch_write(
            &self,
            table_name: &str,
            mut requests: Vec<types::WriteRequest>,
        ) -> Result<Vec<types::WriteRequest>> {
            let call = {
                let mut batches = self.batches.lock();
                batches.push(requests.clone());
                batches.len() - 1
            };
            if self.failing_batch_calls.contains(&call) {
                return Err(Error::store("batch_write", table_name, None, "throttled"));
            }
            let mut rounds = self.unprocessed_rounds.lock();
            if *rounds > 0 {
                *rounds -= 1;
                let unprocessed = requests.split_off(requests.len().saturating_sub(1));
                return Ok(unprocessed);
            }
            Ok(Vec::new())
        }
    }
}
