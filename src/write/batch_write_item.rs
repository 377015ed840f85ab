use crate::error::{BatchFailure, Error, Result};
use crate::{common, settings, store};

use aws_sdk_dynamodb::types;
use futures::{StreamExt, stream};

/// Batch write item operation.
///
/// The requests are split into batches of at most 25, sent with bounded
/// concurrency. Unprocessed requests are resubmitted with exponential backoff, and
/// whatever is still unprocessed afterwards is reported per batch.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_browser::{codec, settings, write};
///
/// # async fn example(client: &Client, text: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let items = codec::import_items(text)?;
/// let report = write::batch_write_item::BatchWriteItem::puts("users", items)?
///     .send(client, &settings::Settings::default())
///     .await;
/// report.into_result()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem {
    /// Put and delete requests, in submission order.
    pub requests: Vec<types::WriteRequest>,
    /// The table to write to.
    pub table_name: String,
}

/// What a batch write did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteReport {
    /// Number of batches sent.
    pub batches: usize,
    /// Batches left with unprocessed requests, in batch order.
    pub failures: Vec<BatchFailure>,
    /// The table written to.
    pub table_name: String,
    /// Number of requests the store processed.
    pub written: usize,
}

impl BatchWriteReport {
    /// Whether every request was processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The report, or [`Error::BatchPartialFailure`] when some batch failed.
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::BatchPartialFailure {
                table_name: self.table_name,
                failures: self.failures,
            })
        }
    }
}

impl BatchWriteItem {
    /// Put every item.
    pub fn puts(table_name: impl Into<String>, items: Vec<common::Item>) -> Result<Self> {
        let mut requests = Vec::with_capacity(items.len());
        for item in items {
            let put_request = types::PutRequest::builder().set_item(Some(item)).build()?;
            requests.push(types::WriteRequest::builder().put_request(put_request).build());
        }
        let batch_write_item = Self {
            requests,
            table_name: table_name.into(),
        };
        Ok(batch_write_item)
    }

    /// Delete the items the rows were read from.
    pub fn deletes(
        table_name: impl Into<String>,
        key_schema: &common::key::KeySchema,
        items: &[common::Item],
    ) -> Result<Self> {
        let mut requests = Vec::with_capacity(items.len());
        for item in items {
            let delete_request = types::DeleteRequest::builder()
                .set_key(Some(key_schema.key_of(item)?))
                .build()?;
            requests.push(
                types::WriteRequest::builder()
                    .delete_request(delete_request)
                    .build(),
            );
        }
        let batch_write_item = Self {
            requests,
            table_name: table_name.into(),
        };
        Ok(batch_write_item)
    }

    /// Execute the batch write item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_browser.write.batch_write_item",
            skip_all,
            fields(table_name = %self.table_name, requests = self.requests.len())
        )
    )]
    pub async fn send(
        self,
        store: &dyn store::Store,
        settings: &settings::Settings,
    ) -> BatchWriteReport {
        let table_name = self.table_name;
        let chunks: Vec<Vec<types::WriteRequest>> = self
            .requests
            .chunks(settings.batch_write_size())
            .map(<[types::WriteRequest]>::to_vec)
            .collect();
        let batches = chunks.len();
        let mut outcomes: Vec<(usize, usize, Option<BatchFailure>)> =
            stream::iter(chunks.into_iter().enumerate())
                .map(|(batch, requests)| write_batch(store, &table_name, batch, requests, settings))
                .buffer_unordered(settings.batch_concurrency())
                .collect()
                .await;
        outcomes.sort_by_key(|(batch, _, _)| *batch);
        let mut report = BatchWriteReport {
            batches,
            table_name,
            ..Default::default()
        };
        for (_, written, failure) in outcomes {
            report.written += written;
            report.failures.extend(failure);
        }
        #[cfg(feature = "tracing")]
        if !report.is_complete() {
            tracing::warn!(
                failed_batches = report.failures.len(),
                written = report.written,
                "batch write left unprocessed requests"
            );
        }
        report
    }
}

/// Send one batch, resubmitting its unprocessed requests.
///
/// Returns the batch index, the number of processed requests and the failure, if any.
async fn write_batch(
    store: &dyn store::Store,
    table_name: &str,
    batch: usize,
    requests: Vec<types::WriteRequest>,
    settings: &settings::Settings,
) -> (usize, usize, Option<BatchFailure>) {
    let total = requests.len();
    let mut pending = requests;
    for attempt in 0..=settings.batch_max_retries {
        if attempt > 0 {
            #[cfg(feature = "tracing")]
            tracing::debug!(batch, attempt, pending = pending.len(), "resubmitting unprocessed requests");
            tokio::time::sleep(settings.batch_retry_delay(attempt)).await;
        }
        match store.batch_write(table_name, pending.clone()).await {
            Ok(unprocessed) if unprocessed.is_empty() => return (batch, total, None),
            Ok(unprocessed) => pending = unprocessed,
            Err(error) => {
                let failure = BatchFailure {
                    batch,
                    error: Some(error.to_string()),
                    unprocessed: pending,
                };
                return (batch, total - failure.unprocessed.len(), Some(failure));
            }
        }
    }
    let written = total - pending.len();
    let failure = BatchFailure {
        batch,
        error: None,
        unprocessed: pending,
    };
    (batch, written, Some(failure))
}
