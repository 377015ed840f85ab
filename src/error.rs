//! Error type shared by every operation of the crate.

use aws_sdk_dynamodb::types;

/// Boxed error raised by a [`crate::store::Store`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A batch of write requests that the store did not process.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchFailure {
    /// Position of the batch in the submitted sequence (0-indexed).
    pub batch: usize,
    /// The write requests left unprocessed after every retry.
    pub unprocessed: Vec<types::WriteRequest>,
    /// The store error, when the whole batch request was rejected.
    pub error: Option<String>,
}

/// Errors surfaced by request construction, store calls and document conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The table description (or a declared key type) is not loaded yet.
    #[error("metadata for table '{table_name}' is not loaded: {reason}")]
    MissingTableMetadata {
        /// The table the request was built for.
        table_name: String,
        /// What is missing.
        reason: String,
    },
    /// The store rejected a request.
    #[error("{operation} on table '{table_name}'{} failed: {source}", index_suffix(.index_name))]
    StoreRequest {
        /// The store operation (`query`, `scan`, `put_item`, ...).
        operation: &'static str,
        /// The table the request targeted.
        table_name: String,
        /// The secondary index the request targeted, if any.
        index_name: Option<String>,
        /// The underlying store error.
        #[source]
        source: BoxError,
    },
    /// Some batches of a batch write were left with unprocessed requests.
    #[error(
        "batch write on table '{table_name}' left {} unprocessed request(s) in {} batch(es)",
        .failures.iter().map(|failure| failure.unprocessed.len()).sum::<usize>(),
        .failures.len()
    )]
    BatchPartialFailure {
        /// The table written to.
        table_name: String,
        /// One entry per failed batch.
        failures: Vec<BatchFailure>,
    },
    /// An item is missing one of the key attributes of the table.
    #[error("item has no value for key attribute '{attribute}'")]
    MissingKeyAttribute {
        /// The missing key attribute.
        attribute: String,
    },
    /// The shared AWS config or credentials files could not be loaded.
    #[error("loading AWS profiles failed: {0}")]
    ProfileLoad(#[from] aws_config::profile::ProfileFileLoadError),
    /// A request could not be assembled from its parts.
    #[error("request build failed: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),
    /// A document is not valid JSON.
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    /// A document could not be converted to or from DynamoDB attribute values.
    #[error("attribute value conversion failed: {0}")]
    Serialization(#[from] serde_dynamo::Error),
    /// A raw (tagged) JSON document is malformed.
    #[error("invalid raw document: {0}")]
    InvalidRawDocument(String),
    /// An attribute value has no JSON representation in the requested format.
    #[error("unsupported attribute value: {0}")]
    UnsupportedValue(String),
}

fn index_suffix(index_name: &Option<String>) -> String {
    match index_name {
        Some(index_name) => format!(" (index '{index_name}')"),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn missing_metadata(table_name: &str, reason: impl Into<String>) -> Self {
        Self::MissingTableMetadata {
            table_name: table_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn store(
        operation: &'static str,
        table_name: impl Into<String>,
        index_name: Option<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::StoreRequest {
            operation,
            table_name: table_name.into(),
            index_name,
            source: source.into(),
        }
    }
}
