//! Validation of edited documents once typing stops.
//!
//! Edits are pushed into a channel, [`debounce`] forwards only the latest one
//! after a quiet period, and the receiving side runs [`validate_item`] on it.

use crate::error::{Error, Result};
use crate::{codec, common};

use std::time;
use tokio::sync::mpsc;

/// Parse a document and check it carries the key attributes.
///
/// ```rust
/// use dynamodb_browser::{codec, common, validate};
///
/// let key_schema = common::key::KeySchema {
///     hash_key: "id".to_string(),
///     range_key: None,
/// };
/// let text = r#"{"id": "1", "name": "John"}"#;
/// assert!(validate::validate_item(text, codec::DocumentFormat::Simple, Some(&key_schema)).is_ok());
/// assert!(!validate::is_valid_item("{", codec::DocumentFormat::Simple, None));
/// ```
pub fn validate_item(
    text: &str,
    format: codec::DocumentFormat,
    key_schema: Option<&common::key::KeySchema>,
) -> Result<common::Item> {
    let item = codec::parse_item(text, format)?;
    let missing = key_schema.and_then(|key_schema| {
        key_schema
            .names()
            .find(|name| !item.contains_key(*name))
    });
    match missing {
        Some(attribute) => Err(Error::MissingKeyAttribute {
            attribute: attribute.to_string(),
        }),
        None => Ok(item),
    }
}

/// Whether [`validate_item`] accepts the document.
#[must_use]
pub fn is_valid_item(
    text: &str,
    format: codec::DocumentFormat,
    key_schema: Option<&common::key::KeySchema>,
) -> bool {
    match validate_item(text, format, key_schema) {
        Ok(_) => true,
        Err(error) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(%error, "document rejected");
            #[cfg(not(feature = "tracing"))]
            let _ = error;
            false
        }
    }
}

/// Forward the last value received once `window` passed without a newer one.
///
/// A value still pending when `input` closes is forwarded before returning.
/// Returns early when `output` is closed.
pub async fn debounce<T: Send>(
    mut input: mpsc::Receiver<T>,
    output: mpsc::Sender<T>,
    window: time::Duration,
) {
    let mut pending: Option<T> = None;
    loop {
        let Some(value) = pending.take() else {
            match input.recv().await {
                Some(value) => pending = Some(value),
                None => return,
            }
            continue;
        };
        tokio::select! {
            received = input.recv() => match received {
                Some(newer) => pending = Some(newer),
                None => {
                    let _ = output.send(value).await;
                    return;
                }
            },
            () = tokio::time::sleep(window) => {
                if output.send(value).await.is_err() {
                    return;
                }
            }
        }
    }
}
