//! Read operations for browsing DynamoDB tables.
//!
//! This module turns the column filters of a table view into requests:
//! - Choosing between a base table query, an index query and a scan
//! - Building key conditions from the key attribute filters
//! - Fetching one page, streaming pages, or draining the whole result

/// Access path selection and request construction.
pub mod access_path;

/// Common types for read operations.
pub mod common;

/// Paging and full-drain drivers.
pub mod pagination;

/// Query operation and key conditions.
pub mod query;

/// Scan operation.
pub mod scan;
