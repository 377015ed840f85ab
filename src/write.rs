//! Write operations for editing DynamoDB tables.
//!
//! This module provides the edits a table view offers:
//! - Putting new items or replacing existing ones from a JSON document
//! - Patching many items with the same attributes
//! - Deleting a single item by the key of its row
//! - Batch writing puts or deletes, 25 requests per batch
//!
//! Every operation returns only once the store has confirmed it, so a refresh
//! awaited afterwards sees the write.

/// Batch write item operation for chunked puts and deletes.
pub mod batch_write_item;

/// Delete item operation for removing one item.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for patching many items.
pub mod update_item;
