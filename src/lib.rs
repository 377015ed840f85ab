#![deny(missing_docs)]

//! # DynamoDB Browser
//!
//! The engine behind a table browser for Amazon DynamoDB: per-column filters
//! written in a small mini-language, turned into the cheapest request that
//! answers them, and paged through lazily.
//!
//! ## Overview
//!
//! - Filter texts such as `~john`, `^2024-`, `!=30` or `$` compile into filter
//!   expressions with generated placeholders
//! - Filters on the table or index keys become a key condition, so the table is
//!   queried instead of scanned whenever possible
//! - Pages are fetched one at a time, as a stream, or drained completely
//! - Items are edited as plain or type-tagged JSON and written back one by one
//!   or in batches
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamodb_browser::{common, filter, read, store::Store};
//!
//! # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
//! let description = Store::describe_table(client, "orders").await?;
//! let filters = filter::AttributeFilterMap::from([
//!     ("customer_id".to_string(), Some("C-42".to_string())),
//!     ("created_at".to_string(), Some("^2024-".to_string())),
//!     ("status".to_string(), Some("!=cancelled".to_string())),
//! ]);
//! let attribute_types = common::attribute::AttributeTypeMap::new();
//! let context = read::access_path::ReadContext {
//!     table_name: "orders",
//!     description: Some(&description),
//!     filters: &filters,
//!     attribute_types: &attribute_types,
//!     page_size: 100,
//! };
//! // With `customer_id` / `created_at` as the table keys this sends a query with
//! // "#hk = :hkval and begins_with(#rk, :rkval)" and filters on "(#status <> :status)"
//! let output = read::pagination::fetch_page(client, &context, None).await?;
//! println!("{}: {} items", output.access_path, output.page.items.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@filter`] - The filter mini-language and its aggregation
//! - [`mod@read`] - Access-path selection, queries, scans and pagination
//! - [`mod@write`] - Put, patch, delete and batch writes
//! - [`mod@codec`] - Plain and type-tagged JSON documents
//! - [`mod@store`] - The client boundary every request goes through
//! - [`mod@registry`] - Clients per connection profile
//! - [`mod@validate`] - Debounced document validation

pub mod codec;
pub mod common;
pub mod error;
pub mod filter;
pub mod read;
pub mod registry;
pub mod settings;
pub mod store;
pub mod validate;
pub mod write;
