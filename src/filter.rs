//! The filter mini-language.
//!
//! Each attribute column carries a short filter text. The text is matched against
//! an ordered list of parsers and the first match compiles it into a
//! [`fragment::FilterFragment`]:
//!
//! | Text | Fragment |
//! |---|---|
//! | `~foo` | `contains(#a, :a)` |
//! | `^foo` | `begins_with(#a, :a)` |
//! | `$` | `attribute_exists(#a)` |
//! | `!=foo` | `#a <> :a` |
//! | `!~foo` | `not contains(#a, :a)` |
//! | `!$` | `attribute_not_exists(#a)` |
//! | `foo` | `#a = :a` |
//!
//! Placeholders keep the ASCII letters and digits of the attribute name and escape
//! the other characters, so `first-name` gives `#first_2d_name`.
//!
//! ```rust
//! use dynamodb_browser::{common, filter};
//!
//! let fragment = filter::to_fragment(
//!     "age",
//!     Some("!=30"),
//!     Some(common::attribute::AttributeType::Number),
//! )
//! .unwrap();
//! assert_eq!(fragment.expression, "#age <> :age");
//! ```

/// Filter fragments and their operators.
pub mod fragment;

/// The ordered parsers of the filter syntax.
pub mod parser;

/// AND-joining fragments into one filter expression.
pub mod aggregate;

use crate::common;

use indexmap::IndexMap;

/// Attribute name to the current filter text of its column.
pub type AttributeFilterMap = IndexMap<String, Option<String>>;

/// The filter text of `attribute` when it is set and not blank.
#[must_use]
pub fn active_text<'a>(filters: &'a AttributeFilterMap, attribute: &str) -> Option<&'a str> {
    filters
        .get(attribute)
        .and_then(Option::as_deref)
        .filter(|text| !text.trim().is_empty())
}

/// The operator `raw` compiles to, `None` for absent or blank input.
#[must_use]
pub fn operator_of(raw: &str) -> Option<fragment::Operator> {
    parser::PARSERS
        .iter()
        .find(|parser| parser.matches(raw))
        .map(|parser| parser.operator())
}

/// Compile the filter text of one attribute with the first matching parser.
///
/// Returns `None` for absent or blank input.
#[must_use]
pub fn to_fragment(
    attribute: &str,
    raw: Option<&str>,
    declared: Option<common::attribute::AttributeType>,
) -> Option<fragment::FilterFragment> {
    let raw = raw.filter(|raw| !raw.trim().is_empty())?;
    parser::PARSERS
        .iter()
        .find_map(|parser| parser.compile(attribute, raw, declared))
}
