use crate::{common, filter};

use aws_sdk_dynamodb::types;
use std::collections;

/// Every active column filter AND-joined into one filter expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregatedExpression {
    /// `(f1) AND (f2) ...` with the placeholder maps of every fragment.
    pub input: common::ExpressionInput,
    /// Terms that were compared as strings instead of their declared type.
    pub fallbacks: Vec<common::attribute::CoercionFallback>,
}

impl AggregatedExpression {
    /// The joined expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.input.expression
    }

    /// Placeholder to attribute name.
    #[must_use]
    pub fn names(&self) -> &collections::HashMap<String, String> {
        &self.input.expression_attribute_names
    }

    /// Placeholder to attribute value.
    #[must_use]
    pub fn values(&self) -> &collections::HashMap<String, types::AttributeValue> {
        &self.input.expression_attribute_values
    }
}

/// Compile and join the filters of every active attribute not in `exclude`.
///
/// Attributes are visited in map order. Returns `None` when no fragment is produced.
///
/// ```rust
/// use dynamodb_browser::{common, filter};
///
/// let filters = filter::AttributeFilterMap::from([
///     ("age".to_string(), Some("!=30".to_string())),
///     ("name".to_string(), Some("$".to_string())),
/// ]);
/// let types = common::attribute::AttributeTypeMap::from([
///     ("age".to_string(), common::attribute::AttributeType::Number),
/// ]);
/// let aggregated = filter::aggregate::aggregate(&filters, &types, &[]).unwrap();
/// assert_eq!(aggregated.expression(), "(#age <> :age) AND (attribute_exists(#name))");
/// ```
#[must_use]
pub fn aggregate(
    filters: &filter::AttributeFilterMap,
    attribute_types: &common::attribute::AttributeTypeMap,
    exclude: &[&str],
) -> Option<AggregatedExpression> {
    let mut fallbacks = Vec::new();
    let inputs: Vec<common::ExpressionInput> = filters
        .keys()
        .filter(|attribute| !exclude.contains(&attribute.as_str()))
        .filter_map(|attribute| {
            let raw = filter::active_text(filters, attribute)?;
            let declared = attribute_types.get(attribute).copied();
            filter::to_fragment(attribute, Some(raw), declared)
        })
        .map(|mut fragment| {
            fallbacks.extend(fragment.fallback.take());
            fragment.expression = format!("({})", fragment.expression);
            fragment.into()
        })
        .collect();
    if inputs.is_empty() {
        return None;
    }
    let input = common::ExpressionInput::merge(&common::LogicalOperator::And, inputs);
    Some(AggregatedExpression { input, fallbacks })
}
