use crate::{common, filter};

use common::attribute::AttributeType;
use filter::fragment::{FilterFragment, Operator};

/// Recognizes one filter syntax and compiles it into a [`FilterFragment`].
///
/// Patterns are matched against the trimmed input. `compile` returns `None`
/// exactly when `matches` returns `false`.
pub trait ValueToFilterParser: Sync {
    /// The operator this parser compiles to.
    fn operator(&self) -> Operator;

    /// The term captured from already trimmed input, `None` when the pattern does not match.
    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str>;

    /// Build the fragment for a matched term.
    fn create_fragment(
        &self,
        attribute: &str,
        term: &str,
        declared: Option<AttributeType>,
    ) -> FilterFragment;

    /// Whether the raw input matches this parser's pattern.
    fn matches(&self, raw: &str) -> bool {
        self.term(raw.trim()).is_some()
    }

    /// Compile the raw input, `None` when it does not match.
    fn compile(
        &self,
        attribute: &str,
        raw: &str,
        declared: Option<AttributeType>,
    ) -> Option<FilterFragment> {
        let term = self.term(raw.trim())?;
        Some(self.create_fragment(attribute, term, declared))
    }
}

fn prefixed<'a>(trimmed: &'a str, prefix: &str) -> Option<&'a str> {
    trimmed
        .strip_prefix(prefix)
        .filter(|term| !term.is_empty())
}

/// `~term`
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainsParser;

impl ValueToFilterParser for ContainsParser {
    fn operator(&self) -> Operator {
        Operator::Contains
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        prefixed(trimmed, "~")
    }

    fn create_fragment(&self, attribute: &str, term: &str, _: Option<AttributeType>) -> FilterFragment {
        let value = aws_sdk_dynamodb::types::AttributeValue::S(term.to_string());
        FilterFragment::binary(self.operator(), attribute, value, None, |name, value| {
            format!("contains({name}, {value})")
        })
    }
}

/// `^term`
#[derive(Clone, Copy, Debug, Default)]
pub struct BeginsWithParser;

impl ValueToFilterParser for BeginsWithParser {
    fn operator(&self) -> Operator {
        Operator::BeginsWith
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        prefixed(trimmed, "^")
    }

    fn create_fragment(&self, attribute: &str, term: &str, _: Option<AttributeType>) -> FilterFragment {
        let value = aws_sdk_dynamodb::types::AttributeValue::S(term.to_string());
        FilterFragment::binary(self.operator(), attribute, value, None, |name, value| {
            format!("begins_with({name}, {value})")
        })
    }
}

/// `$`
#[derive(Clone, Copy, Debug, Default)]
pub struct ExistsParser;

impl ValueToFilterParser for ExistsParser {
    fn operator(&self) -> Operator {
        Operator::Exists
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        (trimmed == "$").then_some("")
    }

    fn create_fragment(&self, attribute: &str, _: &str, _: Option<AttributeType>) -> FilterFragment {
        FilterFragment::unary(self.operator(), attribute, |name| {
            format!("attribute_exists({name})")
        })
    }
}

/// `!=term`
#[derive(Clone, Copy, Debug, Default)]
pub struct NotEqualsParser;

impl ValueToFilterParser for NotEqualsParser {
    fn operator(&self) -> Operator {
        Operator::NotEquals
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        prefixed(trimmed, "!=")
    }

    fn create_fragment(
        &self,
        attribute: &str,
        term: &str,
        declared: Option<AttributeType>,
    ) -> FilterFragment {
        let (value, fallback) = AttributeType::typed_value(declared, attribute, term);
        FilterFragment::binary(self.operator(), attribute, value, fallback, |name, value| {
            format!("{name} <> {value}")
        })
    }
}

/// `!~term`
#[derive(Clone, Copy, Debug, Default)]
pub struct NotContainsParser;

impl ValueToFilterParser for NotContainsParser {
    fn operator(&self) -> Operator {
        Operator::NotContains
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        prefixed(trimmed, "!~")
    }

    fn create_fragment(&self, attribute: &str, term: &str, _: Option<AttributeType>) -> FilterFragment {
        let value = aws_sdk_dynamodb::types::AttributeValue::S(term.to_string());
        FilterFragment::binary(self.operator(), attribute, value, None, |name, value| {
            format!("not contains({name}, {value})")
        })
    }
}

/// `!$`
#[derive(Clone, Copy, Debug, Default)]
pub struct NotExistsParser;

impl ValueToFilterParser for NotExistsParser {
    fn operator(&self) -> Operator {
        Operator::NotExists
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        (trimmed == "!$").then_some("")
    }

    fn create_fragment(&self, attribute: &str, _: &str, _: Option<AttributeType>) -> FilterFragment {
        FilterFragment::unary(self.operator(), attribute, |name| {
            format!("attribute_not_exists({name})")
        })
    }
}

/// Any non-blank text, compared as a whole.
#[derive(Clone, Copy, Debug, Default)]
pub struct EqualsParser;

impl ValueToFilterParser for EqualsParser {
    fn operator(&self) -> Operator {
        Operator::Equals
    }

    fn term<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        (!trimmed.is_empty()).then_some(trimmed)
    }

    fn create_fragment(
        &self,
        attribute: &str,
        term: &str,
        declared: Option<AttributeType>,
    ) -> FilterFragment {
        let (value, fallback) = AttributeType::typed_value(declared, attribute, term);
        FilterFragment::binary(self.operator(), attribute, value, fallback, |name, value| {
            format!("{name} = {value}")
        })
    }
}

/// Parsers in priority order, the first match wins. [`EqualsParser`] matches any
/// non-blank input and stays last.
pub const PARSERS: [&dyn ValueToFilterParser; 7] = [
    &ContainsParser,
    &BeginsWithParser,
    &ExistsParser,
    &NotEqualsParser,
    &NotContainsParser,
    &NotExistsParser,
    &EqualsParser,
];

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    #[rstest]
    #[case::contains(&ContainsParser, "~hello", true)]
    #[case::contains_padded(&ContainsParser, "  ~hello ", true)]
    #[case::contains_empty(&ContainsParser, "", false)]
    #[case::contains_blank(&ContainsParser, " ", false)]
    #[case::contains_no_term(&ContainsParser, "~", false)]
    #[case::begins_with(&BeginsWithParser, "^hello", true)]
    #[case::begins_with_empty(&BeginsWithParser, "", false)]
    #[case::begins_with_blank(&BeginsWithParser, " ", false)]
    #[case::begins_with_no_term(&BeginsWithParser, "^", false)]
    #[case::exists(&ExistsParser, "$", true)]
    #[case::exists_padded(&ExistsParser, " $ ", true)]
    #[case::exists_empty(&ExistsParser, "", false)]
    #[case::exists_prefix(&ExistsParser, "$hello", false)]
    #[case::exists_suffix(&ExistsParser, "hello$", false)]
    #[case::exists_inner(&ExistsParser, "hello$hello", false)]
    #[case::not_equals(&NotEqualsParser, "!=hello", true)]
    #[case::not_equals_empty(&NotEqualsParser, "", false)]
    #[case::not_equals_plain(&NotEqualsParser, "1", false)]
    #[case::not_equals_no_term(&NotEqualsParser, "!=", false)]
    #[case::not_contains(&NotContainsParser, "!~hello", true)]
    #[case::not_contains_no_term(&NotContainsParser, "!~", false)]
    #[case::not_contains_contains(&NotContainsParser, "~hello", false)]
    #[case::not_exists(&NotExistsParser, "!$", true)]
    #[case::not_exists_empty(&NotExistsParser, "", false)]
    #[case::not_exists_exists(&NotExistsParser, "$", false)]
    #[case::not_exists_prefix(&NotExistsParser, "$hello", false)]
    #[case::not_exists_suffix(&NotExistsParser, "hello$", false)]
    #[case::equals(&EqualsParser, "hello", true)]
    #[case::equals_star(&EqualsParser, "*", true)]
    #[case::equals_operator_like(&EqualsParser, "~hello", true)]
    #[case::equals_empty(&EqualsParser, "", false)]
    #[case::equals_blank(&EqualsParser, "   ", false)]
    fn test_matches(
        #[case] parser: &dyn ValueToFilterParser,
        #[case] raw: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(parser.matches(raw), expected);
        assert_eq!(parser.compile("attr", raw, None).is_some(), expected);
    }

    #[rstest]
    #[case::contains(
        &ContainsParser,
        "~hello",
        Some(AttributeType::String),
        "contains(#attr, :attr)",
        Some(types::AttributeValue::S("hello".to_string()))
    )]
    #[case::contains_number_stays_string(
        &ContainsParser,
        "~30",
        Some(AttributeType::Number),
        "contains(#attr, :attr)",
        Some(types::AttributeValue::S("30".to_string()))
    )]
    #[case::begins_with(
        &BeginsWithParser,
        "^hello",
        None,
        "begins_with(#attr, :attr)",
        Some(types::AttributeValue::S("hello".to_string()))
    )]
    #[case::exists(&ExistsParser, "$", None, "attribute_exists(#attr)", None)]
    #[case::not_equals(
        &NotEqualsParser,
        "!=hello",
        Some(AttributeType::String),
        "#attr <> :attr",
        Some(types::AttributeValue::S("hello".to_string()))
    )]
    #[case::not_equals_number(
        &NotEqualsParser,
        "!=30",
        Some(AttributeType::Number),
        "#attr <> :attr",
        Some(types::AttributeValue::N("30".to_string()))
    )]
    #[case::not_contains(
        &NotContainsParser,
        "!~hello",
        Some(AttributeType::String),
        "not contains(#attr, :attr)",
        Some(types::AttributeValue::S("hello".to_string()))
    )]
    #[case::not_exists(&NotExistsParser, "!$", None, "attribute_not_exists(#attr)", None)]
    #[case::equals_string(
        &EqualsParser,
        " John ",
        Some(AttributeType::String),
        "#attr = :attr",
        Some(types::AttributeValue::S("John".to_string()))
    )]
    #[case::equals_number(
        &EqualsParser,
        "030",
        Some(AttributeType::Number),
        "#attr = :attr",
        Some(types::AttributeValue::N("30".to_string()))
    )]
    #[case::equals_boolean(
        &EqualsParser,
        "True",
        Some(AttributeType::Boolean),
        "#attr = :attr",
        Some(types::AttributeValue::Bool(true))
    )]
    fn test_compile(
        #[case] parser: &dyn ValueToFilterParser,
        #[case] raw: &str,
        #[case] declared: Option<AttributeType>,
        #[case] expression: &str,
        #[case] value: Option<types::AttributeValue>,
    ) {
        let fragment = parser.compile("attr", raw, declared).unwrap();
        assert_eq!(fragment.operator, parser.operator());
        assert_eq!(fragment.expression, expression);
        assert_eq!(
            fragment.names,
            collections::HashMap::from([("#attr".to_string(), "attr".to_string())])
        );
        let expected_values = value
            .map(|value| collections::HashMap::from([(":attr".to_string(), value)]))
            .unwrap_or_default();
        assert_eq!(fragment.values, expected_values);
        assert_eq!(fragment.fallback, None);
    }

    #[test]
    fn test_equals_number_fallback() {
        let fragment = EqualsParser
            .compile("age", "thirty", Some(AttributeType::Number))
            .unwrap();
        assert_eq!(fragment.expression, "#age = :age");
        assert_eq!(
            fragment.value(),
            Some(&types::AttributeValue::S("thirty".to_string()))
        );
        assert_eq!(
            fragment.fallback,
            Some(common::attribute::CoercionFallback {
                attribute: "age".to_string(),
                declared: AttributeType::Number,
                term: "thirty".to_string(),
            })
        );
    }

    #[test]
    fn test_equals_is_last() {
        let last = PARSERS.last().unwrap();
        assert_eq!(last.operator(), Operator::Equals);
        let earlier = &PARSERS[..PARSERS.len() - 1];
        assert!(earlier.iter().all(|parser| parser.operator() != Operator::Equals));
    }
}
