use crate::error::Error;
use crate::error::Result;
use pest::iterators::Pair;
use pest_derive::Parser;

/// Pest parser
#[derive(Parser)]
#[grammar = "clatter.pest"]
pub struct Parser;

impl Parser {
    /// Parse the inner `value` of a modifier pair, reporting `fragment` when it does not fit
    pub(crate) fn extract_modifier_value(modifier: Pair<Rule>, fragment: &str) -> Result<i64> {
        match modifier.into_inner().find(|p| p.as_rule() == Rule::value) {
            Some(value) => Self::parse_int(value.as_str(), fragment),
            None => Err(Error::MalformedToken(fragment.to_owned())),
        }
    }

    pub(crate) fn parse_int(digits: &str, fragment: &str) -> Result<i64> {
        digits
            .parse::<i64>()
            .map_err(|_| Error::MalformedToken(fragment.to_owned()))
    }
}
