use super::limits;
use super::RollSystem;
use crate::command::Options;
use crate::dice;
use crate::dice::Keep;
use crate::error::Error;
use crate::error::Result;
use crate::fold;
use crate::fold::Negate;
use crate::parser::Parser;
use crate::parser::Rule;
use crate::source;
use crate::source::Source;
use itertools::Itertools;
use pest::Parser as _;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

pub const NAME: &str = "d20";

/// One signed term of a d20 expression, either a pool of dice or a flat number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Term {
    pub dice: i64,
    pub sides: i64,
    #[serde(skip_deserializing)]
    pub rolls: Vec<i64>,
    pub value: i64,
    pub keep_highest: usize,
    pub keep_lowest: usize,
    pub negative: bool,
}

impl Term {
    fn flat(value: i64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    fn is_roll(&self) -> bool {
        self.dice > 0 && self.sides > 0
    }

    fn keep(&self) -> Option<Keep> {
        match (self.keep_highest, self.keep_lowest) {
            (0, 0) => None,
            (n, 0) => Some(Keep::Highest(n)),
            (_, n) => Some(Keep::Lowest(n)),
        }
    }

    /// Find a `<count>d<sides>[(kh|kl)<n>]` in a segment, `1d20kh` reads as `1d20`
    fn parse(segment: &str) -> Option<Result<Self>> {
        let pair = Parser::parse(Rule::d20_term, segment).ok()?.next()?;
        let mut term = Self::default();
        let parsed = pair.into_inner().try_for_each(|inner| -> Result<()> {
            match inner.as_rule() {
                Rule::count => term.dice = Parser::parse_int(inner.as_str(), segment)?,
                Rule::faces => term.sides = Parser::parse_int(inner.as_str(), segment)?,
                Rule::keep => {
                    let highest = inner.clone().into_inner().next().map(|op| op.as_str()) == Some("kh");
                    let n = Parser::extract_modifier_value(inner, segment)?;
                    let n = usize::try_from(n).map_err(|_| Error::MalformedToken(segment.to_owned()))?;
                    if highest {
                        term.keep_highest = n;
                    } else {
                        term.keep_lowest = n;
                    }
                }
                _ => (),
            };
            Ok(())
        });
        Some(parsed.map(|_| term))
    }
}

impl Negate for Term {
    fn negate(&mut self) {
        self.negative = !self.negative;
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        if self.is_roll() {
            write!(f, "{}d{}", self.dice, self.sides)?;
            if let Some(keep) = self.keep() {
                write!(f, "{keep}")?;
            }
            Ok(())
        } else {
            write!(f, "{}", self.value.abs())
        }
    }
}

/// The additive dice system of Dungeons & Dragons and its kin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct D20 {
    pub verbose: bool,
    #[serde(skip_deserializing)]
    original_expression: String,
    pub expression: Vec<Term>,
    #[serde(skip)]
    rolled: bool,
}

impl D20 {
    pub fn expression(&self) -> &[Term] {
        &self.expression
    }

    pub fn original_expression(&self) -> &str {
        &self.original_expression
    }

    pub fn total(&self) -> i64 {
        dice::saturating_sum(self.expression.iter().map(|t| t.value))
    }

    fn parse_tokens(tokens: &[String]) -> Result<Vec<Term>> {
        let joined = tokens.join("+").replace('-', "+-+");
        let mut invalid = None;
        let terms = fold::fold(
            joined.split('+').map(str::trim).filter(|s| !s.is_empty()),
            |segment| match Term::parse(segment) {
                Some(Ok(term)) => Some(term),
                Some(Err(error)) => {
                    invalid.get_or_insert(error);
                    None
                }
                None => segment.parse::<i64>().ok().map(Term::flat),
            },
        );
        match invalid {
            Some(error) => Err(error),
            None => terms,
        }
    }

    fn evaluate(expression: &[Term], source: &mut dyn Source) -> Result<Vec<Term>> {
        expression
            .iter()
            .cloned()
            .map(|mut term| -> Result<Term> {
                if term.is_roll() {
                    limits::check(term.dice, term.sides)?;
                    term.rolls = source::draw(source, term.dice as usize, 1, term.sides)?;
                    let keep = term.keep();
                    term.value = dice::total(&mut term.rolls, keep);
                }
                if term.negative {
                    term.value = term.value.saturating_neg();
                }
                Ok(term)
            })
            .collect()
    }
}

impl RollSystem for D20 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, options: &Options) {
        self.verbose |= options.verbose;
    }

    fn roll(&mut self, tokens: &[String], source: &mut dyn Source) -> Result<()> {
        if self.rolled {
            return Err(Error::AlreadyRolled);
        }
        let (original, expression) = if tokens.is_empty() {
            // a configured expression, as sent in a JSON body
            let original = self
                .expression
                .iter()
                .enumerate()
                .map(|(i, term)| match (i, term.negative) {
                    (0, _) => term.to_string(),
                    (_, true) => format!("- {}", term.to_string().trim_start_matches('-')),
                    (_, false) => format!("+ {term}"),
                })
                .join(" ");
            (original, self.expression.clone())
        } else {
            (tokens.join(" "), Self::parse_tokens(tokens)?)
        };
        debug!("Rolling d20 expression `{}`", original);
        let expression = Self::evaluate(&expression, source)?;
        self.original_expression = original;
        self.expression = expression;
        self.rolled = true;
        Ok(())
    }

    fn reset(&mut self) {
        if self.rolled {
            for term in self.expression.iter_mut() {
                if term.is_roll() {
                    term.rolls.clear();
                    term.value = 0;
                } else if term.negative {
                    term.value = term.value.saturating_neg();
                }
            }
        }
        self.original_expression.clear();
        self.rolled = false;
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        let mut json = super::json(self)?;
        json["originalExpression"] = self.original_expression.clone().into();
        json["total"] = self.total().into();
        Ok(json)
    }
}

/// `rolled {expression}: {total}`. Verbose output lists the rolls of the dice terms only, in
/// formula order; flat terms have no entry.
impl std::fmt::Display for D20 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rolled {}: {}", self.original_expression, self.total())?;
        if self.verbose {
            let rolls = self
                .expression
                .iter()
                .filter(|t| !t.rolls.is_empty())
                .map(|t| dice::format_kept(&t.rolls, t.keep().map(|k| k.amount())))
                .join(" ");
            write!(f, " ({})", rolls)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Sequence;

    fn fields(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn roll() {
        let mut o = D20 {
            verbose: true,
            ..D20::default()
        };
        o.roll(&fields(&["4d20"]), &mut Sequence::new([1, 20, 3, 5]))
            .unwrap();
        assert_eq!(vec![1, 20, 3, 5], o.expression()[0].rolls);
        assert_eq!(29, o.expression()[0].value);
        assert_eq!("rolled 4d20: 29 (1,20,3,5)", o.to_string());
    }

    #[test]
    fn roll_keep_highest() {
        let mut o = D20::default();
        o.roll(&fields(&["4d6kh3"]), &mut Sequence::new([3, 5, 4, 6]))
            .unwrap();
        assert_eq!(vec![6, 5, 4, 3], o.expression()[0].rolls);
        assert_eq!(15, o.expression()[0].value);
        assert_eq!("rolled 4d6kh3: 15", o.to_string());
    }

    #[test]
    fn roll_keep_lowest() {
        let mut o = D20 {
            verbose: true,
            ..D20::default()
        };
        o.roll(&fields(&["4d6kl3"]), &mut Sequence::new([3, 5, 4, 6]))
            .unwrap();
        assert_eq!(vec![3, 4, 5, 6], o.expression()[0].rolls);
        assert_eq!(12, o.expression()[0].value);
        assert_eq!("rolled 4d6kl3: 12 (3,4,5,~~6~~)", o.to_string());
    }

    #[test]
    fn keep_more_than_rolled() {
        let mut o = D20::default();
        o.roll(&fields(&["2d6kh5"]), &mut Sequence::new([2, 4])).unwrap();
        assert_eq!(6, o.total());
    }

    #[test]
    fn signed_terms_in_formula_order() {
        let mut o = D20 {
            verbose: true,
            ..D20::default()
        };
        o.roll(
            &fields(&["1d20", "+", "5", "-", "1d4", "-", "2"]),
            &mut Sequence::new([12, 3]),
        )
        .unwrap();
        let values: Vec<_> = o.expression().iter().map(|t| t.value).collect();
        assert_eq!(vec![12, 5, -3, -2], values);
        assert_eq!(12, o.total());
        assert_eq!("rolled 1d20 + 5 - 1d4 - 2: 12 (12 3)", o.to_string());
    }

    #[test]
    fn glued_formula() {
        let mut o = D20::default();
        o.roll(&fields(&["2d8+3-1"]), &mut Sequence::new([4, 7]))
            .unwrap();
        assert_eq!(13, o.total());
        assert_eq!("rolled 2d8+3-1: 13", o.to_string());
    }

    #[test]
    fn invalid_token() {
        let mut o = D20::default();
        match o.roll(&fields(&["1d20", "+", "str"]), &mut Sequence::new([10])) {
            Err(Error::InvalidToken(token)) => assert_eq!("str", token),
            other => panic!("unexpected {:?}", other),
        }
        assert!(o.expression().is_empty());
    }

    #[test]
    fn dice_found_inside_segment() {
        let mut o = D20::default();
        o.roll(&fields(&["1d20kh", "+", "adv2d6kl1"]), &mut Sequence::new([10, 4, 3]))
            .unwrap();
        let terms = o.expression();
        assert_eq!((1, 20, 0, 0), (terms[0].dice, terms[0].sides, terms[0].keep_highest, terms[0].keep_lowest));
        assert_eq!((2, 6, 1), (terms[1].dice, terms[1].sides, terms[1].keep_lowest));
        assert_eq!(13, o.total());
    }

    #[test]
    fn segment_without_dice_is_invalid() {
        let mut o = D20::default();
        match o.roll(&fields(&["d20"]), &mut Sequence::new([10])) {
            Err(Error::InvalidToken(token)) => assert_eq!("d20", token),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn huge_flat_terms_saturate() {
        let mut o = D20::default();
        o.roll(&fields(&["9223372036854775807", "+", "1"]), &mut Sequence::new([]))
            .unwrap();
        assert_eq!(i64::MAX, o.total());
        assert_eq!("rolled 9223372036854775807 + 1: 9223372036854775807", o.to_string());
        assert_eq!(i64::MAX, o.to_json().unwrap()["total"]);

        let mut o = D20::default();
        o.roll(
            &fields(&["-", "9223372036854775807", "-", "9223372036854775807"]),
            &mut Sequence::new([]),
        )
        .unwrap();
        assert_eq!(i64::MIN, o.total());
    }

    #[test]
    fn flat_only() {
        let mut o = D20::default();
        o.roll(&fields(&["3", "-", "5"]), &mut Sequence::new([])).unwrap();
        assert_eq!(-2, o.total());
    }

    #[test]
    fn configured_expression() {
        let mut o: D20 = serde_json::from_str(
            r#"{"verbose": true, "expression": [
                {"dice": 4, "sides": 6, "keepHighest": 3},
                {"value": 2, "negative": true}
            ]}"#,
        )
        .unwrap();
        o.roll(&[], &mut Sequence::new([3, 5, 4, 6])).unwrap();
        assert_eq!(13, o.total());
        assert_eq!("rolled 4d6kh3 - 2: 13 (6,5,4,~~3~~)", o.to_string());
    }

    #[test]
    fn too_many_dice() {
        let mut o = D20::default();
        assert!(matches!(
            o.roll(&fields(&["5001d6"]), &mut Sequence::new([])),
            Err(Error::Limit(_))
        ));
    }

    #[test]
    fn reset_rolls_again() {
        let mut o = D20::default();
        let mut seq = Sequence::new([3, 5, 4, 6, 1, 1, 1, 1]);
        o.roll(&fields(&["4d6kh3", "-", "1"]), &mut seq).unwrap();
        assert_eq!(14, o.total());
        assert!(matches!(
            o.roll(&fields(&["1d6"]), &mut seq),
            Err(Error::AlreadyRolled)
        ));
        o.reset();
        o.roll(&[], &mut seq).unwrap();
        assert_eq!(2, o.total());
        assert_eq!("rolled 4d6kh3 - 1: 2", o.to_string());
    }

    #[test]
    fn json_result() {
        let mut o = D20::default();
        o.roll(&fields(&["2d6"]), &mut Sequence::new([2, 3])).unwrap();
        let json = o.to_json().unwrap();
        assert_eq!(5, json["total"]);
        assert_eq!("2d6", json["originalExpression"]);
        assert_eq!(serde_json::json!([2, 3]), json["expression"][0]["rolls"]);
    }
}
