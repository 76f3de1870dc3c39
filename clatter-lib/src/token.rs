use crate::dice::Comparison;
use crate::dice::Keep;
use crate::dice::Sides;
use crate::error::Error;
use crate::error::Result;
use crate::parser::Parser;
use crate::parser::Rule;
use pest::iterators::Pair;
use pest::Parser as _;
use serde::Serialize;

/// A comparison against a fixed face value, `>=8` or `f1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: i64,
}

/// `NdS` with its optional modifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceToken {
    pub dice: i64,
    pub sides: Sides,
    pub target: Option<Threshold>,
    /// Explode at or above this face
    pub explode: Option<i64>,
    pub failure: Option<Threshold>,
    pub keep: Option<Keep>,
    pub label: Option<String>,
}

impl DiceToken {
    pub fn new(dice: i64, sides: Sides) -> Self {
        Self {
            dice,
            sides,
            target: None,
            explode: None,
            failure: None,
            keep: None,
            label: None,
        }
    }
}

/// A flat modifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberToken {
    pub value: i64,
    pub label: Option<String>,
}

/// A standalone `+` or `-`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArithmeticToken {
    pub multiplier: i64,
}

/// One piece of a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    Dice(DiceToken),
    Number(NumberToken),
    Arithmetic(ArithmeticToken),
}

impl Token {
    /// Whether the token is a term (dice or number) rather than a sign
    pub fn is_term(&self) -> bool {
        !matches!(self, Token::Arithmetic(_))
    }
}

fn write_label(f: &mut std::fmt::Formatter<'_>, label: &Option<String>) -> std::fmt::Result {
    match label {
        Some(label) => write!(f, "[{label}]"),
        None => Ok(()),
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Dice(d) => {
                write!(f, "{}d{}", d.dice, d.sides)?;
                if let Some(target) = d.target {
                    write!(f, "{}{}", target.comparison, target.value)?;
                }
                match d.explode {
                    Some(n) if n == d.sides.count() => write!(f, "!")?,
                    Some(n) => write!(f, "!>{n}")?,
                    None => (),
                }
                if let Some(failure) = d.failure {
                    match failure.comparison {
                        Comparison::Gte => write!(f, "f>{}", failure.value)?,
                        _ => write!(f, "f{}", failure.value)?,
                    }
                }
                if let Some(keep) = d.keep {
                    write!(f, "{keep}")?;
                }
                write_label(f, &d.label)
            }
            Token::Number(n) => {
                write!(f, "{}", n.value)?;
                write_label(f, &n.label)
            }
            Token::Arithmetic(a) => write!(f, "{}", if a.multiplier < 0 { "-" } else { "+" }),
        }
    }
}

fn extract_label(pair: Pair<Rule>) -> Option<String> {
    pair.into_inner()
        .next()
        .map(|text| text.as_str().to_owned())
        .filter(|text| !text.is_empty())
}

fn parse_dice(pair: Pair<Rule>) -> Result<DiceToken> {
    let fragment = pair.as_str().to_owned();
    let mut token = DiceToken::new(0, Sides::Faces(0));
    let mut explode = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::count => token.dice = Parser::parse_int(inner.as_str(), &fragment)?,
            Rule::faces => token.sides = Sides::Faces(Parser::parse_int(inner.as_str(), &fragment)?),
            Rule::fudge => token.sides = Sides::Fudge,
            Rule::target => {
                let mut parts = inner.into_inner();
                let comparison = parts
                    .next()
                    .and_then(|c| c.as_str().parse::<Comparison>().ok())
                    .ok_or_else(|| Error::MalformedToken(fragment.clone()))?;
                let value = parts
                    .next()
                    .ok_or_else(|| Error::MalformedToken(fragment.clone()))?;
                token.target = Some(Threshold {
                    comparison,
                    value: Parser::parse_int(value.as_str(), &fragment)?,
                });
            }
            Rule::explode => {
                // a bare `!` explodes on the highest face, known once sides are read
                explode = Some(match inner.into_inner().next() {
                    Some(value) => Some(Parser::parse_int(value.as_str(), &fragment)?),
                    None => None,
                });
            }
            Rule::failure => {
                let comparison = match inner.clone().into_inner().next() {
                    Some(op) if op.as_str() == "f>" => Comparison::Gte,
                    _ => Comparison::Lte,
                };
                token.failure = Some(Threshold {
                    comparison,
                    value: Parser::extract_modifier_value(inner, &fragment)?,
                });
            }
            Rule::keep => {
                let highest = inner
                    .clone()
                    .into_inner()
                    .next()
                    .map_or(true, |op| op.as_str() == "kh");
                let n = Parser::extract_modifier_value(inner, &fragment)?;
                let n = usize::try_from(n).map_err(|_| Error::MalformedToken(fragment.clone()))?;
                token.keep = Some(if highest {
                    Keep::Highest(n)
                } else {
                    Keep::Lowest(n)
                });
            }
            Rule::label => token.label = extract_label(inner),
            _ => unreachable!("{:?}", inner),
        }
    }
    token.explode = explode.map(|at| at.unwrap_or_else(|| token.sides.count()));
    Ok(token)
}

fn parse_number(pair: Pair<Rule>) -> Result<NumberToken> {
    let fragment = pair.as_str().to_owned();
    let mut token = NumberToken {
        value: 0,
        label: None,
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::value => token.value = Parser::parse_int(inner.as_str(), &fragment)?,
            Rule::label => token.label = extract_label(inner),
            _ => unreachable!("{:?}", inner),
        }
    }
    Ok(token)
}

/// Split a dice formula into tokens, left to right.
///
/// Tokenizing stops quietly at the first text that is neither dice, a number nor a sign;
/// whatever follows is dropped.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let formula = match Parser::parse(Rule::formula, input)?.next() {
        Some(formula) => formula,
        None => return Ok(Vec::new()),
    };
    formula
        .into_inner()
        .map(|pair| match pair.as_rule() {
            Rule::dice => parse_dice(pair).map(Token::Dice),
            Rule::number => parse_number(pair).map(Token::Number),
            Rule::arithmetic => {
                let multiplier = match pair.into_inner().next().map(|sign| sign.as_rule()) {
                    Some(Rule::minus) => -1,
                    _ => 1,
                };
                Ok(Token::Arithmetic(ArithmeticToken { multiplier }))
            }
            _ => unreachable!("{:?}", pair),
        })
        .collect()
}
