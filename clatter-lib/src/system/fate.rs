use super::limits;
use super::RollSystem;
use crate::command::Options;
use crate::dice;
use crate::error::Error;
use crate::error::Result;
use crate::source;
use crate::source::Source;
use crate::token::tokenize;
use crate::token::Token;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

pub const NAME: &str = "fate";

/// Rolled when no formula is given
const DEFAULT_FORMULA: &str = "4dF";

/// Adjective of the Fate ladder for a result
pub fn ladder(total: i64) -> &'static str {
    match total {
        i64::MIN..=-2 => "Terrible",
        -1 => "Poor",
        0 => "Mediocre",
        1 => "Average",
        2 => "Fair",
        3 => "Good",
        4 => "Great",
        5 => "Superb",
        6 => "Fantastic",
        7 => "Epic",
        _ => "Legendary",
    }
}

/// An evaluated term of a Fate formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FateTerm {
    pub token: Token,
    pub rolls: Vec<i64>,
    pub value: i64,
}

impl FateTerm {
    fn format_rolls(&self) -> Option<String> {
        match &self.token {
            Token::Dice(d) if d.sides.is_fudge() => Some(dice::format_list(
                &self.rolls.iter().map(|r| dice::fudge_glyph(*r)).collect::<Vec<_>>(),
            )),
            Token::Dice(_) => Some(dice::format_list(&self.rolls)),
            _ => None,
        }
    }
}

/// Fudge dice read off the Fate ladder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fate {
    pub verbose: bool,
    #[serde(skip_deserializing)]
    formula: String,
    #[serde(skip_deserializing)]
    terms: Vec<FateTerm>,
    #[serde(skip_deserializing)]
    total: i64,
    #[serde(skip)]
    rolled: bool,
}

impl Fate {
    pub fn terms(&self) -> &[FateTerm] {
        &self.terms
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    fn evaluate(token: Token, sign: i64, source: &mut dyn Source) -> Result<FateTerm> {
        let (rolls, value) = match &token {
            Token::Dice(d) => {
                if d.target.is_some() || d.explode.is_some() || d.failure.is_some() {
                    return Err(Error::InvalidToken(token.to_string()));
                }
                let sides = d.sides.count();
                limits::check(d.dice, sides)?;
                if d.dice <= 0 || sides <= 0 {
                    (Vec::new(), 0)
                } else {
                    let mut rolls = source::draw(source, d.dice as usize, 1, sides)?;
                    let value = if d.sides.is_fudge() {
                        rolls.iter().map(|r| dice::fudge_value(*r)).sum()
                    } else {
                        dice::total(&mut rolls, d.keep)
                    };
                    (rolls, value)
                }
            }
            Token::Number(n) => (Vec::new(), n.value),
            Token::Arithmetic(_) => return Err(Error::InvalidToken(token.to_string())),
        };
        Ok(FateTerm {
            token,
            rolls,
            value: sign.saturating_mul(value),
        })
    }
}

impl RollSystem for Fate {
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
        let formula = match tokens.join(" ").trim() {
            "" => DEFAULT_FORMULA.to_owned(),
            formula => formula.to_owned(),
        };
        debug!("Rolling fate formula `{}`", formula);

        let mut sign = 1;
        let mut terms = Vec::new();
        for token in tokenize(&formula)? {
            match token {
                Token::Arithmetic(a) => sign = a.multiplier,
                term => {
                    terms.push(Self::evaluate(term, sign, source)?);
                    sign = 1;
                }
            }
        }

        self.total = dice::saturating_sum(terms.iter().map(|t| t.value));
        self.terms = terms;
        self.formula = formula;
        self.rolled = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.formula.clear();
        self.terms.clear();
        self.total = 0;
        self.rolled = false;
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        let mut json = super::json(self)?;
        json["ladder"] = ladder(self.total).into();
        Ok(json)
    }
}

impl std::fmt::Display for Fate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rolled {}: {:+} ({})",
            self.formula,
            self.total,
            ladder(self.total)
        )?;
        if self.verbose {
            write!(
                f,
                " rolls: {}",
                self.terms.iter().filter_map(FateTerm::format_rolls).join(" ")
            )?;
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
        let mut o = Fate {
            verbose: true,
            ..Fate::default()
        };
        o.roll(&fields(&["4dF"]), &mut Sequence::new([1, 3, 5, 6]))
            .unwrap();
        assert_eq!(1, o.total());
        assert_eq!("rolled 4dF: +1 (Average) rolls: [- ▢ + +]", o.to_string());
    }

    #[test]
    fn defaults_to_four_fudge_dice() {
        let mut o = Fate::default();
        let mut seq = Sequence::new([3, 4, 3, 4]);
        o.roll(&[], &mut seq).unwrap();
        assert_eq!(0, seq.remaining());
        assert_eq!("rolled 4dF: +0 (Mediocre)", o.to_string());
    }

    #[test]
    fn skill_bonus() {
        let mut o = Fate::default();
        o.roll(&fields(&["4dF", "+", "3[Lore]"]), &mut Sequence::new([5, 5, 6, 3]))
            .unwrap();
        assert_eq!(6, o.total());
        assert_eq!("rolled 4dF + 3[Lore]: +6 (Fantastic)", o.to_string());
    }

    #[test]
    fn minus_signs_next_term() {
        let mut o = Fate::default();
        o.roll(&fields(&["4dF-2"]), &mut Sequence::new([1, 2, 1, 3]))
            .unwrap();
        let values: Vec<_> = o.terms().iter().map(|t| t.value).collect();
        assert_eq!(vec![-3, -2], values);
        assert_eq!("rolled 4dF-2: -5 (Terrible)", o.to_string());
    }

    #[test]
    fn plain_dice_keep() {
        let mut o = Fate {
            verbose: true,
            ..Fate::default()
        };
        o.roll(&fields(&["2d6kh1", "+", "1dF"]), &mut Sequence::new([2, 5, 6]))
            .unwrap();
        assert_eq!(6, o.total());
        assert_eq!("rolled 2d6kh1 + 1dF: +6 (Fantastic) rolls: [5 2] [+]", o.to_string());
    }

    #[test]
    fn rejects_success_counting_modifiers() {
        let mut o = Fate::default();
        match o.roll(&fields(&["4dF>0"]), &mut Sequence::new([1, 1, 1, 1])) {
            Err(Error::InvalidToken(token)) => assert_eq!("4dF>0", token),
            other => panic!("unexpected {:?}", other),
        }
        assert!(o.terms().is_empty());
    }

    #[test]
    fn huge_bonus_saturates() {
        let mut o = Fate::default();
        o.roll(&fields(&["9223372036854775807", "+", "1"]), &mut Sequence::new([]))
            .unwrap();
        assert_eq!(i64::MAX, o.total());
        assert_eq!(
            "rolled 9223372036854775807 + 1: +9223372036854775807 (Legendary)",
            o.to_string()
        );

        let mut o = Fate::default();
        o.roll(&fields(&["4dF", "-", "9223372036854775807"]), &mut Sequence::new([1, 1, 1, 1]))
            .unwrap();
        assert_eq!(i64::MIN, o.total());
    }

    #[test]
    fn rolls_once() {
        let mut o = Fate::default();
        let mut seq = Sequence::new([6, 6, 6, 6, 1, 1, 1, 1]);
        o.roll(&[], &mut seq).unwrap();
        assert_eq!(4, o.total());
        assert!(matches!(o.roll(&[], &mut seq), Err(Error::AlreadyRolled)));
        o.reset();
        o.roll(&[], &mut seq).unwrap();
        assert_eq!(-4, o.total());
    }

    #[test]
    fn ladder_ends() {
        assert_eq!("Terrible", ladder(-7));
        assert_eq!("Poor", ladder(-1));
        assert_eq!("Great", ladder(4));
        assert_eq!("Legendary", ladder(8));
        assert_eq!("Legendary", ladder(12));
    }

    #[test]
    fn json_result() {
        let mut o = Fate::default();
        o.roll(&[], &mut Sequence::new([5, 5, 5, 1])).unwrap();
        let json = o.to_json().unwrap();
        assert_eq!(2, json["total"]);
        assert_eq!("Fair", json["ladder"]);
        assert_eq!("4dF", json["formula"]);
    }
}
