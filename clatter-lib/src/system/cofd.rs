use super::limits;
use super::RollSystem;
use crate::command::Options;
use crate::dice;
use crate::error::Error;
use crate::error::Result;
use crate::fold;
use crate::source;
use crate::source::Source;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

pub const NAME: &str = "cofd";

const SIDES: i64 = 10;
const SUCCESS: i64 = 8;

/// Successes and dice of a CofD roll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub successes: i64,
    pub rolls: Vec<i64>,
    pub rerolls: Vec<i64>,
}

/// The d10 success counting pool of Chronicles of Darkness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CofD {
    pub again: i64,
    pub exceptional: i64,
    pub rote: bool,
    pub weakness: bool,
    pub verbose: bool,
    #[serde(skip_deserializing)]
    dice: i64,
    #[serde(skip_deserializing)]
    results: Outcome,
    #[serde(skip)]
    rolled: bool,
}

impl Default for CofD {
    fn default() -> Self {
        Self {
            again: 10,
            exceptional: 5,
            rote: false,
            weakness: false,
            verbose: false,
            dice: 0,
            results: Outcome::default(),
            rolled: false,
        }
    }
}

impl CofD {
    /// Size of the rolled pool, 0 for a chance die
    pub fn dice(&self) -> i64 {
        self.dice
    }

    pub fn results(&self) -> &Outcome {
        &self.results
    }

    pub fn is_chance(&self) -> bool {
        self.dice == 0
    }

    pub fn is_exceptional(&self) -> bool {
        self.results.successes >= self.exceptional
    }

    pub fn is_critical_failure(&self) -> bool {
        self.is_chance() && self.results.rolls.first() == Some(&1)
    }

    fn roll_pool(
        &self,
        dice: i64,
        rote: bool,
        weakness: bool,
        source: &mut dyn Source,
    ) -> Result<Outcome> {
        let rolls = source::draw(source, dice.max(1) as usize, 1, SIDES)?;
        let mut successes = 0;
        let mut bonus = 0;
        for &roll in rolls.iter() {
            if dice == 0 {
                if roll == SIDES {
                    successes += 1;
                }
                continue;
            }
            if roll < SUCCESS && rote {
                bonus += 1;
                continue;
            }
            if roll >= SUCCESS {
                successes += 1;
            }
            if roll >= self.again {
                bonus += 1;
            }
            if weakness && roll == 1 {
                successes -= 1;
            }
        }
        let mut rerolls = Vec::new();
        if bonus > 0 {
            // bonus dice are never rote nor weak
            let extra = self.roll_pool(bonus, false, false, source)?;
            successes += extra.successes;
            rerolls.extend(extra.rolls);
            rerolls.extend(extra.rerolls);
        }
        Ok(Outcome {
            successes: successes.max(0),
            rolls,
            rerolls,
        })
    }
}

impl RollSystem for CofD {
    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, options: &Options) {
        if let Some(again) = options.again {
            self.again = again;
        }
        if let Some(exceptional) = options.exceptional {
            self.exceptional = exceptional;
        }
        self.rote |= options.rote;
        self.weakness |= options.weakness;
        self.verbose |= options.verbose;
    }

    fn roll(&mut self, tokens: &[String], source: &mut dyn Source) -> Result<()> {
        if self.rolled {
            return Err(Error::AlreadyRolled);
        }
        if self.again < 2 {
            return Err(Error::InvalidOption(format!(
                "again must be at least 2, got {}",
                self.again
            )));
        }
        let dice = fold::pool(tokens)?;
        limits::check(dice, SIDES)?;
        debug!(
            "Rolling {} CofD dice (again {}, rote {}, weakness {})",
            dice, self.again, self.rote, self.weakness
        );
        let results = self.roll_pool(dice, self.rote, self.weakness, source)?;
        self.dice = dice;
        self.results = results;
        self.rolled = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.dice = 0;
        self.results = Outcome::default();
        self.rolled = false;
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        super::json(self)
    }
}

impl std::fmt::Display for CofD {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rolled {} CofD dice", self.dice)?;
        if self.is_chance() {
            write!(f, " (Chance Die)")?;
        }
        let mut flags = Vec::new();
        if self.again != 10 {
            flags.push(format!("{}-again", self.again));
        }
        if self.rote {
            flags.push("rote".to_owned());
        }
        if self.weakness {
            flags.push("weakness".to_owned());
        }
        if !flags.is_empty() {
            write!(f, " (with {})", flags.iter().format(", "))?;
        }
        write!(f, " for {} successes.", self.results.successes)?;
        if self.is_exceptional() {
            write!(f, " Exceptional success!")?;
        }
        if self.is_critical_failure() {
            write!(f, " Critical failure!")?;
        }
        if self.verbose {
            write!(f, " rolls: {}", dice::format_list(&self.results.rolls))?;
            if !self.results.rerolls.is_empty() {
                write!(f, " rerolls: {}", dice::format_list(&self.results.rerolls))?;
            }
        }
        Ok(())
    }
}
