use crate::error::Result;
use crate::parser;
use crate::parser::Rule;
use crate::source::Source;
use crate::system::new_roller;
use crate::system::RollSystem;
use clap::Args;
use clap::Parser;
use pest::Parser as _;
use tracing::debug;

pub const DEFAULT_SYSTEM: &str = "cofd";

/// Flags shared by every roll system, each system reads the ones it knows
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Show every die rolled
    #[arg(short, long, action)]
    pub verbose: bool,
    /// Reroll dice at or above this face
    #[arg(long)]
    pub again: Option<i64>,
    /// Successes needed for an exceptional success
    #[arg(long)]
    pub exceptional: Option<i64>,
    /// Reroll every failed die once
    #[arg(long, action)]
    pub rote: bool,
    /// Every 1 takes away a success
    #[arg(long, action)]
    pub weakness: bool,
}

/// A roll request, `--system d20 --verbose 4d6kh3 + 2`.
///
/// Flags come first; everything from the first formula field on is the formula, signs and
/// negative numbers included. An unknown flag before the formula is an error.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "roll", no_binary_name = true, args_override_self = true)]
pub struct RollCommand {
    /// Roll system to use
    #[arg(short, long, default_value = DEFAULT_SYSTEM)]
    pub system: String,
    /// JSON configuration laid over the system defaults
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(flatten)]
    pub options: Options,
    #[arg(
        num_args = 1..,
        trailing_var_arg = true,
        allow_negative_numbers = true
    )]
    pub formula: Vec<String>,
}

/// Split a command line on whitespace.
///
/// A JSON object (`{"again": 9}`) or text in single quotes stays a single field, the quotes
/// themselves are dropped.
pub fn split_fields(line: &str) -> Result<Vec<String>> {
    let line = match parser::Parser::parse(Rule::line, line)?.next() {
        Some(line) => line,
        None => return Ok(Vec::new()),
    };
    Ok(line
        .into_inner()
        .filter_map(|field| match field.as_rule() {
            Rule::braced | Rule::bare => Some(field.as_str().to_owned()),
            Rule::quoted => field
                .into_inner()
                .next()
                .map(|text| text.as_str().to_owned()),
            _ => None,
        })
        .collect())
}

impl RollCommand {
    pub fn from_fields<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        Ok(Self::try_parse_from(fields)?)
    }

    /// Parse a command line split by [`split_fields`]
    pub fn from_line(line: &str) -> Result<Self> {
        Self::from_fields(split_fields(line)?)
    }

    /// Build, configure and roll the requested system
    pub fn roll(&self, source: &mut dyn Source) -> Result<Box<dyn RollSystem>> {
        let mut system = new_roller(&self.system, self.config.as_deref())?;
        system.configure(&self.options);
        debug!("Rolling `{}` with {:?}", system.name(), self.formula);
        system.roll(&self.formula, source)?;
        Ok(system)
    }
}
