use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

/// Faces a fudge die is rolled with
pub const FUDGE_SIDES: i64 = 6;

/// Number of faces on a die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sides {
    Faces(i64),
    Fudge,
}

impl Sides {
    /// Highest face, a fudge die being rolled as a d6
    pub fn count(&self) -> i64 {
        match *self {
            Sides::Faces(n) => n,
            Sides::Fudge => FUDGE_SIDES,
        }
    }

    pub fn is_fudge(&self) -> bool {
        matches!(self, Sides::Fudge)
    }
}

impl std::fmt::Display for Sides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sides::Faces(n) => write!(f, "{n}"),
            Sides::Fudge => write!(f, "F"),
        }
    }
}

/// Direction of a target or failure comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Lt,
    Gt,
    Eq,
    Lte,
    Gte,
}

impl Comparison {
    pub fn matches(&self, roll: i64, threshold: i64) -> bool {
        match self {
            Comparison::Lt => roll < threshold,
            Comparison::Gt => roll > threshold,
            Comparison::Eq => roll == threshold,
            Comparison::Lte => roll <= threshold,
            Comparison::Gte => roll >= threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Eq => "=",
            Comparison::Lte => "<=",
            Comparison::Gte => ">=",
        }
    }
}

impl std::str::FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Comparison::Lt),
            ">" => Ok(Comparison::Gt),
            "=" => Ok(Comparison::Eq),
            "<=" => Ok(Comparison::Lte),
            ">=" => Ok(Comparison::Gte),
            other => Err(format!("unknown comparison `{other}`")),
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional dice modifier with the amount of dice to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keep {
    Highest(usize),
    Lowest(usize),
}

impl Keep {
    /// Sort `rolls` so the kept dice come first and return their sum.
    ///
    /// Dropped dice stay in the slice, after the kept ones. Keeping more dice than were
    /// rolled keeps them all.
    pub fn apply(&self, rolls: &mut [i64]) -> i64 {
        let n = match *self {
            Keep::Highest(n) => {
                rolls.sort_by(|a, b| b.cmp(a));
                n
            }
            Keep::Lowest(n) => {
                rolls.sort();
                n
            }
        };
        rolls.iter().take(n).sum()
    }

    pub fn amount(&self) -> usize {
        match *self {
            Keep::Highest(n) | Keep::Lowest(n) => n,
        }
    }
}

impl std::fmt::Display for Keep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Keep::Highest(n) => write!(f, "kh{n}"),
            Keep::Lowest(n) => write!(f, "kl{n}"),
        }
    }
}

/// Sum a pool, keeping only part of it when asked
pub fn total(rolls: &mut [i64], keep: Option<Keep>) -> i64 {
    match keep {
        Some(keep) => keep.apply(rolls),
        None => rolls.iter().sum(),
    }
}

/// Sum that sticks at the `i64` bounds instead of overflowing
pub fn saturating_sum<I: IntoIterator<Item = i64>>(values: I) -> i64 {
    values.into_iter().fold(0i64, |acc, n| acc.saturating_add(n))
}

/// Comma separated rolls, the ones past `kept` struck through
pub fn format_kept(rolls: &[i64], kept: Option<usize>) -> String {
    rolls
        .iter()
        .enumerate()
        .map(|(i, roll)| match kept {
            Some(kept) if i >= kept => format!("~~{roll}~~"),
            _ => roll.to_string(),
        })
        .join(",")
}

/// Space separated rolls in brackets, `[6 6 8]`
pub fn format_list<T: std::fmt::Display>(rolls: &[T]) -> String {
    format!("[{}]", rolls.iter().format(" "))
}

/// Face of a fudge die rolled as a d6
pub fn fudge_value(roll: i64) -> i64 {
    match roll {
        r if r <= 2 => -1,
        r if r <= 4 => 0,
        _ => 1,
    }
}

pub fn fudge_glyph(roll: i64) -> &'static str {
    match fudge_value(roll) {
        -1 => "-",
        0 => "▢",
        _ => "+",
    }
}
