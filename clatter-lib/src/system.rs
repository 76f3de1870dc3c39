pub mod cofd;
pub mod d20;
pub mod fate;

use crate::command::Options;
use crate::error::Error;
use crate::error::Result;
use crate::source::Source;
use itertools::Itertools;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) mod limits {
    /// Arbitrary limits to avoid oom
    pub(crate) const MAX_DICE_AMOUNT: i64 = 5000;
    pub(crate) const MAX_DICE_SIDES: i64 = 5000;

    pub(crate) fn check(dice: i64, sides: i64) -> crate::error::Result<()> {
        if dice > MAX_DICE_AMOUNT {
            return Err(crate::error::Error::Limit(format!(
                "exceeded max allowed amount of dice `{}`",
                MAX_DICE_AMOUNT
            )));
        }
        if sides > MAX_DICE_SIDES {
            return Err(crate::error::Error::Limit(format!(
                "exceeded max allowed number of dice sides `{}`",
                MAX_DICE_SIDES
            )));
        }
        Ok(())
    }
}

/// A game's way of rolling and reading dice.
///
/// A system is built per request, configured, rolled once and rendered through its
/// `Display` implementation. Rolling a second time requires a [`RollSystem::reset`].
pub trait RollSystem: std::fmt::Display + std::fmt::Debug + Send {
    /// Name the registry knows the system by
    fn name(&self) -> &'static str;

    /// Apply the options that were explicitly set on the command line
    fn configure(&mut self, options: &Options);

    /// Evaluate the formula fields, drawing every die from `source`
    fn roll(&mut self, tokens: &[String], source: &mut dyn Source) -> Result<()>;

    /// Forget the last result, keeping the configuration
    fn reset(&mut self);

    /// Configuration and result as JSON
    fn to_json(&self) -> Result<serde_json::Value>;
}

type Constructor = fn(Option<&str>) -> Result<Box<dyn RollSystem>>;

fn construct<S>(body: Option<&str>) -> Result<Box<dyn RollSystem>>
where
    S: RollSystem + Default + DeserializeOwned + 'static,
{
    let system = match body {
        Some(body) if !body.trim().is_empty() => serde_json::from_str::<S>(body)?,
        _ => S::default(),
    };
    Ok(Box::new(system))
}

static SYSTEMS: Lazy<BTreeMap<&'static str, Constructor>> = Lazy::new(|| {
    let mut systems: BTreeMap<&'static str, Constructor> = BTreeMap::new();
    systems.insert(cofd::NAME, construct::<cofd::CofD>);
    systems.insert(d20::NAME, construct::<d20::D20>);
    systems.insert(fate::NAME, construct::<fate::Fate>);
    systems
});

/// Names of every registered system, sorted
pub fn available() -> impl Iterator<Item = &'static str> {
    SYSTEMS.keys().copied()
}

/// Build the system registered as `name`.
///
/// A JSON `body` is laid over the system's defaults; fields the system does not know are
/// ignored and results are never read from it.
pub fn new_roller(name: &str, body: Option<&str>) -> Result<Box<dyn RollSystem>> {
    let key = name.trim().to_lowercase();
    match SYSTEMS.get(key.as_str()) {
        Some(constructor) => {
            debug!("Building `{}` roller", key);
            constructor(body)
        }
        None => Err(Error::InvalidRollSystem {
            requested: name.to_owned(),
            available: available().join(", "),
        }),
    }
}

/// Shared `to_json` body for serializable systems
pub(crate) fn json<S: Serialize>(system: &S) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(system)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_registered_system() {
        for name in available() {
            assert_eq!(name, new_roller(name, None).unwrap().name());
        }
        assert_eq!(vec!["cofd", "d20", "fate"], available().collect::<Vec<_>>());
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!("cofd", new_roller("CofD", None).unwrap().name());
    }

    #[test]
    fn unknown_system() {
        let error = new_roller("test", None).unwrap_err();
        assert!(matches!(error, Error::InvalidRollSystem { ref requested, .. } if requested == "test"));
        assert_eq!("choose a roll system (one of: cofd, d20, fate)", error.to_string());
    }

    #[test]
    fn body_overrides_defaults() {
        let roller = new_roller("cofd", Some(r#"{"dice": 5, "again": 9}"#)).unwrap();
        let json = roller.to_json().unwrap();
        assert_eq!(9, json["again"]);
        assert_eq!(5, json["exceptional"]);
        assert_eq!(0, json["dice"]);
    }

    #[test]
    fn malformed_body() {
        assert!(matches!(
            new_roller("d20", Some("{\"verbose\": ")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn limits() {
        assert!(limits::check(5000, 5000).is_ok());
        assert!(matches!(limits::check(5001, 6), Err(Error::Limit(_))));
        assert!(matches!(limits::check(1, 5001), Err(Error::Limit(_))));
    }
}
