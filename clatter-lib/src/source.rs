use crate::error::Error;
use crate::error::Result;
use crate::error::SourceError;
use rand::rngs::StdRng;
use rand::rngs::ThreadRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::VecDeque;
use tracing::trace;

pub mod random_org;

/// Interface for rolling dice.
///
/// A source hands out `count` integers drawn uniformly from `min..=max`. It is free to fail,
/// for example when it is backed by a remote entropy service.
pub trait Source {
    fn draw(&mut self, count: usize, min: i64, max: i64) -> std::result::Result<Vec<i64>, SourceError>;
}

impl<F> Source for F
where
    F: FnMut(usize, i64, i64) -> std::result::Result<Vec<i64>, SourceError>,
{
    fn draw(&mut self, count: usize, min: i64, max: i64) -> std::result::Result<Vec<i64>, SourceError> {
        self(count, min, max)
    }
}

/// Draw exactly `count` values, turning any source failure into [`Error::RandomSource`]
pub(crate) fn draw(source: &mut dyn Source, count: usize, min: i64, max: i64) -> Result<Vec<i64>> {
    let values = source.draw(count, min, max).map_err(Error::RandomSource)?;
    if values.len() != count {
        return Err(Error::RandomSource(
            format!("asked for {} values, got {}", count, values.len()).into(),
        ));
    }
    trace!("Drew {:?} in {}..={}", values, min, max);
    Ok(values)
}

/// Default random dice roller
#[derive(Debug, Clone)]
pub struct Generator<R: Rng> {
    generator: R,
}

impl<R: Rng> Generator<R> {
    pub fn new(generator: R) -> Self {
        Self { generator }
    }
}

impl Generator<ThreadRng> {
    /// Roller backed by the thread local generator
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl Generator<StdRng> {
    /// Reproducible roller, the same seed always rolls the same dice
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Source for Generator<R> {
    fn draw(&mut self, count: usize, min: i64, max: i64) -> std::result::Result<Vec<i64>, SourceError> {
        if min > max {
            return Err(format!("empty range {min}..={max}").into());
        }
        Ok((0..count)
            .map(|_| self.generator.gen_range(min..=max))
            .collect())
    }
}

/// Returned by [`Sequence`] once it runs dry
#[derive(Debug, thiserror::Error)]
#[error("sequence exhausted: asked for {requested} values, {remaining} left")]
pub struct Exhausted {
    pub requested: usize,
    pub remaining: usize,
}

/// Fixed queue of rolls, handed out in order.
///
/// Every draw takes the next `count` values off the front. Asking for more than what is
/// left fails with [`Exhausted`] and consumes nothing.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    values: VecDeque<i64>,
}

impl Sequence {
    pub fn new<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl Source for Sequence {
    fn draw(&mut self, count: usize, _min: i64, _max: i64) -> std::result::Result<Vec<i64>, SourceError> {
        if count > self.values.len() {
            return Err(Box::new(Exhausted {
                requested: count,
                remaining: self.values.len(),
            }));
        }
        Ok(self.values.drain(..count).collect())
    }
}
