use crate::dice;
use crate::error::Error;
use crate::error::Result;

/// A term that a standalone `-` can flip
pub(crate) trait Negate {
    fn negate(&mut self);
}

impl Negate for i64 {
    fn negate(&mut self) {
        *self = -*self;
    }
}

/// Reduce a flat `[+|-] term` sequence to its signed terms, in formula order.
///
/// Segments are walked back to front so a `-` flips the term right after it. A sign with
/// no term after it is ignored. Anything `term` rejects is an [`Error::InvalidToken`].
pub(crate) fn fold<'a, T, I, F>(segments: I, mut term: F) -> Result<Vec<T>>
where
    T: Negate,
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: DoubleEndedIterator,
    F: FnMut(&str) -> Option<T>,
{
    let mut stack: Vec<T> = Vec::new();
    for segment in segments.into_iter().rev() {
        match segment {
            "+" => (),
            "-" => {
                if let Some(last) = stack.last_mut() {
                    last.negate();
                }
            }
            other => match term(other) {
                Some(value) => stack.push(value),
                None => return Err(Error::InvalidToken(other.to_owned())),
            },
        }
    }
    stack.reverse();
    Ok(stack)
}

/// Size of a dice pool written as a signed sum, never below zero
pub(crate) fn pool<S: AsRef<str>>(tokens: &[S]) -> Result<i64> {
    let terms = fold(tokens.iter().map(|t| t.as_ref()), |s| s.parse::<i64>().ok())?;
    Ok(dice::saturating_sum(terms).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sums_and_clamps() {
        assert_eq!(5, pool(&["5"]).unwrap());
        assert_eq!(6, pool(&["4", "+", "2"]).unwrap());
        assert_eq!(2, pool(&["4", "-", "2"]).unwrap());
        assert_eq!(0, pool(&["1", "-", "2"]).unwrap());
        assert_eq!(0, pool::<&str>(&[]).unwrap());
    }

    #[test]
    fn minus_binds_to_following_term() {
        assert_eq!(3, pool(&["5", "-", "3", "+", "1"]).unwrap());
        assert_eq!(7, pool(&["5", "-", "-", "2"]).unwrap());
        assert_eq!(5, pool(&["5", "-"]).unwrap());
    }

    #[test]
    fn rejects_words() {
        match pool(&["5", "+", "strength"]) {
            Err(Error::InvalidToken(token)) => assert_eq!("strength", token),
            other => panic!("unexpected {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn pool_never_negative(terms in prop::collection::vec((any::<bool>(), 0i64..50), 0..10)) {
            let tokens: Vec<String> = terms
                .iter()
                .flat_map(|(minus, n)| [if *minus { "-" } else { "+" }.to_owned(), n.to_string()])
                .collect();
            prop_assert!(pool(&tokens).unwrap() >= 0);
        }
    }
}
