// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

/// A single attempt of a fetch.
///
/// Attempts are numbered from zero. The last attempt is the one after which no retry
/// follows.
///
/// # Examples
///
/// ```
/// use steadfetch::Attempt;
///
/// let attempt = Attempt::new(0, false);
/// assert!(attempt.is_first());
/// assert!(!attempt.is_last());
/// assert_eq!(attempt.number(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    index: u32,
    is_last: bool,
}

impl Attempt {
    /// Creates an attempt.
    #[must_use]
    pub fn new(index: u32, is_last: bool) -> Self {
        Self { index, is_last }
    }

    /// Returns the first attempt out of `max_attempts` (treated as at least one).
    pub(crate) fn first(max_attempts: u32) -> Self {
        Self::new(0, max_attempts <= 1)
    }

    /// Returns the 0-based index.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the 1-based number, as reported to humans.
    #[must_use]
    pub fn number(self) -> u32 {
        self.index.saturating_add(1)
    }

    /// Returns true if this is the first attempt.
    #[must_use]
    pub fn is_first(self) -> bool {
        self.index == 0
    }

    /// Returns true if no retry follows this attempt.
    #[must_use]
    pub fn is_last(self) -> bool {
        self.is_last
    }

    /// Returns the next attempt, or `None` once `max_attempts` have been made.
    pub(crate) fn increment(self, max_attempts: u32) -> Option<Self> {
        let next = self.index.saturating_add(1);
        if next >= max_attempts {
            return None;
        }
        Some(Self::new(next, next == max_attempts.saturating_sub(1)))
    }
}

impl Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.number().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_through_three_attempts() {
        let first = Attempt::first(3);
        assert!(first.is_first() && !first.is_last());

        let second = first.increment(3).unwrap();
        assert_eq!((second.index(), second.is_last()), (1, false));

        let third = second.increment(3).unwrap();
        assert_eq!((third.index(), third.is_last()), (2, true));

        assert!(third.increment(3).is_none());
    }

    #[test]
    fn single_attempt_is_first_and_last() {
        let only = Attempt::first(1);
        assert!(only.is_first() && only.is_last());
        assert!(only.increment(1).is_none());
        assert!(Attempt::first(0).is_last());
    }

    #[test]
    fn display_is_one_based() {
        assert_eq!(Attempt::new(2, true).to_string(), "3");
    }
}
