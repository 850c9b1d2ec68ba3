use rust_decimal::Decimal;

use std::fmt::Display;
use std::ops::{Add, AddAssign, Sub};

/// Tolerance used for every tie and threshold comparison between vote totals.
///
/// Transfer values are divided out of surpluses and pooled values, so two totals that are
/// equal on paper may differ in the last of the 28 digits kept by `Decimal`. Any two totals
/// closer than this are considered equal.
pub const VOTE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 20);

/// A (possibly fractional) amount of votes: the weight of a single ballot or the sum of many.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct VoteWeight(Decimal);

impl VoteWeight {
    pub const EMPTY: VoteWeight = VoteWeight(Decimal::ZERO);
    /// The weight of a ballot that has never been transferred.
    pub const FULL: VoteWeight = VoteWeight(Decimal::ONE);

    pub fn from_count(count: u64) -> VoteWeight {
        VoteWeight(Decimal::from(count))
    }

    /// `num / den`, or nothing if `den` is zero.
    pub fn ratio(num: u64, den: u64) -> Option<VoteWeight> {
        if den == 0 {
            None
        } else {
            Some(VoteWeight(Decimal::from(num) / Decimal::from(den)))
        }
    }

    /// Splits this amount uniformly over `parts` ballots. Zero parts receive nothing.
    pub fn split(self, parts: usize) -> VoteWeight {
        if parts == 0 {
            VoteWeight::EMPTY
        } else {
            VoteWeight(self.0 / Decimal::from(parts as u64))
        }
    }

    pub fn scaled(self, times: usize) -> VoteWeight {
        VoteWeight(self.0 * Decimal::from(times as u64))
    }

    pub fn approx_eq(self, other: VoteWeight) -> bool {
        (self.0 - other.0).abs() <= VOTE_EPSILON
    }

    /// True if this total is at least `threshold`, up to the tolerance.
    pub fn reaches(self, threshold: VoteWeight) -> bool {
        self.0 + VOTE_EPSILON >= threshold.0
    }

    /// True if this total is strictly above `threshold`, beyond the tolerance.
    pub fn exceeds(self, threshold: VoteWeight) -> bool {
        self.0 > threshold.0 + VOTE_EPSILON
    }

    pub fn is_full(self) -> bool {
        self.0 == Decimal::ONE
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl std::iter::Sum for VoteWeight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteWeight(iter.map(|vw| vw.0).sum())
    }
}

impl AddAssign for VoteWeight {
    fn add_assign(&mut self, rhs: VoteWeight) {
        self.0 += rhs.0;
    }
}

impl Add for VoteWeight {
    type Output = VoteWeight;
    fn add(self: VoteWeight, rhs: VoteWeight) -> VoteWeight {
        VoteWeight(self.0 + rhs.0)
    }
}

impl Sub for VoteWeight {
    type Output = VoteWeight;
    fn sub(self: VoteWeight, rhs: VoteWeight) -> VoteWeight {
        VoteWeight(self.0 - rhs.0)
    }
}

// Rendered with 4 decimal places, trailing zeros removed.
impl Display for VoteWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.round_dp(4).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_is_not_floored() {
        let q = VoteWeight::ratio(10, 3).unwrap();
        assert!(q > VoteWeight::from_count(3));
        assert!(q < VoteWeight::from_count(4));
        assert_eq!(q.to_string(), "3.3333");
        assert_eq!(VoteWeight::ratio(1, 0), None);
    }

    #[test]
    fn split_then_scale_stays_within_tolerance() {
        let surplus = VoteWeight::from_count(10) - VoteWeight::ratio(10, 3).unwrap();
        let per_ballot = surplus.split(9);
        assert!(per_ballot.scaled(9).approx_eq(surplus));
        assert_eq!(surplus.split(0), VoteWeight::EMPTY);
    }

    #[test]
    fn threshold_comparisons_use_tolerance() {
        let q = VoteWeight::ratio(10, 3).unwrap();
        let third = VoteWeight::ratio(1, 3).unwrap();
        // Ten thirds summed one by one lands a hair below 10/3.
        let summed: VoteWeight = std::iter::repeat(third).take(10).sum();
        assert!(summed.reaches(q));
        assert!(!summed.exceeds(q));
        assert!(VoteWeight::from_count(4).exceeds(q));
        assert!(!VoteWeight::from_count(3).reaches(q));
    }

    #[test]
    fn full_weight_is_exact() {
        assert!(VoteWeight::FULL.is_full());
        assert!(VoteWeight::from_count(1).is_full());
        assert!(!VoteWeight::ratio(2, 3).unwrap().is_full());
        assert_eq!(VoteWeight::from_count(2).to_string(), "2");
    }
}
