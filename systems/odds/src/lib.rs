#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure odds calculator that turns running totals into wheel probabilities.
//!
//! Each participant's projected total `x = total + stake + 1` is mapped to a
//! weight `x^-k`, where `k` comes from the [`FairnessMode`]. Weights are then
//! normalised into probabilities and scaled into slice angles, so that the
//! participants who already collected the most are the least likely to be
//! selected again.

use fortune_wheel_core::{FairnessMode, Totals};

/// Degrees covered by a full wheel.
pub const FULL_TURN_DEGREES: f64 = 360.0;

/// Probability and slice angle for every participant, in roster order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Odds {
    probabilities: Vec<f64>,
    angles: Vec<f64>,
}

impl Odds {
    /// Probabilities summing to one, one per participant.
    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Slice sizes in degrees, one per participant.
    #[must_use]
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Number of participants on the wheel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Reports whether the wheel has no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Consecutive wheel slices starting at zero degrees.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.angles.iter().scan(0.0, |start, sweep| {
            let segment = Segment {
                start: *start,
                sweep: *sweep,
            };
            *start += sweep;
            Some(segment)
        })
    }

    /// Angle of the midpoint of the slice at `index`.
    ///
    /// Renderers aim the pointer here so the wheel visibly lands on the
    /// participant that was already selected.
    #[must_use]
    pub fn slice_center(&self, index: usize) -> Option<f64> {
        self.segments().nth(index).map(|segment| segment.center())
    }
}

/// Arc of the wheel owned by a single participant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Angle where the slice begins, in degrees.
    pub start: f64,
    /// Width of the slice, in degrees.
    pub sweep: f64,
}

impl Segment {
    /// Angle where the slice ends.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.sweep
    }

    /// Angle halfway through the slice.
    #[must_use]
    pub fn center(&self) -> f64 {
        self.start + self.sweep / 2.0
    }
}

/// Unnormalised weight of a participant with the given running total.
#[must_use]
pub fn weight(total: u64, stake: u64, mode: FairnessMode) -> f64 {
    // The extra one keeps a fresh participant with a zero stake finite.
    let projected = total as f64 + stake as f64 + 1.0;
    projected.powf(-mode.exponent())
}

/// Computes the odds of every named participant for a pending stake.
///
/// Names missing from `totals` count as zero. The output keeps the order of
/// `names`; an empty list yields empty odds.
#[must_use]
pub fn compute_odds<S: AsRef<str>>(
    names: &[S],
    totals: &Totals,
    stake: u64,
    mode: FairnessMode,
) -> Odds {
    if names.is_empty() {
        return Odds::default();
    }

    let weights: Vec<f64> = names
        .iter()
        .map(|name| weight(totals.get(name.as_ref()), stake, mode))
        .collect();

    let sum: f64 = weights.iter().sum();
    let sum = if sum > 0.0 { sum } else { 1.0 };

    let probabilities: Vec<f64> = weights.iter().map(|weight| weight / sum).collect();
    let angles = probabilities
        .iter()
        .map(|probability| probability * FULL_TURN_DEGREES)
        .collect();

    Odds {
        probabilities,
        angles,
    }
}
