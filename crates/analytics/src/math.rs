//! Statistical helpers shared by the metric calculations.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

pub(crate) const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Arithmetic mean, or `None` for an empty slice or a sum past `Decimal::MAX`.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    sum.checked_div(Decimal::from(values.len()))
}

/// Population standard deviation (divides by `n`, not `n - 1`).
///
/// `None` for an empty slice or when the squared deviations leave `Decimal`'s range.
pub fn population_std_dev(values: &[Decimal]) -> Option<Decimal> {
    let avg = mean(values)?;
    let squares = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let deviation = v.checked_sub(avg)?;
        acc.checked_add(deviation.checked_mul(deviation)?)
    })?;
    squares.checked_div(Decimal::from(values.len()))?.sqrt()
}

/// `100 * part / whole`, or zero when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) / Decimal::from(whole) * HUNDRED
}

/// Stability of trade results on a 0–100 scale, derived from the coefficient of variation.
///
/// Fewer than two results, or a zero mean, score 0.
pub fn consistency_score(results: &[Decimal]) -> Decimal {
    if results.len() < 2 {
        return Decimal::ZERO;
    }
    let (Some(avg), Some(std_dev)) = (mean(results), population_std_dev(results)) else {
        return Decimal::ZERO;
    };
    if avg.is_zero() {
        return Decimal::ZERO;
    }

    // A mean close to zero blows the ratio up past Decimal's range; the score is 0 there anyway.
    let penalty = std_dev
        .checked_div(avg)
        .map(|cv| cv.abs())
        .and_then(|cv| cv.checked_mul(HUNDRED));
    match penalty {
        Some(penalty) => (HUNDRED - penalty).max(Decimal::ZERO),
        None => Decimal::ZERO,
    }
}
