//! Count, mean and population standard deviation of a list of ratings.

use std::collections::BTreeMap;
use std::fmt;

/// Summary of a non-empty list of ratings
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    /// Distinct ratings with their number of occurrences, highest rating first
    pub counts: Vec<(i64, usize)>,
    pub mean: f64,
    /// Population standard deviation
    pub stdev: f64,
}

impl RatingSummary {
    /// Summarise `ratings`; `None` when there is nothing to summarise
    pub fn from_ratings(ratings: &[i64]) -> Option<Self> {
        if ratings.is_empty() {
            return None;
        }

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for rating in ratings {
            *counts.entry(*rating).or_insert(0) += 1;
        }

        let n = ratings.len() as f64;
        let mean = ratings.iter().map(|r| *r as f64).sum::<f64>() / n;
        let variance = ratings
            .iter()
            .map(|r| (*r as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            counts: counts.into_iter().rev().collect(),
            mean,
            stdev: variance.sqrt(),
        })
    }

    /// Render a summary block, or `n/a` for no ratings
    pub fn render(ratings: &[i64]) -> String {
        match Self::from_ratings(ratings) {
            Some(summary) => summary.to_string(),
            None => "n/a".to_string(),
        }
    }
}

impl fmt::Display for RatingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rating, count) in &self.counts {
            writeln!(f, "{rating}: {count}")?;
        }
        write!(
            f,
            "Mean: {} Stdev: {}",
            significant(self.mean, 3),
            significant(self.stdev, 3)
        )
    }
}

/// Format `value` with `digits` significant figures, `%g` style
///
/// Trailing zeros are dropped and scientific notation is used only for very
/// large or very small magnitudes.
pub fn significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        format!("{}e{:+03}", trim_zeros(mantissa), exponent)
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
