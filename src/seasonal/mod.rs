//! Seasonal weight table
//!
//! Months absent from the table resolve to the configured default, which is
//! kept very low to suppress off-season scores.

use crate::config::{MonthWeight, SeasonalTable};

impl SeasonalTable {
    pub fn new(months: Vec<MonthWeight>, default_weight: f64) -> Self {
        Self {
            default_weight,
            months,
        }
    }

    /// Weight for a calendar month (1-12). Total: unknown months get the default.
    pub fn weight_for(&self, month: u32) -> f64 {
        self.months
            .iter()
            .rev()
            .find(|m| m.month == month)
            .map_or(self.default_weight, |m| m.weight)
    }

    /// Dense month lookup for the scoring hot path.
    pub fn index(&self) -> SeasonalIndex {
        let mut weights = [self.default_weight; 12];
        for m in &self.months {
            if let Some(slot) = month_slot(m.month) {
                weights[slot] = m.weight;
            }
        }
        SeasonalIndex {
            weights,
            default_weight: self.default_weight,
        }
    }
}

fn month_slot(month: u32) -> Option<usize> {
    (1..=12).contains(&month).then(|| month as usize - 1)
}

/// Resolved weights for all twelve months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalIndex {
    weights: [f64; 12],
    default_weight: f64,
}

impl SeasonalIndex {
    /// O(1) lookup. Months outside 1-12 resolve to the default.
    pub fn weight_for(&self, month: u32) -> f64 {
        month_slot(month).map_or(self.default_weight, |slot| self.weights[slot])
    }
}
