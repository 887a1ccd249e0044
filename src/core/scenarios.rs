use super::types::{DisplayRates, FeeScenarioSet};

pub(crate) const SCENARIO_SPREAD_PCT: f64 = 1.0;

// The higher-fee scenario stays at least this far below the gross return.
pub(crate) const NET_RETURN_FLOOR_PCT: f64 = 1.0;

pub fn derive_fee_scenarios(base_fee_pct: f64, gross_return_pct: f64) -> FeeScenarioSet {
    let lower_pct = (base_fee_pct - SCENARIO_SPREAD_PCT).max(0.0);
    let higher_pct =
        (base_fee_pct + SCENARIO_SPREAD_PCT).min(gross_return_pct - NET_RETURN_FLOOR_PCT);
    FeeScenarioSet {
        base_pct: base_fee_pct,
        lower_pct,
        higher_pct,
    }
}

impl FeeScenarioSet {
    pub fn display_rates(&self) -> DisplayRates {
        DisplayRates {
            lower_pct: round_half_up(self.lower_pct),
            higher_pct: round_half_up(self.higher_pct),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_ordered(&self) -> bool {
        self.lower_pct <= self.base_pct && self.base_pct <= self.higher_pct
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
