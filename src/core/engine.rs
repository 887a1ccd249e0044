use super::scenarios::derive_fee_scenarios;
use super::types::{
    FeeDragError, FeeScenario, FeeScenarioSet, Fill, GrowthPoint, GrowthSeries,
    InvestmentConfig, ScenarioSummary, SeriesStyle,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FeeChart {
    pub starting_capital: f64,
    pub gross_annual_return_pct: f64,
    pub fees: FeeScenarioSet,
    pub higher_fee: GrowthSeries,
    pub base_fee: GrowthSeries,
    pub lower_fee: GrowthSeries,
    pub reference: GrowthSeries,
}

impl FeeChart {
    pub fn series(&self, scenario: FeeScenario) -> &GrowthSeries {
        match scenario {
            FeeScenario::HigherFee => &self.higher_fee,
            FeeScenario::BaseFee => &self.base_fee,
            FeeScenario::LowerFee => &self.lower_fee,
        }
    }

    pub fn len(&self) -> usize {
        self.base_fee.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_fee.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.base_fee
            .points()
            .iter()
            .map(|p| p.label.as_str())
            .collect()
    }

    fn ensure_finite(&self) -> Result<(), FeeDragError> {
        let series = [
            (FeeScenario::HigherFee.key(), &self.higher_fee),
            (FeeScenario::BaseFee.key(), &self.base_fee),
            (FeeScenario::LowerFee.key(), &self.lower_fee),
            ("reference", &self.reference),
        ];
        for (name, values) in series {
            if let Some(point) = values.points().iter().find(|p| !p.ending_capital.is_finite()) {
                return Err(FeeDragError::InvalidConfig(format!(
                    "{name} projection overflows in {}; lower the starting capital or annual return",
                    point.label
                )));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> Vec<ScenarioSummary> {
        let reference_final = self.reference.last_value().unwrap_or(self.starting_capital);
        FeeScenario::ALL
            .iter()
            .map(|&scenario| {
                let final_capital = self
                    .series(scenario)
                    .last_value()
                    .unwrap_or(self.starting_capital);
                ScenarioSummary {
                    scenario,
                    fee_pct: scenario.rate(&self.fees),
                    final_capital,
                    lost_to_fees: reference_final - final_capital,
                }
            })
            .collect()
    }
}

pub fn compounded_principal(starting_capital: f64, years: i32, rate_pct: f64) -> f64 {
    (starting_capital * (1.0 + rate_pct / 100.0).powi(years)).round()
}

pub fn project(
    starting_capital: f64,
    gross_return_pct: f64,
    fee_pct: f64,
    horizon_years: u32,
    start_year: i32,
) -> GrowthSeries {
    let net_rate_pct = gross_return_pct - fee_pct;
    let points = (0..horizon_years)
        .map(|i| {
            let year = start_year + i as i32;
            GrowthPoint {
                year,
                label: year.to_string(),
                ending_capital: compounded_principal(starting_capital, i as i32, net_rate_pct),
            }
        })
        .collect();
    GrowthSeries::from_points(points)
}

/// Projects all three fee scenarios plus the fee-free reference.
///
/// Fails with `InvalidConfig` when any projected value overflows, so a
/// returned chart only ever holds finite capital.
pub fn build_chart(config: &InvestmentConfig) -> Result<FeeChart, FeeDragError> {
    let fees = derive_fee_scenarios(config.base_fee_pct, config.gross_annual_return_pct);
    let run = |fee_pct: f64| {
        project(
            config.starting_capital,
            config.gross_annual_return_pct,
            fee_pct,
            config.horizon_years,
            config.start_year,
        )
    };

    let chart = FeeChart {
        starting_capital: config.starting_capital,
        gross_annual_return_pct: config.gross_annual_return_pct,
        higher_fee: run(fees.higher_pct),
        base_fee: run(fees.base_pct),
        lower_fee: run(fees.lower_pct),
        reference: run(0.0),
        fees,
    };
    chart.ensure_finite()?;
    Ok(chart)
}

pub fn series_style(scenario: FeeScenario) -> SeriesStyle {
    let (border_color, background_color, fill) = match scenario {
        FeeScenario::HigherFee => ("#e74c3c", "rgba(231, 76, 60, 0.2)", Fill::Origin),
        FeeScenario::BaseFee => ("#f1c40f", "rgba(241, 196, 15, 0.2)", Fill::Series(0)),
        FeeScenario::LowerFee => ("#27ae60", "rgba(39, 174, 96, 0.2)", Fill::Series(1)),
    };
    SeriesStyle {
        border_color,
        background_color,
        border_width: 3,
        tension: 0.2,
        fill,
        point_radius: 0,
    }
}
