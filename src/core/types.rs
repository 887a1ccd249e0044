use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_HORIZON_YEARS: u32 = 100;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeeDragError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("break-even horizon is undefined: {0}")]
    BreakEvenUndefined(String),
    #[error("render target `{0}` has no drawing surface")]
    RenderTargetMissing(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentConfig {
    pub starting_capital: f64,
    pub gross_annual_return_pct: f64,
    pub horizon_years: u32,
    pub base_fee_pct: f64,
    pub start_year: i32,
}

impl InvestmentConfig {
    pub fn new(
        starting_capital: f64,
        gross_annual_return_pct: f64,
        horizon_years: u32,
        base_fee_pct: f64,
        start_year: i32,
    ) -> Result<Self, FeeDragError> {
        let config = Self {
            starting_capital,
            gross_annual_return_pct,
            horizon_years,
            base_fee_pct,
            start_year,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FeeDragError> {
        if !self.starting_capital.is_finite() || self.starting_capital <= 0.0 {
            return Err(invalid("starting capital must be > 0"));
        }
        if self.horizon_years == 0 {
            return Err(invalid("horizon must be at least one year"));
        }
        if self.horizon_years > MAX_HORIZON_YEARS {
            return Err(invalid(format!(
                "horizon must be at most {MAX_HORIZON_YEARS} years"
            )));
        }
        if !self.gross_annual_return_pct.is_finite() || self.gross_annual_return_pct <= -100.0 {
            return Err(invalid("annual return must be > -100%"));
        }
        if !(0.0..=100.0).contains(&self.base_fee_pct) {
            return Err(invalid("annual fee must be between 0% and 100%"));
        }
        if self.gross_annual_return_pct - self.base_fee_pct <= -100.0 {
            return Err(invalid("annual return net of fees must be > -100%"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> FeeDragError {
    FeeDragError::InvalidConfig(msg.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeScenarioSet {
    pub base_pct: f64,
    pub lower_pct: f64,
    pub higher_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRates {
    pub lower_pct: i64,
    pub higher_pct: i64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeScenario {
    HigherFee,
    BaseFee,
    LowerFee,
}

impl FeeScenario {
    // Renderer order; fill targets refer to these positions.
    pub const ALL: [FeeScenario; 3] = [
        FeeScenario::HigherFee,
        FeeScenario::BaseFee,
        FeeScenario::LowerFee,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FeeScenario::HigherFee => "higherFee",
            FeeScenario::BaseFee => "baseFee",
            FeeScenario::LowerFee => "lowerFee",
        }
    }

    pub fn rate(self, fees: &FeeScenarioSet) -> f64 {
        match self {
            FeeScenario::HigherFee => fees.higher_pct,
            FeeScenario::BaseFee => fees.base_pct,
            FeeScenario::LowerFee => fees.lower_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub year: i32,
    pub label: String,
    pub ending_capital: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GrowthSeries {
    points: Vec<GrowthPoint>,
}

impl GrowthSeries {
    pub fn from_points(points: Vec<GrowthPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GrowthPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GrowthPoint> {
        self.points.get(index)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.ending_capital)
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.ending_capital)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    Origin,
    #[serde(untagged)]
    Series(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    pub border_color: &'static str,
    pub background_color: &'static str,
    pub border_width: u32,
    pub tension: f64,
    pub fill: Fill,
    pub point_radius: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub scenario: FeeScenario,
    pub fee_pct: f64,
    pub final_capital: f64,
    pub lost_to_fees: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollOffset {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub canvas: CanvasRect,
    pub scroll: ScrollOffset,
    pub compact: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipPlacement {
    pub content: String,
    pub left_px: f64,
    pub top_px: f64,
    pub opacity: u8,
}

impl TooltipPlacement {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.opacity == 1
    }
}
