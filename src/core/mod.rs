mod engine;
mod locale;
mod scenarios;
mod session;
mod solver;
mod tooltip;
mod types;

pub use engine::{FeeChart, build_chart, compounded_principal, project, series_style};
pub use locale::{BuiltinCatalog, Locale, MessageCatalog, format_decimal, interpolate, keys};
pub use scenarios::derive_fee_scenarios;
pub use session::{ChartSession, RenderTarget, ViewportSource};
pub use solver::{format_years, years_to_double, years_to_multiply};
pub use tooltip::{
    COMPACT_BREAKPOINT_PX, HIDE_DEBOUNCE, HoverEvent, TooltipContent, TooltipOverlay,
    handle_hover, is_compact, tooltip_content, tooltip_position,
};
pub use types::{
    CanvasRect, DisplayRates, FeeDragError, FeeScenario, FeeScenarioSet, Fill, GrowthPoint,
    GrowthSeries, InvestmentConfig, MAX_HORIZON_YEARS, ScenarioSummary, ScrollOffset,
    SeriesStyle, TooltipPlacement, TooltipSize, ViewportGeometry,
};
