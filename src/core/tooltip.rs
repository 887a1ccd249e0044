use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::engine::{FeeChart, compounded_principal};
use super::locale::{Locale, MessageCatalog, format_decimal, keys};
use super::types::{
    CanvasRect, FeeScenario, ScrollOffset, TooltipPlacement, TooltipSize, ViewportGeometry,
};

pub const COMPACT_BREAKPOINT_PX: f64 = 768.0;
pub const HIDE_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum HoverEvent {
    Move {
        #[serde(default)]
        index: Option<usize>,
    },
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub years_elapsed: i32,
    pub fee_costs: [(FeeScenario, f64); 3],
    pub text: String,
}

impl TooltipContent {
    pub fn fee_cost(&self, scenario: FeeScenario) -> f64 {
        self.fee_costs
            .iter()
            .find(|(s, _)| *s == scenario)
            .map(|(_, cost)| *cost)
            .unwrap_or(0.0)
    }
}

pub fn is_compact(viewport_width: f64) -> bool {
    viewport_width <= COMPACT_BREAKPOINT_PX
}

pub fn tooltip_content(
    chart: &FeeChart,
    index: usize,
    locale: Locale,
    catalog: &dyn MessageCatalog,
) -> Option<TooltipContent> {
    let first_year = chart.base_fee.get(0)?.year;
    let hovered_year = chart.base_fee.get(index)?.year;
    let years_elapsed = hovered_year - first_year;

    let reference =
        compounded_principal(chart.starting_capital, years_elapsed, chart.gross_annual_return_pct);

    let mut fee_costs = [(FeeScenario::HigherFee, 0.0); 3];
    for (slot, scenario) in fee_costs.iter_mut().zip(FeeScenario::ALL) {
        let capital = chart.series(scenario).get(index)?.ending_capital;
        *slot = (scenario, (reference - capital).round());
    }

    let cost = |scenario| {
        fee_costs
            .iter()
            .find(|(s, _)| *s == scenario)
            .map(|(_, c)| format_decimal(*c, locale))
            .unwrap_or_default()
    };
    let text = catalog.message(
        locale,
        keys::CAPITAL_FEES_TOOLTIP,
        &[
            ("years", years_elapsed.to_string()),
            ("lowerFeeRate", format_decimal(chart.fees.lower_pct, locale)),
            ("baseFeeRate", format_decimal(chart.fees.base_pct, locale)),
            ("higherFeeRate", format_decimal(chart.fees.higher_pct, locale)),
            ("lowerPrincipal", cost(FeeScenario::LowerFee)),
            ("basePrincipal", cost(FeeScenario::BaseFee)),
            ("higherPrincipal", cost(FeeScenario::HigherFee)),
            ("currency", locale.currency_symbol().to_string()),
        ],
    );

    Some(TooltipContent {
        years_elapsed,
        fee_costs,
        text,
    })
}

/// Centered horizontally on the canvas; above it on wide layouts, below on compact ones.
pub fn tooltip_position(
    canvas: CanvasRect,
    scroll: ScrollOffset,
    tooltip: TooltipSize,
    compact: bool,
) -> (f64, f64) {
    let left = canvas.left + canvas.width / 2.0 - tooltip.width / 2.0 + scroll.left;
    let canvas_height = canvas.bottom() - canvas.top;
    let top = if compact {
        canvas.top + scroll.top + tooltip.height / 2.0 + tooltip.height / 7.0
    } else {
        canvas.top + scroll.top - tooltip.height + canvas_height / 5.0
    };
    (left, top)
}

pub fn handle_hover(
    chart: Option<&FeeChart>,
    event: HoverEvent,
    geometry: ViewportGeometry,
    tooltip: TooltipSize,
    locale: Locale,
    catalog: &dyn MessageCatalog,
) -> TooltipPlacement {
    let HoverEvent::Move { index: Some(index) } = event else {
        return TooltipPlacement::hidden();
    };
    let Some(chart) = chart else {
        debug!(index, "hover before any chart was rendered");
        return TooltipPlacement::hidden();
    };
    let Some(content) = tooltip_content(chart, index, locale, catalog) else {
        debug!(index, len = chart.len(), "stale hover index, hiding tooltip");
        return TooltipPlacement::hidden();
    };

    let (left_px, top_px) =
        tooltip_position(geometry.canvas, geometry.scroll, tooltip, geometry.compact);
    TooltipPlacement {
        content: content.text,
        left_px,
        top_px,
        opacity: 1,
    }
}

pub struct TooltipOverlay {
    placements: Arc<watch::Sender<TooltipPlacement>>,
    pending_hide: Option<JoinHandle<()>>,
    hide_delay: Duration,
}

impl TooltipOverlay {
    pub fn new() -> Self {
        Self::with_delay(HIDE_DEBOUNCE)
    }

    pub fn with_delay(hide_delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(TooltipPlacement::hidden());
        Self {
            placements: Arc::new(tx),
            pending_hide: None,
            hide_delay,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TooltipPlacement> {
        self.placements.subscribe()
    }

    pub fn current(&self) -> TooltipPlacement {
        self.placements.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.placements.borrow().is_visible()
    }

    pub fn show(&mut self, placement: TooltipPlacement) {
        self.cancel_pending_hide();
        self.placements.send_replace(placement);
    }

    pub fn hide_now(&mut self) {
        self.cancel_pending_hide();
        self.placements.send_replace(TooltipPlacement::hidden());
    }

    // Must be called from within a tokio runtime.
    pub fn schedule_hide(&mut self) {
        self.cancel_pending_hide();
        let placements = Arc::clone(&self.placements);
        let delay = self.hide_delay;
        self.pending_hide = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            placements.send_replace(TooltipPlacement::hidden());
        }));
    }

    fn cancel_pending_hide(&mut self) {
        if let Some(handle) = self.pending_hide.take() {
            if !handle.is_finished() {
                debug!("cancelling pending tooltip hide");
            }
            handle.abort();
        }
    }
}

impl Default for TooltipOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TooltipOverlay {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_hide.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::build_chart;
    use crate::core::locale::BuiltinCatalog;
    use crate::core::types::InvestmentConfig;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn default_chart() -> FeeChart {
        build_chart(&InvestmentConfig {
            starting_capital: 100_000.0,
            gross_annual_return_pct: 7.0,
            horizon_years: 30,
            base_fee_pct: 3.0,
            start_year: 2026,
        })
        .expect("finite projection")
    }

    fn geometry(compact: bool) -> ViewportGeometry {
        ViewportGeometry {
            canvas: CanvasRect {
                left: 100.0,
                top: 200.0,
                width: 800.0,
                height: 400.0,
            },
            scroll: ScrollOffset {
                left: 10.0,
                top: 50.0,
            },
            compact,
        }
    }

    const TOOLTIP: TooltipSize = TooltipSize {
        width: 300.0,
        height: 140.0,
    };

    fn visible(left_px: f64) -> TooltipPlacement {
        TooltipPlacement {
            content: "x".to_string(),
            left_px,
            top_px: 0.0,
            opacity: 1,
        }
    }

    #[test]
    fn hover_at_first_index_reports_no_fee_cost() {
        let chart = default_chart();
        let content =
            tooltip_content(&chart, 0, Locale::EnUs, &BuiltinCatalog).expect("index in range");

        assert_eq!(content.years_elapsed, 0);
        for scenario in FeeScenario::ALL {
            assert_eq!(content.fee_cost(scenario), 0.0);
        }
        assert!(content.text.contains("After 0 years"));
        assert!(content.text.contains("$0.00"));
    }

    #[test]
    fn hover_at_fifth_year_reports_fee_cost_against_fee_free_growth() {
        let chart = default_chart();
        let content =
            tooltip_content(&chart, 5, Locale::ItIt, &BuiltinCatalog).expect("index in range");

        assert_eq!(content.years_elapsed, 5);
        // 100000 * 1.07^5 = 140255.17, 1.04^5 = 121665.29, 1.03^5 = 115927.41, 1.05^5 = 127628.16
        assert_eq!(content.fee_cost(FeeScenario::BaseFee), 140_255.0 - 121_665.0);
        assert_eq!(content.fee_cost(FeeScenario::HigherFee), 140_255.0 - 115_927.0);
        assert_eq!(content.fee_cost(FeeScenario::LowerFee), 140_255.0 - 127_628.0);
        assert!(content.text.contains("€18.590,00"));
        assert!(content.text.contains("spese al 3,00%"));
    }

    #[test]
    fn placement_formulas_for_both_layouts() {
        let wide = geometry(false);
        let (left, top) = tooltip_position(wide.canvas, wide.scroll, TOOLTIP, false);
        assert_approx(left, 100.0 + 400.0 - 150.0 + 10.0);
        assert_approx(top, 200.0 + 50.0 - 140.0 + 400.0 / 5.0);

        let compact = geometry(true);
        let (left, top) = tooltip_position(compact.canvas, compact.scroll, TOOLTIP, true);
        assert_approx(left, 360.0);
        assert_approx(top, 200.0 + 50.0 + 70.0 + 20.0);
    }

    #[test]
    fn compact_breakpoint_is_inclusive() {
        assert!(is_compact(768.0));
        assert!(is_compact(375.0));
        assert!(!is_compact(769.0));
    }

    #[test]
    fn stale_index_and_empty_hover_hide_the_tooltip() {
        let chart = default_chart();
        for event in [
            HoverEvent::Move { index: Some(30) },
            HoverEvent::Move { index: None },
            HoverEvent::Leave,
        ] {
            let placement = handle_hover(
                Some(&chart),
                event,
                geometry(false),
                TOOLTIP,
                Locale::EnUs,
                &BuiltinCatalog,
            );
            assert_eq!(placement, TooltipPlacement::hidden());
        }

        let placement = handle_hover(
            None,
            HoverEvent::Move { index: Some(0) },
            geometry(false),
            TOOLTIP,
            Locale::EnUs,
            &BuiltinCatalog,
        );
        assert!(!placement.is_visible());
    }

    #[test]
    fn valid_hover_is_visible_and_positioned() {
        let chart = default_chart();
        let placement = handle_hover(
            Some(&chart),
            HoverEvent::Move { index: Some(12) },
            geometry(true),
            TOOLTIP,
            Locale::EnUs,
            &BuiltinCatalog,
        );
        assert!(placement.is_visible());
        assert_approx(placement.left_px, 360.0);
        assert_approx(placement.top_px, 340.0);
        assert!(placement.content.contains("After 12 years"));
    }

    #[test]
    fn hover_event_deserializes_from_tagged_json() {
        let event: HoverEvent =
            serde_json::from_str(r#"{"event":"move","index":4}"#).expect("valid event");
        assert_eq!(event, HoverEvent::Move { index: Some(4) });
        let event: HoverEvent = serde_json::from_str(r#"{"event":"move"}"#).expect("valid event");
        assert_eq!(event, HoverEvent::Move { index: None });
        let event: HoverEvent = serde_json::from_str(r#"{"event":"leave"}"#).expect("valid event");
        assert_eq!(event, HoverEvent::Leave);
    }

    #[tokio::test(start_paused = true)]
    async fn leave_hides_after_debounce() {
        let mut overlay = TooltipOverlay::new();
        overlay.show(visible(1.0));
        overlay.schedule_hide();
        assert!(overlay.is_visible());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(overlay.is_visible());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!overlay.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_leave_rearms_instead_of_stacking() {
        let mut overlay = TooltipOverlay::new();
        overlay.show(visible(1.0));

        overlay.schedule_hide();
        tokio::time::sleep(Duration::from_millis(30)).await;
        overlay.schedule_hide();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(overlay.is_visible());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!overlay.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn reentry_within_window_cancels_hide() {
        let mut overlay = TooltipOverlay::new();
        let mut rx = overlay.subscribe();
        overlay.show(visible(1.0));
        overlay.schedule_hide();

        tokio::time::sleep(Duration::from_millis(20)).await;
        overlay.show(visible(2.0));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(overlay.is_visible());
        assert!(rx.has_changed().expect("sender alive"));
        assert_approx(rx.borrow_and_update().left_px, 2.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_compact_and_wide_tops_differ_by_documented_offsets(
            left in -500i32..2_000,
            top in -500i32..2_000,
            width in 1u32..2_000,
            height in 1u32..2_000,
            scroll_left in 0u32..5_000,
            scroll_top in 0u32..5_000,
            tip_w in 1u32..600,
            tip_h in 1u32..600
        ) {
            let canvas = CanvasRect {
                left: left as f64,
                top: top as f64,
                width: width as f64,
                height: height as f64,
            };
            let scroll = ScrollOffset { left: scroll_left as f64, top: scroll_top as f64 };
            let tip = TooltipSize { width: tip_w as f64, height: tip_h as f64 };

            let (wide_left, wide_top) = tooltip_position(canvas, scroll, tip, false);
            let (compact_left, compact_top) = tooltip_position(canvas, scroll, tip, true);

            prop_assert!((wide_left - compact_left).abs() <= 1e-9);
            let anchor = canvas.top + scroll.top;
            prop_assert!((wide_top - (anchor - tip.height + canvas.height / 5.0)).abs() <= 1e-6);
            prop_assert!((compact_top - (anchor + tip.height / 2.0 + tip.height / 7.0)).abs() <= 1e-6);
            prop_assert!(compact_top > anchor);
        }
    }
}
