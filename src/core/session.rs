use std::sync::Arc;

use tracing::{error, info};

use super::engine::{FeeChart, build_chart};
use super::locale::{Locale, MessageCatalog};
use super::tooltip::{HoverEvent, TooltipOverlay, handle_hover, is_compact};
use super::types::{
    CanvasRect, FeeDragError, InvestmentConfig, ScrollOffset, TooltipPlacement, TooltipSize,
    ViewportGeometry,
};

pub trait RenderTarget {
    fn id(&self) -> &str;
    fn canvas_rect(&self) -> Option<CanvasRect>;
    // Replaces any previous rendering context wholesale.
    fn replace_chart(&mut self, chart: Arc<FeeChart>);
    fn resize(&mut self);
}

pub trait ViewportSource {
    fn scroll_offset(&self) -> ScrollOffset;
    fn viewport_width(&self) -> f64;
}

pub struct ChartSession<T, V> {
    target: T,
    viewport: V,
    catalog: Arc<dyn MessageCatalog>,
    locale: Locale,
    chart: Option<Arc<FeeChart>>,
    compact: bool,
    overlay: TooltipOverlay,
}

impl<T: RenderTarget, V: ViewportSource> ChartSession<T, V> {
    pub fn new(target: T, viewport: V, catalog: Arc<dyn MessageCatalog>, locale: Locale) -> Self {
        let compact = is_compact(viewport.viewport_width());
        Self {
            target,
            viewport,
            catalog,
            locale,
            chart: None,
            compact,
            overlay: TooltipOverlay::new(),
        }
    }

    pub fn chart(&self) -> Option<Arc<FeeChart>> {
        self.chart.clone()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn overlay(&self) -> &TooltipOverlay {
        &self.overlay
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn recalculate(&mut self, config: &InvestmentConfig) -> Result<Arc<FeeChart>, FeeDragError> {
        config.validate()?;
        let chart = Arc::new(build_chart(config)?);

        if self.target.canvas_rect().is_none() {
            self.chart = None;
            self.overlay.hide_now();
            error!(target_id = self.target.id(), "render target missing, chart not drawn");
            return Err(FeeDragError::RenderTargetMissing(self.target.id().to_string()));
        }

        self.chart = Some(Arc::clone(&chart));
        self.target.replace_chart(Arc::clone(&chart));
        info!(
            years = config.horizon_years,
            base_fee = chart.fees.base_pct,
            lower_fee = chart.fees.lower_pct,
            higher_fee = chart.fees.higher_pct,
            "chart recalculated"
        );
        Ok(chart)
    }

    pub fn placement(&self, event: HoverEvent, tooltip: TooltipSize) -> TooltipPlacement {
        let Some(canvas) = self.target.canvas_rect() else {
            return TooltipPlacement::hidden();
        };
        let geometry = ViewportGeometry {
            canvas,
            scroll: self.viewport.scroll_offset(),
            compact: self.compact,
        };
        handle_hover(
            self.chart.as_deref(),
            event,
            geometry,
            tooltip,
            self.locale,
            self.catalog.as_ref(),
        )
    }

    // Leave events arm the debounced hide, so this needs a tokio runtime.
    pub fn pointer(&mut self, event: HoverEvent, tooltip: TooltipSize) -> TooltipPlacement {
        if event == HoverEvent::Leave {
            self.overlay.schedule_hide();
            return self.overlay.current();
        }
        let placement = self.placement(event, tooltip);
        if placement.is_visible() {
            self.overlay.show(placement.clone());
        } else {
            self.overlay.hide_now();
        }
        placement
    }

    pub fn resize(&mut self, viewport_width: f64) {
        self.compact = is_compact(viewport_width);
        self.target.resize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::locale::BuiltinCatalog;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeCanvas {
        rect: Option<CanvasRect>,
        drawn: Vec<Arc<FeeChart>>,
        resizes: u32,
    }

    impl RenderTarget for FakeCanvas {
        fn id(&self) -> &str {
            "investmentChart"
        }

        fn canvas_rect(&self) -> Option<CanvasRect> {
            self.rect
        }

        fn replace_chart(&mut self, chart: Arc<FeeChart>) {
            self.drawn.push(chart);
        }

        fn resize(&mut self) {
            self.resizes += 1;
        }
    }

    struct FixedViewport {
        width: f64,
    }

    impl ViewportSource for FixedViewport {
        fn scroll_offset(&self) -> ScrollOffset {
            ScrollOffset {
                left: 0.0,
                top: 100.0,
            }
        }

        fn viewport_width(&self) -> f64 {
            self.width
        }
    }

    const TOOLTIP: TooltipSize = TooltipSize {
        width: 200.0,
        height: 100.0,
    };

    fn canvas() -> FakeCanvas {
        FakeCanvas {
            rect: Some(CanvasRect {
                left: 0.0,
                top: 50.0,
                width: 1000.0,
                height: 500.0,
            }),
            ..FakeCanvas::default()
        }
    }

    fn session(target: FakeCanvas, width: f64) -> ChartSession<FakeCanvas, FixedViewport> {
        ChartSession::new(
            target,
            FixedViewport { width },
            Arc::new(BuiltinCatalog),
            Locale::EnUs,
        )
    }

    fn config(years: u32) -> InvestmentConfig {
        InvestmentConfig {
            starting_capital: 100_000.0,
            gross_annual_return_pct: 7.0,
            horizon_years: years,
            base_fee_pct: 3.0,
            start_year: 2026,
        }
    }

    #[test]
    fn recalculation_replaces_chart_atomically() {
        let mut session = session(canvas(), 1280.0);
        let first = session.recalculate(&config(30)).expect("drawn");
        let second = session.recalculate(&config(10)).expect("drawn");

        assert_eq!(first.len(), 30);
        assert_eq!(second.len(), 10);
        assert_eq!(session.chart().map(|c| c.len()), Some(10));
        assert_eq!(session.target().drawn.len(), 2);
        assert!(Arc::ptr_eq(&session.target().drawn[1], &second));
    }

    #[test]
    fn missing_render_target_is_reported_and_clears_chart() {
        let mut session = session(canvas(), 1280.0);
        session.recalculate(&config(30)).expect("drawn");
        session.target.rect = None;

        let err = session.recalculate(&config(20)).expect_err("no surface");
        assert_eq!(
            err,
            FeeDragError::RenderTargetMissing("investmentChart".to_string())
        );
        assert!(session.chart().is_none());
    }

    #[test]
    fn invalid_config_is_surfaced_before_drawing() {
        let mut session = session(canvas(), 1280.0);
        let err = session.recalculate(&config(0)).expect_err("zero horizon");
        assert!(matches!(err, FeeDragError::InvalidConfig(_)));
        assert!(session.target().drawn.is_empty());
    }

    #[test]
    fn overflowing_projection_keeps_previous_chart() {
        let mut session = session(canvas(), 1280.0);
        let drawn = session.recalculate(&config(30)).expect("drawn");

        let huge = InvestmentConfig {
            starting_capital: 1e308,
            ..config(30)
        };
        let err = session.recalculate(&huge).expect_err("projection overflows");
        assert!(matches!(err, FeeDragError::InvalidConfig(_)));
        assert_eq!(session.target().drawn.len(), 1);
        assert!(Arc::ptr_eq(&session.chart().expect("chart"), &drawn));
    }

    #[test]
    fn resize_updates_layout_without_touching_series() {
        let mut session = session(canvas(), 1280.0);
        let chart = session.recalculate(&config(30)).expect("drawn");
        assert!(!session.is_compact());

        let wide = session.placement(HoverEvent::Move { index: Some(3) }, TOOLTIP);
        session.resize(600.0);
        let compact = session.placement(HoverEvent::Move { index: Some(3) }, TOOLTIP);

        assert!(session.is_compact());
        assert_eq!(session.target().resizes, 1);
        assert!(Arc::ptr_eq(&session.chart().expect("chart"), &chart));
        assert_eq!(wide.left_px, compact.left_px);
        assert_eq!(wide.top_px, 50.0 + 100.0 - 100.0 + 100.0);
        assert_eq!(compact.top_px, 50.0 + 100.0 + 50.0 + 100.0 / 7.0);
    }

    #[test]
    fn stale_index_after_shrinking_horizon_hides_tooltip() {
        let mut session = session(canvas(), 1280.0);
        session.recalculate(&config(30)).expect("drawn");
        session.recalculate(&config(5)).expect("drawn");

        let placement = session.placement(HoverEvent::Move { index: Some(20) }, TOOLTIP);
        assert!(!placement.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_drives_overlay_with_debounced_leave() {
        let mut session = session(canvas(), 1280.0);
        session.recalculate(&config(30)).expect("drawn");

        let shown = session.pointer(HoverEvent::Move { index: Some(10) }, TOOLTIP);
        assert!(shown.is_visible());
        assert_eq!(session.overlay().current(), shown);

        session.pointer(HoverEvent::Leave, TOOLTIP);
        assert!(session.overlay().is_visible());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!session.overlay().is_visible());
    }
}
