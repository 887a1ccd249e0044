use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Datelike;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    BuiltinCatalog, CanvasRect, DisplayRates, FeeChart, FeeScenario, FeeScenarioSet,
    GrowthSeries, HoverEvent, InvestmentConfig, Locale, MAX_HORIZON_YEARS, MessageCatalog,
    ScenarioSummary, ScrollOffset, SeriesStyle, TooltipPlacement, TooltipSize, ViewportGeometry,
    build_chart, format_decimal, format_years, handle_hover, is_compact, keys, series_style,
    years_to_double,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLocale {
    #[value(name = "en-US", alias = "en")]
    EnUs,
    #[value(name = "it-IT", alias = "it")]
    ItIt,
}

impl From<CliLocale> for Locale {
    fn from(value: CliLocale) -> Self {
        match value {
            CliLocale::EnUs => Locale::EnUs,
            CliLocale::ItIt => Locale::ItIt,
        }
    }
}

impl From<Locale> for CliLocale {
    fn from(value: Locale) -> Self {
        match value {
            Locale::EnUs => CliLocale::EnUs,
            Locale::ItIt => CliLocale::ItIt,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    starting_capital: Option<f64>,
    annual_return: Option<f64>,
    years: Option<u32>,
    annual_fee: Option<f64>,
    locale: Option<Locale>,
    start_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TooltipPayload {
    #[serde(flatten)]
    config: ProjectPayload,
    hover: HoverEvent,
    canvas: CanvasRect,
    #[serde(default)]
    scroll: ScrollOffset,
    tooltip: TooltipSize,
    viewport_width: f64,
}

#[derive(Parser, Debug)]
#[command(
    name = "feedrag",
    about = "Shows how recurring management fees erode compounded investment returns"
)]
struct Cli {
    #[arg(long, default_value_t = 100000.0, help = "Capital invested today")]
    starting_capital: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected gross annual return in percent, e.g. 7"
    )]
    annual_return: f64,
    #[arg(long, default_value_t = 30, help = "Number of years to project")]
    years: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual management fee in percent; lower and higher scenarios sit one point either side"
    )]
    annual_fee: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliLocale::EnUs,
        help = "Output locale for labels and number formatting"
    )]
    locale: CliLocale,
    #[arg(long, help = "First projected year, defaults to the current year")]
    start_year: Option<i32>,
}

#[derive(Debug)]
struct ApiRequest {
    config: InvestmentConfig,
    locale: Locale,
    chart: FeeChart,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResponse {
    key: &'static str,
    label: String,
    style: SeriesStyle,
    points: GrowthSeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    locale: Locale,
    currency_symbol: &'static str,
    start_year: i32,
    fee_rates: FeeScenarioSet,
    display_rates: DisplayRates,
    years_to_double: Option<String>,
    years_to_double_message: Option<String>,
    series: Vec<SeriesResponse>,
    reference: GrowthSeries,
    summary: Vec<ScenarioSummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn build_inputs(cli: Cli) -> Result<ApiRequest, String> {
    if !cli.starting_capital.is_finite() || cli.starting_capital <= 0.0 {
        return Err("--starting-capital must be > 0".to_string());
    }

    if cli.years == 0 || cli.years > MAX_HORIZON_YEARS {
        return Err(format!("--years must be between 1 and {MAX_HORIZON_YEARS}"));
    }

    if !cli.annual_return.is_finite() || cli.annual_return <= -100.0 {
        return Err("--annual-return must be > -100".to_string());
    }

    if !(0.0..=100.0).contains(&cli.annual_fee) {
        return Err("--annual-fee must be between 0 and 100".to_string());
    }

    let config = InvestmentConfig::new(
        cli.starting_capital,
        cli.annual_return,
        cli.years,
        cli.annual_fee,
        cli.start_year.unwrap_or_else(current_year),
    )
    .map_err(|e| e.to_string())?;
    let chart = build_chart(&config).map_err(|e| e.to_string())?;

    Ok(ApiRequest {
        config,
        locale: cli.locale.into(),
        chart,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        starting_capital: 100_000.0,
        annual_return: 7.0,
        years: 30,
        annual_fee: 3.0,
        locale: CliLocale::EnUs,
        start_year: None,
    }
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.starting_capital {
        cli.starting_capital = v;
    }
    if let Some(v) = payload.annual_return {
        cli.annual_return = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.annual_fee {
        cli.annual_fee = v;
    }
    if let Some(v) = payload.locale {
        cli.locale = v.into();
    }
    if let Some(v) = payload.start_year {
        cli.start_year = Some(v);
    }

    build_inputs(cli)
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn scenario_label(
    catalog: &dyn MessageCatalog,
    locale: Locale,
    scenario: FeeScenario,
    fees: &FeeScenarioSet,
) -> String {
    match scenario {
        FeeScenario::HigherFee => catalog.message(locale, keys::CAPITAL_WITH_HIGHER_FEES, &[]),
        FeeScenario::BaseFee => catalog.message(
            locale,
            keys::CAPITAL_WITH_BASE_FEES,
            &[("baseFeeRate", fees.base_pct.to_string())],
        ),
        FeeScenario::LowerFee => catalog.message(locale, keys::CAPITAL_WITH_LOWER_FEES, &[]),
    }
}

fn build_project_response(request: &ApiRequest, catalog: &dyn MessageCatalog) -> ProjectResponse {
    let locale = request.locale;
    let chart = &request.chart;
    let years_to_double = match years_to_double(
        request.config.gross_annual_return_pct,
        request.config.base_fee_pct,
    ) {
        Ok(years) => Some(format_years(years)),
        Err(e) => {
            warn!(error = %e, "break-even horizon not reported");
            None
        }
    };
    let years_to_double_message = years_to_double
        .as_ref()
        .map(|years| catalog.message(locale, keys::YEARS_TO_DOUBLE, &[("years", years.clone())]));

    let series = FeeScenario::ALL
        .iter()
        .map(|&scenario| SeriesResponse {
            key: scenario.key(),
            label: scenario_label(catalog, locale, scenario, &chart.fees),
            style: series_style(scenario),
            points: chart.series(scenario).clone(),
        })
        .collect();

    ProjectResponse {
        locale,
        currency_symbol: locale.currency_symbol(),
        start_year: request.config.start_year,
        fee_rates: chart.fees,
        display_rates: chart.fees.display_rates(),
        years_to_double,
        years_to_double_message,
        series,
        reference: chart.reference.clone(),
        summary: chart.summary(),
    }
}

fn build_tooltip_placement(payload: TooltipPayload) -> Result<TooltipPlacement, String> {
    let request = api_request_from_payload(payload.config)?;
    if payload.tooltip.width < 0.0 || payload.tooltip.height < 0.0 {
        return Err("tooltip size must be >= 0".to_string());
    }
    let geometry = ViewportGeometry {
        canvas: payload.canvas,
        scroll: payload.scroll,
        compact: is_compact(payload.viewport_width),
    };
    Ok(handle_hover(
        Some(&request.chart),
        payload.hover,
        geometry,
        payload.tooltip,
        request.locale,
        &BuiltinCatalog,
    ))
}

pub fn run_cli<I, T>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let request = build_inputs(cli).map_err(CliError::Invalid)?;
    Ok(render_report(&request, &BuiltinCatalog))
}

fn render_report(request: &ApiRequest, catalog: &dyn MessageCatalog) -> String {
    let locale = request.locale;
    let chart = &request.chart;
    let currency = locale.currency_symbol();
    let money = |v: f64| format!("{currency}{}", format_decimal(v, locale));
    let mut out = String::new();

    out.push_str(&format!(
        "{:>6} {:>18} {:>18} {:>18}\n",
        "Year",
        format!("{}%", format_decimal(chart.fees.higher_pct, locale)),
        format!("{}%", format_decimal(chart.fees.base_pct, locale)),
        format!("{}%", format_decimal(chart.fees.lower_pct, locale)),
    ));
    let last = chart.len().saturating_sub(1);
    for (i, point) in chart.base_fee.points().iter().enumerate() {
        if i % 5 != 0 && i != last {
            continue;
        }
        let value = |scenario| {
            chart
                .series(scenario)
                .get(i)
                .map(|p| p.ending_capital)
                .unwrap_or_default()
        };
        out.push_str(&format!(
            "{:>6} {:>18} {:>18} {:>18}\n",
            point.label,
            money(value(FeeScenario::HigherFee)),
            money(value(FeeScenario::BaseFee)),
            money(value(FeeScenario::LowerFee)),
        ));
    }

    out.push('\n');
    for summary in chart.summary() {
        out.push_str(&format!(
            "{}: {} ({} lost to fees)\n",
            scenario_label(catalog, locale, summary.scenario, &chart.fees),
            money(summary.final_capital),
            money(summary.lost_to_fees),
        ));
    }

    match years_to_double(
        request.config.gross_annual_return_pct,
        request.config.base_fee_pct,
    ) {
        Ok(years) => {
            out.push('\n');
            out.push_str(&catalog.message(
                locale,
                keys::YEARS_TO_DOUBLE,
                &[("years", format_years(years))],
            ));
            out.push('\n');
        }
        Err(e) => out.push_str(&format!("\n{e}\n")),
    }
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/tooltip", post(tooltip_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "fee drag HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    info!(
        years = request.config.horizon_years,
        base_fee = request.config.base_fee_pct,
        locale = %request.locale,
        "projection served"
    );
    json_response(
        StatusCode::OK,
        build_project_response(&request, &BuiltinCatalog),
    )
}

async fn tooltip_handler(Json(payload): Json<TooltipPayload>) -> Response {
    match build_tooltip_placement(payload) {
        Ok(placement) => json_response(StatusCode::OK, placement),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
