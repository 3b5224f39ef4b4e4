//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_candle_adapter::JsonCandleAdapter;
use crate::adapters::svg_surface::SvgSurfaceFactory;
use crate::domain::candle::Instrument;
use crate::domain::chart::{PaneKind, PaneLayout};
use crate::domain::config_validation::{bollinger_mult_x100, validate_chart_config};
use crate::domain::controls::{ChartType, DisplayOptions, Timeframe};
use crate::domain::error::ChartError;
use crate::domain::indicator::{IndicatorKind, IndicatorParams};
use crate::domain::normalizer::{DisplayOffset, DEFAULT_UTC_OFFSET_SECONDS};
use crate::domain::session::{ChartSession, DisplayState};
use crate::ports::candle_source_port::CandleSourcePort;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "candlescope", about = "Candlestick charts with technical indicators")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the price and oscillator panes to SVG
    Render {
        #[arg(short, long)]
        config: PathBuf,
        /// Candle payload to use instead of the [data] directory
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Timeframe in minutes, overriding [chart] timeframe
        #[arg(long)]
        timeframe: Option<String>,
        /// Print the legend for the candle at this time key
        #[arg(long, allow_hyphen_values = true)]
        hover: Option<i64>,
    },
    /// Export the charted candles as CSV
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        timeframe: Option<String>,
    },
    /// Validate a chart configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Render {
            config,
            input,
            output_dir,
            timeframe,
            hover,
        } => run_render(
            &config,
            input.as_ref(),
            output_dir.as_ref(),
            timeframe.as_deref(),
            hover,
        ),
        Command::Export {
            config,
            input,
            output_dir,
            timeframe,
        } => run_export(&config, input.as_ref(), output_dir.as_ref(), timeframe.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &ChartError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_instrument(config: &dyn ConfigPort) -> Result<Option<Instrument>, ChartError> {
    let Some(raw_id) = config.get_string("instrument", "id") else {
        return Ok(None);
    };
    let id: u64 = raw_id.trim().parse().map_err(|_| ChartError::ConfigInvalid {
        section: "instrument".into(),
        key: "id".into(),
        reason: format!("'{}' is not a valid instrument id", raw_id),
    })?;
    Ok(Some(Instrument {
        id,
        company_name: config
            .get_string("instrument", "company_name")
            .unwrap_or_else(|| id.to_string()),
        exchange_code: config
            .get_string("instrument", "exchange_code")
            .unwrap_or_default(),
    }))
}

pub fn build_display_options(config: &dyn ConfigPort) -> Result<DisplayOptions, ChartError> {
    let defaults = IndicatorParams::default();
    let period = |key: &str, default: usize| config.get_int("indicators", key, default as i64) as usize;

    let timeframe = match config.get_string("chart", "timeframe") {
        Some(value) => Timeframe::parse_custom(&value)?,
        None => Timeframe::default(),
    };
    let chart_type = match config.get_string("chart", "chart_type") {
        Some(value) => value
            .parse::<ChartType>()
            .map_err(|reason| ChartError::ConfigInvalid {
                section: "chart".into(),
                key: "chart_type".into(),
                reason,
            })?,
        None => ChartType::default(),
    };

    let multiplier = config.get_double(
        "indicators",
        "bollinger_multiplier",
        defaults.bollinger_mult_x100 as f64 / 100.0,
    );
    let mult_x100 = bollinger_mult_x100(multiplier).ok_or_else(|| ChartError::ConfigInvalid {
        section: "indicators".into(),
        key: "bollinger_multiplier".into(),
        reason: format!("{} is not a positive multiple of 0.01", multiplier),
    })?;
    let params = IndicatorParams {
        ma_period: period("ma_period", defaults.ma_period),
        bollinger_period: period("bollinger_period", defaults.bollinger_period),
        bollinger_mult_x100: mult_x100,
        rsi_period: period("rsi_period", defaults.rsi_period),
        macd_fast: period("macd_fast", defaults.macd_fast),
        macd_slow: period("macd_slow", defaults.macd_slow),
        macd_signal: period("macd_signal", defaults.macd_signal),
    };

    let mut options = DisplayOptions {
        timeframe,
        chart_type,
        show_volume: config.get_bool("chart", "show_volume", true),
        params,
        ..DisplayOptions::default()
    };
    for (kind, key) in [
        (IndicatorKind::Ma, "ma"),
        (IndicatorKind::Bollinger, "bollinger"),
        (IndicatorKind::Rsi, "rsi"),
        (IndicatorKind::Macd, "macd"),
    ] {
        options.set_indicator(kind, config.get_bool("indicators", key, false));
    }
    Ok(options)
}

pub fn build_layout(config: &dyn ConfigPort) -> PaneLayout {
    let defaults = PaneLayout::default();
    PaneLayout::new(
        config.get_int("chart", "width", defaults.container_width as i64) as u32,
        config.get_int("chart", "viewport_height", defaults.viewport_height as i64) as u32,
    )
}

pub fn build_offset(config: &dyn ConfigPort) -> Result<DisplayOffset, ChartError> {
    let seconds = config.get_int(
        "chart",
        "utc_offset_seconds",
        DEFAULT_UTC_OFFSET_SECONDS as i64,
    );
    i32::try_from(seconds)
        .ok()
        .and_then(DisplayOffset::from_seconds)
        .ok_or_else(|| ChartError::ConfigInvalid {
            section: "chart".into(),
            key: "utc_offset_seconds".into(),
            reason: format!("{} is not a valid UTC offset", seconds),
        })
}

fn build_source(
    config: &dyn ConfigPort,
    input: Option<&PathBuf>,
) -> Result<JsonCandleAdapter, ChartError> {
    if let Some(path) = input {
        return Ok(JsonCandleAdapter::from_file(path.clone()));
    }
    config
        .get_string("data", "dir")
        .map(|dir| JsonCandleAdapter::from_dir(PathBuf::from(dir)))
        .ok_or_else(|| ChartError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })
}

/// Config → session → fetch → normalized, charted data.
fn open_session(
    config_path: &PathBuf,
    input: Option<&PathBuf>,
    timeframe: Option<&str>,
) -> Result<ChartSession, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_chart_config(&adapter).map_err(|e| fail(&e))?;

    let options = build_display_options(&adapter).map_err(|e| fail(&e))?;
    let instrument = build_instrument(&adapter).map_err(|e| fail(&e))?;
    let offset = build_offset(&adapter).map_err(|e| fail(&e))?;
    let layout = build_layout(&adapter);

    let mut session = ChartSession::new(
        instrument,
        options,
        offset,
        Box::new(SvgSurfaceFactory),
        layout,
    );
    let ticket = match timeframe {
        Some(tf) => session.select_custom_timeframe(tf),
        None => session.refresh(),
    }
    .map_err(|e| fail(&e))?;

    let Some(instrument) = session.instrument().cloned() else {
        return Err(fail(&ChartError::NoInstrument));
    };
    let source = build_source(&adapter, input).map_err(|e| fail(&e))?;
    eprintln!(
        "Fetching {} ({}) at {} minutes",
        instrument.company_name,
        instrument.id,
        ticket.timeframe()
    );
    match source.fetch_candles(&instrument, ticket.timeframe()) {
        Ok(payload) => {
            session.resolve_fetch(ticket, Ok(payload));
        }
        Err(e) => {
            let code = fail(&e);
            session.resolve_fetch(ticket, Err(e));
            return Err(code);
        }
    }

    eprintln!(
        "Loaded {} candles ({} rejected)",
        session.candles().len(),
        session.rejected().len()
    );
    for row in session.rejected() {
        eprintln!("  row {}: {} ({:?})", row.index, row.reason, row.date);
    }
    Ok(session)
}

fn output_dir(dir: Option<&PathBuf>) -> Result<PathBuf, ChartError> {
    let dir = dir.cloned().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn pane_file_name(kind: PaneKind) -> &'static str {
    match kind {
        PaneKind::Main => "main.svg",
        PaneKind::Oscillator => "oscillator.svg",
    }
}

fn write_panes(session: &ChartSession, dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    let mut written = Vec::new();
    for (kind, svg) in session.controller().encode_panes() {
        let path = dir.join(pane_file_name(kind));
        fs::write(&path, svg)?;
        written.push(path);
    }
    Ok(written)
}

fn run_render(
    config_path: &PathBuf,
    input: Option<&PathBuf>,
    output: Option<&PathBuf>,
    timeframe: Option<&str>,
    hover: Option<i64>,
) -> ExitCode {
    let session = match open_session(config_path, input, timeframe) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if session.state() == &DisplayState::Empty {
        eprintln!("No candles to chart; no panes rendered");
        return ExitCode::SUCCESS;
    }

    let dir = match output_dir(output) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let written = match write_panes(&session, &dir) {
        Ok(w) => w,
        Err(e) => return fail(&e),
    };
    for path in &written {
        println!("{}", path.display());
    }

    if let Some(legend) = session.hover(hover) {
        println!("{legend}");
    }
    for state in session.controller().indicator_states().iter().filter(|s| s.active) {
        eprintln!(
            "  {}: {} points",
            state.data.indicator_type,
            state.data.len()
        );
    }
    session.unmount();
    ExitCode::SUCCESS
}

fn write_export(session: &ChartSession, output: Option<&PathBuf>) -> Result<PathBuf, ChartError> {
    let dir = output_dir(output)?;
    let filename = session.export_filename().ok_or(ChartError::NoInstrument)?;
    let path = dir.join(filename);
    let mut file = fs::File::create(&path)?;
    session.export_csv(&CsvExportAdapter, &mut file)?;
    Ok(path)
}

fn run_export(
    config_path: &PathBuf,
    input: Option<&PathBuf>,
    output: Option<&PathBuf>,
    timeframe: Option<&str>,
) -> ExitCode {
    let session = match open_session(config_path, input, timeframe) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match write_export(&session, output) {
        Ok(path) => {
            eprintln!("Exported {} rows", session.candles().len());
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn timeframe_summary(timeframe: Timeframe) -> String {
    let presets: Vec<String> = Timeframe::presets().map(|t| t.to_string()).collect();
    let kind = if timeframe.is_preset() { "preset" } else { "custom" };
    format!("{} ({}; presets {})", timeframe, kind, presets.join(", "))
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_chart_config(&adapter) {
        return fail(&e);
    }
    let options = match build_display_options(&adapter) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };
    let instrument = match build_instrument(&adapter) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };

    match &instrument {
        Some(i) => println!("Instrument:  {} | {} (id {})", i.company_name, i.exchange_code, i.id),
        None => println!("Instrument:  none"),
    }
    println!("Timeframe:   {}", timeframe_summary(options.timeframe));
    println!("Chart type:  {}", options.chart_type);
    println!("Volume:      {}", if options.show_volume { "shown" } else { "hidden" });
    for kind in IndicatorKind::ALL {
        let status = if options.is_active(kind) { "on" } else { "off" };
        println!("{:<12} {} {}", format!("{}:", kind), status, options.params.indicator_type(kind));
    }
    eprintln!("Configuration OK");
    ExitCode::SUCCESS
}
