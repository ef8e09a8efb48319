//! Stackertui: stacker-style block alignment arcade game in the terminal.

mod app;
mod assets;
mod game;
mod input;
mod motion;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use assets::OverlayArt;
use clap::{Parser, ValueEnum};
use motion::SpeedSetting;
use std::path::Path;
use thiserror::Error;

/// Accepted `--frame-rate` range, in frames per second.
pub const MIN_FRAME_RATE: f64 = 1.0;
pub const MAX_FRAME_RATE: f64 = 1000.0;

/// Options derived from CLI that shape a session (field size, speed, pacing).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub cols: u16,
    pub rows: u16,
    pub base_span: u16,
    pub speed: SpeedSetting,
    pub frame_rate: f64,
    pub no_animation: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cols: 7,
            rows: 16,
            base_span: 3,
            speed: SpeedSetting::default(),
            frame_rate: 60.0,
            no_animation: false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("field needs at least one column")]
    NoColumns,
    #[error("field needs at least 2 rows, got {0}")]
    TooFewRows(u16),
    #[error("base span must be between 1 and {cols}, got {span}")]
    BaseSpan { span: u16, cols: u16 },
    #[error("frame rate must be between 1 and 1000, got {0}")]
    FrameRate(f64),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            cols: args.cols,
            rows: args.rows,
            base_span: args.base_span,
            speed: args.speed,
            frame_rate: args.frame_rate,
            no_animation: args.no_animation,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols == 0 {
            return Err(ConfigError::NoColumns);
        }
        if self.rows < 2 {
            return Err(ConfigError::TooFewRows(self.rows));
        }
        if self.base_span == 0 || self.base_span > self.cols {
            return Err(ConfigError::BaseSpan {
                span: self.base_span,
                cols: self.cols,
            });
        }
        if !(MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&self.frame_rate) {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.log_level)?;

    let theme = theme::Theme::load_or_default(args.theme.as_deref(), args.palette);
    let art = OverlayArt::load(args.win_art.as_deref(), args.lose_art.as_deref());
    let config = GameConfig::from_args(&args);

    let mut app = App::new(config, theme, art)?;
    app.run()?;
    Ok(())
}

/// Route `tracing` events to a file; the terminal belongs to the game. No file, no subscriber.
fn init_logging(path: Option<&Path>, level: LogLevel) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(tracing::Level::from(level))
        .init();
    Ok(())
}

/// Stacker-style arcade game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stackertui",
    version,
    about = "Stacker-style arcade game in the terminal. Drop the sliding block onto the stack; overhangs are trimmed.",
    long_about = "Stackertui is a terminal take on the arcade stacker.\n\n\
        A block sweeps left and right above the stack. Drop it: whatever hangs over the block \
        below is cut off, and the next block is only as wide as what survived. Miss completely \
        and the game is over; reach the top row and you win. Each drop speeds the sweep up a little.\n\n\
        CONTROLS:\n  Space/Enter/Click  Drop (restart after game over)\n  +/Up/k             Faster\n  -/Down/j           Slower\n  Q / Esc            Quit"
)]
pub struct Args {
    /// Field width in grid columns.
    #[arg(long, default_value = "7", value_name = "COLS", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub cols: u16,

    /// Field height in grid rows.
    #[arg(long, default_value = "16", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(2..=200))]
    pub rows: u16,

    /// Width of the base block (and the first sliding block).
    #[arg(long, default_value = "3", value_name = "N")]
    pub base_span: u16,

    /// Speed control, 1 (slow) to 10 (fast). Out-of-range values clamp; junk falls back to 5.5.
    #[arg(short, long, default_value = "5.5", value_name = "VALUE", value_parser = motion::parse_speed_setting)]
    pub speed: SpeedSetting,

    /// Frames (and motion ticks) per second, 1 to 1000.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Classic red-on-black if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Text file shown above the win message.
    #[arg(long, value_name = "FILE")]
    pub win_art: Option<std::path::PathBuf>,

    /// Text file shown above the game-over message.
    #[arg(long, value_name = "FILE")]
    pub lose_art: Option<std::path::PathBuf>,

    /// Disable the overlay fade-in.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (nothing is logged otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Maximum log level written to --log-file.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
