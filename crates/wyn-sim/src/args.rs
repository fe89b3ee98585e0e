//! Command-line flags.

use std::path::PathBuf;

use thiserror::Error;

/// Usage text printed for `--help`.
pub const USAGE: &str = "\
Usage: wyn-sim [OPTIONS]

Options:
  --config <FILE>       Platformer tuning (RON)
  --stats <FILE>        Character stats (RON)
  --diagnostics <FILE>  Diagnostics settings (RON)
  --script <FILE>       Input script (RON)
  --frames <N>          Frames to simulate [default: 120]
  --delta-ms <MS>       Frame time in milliseconds [default: 16.67]
  --floor-y <Y>         Floor height [default: 200]
  -h, --help            Print this help";

/// Errors from parsing the command line.
#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    /// A flag that takes a value was last on the line
    #[error("missing value for {0}")]
    MissingValue(String),

    /// A value failed to parse
    #[error("invalid value `{value}` for {flag}")]
    InvalidValue {
        /// Flag
        flag: String,
        /// Offending value
        value: String,
    },

    /// Unrecognised flag
    #[error("unknown argument `{0}`")]
    Unknown(String),
}

/// Parsed options.
#[derive(Debug, Clone, PartialEq)]
pub struct SimArgs {
    /// Platformer tuning file
    pub config: Option<PathBuf>,
    /// Character stats file
    pub stats: Option<PathBuf>,
    /// Diagnostics settings file
    pub diagnostics: Option<PathBuf>,
    /// Input script file
    pub script: Option<PathBuf>,
    /// Frames to simulate
    pub frames: u64,
    /// Frame time (ms)
    pub delta_ms: f64,
    /// Floor height
    pub floor_y: f32,
    /// Print usage and exit
    pub help: bool,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            config: None,
            stats: None,
            diagnostics: None,
            script: None,
            frames: 120,
            delta_ms: 16.67,
            floor_y: 200.0,
            help: false,
        }
    }
}

impl SimArgs {
    /// Parse flags, not including the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--config" => parsed.config = Some(value(&flag, args.next())?.into()),
                "--stats" => parsed.stats = Some(value(&flag, args.next())?.into()),
                "--diagnostics" => parsed.diagnostics = Some(value(&flag, args.next())?.into()),
                "--script" => parsed.script = Some(value(&flag, args.next())?.into()),
                "--frames" => parsed.frames = number(&flag, args.next())?,
                "--delta-ms" => parsed.delta_ms = number(&flag, args.next())?,
                "--floor-y" => parsed.floor_y = number(&flag, args.next())?,
                other => return Err(ArgsError::Unknown(other.to_string())),
            }
        }

        Ok(parsed)
    }
}

fn value(flag: &str, next: Option<String>) -> Result<String, ArgsError> {
    next.ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
}

fn number<T: std::str::FromStr>(flag: &str, next: Option<String>) -> Result<T, ArgsError> {
    let raw = value(flag, next)?;
    raw.parse().map_err(|_| ArgsError::InvalidValue {
        flag: flag.to_string(),
        value: raw,
    })
}
