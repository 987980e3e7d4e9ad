//! Command-line and environment configuration.
//!
//! # Usage
//! ```text
//! stackemu [OPTIONS] build <source> [-o <output>]
//! stackemu [OPTIONS] run <image> [--prompt <text>]
//! ```
//!
//! Environment variables supply defaults that flags override.

use crate::utils::log::{self, Level};
use stackemu_derive::Error;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

/// Default log level (`debug`, `info`, `warn` or `error`).
pub const ENV_LOG_LEVEL: &str = "STACKEMU_LOG";
/// Default prompt written before each `IN`.
pub const ENV_PROMPT: &str = "STACKEMU_PROMPT";

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Assemble `input` into an image.
    Build {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    /// Load and execute an image.
    Run { image: PathBuf },
    /// Print usage.
    Help,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: Command,
    pub log_level: Level,
    pub timestamps: bool,
    pub prompt: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command \"{name}\"")]
    UnknownCommand { name: String },
    #[error("{command} requires a file argument")]
    MissingPath { command: &'static str },
    #[error("{flag} requires an argument")]
    MissingValue { flag: String },
    #[error("unexpected argument \"{arg}\"")]
    UnexpectedArgument { arg: String },
    #[error("{flag} is only valid for {command}")]
    FlagNotAllowed { flag: String, command: &'static str },
    #[error("invalid log level \"{value}\" in {var}")]
    InvalidLogLevel { var: &'static str, value: String },
}

impl Config {
    /// Reads the process arguments and environment.
    pub fn from_env_args() -> Result<Config, ConfigError> {
        Self::parse(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parses `args` (without the program name), looking up defaults through `var`.
    pub fn parse<I, S, V>(args: I, var: V) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        V: Fn(&str) -> Option<String>,
    {
        let mut log_level = match var(ENV_LOG_LEVEL) {
            Some(value) => Level::parse(&value).ok_or(ConfigError::InvalidLogLevel {
                var: ENV_LOG_LEVEL,
                value,
            })?,
            None => Level::Info,
        };
        let mut prompt = var(ENV_PROMPT);
        let mut timestamps = true;

        let mut command_name: Option<String> = None;
        let mut path: Option<PathBuf> = None;
        let mut output: Option<PathBuf> = None;
        let mut prompt_flag = false;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => {
                    return Ok(Config {
                        command: Command::Help,
                        log_level,
                        timestamps,
                        prompt,
                    });
                }
                "-v" | "--verbose" => log_level = Level::Debug,
                "-q" | "--quiet" => log_level = Level::Error,
                "--no-timestamp" => timestamps = false,
                "-o" | "--output" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue { flag: arg.clone() })?;
                    output = Some(PathBuf::from(value));
                }
                "--prompt" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue { flag: arg.clone() })?;
                    prompt = Some(value);
                    prompt_flag = true;
                }
                other if other.starts_with('-') && other.len() > 1 => {
                    return Err(ConfigError::UnexpectedArgument { arg });
                }
                _ if command_name.is_none() => command_name = Some(arg),
                _ if path.is_none() => path = Some(PathBuf::from(arg)),
                _ => return Err(ConfigError::UnexpectedArgument { arg }),
            }
        }

        let command = match command_name.as_deref() {
            None => return Err(ConfigError::MissingCommand),
            Some("build") => {
                if prompt_flag {
                    return Err(ConfigError::FlagNotAllowed {
                        flag: "--prompt".to_string(),
                        command: "run",
                    });
                }
                Command::Build {
                    input: path.ok_or(ConfigError::MissingPath { command: "build" })?,
                    output,
                }
            }
            Some("run") => {
                if output.is_some() {
                    return Err(ConfigError::FlagNotAllowed {
                        flag: "--output".to_string(),
                        command: "build",
                    });
                }
                Command::Run {
                    image: path.ok_or(ConfigError::MissingPath { command: "run" })?,
                }
            }
            Some(name) => {
                return Err(ConfigError::UnknownCommand {
                    name: name.to_string(),
                });
            }
        };

        Ok(Config {
            command,
            log_level,
            timestamps,
            prompt,
        })
    }

    /// Applies the logging settings to the global logger.
    pub fn apply_logging(&self) {
        log::set_level(self.log_level);
        log::SHOW_TIMESTAMP.store(self.timestamps, Ordering::Relaxed);
    }
}
