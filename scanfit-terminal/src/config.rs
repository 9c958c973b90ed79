/// Command-line configuration for the terminal viewer
use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str = "usage: scanfit-terminal [PATH] [--log FILE]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("unknown flag {0}")]
    UnknownFlag(String),

    #[error("unexpected argument {0}")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Binary STL to open; the built-in cube is shown when absent
    pub mesh_path: Option<PathBuf>,
    /// Log destination; logging is off when absent
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Parse arguments, excluding the program name
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--log" => {
                    let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.log_file = Some(PathBuf::from(value));
                }
                flag if flag.starts_with("--") => return Err(ConfigError::UnknownFlag(arg)),
                _ if config.mesh_path.is_none() => config.mesh_path = Some(PathBuf::from(arg)),
                _ => return Err(ConfigError::UnexpectedArgument(arg)),
            }
        }

        Ok(config)
    }
}
