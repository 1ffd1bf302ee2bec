use std::path::PathBuf;

use directories::ProjectDirs;
use time::UtcOffset;
use tracing::warn;

use crate::error::TrackerError;
use crate::store::DEFAULT_KEY;

pub const DEFAULT_CURRENCY: &str = "₹";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the transaction file lives in.
    pub data_dir: PathBuf,
    pub storage_key: String,
    /// Display symbol prefixed to every amount.
    pub currency_symbol: String,
    pub utc_offset: UtcOffset,
}

impl Config {
    /// Fills in anything not given explicitly from the platform defaults.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        currency_symbol: Option<String>,
    ) -> Result<Self, TrackerError> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        Ok(Self {
            data_dir,
            storage_key: DEFAULT_KEY.to_string(),
            currency_symbol: currency_symbol.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            utc_offset: local_offset(),
        })
    }
}

pub fn default_data_dir() -> Result<PathBuf, TrackerError> {
    let project_dir =
        ProjectDirs::from("", "", "expense-tracker").ok_or(TrackerError::DataDir)?;
    Ok(project_dir.data_dir().to_path_buf())
}

/// The local UTC offset, or UTC when it cannot be determined.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or_else(|err| {
        warn!("Unable to determine local UTC offset, using UTC: {err}");
        UtcOffset::UTC
    })
}
