//! コマンドライン引数。環境変数由来の [`Config`] を実行単位で上書きする。
use std::{num::NonZeroU32, path::PathBuf};

use clap::Parser;
use thiserror::Error;

use crate::config::Config;
use crate::locations::{LocationsError, apply_suffix, load_csv_column};
use crate::observability::LogFormat;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no locations given: pass LOCATION arguments or --cities-csv")]
    NoLocations,
    #[error(transparent)]
    Locations(#[from] LocationsError),
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Find recycling businesses near the given locations", long_about = None)]
pub struct Cli {
    /// Locations to search, e.g. "Leeds, UK"
    #[arg(value_name = "LOCATION")]
    pub locations: Vec<String>,

    /// CSV file with one location per row
    #[arg(long, value_name = "PATH")]
    pub cities_csv: Option<PathBuf>,

    /// CSV column holding the location names
    #[arg(long, default_value = "Built-up area", requires = "cities_csv")]
    pub csv_column: String,

    /// Suffix appended to every location, e.g. ", UK"
    #[arg(long, default_value = "")]
    pub location_suffix: String,

    /// Search radius in meters, overriding the environment
    #[arg(long, value_name = "M")]
    pub radius: Option<NonZeroU32>,

    /// Search keyword, overriding the environment
    #[arg(long)]
    pub keyword: Option<String>,

    /// Skip fetching business websites
    #[arg(long)]
    pub no_website_scan: bool,

    /// Directory for the JSON export, overriding the environment
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Only log warnings and errors, and skip the console report
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// 指定されたフラグで設定を上書きする。
    #[must_use]
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(radius) = self.radius {
            config = config.with_search_radius(radius);
        }
        if let Some(keyword) = &self.keyword {
            config = config.with_search_keyword(keyword.clone());
        }
        if self.no_website_scan {
            config = config.with_website_scan(false);
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir.clone());
        }
        config
    }

    /// 位置引数とCSVの両方からロケーションを集め、接尾辞を付けて返す。
    ///
    /// # Errors
    /// CSVが読めない場合、またはロケーションが1件もない場合はエラーを返す。
    pub fn resolve_locations(&self) -> Result<Vec<String>, CliError> {
        let mut locations: Vec<String> = self
            .locations
            .iter()
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty())
            .collect();

        if let Some(path) = &self.cities_csv {
            locations.extend(load_csv_column(path, &self.csv_column)?);
        }

        if locations.is_empty() {
            return Err(CliError::NoLocations);
        }
        Ok(apply_suffix(locations, &self.location_suffix))
    }

    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet { "warn" } else { "info" }
    }
}
