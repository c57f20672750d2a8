//! Command implementations.
//!
//! Contains implementations of all devblogger CLI commands.
//!
//! # Modules
//! - `generate` - Article generation and regeneration flow.
//! - `list` - Listing, searching and showing stored entries.
//! - `export` - Exporting entries to JSON or combined markdown.
//! - `delete` - Entry deletion and age-based pruning.
//! - `edit` - Editing an entry in the system editor.
//! - `maintain` - Index validation, repair and statistics.
//! - `provider` - Provider connectivity tests and model listing.
//! - `config` - Configuration management.
//! - `init` - Configuration initialization.

pub mod config;
pub mod delete;
pub mod edit;
pub mod export;
pub mod generate;
pub mod init;
pub mod list;
pub mod maintain;
pub mod provider;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::blog::{BlogGenerator, BlogStorage};
use crate::config::AppConfig;
use crate::error::{BloggerError, Result};
use crate::llm::ProviderManager;

/// Opens the storage engine at the configured entries directory.
pub fn open_storage(config: &AppConfig) -> Result<Arc<BlogStorage>> {
    let dir = config.storage.resolve_entries_dir()?;
    Ok(Arc::new(BlogStorage::open(dir)?))
}

/// Builds the full generation stack (manager + storage + generator).
pub fn build_generator(config: &AppConfig) -> Result<(Arc<BlogStorage>, BlogGenerator)> {
    let manager = Arc::new(ProviderManager::from_config(config)?);
    let storage = open_storage(config)?;
    let generator = BlogGenerator::new(
        manager,
        storage.clone(),
        config.blog.default_prompt.clone(),
    );
    Ok((storage, generator))
}

/// Parses a `--since`/`--until` style date argument.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates; a bare date
/// means start of day for lower bounds and end of day for upper bounds.
pub(crate) fn parse_date_bound(input: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        BloggerError::InvalidInput(format!(
            "Cannot parse date '{}' (expected RFC 3339 or YYYY-MM-DD)",
            input
        ))
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
    } else {
        NaiveTime::MIN
    };
    Ok(DateTime::from_naive_utc_and_offset(date.and_time(time), Utc))
}
