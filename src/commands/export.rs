use std::path::Path;

use crate::blog::ExportFormat;
use crate::config::AppConfig;
use crate::error::{BloggerError, Result};
use crate::ui;

/// `export` 命令
///
/// ids 为空时导出全部条目（按创建时间从新到旧）。
pub async fn run(
    ids: Vec<String>,
    format: &str,
    output: Option<&Path>,
    config: &AppConfig,
) -> Result<()> {
    let format: ExportFormat = format.parse().map_err(BloggerError::InvalidInput)?;

    let storage = super::open_storage(config)?;
    let ids = if ids.is_empty() {
        storage
            .list(None, None)
            .await
            .into_iter()
            .map(|e| e.id)
            .collect()
    } else {
        ids
    };

    if ids.is_empty() {
        println!("{}", rust_i18n::t!("export.nothing"));
        return Ok(());
    }

    let rendered = storage.export(&ids, format).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            ui::success(
                &rust_i18n::t!(
                    "export.written",
                    count = ids.len(),
                    path = path.display().to_string()
                ),
                config.ui.colored,
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
