use chrono::{Duration, Utc};

use crate::config::AppConfig;
use crate::error::Result;
use crate::ui;

/// `delete` 命令
pub async fn run(id: &str, yes: bool, config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let storage = super::open_storage(config)?;

    // 先确认条目存在，报错比确认提示更早
    let doc = storage.get(id).await?;

    if !yes {
        let confirmed = ui::confirm(
            &rust_i18n::t!("delete.confirm", title = doc.meta.title.as_str()),
            false,
        )?;
        if !confirmed {
            println!("{}", rust_i18n::t!("delete.cancelled"));
            return Ok(());
        }
    }

    storage.delete(id).await?;
    ui::success(&rust_i18n::t!("delete.done", id = id), colored);
    Ok(())
}

/// `prune` 命令：删除超龄条目
pub async fn run_prune(days: Option<u32>, yes: bool, config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let days = days.unwrap_or(config.blog.prune_after_days);
    let cutoff = Utc::now() - Duration::days(days as i64);

    let storage = super::open_storage(config)?;
    let stale: Vec<_> = storage
        .list(None, None)
        .await
        .into_iter()
        .filter(|e| e.created_at < cutoff)
        .collect();

    if stale.is_empty() {
        println!("{}", rust_i18n::t!("prune.nothing", days = days));
        return Ok(());
    }

    if !yes {
        let confirmed = ui::confirm(
            &rust_i18n::t!("prune.confirm", count = stale.len(), days = days),
            false,
        )?;
        if !confirmed {
            println!("{}", rust_i18n::t!("delete.cancelled"));
            return Ok(());
        }
    }

    let deleted = storage.prune(cutoff).await?;
    ui::success(&rust_i18n::t!("prune.done", count = deleted.len()), colored);
    Ok(())
}
