use crate::config::AppConfig;
use crate::error::Result;
use crate::ui;

/// `validate` 命令：只读一致性检查
pub async fn run_validate(config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let storage = super::open_storage(config)?;
    let report = storage.validate().await?;

    if report.is_clean() {
        ui::success(&rust_i18n::t!("validate.clean"), colored);
        return Ok(());
    }

    ui::warning(
        &rust_i18n::t!("validate.issues", count = report.total_issues()),
        colored,
    );
    for id in &report.orphan_index_entries {
        println!("{}", rust_i18n::t!("validate.orphan_entry", id = id));
    }
    for path in &report.orphan_files {
        println!("{}", rust_i18n::t!("validate.orphan_file", path = path));
    }
    for id in &report.hash_mismatches {
        println!("{}", rust_i18n::t!("validate.hash_mismatch", id = id));
    }
    println!();
    println!("{}", rust_i18n::t!("validate.run_repair"));
    Ok(())
}

/// `repair` 命令：修复索引/文件漂移
pub async fn run_repair(config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let storage = super::open_storage(config)?;
    let report = storage.repair().await?;

    for id in &report.removed_index_entries {
        println!("{}", rust_i18n::t!("repair.removed_entry", id = id));
    }
    for path in &report.reindexed_files {
        println!("{}", rust_i18n::t!("repair.reindexed", path = path));
    }
    for id in &report.flagged_hash_mismatches {
        // hash 不一致不自动决定哪边为准，只标记
        ui::warning(&rust_i18n::t!("repair.hash_flagged", id = id), colored);
    }
    for err in &report.errors {
        ui::warning(err, colored);
    }

    ui::success(&rust_i18n::t!("repair.done"), colored);
    Ok(())
}

/// `stats` 命令
pub async fn run_stats(json: bool, config: &AppConfig) -> Result<()> {
    let storage = super::open_storage(config)?;
    let stats = storage.stats().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{}",
        rust_i18n::t!("stats.total", count = stats.total_entries)
    );
    println!(
        "{}",
        rust_i18n::t!(
            "stats.size",
            kb = format!("{:.1}", stats.total_size_bytes as f64 / 1024.0)
        )
    );
    println!("{}", rust_i18n::t!("stats.path", path = stats.storage_path));

    if !stats.repositories.is_empty() {
        println!();
        println!("{}", rust_i18n::t!("stats.by_repository"));
        for (repo, count) in &stats.repositories {
            println!("  {} ({})", repo, count);
        }
    }
    if !stats.providers.is_empty() {
        println!();
        println!("{}", rust_i18n::t!("stats.by_provider"));
        for (provider, count) in &stats.providers {
            println!("  {} ({})", provider, count);
        }
    }
    Ok(())
}
