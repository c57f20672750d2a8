use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::llm::provider::utils::mask_api_key;
use crate::llm::ProviderManager;
use crate::ui;

/// `test` 命令：并发测试所有 provider 的连通性
pub async fn run_test(config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let manager = Arc::new(ProviderManager::from_config(config)?);
    let active = manager.active_name();

    let spinner = ui::Spinner::new(&rust_i18n::t!("test.spinner"));
    let results = manager.test_all().await;
    spinner.finish_and_clear();

    let mut failures = 0usize;
    for (name, result) in &results {
        let marker = if *name == active { " (active)" } else { "" };
        match result {
            Ok(()) => ui::success(&format!("{}{}", name, marker), colored),
            Err(e) => {
                failures += 1;
                ui::error(&format!("{}{}: {}", name, marker, e), colored);
            }
        }
    }

    println!();
    if failures == 0 {
        println!("{}", rust_i18n::t!("test.all_ok", count = results.len()));
    } else {
        println!(
            "{}",
            rust_i18n::t!("test.failures", failed = failures, total = results.len())
        );
    }
    Ok(())
}

/// `models` 命令：列出 provider 可用的模型
pub async fn run_models(name: Option<&str>, config: &AppConfig) -> Result<()> {
    let manager = ProviderManager::from_config(config)?;
    let resolved = name.map(String::from).unwrap_or_else(|| manager.active_name());
    let models = manager.list_models(Some(&resolved)).await?;

    println!(
        "{}",
        rust_i18n::t!("models.header", provider = resolved.as_str())
    );
    let configured = manager
        .get(&resolved)
        .map(|p| p.model().to_string())
        .unwrap_or_default();
    for model in &models {
        if *model == configured {
            println!("  {} *", model);
        } else {
            println!("  {}", model);
        }
    }
    Ok(())
}

/// 打印 provider 概览（`config show` 使用）
pub fn print_provider_summary(config: &AppConfig, colored: bool) {
    println!("{}", rust_i18n::t!("config.providers_header"));
    let mut names: Vec<&String> = config.llm.providers.keys().collect();
    names.sort();
    for name in names {
        let provider = &config.llm.providers[name];
        let key = provider
            .api_key
            .as_deref()
            .map(mask_api_key)
            .unwrap_or_else(|| "-".to_string());
        let line = format!("{}: model={} api_key={}", name, provider.model, key);
        if *name == config.llm.active_provider {
            ui::success(&format!("{} (active)", line), colored);
        } else {
            println!("  {}", line);
        }
    }
}
