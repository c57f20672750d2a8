#[macro_use]
extern crate rust_i18n;

// Re-export all library modules
use devblogger_rs::*;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use cli::{Cli, Commands};
use tokio::runtime::Runtime;

use error::BloggerError;

// Initialize i18n for binary crate
// This ensures translations are available in main.rs context
i18n!("locales", fallback = "en");

fn main() -> Result<()> {
    human_panic::setup_panic!();

    // 在解析 CLI 之前初始化语言（支持多语言 help text）
    init_locale_early();

    // 解析 CLI 参数并注入国际化 help text
    let cli = parse_cli_localized()?;

    // 根据 verbose 标志设置日志级别
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // 初始化 tracing 日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    // config/init 命令不需要完整配置，可以在配置损坏时运行
    let needs_config = !matches!(
        &cli.command,
        Commands::Config { .. } | Commands::Init { .. }
    );

    let config = if needs_config {
        config::load_config()?
    } else {
        config::load_config().unwrap_or_default()
    };

    let colored = config.ui.colored;

    // 创建 tokio 运行时
    let rt = Runtime::new()?;

    rt.block_on(async {
        let result = dispatch(cli, &config).await;
        if let Err(e) = result {
            match e {
                BloggerError::Cancelled => {
                    // 用户取消不算错误，正常退出
                    std::process::exit(0);
                }
                _ => {
                    ui::error(&e.to_string(), colored);
                    if let Some(suggestion) = e.suggestion() {
                        println!();
                        println!("{}", ui::info(&suggestion, colored));
                    }
                    std::process::exit(1);
                }
            }
        }
        Ok(())
    })
}

/// 根据子命令路由
async fn dispatch(cli: Cli, config: &config::AppConfig) -> error::Result<()> {
    let provider_override = cli.provider;

    match cli.command {
        Commands::Generate {
            commits,
            repository,
            since,
            until,
            query,
            max_commits,
            prompt,
            tag,
            max_tokens,
            temperature,
        } => {
            let args = commands::generate::GenerateArgs {
                commits_path: &commits,
                repository,
                since,
                until,
                query,
                max_commits,
                prompt,
                tags: tag,
                max_tokens,
                temperature,
                provider: provider_override,
            };
            commands::generate::run(args, config).await
        }
        Commands::Regenerate {
            id,
            commits,
            prompt,
            tag,
            max_tokens,
            temperature,
        } => {
            let args = commands::generate::RegenerateArgs {
                id,
                commits_path: &commits,
                prompt,
                tags: tag,
                max_tokens,
                temperature,
                provider: provider_override,
            };
            commands::generate::run_regenerate(args, config).await
        }
        Commands::List {
            repository,
            limit,
            json,
        } => commands::list::run(repository.as_deref(), limit, json, config).await,
        Commands::Search {
            query,
            repository,
            tag,
            since,
            until,
            json,
        } => {
            commands::list::run_search(
                &query,
                repository,
                tag,
                since.as_deref(),
                until.as_deref(),
                json,
                config,
            )
            .await
        }
        Commands::Show { id, raw } => commands::list::run_show(&id, raw, config).await,
        Commands::Export {
            ids,
            format,
            output,
        } => commands::export::run(ids, &format, output.as_deref(), config).await,
        Commands::Delete { id, yes } => commands::delete::run(&id, yes, config).await,
        Commands::Edit { id } => commands::edit::run(&id, config).await,
        Commands::Validate => commands::maintain::run_validate(config).await,
        Commands::Repair => commands::maintain::run_repair(config).await,
        Commands::Prune { days, yes } => commands::delete::run_prune(days, yes, config).await,
        Commands::Stats { json } => commands::maintain::run_stats(json, config).await,
        Commands::Test => commands::provider::run_test(config).await,
        Commands::Models { name } => commands::provider::run_models(name.as_deref(), config).await,
        Commands::Config { action } => commands::config::run(action, config).await,
        Commands::Init { force } => commands::init::run(force, config.ui.colored),
    }
}

/// Parse CLI arguments with localized help text
///
/// Uses clap's derive + runtime override pattern:
/// 1. Get Command from derive macro (type-safe parsing)
/// 2. Override help text at runtime with rust_i18n::t!()
/// 3. Parse and reconstruct the Cli struct
fn parse_cli_localized() -> Result<Cli> {
    let cmd = Cli::command()
        .about(rust_i18n::t!("cli.about").to_string())
        .mut_arg("verbose", |arg| {
            arg.help(rust_i18n::t!("cli.verbose").to_string())
        })
        .mut_arg("provider", |arg| {
            arg.help(rust_i18n::t!("cli.provider").to_string())
        })
        .mut_subcommand("generate", |s| {
            s.about(rust_i18n::t!("cli.generate").to_string())
        })
        .mut_subcommand("regenerate", |s| {
            s.about(rust_i18n::t!("cli.regenerate").to_string())
        })
        .mut_subcommand("list", |s| s.about(rust_i18n::t!("cli.list").to_string()))
        .mut_subcommand("search", |s| s.about(rust_i18n::t!("cli.search").to_string()))
        .mut_subcommand("show", |s| s.about(rust_i18n::t!("cli.show").to_string()))
        .mut_subcommand("export", |s| s.about(rust_i18n::t!("cli.export").to_string()))
        .mut_subcommand("delete", |s| s.about(rust_i18n::t!("cli.delete").to_string()))
        .mut_subcommand("edit", |s| s.about(rust_i18n::t!("cli.edit").to_string()))
        .mut_subcommand("validate", |s| {
            s.about(rust_i18n::t!("cli.validate").to_string())
        })
        .mut_subcommand("repair", |s| s.about(rust_i18n::t!("cli.repair").to_string()))
        .mut_subcommand("prune", |s| s.about(rust_i18n::t!("cli.prune").to_string()))
        .mut_subcommand("stats", |s| s.about(rust_i18n::t!("cli.stats").to_string()))
        .mut_subcommand("test", |s| s.about(rust_i18n::t!("cli.test").to_string()))
        .mut_subcommand("models", |s| s.about(rust_i18n::t!("cli.models").to_string()))
        .mut_subcommand("config", |s| s.about(rust_i18n::t!("cli.config").to_string()))
        .mut_subcommand("init", |s| s.about(rust_i18n::t!("cli.init").to_string()));

    let matches = cmd.get_matches();
    Cli::from_arg_matches(&matches)
        .map_err(|e| anyhow::anyhow!("Failed to parse CLI arguments: {}", e))
}

/// Initialize locale early in the startup process
///
/// Priority order:
/// 1. Environment variable DEVBLOGGER_UI_LANGUAGE (highest priority)
/// 2. Configuration file ui.language
/// 3. System locale detection
/// 4. Fallback to English
fn init_locale_early() {
    let locale = std::env::var("DEVBLOGGER_UI_LANGUAGE")
        .ok()
        .or_else(|| get_language_from_config().ok())
        .or_else(detect_system_locale)
        .unwrap_or_else(|| "en".to_string());

    rust_i18n::set_locale(&locale);
}

/// Attempt to read language setting from config file
///
/// This is a lightweight read that only parses the ui.language field
/// without loading the entire configuration or validating providers.
fn get_language_from_config() -> Result<String> {
    let config_path = config::get_config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if !config_path.exists() {
        return Err(anyhow::anyhow!("Config file not found"));
    }

    let content = std::fs::read_to_string(&config_path)?;
    let config: toml::Value = toml::from_str(&content)?;

    // Extract ui.language if present
    if let Some(language) = config
        .get("ui")
        .and_then(|ui| ui.get("language"))
        .and_then(|lang| lang.as_str())
    {
        Ok(language.to_string())
    } else {
        Err(anyhow::anyhow!("ui.language not found in config"))
    }
}

/// Detect system locale using sys-locale crate
///
/// Returns locale in BCP 47 format (e.g., "en", "zh-CN", "ja-JP")
fn detect_system_locale() -> Option<String> {
    sys_locale::get_locale().map(|locale| {
        // Normalize locale format: "zh_CN" -> "zh-CN"
        locale.replace('_', "-")
    })
}
