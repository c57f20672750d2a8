use colored::Colorize;
use dialoguer::Select;

use crate::cli::ConfigAction;
use crate::config::{self, AppConfig, load_config};
use crate::error::{BloggerError, Result};
use crate::llm::ProviderManager;
use crate::ui;

/// 编辑后用户可选的操作
enum EditAction {
    Retry,  // 重新编辑
    Keep,   // 保留原配置（不修改）
    Ignore, // 忽略错误强制保存
}

pub async fn run(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    // 默认行为：show
    let action = action.unwrap_or(ConfigAction::Show);

    match action {
        ConfigAction::Show => show(config, colored),
        ConfigAction::Use { name } => use_provider(&name, config, colored),
        ConfigAction::Edit => edit(colored),
        ConfigAction::Validate => validate(colored).await,
    }
}

/// 显示生效配置（密钥掩码）
fn show(config: &AppConfig, colored: bool) -> Result<()> {
    if let Some(path) = config::get_config_path() {
        println!(
            "{}",
            rust_i18n::t!("config.path", path = path.display().to_string())
        );
    }
    println!(
        "{}",
        rust_i18n::t!("config.active", provider = config.llm.active_provider.as_str())
    );
    if !config.llm.fallback_providers.is_empty() {
        println!(
            "{}",
            rust_i18n::t!(
                "config.fallbacks",
                providers = config.llm.fallback_providers.join(", ")
            )
        );
    }
    println!();
    super::provider::print_provider_summary(config, colored);
    Ok(())
}

/// 切换激活 provider 并写回配置文件
fn use_provider(name: &str, config: &AppConfig, colored: bool) -> Result<()> {
    // 先在内存中校验（provider 存在且配置完整），再落盘
    let manager = ProviderManager::from_config(config)?;
    manager.switch_active(name)?;

    config::set_active_provider(name)?;
    ui::success(&rust_i18n::t!("config.switched", provider = name), colored);
    Ok(())
}

/// 打开编辑器编辑配置文件（带校验）
fn edit(colored: bool) -> Result<()> {
    let config_file = config::get_config_path().ok_or_else(|| {
        BloggerError::Config(rust_i18n::t!("config.failed_determine_dir").to_string())
    })?;

    // 如果配置文件不存在，提示运行 init
    if !config_file.exists() {
        ui::error(&rust_i18n::t!("config.file_not_found"), colored);
        println!();
        println!("{}", rust_i18n::t!("config.run_init"));
        return Err(BloggerError::Config(
            rust_i18n::t!("config.file_not_found").to_string(),
        ));
    }

    // 初始读取配置内容
    let mut content = std::fs::read_to_string(&config_file)?;

    // 编辑-校验循环
    loop {
        println!(
            "{}",
            ui::info(
                &rust_i18n::t!("config.editing", path = config_file.display().to_string()),
                colored
            )
        );

        // 使用 edit crate 编辑（自动选择 $VISUAL > $EDITOR > platform default）
        let edited = edit::edit(&content).map_err(|e| {
            BloggerError::Other(
                rust_i18n::t!("config.editor_error", error = e.to_string()).to_string(),
            )
        })?;

        // 校验配置（直接在内存校验）
        match toml::from_str::<AppConfig>(&edited) {
            Ok(_) => {
                // 校验成功，写入文件
                std::fs::write(&config_file, &edited)?;
                ui::success(&rust_i18n::t!("config.file_updated"), colored);
                return Ok(());
            }
            Err(e) => {
                // 校验失败
                println!();
                ui::error(
                    &rust_i18n::t!("config.validation_failed", error = e.to_string()),
                    colored,
                );
                println!();

                match prompt_edit_action(colored)? {
                    EditAction::Retry => {
                        // 保留编辑后的内容继续编辑
                        content = edited;
                        continue;
                    }
                    EditAction::Keep => {
                        // 原文件从未被修改，直接返回
                        println!("{}", ui::info(&rust_i18n::t!("config.unchanged"), colored));
                        return Ok(());
                    }
                    EditAction::Ignore => {
                        // 强制保存错误的配置
                        std::fs::write(&config_file, &edited)?;
                        ui::warning(&rust_i18n::t!("config.saved_with_errors"), colored);
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// 提示用户选择操作
fn prompt_edit_action(colored: bool) -> Result<EditAction> {
    let items: Vec<String> = if colored {
        vec![
            format!("{}", rust_i18n::t!("config.action_reedit").yellow()),
            format!("{}", rust_i18n::t!("config.action_keep").blue()),
            format!("{}", rust_i18n::t!("config.action_ignore").red()),
        ]
    } else {
        vec![
            rust_i18n::t!("config.action_reedit").to_string(),
            rust_i18n::t!("config.action_keep").to_string(),
            rust_i18n::t!("config.action_ignore").to_string(),
        ]
    };

    let prompt = if colored {
        format!("{}", rust_i18n::t!("config.action_prompt").cyan().bold())
    } else {
        rust_i18n::t!("config.action_prompt").to_string()
    };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match selection {
        0 => EditAction::Retry,
        1 => EditAction::Keep,
        _ => EditAction::Ignore,
    })
}

/// 校验配置并测试 provider 链路
async fn validate(colored: bool) -> Result<()> {
    // 完整加载触发结构与字段校验
    let config = load_config()?;
    ui::success(&rust_i18n::t!("config.valid"), colored);

    println!();
    super::provider::run_test(&config).await
}
