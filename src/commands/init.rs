use std::fs;

use crate::config;
use crate::error::{BloggerError, Result};
use crate::ui;

/// 初始化配置文件
pub fn run(force: bool, colored: bool) -> Result<()> {
    // 1. 获取配置文件路径
    let config_file = config::get_config_path()
        .ok_or_else(|| BloggerError::Config("Failed to determine config directory".to_string()))?;

    // 2. 检查配置文件是否已存在
    if config_file.exists() && !force {
        ui::warning(
            &rust_i18n::t!("init.exists", path = config_file.display().to_string()),
            colored,
        );
        println!();
        println!("{}", rust_i18n::t!("init.use_force"));
        println!("{}", rust_i18n::t!("init.config_edit"));
        return Ok(());
    }

    // 3. 创建配置目录
    if let Some(dir) = config_file.parent() {
        fs::create_dir_all(dir)?;
        ui::success(
            &rust_i18n::t!("init.dir_created", path = dir.display().to_string()),
            colored,
        );
    }

    // 4. 写入默认配置
    fs::write(&config_file, config::default_config_template())?;
    ui::success(
        &rust_i18n::t!("init.file_created", path = config_file.display().to_string()),
        colored,
    );

    // 5. 设置文件权限（仅 Unix，配置里可能有 api_key）
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&config_file)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&config_file, perms)?;
        ui::success(&rust_i18n::t!("init.permissions"), colored);
    }

    // 6. 显示下一步提示
    println!();
    println!("{}", ui::info(&rust_i18n::t!("init.next_steps"), colored));
    println!("{}", rust_i18n::t!("init.step1"));
    println!("{}", rust_i18n::t!("init.step1_cmd"));
    println!();
    println!("{}", rust_i18n::t!("init.step2"));
    println!("{}", rust_i18n::t!("init.step2_cmd"));
    println!();

    Ok(())
}
