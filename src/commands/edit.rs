use chrono::Utc;

use crate::blog::document::count_words;
use crate::config::AppConfig;
use crate::error::{BloggerError, Result};
use crate::ui;

/// `edit` 命令：在系统编辑器中修改文章正文
///
/// frontmatter 不进编辑器；保存时 updated_at、word_count 与
/// content hash 一并更新，索引保持一致。
pub async fn run(id: &str, config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let storage = super::open_storage(config)?;
    let mut doc = storage.get(id).await?;

    let edited = match ui::edit_text(&doc.body) {
        Ok(text) => text,
        Err(BloggerError::Cancelled) => {
            println!("{}", rust_i18n::t!("edit.cancelled"));
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if edited.trim() == doc.body.trim() {
        println!("{}", rust_i18n::t!("edit.unchanged"));
        return Ok(());
    }

    doc.body = edited;
    doc.meta.updated_at = Utc::now();
    doc.meta.word_count = count_words(&doc.body);

    storage.save(&doc).await?;
    ui::success(&rust_i18n::t!("edit.saved", id = id), colored);
    Ok(())
}
