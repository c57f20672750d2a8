use crate::blog::SearchFilter;
use crate::config::AppConfig;
use crate::error::Result;
use crate::ui;

/// `list` 命令
pub async fn run(
    repository: Option<&str>,
    limit: Option<usize>,
    json: bool,
    config: &AppConfig,
) -> Result<()> {
    let storage = super::open_storage(config)?;
    let entries = storage.list(repository, limit).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", rust_i18n::t!("list.empty"));
        return Ok(());
    }

    for entry in &entries {
        let detail = format!(
            "{} · {} · {}",
            entry.id,
            entry.repository,
            entry.created_at.format("%Y-%m-%d")
        );
        println!(
            "{}",
            ui::entry_line(&entry.title, &detail, config.ui.colored)
        );
    }
    println!();
    println!("{}", rust_i18n::t!("list.total", count = entries.len()));
    Ok(())
}

/// `search` 命令
#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    query: &str,
    repository: Option<String>,
    tags: Vec<String>,
    since: Option<&str>,
    until: Option<&str>,
    json: bool,
    config: &AppConfig,
) -> Result<()> {
    let filter = SearchFilter {
        repository,
        tags,
        date_from: since
            .map(|s| super::parse_date_bound(s, false))
            .transpose()?,
        date_to: until
            .map(|s| super::parse_date_bound(s, true))
            .transpose()?,
    };

    let storage = super::open_storage(config)?;
    let hits = storage.search(query, &filter).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("{}", rust_i18n::t!("search.no_results", query = query));
        return Ok(());
    }

    for entry in &hits {
        let detail = format!(
            "{} · {}",
            entry.id,
            entry.created_at.format("%Y-%m-%d")
        );
        println!(
            "{}",
            ui::entry_line(&entry.title, &detail, config.ui.colored)
        );
    }
    println!();
    println!("{}", rust_i18n::t!("search.total", count = hits.len()));
    Ok(())
}

/// `show` 命令
pub async fn run_show(id: &str, raw: bool, config: &AppConfig) -> Result<()> {
    let storage = super::open_storage(config)?;
    let doc = storage.get(id).await?;

    if raw {
        print!("{}", doc.render()?);
        return Ok(());
    }

    let colored = config.ui.colored;
    println!("{}", ui::entry_line(&doc.meta.title, &doc.id, colored));
    println!(
        "{}",
        rust_i18n::t!(
            "show.meta",
            repository = doc.meta.repository.as_str(),
            provider = doc.meta.provider.as_str(),
            model = doc.meta.model.as_str(),
            created = doc.meta.created_at.format("%Y-%m-%d %H:%M").to_string()
        )
    );
    if !doc.meta.tags.is_empty() {
        println!(
            "{}",
            rust_i18n::t!("show.tags", tags = doc.meta.tags.join(", "))
        );
    }
    println!();
    println!("{}", doc.body);
    Ok(())
}
