use chrono::{DateTime, Utc};

use crate::commit::Commit;
use crate::constants::generation::MAX_FILES_PER_COMMIT;

/// Default instruction used when neither the CLI nor the config provides one
pub const DEFAULT_BLOG_PROMPT: &str = "Write a concise, informative, and interesting development blog entry \
based on the provided commit information. Focus on the most significant \
changes and improvements. Write in first person as if you are the \
developer describing your work. Keep the tone professional but engaging. \
Highlight technical achievements, challenges overcome, and the impact \
of the changes. Structure the post with a clear introduction, main content \
describing the key changes, and a conclusion if appropriate.";

/// Formats a commit timestamp for inclusion in the prompt.
pub(crate) fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// 单个 commit 的提示块
///
/// 每个 commit 一段：编号、SHA、作者、日期、消息、文件清单（最多
/// [`MAX_FILES_PER_COMMIT`] 个，超出部分折叠为计数）。
fn format_commit_block(index: usize, commit: &Commit) -> String {
    let mut sections = Vec::new();

    sections.push(format!("--- Commit {} ---", index));
    sections.push(format!("SHA: {}", commit.sha));
    sections.push(format!("Author: {}", commit.author.display_name()));
    sections.push(format!("Date: {}", format_timestamp(commit.timestamp)));
    sections.push(format!("Message: {}", commit.message));

    if !commit.files.is_empty() {
        sections.push("Files Changed:".to_string());
        for file in commit.files.iter().take(MAX_FILES_PER_COMMIT) {
            let mut change_info = format!("  {} {}", file.status, file.filename);
            if file.additions > 0 {
                change_info.push_str(&format!(" (+{})", file.additions));
            }
            if file.deletions > 0 {
                change_info.push_str(&format!(" (-{})", file.deletions));
            }
            sections.push(change_info);
        }
        if commit.files.len() > MAX_FILES_PER_COMMIT {
            sections.push(format!(
                "  ... and {} more files",
                commit.files.len() - MAX_FILES_PER_COMMIT
            ));
        }
    }

    sections.join("\n")
}

/// Builds the full generation prompt: instruction template followed by the
/// structured commit data.
///
/// The commit section starts with a repository header, then one block per
/// commit in the order given. The same selection, repository, and template
/// always produce the same prompt string.
pub fn build_blog_prompt(template: &str, commits: &[Commit], repository: &str) -> String {
    let mut sections = Vec::new();

    sections.push(format!("Repository: {}", repository));
    sections.push(format!("Total Commits: {}", commits.len()));
    sections.push(String::new());

    for (i, commit) in commits.iter().enumerate() {
        sections.push(format_commit_block(i + 1, commit));
        sections.push(String::new());
    }

    format!("{}\n\n{}", template, sections.join("\n"))
}
