//! Pure commit selection.
//!
//! `filter_commits` 是纯函数：相同输入永远产生相同输出，无网络、无磁盘。
//! 输入约定为按时间倒序（最新在前），过滤只做子序列选择，从不重排。

use chrono::{DateTime, Utc};

use super::Commit;

/// Selection criteria applied before generation.
///
/// All fields are optional; an empty filter selects every commit.
#[derive(Debug, Clone, Default)]
pub struct CommitFilter {
    /// Inclusive lower date bound.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper date bound.
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive text matched against the message or any changed
    /// file path. Empty string matches all.
    pub query: Option<String>,
    /// Truncates the filtered result from the front (most recent first),
    /// applied after every other predicate.
    pub max_count: Option<usize>,
}

impl CommitFilter {
    fn has_date_bound(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }
}

/// Filters a newest-first commit list down to the subset to feed generation.
///
/// The result is always a subsequence of the input in input order; commits with
/// equal timestamps keep their relative input order. Commits without a
/// parseable timestamp are rejected while a date bound is active (counted and
/// logged, never fatal).
pub fn filter_commits(commits: &[Commit], filter: &CommitFilter) -> Vec<Commit> {
    let query = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut rejected_no_timestamp = 0usize;

    let mut selected: Vec<Commit> = commits
        .iter()
        .filter(|commit| {
            if filter.has_date_bound() {
                let Some(ts) = commit.timestamp else {
                    rejected_no_timestamp += 1;
                    return false;
                };
                if let Some(from) = filter.date_from
                    && ts < from
                {
                    return false;
                }
                if let Some(to) = filter.date_to
                    && ts > to
                {
                    return false;
                }
            }

            if let Some(ref q) = query
                && !matches_query(commit, q)
            {
                return false;
            }

            true
        })
        .cloned()
        .collect();

    if rejected_no_timestamp > 0 {
        tracing::debug!(
            "Filter rejected {} commit(s) without a parseable timestamp",
            rejected_no_timestamp
        );
    }

    if let Some(max) = filter.max_count {
        selected.truncate(max);
    }

    selected
}

/// 大小写不敏感匹配：commit message 或任一变更文件路径
fn matches_query(commit: &Commit, query_lower: &str) -> bool {
    if commit.message.to_lowercase().contains(query_lower) {
        return true;
    }
    commit
        .files
        .iter()
        .any(|f| f.filename.to_lowercase().contains(query_lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{CommitAuthor, DiffStat, FileChange};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn commit(sha: &str, message: &str, day: Option<i64>, files: &[&str]) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            author: CommitAuthor::default(),
            timestamp: day.map(|d| {
                Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::days(d)
            }),
            files: files
                .iter()
                .map(|f| FileChange {
                    filename: f.to_string(),
                    status: "modified".to_string(),
                    additions: 1,
                    deletions: 0,
                })
                .collect(),
            stats: DiffStat::default(),
            html_url: None,
        }
    }

    fn shas(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.sha.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything_in_order() {
        let input = vec![
            commit("c3", "three", Some(3), &[]),
            commit("c2", "two", Some(2), &[]),
            commit("c1", "one", Some(1), &[]),
        ];
        let result = filter_commits(&input, &CommitFilter::default());
        assert_eq!(shas(&result), vec!["c3", "c2", "c1"]);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let input = vec![
            commit("c4", "four", Some(4), &[]),
            commit("c3", "three", Some(3), &[]),
            commit("c2", "two", Some(2), &[]),
            commit("c1", "one", Some(1), &[]),
        ];
        let filter = CommitFilter {
            date_from: input[2].timestamp, // day 2
            date_to: input[1].timestamp,   // day 3
            ..Default::default()
        };
        let result = filter_commits(&input, &filter);
        assert_eq!(shas(&result), vec!["c3", "c2"]);
    }

    #[test]
    fn test_missing_timestamp_rejected_only_with_date_bound() {
        let input = vec![
            commit("c2", "two", Some(2), &[]),
            commit("cx", "no date", None, &[]),
            commit("c1", "one", Some(1), &[]),
        ];

        // 无日期过滤时保留
        let result = filter_commits(&input, &CommitFilter::default());
        assert_eq!(shas(&result), vec!["c2", "cx", "c1"]);

        // 有日期过滤时剔除
        let filter = CommitFilter {
            date_from: input[2].timestamp,
            ..Default::default()
        };
        let result = filter_commits(&input, &filter);
        assert_eq!(shas(&result), vec!["c2", "c1"]);
    }

    #[test]
    fn test_query_matches_message_case_insensitive() {
        let input = vec![
            commit("c2", "Fix LOGIN redirect", Some(2), &[]),
            commit("c1", "docs update", Some(1), &[]),
        ];
        let filter = CommitFilter {
            query: Some("login".to_string()),
            ..Default::default()
        };
        assert_eq!(shas(&filter_commits(&input, &filter)), vec!["c2"]);
    }

    #[test]
    fn test_query_matches_file_paths() {
        let input = vec![
            commit("c2", "refactor", Some(2), &["src/auth/session.rs"]),
            commit("c1", "refactor", Some(1), &["README.md"]),
        ];
        let filter = CommitFilter {
            query: Some("AUTH".to_string()),
            ..Default::default()
        };
        assert_eq!(shas(&filter_commits(&input, &filter)), vec!["c2"]);
    }

    #[test]
    fn test_empty_query_matches_all() {
        let input = vec![commit("c1", "one", Some(1), &[])];
        let filter = CommitFilter {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_commits(&input, &filter).len(), 1);
    }

    #[test]
    fn test_max_count_truncates_from_front_after_predicates() {
        let input = vec![
            commit("c5", "feat a", Some(5), &[]),
            commit("c4", "docs", Some(4), &[]),
            commit("c3", "feat b", Some(3), &[]),
            commit("c2", "feat c", Some(2), &[]),
            commit("c1", "feat d", Some(1), &[]),
        ];
        let filter = CommitFilter {
            query: Some("feat".to_string()),
            max_count: Some(2),
            ..Default::default()
        };
        // 先按 query 过滤（c5, c3, c2, c1），再取最新的 2 个
        assert_eq!(shas(&filter_commits(&input, &filter)), vec!["c5", "c3"]);
    }

    #[test]
    fn test_identical_timestamps_keep_input_order() {
        let input = vec![
            commit("first", "same instant", Some(1), &[]),
            commit("second", "same instant", Some(1), &[]),
        ];
        let filter = CommitFilter {
            date_from: input[0].timestamp,
            date_to: input[0].timestamp,
            ..Default::default()
        };
        assert_eq!(shas(&filter_commits(&input, &filter)), vec!["first", "second"]);
    }

    /// spec 场景：30 天内 50 个 commit，按 day 10..=20 过滤并截断为 5
    #[test]
    fn test_date_window_with_max_count_scenario() {
        // 最新在前：day 50 递减到 day 1
        let input: Vec<Commit> = (1..=50)
            .rev()
            .map(|d| commit(&format!("c{}", d), "work", Some(d), &[]))
            .collect();

        let base = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let filter = CommitFilter {
            date_from: Some(base + Duration::days(10)),
            date_to: Some(base + Duration::days(20)),
            max_count: Some(5),
            ..Default::default()
        };

        let result = filter_commits(&input, &filter);
        assert_eq!(shas(&result), vec!["c20", "c19", "c18", "c17", "c16"]);
    }
}
