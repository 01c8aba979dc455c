//! Commit history extraction via git2.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use codemetry_core::{
    CodemetryError, CommitHistoryProvider, CommitRecord, FileChange, HistoryQuery,
};
use git2::{DiffOptions, Repository, Sort};

/// [`CommitHistoryProvider`] backed by a local git repository.
///
/// Walks history newest-first from HEAD or a named branch, keeps commits
/// inside the query's inclusive date range, and returns them in ascending
/// timestamp order. Merge commits are skipped so churn is not counted twice.
///
/// # Examples
///
/// ```no_run
/// use chrono::{Duration, Utc};
/// use codemetry_core::{CommitHistoryProvider, HistoryQuery};
/// use codemetry_history::GitHistoryProvider;
///
/// let provider = GitHistoryProvider;
/// let commits = provider
///     .fetch(&HistoryQuery {
///         repo_path: ".".into(),
///         branch: None,
///         author: None,
///         since: Utc::now() - Duration::days(30),
///         until: Utc::now(),
///     })
///     .unwrap();
/// println!("{} commits in the last 30 days", commits.len());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHistoryProvider;

impl CommitHistoryProvider for GitHistoryProvider {
    fn fetch(&self, query: &HistoryQuery) -> Result<Vec<CommitRecord>, CodemetryError> {
        let repo = Repository::open(&query.repo_path).map_err(|e| {
            CodemetryError::InvalidRepo(format!(
                "failed to open repository at {}: {e}",
                query.repo_path.display()
            ))
        })?;

        let mut revwalk = repo
            .revwalk()
            .map_err(|e| CodemetryError::Git(format!("failed to create revwalk: {e}")))?;
        revwalk.set_sorting(Sort::TIME).ok();

        if let Some(ref branch) = query.branch {
            let reference = repo.resolve_reference_from_short_name(branch).map_err(|e| {
                CodemetryError::Git(format!("failed to resolve branch '{branch}': {e}"))
            })?;
            let oid = reference
                .target()
                .ok_or_else(|| CodemetryError::Git(format!("branch '{branch}' has no target")))?;
            revwalk
                .push(oid)
                .map_err(|e| CodemetryError::Git(format!("failed to push branch tip: {e}")))?;
        } else {
            // An unborn HEAD means a repository without history.
            revwalk.push_head().map_err(|e| {
                CodemetryError::InvalidRepo(format!("repository has no commit history: {e}"))
            })?;
        }

        let author_filter = query.author.as_deref().map(str::to_lowercase);
        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid =
                oid_result.map_err(|e| CodemetryError::Git(format!("revwalk error: {e}")))?;
            let commit = repo
                .find_commit(oid)
                .map_err(|e| CodemetryError::Git(format!("failed to find commit: {e}")))?;

            let Some(timestamp) = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
            else {
                continue;
            };
            if timestamp < query.since {
                // Newest-first walk: everything beyond here is older still.
                break;
            }
            if timestamp > query.until {
                continue;
            }

            // Merge diffs re-state churn already attributed to the merged
            // commits.
            if commit.parent_count() > 1 {
                continue;
            }

            let author = commit.author();
            let name = author.name().unwrap_or("unknown").to_string();
            let email = author.email().unwrap_or("unknown").to_string();

            if let Some(ref needle) = author_filter {
                if !name.to_lowercase().contains(needle) && !email.to_lowercase().contains(needle)
                {
                    continue;
                }
            }

            let files = extract_file_changes(&repo, &commit)?;
            let hash = oid.to_string();

            commits.push(CommitRecord {
                id: hash[..hash.len().min(8)].to_string(),
                author: name,
                email,
                timestamp,
                message: commit
                    .message()
                    .unwrap_or("")
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string(),
                files,
            });
        }

        commits.sort_by_key(|c| c.timestamp);
        Ok(commits)
    }
}

fn extract_file_changes(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileChange>, CodemetryError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| CodemetryError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| CodemetryError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| CodemetryError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| CodemetryError::Git(format!("failed to compute diff: {e}")))?;

    // One pass over diff lines gives per-file insertion/deletion counts.
    let line_counts: std::cell::RefCell<HashMap<String, (u64, u64)>> =
        std::cell::RefCell::new(HashMap::new());

    diff.foreach(
        &mut |delta, _progress| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .unwrap_or(Path::new(""))
                .to_string_lossy()
                .to_string();
            if !path.is_empty() {
                line_counts.borrow_mut().entry(path).or_insert((0, 0));
            }
            true
        },
        None,
        None,
        Some(&mut |delta, _hunk, line| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .unwrap_or(Path::new(""))
                .to_string_lossy()
                .to_string();

            let mut counts = line_counts.borrow_mut();
            let entry = counts.entry(path).or_insert((0, 0));
            match line.origin() {
                '+' => entry.0 += 1,
                '-' => entry.1 += 1,
                _ => {}
            }
            true
        }),
    )
    .map_err(|e| CodemetryError::Git(format!("failed to iterate diff lines: {e}")))?;

    let mut changes: Vec<FileChange> = line_counts
        .into_inner()
        .into_iter()
        .map(|(path, (insertions, deletions))| FileChange {
            path,
            insertions,
            deletions,
        })
        .collect();
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(changes)
}
