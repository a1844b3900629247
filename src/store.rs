use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::FeedStore;

/// Upper bound for store and configuration files.
pub const MAX_STORE_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a text file, refusing anything larger than `max_size`.
pub fn read_capped(path: &Path, max_size: u64) -> anyhow::Result<String> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if metadata.len() > max_size {
        anyhow::bail!(
            "{} is {} bytes, larger than the {max_size} byte limit",
            path.display(),
            metadata.len()
        );
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn load_store(path: &Path) -> anyhow::Result<FeedStore> {
    let content = read_capped(path, MAX_STORE_FILE_SIZE)?;
    let store: FeedStore = serde_yaml::from_str(&content)
        .with_context(|| format!("parse store: {}", path.display()))?;
    tracing::debug!(path = %path.display(), records = store.feed.len(), "loaded store");
    Ok(store)
}

pub fn save_store(path: &Path, store: &FeedStore) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(store).context("serialize store yaml")?;
    atomic_write(path, &yaml)?;
    tracing::debug!(path = %path.display(), "saved store");
    Ok(())
}

/// Write via a temp file in the destination directory plus an atomic
/// rename, so an interrupted run never leaves a half-written file.
pub fn atomic_write(path: &Path, content: &str) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    temp.write_all(content.as_bytes())
        .with_context(|| format!("write temp file for {}", path.display()))?;
    temp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Store-data validation ahead of feed generation. Warnings are
/// advisory; errors block the build for that file.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Missing category or missing feedback are warnings; a feedback entry
/// without a rating is a data-integrity error.
pub fn validate_store(store: &FeedStore) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (idx, item) in store.feed.iter().enumerate() {
        let title = if item.title.is_empty() {
            format!("Untitled (item {})", idx + 1)
        } else {
            item.title.clone()
        };

        if item.category.is_empty() {
            report
                .warnings
                .push(format!("Talk '{title}' is missing a category"));
        }
        if item.feedback.is_empty() {
            report.warnings.push(format!("Talk '{title}' has no feedback"));
        }

        for (entry_idx, entry) in item.feedback.iter().enumerate() {
            if entry.rating.is_some() {
                continue;
            }
            let username = entry.username.as_deref().unwrap_or("Anonymous");
            let comment = entry.comment.as_deref().unwrap_or("");
            let preview = if comment.chars().count() > 40 {
                let head: String = comment.chars().take(40).collect();
                format!(": {head}...")
            } else if comment.is_empty() {
                String::new()
            } else {
                format!(": {comment}")
            };
            report.errors.push(format!(
                "Talk '{title}': feedback #{} (by {username}) is missing a rating{preview}",
                entry_idx + 1
            ));
        }
    }

    report
}
