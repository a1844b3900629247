use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Minimum Jaccard similarity for the token-set fallback level.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.90;

static EVENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\(\d+c3\)\s*$").expect("event suffix pattern"));

/// Normalize a talk title for cross-source comparison (not for display).
///
/// Strips a trailing event-edition suffix like `(38c3)`, collapses
/// whitespace runs and folds to upper case, so cosmetic differences between
/// the schedule and the media feed do not defeat matching.
pub fn normalize_title(title: &str) -> String {
    let stripped = EVENT_SUFFIX.replace(title.trim(), "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Check whether a schedule title and a media-feed title denote the same
/// talk, using the default similarity threshold.
pub fn titles_match(schedule_title: &str, media_title: &str) -> bool {
    titles_match_with_threshold(schedule_title, media_title, DEFAULT_MATCH_THRESHOLD)
}

/// Escalating match: exact, bidirectional substring, then token-set
/// (Jaccard) similarity against `threshold`.
///
/// Substring runs in both directions because the media feed commonly drops
/// a talk's subtitle while the schedule keeps it. The token level handles
/// reordered or slightly reworded titles ("is" in the schedule, "are" in
/// the media feed).
pub fn titles_match_with_threshold(
    schedule_title: &str,
    media_title: &str,
    threshold: f64,
) -> bool {
    let norm_schedule = normalize_title(schedule_title);
    let norm_media = normalize_title(media_title);

    if norm_schedule.is_empty() || norm_media.is_empty() {
        // Titles reduced to nothing (e.g. only an edition suffix) still
        // pair with each other, but genuinely empty titles never match.
        return norm_schedule.is_empty()
            && norm_media.is_empty()
            && !schedule_title.trim().is_empty()
            && !media_title.trim().is_empty();
    }

    if norm_schedule == norm_media {
        tracing::debug!(title = schedule_title, "exact title match");
        return true;
    }

    if norm_schedule.contains(&norm_media) || norm_media.contains(&norm_schedule) {
        tracing::debug!(title = schedule_title, "substring title match");
        return true;
    }

    let schedule_tokens: HashSet<&str> = norm_schedule.split_whitespace().collect();
    let media_tokens: HashSet<&str> = norm_media.split_whitespace().collect();

    let intersection = schedule_tokens.intersection(&media_tokens).count();
    let union = schedule_tokens.union(&media_tokens).count();
    let similarity = intersection as f64 / union as f64;

    if similarity >= threshold {
        tracing::debug!(
            similarity,
            schedule_title,
            media_title,
            "fuzzy title match"
        );
        return true;
    }

    false
}
