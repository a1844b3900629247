use crate::formats::{FeedbackEntry, TalkRecord};

/// Records whose average rating is at or below this value are dropped
/// from the generated feed unless `--all-ratings` is given.
pub const EXCLUSION_THRESHOLD: f64 = 2.0;

const SECTION_RULE_WIDTH: usize = 30;

/// Arithmetic mean over entries that carry a rating; `None` when nothing
/// is rated.
pub fn average_rating(feedback: &[FeedbackEntry]) -> Option<f64> {
    let ratings: Vec<u8> = feedback.iter().filter_map(|entry| entry.rating).collect();
    if ratings.is_empty() {
        return None;
    }
    let sum: f64 = ratings.iter().map(|rating| f64::from(*rating)).sum();
    Some(sum / ratings.len() as f64)
}

/// Feed-inclusion rule: everything with `include_all`, otherwise records
/// with no rated feedback (absence of opinion is not low quality) or an
/// average strictly above the threshold. An average of exactly 2.0 is
/// excluded.
pub fn should_include(record: &TalkRecord, include_all: bool) -> bool {
    if include_all {
        return true;
    }
    match average_rating(&record.feedback) {
        Some(average) => average > EXCLUSION_THRESHOLD,
        None => true,
    }
}

pub fn format_stars(rating: u8) -> String {
    if !(1..=5).contains(&rating) {
        return String::new();
    }
    "⭐".repeat(usize::from(rating))
}

/// One display line per rated entry, e.g.
/// `⭐⭐⭐⭐⭐ (5/5) - max: Must see talk!` or `⭐⭐⭐ (3/5) - anna`.
pub fn format_feedback_line(entry: &FeedbackEntry) -> String {
    let Some(rating) = entry.rating else {
        return String::new();
    };

    let rating_text = format!("{} ({rating}/5)", format_stars(rating));
    let username = entry.username.as_deref().unwrap_or("").trim();
    let comment = entry.comment.as_deref().unwrap_or("").trim();

    match (username.is_empty(), comment.is_empty()) {
        (false, false) => format!("{rating_text} - {username}: {comment}"),
        (false, true) => format!("{rating_text} - {username}"),
        (true, false) => format!("{rating_text} {comment}"),
        (true, true) => rating_text,
    }
}

/// Render the ratings block that gets prepended to an item description.
/// Empty string when no entry carries a rating.
pub fn format_feedback_section(feedback: &[FeedbackEntry]) -> String {
    let rated: Vec<&FeedbackEntry> = feedback
        .iter()
        .filter(|entry| entry.rating.is_some())
        .collect();
    if rated.is_empty() {
        return String::new();
    }

    let count = rated.len();
    let average = average_rating(feedback).unwrap_or_default();
    let rule = "━".repeat(SECTION_RULE_WIDTH);

    let mut lines = Vec::with_capacity(count + 6);
    lines.push(rule.clone());
    lines.push(format!(
        "📊 RATINGS (Average: {average:.1}/5 from {count} rating{})",
        if count == 1 { "" } else { "s" }
    ));
    lines.push(String::new());
    for entry in rated {
        lines.push(format_feedback_line(entry));
    }
    lines.push(String::new());
    lines.push(rule);
    lines.push(String::new());

    lines.join("\n")
}
