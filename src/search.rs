use crate::category::CategoryMapping;
use crate::config::EventConfig;
use crate::formats::TalkRecord;
use crate::matching;
use crate::sources::{MediaItem, ScheduleEvent};

/// Result of pairing a schedule query with the media feed. The two miss
/// cases are distinct so callers can print useful diagnostics.
#[derive(Debug)]
pub enum SearchOutcome {
    Found(TalkRecord),
    /// No schedule title contains the query.
    NoScheduleMatch,
    /// A schedule entry matched the query, but no media item pairs with it.
    NoMediaMatch { schedule_title: String },
}

/// Pair the first query-matching schedule entry with the first media item
/// whose title matches, and merge both sides into one canonical record.
///
/// Query matching is plain case-insensitive substring containment on the
/// raw title; it is a human search term, deliberately looser than the
/// cross-source title pairing.
pub fn find_talk(
    query: &str,
    schedule: &[ScheduleEvent],
    media: &[MediaItem],
    event_config: &EventConfig,
    mapping: &CategoryMapping,
    use_long_desc: bool,
) -> SearchOutcome {
    let query_upper = query.to_uppercase();
    let Some(candidate) = schedule
        .iter()
        .find(|event| event.title.to_uppercase().contains(&query_upper))
    else {
        return SearchOutcome::NoScheduleMatch;
    };
    tracing::debug!(
        title = %candidate.title,
        event_id = %candidate.id,
        "schedule candidate for query"
    );

    for item in media {
        if !matching::titles_match(&candidate.title, &item.title) {
            continue;
        }
        let Some(enclosure) = &item.enclosure else {
            tracing::debug!(title = %item.title, "matching media item has no enclosure, skipping");
            continue;
        };

        let description = if use_long_desc && !candidate.description.is_empty() {
            candidate.description.clone()
        } else {
            item.description.clone()
        };

        let category = mapping
            .classify(&candidate.track)
            .into_iter()
            .next()
            .unwrap_or_else(|| "Technology".to_owned());

        tracing::info!(title = %candidate.title, "found talk");
        return SearchOutcome::Found(TalkRecord {
            title: candidate.title.clone(),
            published: item.pub_date.clone(),
            speakers: candidate.speakers.join(", "),
            subtitle: candidate.subtitle.clone(),
            media_url: enclosure.url.clone(),
            media_type: enclosure.mime_type.clone(),
            media_length: enclosure.length.clone(),
            web_url: resolve_web_url(candidate, event_config),
            description,
            category,
            feedback: Vec::new(),
        });
    }

    SearchOutcome::NoMediaMatch {
        schedule_title: candidate.title.clone(),
    }
}

/// Prefer the URL embedded in the schedule entry; fall back to the
/// configured pattern pair. Absence of a derivable URL is a warning, not
/// an error.
fn resolve_web_url(event: &ScheduleEvent, config: &EventConfig) -> String {
    if !event.url.is_empty() {
        tracing::debug!(url = %event.url, "web url from schedule document");
        return event.url.clone();
    }
    if let (Some(head), Some(tail)) = (&config.event_pattern_head, &config.event_pattern_tail) {
        let url = format!("{head}{}{tail}", event.id);
        tracing::debug!(url = %url, "web url from configured pattern");
        return url;
    }
    tracing::warn!(
        event_id = %event.id,
        "no <url> element and no event pattern configured, leaving web url empty"
    );
    String::new()
}
