use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

use crate::config::GlobalConfig;
use crate::feedback;
use crate::formats::{FeedStore, TalkRecord};
use crate::store;

const GENERATOR: &str = concat!("talkfeed ", env!("CARGO_PKG_VERSION"));

static CHANNEL_PUB_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<pubDate>[^<]*</pubDate>").expect("pubDate pattern"));
static LAST_BUILD_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<lastBuildDate>[^<]*</lastBuildDate>").expect("lastBuildDate pattern")
});

/// Drop records whose average rating fails the inclusion rule, reporting
/// how many were excluded.
pub fn filter_by_rating(records: Vec<TalkRecord>, include_all: bool) -> Vec<TalkRecord> {
    if include_all {
        return records;
    }

    let total = records.len();
    let kept: Vec<TalkRecord> = records
        .into_iter()
        .filter(|record| {
            let include = feedback::should_include(record, false);
            if !include {
                tracing::debug!(title = %record.title, "excluding low-rated talk");
            }
            include
        })
        .collect();

    let excluded = total - kept.len();
    if excluded > 0 {
        tracing::info!(excluded, "excluded low-rated talk(s) from the feed");
    }
    kept
}

fn item_description(record: &TalkRecord) -> String {
    format!(
        "{}{}",
        feedback::format_feedback_section(&record.feedback),
        record.description
    )
}

/// Render the filtered records plus feed metadata into the output RSS
/// document.
pub fn render(
    records: &[TalkRecord],
    store: &FeedStore,
    global: &GlobalConfig,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().to_rfc2822();
    let link = global.link.clone().unwrap_or_default();

    let items: Vec<rss::Item> = records
        .iter()
        .map(|record| {
            let mut item = rss::ItemBuilder::default();
            item.title(Some(record.title.clone()))
                .description(Some(item_description(record)));
            if !record.web_url.is_empty() {
                item.link(Some(record.web_url.clone()));
            }
            if !record.published.is_empty() {
                item.pub_date(Some(record.published.clone()));
            }
            if !record.category.is_empty() {
                item.categories(vec![
                    rss::CategoryBuilder::default()
                        .name(record.category.clone())
                        .build(),
                ]);
            }
            if !record.media_url.is_empty() {
                item.guid(Some(
                    rss::GuidBuilder::default()
                        .value(record.media_url.clone())
                        .permalink(false)
                        .build(),
                ));
                item.enclosure(Some(
                    rss::EnclosureBuilder::default()
                        .url(record.media_url.clone())
                        .length(record.media_length.clone())
                        .mime_type(record.media_type.clone())
                        .build(),
                ));
            }
            item.build()
        })
        .collect();

    let mut channel = rss::ChannelBuilder::default();
    channel
        .title(store.meta.title.clone())
        .link(link.clone())
        .description(store.meta.description.clone())
        .generator(Some(GENERATOR.to_owned()))
        .pub_date(Some(now.clone()))
        .last_build_date(Some(now));
    if let Some(language) = &global.language {
        channel.language(Some(language.clone()));
    }
    if let Some(editor) = managing_editor(global) {
        channel.managing_editor(Some(editor));
    }
    if let Some(image_url) = &store.meta.image_url {
        channel.image(Some(
            rss::ImageBuilder::default()
                .url(image_url.clone())
                .title(store.meta.title.clone())
                .link(link)
                .build(),
        ));
    }
    channel.items(items);

    let mut out = Vec::new();
    channel
        .build()
        .pretty_write_to(&mut out, b' ', 2)
        .context("render rss feed")?;
    String::from_utf8(out).context("rendered feed is not valid utf-8")
}

fn managing_editor(global: &GlobalConfig) -> Option<String> {
    let email = global.contact.as_ref()?.email.as_ref()?;
    match &global.author {
        Some(author) => Some(format!("{email} ({author})")),
        None => Some(email.clone()),
    }
}

/// Blank the two volatile channel timestamps so substantive content can be
/// compared across rebuilds. Only the first occurrence of each tag is the
/// channel-level one; item dates stay intact.
pub fn normalize_for_comparison(xml: &str) -> String {
    let normalized = CHANNEL_PUB_DATE.replace(xml, "<pubDate></pubDate>");
    let normalized = LAST_BUILD_DATE.replace(&normalized, "<lastBuildDate></lastBuildDate>");
    normalized.trim().to_owned()
}

/// Render the feed and write it to `output_path` unless the previous
/// rendering is substantively identical. Returns whether the file was
/// written. An unreadable previous file counts as changed.
pub fn generate(
    store_data: &FeedStore,
    global: &GlobalConfig,
    output_path: &Path,
    include_all: bool,
) -> anyhow::Result<bool> {
    let records = filter_by_rating(store_data.feed.clone(), include_all);
    let xml = render(&records, store_data, global)?;

    if output_path.exists() {
        match std::fs::read_to_string(output_path) {
            Ok(previous) => {
                if normalize_for_comparison(&previous) == normalize_for_comparison(&xml) {
                    tracing::info!(
                        path = %output_path.display(),
                        "feed unchanged (only timestamps), skipping write"
                    );
                    return Ok(false);
                }
            }
            Err(err) => {
                tracing::debug!(
                    ?err,
                    path = %output_path.display(),
                    "could not compare against previous feed, writing"
                );
            }
        }
    }

    store::atomic_write(output_path, &xml)
        .with_context(|| format!("write feed: {}", output_path.display()))?;
    tracing::info!(path = %output_path.display(), "feed written");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{FeedMeta, FeedbackEntry};

    fn record(title: &str, ratings: &[u8]) -> TalkRecord {
        TalkRecord {
            title: title.to_owned(),
            published: "Tue, 31 Dec 2024 10:00:00 +0000".to_owned(),
            speakers: "Alice".to_owned(),
            subtitle: String::new(),
            media_url: format!("https://cdn.example.org/{}.mp4", title.replace(' ', "-")),
            media_type: "video/mp4".to_owned(),
            media_length: "123456".to_owned(),
            web_url: "https://example.org/talk.html".to_owned(),
            description: "About the talk.".to_owned(),
            category: "Technology".to_owned(),
            feedback: ratings.iter().map(|r| FeedbackEntry::rated(*r)).collect(),
        }
    }

    fn store_with(records: Vec<TalkRecord>) -> FeedStore {
        FeedStore {
            meta: FeedMeta {
                title: "38C3 media feed".to_owned(),
                description: "A curated feed.".to_owned(),
                image_url: Some("https://static.example.org/logo.png".to_owned()),
            },
            feed: records,
        }
    }

    fn global() -> GlobalConfig {
        GlobalConfig {
            contact: Some(crate::config::Contact {
                email: Some("feed@example.org".to_owned()),
            }),
            author: Some("Example Curator".to_owned()),
            link: Some("https://example.org/".to_owned()),
            language: Some("en".to_owned()),
            category_mapping: Default::default(),
        }
    }

    #[test]
    fn filter_drops_low_rated_records() {
        let records = vec![record("Good Talk", &[5]), record("Bad Talk", &[1])];
        let kept = filter_by_rating(records, false);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Good Talk");
    }

    #[test]
    fn filter_keeps_unrated_records() {
        let kept = filter_by_rating(vec![record("Quiet Talk", &[])], false);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn filter_keeps_everything_with_include_all() {
        let records = vec![record("Good Talk", &[5]), record("Bad Talk", &[1])];
        assert_eq!(filter_by_rating(records, true).len(), 2);
    }

    #[test]
    fn rendered_feed_carries_channel_and_item_fields() -> anyhow::Result<()> {
        let store = store_with(vec![record("Intro to Widgets", &[5, 4])]);
        let xml = render(&store.feed, &store, &global())?;

        assert!(xml.contains("<title>38C3 media feed</title>"));
        assert!(xml.contains("<language>en</language>"));
        assert!(xml.contains("<managingEditor>feed@example.org (Example Curator)</managingEditor>"));
        assert!(xml.contains("https://static.example.org/logo.png"));
        assert!(xml.contains("<title>Intro to Widgets</title>"));
        assert!(xml.contains("url=\"https://cdn.example.org/Intro-to-Widgets.mp4\""));
        assert!(xml.contains("RATINGS (Average: 4.5/5 from 2 ratings)"));
        assert!(xml.contains("About the talk."));
        assert!(xml.contains("<lastBuildDate>"));
        Ok(())
    }

    #[test]
    fn normalization_blanks_only_the_first_timestamp_occurrences() {
        let xml = "<channel><pubDate>now</pubDate><lastBuildDate>now</lastBuildDate>\
                   <item><pubDate>Tue, 31 Dec 2024 10:00:00 +0000</pubDate></item></channel>";
        let normalized = normalize_for_comparison(xml);
        assert!(normalized.contains("<pubDate></pubDate>"));
        assert!(normalized.contains("<lastBuildDate></lastBuildDate>"));
        assert!(normalized.contains("<pubDate>Tue, 31 Dec 2024 10:00:00 +0000</pubDate>"));
    }

    #[test]
    fn regenerating_unchanged_content_skips_the_write() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("feed_38c3.xml");
        let store = store_with(vec![record("Intro to Widgets", &[3])]);

        assert!(generate(&store, &global(), &output, false)?);
        assert!(!generate(&store, &global(), &output, false)?);
        Ok(())
    }

    #[test]
    fn rating_change_across_the_threshold_rewrites_the_feed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("feed_38c3.xml");

        let store = store_with(vec![record("Intro to Widgets", &[3])]);
        assert!(generate(&store, &global(), &output, false)?);

        let downgraded = store_with(vec![record("Intro to Widgets", &[1])]);
        assert!(generate(&downgraded, &global(), &output, false)?);
        let xml = std::fs::read_to_string(&output)?;
        assert!(!xml.contains("<title>Intro to Widgets</title>"));
        Ok(())
    }

    #[test]
    fn missing_previous_file_counts_as_changed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("fresh.xml");
        let store = store_with(Vec::new());
        assert!(generate(&store, &global(), &output, false)?);
        assert!(output.exists());
        Ok(())
    }
}
