use anyhow::Context as _;

/// One `event` element from the schedule document, in document order.
/// Structurally absent children are empty strings, never errors.
#[derive(Debug, Clone)]
pub struct ScheduleEvent {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub speakers: Vec<String>,
    pub description: String,
    pub track: String,
    pub url: String,
}

/// One `item` from the media/podcast feed, in document order.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub title: String,
    pub pub_date: String,
    pub description: String,
    pub enclosure: Option<MediaEnclosure>,
}

#[derive(Debug, Clone)]
pub struct MediaEnclosure {
    pub url: String,
    pub mime_type: String,
    pub length: String,
}

/// Walk `schedule/day/room/event` and collect every titled event.
pub fn parse_schedule(xml: &str) -> anyhow::Result<Vec<ScheduleEvent>> {
    let doc = roxmltree::Document::parse(xml).context("parse schedule xml")?;
    let root = doc.root_element();
    if root.tag_name().name() != "schedule" {
        anyhow::bail!(
            "schedule document root is <{}>, expected <schedule>",
            root.tag_name().name()
        );
    }

    let mut events = Vec::new();
    for day in root.children().filter(|node| node.has_tag_name("day")) {
        for room in day.children().filter(|node| node.has_tag_name("room")) {
            for event in room.children().filter(|node| node.has_tag_name("event")) {
                let title = child_text(event, "title");
                if title.trim().is_empty() {
                    tracing::debug!(
                        event_id = event.attribute("id").unwrap_or_default(),
                        "skipping schedule event without a title"
                    );
                    continue;
                }

                events.push(ScheduleEvent {
                    id: event.attribute("id").unwrap_or_default().to_owned(),
                    title,
                    subtitle: child_text(event, "subtitle"),
                    speakers: speaker_names(event),
                    description: child_text(event, "description"),
                    track: child_text(event, "track"),
                    url: child_text(event, "url"),
                });
            }
        }
    }

    Ok(events)
}

/// Read the media feed through the RSS parser into plain items.
pub fn parse_media(bytes: &[u8]) -> anyhow::Result<Vec<MediaItem>> {
    let channel = rss::Channel::read_from(bytes).context("parse media feed")?;
    let items = channel
        .items()
        .iter()
        .map(|item| MediaItem {
            title: item.title().unwrap_or_default().to_owned(),
            pub_date: item.pub_date().unwrap_or_default().to_owned(),
            description: item.description().unwrap_or_default().to_owned(),
            enclosure: item.enclosure().map(|enclosure| MediaEnclosure {
                url: enclosure.url().to_owned(),
                mime_type: enclosure.mime_type().to_owned(),
                length: enclosure.length().to_owned(),
            }),
        })
        .collect();
    Ok(items)
}

fn child_text(node: roxmltree::Node, name: &str) -> String {
    node.children()
        .find(|child| child.has_tag_name(name))
        .and_then(|child| child.text())
        .unwrap_or_default()
        .trim()
        .to_owned()
}

fn speaker_names(event: roxmltree::Node) -> Vec<String> {
    let Some(persons) = event.children().find(|node| node.has_tag_name("persons")) else {
        return Vec::new();
    };
    persons
        .children()
        .filter(|node| node.has_tag_name("person"))
        .filter_map(|person| person.text())
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<schedule>
  <conference><title>Example Congress</title></conference>
  <day index="1">
    <room name="Hall 1">
      <event id="101">
        <title>Intro to Widgets (38c3)</title>
        <subtitle>A gentle start</subtitle>
        <persons>
          <person id="7">Alice</person>
          <person id="8">Bob</person>
        </persons>
        <description>All about widgets.</description>
        <track>Security</track>
        <url>https://example.org/event/101.html</url>
      </event>
      <event id="102">
        <title>Bare Minimum Talk</title>
      </event>
      <event id="103">
        <title>   </title>
      </event>
    </room>
  </day>
  <day index="2">
    <room name="Hall 2">
      <event id="201">
        <title>Second Day Talk</title>
        <track>Ethics</track>
      </event>
    </room>
  </day>
</schedule>
"#;

    const MEDIA_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Recordings</title>
    <link>https://example.org/</link>
    <description>Recordings</description>
    <item>
      <title>INTRO TO WIDGETS</title>
      <pubDate>Tue, 31 Dec 2024 10:00:00 +0000</pubDate>
      <description>Recording of the widgets talk.</description>
      <enclosure url="https://cdn.example.org/widgets.mp4" length="123456" type="video/mp4"/>
    </item>
    <item>
      <title>Second Day Talk</title>
      <description>No enclosure yet.</description>
    </item>
  </channel>
</rss>
"#;

    #[test]
    fn schedule_events_in_document_order() -> anyhow::Result<()> {
        let events = parse_schedule(SCHEDULE_XML)?;
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Intro to Widgets (38c3)", "Bare Minimum Talk", "Second Day Talk"]
        );
        Ok(())
    }

    #[test]
    fn schedule_event_fields_are_extracted() -> anyhow::Result<()> {
        let events = parse_schedule(SCHEDULE_XML)?;
        let event = &events[0];
        assert_eq!(event.id, "101");
        assert_eq!(event.subtitle, "A gentle start");
        assert_eq!(event.speakers, vec!["Alice", "Bob"]);
        assert_eq!(event.description, "All about widgets.");
        assert_eq!(event.track, "Security");
        assert_eq!(event.url, "https://example.org/event/101.html");
        Ok(())
    }

    #[test]
    fn absent_children_become_empty_fields() -> anyhow::Result<()> {
        let events = parse_schedule(SCHEDULE_XML)?;
        let bare = &events[1];
        assert_eq!(bare.subtitle, "");
        assert!(bare.speakers.is_empty());
        assert_eq!(bare.description, "");
        assert_eq!(bare.track, "");
        assert_eq!(bare.url, "");
        Ok(())
    }

    #[test]
    fn untitled_events_are_skipped() -> anyhow::Result<()> {
        let events = parse_schedule(SCHEDULE_XML)?;
        assert!(events.iter().all(|e| e.id != "103"));
        Ok(())
    }

    #[test]
    fn non_schedule_root_is_an_error() {
        assert!(parse_schedule("<rss><channel/></rss>").is_err());
    }

    #[test]
    fn media_items_carry_optional_enclosures() -> anyhow::Result<()> {
        let items = parse_media(MEDIA_XML.as_bytes())?;
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "INTRO TO WIDGETS");
        assert_eq!(first.pub_date, "Tue, 31 Dec 2024 10:00:00 +0000");
        let enclosure = first.enclosure.as_ref().expect("enclosure");
        assert_eq!(enclosure.url, "https://cdn.example.org/widgets.mp4");
        assert_eq!(enclosure.mime_type, "video/mp4");
        assert_eq!(enclosure.length, "123456");

        assert!(items[1].enclosure.is_none());
        Ok(())
    }
}
