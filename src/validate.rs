use reqwest::header::USER_AGENT;

use crate::fetch;

/// Outcome of probing a source URL: HTTP status, whether the body parsed,
/// and whether it actually contains events/items.
#[derive(Debug)]
pub struct UrlValidation {
    pub url: String,
    pub status: Option<u16>,
    pub valid_xml: bool,
    pub has_content: bool,
    pub error: Option<String>,
}

impl UrlValidation {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            status: None,
            valid_xml: false,
            has_content: false,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(200) && self.valid_xml && self.has_content && self.error.is_none()
    }

    pub fn status_display(&self) -> String {
        match self.status {
            Some(status) => status.to_string(),
            None => "-".to_owned(),
        }
    }

    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| format!("HTTP {}", self.status_display()))
    }
}

pub async fn validate_schedule_url(client: &reqwest::Client, url: &str) -> UrlValidation {
    validate_url(client, url, check_schedule_content).await
}

pub async fn validate_podcast_url(client: &reqwest::Client, url: &str) -> UrlValidation {
    validate_url(client, url, check_podcast_content).await
}

async fn validate_url(
    client: &reqwest::Client,
    url: &str,
    check: fn(&str) -> (bool, bool, Option<String>),
) -> UrlValidation {
    let mut result = UrlValidation::new(url);

    let response = match client
        .get(url)
        .header(USER_AGENT, fetch::HTTP_USER_AGENT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            result.error = Some(err.to_string());
            return result;
        }
    };

    let status = response.status().as_u16();
    result.status = Some(status);
    if status != 200 {
        result.error = Some(format!("HTTP {status}"));
        return result;
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            result.error = Some(err.to_string());
            return result;
        }
    };

    let (valid_xml, has_content, error) = check(&body);
    result.valid_xml = valid_xml;
    result.has_content = has_content;
    result.error = error;
    result
}

fn check_schedule_content(content: &str) -> (bool, bool, Option<String>) {
    let doc = match roxmltree::Document::parse(content) {
        Ok(doc) => doc,
        Err(err) => return (false, false, Some(format!("XML parse error: {err}"))),
    };

    let root = doc.root_element();
    if root.tag_name().name() != "schedule" {
        return (true, false, Some("root element is not 'schedule'".to_owned()));
    }
    if !root.children().any(|node| node.has_tag_name("conference")) {
        return (true, false, Some("missing 'conference' element".to_owned()));
    }

    let days: Vec<_> = root
        .children()
        .filter(|node| node.has_tag_name("day"))
        .collect();
    if days.is_empty() {
        return (true, false, Some("no 'day' elements found".to_owned()));
    }

    let mut events = 0usize;
    for day in &days {
        for room in day.children().filter(|node| node.has_tag_name("room")) {
            events += room
                .children()
                .filter(|node| node.has_tag_name("event"))
                .count();
        }
    }
    if events == 0 {
        return (true, false, Some("no events found in schedule".to_owned()));
    }

    (true, true, None)
}

fn check_podcast_content(content: &str) -> (bool, bool, Option<String>) {
    let channel = match rss::Channel::read_from(content.as_bytes()) {
        Ok(channel) => channel,
        Err(err) => return (false, false, Some(format!("RSS parse error: {err}"))),
    };

    if channel.items().is_empty() {
        return (
            true,
            false,
            Some("no 'item' elements found in feed".to_owned()),
        );
    }

    let has_enclosure = channel.items().iter().any(|item| item.enclosure().is_some());
    if !has_enclosure {
        return (
            true,
            true,
            Some("no items have media enclosures".to_owned()),
        );
    }

    (true, true, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_check_accepts_a_populated_schedule() {
        let xml = r#"<schedule>
  <conference><title>Congress</title></conference>
  <day><room><event id="1"><title>Talk</title></event></room></day>
</schedule>"#;
        assert_eq!(check_schedule_content(xml), (true, true, None));
    }

    #[test]
    fn schedule_check_flags_missing_pieces() {
        let (valid, has_content, error) = check_schedule_content("<rss/>");
        assert!(valid);
        assert!(!has_content);
        assert_eq!(error.as_deref(), Some("root element is not 'schedule'"));

        let empty = "<schedule><conference/><day><room/></day></schedule>";
        let (_, has_content, error) = check_schedule_content(empty);
        assert!(!has_content);
        assert_eq!(error.as_deref(), Some("no events found in schedule"));
    }

    #[test]
    fn schedule_check_rejects_malformed_xml() {
        let (valid, _, error) = check_schedule_content("<schedule><broken");
        assert!(!valid);
        assert!(error.is_some());
    }

    #[test]
    fn podcast_check_accepts_items_with_enclosures() {
        let xml = r#"<rss version="2.0"><channel>
  <title>Feed</title><link>https://example.org/</link><description>d</description>
  <item><title>Talk</title>
    <enclosure url="https://cdn.example.org/t.mp4" length="1" type="video/mp4"/>
  </item>
</channel></rss>"#;
        let (valid, has_content, error) = check_podcast_content(xml);
        assert!(valid);
        assert!(has_content);
        assert!(error.is_none());
    }

    #[test]
    fn podcast_check_warns_without_enclosures() {
        let xml = r#"<rss version="2.0"><channel>
  <title>Feed</title><link>https://example.org/</link><description>d</description>
  <item><title>Talk</title></item>
</channel></rss>"#;
        let (valid, has_content, error) = check_podcast_content(xml);
        assert!(valid);
        assert!(has_content);
        assert_eq!(error.as_deref(), Some("no items have media enclosures"));
    }

    #[test]
    fn podcast_check_flags_empty_feeds() {
        let xml = r#"<rss version="2.0"><channel>
  <title>Feed</title><link>https://example.org/</link><description>d</description>
</channel></rss>"#;
        let (_, has_content, error) = check_podcast_content(xml);
        assert!(!has_content);
        assert_eq!(error.as_deref(), Some("no 'item' elements found in feed"));
    }
}
