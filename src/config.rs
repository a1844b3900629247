use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::category::CategoryMapping;
use crate::store;

pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub events: BTreeMap<String, EventConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "CategoryMapping::is_empty")]
    pub category_mapping: CategoryMapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub year: i32,
    pub congress_number: u32,
    pub fahrplan_url: String,
    pub media_feed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_pattern_head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_pattern_tail: Option<String>,
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = store::read_capped(path, store::MAX_STORE_FILE_SIZE)
        .with_context(|| format!("read configuration: {}", path.display()))?;
    let config: AppConfig =
        serde_yaml::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
    validate_config(&config)?;
    tracing::info!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Structural validation. Hard errors abort; missing recommended keys are
/// only logged.
pub fn validate_config(config: &AppConfig) -> anyhow::Result<()> {
    match &config.global.contact {
        None => tracing::warn!("missing recommended global config key: contact"),
        Some(contact) if contact.email.is_none() => {
            tracing::warn!("missing 'email' in global.contact");
        }
        Some(_) => {}
    }
    if config.global.author.is_none() {
        tracing::warn!("missing recommended global config key: author");
    }
    if config.global.link.is_none() {
        tracing::warn!("missing recommended global config key: link");
    }
    if config.global.language.is_none() {
        tracing::warn!("missing recommended global config key: language");
    }

    if config.events.is_empty() {
        tracing::warn!("no events configured");
        return Ok(());
    }

    for (event_key, event) in &config.events {
        validate_event_config(event_key, event)?;
    }
    Ok(())
}

fn validate_event_config(event_key: &str, event: &EventConfig) -> anyhow::Result<()> {
    for (key, value) in [
        ("fahrplan_url", &event.fahrplan_url),
        ("media_feed_url", &event.media_feed_url),
    ] {
        let url = Url::parse(value)
            .with_context(|| format!("event '{event_key}': {key} is not a valid URL"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("event '{event_key}': {key} must be an http(s) URL");
        }
    }

    if event.event_pattern_head.is_some() != event.event_pattern_tail.is_some() {
        anyhow::bail!(
            "event '{event_key}': 'event_pattern_head' and 'event_pattern_tail' \
             must be provided together, or both omitted"
        );
    }
    Ok(())
}

pub fn event_by_year(config: &AppConfig, year: i32) -> Option<(&str, &EventConfig)> {
    config
        .events
        .iter()
        .find(|(_, event)| event.year == year)
        .map(|(key, event)| (key.as_str(), event))
}

pub fn latest_event(config: &AppConfig) -> anyhow::Result<(&str, &EventConfig)> {
    config
        .events
        .iter()
        .max_by_key(|(_, event)| event.year)
        .map(|(key, event)| (key.as_str(), event))
        .ok_or_else(|| anyhow::anyhow!("no events configured"))
}

/// Extrapolate the congress number for `year` from the most recent
/// configured event, assuming annual congresses.
pub fn calculate_congress_number(config: &AppConfig, year: i32) -> anyhow::Result<u32> {
    let (_, latest) = latest_event(config).context("cannot calculate congress number")?;
    let number = i64::from(latest.congress_number) + i64::from(year - latest.year);
    u32::try_from(number)
        .map_err(|_| anyhow::anyhow!("calculated congress number {number} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(year: i32, congress_number: u32) -> EventConfig {
        EventConfig {
            year,
            congress_number,
            fahrplan_url: "https://example.org/schedule.xml".to_owned(),
            media_feed_url: "https://example.org/podcast.xml".to_owned(),
            event_pattern_head: None,
            event_pattern_tail: None,
        }
    }

    fn config_with_events(events: Vec<(&str, EventConfig)>) -> AppConfig {
        AppConfig {
            global: GlobalConfig::default(),
            events: events
                .into_iter()
                .map(|(key, event)| (key.to_owned(), event))
                .collect(),
        }
    }

    #[test]
    fn parses_a_full_config() -> anyhow::Result<()> {
        let yaml = r#"
global:
  contact:
    email: feed@example.org
  author: Example Curator
  link: https://example.org/
  language: en
  category_mapping:
    "Society & Politics": [Security, Ethics]
    _default: [Technology]
events:
  38c3:
    year: 2024
    congress_number: 38
    fahrplan_url: https://example.org/schedule.xml
    media_feed_url: https://example.org/podcast.xml
"#;
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        validate_config(&config)?;
        assert_eq!(config.events["38c3"].congress_number, 38);
        assert_eq!(
            config.global.category_mapping.classify("Ethics"),
            vec!["Society & Politics"]
        );
        Ok(())
    }

    #[test]
    fn pattern_halves_must_come_together() {
        let mut lonely = event(2024, 38);
        lonely.event_pattern_head = Some("https://example.org/event/".to_owned());
        let config = config_with_events(vec![("38c3", lonely)]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let mut bad = event(2024, 38);
        bad.fahrplan_url = "ftp://example.org/schedule.xml".to_owned();
        let config = config_with_events(vec![("38c3", bad)]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn latest_event_picks_the_highest_year() -> anyhow::Result<()> {
        let config =
            config_with_events(vec![("37c3", event(2023, 37)), ("38c3", event(2024, 38))]);
        let (key, _) = latest_event(&config)?;
        assert_eq!(key, "38c3");
        Ok(())
    }

    #[test]
    fn latest_event_requires_events() {
        let config = config_with_events(Vec::new());
        assert!(latest_event(&config).is_err());
    }

    #[test]
    fn event_lookup_by_year() {
        let config =
            config_with_events(vec![("37c3", event(2023, 37)), ("38c3", event(2024, 38))]);
        assert_eq!(event_by_year(&config, 2023).map(|(key, _)| key), Some("37c3"));
        assert!(event_by_year(&config, 1999).is_none());
    }

    #[test]
    fn congress_number_extrapolates_from_the_latest_event() -> anyhow::Result<()> {
        let config = config_with_events(vec![("38c3", event(2024, 38))]);
        assert_eq!(calculate_congress_number(&config, 2025)?, 39);
        assert_eq!(calculate_congress_number(&config, 2023)?, 37);
        Ok(())
    }
}
