use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::AddArgs;
use crate::config::{self, AppConfig, EventConfig};
use crate::fetch;
use crate::rate;
use crate::search::{self, SearchOutcome};
use crate::sources;
use crate::store;

/// Search an event's schedule for a talk, pair it with its recording from
/// the media feed, and prepend the merged record to the store file.
pub async fn run(args: AddArgs) -> anyhow::Result<()> {
    let config = config::load_config(Path::new(config::CONFIG_FILE))
        .context("load configuration")?;
    let (event_key, event_config) = resolve_event(&config, args.event.as_deref(), args.year)?;

    let client = fetch::http_client()?;
    let schedule_bytes = fetch::download_with_cache(&client, &event_config.fahrplan_url)
        .await
        .context("fetch schedule document")?;
    let media_bytes = fetch::download_with_cache(&client, &event_config.media_feed_url)
        .await
        .context("fetch media feed")?;

    let schedule_xml = String::from_utf8_lossy(&schedule_bytes);
    let schedule = sources::parse_schedule(&schedule_xml).context("parse schedule document")?;
    let media = sources::parse_media(&media_bytes).context("parse media feed")?;

    let outcome = search::find_talk(
        &args.query,
        &schedule,
        &media,
        event_config,
        &config.global.category_mapping,
        args.long_desc,
    );
    let mut entry = match outcome {
        SearchOutcome::Found(entry) => entry,
        SearchOutcome::NoScheduleMatch => {
            eprintln!(
                "✗ No matching talk found for '{}' in {} (Congress #{}, {})",
                args.query,
                event_key.to_uppercase(),
                event_config.congress_number,
                event_config.year
            );
            eprintln!(
                "  Tip: try a shorter or more specific search term, or check the schedule at {}",
                event_config.fahrplan_url
            );
            return Ok(());
        }
        SearchOutcome::NoMediaMatch { schedule_title } => {
            eprintln!(
                "✗ Found '{schedule_title}' in the schedule, but no recording in the media feed"
            );
            eprintln!(
                "  The recording may not be published yet; check {}",
                event_config.media_feed_url
            );
            return Ok(());
        }
    };

    if let Some(categories) = &args.categories
        && let Some(first) = categories.split(',').map(str::trim).find(|c| !c.is_empty())
    {
        entry.category = first.to_owned();
    }

    println!("\n✓ Found talk:");
    println!("  Title: {}", entry.title);
    println!("  Speakers: {}", entry.speakers);
    println!("  Category: {}", entry.category);

    if !args.no_rate && std::io::stdin().is_terminal() {
        println!("\n{}", "━".repeat(50));
        if rate::confirm("Would you like to rate this talk?", true)? {
            let username = rate::prompt_optional("Username (optional, press Enter to skip)")?;
            if let Some(feedback) = rate::prompt_for_feedback(username.as_deref())? {
                entry.feedback.push(feedback);
                println!("✓ Rating saved");
            }
        }
    }

    let output_file = match &args.output {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(format!("media/media_{event_key}.yml")),
    };
    if !output_file.exists() {
        anyhow::bail!(
            "store file not found: {} (run new-event first)",
            output_file.display()
        );
    }

    let mut data = store::load_store(&output_file)
        .with_context(|| format!("load store: {}", output_file.display()))?;
    data.feed.insert(0, entry);
    store::save_store(&output_file, &data)
        .with_context(|| format!("save store: {}", output_file.display()))?;

    println!("\n✓ Added entry to {}", output_file.display());
    Ok(())
}

fn resolve_event<'a>(
    config: &'a AppConfig,
    event: Option<&str>,
    year: Option<i32>,
) -> anyhow::Result<(&'a str, &'a EventConfig)> {
    if let Some(key) = event {
        return config
            .events
            .get_key_value(key)
            .map(|(key, event)| (key.as_str(), event))
            .ok_or_else(|| anyhow::anyhow!("event '{key}' not found in configuration"));
    }
    if let Some(year) = year {
        return config::event_by_year(config, year)
            .ok_or_else(|| anyhow::anyhow!("no event configured for year {year}"));
    }
    config::latest_event(config)
}
