use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::NewEventArgs;
use crate::config::{self, AppConfig, EventConfig};
use crate::fetch;
use crate::formats::{FeedMeta, FeedStore};
use crate::store;
use crate::validate;

/// Create a new event configuration: derive the id, probe the known
/// schedule URL patterns, append the event to `config.yaml` and initialize
/// its store file.
pub async fn run(args: NewEventArgs) -> anyhow::Result<()> {
    let congress_number = match args.congress_number {
        Some(number) => number,
        None => {
            let config = config::load_config(Path::new(config::CONFIG_FILE))
                .context("load configuration to calculate the congress number")?;
            let number = config::calculate_congress_number(&config, args.year)?;
            println!(
                "Auto-calculated congress number: {number} \
                 (based on the most recent event in config)"
            );
            number
        }
    };
    let event_id = format!("{congress_number}c3");

    let patterns = schedule_url_patterns(args.year, &event_id);
    let pattern_names = ["schedules path", "pretalx export", "standard path"];
    let podcast_url = format!("https://media.ccc.de/c/{event_id}/podcast/mp4-hq.xml");

    let mut fahrplan_url = patterns[0].clone();
    let mut all_valid = true;

    if !args.no_validate {
        let client = fetch::http_client()?;

        if args.try_all_patterns {
            println!("\n🔍 Trying all known URL patterns...\n");
        }
        let mut working = None;
        for (idx, candidate) in patterns.iter().enumerate() {
            if args.try_all_patterns {
                println!("Pattern {} - {}:", idx + 1, pattern_names[idx]);
                println!("  {candidate}");
            }
            let result = validate::validate_schedule_url(&client, candidate).await;
            if result.is_success() {
                if args.try_all_patterns {
                    println!(
                        "  ✓ Works! (HTTP {}, valid XML, has events)\n",
                        result.status_display()
                    );
                }
                working = Some(candidate.clone());
                if !args.try_all_patterns {
                    break;
                }
            } else if args.try_all_patterns {
                println!("  ✗ Failed: {}\n", result.failure_reason());
            }
        }
        match working {
            Some(url) => {
                fahrplan_url = url;
                if args.try_all_patterns {
                    println!("✅ Selected working pattern: {fahrplan_url}\n");
                } else {
                    println!("✓ fahrplan_url: OK (valid XML, has events)");
                }
            }
            None => {
                all_valid = false;
                if args.try_all_patterns {
                    println!("⚠️  No patterns worked. Using default: {fahrplan_url}\n");
                } else {
                    println!("✗ fahrplan_url: no known URL pattern worked");
                }
            }
        }

        println!("Validating podcast URL...");
        let podcast_result = validate::validate_podcast_url(&client, &podcast_url).await;
        if podcast_result.is_success() {
            println!(
                "✓ media_feed_url: OK (HTTP {}, valid RSS, has items)",
                podcast_result.status_display()
            );
        } else {
            println!("✗ media_feed_url: {}", podcast_result.failure_reason());
            all_valid = false;
        }
    }

    let event_config = EventConfig {
        year: args.year,
        congress_number,
        fahrplan_url,
        media_feed_url: podcast_url,
        event_pattern_head: None,
        event_pattern_tail: None,
    };

    if !args.no_validate && !all_valid {
        println!("\n✗ Validation failed. Event not added to config.yaml");
        print_manual_config(&event_id, &event_config);
        return Ok(());
    }

    let config_path = PathBuf::from(config::CONFIG_FILE);
    let mut config = if config_path.exists() {
        config::load_config(&config_path).context("load configuration")?
    } else {
        AppConfig::default()
    };

    if config.events.contains_key(&event_id) {
        eprintln!("\n⚠ Event '{event_id}' already exists in config.yaml");
        println!(
            "Event was not added. Remove the existing entry first if you want to replace it."
        );
        return Ok(());
    }
    config.events.insert(event_id.clone(), event_config);

    let yaml = serde_yaml::to_string(&config).context("serialize config yaml")?;
    store::atomic_write(&config_path, &yaml).context("write config.yaml")?;
    println!("\n✓ Event '{event_id}' added to config.yaml successfully!");

    if let Err(err) = initialize_store_file(&event_id, args.year).await {
        eprintln!("\n⚠️  Warning: failed to initialize media file: {err:#}");
        println!("You can manually create media/media_{event_id}.yml later.");
    }
    Ok(())
}

/// Known schedule URL layouts, newest first.
fn schedule_url_patterns(year: i32, event_id: &str) -> [String; 3] {
    [
        format!("https://fahrplan.events.ccc.de/congress/{year}/fahrplan/schedules/schedule.xml"),
        format!("https://pretalx.c3voc.de/{event_id}/schedule/export/schedule.xml"),
        format!("https://fahrplan.events.ccc.de/congress/{year}/fahrplan/schedule.xml"),
    ]
}

async fn initialize_store_file(event_id: &str, year: i32) -> anyhow::Result<()> {
    let media_dir = PathBuf::from(crate::build::MEDIA_DIR);
    std::fs::create_dir_all(&media_dir).context("create media directory")?;
    let media_file = media_dir.join(format!("media_{event_id}.yml"));
    if media_file.exists() {
        println!("✓ Media file already exists: {}", media_file.display());
        return Ok(());
    }

    let client = fetch::http_client()?;
    let logo_url = format!("https://static.media.ccc.de/media/congress/{year}/logo.png");
    let logo_exists = fetch::check_url_exists(&client, &logo_url).await;
    if !logo_exists {
        eprintln!("⚠️  Warning: event logo not found at {logo_url}");
        eprintln!("  Note: podcast clients require PNG/JPG artwork (SVG is not supported)");
    }

    let event_name = event_id.to_uppercase();
    let data = FeedStore {
        meta: FeedMeta {
            title: format!("{event_name} media feed"),
            description: format!(
                "A curated feed for different talks of the {event_name} \
                 (Chaos Communication Congress {year})."
            ),
            image_url: logo_exists.then_some(logo_url),
        },
        feed: Vec::new(),
    };
    store::save_store(&media_file, &data)?;
    println!("✓ Created media file: {}", media_file.display());
    if !logo_exists {
        println!(
            "  You can manually add image_url to {} when available",
            media_file.display()
        );
    }
    Ok(())
}

fn print_manual_config(event_id: &str, event: &EventConfig) {
    println!("\nYou can manually add the following to config.yaml:");
    println!("{event_id}:");
    println!("  year: {}", event.year);
    println!("  congress_number: {}", event.congress_number);
    println!("  fahrplan_url: {}", event.fahrplan_url);
    println!("  media_feed_url: {}", event.media_feed_url);
}
