use std::path::PathBuf;

use crate::cli::ListArgs;
use crate::feedback;
use crate::store;

struct RatedTalk {
    title: String,
    event: String,
    category: String,
    average: f64,
    num_ratings: usize,
}

/// Print rated talks across store files as a table, best first.
pub fn run(args: ListArgs) -> anyhow::Result<()> {
    let files = match &args.event {
        Some(event) if event.contains('/') || event.ends_with(".yml") => {
            vec![PathBuf::from(event)]
        }
        Some(event) => vec![PathBuf::from(format!(
            "{}/media_{}.yml",
            crate::build::MEDIA_DIR,
            event.to_lowercase()
        ))],
        None => crate::build::store_files_in(crate::build::MEDIA_DIR)?,
    };
    if files.is_empty() {
        anyhow::bail!("no store files found");
    }

    let mut talks = Vec::new();
    for path in &files {
        if !path.exists() {
            continue;
        }
        let data = match store::load_store(path) {
            Ok(data) => data,
            Err(err) => {
                eprintln!("⚠️  Failed to load {}: {err:#}", path.display());
                continue;
            }
        };

        let event_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
            .replace("media_", "")
            .to_uppercase();

        for item in &data.feed {
            let Some(average) = feedback::average_rating(&item.feedback) else {
                continue;
            };
            if let Some(min_rating) = args.min_rating
                && average < min_rating
            {
                continue;
            }
            if let Some(category) = &args.category
                && !item.category.eq_ignore_ascii_case(category)
            {
                continue;
            }

            talks.push(RatedTalk {
                title: if item.title.is_empty() {
                    "Untitled".to_owned()
                } else {
                    item.title.clone()
                },
                event: event_name.clone(),
                category: item.category.clone(),
                average,
                num_ratings: item
                    .feedback
                    .iter()
                    .filter(|entry| entry.rating.is_some())
                    .count(),
            });
        }
    }

    talks.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if talks.is_empty() {
        println!("\nNo rated talks found.\n");
        return Ok(());
    }

    println!("\n{}", "━".repeat(95));
    println!(
        "{:<8} {:<40} {:<14} {:<8} {:<10}",
        "Rating", "Title", "Category", "Event", "# Ratings"
    );
    println!("{}", "━".repeat(95));
    for talk in &talks {
        println!(
            "{:<8} {:<40} {:<14} {:<8} {:<10}",
            format!("{:.1}/5", talk.average),
            clip(&talk.title, 40, 37),
            clip(&talk.category, 14, 11),
            talk.event,
            talk.num_ratings
        );
    }
    println!("{}", "━".repeat(95));
    println!("\nTotal: {} rated talk(s)\n", talks.len());
    Ok(())
}

fn clip(text: &str, max: usize, keep: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(keep).collect();
        format!("{head}...")
    } else {
        text.to_owned()
    }
}
