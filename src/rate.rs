use std::path::PathBuf;

use anyhow::Context as _;
use dialoguer::{Confirm, Input};

use crate::cli::RateArgs;
use crate::formats::FeedbackEntry;
use crate::store;

pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Interactive rating pass over every talk in a store file. The username
/// is asked once; each talk gets an optional 1-5 rating and comment, and
/// the store is saved once at the end.
pub fn run(args: RateArgs) -> anyhow::Result<()> {
    let path = PathBuf::from(&args.event_file);
    let mut data = store::load_store(&path)
        .with_context(|| format!("load store: {}", path.display()))?;
    if data.feed.is_empty() {
        anyhow::bail!("no feed items found in {}", path.display());
    }

    println!("\n📝 Interactive Rating Mode");
    println!("{}", "━".repeat(50));
    let username = prompt_optional("Username (optional, press Enter to skip)")?;
    match &username {
        Some(name) => println!("\nRating as: {name}\n"),
        None => println!("\nRating anonymously\n"),
    }

    let total = data.feed.len();
    let mut rated = 0usize;
    let mut skipped = 0usize;

    for (idx, item) in data.feed.iter_mut().enumerate() {
        println!("{}", "━".repeat(50));
        println!("\n🎬 {} ({}/{total})", item.title, idx + 1);
        if !item.speakers.is_empty() {
            println!("   Speakers: {}", item.speakers);
        }
        println!();

        match prompt_for_feedback(username.as_deref())? {
            Some(entry) => {
                item.feedback.push(entry);
                println!("✓ Saved");
                rated += 1;
            }
            None => {
                println!("⏭️  Skipped");
                skipped += 1;
            }
        }
    }

    store::save_store(&path, &data)
        .with_context(|| format!("save store: {}", path.display()))?;

    println!("\n{}", "━".repeat(50));
    println!("\n✅ Rating complete!");
    println!("   Rated: {rated}");
    println!("   Skipped: {skipped}");
    println!("\n💾 Saved to: {}\n", path.display());
    Ok(())
}

/// Ask for a single rating and comment. `None` when the user skips or the
/// rating is invalid.
pub fn prompt_for_feedback(username: Option<&str>) -> anyhow::Result<Option<FeedbackEntry>> {
    let rating_input: String = Input::new()
        .with_prompt("Rate this talk (1-5, Enter to skip)")
        .allow_empty(true)
        .interact_text()
        .context("read rating")?;
    let rating_input = rating_input.trim();
    if rating_input.is_empty() {
        return Ok(None);
    }

    let rating = match rating_input.parse::<u8>() {
        Ok(rating) if (1..=5).contains(&rating) => rating,
        _ => {
            eprintln!("⚠️  Invalid rating (must be 1-5). Skipping.");
            return Ok(None);
        }
    };

    let comment_raw: String = Input::new()
        .with_prompt("Comment (optional, Enter to skip)")
        .allow_empty(true)
        .interact_text()
        .context("read comment")?;

    let mut entry = FeedbackEntry::rated(rating);
    if let Some(name) = username {
        match sanitize_username(name) {
            Ok(name) => entry.username = Some(name),
            Err(err) => eprintln!("⚠️  Invalid username: {err}"),
        }
    }
    let comment = sanitize_comment(&comment_raw);
    if !comment.is_empty() {
        entry.comment = Some(comment);
    }

    Ok(Some(entry))
}

pub fn prompt_optional(prompt: &str) -> anyhow::Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .context("read input")?;
    let input = input.trim();
    Ok(if input.is_empty() {
        None
    } else {
        Some(input.to_owned())
    })
}

pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .context("read confirmation")
}

/// Strip control characters and cap the length; empty results are an
/// error since an empty username should stay absent instead.
pub fn sanitize_username(username: &str) -> anyhow::Result<String> {
    if username.is_empty() {
        anyhow::bail!("username cannot be empty");
    }

    let stripped: String = username.chars().filter(|c| !c.is_control()).collect();
    let sanitized: String = stripped.trim().chars().take(MAX_USERNAME_LENGTH).collect();
    if sanitized.is_empty() {
        anyhow::bail!("username contains only invalid characters");
    }
    Ok(sanitized)
}

/// Strip control characters except newlines and tabs, then cap the length.
pub fn sanitize_comment(comment: &str) -> String {
    let stripped: String = comment
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    stripped.trim().chars().take(MAX_COMMENT_LENGTH).collect()
}
