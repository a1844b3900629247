use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::BuildArgs;
use crate::config::{self, GlobalConfig};
use crate::feed;
use crate::store;

pub const MEDIA_DIR: &str = "media";

/// Generate RSS feeds from store files. Failures are reported per file;
/// one broken store does not abort the rest of the run.
pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let config = config::load_config(Path::new(config::CONFIG_FILE))
        .context("load configuration")?;

    let files = if args.all {
        store_files_in(MEDIA_DIR)?
    } else {
        args.input_files.iter().map(PathBuf::from).collect()
    };
    if files.is_empty() {
        anyhow::bail!("no files to build; pass store files or --all");
    }

    let output_dir = PathBuf::from(&args.output_dir);
    for path in &files {
        if let Err(err) = build_one(path, &output_dir, &config.global, args.all_ratings) {
            eprintln!("✗ Failed {}: {err:#}", path.display());
        }
    }
    Ok(())
}

fn build_one(
    path: &Path,
    output_dir: &Path,
    global: &GlobalConfig,
    all_ratings: bool,
) -> anyhow::Result<()> {
    let data = store::load_store(path)?;

    let report = store::validate_store(&data);
    if report.has_warnings() {
        eprintln!("\n⚠️  Warnings for {}:", display_name(path));
        for warning in &report.warnings {
            eprintln!("   • {warning}");
        }
    }
    if report.has_errors() {
        eprintln!("\n❌ Errors for {}:", display_name(path));
        for error in &report.errors {
            eprintln!("   • {error}");
        }
        anyhow::bail!("validation failed");
    }

    let output_file = output_dir.join(feed_file_name(path));
    let written = feed::generate(&data, global, &output_file, all_ratings)?;
    if written {
        println!("✓ Built: {}", output_file.display());
    } else {
        println!("○ Unchanged: {}", output_file.display());
    }
    Ok(())
}

/// All `media_*.yml` files under `dir`, sorted. Empty when the directory
/// does not exist.
pub fn store_files_in(dir: &str) -> anyhow::Result<Vec<PathBuf>> {
    let dir = Path::new(dir);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read media dir: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with("media_") && name.ends_with(".yml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `media_38c3.yml` becomes `feed_38c3.xml`.
fn feed_file_name(path: &Path) -> String {
    display_name(path)
        .replace("media_", "feed_")
        .replace(".yml", ".xml")
}
