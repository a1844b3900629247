use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::USER_AGENT;
use sha2::Digest as _;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const HTTP_USER_AGENT: &str = "talkfeed/0.1";
pub const MAX_DOWNLOAD_SIZE: u64 = 100 * 1024 * 1024;

const CACHE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("build http client")
}

/// Per-user cache directory, overridable via `TALKFEED_CACHE_DIR`.
pub fn cache_directory() -> anyhow::Result<PathBuf> {
    let dir = match std::env::var_os("TALKFEED_CACHE_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("no user cache directory available"))?
            .join("talkfeed"),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create cache dir: {}", dir.display()))?;
    Ok(dir)
}

/// Cache file name for a URL: SHA-256 of the URL plus an extension, so
/// arbitrary URLs map to flat, collision-free file names.
pub fn cache_file_name(url: &str, extension: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(url.as_bytes());
    format!("{}{extension}", hex::encode(hasher.finalize()))
}

fn cache_path(url: &str, extension: &str) -> anyhow::Result<PathBuf> {
    Ok(cache_directory()?.join(cache_file_name(url, extension)))
}

fn is_cache_valid(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    let age = modified.elapsed().unwrap_or_default();
    if age > CACHE_MAX_AGE {
        tracing::debug!(path = %path.display(), "cache entry expired");
        return false;
    }
    true
}

fn read_cache(path: &Path, max_size: u64) -> Option<Vec<u8>> {
    if !is_cache_valid(path) {
        return None;
    }
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.len() > max_size => {
            tracing::warn!(
                path = %path.display(),
                size = metadata.len(),
                "cached file exceeds the size limit, ignoring"
            );
            return None;
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "failed to stat cache entry");
            return None;
        }
    }
    match std::fs::read(path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "cache hit");
            Some(content)
        }
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "failed to read cache entry");
            None
        }
    }
}

fn write_cache(path: &Path, content: &[u8]) {
    if let Err(err) = std::fs::write(path, content) {
        tracing::warn!(?err, path = %path.display(), "failed to write cache entry");
    } else {
        tracing::debug!(path = %path.display(), "cached");
    }
}

/// Download a source document, serving a fresh-enough cached copy when
/// one exists. Cache failures degrade to a re-download, never an error.
pub async fn download_with_cache(
    client: &reqwest::Client,
    url: &str,
) -> anyhow::Result<Vec<u8>> {
    let cache = cache_path(url, ".xml")?;
    if let Some(content) = read_cache(&cache, MAX_DOWNLOAD_SIZE) {
        return Ok(content);
    }

    tracing::info!(url, "downloading");
    let response = client
        .get(url)
        .header(USER_AGENT, HTTP_USER_AGENT)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url}"))?;

    if let Some(length) = response.content_length()
        && length > MAX_DOWNLOAD_SIZE
    {
        anyhow::bail!("content size ({length} bytes) exceeds maximum ({MAX_DOWNLOAD_SIZE} bytes)");
    }

    let mut response = response;
    let mut content = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("read body: {url}"))?
    {
        content.extend_from_slice(&chunk);
        if content.len() as u64 > MAX_DOWNLOAD_SIZE {
            anyhow::bail!("downloaded content exceeds maximum size ({MAX_DOWNLOAD_SIZE} bytes)");
        }
    }

    write_cache(&cache, &content);
    tracing::info!(bytes = content.len(), url, "downloaded");
    Ok(content)
}

/// HEAD probe, used to check whether an event logo exists.
pub async fn check_url_exists(client: &reqwest::Client, url: &str) -> bool {
    match client
        .head(url)
        .header(USER_AGENT, HTTP_USER_AGENT)
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(err) => {
            tracing::debug!(?err, url, "url probe failed");
            false
        }
    }
}
