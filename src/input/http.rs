use std::path::Path;

use once_cell::sync::Lazy;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::resolver::ResolveError;

// Shared client. Downloads run without a timeout; a stalled transfer only
// blocks the request that started it.
static HTTP_CLIENT: Lazy<Client> =
    Lazy::new(|| Client::builder().build().expect("failed to create HTTP client"));

/// Streams the body of `url` into `dest`, creating parent directories as
/// needed. Non-success statuses and transport failures are download errors.
pub async fn download(url: &str, dest: &Path) -> Result<(), ResolveError> {
    let fail = |reason: String| ResolveError::Download {
        url: url.to_string(),
        reason,
    };

    let mut response = HTTP_CLIENT.get(url).send().await.map_err(|e| {
        warn!("download failed for {url}: {e}");
        fail(e.to_string())
    })?;

    if !response.status().is_success() {
        let status = response.status();
        warn!("download failed for {url}: HTTP {status}");
        return Err(fail(format!("HTTP status {status}")));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::File::create(dest).await?;
    while let Some(chunk) = response.chunk().await.map_err(|e| fail(e.to_string()))? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
