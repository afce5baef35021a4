use std::path::Path;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::resolver::ResolveError;
use crate::config::StorageConfig;

/// Fetches an object from the configured bucket and streams it into `dest`.
pub async fn download(
    config: &StorageConfig,
    key: &str,
    dest: &Path,
) -> Result<(), ResolveError> {
    let credentials = Credentials::from_keys(&config.access_key, &config.secret_key, None);
    let s3_config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .build();
    let client = aws_sdk_s3::Client::from_conf(s3_config);

    let object = client
        .get_object()
        .bucket(&config.bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            let message = format!("{}", DisplayErrorContext(&e));
            warn!("couldn't fetch s3://{key}: {message}");
            ResolveError::Storage(message)
        })?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::File::create(dest).await?;
    let mut body = object.body;
    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| ResolveError::Storage(e.to_string()))?
    {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
