// # File IP Cache
//
// File-backed implementation of IpCache.
//
// ## File Format
//
// The file holds exactly one IP address as plain text, e.g. `1.2.3.4`.
// A trailing newline is tolerated when reading and never written.
//
// ## Failure Handling
//
// - Missing file: treated as "no previous IP"
// - Empty or unparseable contents: logged, treated as "no previous IP"
// - Writes go to a sibling `.tmp` file which is then renamed over the
//   cache, so a crash mid-write leaves the old value in place

use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::IpCache;

/// Default location of the cache file
pub const DEFAULT_CACHE_PATH: &str = "/var/lib/iprefresher/lastip";

/// IP cache persisted to a single plain-text file
///
/// # Example
///
/// ```rust,no_run
/// use iprefresher_core::cache::FileIpCache;
/// use iprefresher_core::traits::IpCache;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = FileIpCache::new("/var/lib/iprefresher/lastip");
///
///     cache.write("1.2.3.4".parse()?).await?;
///     assert_eq!(cache.read().await?, Some("1.2.3.4".parse()?));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileIpCache {
    path: PathBuf,
}

impl FileIpCache {
    /// Create a cache backed by `path`
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    async fn ensure_parent_dir(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl IpCache for FileIpCache {
    async fn read(&self) -> Result<Option<IpAddr>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist yet: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::cache(format!(
                    "Failed to read cache file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let text = content.trim();
        if text.is_empty() {
            return Ok(None);
        }

        match text.parse::<IpAddr>() {
            Ok(ip) => Ok(Some(ip)),
            Err(_) => {
                tracing::warn!(
                    "Cache file {} does not contain an IP address, ignoring it",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    async fn write(&self, ip: IpAddr) -> Result<(), Error> {
        self.ensure_parent_dir().await?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.to_string().as_bytes()).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::cache(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Cached IP {} in {}", ip, self.path.display());
        Ok(())
    }
}
