use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

use crate::domain::SaveError;
use crate::utils::decode_data_uri;

/// Arguments of a local save, shaped like a browser downloads call.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    /// Payload as a `data:` URI
    pub url: String,
    pub filename: String,
    /// Ask the user for a location. The relay always sends `false`.
    pub save_as: bool,
}

/// Acknowledges that a save was initiated; the bytes may not be on disk yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub path: PathBuf,
}

#[async_trait]
pub trait SaveAction: Send + Sync {
    /// Resolves once the save has started, not once it reached the disk.
    async fn save(&self, request: SaveRequest) -> Result<SaveReceipt, SaveError>;
}

type PendingWrite = JoinHandle<Result<(), SaveError>>;

/// Saves payloads into one directory without ever prompting.
#[derive(Debug, Clone)]
pub struct DiskSaver {
    dir: PathBuf,
    pending: Arc<Mutex<Vec<PendingWrite>>>,
}

impl DiskSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pending: Arc::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Waits for every write started so far. Reports the first failure.
    pub async fn wait_idle(&self) -> Result<(), SaveError> {
        let writes: Vec<PendingWrite> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).collect()
        };

        let mut result = Ok(());
        for write in writes {
            let outcome = match write.await {
                Ok(outcome) => outcome,
                Err(e) => Err(SaveError::Io(std::io::Error::other(e))),
            };
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }

    /// Creates `name`, or `stem (n).ext` when it already exists.
    async fn create_unique(&self, name: &str) -> Result<(PathBuf, File), SaveError> {
        let candidate = Path::new(name);
        let stem = candidate
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        let ext = candidate.extension().and_then(|e| e.to_str());

        let mut attempt = 0u32;
        loop {
            let file_name = match (attempt, ext) {
                (0, _) => name.to_string(),
                (n, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
                (n, None) => format!("{} ({})", stem, n),
            };
            let path = self.dir.join(&file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(SaveError::Io(e)),
            }
        }
    }
}

fn validate_filename(name: &str) -> Result<(), SaveError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(SaveError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl SaveAction for DiskSaver {
    async fn save(&self, request: SaveRequest) -> Result<SaveReceipt, SaveError> {
        if request.save_as {
            log::warn!("Location prompt requested for {}, saving to {} instead", request.filename, self.dir.display());
        }
        validate_filename(&request.filename)?;
        let url = request.url;
        let (_, bytes) = tokio::task::spawn_blocking(move || decode_data_uri(&url))
            .await
            .map_err(|e| SaveError::Io(std::io::Error::other(e)))?
            .ok_or(SaveError::InvalidPayload)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let (path, mut file) = self.create_unique(&request.filename).await?;
        log::info!("Saving {} bytes to {}", bytes.len(), path.display());

        let target = path.clone();
        let write = tokio::spawn(async move {
            let written = async {
                file.write_all(&bytes).await?;
                file.sync_all().await
            }
            .await;

            if let Err(e) = &written {
                log::error!("Failed to write {}: {}", target.display(), e);
            }
            written.map_err(SaveError::Io)
        });

        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.retain(|write| !write.is_finished());
            pending.push(write);
        }

        Ok(SaveReceipt { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encode_data_uri;

    fn request(name: &str, data: &[u8]) -> SaveRequest {
        SaveRequest {
            url: encode_data_uri(data, "application/x-osu-archive"),
            filename: name.to_string(),
            save_as: false,
        }
    }

    async fn finish(saver: &DiskSaver, receipt: SaveReceipt) -> PathBuf {
        saver.wait_idle().await.unwrap();
        receipt.path
    }

    #[tokio::test]
    async fn test_disk_saver_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DiskSaver::new(dir.path().join("songs"));

        let receipt = saver.save(request("1 A - B.osz", b"archive")).await.unwrap();
        let path = finish(&saver, receipt).await;

        assert_eq!(path, dir.path().join("songs").join("1 A - B.osz"));
        assert_eq!(std::fs::read(path).unwrap(), b"archive");
    }

    #[tokio::test]
    async fn test_disk_saver_uniquifies() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DiskSaver::new(dir.path());

        let first = finish(&saver, saver.save(request("map.osz", b"1")).await.unwrap()).await;
        let second = finish(&saver, saver.save(request("map.osz", b"2")).await.unwrap()).await;
        let third = finish(&saver, saver.save(request("map.osz", b"3")).await.unwrap()).await;

        assert_eq!(first.file_name().unwrap(), "map.osz");
        assert_eq!(second.file_name().unwrap(), "map (1).osz");
        assert_eq!(third.file_name().unwrap(), "map (2).osz");
        assert_eq!(std::fs::read(first).unwrap(), b"1");
        assert_eq!(std::fs::read(third).unwrap(), b"3");
    }

    #[tokio::test]
    async fn test_disk_saver_drops_finished_writes() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DiskSaver::new(dir.path());

        for n in 0..3 {
            saver.save(request("map.osz", &[n])).await.unwrap();
            tokio::time::timeout(std::time::Duration::from_secs(5), async {
                while !saver.pending.lock().unwrap().iter().all(|w| w.is_finished()) {
                    tokio::task::yield_now().await;
                }
            })
            .await
            .unwrap();
        }

        assert_eq!(saver.pending.lock().unwrap().len(), 1);
        saver.wait_idle().await.unwrap();
        assert!(saver.pending.lock().unwrap().is_empty());
        assert_eq!(std::fs::read(dir.path().join("map (2).osz")).unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_disk_saver_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DiskSaver::new(dir.path());

        let traversal = saver.save(request("../escape.osz", b"x")).await;
        assert!(matches!(traversal, Err(SaveError::InvalidFilename(_))));

        let mut not_data = request("ok.osz", b"x");
        not_data.url = "https://osu.direct/d/1".to_string();
        assert!(matches!(saver.save(not_data).await, Err(SaveError::InvalidPayload)));
    }
}
