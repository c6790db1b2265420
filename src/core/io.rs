use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over the clip and archive store.
///
/// The workflow never touches the filesystem directly. Everything goes
/// through this trait so tests can watch clips come and go without a
/// real disk.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;
    async fn delete(&self, path: &str) -> Result<()>;
    async fn exists(&self, path: &str) -> Result<bool>;
}

// --- Native Implementation ---

pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for NativeStorage {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if tokio::fs::try_exists(path).await? {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}

// --- Test Implementation ---

#[cfg(test)]
pub struct MemoryStorage {
    files: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            files: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn native_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir
            .path()
            .join("build/run/clip_0001.wav")
            .to_string_lossy()
            .to_string();
        let storage = NativeStorage::new();

        storage.write(&path, b"data").await.unwrap();

        assert!(storage.exists(&path).await.unwrap());
        assert_eq!(storage.read(&path).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn native_delete_is_quiet_on_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav").to_string_lossy().to_string();
        let storage = NativeStorage::new();

        storage.write(&path, b"data").await.unwrap();
        storage.delete(&path).await.unwrap();
        storage.delete(&path).await.unwrap();

        assert!(!storage.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn memory_storage_tracks_writes_and_deletes() {
        let storage = MemoryStorage::new();

        storage.write("build/clip_0001.wav", b"x").await.unwrap();
        storage.write("build/clip_0002.wav", b"y").await.unwrap();
        assert_eq!(
            storage.paths(),
            vec!["build/clip_0001.wav", "build/clip_0002.wav"]
        );

        storage.delete("build/clip_0001.wav").await.unwrap();
        assert!(!storage.exists("build/clip_0001.wav").await.unwrap());
    }
}
