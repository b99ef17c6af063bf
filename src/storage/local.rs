//! Filesystem object store, used for tests and local runs.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::storage::{ObjectInfo, ObjectStore};

/// Maps keys onto paths under a root directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn collect(&self, dir: &Path, out: &mut Vec<ObjectInfo>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                self.collect(&path, out)?;
                continue;
            }
            let key = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let last_modified = entry
                .metadata()?
                .modified()
                .ok()
                .map(DateTime::<Utc>::from);
            out.push(ObjectInfo { key, last_modified });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();

        // Keys are flat strings; walk the whole tree and filter.
        if self.root.is_dir() {
            self.collect(&self.root.clone(), &mut objects)?;
        }
        objects.retain(|o| o.key.starts_with(prefix));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .put("po/input/cadentar.csv", b"supplier\n".to_vec())
            .await
            .unwrap();
        store
            .put("po/wrk/ACME-Store1-PO-1.csv", b"PO #\n".to_vec())
            .await
            .unwrap();

        let bytes = store.get("po/input/cadentar.csv").await.unwrap();
        assert_eq!(bytes, b"supplier\n");

        let listed = store.list("po/wrk/").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "po/wrk/ACME-Store1-PO-1.csv");
        assert!(listed[0].last_modified.is_some());

        store.delete("po/wrk/ACME-Store1-PO-1.csv").await.unwrap();
        assert!(store
            .get_optional("po/wrk/ACME-Store1-PO-1.csv")
            .await
            .unwrap()
            .is_none());

        // deleting again is fine
        store.delete("po/wrk/ACME-Store1-PO-1.csv").await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_is_a_hard_error_on_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.get("po/input/nope.csv").await.is_err());
    }

    #[tokio::test]
    async fn copy_duplicates_the_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.put("po/input/a.csv", b"x,y\n".to_vec()).await.unwrap();
        store
            .copy("po/input/a.csv", "po/zip-archive/a(01-01-2024T06:30).csv")
            .await
            .unwrap();

        let copied = store
            .get("po/zip-archive/a(01-01-2024T06:30).csv")
            .await
            .unwrap();
        assert_eq!(copied, b"x,y\n");
    }
}
