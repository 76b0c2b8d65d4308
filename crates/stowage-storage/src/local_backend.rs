use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use stowage_types::error::{Result, StowageError};

use crate::{common_prefixes_from_keys, ObjectStorage};

/// Object storage backend over a local filesystem directory, using `std::fs`
/// directly. Buckets map to top-level directories under the root.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at the given directory path.
    pub fn new(root: &str) -> Result<Self> {
        let root_path = PathBuf::from(root);
        // Canonicalize if the path already exists for clearer errors and
        // correct strip_prefix behavior with symlinked roots.
        let root = if root_path.exists() {
            fs::canonicalize(&root_path)?
        } else {
            root_path
        };
        Ok(Self { root })
    }

    /// Build from a provider config map. Requires a `root` entry.
    pub fn from_config(config: &HashMap<String, String>) -> Result<Self> {
        let root = config
            .get("root")
            .ok_or_else(|| StowageError::Config("filesystem backend requires 'root'".into()))?;
        Self::new(root)
    }

    /// Reject bucket names and storage keys that could escape the root.
    fn validate_segment(kind: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(StowageError::Config(format!("unsafe {kind}: empty")));
        }
        if value.starts_with('/') || value.starts_with('\\') {
            return Err(StowageError::Config(format!(
                "unsafe {kind}: absolute path '{value}'"
            )));
        }
        if value.contains('\\') {
            return Err(StowageError::Config(format!(
                "unsafe {kind}: contains backslash '{value}'"
            )));
        }
        for component in Path::new(value).components() {
            if component == Component::ParentDir {
                return Err(StowageError::Config(format!(
                    "unsafe {kind}: parent traversal '{value}'"
                )));
            }
        }
        Ok(())
    }

    /// Resolve a (bucket, `/`-separated key) pair to a path under the root.
    fn resolve(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        Self::validate_segment("bucket", bucket)?;
        if bucket.contains('/') {
            return Err(StowageError::Config(format!(
                "unsafe bucket: contains '/' ('{bucket}')"
            )));
        }
        Self::validate_segment("storage key", key)?;
        Ok(self.root.join(bucket).join(key))
    }

    /// Stream the body into a temp file in the target directory, then
    /// atomically rename into place so readers never see a partial object.
    fn atomic_write(path: &Path, body: &mut dyn Read) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| StowageError::Storage(format!("no parent dir for {}", path.display())))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::copy(body, &mut tmp)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Recursively list all files under `dir` as `/`-separated keys relative
    /// to `base`.
    fn list_recursive(base: &Path, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                Self::list_recursive(base, &entry.path(), keys)?;
            } else if file_type.is_file() {
                if let Ok(rel) = entry.path().strip_prefix(base) {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
        }
        Ok(())
    }
}

impl ObjectStorage for LocalBackend {
    fn put_object(&self, bucket: &str, key: &str, body: &mut dyn Read) -> Result<()> {
        let path = self.resolve(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::atomic_write(&path, body)
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Box<dyn Read + Send>> {
        let path = self.resolve(bucket, key)?;
        match fs::File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StowageError::NotFound(format!("{bucket}/{key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let path = self.resolve(bucket, key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Self::validate_segment("bucket", bucket)?;
        let base = self.root.join(bucket);
        match fs::metadata(&base) {
            Ok(meta) if meta.is_dir() => {
                let mut keys = Vec::new();
                Self::list_recursive(&base, &base, &mut keys)?;
                keys.retain(|k| k.starts_with(prefix));
                keys.sort();
                Ok(keys)
            }
            Ok(_) => Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>> {
        let keys = self.list_objects(bucket, prefix)?;
        Ok(common_prefixes_from_keys(prefix, delimiter, &keys))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.resolve(bucket, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn create_signed_url(&self, bucket: &str, key: &str, _ttl: Duration) -> Result<String> {
        Err(StowageError::Storage(format!(
            "filesystem backend cannot issue signed URLs (requested for {bucket}/{key})"
        )))
    }
}
