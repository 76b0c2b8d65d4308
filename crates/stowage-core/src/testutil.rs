use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stowage_storage::{common_prefixes_from_keys, ObjectStorage, ObjectStorageGetter};
use stowage_types::error::{Result, StowageError};

/// In-memory object storage for testing. Thread-safe via Mutex; clones share
/// the same underlying object map, so a clone kept outside the store can
/// inspect what the store wrote.
///
/// Failure injection: puts/deletes whose `<bucket>/<key>` address contains a
/// registered substring fail with a storage error.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_puts: Arc<Mutex<Vec<String>>>,
    fail_deletes: Arc<Mutex<Vec<String>>>,
}

fn addr(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every put whose address contains `fragment` fail.
    pub fn fail_puts_matching(&self, fragment: &str) {
        self.fail_puts.lock().unwrap().push(fragment.to_string());
    }

    /// Make every delete whose address contains `fragment` fail.
    pub fn fail_deletes_matching(&self, fragment: &str) {
        self.fail_deletes.lock().unwrap().push(fragment.to_string());
    }

    /// Raw stored bytes for one object, if present.
    pub fn raw(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(&addr(bucket, key)).cloned()
    }

    /// All keys stored under one bucket, sorted.
    pub fn stored_keys(&self, bucket: &str) -> Vec<String> {
        let prefix = format!("{bucket}/");
        let mut keys: Vec<String> = self
            .data
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(|s| s.to_string()))
            .collect();
        keys.sort();
        keys
    }
}

impl ObjectStorage for MemoryBackend {
    fn put_object(&self, bucket: &str, key: &str, body: &mut dyn Read) -> Result<()> {
        let addr = addr(bucket, key);
        if self
            .fail_puts
            .lock()
            .unwrap()
            .iter()
            .any(|f| addr.contains(f.as_str()))
        {
            return Err(StowageError::Storage(format!("injected put failure: {key}")));
        }
        let mut data = Vec::new();
        body.read_to_end(&mut data)?;
        self.data.lock().unwrap().insert(addr, data);
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Box<dyn Read + Send>> {
        match self.raw(bucket, key) {
            Some(data) => Ok(Box::new(Cursor::new(data))),
            None => Err(StowageError::NotFound(addr(bucket, key))),
        }
    }

    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.data.lock().unwrap().contains_key(&addr(bucket, key)))
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .stored_keys(bucket)
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
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
        let addr = addr(bucket, key);
        if self
            .fail_deletes
            .lock()
            .unwrap()
            .iter()
            .any(|f| addr.contains(f.as_str()))
        {
            return Err(StowageError::Storage(format!(
                "injected delete failure: {key}"
            )));
        }
        self.data.lock().unwrap().remove(&addr);
        Ok(())
    }

    fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        Ok(format!(
            "https://objects.example.dev/{bucket}/{key}?expires={}",
            ttl.as_secs()
        ))
    }
}

/// Getter over a shared [`MemoryBackend`] that records the provider name and
/// config map it was called with.
#[derive(Clone, Default)]
pub struct MemoryGetter {
    pub backend: MemoryBackend,
    pub seen_provider: Arc<Mutex<Option<String>>>,
    pub seen_config: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl ObjectStorageGetter for MemoryGetter {
    fn object_storage(
        &self,
        provider: &str,
        config: &HashMap<String, String>,
    ) -> Result<Box<dyn ObjectStorage>> {
        *self.seen_provider.lock().unwrap() = Some(provider.to_string());
        *self.seen_config.lock().unwrap() = Some(config.clone());
        Ok(Box::new(self.backend.clone()))
    }
}
