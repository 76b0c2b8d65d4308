mod local_backend;
mod s3_backend;

pub use local_backend::LocalBackend;
pub use s3_backend::S3Backend;

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::time::Duration;

use stowage_types::error::{Result, StowageError};

/// Minimal object storage capability: CRUD, listing, and signed URLs over a
/// (bucket, key) address space.
///
/// All operations are synchronous, blocking calls. Implementations provide
/// whatever consistency the underlying provider naturally offers; no
/// read-after-write guarantees are added at this layer.
pub trait ObjectStorage: Send + Sync {
    /// Write the body under a key, overwriting any existing object.
    fn put_object(&self, bucket: &str, key: &str, body: &mut dyn Read) -> Result<()>;

    /// Open a read stream for an object. A missing object is
    /// [`StowageError::NotFound`].
    fn get_object(&self, bucket: &str, key: &str) -> Result<Box<dyn Read + Send>>;

    /// Check whether an object exists, without reading it.
    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// List all object keys starting with the prefix.
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// List the immediate "directories" under a prefix: the distinct key
    /// segments between the prefix and the next delimiter occurrence.
    /// Returned values include the prefix and a trailing delimiter.
    fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>>;

    /// Delete an object. Deleting a missing object is not an error.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Issue a signed, time-limited URL granting read access to one object.
    fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String>;
}

/// Resolves a provider name plus its string configuration into a backend.
///
/// The artifact store is constructed against this seam so callers can plug
/// in provider registries of their own.
pub trait ObjectStorageGetter {
    fn object_storage(
        &self,
        provider: &str,
        config: &HashMap<String, String>,
    ) -> Result<Box<dyn ObjectStorage>>;
}

/// Stock provider registry covering the adapters shipped by this crate.
#[derive(Debug, Default)]
pub struct DefaultStorageGetter;

impl ObjectStorageGetter for DefaultStorageGetter {
    fn object_storage(
        &self,
        provider: &str,
        config: &HashMap<String, String>,
    ) -> Result<Box<dyn ObjectStorage>> {
        match provider {
            "aws" | "s3" => Ok(Box::new(S3Backend::from_config(config)?)),
            "fs" | "local" => Ok(Box::new(LocalBackend::from_config(config)?)),
            other => Err(StowageError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Derive the immediate common prefixes of `keys` under `prefix`.
///
/// A key contributes `prefix + segment + delimiter` where `segment` is the
/// part of the key between the prefix and the next delimiter occurrence;
/// keys with no further delimiter are plain objects and contribute nothing.
/// Results are deduplicated and sorted.
pub fn common_prefixes_from_keys(prefix: &str, delimiter: &str, keys: &[String]) -> Vec<String> {
    let mut prefixes = BTreeSet::new();
    for key in keys {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        if let Some(idx) = rest.find(delimiter) {
            prefixes.insert(format!("{prefix}{}{delimiter}", &rest[..idx]));
        }
    }
    prefixes.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn common_prefixes_groups_by_first_segment() {
        let listing = keys(&[
            "backups/b1/b1-metadata.json.gz",
            "backups/b1/b1-contents.tar.gz",
            "backups/b2/b2-metadata.json.gz",
        ]);
        assert_eq!(
            common_prefixes_from_keys("backups/", "/", &listing),
            vec!["backups/b1/", "backups/b2/"],
        );
    }

    #[test]
    fn common_prefixes_skips_plain_objects() {
        let listing = keys(&["revision", "backups/b1/b1-metadata.json.gz"]);
        assert_eq!(common_prefixes_from_keys("", "/", &listing), vec!["backups/"]);
    }

    #[test]
    fn common_prefixes_ignores_keys_outside_prefix() {
        let listing = keys(&["restores/r1/restore-r1-logs.log.gz"]);
        assert!(common_prefixes_from_keys("backups/", "/", &listing).is_empty());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let getter = DefaultStorageGetter;
        let err = getter
            .object_storage("tape-robot", &HashMap::new())
            .err()
            .unwrap();
        assert!(matches!(err, StowageError::UnsupportedProvider(_)));
    }
}
