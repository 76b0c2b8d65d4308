use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

use tracing::{debug, error, warn};

use stowage_storage::{ObjectStorage, ObjectStorageGetter};
use stowage_types::backup::BackupManifest;
use stowage_types::download::{DownloadTarget, DownloadTargetKind};
use stowage_types::error::{aggregate, Result, StowageError};
use stowage_types::volume::{PodVolumeBackup, VolumeSnapshot};

use crate::body::ArtifactBody;
use crate::codec::{self, ManifestDecoder};
use crate::layout::StoreLayout;

/// How long a download URL is valid for.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(10 * 60);

/// Storage address and provider selection for one backup store.
#[derive(Debug, Clone, Default)]
pub struct StorageLocation {
    pub provider: String,
    pub bucket: String,
    pub prefix: String,
    /// Provider-specific settings passed through to the backend.
    pub config: HashMap<String, String>,
}

/// All artifacts of one backup, handed to [`BackupStore::put_backup`].
///
/// Streams are uploaded verbatim. Optional artifacts may be `None`: a
/// backup without volume snapshots simply has no snapshot list. A `None`
/// metadata marks a backup that already failed upstream; `put_backup`
/// persists its log (if any) and nothing else.
pub struct BackupInfo {
    pub name: String,
    pub metadata: Option<ArtifactBody>,
    pub contents: Option<ArtifactBody>,
    pub log: Option<ArtifactBody>,
    pub pod_volume_backups: Option<ArtifactBody>,
    pub volume_snapshots: Option<ArtifactBody>,
    pub resource_list: Option<ArtifactBody>,
}

impl BackupInfo {
    /// An info record with the given name and no artifacts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: None,
            contents: None,
            log: None,
            pod_volume_backups: None,
            volume_snapshots: None,
            resource_list: None,
        }
    }
}

/// Operations for creating, retrieving, and deleting backup and restore
/// artifacts in a persistent backup store.
pub trait BackupStore: Send + Sync {
    /// Check that the store's top-level directories are exactly the
    /// reserved set.
    fn is_valid(&self) -> Result<()>;

    /// Read the current revision token.
    fn revision(&self) -> Result<String>;

    /// Names of all backups present in the store.
    fn list_backups(&self) -> Result<Vec<String>>;

    fn put_backup(&self, info: BackupInfo) -> Result<()>;

    /// Read and decode the metadata artifact. Absence is a hard error;
    /// callers are expected to have checked existence already.
    fn backup_metadata(&self, name: &str) -> Result<BackupManifest>;

    /// The backup's volume snapshot list, or `None` if the backup has no
    /// snapshot artifact (legacy or snapshot-less backups).
    fn backup_volume_snapshots(&self, name: &str) -> Result<Option<Vec<VolumeSnapshot>>>;

    /// The backup's pod-volume-backup list, or `None` if absent.
    fn pod_volume_backups(&self, name: &str) -> Result<Option<Vec<PodVolumeBackup>>>;

    /// A live read stream over the backup contents archive. The caller owns
    /// the stream and must release it on every exit path.
    fn backup_contents(&self, name: &str) -> Result<Box<dyn Read + Send>>;

    /// Whether the backup's metadata object exists. Metadata is the
    /// authoritative existence marker for a backup.
    fn backup_exists(&self, name: &str) -> Result<bool>;

    fn delete_backup(&self, name: &str) -> Result<()>;

    fn put_restore_log(&self, restore: &str, log: ArtifactBody) -> Result<()>;

    fn put_restore_results(&self, restore: &str, results: ArtifactBody) -> Result<()>;

    fn delete_restore(&self, name: &str) -> Result<()>;

    /// A signed, time-limited download URL for one artifact.
    fn download_url(&self, target: &DownloadTarget) -> Result<String>;
}

/// [`BackupStore`] over a generic object storage backend.
pub struct ObjectBackupStore {
    object_store: Box<dyn ObjectStorage>,
    bucket: String,
    layout: StoreLayout,
    decoder: Box<dyn ManifestDecoder>,
    span: tracing::Span,
}

impl std::fmt::Debug for ObjectBackupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBackupStore")
            .field("bucket", &self.bucket)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl ObjectBackupStore {
    /// Resolve the backend through the getter and build a store.
    ///
    /// The normalized bucket name is inserted into the provider config map
    /// before backend construction so adapters can use it during client
    /// initialization.
    pub fn new(
        location: &StorageLocation,
        getter: &dyn ObjectStorageGetter,
        decoder: Box<dyn ManifestDecoder>,
    ) -> Result<Self> {
        if location.provider.is_empty() {
            return Err(StowageError::Config(
                "object storage provider name must not be empty".into(),
            ));
        }
        let bucket = normalized_bucket(&location.bucket)?;

        let mut config = location.config.clone();
        config.insert("bucket".to_string(), bucket);
        let object_store = getter.object_storage(&location.provider, &config)?;

        Self::with_object_storage(object_store, &location.bucket, &location.prefix, decoder)
    }

    /// Build a store over an already-constructed backend.
    pub fn with_object_storage(
        object_store: Box<dyn ObjectStorage>,
        bucket: &str,
        prefix: &str,
        decoder: Box<dyn ManifestDecoder>,
    ) -> Result<Self> {
        let bucket = normalized_bucket(bucket)?;
        let prefix = prefix.trim_matches('/');
        let span = tracing::info_span!("backup_store", bucket = %bucket, prefix = %prefix);

        Ok(Self {
            object_store,
            bucket,
            layout: StoreLayout::new(prefix),
            decoder,
            span,
        })
    }

    /// Rewind the body if it is seekable, then upload it. A `None` body is
    /// skipped entirely.
    fn seek_and_put(&self, key: &str, body: Option<&mut ArtifactBody>) -> Result<()> {
        let Some(body) = body else {
            return Ok(());
        };
        body.rewind_to_start()?;
        self.object_store.put_object(&self.bucket, key, body)
    }

    /// Open the object if it exists; `None` if absent.
    fn try_get(&self, key: &str) -> Result<Option<Box<dyn Read + Send>>> {
        if !self.object_store.object_exists(&self.bucket, key)? {
            return Ok(None);
        }
        Ok(Some(self.object_store.get_object(&self.bucket, key)?))
    }

    /// Rewrite the revision marker with a fresh unique token.
    fn put_revision(&self) -> Result<()> {
        let token = uuid::Uuid::new_v4().to_string();
        let mut body = token.as_bytes();
        self.object_store
            .put_object(&self.bucket, &self.layout.revision_key(), &mut body)
            .map_err(|e| StowageError::Storage(format!("error updating revision file: {e}")))
    }

    /// Delete the given keys, appending each failure to `errs`.
    fn delete_keys(&self, keys: &[String], errs: &mut Vec<StowageError>) {
        for key in keys {
            if let Err(e) = self.object_store.delete_object(&self.bucket, key) {
                errs.push(e);
            }
        }
    }
}

/// Trim separators off the bucket name and reject names that smuggle in a
/// prefix.
fn normalized_bucket(bucket: &str) -> Result<String> {
    let normalized = bucket.trim_matches('/');
    if normalized.contains('/') {
        return Err(StowageError::Config(format!(
            "bucket name '{bucket}' must not contain a '/' (if using a prefix, put it in the 'prefix' field instead)"
        )));
    }
    Ok(normalized.to_string())
}

fn aggregate_result(errs: Vec<StowageError>) -> Result<()> {
    match aggregate(errs) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl BackupStore for ObjectBackupStore {
    fn is_valid(&self) -> Result<()> {
        let _guard = self.span.enter();
        let dirs = self.object_store.list_common_prefixes(
            &self.bucket,
            self.layout.root_prefix(),
            "/",
        )?;

        let mut invalid = Vec::new();
        for dir in &dirs {
            let subdir = dir
                .strip_prefix(self.layout.root_prefix())
                .unwrap_or(dir)
                .trim_end_matches('/');
            if !StoreLayout::is_valid_subdir(subdir) {
                invalid.push(subdir.to_string());
            }
        }

        if invalid.is_empty() {
            return Ok(());
        }
        // Don't name more than 3 invalid dirs in the error message.
        let total = invalid.len();
        if total > 3 {
            invalid.truncate(3);
            invalid.push("...".to_string());
            return Err(StowageError::InvalidStoreLayout(format!(
                "[{}] ({total} total)",
                invalid.join(", ")
            )));
        }
        Err(StowageError::InvalidStoreLayout(format!(
            "[{}]",
            invalid.join(", ")
        )))
    }

    fn revision(&self) -> Result<String> {
        let _guard = self.span.enter();
        let mut reader = self
            .object_store
            .get_object(&self.bucket, &self.layout.revision_key())?;
        let mut token = String::new();
        reader
            .read_to_string(&mut token)
            .map_err(|e| StowageError::Storage(format!("error reading revision file: {e}")))?;
        Ok(token)
    }

    fn list_backups(&self) -> Result<Vec<String>> {
        let _guard = self.span.enter();
        let prefixes = self.object_store.list_common_prefixes(
            &self.bucket,
            self.layout.backups_dir(),
            "/",
        )?;

        let mut output = Vec::with_capacity(prefixes.len());
        for prefix in &prefixes {
            // Prefixes come back inclusive of the backups dir and a trailing
            // delimiter; trim both to get the backup name.
            let name = prefix
                .strip_prefix(self.layout.backups_dir())
                .unwrap_or(prefix)
                .trim_end_matches('/');
            output.push(name.to_string());
        }
        Ok(output)
    }

    fn put_backup(&self, info: BackupInfo) -> Result<()> {
        let _guard = self.span.enter();
        let mut info = info;
        let name = info.name.clone();
        let metadata_key = self.layout.backup_metadata_key(&name);
        let contents_key = self.layout.backup_contents_key(&name);

        if let Err(e) = self.seek_and_put(&self.layout.backup_log_key(&name), info.log.as_mut()) {
            // A missing log has no restore-ability impact; never fail the
            // put over it.
            error!(backup = %name, error = %e, "error uploading log file");
        }

        if info.metadata.is_none() {
            // Without metadata the backup already failed upstream; nothing
            // restorable exists, so there is nothing more to persist.
            return Ok(());
        }

        self.seek_and_put(&metadata_key, info.metadata.as_mut())?;

        if let Err(err) = self.seek_and_put(&contents_key, info.contents.as_mut()) {
            let mut errs = vec![err];
            self.delete_keys(std::slice::from_ref(&metadata_key), &mut errs);
            return aggregate_result(errs);
        }

        // Secondary artifacts, written after contents. Unwinding any
        // failure here only needs to remove contents and metadata: the
        // minimal restorable unit, and everything written before the failed
        // step in this sequence.
        let unwind_keys = [contents_key, metadata_key];
        let steps = [
            (
                self.layout.pod_volume_backups_key(&name),
                info.pod_volume_backups.as_mut(),
            ),
            (
                self.layout.backup_volume_snapshots_key(&name),
                info.volume_snapshots.as_mut(),
            ),
            (
                self.layout.backup_resource_list_key(&name),
                info.resource_list.as_mut(),
            ),
        ];
        for (key, body) in steps {
            if let Err(err) = self.seek_and_put(&key, body) {
                let mut errs = vec![err];
                self.delete_keys(&unwind_keys, &mut errs);
                return aggregate_result(errs);
            }
        }

        if let Err(e) = self.put_revision() {
            warn!(backup = %name, error = %e, "error updating backup store revision");
        }

        Ok(())
    }

    fn backup_metadata(&self, name: &str) -> Result<BackupManifest> {
        let _guard = self.span.enter();
        let key = self.layout.backup_metadata_key(name);
        let mut reader = self.object_store.get_object(&self.bucket, &key)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.decoder.decode_manifest(&data)
    }

    fn backup_volume_snapshots(&self, name: &str) -> Result<Option<Vec<VolumeSnapshot>>> {
        let _guard = self.span.enter();
        // A legacy backup or a backup with no snapshots has no snapshot
        // list; absence is data, not an error.
        let Some(reader) = self.try_get(&self.layout.backup_volume_snapshots_key(name))? else {
            return Ok(None);
        };
        Ok(Some(codec::decode(reader)?))
    }

    fn pod_volume_backups(&self, name: &str) -> Result<Option<Vec<PodVolumeBackup>>> {
        let _guard = self.span.enter();
        let Some(reader) = self.try_get(&self.layout.pod_volume_backups_key(name))? else {
            return Ok(None);
        };
        Ok(Some(codec::decode(reader)?))
    }

    fn backup_contents(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let _guard = self.span.enter();
        self.object_store
            .get_object(&self.bucket, &self.layout.backup_contents_key(name))
    }

    fn backup_exists(&self, name: &str) -> Result<bool> {
        let _guard = self.span.enter();
        self.object_store
            .object_exists(&self.bucket, &self.layout.backup_metadata_key(name))
    }

    fn delete_backup(&self, name: &str) -> Result<()> {
        let _guard = self.span.enter();
        let objects = self
            .object_store
            .list_objects(&self.bucket, &self.layout.backup_dir(name))?;

        let mut errs = Vec::new();
        for key in &objects {
            debug!(key = %key, "trying to delete object");
            if let Err(e) = self.object_store.delete_object(&self.bucket, key) {
                errs.push(e);
            }
        }

        if let Err(e) = self.put_revision() {
            warn!(backup = %name, error = %e, "error updating backup store revision");
        }

        aggregate_result(errs)
    }

    fn put_restore_log(&self, restore: &str, log: ArtifactBody) -> Result<()> {
        let _guard = self.span.enter();
        let mut log = log;
        self.object_store
            .put_object(&self.bucket, &self.layout.restore_log_key(restore), &mut log)
    }

    fn put_restore_results(&self, restore: &str, results: ArtifactBody) -> Result<()> {
        let _guard = self.span.enter();
        let mut results = results;
        self.object_store.put_object(
            &self.bucket,
            &self.layout.restore_results_key(restore),
            &mut results,
        )
    }

    fn delete_restore(&self, name: &str) -> Result<()> {
        let _guard = self.span.enter();
        let objects = self
            .object_store
            .list_objects(&self.bucket, &self.layout.restore_dir(name))?;

        let mut errs = Vec::new();
        for key in &objects {
            debug!(key = %key, "trying to delete object");
            if let Err(e) = self.object_store.delete_object(&self.bucket, key) {
                errs.push(e);
            }
        }

        if let Err(e) = self.put_revision() {
            errs.push(e);
        }

        aggregate_result(errs)
    }

    fn download_url(&self, target: &DownloadTarget) -> Result<String> {
        let _guard = self.span.enter();
        let key = match target.kind {
            DownloadTargetKind::BackupContents => self.layout.backup_contents_key(&target.name),
            DownloadTargetKind::BackupLog => self.layout.backup_log_key(&target.name),
            DownloadTargetKind::BackupVolumeSnapshots => {
                self.layout.backup_volume_snapshots_key(&target.name)
            }
            DownloadTargetKind::BackupResourceList => {
                self.layout.backup_resource_list_key(&target.name)
            }
            DownloadTargetKind::RestoreLog => self.layout.restore_log_key(&target.name),
            DownloadTargetKind::RestoreResults => self.layout.restore_results_key(&target.name),
        };
        self.object_store
            .create_signed_url(&self.bucket, &key, DOWNLOAD_URL_TTL)
    }
}
