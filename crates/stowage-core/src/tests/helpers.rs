use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use stowage_types::volume::{PodVolumeBackup, VolumeSnapshot};

use crate::body::ArtifactBody;
use crate::codec::{self, VersionedJsonDecoder};
use crate::store::{BackupInfo, ObjectBackupStore};
use crate::testutil::MemoryBackend;

pub const BUCKET: &str = "b";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn memory_store_with_prefix(prefix: &str) -> (MemoryBackend, ObjectBackupStore) {
    let backend = MemoryBackend::new();
    let store = ObjectBackupStore::with_object_storage(
        Box::new(backend.clone()),
        BUCKET,
        prefix,
        Box::new(VersionedJsonDecoder::new()),
    )
    .unwrap();
    (backend, store)
}

pub fn memory_store() -> (MemoryBackend, ObjectBackupStore) {
    memory_store_with_prefix("")
}

/// The smallest manifest current producers write, on the gzip+JSON wire.
pub fn manifest_gz() -> Vec<u8> {
    gzip(br#"{"kind":"Backup"}"#)
}

/// A backup info record with every artifact kind present.
pub fn complete_backup_info(name: &str) -> BackupInfo {
    BackupInfo {
        name: name.to_string(),
        metadata: Some(ArtifactBody::from_bytes(manifest_gz())),
        contents: Some(ArtifactBody::from_bytes(b"archive-bytes".to_vec())),
        log: Some(ArtifactBody::from_bytes(gzip(b"backup log line\n"))),
        pod_volume_backups: Some(ArtifactBody::from_bytes(
            codec::encode(&Vec::<PodVolumeBackup>::new()).unwrap(),
        )),
        volume_snapshots: Some(ArtifactBody::from_bytes(
            codec::encode(&Vec::<VolumeSnapshot>::new()).unwrap(),
        )),
        resource_list: Some(ArtifactBody::from_bytes(
            codec::encode(&serde_json::json!([])).unwrap(),
        )),
    }
}
