use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one provider volume snapshot taken during a backup, stored as a
/// list at `backups/<name>/<name>-volumesnapshots.json.gz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshot {
    pub spec: VolumeSnapshotSpec,
    #[serde(default)]
    pub status: VolumeSnapshotStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSpec {
    pub backup_name: String,
    pub persistent_volume_name: String,
    pub provider_volume_id: String,
    #[serde(default)]
    pub volume_type: String,
    #[serde(default)]
    pub volume_az: Option<String>,
    #[serde(default)]
    pub volume_iops: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotStatus {
    #[serde(default)]
    pub provider_snapshot_id: String,
    #[serde(default)]
    pub phase: VolumeSnapshotPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumeSnapshotPhase {
    #[default]
    New,
    Completed,
    Failed,
}

/// Record of one pod-volume backup (file-level copy of a single pod volume),
/// stored as a list at `backups/<name>/<name>-podvolumebackups.json.gz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodVolumeBackup {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub pod: String,
    pub volume: String,
    #[serde(default)]
    pub snapshot_id: String,
    #[serde(default)]
    pub phase: PodVolumeBackupPhase,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PodVolumeBackupPhase {
    #[default]
    New,
    InProgress,
    Completed,
    Failed,
}
