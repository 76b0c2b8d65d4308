use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StowageError;

/// The artifact kinds a signed download URL can be issued for.
///
/// Wire requests carry the kind as a string; parsing an unrecognized kind
/// fails with [`StowageError::UnsupportedTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadTargetKind {
    BackupContents,
    BackupLog,
    BackupVolumeSnapshots,
    BackupResourceList,
    RestoreLog,
    RestoreResults,
}

impl DownloadTargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadTargetKind::BackupContents => "backup-contents",
            DownloadTargetKind::BackupLog => "backup-log",
            DownloadTargetKind::BackupVolumeSnapshots => "backup-volume-snapshots",
            DownloadTargetKind::BackupResourceList => "backup-resource-list",
            DownloadTargetKind::RestoreLog => "restore-log",
            DownloadTargetKind::RestoreResults => "restore-results",
        }
    }
}

impl fmt::Display for DownloadTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadTargetKind {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backup-contents" => Ok(DownloadTargetKind::BackupContents),
            "backup-log" => Ok(DownloadTargetKind::BackupLog),
            "backup-volume-snapshots" => Ok(DownloadTargetKind::BackupVolumeSnapshots),
            "backup-resource-list" => Ok(DownloadTargetKind::BackupResourceList),
            "restore-log" => Ok(DownloadTargetKind::RestoreLog),
            "restore-results" => Ok(DownloadTargetKind::RestoreResults),
            other => Err(StowageError::UnsupportedTarget(other.to_string())),
        }
    }
}

/// A request for a signed download URL: which artifact kind, for which
/// backup or restore name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    pub kind: DownloadTargetKind,
    pub name: String,
}

impl DownloadTarget {
    pub fn new(kind: DownloadTargetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}
