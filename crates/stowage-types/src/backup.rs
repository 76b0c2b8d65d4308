use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written by current producers of the metadata artifact.
pub const MANIFEST_API_VERSION: &str = "backup.stowage.io/v1";

/// The backup metadata record describing one backup, stored at
/// `backups/<name>/<name>-metadata.json.gz`. Its presence is what makes a
/// backup exist as far as the store is concerned.
///
/// Every field except `kind` carries a serde default so that manifests
/// written by older producers still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    /// Versioned schema identifier, e.g. `backup.stowage.io/v1`.
    /// Empty in manifests predating schema versioning.
    #[serde(default)]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub included_namespaces: Vec<String>,
    #[serde(default)]
    pub excluded_namespaces: Vec<String>,
    #[serde(default)]
    pub include_cluster_resources: Option<bool>,
    #[serde(default)]
    pub phase: BackupPhase,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the backup becomes eligible for garbage collection.
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub warnings: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackupPhase {
    #[default]
    New,
    InProgress,
    Completed,
    PartiallyFailed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_decodes_with_defaults() {
        let manifest: BackupManifest = serde_json::from_str(r#"{"kind":"Backup"}"#).unwrap();
        assert_eq!(manifest.kind, "Backup");
        assert_eq!(manifest.api_version, "");
        assert_eq!(manifest.phase, BackupPhase::New);
        assert!(manifest.started_at.is_none());
    }

    #[test]
    fn manifest_roundtrips_through_json() {
        let manifest = BackupManifest {
            api_version: MANIFEST_API_VERSION.to_string(),
            kind: "Backup".to_string(),
            name: "nightly-1".to_string(),
            included_namespaces: vec!["default".to_string()],
            excluded_namespaces: Vec::new(),
            include_cluster_resources: Some(true),
            phase: BackupPhase::Completed,
            started_at: None,
            completed_at: None,
            expiration: None,
            errors: 0,
            warnings: 2,
        };
        let json = serde_json::to_string(&manifest).unwrap();
        let back: BackupManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
