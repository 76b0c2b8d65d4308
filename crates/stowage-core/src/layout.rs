/// Deterministic key layout for all artifacts under one root prefix.
///
/// Every backup's artifacts live under `backups/<name>/`, every restore's
/// under `restores/<name>/`; those two are the only valid top-level
/// directories. The revision marker is a plain object directly under the
/// root prefix.
///
/// Names are used verbatim as path segments; callers supply non-empty names
/// that are already safe path components.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root_prefix: String,
    backups_dir: String,
    restores_dir: String,
}

impl StoreLayout {
    /// Build a layout from a raw prefix. Leading and trailing separators are
    /// trimmed; a non-empty prefix always gains a trailing separator.
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        let root_prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };
        Self {
            backups_dir: format!("{root_prefix}backups/"),
            restores_dir: format!("{root_prefix}restores/"),
            root_prefix,
        }
    }

    /// Whether `name` is one of the reserved top-level directories.
    pub fn is_valid_subdir(name: &str) -> bool {
        matches!(name, "backups" | "restores")
    }

    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Common prefix of all backup directories, with trailing separator.
    pub fn backups_dir(&self) -> &str {
        &self.backups_dir
    }

    /// Common prefix of all restore directories, with trailing separator.
    pub fn restores_dir(&self) -> &str {
        &self.restores_dir
    }

    /// Common prefix of every artifact belonging to the named backup.
    pub fn backup_dir(&self, name: &str) -> String {
        format!("{}{name}/", self.backups_dir)
    }

    /// Common prefix of every artifact belonging to the named restore.
    pub fn restore_dir(&self, name: &str) -> String {
        format!("{}{name}/", self.restores_dir)
    }

    pub fn backup_metadata_key(&self, name: &str) -> String {
        format!("{}{name}-metadata.json.gz", self.backup_dir(name))
    }

    pub fn backup_contents_key(&self, name: &str) -> String {
        format!("{}{name}-contents.tar.gz", self.backup_dir(name))
    }

    pub fn backup_log_key(&self, name: &str) -> String {
        format!("{}{name}-logs.log.gz", self.backup_dir(name))
    }

    pub fn pod_volume_backups_key(&self, name: &str) -> String {
        format!("{}{name}-podvolumebackups.json.gz", self.backup_dir(name))
    }

    pub fn backup_volume_snapshots_key(&self, name: &str) -> String {
        format!("{}{name}-volumesnapshots.json.gz", self.backup_dir(name))
    }

    pub fn backup_resource_list_key(&self, name: &str) -> String {
        format!("{}{name}-resource-list.json.gz", self.backup_dir(name))
    }

    pub fn restore_log_key(&self, name: &str) -> String {
        format!("{}restore-{name}-logs.log.gz", self.restore_dir(name))
    }

    pub fn restore_results_key(&self, name: &str) -> String {
        format!("{}restore-{name}-results.json.gz", self.restore_dir(name))
    }

    /// The revision marker key, directly under the root prefix.
    pub fn revision_key(&self) -> String {
        format!("{}revision", self.root_prefix)
    }
}
