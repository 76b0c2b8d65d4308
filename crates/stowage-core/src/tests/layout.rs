use crate::layout::StoreLayout;

#[test]
fn empty_prefix_normalizes_to_empty() {
    let layout = StoreLayout::new("");
    assert_eq!(layout.root_prefix(), "");
    assert_eq!(layout.backups_dir(), "backups/");
    assert_eq!(layout.restores_dir(), "restores/");
}

#[test]
fn prefix_is_trimmed_and_gains_trailing_separator() {
    for raw in ["cluster-a", "/cluster-a", "cluster-a/", "/cluster-a/"] {
        let layout = StoreLayout::new(raw);
        assert_eq!(layout.root_prefix(), "cluster-a/", "input: {raw}");
    }
}

#[test]
fn backup_keys_match_the_namespace() {
    let layout = StoreLayout::new("");
    assert_eq!(layout.backup_dir("backup-1"), "backups/backup-1/");
    assert_eq!(
        layout.backup_metadata_key("backup-1"),
        "backups/backup-1/backup-1-metadata.json.gz"
    );
    assert_eq!(
        layout.backup_contents_key("backup-1"),
        "backups/backup-1/backup-1-contents.tar.gz"
    );
    assert_eq!(
        layout.backup_log_key("backup-1"),
        "backups/backup-1/backup-1-logs.log.gz"
    );
    assert_eq!(
        layout.pod_volume_backups_key("backup-1"),
        "backups/backup-1/backup-1-podvolumebackups.json.gz"
    );
    assert_eq!(
        layout.backup_volume_snapshots_key("backup-1"),
        "backups/backup-1/backup-1-volumesnapshots.json.gz"
    );
    assert_eq!(
        layout.backup_resource_list_key("backup-1"),
        "backups/backup-1/backup-1-resource-list.json.gz"
    );
}

#[test]
fn restore_keys_match_the_namespace() {
    let layout = StoreLayout::new("");
    assert_eq!(layout.restore_dir("restore-1"), "restores/restore-1/");
    assert_eq!(
        layout.restore_log_key("restore-1"),
        "restores/restore-1/restore-restore-1-logs.log.gz"
    );
    assert_eq!(
        layout.restore_results_key("restore-1"),
        "restores/restore-1/restore-restore-1-results.json.gz"
    );
}

#[test]
fn keys_include_the_root_prefix() {
    let layout = StoreLayout::new("cluster-a");
    assert_eq!(
        layout.backup_metadata_key("b1"),
        "cluster-a/backups/b1/b1-metadata.json.gz"
    );
    assert_eq!(layout.restores_dir(), "cluster-a/restores/");
    assert_eq!(layout.revision_key(), "cluster-a/revision");
}

#[test]
fn revision_key_sits_directly_under_the_root() {
    assert_eq!(StoreLayout::new("").revision_key(), "revision");
}

#[test]
fn only_reserved_subdirs_are_valid() {
    assert!(StoreLayout::is_valid_subdir("backups"));
    assert!(StoreLayout::is_valid_subdir("restores"));
    assert!(!StoreLayout::is_valid_subdir("junk"));
    assert!(!StoreLayout::is_valid_subdir("Backups"));
    assert!(!StoreLayout::is_valid_subdir(""));
}
