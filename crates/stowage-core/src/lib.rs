pub mod body;
pub mod codec;
pub mod layout;
pub mod store;

pub use body::ArtifactBody;
pub use codec::{ManifestDecoder, VersionedJsonDecoder};
pub use layout::StoreLayout;
pub use store::{BackupInfo, BackupStore, ObjectBackupStore, StorageLocation, DOWNLOAD_URL_TTL};

#[cfg(test)]
mod tests;
#[cfg(test)]
mod testutil;
