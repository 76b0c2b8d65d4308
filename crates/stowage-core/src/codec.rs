use std::io::Read;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use stowage_types::backup::{BackupManifest, MANIFEST_API_VERSION};
use stowage_types::error::{Result, StowageError};

/// Encode a list-shaped artifact as gzip-compressed JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, value)?;
    Ok(encoder.finish()?)
}

/// Decode a gzip-compressed JSON artifact into the target type.
///
/// Any decompression or parse failure on a present object is a hard
/// [`StowageError::CorruptArtifact`], never silently defaulted.
pub fn decode<T: DeserializeOwned>(reader: impl Read) -> Result<T> {
    let gz = GzDecoder::new(reader);
    serde_json::from_reader(gz)
        .map_err(|e| StowageError::CorruptArtifact(format!("error decoding object data: {e}")))
}

/// Decodes raw metadata bytes into a typed [`BackupManifest`].
///
/// Injected into the store at construction; the store itself treats
/// metadata bytes as opaque and this capability owns the wire format.
pub trait ManifestDecoder: Send + Sync {
    fn decode_manifest(&self, data: &[u8]) -> Result<BackupManifest>;
}

/// Stock decoder for the gzip+JSON manifest wire format.
///
/// Accepts manifests whose schema version is empty (written before schema
/// versioning) or listed as supported; anything else is rejected.
pub struct VersionedJsonDecoder {
    supported: Vec<String>,
}

impl VersionedJsonDecoder {
    pub fn new() -> Self {
        Self {
            supported: vec![MANIFEST_API_VERSION.to_string()],
        }
    }
}

impl Default for VersionedJsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestDecoder for VersionedJsonDecoder {
    fn decode_manifest(&self, data: &[u8]) -> Result<BackupManifest> {
        let manifest: BackupManifest = decode(data)?;
        if !manifest.api_version.is_empty()
            && !self.supported.iter().any(|v| *v == manifest.api_version)
        {
            return Err(StowageError::CorruptArtifact(format!(
                "unsupported manifest schema version '{}'",
                manifest.api_version
            )));
        }
        Ok(manifest)
    }
}
