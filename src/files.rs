use std::fs::{self, File};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::domain::StructureId;
use crate::error::IngestError;

/// Filesystem layout for downloaded structures: one decompressed XML file
/// per structure id under the cache root, plus a JSON sidecar recording
/// where and when the file came from.
#[derive(Debug, Clone)]
pub struct FileStore {
    cache_root: Utf8PathBuf,
}

impl FileStore {
    pub fn new() -> Result<Self, IngestError> {
        let cache_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("pdbx-ingest")
                        .join("structures"),
                )
                .ok()
            })
            .ok_or_else(|| {
                IngestError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self { cache_root })
    }

    pub fn new_with_root(cache_root: Utf8PathBuf) -> Self {
        Self { cache_root }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn xml_path(&self, id: &StructureId) -> Utf8PathBuf {
        self.cache_root.join(format!("{id}.xml"))
    }

    pub fn metadata_path(&self, id: &StructureId) -> Utf8PathBuf {
        self.cache_root.join(format!("{id}.meta.json"))
    }

    pub fn ensure_cache_root(&self) -> Result<(), IngestError> {
        fs::create_dir_all(self.cache_root.as_std_path())
            .map_err(|err| IngestError::Filesystem(err.to_string()))
    }

    pub fn xml_exists(&self, id: &StructureId) -> bool {
        self.xml_path(id).as_std_path().exists()
    }

    /// Decompresses a downloaded `.xml.gz` into the cache, writing through a
    /// tempfile so a partial decompress never lands at the final path.
    pub fn decompress_into_cache(
        &self,
        gz_path: &Utf8Path,
        id: &StructureId,
    ) -> Result<Utf8PathBuf, IngestError> {
        let destination = self.xml_path(id);
        let compressed = File::open(gz_path.as_std_path())
            .map_err(|err| IngestError::Filesystem(format!("open {gz_path}: {err}")))?;
        let mut decoder = GzDecoder::new(compressed);

        let mut temp = tempfile::Builder::new()
            .prefix("pdbx-ingest-xml")
            .tempfile_in(self.cache_root.as_std_path())
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        io::copy(&mut decoder, &mut temp).map_err(|err| IngestError::Fetch {
            structure: id.as_str().to_string(),
            message: format!("gzip decompression failed: {err}"),
        })?;
        temp.persist(destination.as_std_path())
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        Ok(destination)
    }

    pub fn write_metadata(
        &self,
        id: &StructureId,
        metadata: &DownloadMetadata,
    ) -> Result<(), IngestError> {
        let path = self.metadata_path(id);
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadMetadata {
    pub structure: String,
    pub source_url: String,
    pub downloaded_at: String,
    pub tool: String,
}
