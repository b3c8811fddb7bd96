use std::fs::File;
use std::io::BufReader;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::info;

use crate::db::AtomSiteStore;
use crate::domain::StructureId;
use crate::error::IngestError;
use crate::extract;
use crate::files::{DownloadMetadata, FileStore};
use crate::rcsb::{RcsbClient, RcsbHttpClient};

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Re-download even when a cached structure file exists.
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub structure: String,
    pub action: String,
    pub xml_path: String,
    pub atoms_total: usize,
    pub inserted: usize,
    pub skipped_existing: usize,
    pub unmapped_fields: Vec<String>,
}

pub struct App<R: RcsbClient> {
    files: FileStore,
    rcsb: R,
}

impl<R: RcsbClient> App<R> {
    pub fn new(files: FileStore, rcsb: R) -> Self {
        Self { files, rcsb }
    }

    /// Runs the full pipeline for one structure: resolve the cached XML
    /// (downloading and decompressing on a miss), extract atom_site records,
    /// and persist them through the store the caller opened.
    pub fn ingest(
        &self,
        id: &StructureId,
        store: &mut AtomSiteStore,
        options: &IngestOptions,
    ) -> Result<IngestReport, IngestError> {
        self.files.ensure_cache_root()?;

        let xml_path = self.files.xml_path(id);
        let action = if !options.force && self.files.xml_exists(id) {
            info!(structure = id.as_str(), path = %xml_path, "using cached structure file");
            "cache"
        } else {
            self.download(id)?;
            "download"
        };

        let file = File::open(xml_path.as_std_path())
            .map_err(|err| IngestError::Filesystem(format!("open {xml_path}: {err}")))?;
        let mut records = extract::extract_atom_sites(BufReader::new(file), id)?;
        info!(
            structure = id.as_str(),
            atoms = records.len(),
            "extracted atom_site records"
        );

        store.ensure_schema()?;
        let stats = store.persist(id, &mut records)?;

        Ok(IngestReport {
            structure: id.as_str().to_string(),
            action: action.to_string(),
            xml_path: xml_path.to_string(),
            atoms_total: stats.total,
            inserted: stats.inserted,
            skipped_existing: stats.skipped_existing,
            unmapped_fields: stats.unmapped_fields.into_iter().collect(),
        })
    }

    fn download(&self, id: &StructureId) -> Result<Utf8PathBuf, IngestError> {
        let temp = tempfile::Builder::new()
            .prefix("pdbx-ingest-gz")
            .suffix(".xml.gz")
            .tempfile_in(self.files.cache_root().as_std_path())
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        self.rcsb.download_structure_xml(id, temp.path())?;

        let gz_path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|_| IngestError::Filesystem("non-utf8 temp path".to_string()))?;
        let xml_path = self.files.decompress_into_cache(&gz_path, id)?;

        self.files.write_metadata(
            id,
            &DownloadMetadata {
                structure: id.as_str().to_string(),
                source_url: RcsbHttpClient::structure_xml_url(id),
                downloaded_at: iso_timestamp(),
                tool: format!("pdbx-ingest/{}", env!("CARGO_PKG_VERSION")),
            },
        )?;
        Ok(xml_path)
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
