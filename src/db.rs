use std::collections::BTreeSet;

use camino::Utf8Path;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use tracing::{debug, warn};

use crate::domain::StructureId;
use crate::error::IngestError;
use crate::extract::AtomSiteRecord;
use crate::hydro;

pub const ATOM_SITES_TABLE: &str = "atom_sites";

/// Bumped whenever the column set changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Real,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl Column {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Text,
        }
    }

    const fn real(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Real,
        }
    }
}

/// The full column set of the `atom_sites` table. Record fields are mapped
/// through this table and nowhere else; a field without a column here is
/// reported, never silently dropped.
pub static ATOM_SITE_COLUMNS: &[Column] = &[
    Column::text("atom_site_id"),
    Column::text("protein_name"),
    Column::text("b_iso_or_equiv"),
    Column::text("cartn_x"),
    Column::text("cartn_y"),
    Column::text("cartn_z"),
    Column::text("auth_asym_id"),
    Column::text("auth_atom_id"),
    Column::text("auth_comp_id"),
    Column::text("auth_seq_id"),
    Column::text("group_pdb"),
    Column::text("label_alt_id"),
    Column::text("label_asym_id"),
    Column::text("label_atom_id"),
    Column::text("label_comp_id"),
    Column::text("label_entity_id"),
    Column::text("label_seq_id"),
    Column::text("occupancy"),
    Column::text("pdbx_pdb_model_num"),
    Column::text("type_symbol"),
    Column::real("hidro_score"),
];

pub fn has_column(name: &str) -> bool {
    ATOM_SITE_COLUMNS.iter().any(|column| column.name == name)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistStats {
    pub total: usize,
    pub inserted: usize,
    pub skipped_existing: usize,
    pub unmapped_fields: BTreeSet<String>,
}

/// SQLite-backed destination for atom_site records. One connection per
/// ingestion run, owned by the caller.
pub struct AtomSiteStore {
    conn: Connection,
}

impl AtomSiteStore {
    pub fn open(path: &Utf8Path) -> Result<Self, IngestError> {
        let conn = Connection::open(path.as_std_path()).map_err(|err| IngestError::StoreOpen {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { conn })
    }

    /// Creates the `atom_sites` table from [`ATOM_SITE_COLUMNS`] unless the
    /// catalog already has it.
    pub fn ensure_schema(&self) -> Result<(), IngestError> {
        let exists = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .and_then(|mut stmt| stmt.exists(params![ATOM_SITES_TABLE]))
            .map_err(|err| IngestError::Schema {
                message: err.to_string(),
            })?;
        if exists {
            return Ok(());
        }
        debug!(table = ATOM_SITES_TABLE, "creating table");
        self.conn
            .execute(&create_table_sql(), [])
            .map_err(|err| IngestError::Schema {
                message: err.to_string(),
            })?;
        Ok(())
    }

    /// Whether a row with this composite key is already present.
    pub fn contains(&self, atom_site_id: &str, protein_name: &str) -> Result<bool, IngestError> {
        row_exists(&self.conn, atom_site_id, protein_name)
            .map_err(|err| store_error(protein_name, err))
    }

    /// Inserts one row. All record fields must map to known columns.
    pub fn insert(&self, record: &AtomSiteRecord) -> Result<(), IngestError> {
        insert_row(&self.conn, record)
            .map(|_| ())
            .map_err(|err| store_error(&record.protein_name, err))
    }

    /// Persists a batch of extracted records inside a single transaction:
    /// rows already present are skipped (the key check runs on raw identity
    /// fields, before enrichment), everything else is enriched and inserted.
    /// A failure rolls the whole structure back.
    pub fn persist(
        &mut self,
        structure: &StructureId,
        records: &mut [AtomSiteRecord],
    ) -> Result<PersistStats, IngestError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|err| store_error(structure.as_str(), err))?;

        let mut stats = PersistStats::default();
        for record in records.iter_mut() {
            stats.total += 1;
            let present = row_exists(&tx, &record.atom_site_id, &record.protein_name)
                .map_err(|err| store_error(structure.as_str(), err))?;
            if present {
                stats.skipped_existing += 1;
                continue;
            }

            hydro::enrich(record);
            for name in record.field_names() {
                if !has_column(name) && stats.unmapped_fields.insert(name.to_string()) {
                    warn!(
                        structure = structure.as_str(),
                        field = name,
                        "record field has no column in the atom_sites schema"
                    );
                }
            }
            insert_row(&tx, record).map_err(|err| store_error(structure.as_str(), err))?;
            stats.inserted += 1;
        }

        tx.commit()
            .map_err(|err| store_error(structure.as_str(), err))?;
        debug!(
            structure = structure.as_str(),
            inserted = stats.inserted,
            skipped = stats.skipped_existing,
            "persisted atom_site records"
        );
        Ok(stats)
    }
}

fn store_error(structure: &str, err: impl std::fmt::Display) -> IngestError {
    IngestError::Store {
        structure: structure.to_string(),
        message: err.to_string(),
    }
}

fn create_table_sql() -> String {
    let columns = ATOM_SITE_COLUMNS
        .iter()
        .map(|column| format!("{} {}", column.name, column.column_type.sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {ATOM_SITES_TABLE} ({columns})")
}

fn insert_sql() -> String {
    let names = ATOM_SITE_COLUMNS
        .iter()
        .map(|column| column.name)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=ATOM_SITE_COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {ATOM_SITES_TABLE} ({names}) VALUES ({placeholders})")
}

fn row_exists(
    conn: &Connection,
    atom_site_id: &str,
    protein_name: &str,
) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM atom_sites WHERE atom_site_id = ?1 AND protein_name = ?2",
    )?;
    stmt.exists(params![atom_site_id, protein_name])
}

fn insert_row(conn: &Connection, record: &AtomSiteRecord) -> rusqlite::Result<usize> {
    let values = ATOM_SITE_COLUMNS
        .iter()
        .map(|column| column_value(record, column));
    let mut stmt = conn.prepare_cached(&insert_sql())?;
    stmt.execute(params_from_iter(values))
}

fn column_value(record: &AtomSiteRecord, column: &Column) -> Value {
    match column.name {
        "atom_site_id" => Value::Text(record.atom_site_id.clone()),
        "protein_name" => Value::Text(record.protein_name.clone()),
        "hidro_score" => record
            .hidro_score
            .map(Value::Real)
            .unwrap_or(Value::Null),
        name => match record.field(name) {
            Some(text) => Value::Text(text.to_string()),
            None => Value::Null,
        },
    }
}
