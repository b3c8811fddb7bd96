use std::collections::BTreeMap;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::domain::StructureId;
use crate::error::IngestError;

/// One row-to-be per atom in the structure: the element's `id` attribute,
/// the structure it was ingested under, and the direct child elements as a
/// field map keyed by lower-cased local name.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSiteRecord {
    pub atom_site_id: String,
    pub protein_name: String,
    fields: BTreeMap<String, Option<String>>,
    pub hidro_score: Option<f64>,
}

impl AtomSiteRecord {
    pub fn new(atom_site_id: String, protein_name: String) -> Self {
        Self {
            atom_site_id,
            protein_name,
            fields: BTreeMap::new(),
            hidro_score: None,
        }
    }

    pub fn set_field(&mut self, name: String, value: Option<String>) {
        self.fields.insert(name, value);
    }

    /// Text content of a child element, `None` when the element was absent
    /// or had no text.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_deref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Streams over a PDBx/XML document and projects every `atom_site` element
/// (namespace prefix stripped) into an [`AtomSiteRecord`], in document order.
///
/// A document without atom_site elements yields an empty Vec.
pub fn extract_atom_sites<R: BufRead>(
    reader: R,
    structure: &StructureId,
) -> Result<Vec<AtomSiteRecord>, IngestError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml
            .read_event_into(&mut buf)
            .map_err(|err| parse_error(structure, &err))?
        {
            Event::Start(start) if is_atom_site(&start) => {
                let atom_site_id = id_attribute(&start, structure)?;
                records.push(read_atom_site(&mut xml, atom_site_id, structure)?);
            }
            Event::Empty(start) if is_atom_site(&start) => {
                let atom_site_id = id_attribute(&start, structure)?;
                records.push(AtomSiteRecord::new(
                    atom_site_id,
                    structure.as_str().to_string(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn is_atom_site(start: &BytesStart<'_>) -> bool {
    start.local_name().as_ref() == b"atom_site"
}

fn id_attribute(start: &BytesStart<'_>, structure: &StructureId) -> Result<String, IngestError> {
    let attribute = start
        .try_get_attribute("id")
        .map_err(|err| parse_error(structure, &err))?
        .ok_or_else(|| IngestError::Parse {
            structure: structure.as_str().to_string(),
            message: "atom_site element missing id attribute".to_string(),
        })?;
    let value = attribute
        .unescape_value()
        .map_err(|err| parse_error(structure, &err))?;
    Ok(value.into_owned())
}

/// Reads the children of one atom_site element. Only direct children become
/// fields; deeper nesting is skipped.
fn read_atom_site<R: BufRead>(
    xml: &mut Reader<R>,
    atom_site_id: String,
    structure: &StructureId,
) -> Result<AtomSiteRecord, IngestError> {
    let mut record = AtomSiteRecord::new(atom_site_id, structure.as_str().to_string());
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut text: Option<String> = None;
    let mut depth = 0usize;

    loop {
        match xml
            .read_event_into(&mut buf)
            .map_err(|err| parse_error(structure, &err))?
        {
            Event::Start(child) => {
                depth += 1;
                if depth == 1 {
                    current = Some(local_name_lower(&child));
                    text = None;
                }
            }
            Event::Empty(child) => {
                if depth == 0 {
                    record.set_field(local_name_lower(&child), None);
                }
            }
            Event::Text(content) => {
                if depth == 1 && current.is_some() {
                    let value = content
                        .unescape()
                        .map_err(|err| parse_error(structure, &err))?;
                    append_text(&mut text, &value);
                }
            }
            Event::CData(content) => {
                if depth == 1 && current.is_some() {
                    let value = String::from_utf8_lossy(&content).into_owned();
                    append_text(&mut text, &value);
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                if depth == 1 {
                    if let Some(name) = current.take() {
                        record.set_field(name, text.take());
                    }
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(IngestError::Parse {
                    structure: structure.as_str().to_string(),
                    message: "unexpected end of document inside atom_site element".to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(record)
}

fn local_name_lower(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).to_lowercase()
}

fn append_text(text: &mut Option<String>, value: &str) {
    match text {
        Some(existing) => existing.push_str(value),
        None => *text = Some(value.to_string()),
    }
}

fn parse_error(structure: &StructureId, err: &dyn std::fmt::Display) -> IngestError {
    IngestError::Parse {
        structure: structure.as_str().to_string(),
        message: err.to_string(),
    }
}
