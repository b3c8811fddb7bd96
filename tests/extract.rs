use std::io::Cursor;

use pdbx_ingest::domain::StructureId;
use pdbx_ingest::extract::extract_atom_sites;

const TWO_ATOM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PDBx:datablock datablockName="5E2V" xmlns:PDBx="http://pdbml.pdb.org/schema/pdbx-v50.xsd">
  <PDBx:atom_siteCategory>
    <PDBx:atom_site id="1">
      <PDBx:B_iso_or_equiv>54.21</PDBx:B_iso_or_equiv>
      <PDBx:Cartn_x>-5.804</PDBx:Cartn_x>
      <PDBx:Cartn_y>24.702</PDBx:Cartn_y>
      <PDBx:Cartn_z>-10.3</PDBx:Cartn_z>
      <PDBx:auth_asym_id>A</PDBx:auth_asym_id>
      <PDBx:auth_seq_id>101</PDBx:auth_seq_id>
      <PDBx:group_PDB>ATOM</PDBx:group_PDB>
      <PDBx:label_alt_id/>
      <PDBx:label_comp_id>GLY</PDBx:label_comp_id>
      <PDBx:occupancy>1.0</PDBx:occupancy>
      <PDBx:pdbx_PDB_model_num>1</PDBx:pdbx_PDB_model_num>
      <PDBx:type_symbol>N</PDBx:type_symbol>
    </PDBx:atom_site>
    <PDBx:atom_site id="2">
      <PDBx:Cartn_x>-4.52</PDBx:Cartn_x>
      <PDBx:group_PDB>ATOM</PDBx:group_PDB>
      <PDBx:label_comp_id>ALA</PDBx:label_comp_id>
    </PDBx:atom_site>
  </PDBx:atom_siteCategory>
</PDBx:datablock>
"#;

fn structure(id: &str) -> StructureId {
    id.parse().unwrap()
}

#[test]
fn extracts_records_in_document_order() {
    let records = extract_atom_sites(Cursor::new(TWO_ATOM_XML), &structure("5e2v")).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].atom_site_id, "1");
    assert_eq!(records[1].atom_site_id, "2");
    assert_eq!(records[0].protein_name, "5e2v");
    assert_eq!(records[1].protein_name, "5e2v");
}

#[test]
fn lowercases_child_element_names() {
    let records = extract_atom_sites(Cursor::new(TWO_ATOM_XML), &structure("5e2v")).unwrap();

    let first = &records[0];
    assert_eq!(first.field("b_iso_or_equiv"), Some("54.21"));
    assert_eq!(first.field("cartn_x"), Some("-5.804"));
    assert_eq!(first.field("group_pdb"), Some("ATOM"));
    assert_eq!(first.field("pdbx_pdb_model_num"), Some("1"));
    assert_eq!(first.field("label_comp_id"), Some("GLY"));
}

#[test]
fn empty_child_element_becomes_null_field() {
    let records = extract_atom_sites(Cursor::new(TWO_ATOM_XML), &structure("5e2v")).unwrap();

    let first = &records[0];
    assert!(first.field_names().any(|name| name == "label_alt_id"));
    assert_eq!(first.field("label_alt_id"), None);
}

#[test]
fn absent_field_is_distinct_from_present_null() {
    let records = extract_atom_sites(Cursor::new(TWO_ATOM_XML), &structure("5e2v")).unwrap();

    let second = &records[1];
    assert!(!second.field_names().any(|name| name == "label_alt_id"));
    assert_eq!(second.field("cartn_x"), Some("-4.52"));
}

#[test]
fn document_without_atom_sites_yields_empty_vec() {
    let xml = r#"<?xml version="1.0"?>
<PDBx:datablock xmlns:PDBx="http://pdbml.pdb.org/schema/pdbx-v50.xsd">
  <PDBx:cellCategory>
    <PDBx:cell entry_id="5E2V"><PDBx:length_a>79.96</PDBx:length_a></PDBx:cell>
  </PDBx:cellCategory>
</PDBx:datablock>
"#;
    let records = extract_atom_sites(Cursor::new(xml), &structure("5e2v")).unwrap();
    assert!(records.is_empty());
}

#[test]
fn missing_id_attribute_is_a_parse_error() {
    let xml = r#"<PDBx:datablock xmlns:PDBx="http://pdbml.pdb.org/schema/pdbx-v50.xsd">
  <PDBx:atom_site><PDBx:type_symbol>C</PDBx:type_symbol></PDBx:atom_site>
</PDBx:datablock>
"#;
    let err = extract_atom_sites(Cursor::new(xml), &structure("5e2v")).unwrap_err();
    assert_matches::assert_matches!(err, pdbx_ingest::error::IngestError::Parse { .. });
}

#[test]
fn stamps_records_with_the_supplied_structure_name() {
    let records = extract_atom_sites(Cursor::new(TWO_ATOM_XML), &structure("1lyz")).unwrap();
    assert!(records.iter().all(|record| record.protein_name == "1lyz"));
}
