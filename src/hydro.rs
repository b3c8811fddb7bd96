use crate::extract::AtomSiteRecord;

/// Kyte-Doolittle (1982) hydropathy values keyed by the standard
/// three-letter residue codes. Positive = hydrophobic.
pub const KYTE_DOOLITTLE: [(&str, f64); 20] = [
    ("ALA", 1.8),
    ("ARG", -4.5),
    ("ASN", -3.5),
    ("ASP", -3.5),
    ("CYS", 2.5),
    ("GLN", -3.5),
    ("GLU", -3.5),
    ("GLY", -0.4),
    ("HIS", -3.2),
    ("ILE", 4.5),
    ("LEU", 3.8),
    ("LYS", -3.9),
    ("MET", 1.9),
    ("PHE", 2.8),
    ("PRO", -1.6),
    ("SER", -0.8),
    ("THR", -0.7),
    ("TRP", -0.9),
    ("TYR", -1.3),
    ("VAL", 4.2),
];

/// Looks up the hydropathy value for a three-letter residue code.
///
/// Returns `None` for anything outside the 20 standard residues (water,
/// ligands, modified residues).
pub fn hydropathy(code: &str) -> Option<f64> {
    KYTE_DOOLITTLE
        .iter()
        .find(|(residue, _)| *residue == code)
        .map(|(_, score)| *score)
}

/// Stamps `hidro_score` onto the record from its `label_comp_id` field.
/// Unknown residue codes leave the score unset, which persists as NULL.
pub fn enrich(record: &mut AtomSiteRecord) {
    record.hidro_score = record
        .field("label_comp_id")
        .and_then(|code| hydropathy(code));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydropathy_of_standard_residues() {
        assert_eq!(hydropathy("GLY"), Some(-0.4));
        assert_eq!(hydropathy("ALA"), Some(1.8));
        assert_eq!(hydropathy("ILE"), Some(4.5));
        assert_eq!(hydropathy("ARG"), Some(-4.5));
    }

    #[test]
    fn hydropathy_of_unknown_code() {
        assert_eq!(hydropathy("HOH"), None);
        assert_eq!(hydropathy("gly"), None);
        assert_eq!(hydropathy(""), None);
    }

    #[test]
    fn table_covers_twenty_residues() {
        assert_eq!(KYTE_DOOLITTLE.len(), 20);
    }
}
