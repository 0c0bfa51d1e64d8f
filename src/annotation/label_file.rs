//! Label files: one normalized annotation per line, no header

use std::fs;
use std::path::Path;

use log::debug;

use crate::annotation::record::NormalizedAnnotation;
use crate::errors::{GeoLabelError, Result};

/// Read every record of a label file; blank lines are ignored
pub fn read_label_file(path: &Path) -> Result<Vec<NormalizedAnnotation>> {
    let text = fs::read_to_string(path).map_err(|e| GeoLabelError::io_at(path, e))?;
    let records = parse_labels(&text, path)?;
    debug!("Read {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Parse label text; `path` only appears in error messages
pub fn parse_labels(text: &str, path: &Path) -> Result<Vec<NormalizedAnnotation>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            NormalizedAnnotation::parse_line(line).map_err(|message| GeoLabelError::LabelParse {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            })
        })
        .collect()
}

/// Write records, one per line, replacing any existing file
pub fn write_label_file(path: &Path, records: &[NormalizedAnnotation]) -> Result<()> {
    let text: String = records.iter().map(|r| format!("{}\n", r)).collect();
    fs::write(path, text).map_err(|e| GeoLabelError::io_at(path, e))?;
    debug!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tile.txt");
        let records = vec![
            NormalizedAnnotation::new(0, 0.5, 0.5, 0.25, 0.125).unwrap(),
            NormalizedAnnotation::new(2, 0.75, 0.1, 0.5, 0.2).unwrap(),
        ];
        write_label_file(&path, &records).unwrap();
        assert_eq!(read_label_file(&path).unwrap(), records);
    }

    #[test]
    fn empty_file_has_no_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        write_label_file(&path, &[]).unwrap();
        assert!(read_label_file(&path).unwrap().is_empty());
    }

    #[test]
    fn errors_carry_line_numbers() {
        let text = "0 0.5 0.5 0.1 0.1\n\n1 0.2 0.2 0.1\n";
        match parse_labels(text, Path::new("labels/a.txt")) {
            Err(GeoLabelError::LabelParse { line, message, .. }) => {
                assert_eq!(line, 3);
                assert!(message.contains("5 fields"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
