use crate::error::{RecogError, RecogResult};
use crate::glyph::{GlyphRecord, StrokeSet};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Parse a JSON template library: an array of `{ "char", "strokes" }` records
pub fn parse_library(json: &str) -> RecogResult<Vec<GlyphRecord>> {
    let records: Vec<GlyphRecord> = serde_json::from_str(json)?;
    validate_records(&records)?;
    Ok(records)
}

/// Parse a template library from any reader
pub fn parse_library_from_reader<R: Read>(reader: R) -> RecogResult<Vec<GlyphRecord>> {
    let records: Vec<GlyphRecord> = serde_json::from_reader(reader)?;
    validate_records(&records)?;
    Ok(records)
}

/// Load a template library from a JSON file
pub fn load_library_from_file<P: AsRef<Path>>(path: P) -> RecogResult<Vec<GlyphRecord>> {
    let json = fs::read_to_string(path)?;
    parse_library(&json)
}

/// Parse one drawn glyph: a bare `[[[x, y], ...], ...]` stroke array
pub fn parse_strokes(json: &str) -> RecogResult<StrokeSet> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize records back to the library format
pub fn library_to_json(records: &[GlyphRecord]) -> RecogResult<String> {
    Ok(serde_json::to_string(records)?)
}

fn validate_records(records: &[GlyphRecord]) -> RecogResult<()> {
    for (i, record) in records.iter().enumerate() {
        record.validate().map_err(|e| match e {
            RecogError::InvalidGlyphData { message } => {
                RecogError::invalid_glyph_data(format!("record {}: {}", i, message))
            }
            other => other,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::Point;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LIBRARY: &str = r#"[
        {"char":"一","strokes":[[[0,50],[100,50]]]},
        {"char":"十","strokes":[[[0,50],[100,50]],[[50,0],[50,100]]]}
    ]"#;

    #[test]
    fn test_parse_library() {
        let records = parse_library(LIBRARY).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label, "十");
        assert_eq!(records[1].strokes[1][1], Point::new(50.0, 100.0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_library("[{"), Err(RecogError::Json(_))));
        let err = parse_library(r#"[{"char":"a","strokes":[[[0,0]]]},{"char":"","strokes":[[[0,0]]]}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_load_from_file_and_reader() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LIBRARY.as_bytes()).unwrap();

        let records = load_library_from_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);

        let from_reader = parse_library_from_reader(LIBRARY.as_bytes()).unwrap();
        assert_eq!(records, from_reader);

        assert!(matches!(
            load_library_from_file("/nonexistent/library.json"),
            Err(RecogError::Io(_))
        ));
    }

    #[test]
    fn test_parse_strokes_and_write_back() {
        let strokes = parse_strokes("[[[1,2],[3,4]],[]]").unwrap();
        assert_eq!(strokes.len(), 2);
        assert!(strokes[1].is_empty());

        let records = parse_library(LIBRARY).unwrap();
        let json = library_to_json(&records).unwrap();
        assert_eq!(parse_library(&json).unwrap(), records);
    }
}
