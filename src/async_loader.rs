//! Async I/O support for template libraries
//!
//! File reads go through tokio and JSON parsing runs on the blocking pool so
//! large libraries do not stall the runtime.

#![cfg(feature = "async")]

use crate::error::{RecogError, RecogResult};
use crate::glyph::GlyphRecord;
use crate::loader::parse_library;
use std::path::Path;
use tokio::{fs, task};

/// Async version of library loading from file
pub async fn load_library_from_file_async<P: AsRef<Path>>(
    path: P,
) -> RecogResult<Vec<GlyphRecord>> {
    let json = fs::read_to_string(path.as_ref()).await?;
    parse_library_async(json).await
}

/// Parse a JSON library on the blocking pool
pub async fn parse_library_async(json: String) -> RecogResult<Vec<GlyphRecord>> {
    task::spawn_blocking(move || parse_library(&json))
        .await
        .map_err(|e| RecogError::custom(format!("Task join error: {}", e)))?
}

/// Load several library files concurrently; results keep the order of `paths`
pub async fn load_multiple_libraries_async<P: AsRef<Path>>(
    paths: &[P],
) -> RecogResult<Vec<Vec<GlyphRecord>>> {
    let handles: Vec<_> = paths
        .iter()
        .map(|path| {
            let path = path.as_ref().to_path_buf();
            tokio::spawn(async move { load_library_from_file_async(path).await })
        })
        .collect();

    let mut libraries = Vec::with_capacity(handles.len());
    for handle in handles {
        let records = handle
            .await
            .map_err(|e| RecogError::custom(format!("Task join error: {}", e)))?;
        libraries.push(records?);
    }

    Ok(libraries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::Recognizer;
    use crate::store::StoreState;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_async_file_loading() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("library.json");
        tokio::fs::write(&path, r#"[{"char":"ア","strokes":[[[0,0],[10,0]],[[5,0],[2,10]]]}]"#)
            .await
            .unwrap();

        let records = load_library_from_file_async(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "ア");
    }

    #[tokio::test]
    async fn test_multiple_library_loading() {
        let temp_dir = tempdir().unwrap();

        let mut files = Vec::new();
        for i in 0..3 {
            let path = temp_dir.path().join(format!("library{}.json", i));
            let json = format!(
                r#"[{{"char":"{}","strokes":[[[0,0],[{},10]]]}}]"#,
                i,
                i + 1
            );
            tokio::fs::write(&path, json).await.unwrap();
            files.push(path);
        }

        let libraries = load_multiple_libraries_async(&files).await.unwrap();
        assert_eq!(libraries.len(), 3);
        for (i, records) in libraries.iter().enumerate() {
            assert_eq!(records[0].label, i.to_string());
        }
    }

    #[tokio::test]
    async fn test_recognizer_async_load_failure_then_success() {
        let temp_dir = tempdir().unwrap();
        let recognizer = Recognizer::default();

        let missing = temp_dir.path().join("missing.json");
        let err = recognizer.load_from_file_async(&missing).await.unwrap_err();
        assert!(matches!(err, RecogError::Io(_)));
        assert_eq!(recognizer.state(), StoreState::Empty);

        let path = temp_dir.path().join("library.json");
        tokio::fs::write(&path, r#"[{"char":"x","strokes":[[[0,0],[1,1]]]}]"#)
            .await
            .unwrap();
        assert_eq!(recognizer.load_from_file_async(&path).await.unwrap(), 1);
        assert!(recognizer.is_ready());
    }
}
