use std::fs;
use std::path::Path;

use thiserror::Error;

use quiz_core::model::{Catalog, CatalogDocument, CatalogError};

/// Errors raised while loading the bundled content document.
///
/// These are the only fatal startup errors: there is no retry, the caller
/// surfaces them and exits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("failed to read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse content file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Load and validate the bundled catalog from a JSON document on disk.
///
/// # Errors
///
/// Returns `ContentError` when the file cannot be read, parsed, or fails
/// catalog validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Catalog, ContentError> {
    let raw = fs::read_to_string(path)?;
    load_from_str(&raw)
}

/// Parse and validate a catalog from an in-memory JSON document.
///
/// # Errors
///
/// Returns `ContentError` when the document cannot be parsed or fails
/// catalog validation.
pub fn load_from_str(raw: &str) -> Result<Catalog, ContentError> {
    let document: CatalogDocument = serde_json::from_str(raw)?;
    Ok(Catalog::from_document(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUNDLE: &str = r#"{
        "subjects": {"Anatomi": ["Hjartat"]},
        "questions": [
            {
                "id": "ana-0001",
                "source": "Anatomi/Hjartat",
                "question": "Vad gör sinusknutan?",
                "options": [
                    {"text": "Pumpar blod", "correct": false, "feedback": "Nej."},
                    {"text": "Sätter hjärtrytmen", "correct": true, "feedback": "Ja."}
                ],
                "tags": ["Anatomi"],
                "explanation": "Sinusknutan är hjärtats pacemaker."
            }
        ],
        "meta": {"total_questions": 1, "generated_at": "2024-01-01T00:00:00Z"}
    }"#;

    #[test]
    fn loads_bundle_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUNDLE.as_bytes()).unwrap();

        let catalog = load_from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.subjects().get("Anatomi").unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_from_path("/nonexistent/content.json").unwrap_err();
        assert!(matches!(err, ContentError::Io(_)));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = load_from_str("{not json").unwrap_err();
        assert!(matches!(err, ContentError::Parse(_)));
    }

    #[test]
    fn catalog_invariant_violations_are_fatal() {
        let raw = BUNDLE.replace(r#""correct": false"#, r#""correct": true"#);
        let err = load_from_str(&raw).unwrap_err();
        assert!(matches!(err, ContentError::Catalog(_)));
    }
}
