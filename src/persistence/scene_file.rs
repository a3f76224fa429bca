//! JSON scene seed loader.
//!
//! A scene file is a JSON array of [`ObjectRecord`]s. It stands in for the
//! host's saved home: the server loads it once at startup.

use std::path::Path;

use super::models::ObjectRecord;
use crate::domain::SceneObject;
use crate::error::SyncError;

/// Parses scene objects from JSON text.
///
/// # Errors
///
/// Returns [`SyncError::Scene`] if the text is not an array of records.
pub fn parse_scene(json: &str) -> Result<Vec<SceneObject>, SyncError> {
    let records: Vec<ObjectRecord> = serde_json::from_str(json)
        .map_err(|e| SyncError::Scene(format!("invalid scene JSON: {e}")))?;
    Ok(records
        .into_iter()
        .map(ObjectRecord::into_scene_object)
        .collect())
}

/// Reads and parses a scene file.
///
/// # Errors
///
/// Returns [`SyncError::Scene`] if the file cannot be read or parsed.
pub async fn load_scene(path: &Path) -> Result<Vec<SceneObject>, SyncError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::Scene(format!("cannot read {}: {e}", path.display())))?;
    let objects = parse_scene(&json)?;
    tracing::info!(path = %path.display(), objects = objects.len(), "scene loaded");
    Ok(objects)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_of_records() {
        let json = r#"[
            {"id": "lamp", "name": "Lamp", "kind": "light"},
            {"name": "Sofa"}
        ]"#;
        let Ok(objects) = parse_scene(json) else {
            panic!("scene must parse");
        };
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.first().map(|o| o.id.as_str()), Some("lamp"));
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            parse_scene(r#"{"name": "Lamp"}"#),
            Err(SyncError::Scene(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_a_scene_error() {
        let result = load_scene(Path::new("/nonexistent/scene.json")).await;
        assert!(matches!(result, Err(SyncError::Scene(_))));
    }
}
