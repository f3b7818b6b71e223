use crate::listing::{listing_id_from_str, DiscoveredRef};
use crate::{PiseroError, Result};
use serde::Deserialize;
use std::path::Path;

/// One entry of a JSON seed file. The id is optional; when absent it is
/// derived from the URL.
#[derive(Debug, Clone, Deserialize)]
struct SeedEntry {
    #[serde(default)]
    id: Option<String>,
    url: String,
}

/// Loads a seed file: a JSON array of `{id?, url}` objects.
///
/// Entries whose URL yields no derivable id are skipped with a warning. An
/// unreadable or malformed file is a fatal error, same as a broken config.
pub fn load_seed_refs(path: &Path) -> Result<Vec<DiscoveredRef>> {
    let content = std::fs::read_to_string(path).map_err(|e| PiseroError::Seed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let entries: Vec<SeedEntry> =
        serde_json::from_str(&content).map_err(|e| PiseroError::Seed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let mut refs = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = match entry.id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => match listing_id_from_str(&entry.url) {
                Some(id) => id,
                None => {
                    tracing::warn!("Seed entry {} has no derivable id, skipping", entry.url);
                    continue;
                }
            },
        };

        refs.push(DiscoveredRef {
            id,
            url: entry.url,
            anchor_text: String::new(),
        });
    }

    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn seed_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_seed_with_explicit_ids() {
        let file = seed_file(
            r#"[
                {"id": "piso/1", "url": "https://example.com/piso/1"},
                {"id": "piso/2", "url": "https://example.com/piso/2"}
            ]"#,
        );

        let refs = load_seed_refs(file.path()).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "piso/1");
        assert_eq!(refs[1].url, "https://example.com/piso/2");
    }

    #[test]
    fn test_load_seed_derives_missing_ids() {
        let file = seed_file(r#"[{"url": "https://example.com/casa-sol/42/"}]"#);

        let refs = load_seed_refs(file.path()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, "casa-sol/42");
    }

    #[test]
    fn test_load_seed_skips_underivable_entries() {
        let file = seed_file(
            r#"[
                {"url": "https://example.com/"},
                {"url": "https://example.com/casa-sol/42/"}
            ]"#,
        );

        let refs = load_seed_refs(file.path()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, "casa-sol/42");
    }

    #[test]
    fn test_load_seed_missing_file_is_fatal() {
        let result = load_seed_refs(Path::new("/nonexistent/seeds.json"));
        assert!(matches!(result, Err(PiseroError::Seed { .. })));
    }

    #[test]
    fn test_load_seed_malformed_json_is_fatal() {
        let file = seed_file("{ not json ]");
        let result = load_seed_refs(file.path());
        assert!(matches!(result, Err(PiseroError::Seed { .. })));
    }

    #[test]
    fn test_empty_id_falls_back_to_derivation() {
        let file = seed_file(r#"[{"id": "", "url": "https://example.com/casa-sol/42/"}]"#);
        let refs = load_seed_refs(file.path()).unwrap();
        assert_eq!(refs[0].id, "casa-sol/42");
    }
}
