//! The stack definition file (`compose.json`).
//!
//! The document is kept as raw bytes and only inspected for the few fields
//! hostship needs: the names under `services`, `x-metadata.url` and
//! per-service `container_name`. Everything else passes through untouched,
//! so a refreshed definition is persisted exactly as it was served.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::constants::SERVICES_KEY;
use crate::core::HostshipError;
use crate::utils::atomic_write;

const NO_SERVICES: &str = "compose file must define services";

/// Read the definition at `path`, requiring at least one service.
pub fn load(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read stack definition {}", path.display()))?;
    service_names(&bytes)?;
    Ok(bytes)
}

/// Replace the definition at `path` with `bytes` (mode 0644).
pub fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    atomic_write(path, bytes, 0o644)
        .with_context(|| format!("Failed to write stack definition {}", path.display()))
}

fn parse(bytes: &[u8]) -> Result<Value, HostshipError> {
    serde_json::from_slice(bytes).map_err(|e| HostshipError::InvalidStackDefinition {
        reason: format!("invalid stack definition: {e}"),
    })
}

/// Names declared under `services`, in document order.
pub fn service_names(bytes: &[u8]) -> Result<Vec<String>, HostshipError> {
    let doc = parse(bytes)?;
    let names: Vec<String> = doc
        .get(SERVICES_KEY)
        .and_then(Value::as_object)
        .map(|services| services.keys().cloned().collect())
        .unwrap_or_default();

    if names.is_empty() {
        return Err(HostshipError::InvalidStackDefinition {
            reason: NO_SERVICES.to_string(),
        });
    }
    Ok(names)
}

/// The value at a dotted path such as `x-metadata.url`.
///
/// Missing keys, `null` and unparsable documents yield an empty string.
/// Numbers and booleans are rendered as JSON text.
pub fn string_field(bytes: &[u8], dotted_path: &str) -> String {
    let Ok(doc) = serde_json::from_slice::<Value>(bytes) else {
        return String::new();
    };

    let found = dotted_path.split('.').try_fold(&doc, |node, key| node.get(key));
    match found {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Container name of `service`: its `container_name`, or the name compose
/// assigns by default (`hostship-<service>-1`).
pub fn container_name(bytes: &[u8], project: &str, service: &str) -> String {
    let explicit = string_field(bytes, &format!("{SERVICES_KEY}.{service}.container_name"));
    if explicit.is_empty() { format!("{project}-{service}-1") } else { explicit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StackFixture;
    use tempfile::TempDir;

    #[test]
    fn test_service_names_in_document_order() {
        let bytes = StackFixture::new()
            .service("web", "nginx:1")
            .service("api", "app:2")
            .service("db", "postgres:16")
            .to_bytes();
        assert_eq!(service_names(&bytes).unwrap(), vec!["web", "api", "db"]);
    }

    #[test]
    fn test_service_names_requires_services() {
        for doc in [r#"{}"#, r#"{"services":{}}"#, r#"{"services":[]}"#, r#"{"services":null}"#] {
            let err = service_names(doc.as_bytes()).unwrap_err();
            assert_eq!(err.to_string(), "compose file must define services", "doc: {doc}");
        }
    }

    #[test]
    fn test_service_names_invalid_json() {
        let err = service_names(b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid stack definition"));
    }

    #[test]
    fn test_string_field() {
        let bytes = br#"{"x-metadata":{"url":"https://example.com/c.json","rev":3,"note":null}}"#;
        assert_eq!(string_field(bytes, "x-metadata.url"), "https://example.com/c.json");
        assert_eq!(string_field(bytes, "x-metadata.rev"), "3");
        assert_eq!(string_field(bytes, "x-metadata.note"), "");
        assert_eq!(string_field(bytes, "x-metadata.missing"), "");
        assert_eq!(string_field(bytes, "nope.url"), "");
        assert_eq!(string_field(b"garbage", "x-metadata.url"), "");
    }

    #[test]
    fn test_container_name() {
        let bytes = StackFixture::new()
            .service("web", "nginx")
            .service_with_container("db", "postgres", "main-db")
            .to_bytes();
        assert_eq!(container_name(&bytes, "hostship", "web"), "hostship-web-1");
        assert_eq!(container_name(&bytes, "hostship", "db"), "main-db");
    }

    #[test]
    fn test_load_and_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("compose.json");

        let bytes = StackFixture::new().service("web", "nginx").to_bytes();
        save(&path, &bytes).unwrap();
        assert_eq!(load(&path).unwrap(), bytes);

        std::fs::write(&path, br#"{"services":{}}"#).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HostshipError>(),
            Some(HostshipError::InvalidStackDefinition { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(load(&temp.path().join("compose.json")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("compose.json");
        save(&path, b"{}").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}
