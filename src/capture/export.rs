//! Export targets for captured assets.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::capture::asset::AssetRecord;
use crate::capture::CaptureError;

/// Somewhere the exported JSON can be written.
pub trait ExportTarget {
    fn name(&self) -> &str;

    fn write(&self, payload: &str) -> Result<(), CaptureError>;
}

/// Writes the export to a file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
    label: String,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }
}

impl ExportTarget for FileTarget {
    fn name(&self) -> &str {
        &self.label
    }

    fn write(&self, payload: &str) -> Result<(), CaptureError> {
        fs::write(&self.path, payload).map_err(|source| CaptureError::Write {
            target: self.label.clone(),
            source,
        })
    }
}

/// Writes the export to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutTarget;

impl ExportTarget for StdoutTarget {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write(&self, payload: &str) -> Result<(), CaptureError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", payload).map_err(|source| CaptureError::Write {
            target: "stdout".to_string(),
            source,
        })
    }
}

/// Write records as a pretty JSON array to `primary`, or to `fallback` if
/// that fails. Returns the name of the target that took the export.
pub fn export_with_fallback(
    records: &[AssetRecord],
    primary: &dyn ExportTarget,
    fallback: &dyn ExportTarget,
) -> Result<String, CaptureError> {
    let payload = serde_json::to_string_pretty(records)?;

    let primary_err = match primary.write(&payload) {
        Ok(()) => {
            tracing::info!(assets = records.len(), destination = primary.name(), "Exported assets");
            return Ok(primary.name().to_string());
        }
        Err(e) => e,
    };
    tracing::warn!(destination = primary.name(), error = %primary_err, "Primary export failed, using fallback");

    match fallback.write(&payload) {
        Ok(()) => {
            tracing::info!(assets = records.len(), destination = fallback.name(), "Exported assets");
            Ok(fallback.name().to_string())
        }
        Err(fallback_err) => Err(CaptureError::Export {
            primary: Box::new(primary_err),
            fallback: Box::new(fallback_err),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory target that can be told to fail.
    pub struct MemoryTarget {
        name: String,
        fail: bool,
        buffer: Mutex<String>,
    }

    impl MemoryTarget {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                fail: false,
                buffer: Mutex::new(String::new()),
            }
        }

        pub fn failing(name: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(name)
            }
        }

        pub fn contents(&self) -> String {
            self.buffer.lock().unwrap().clone()
        }
    }

    impl ExportTarget for MemoryTarget {
        fn name(&self) -> &str {
            &self.name
        }

        fn write(&self, payload: &str) -> Result<(), CaptureError> {
            if self.fail {
                return Err(CaptureError::Write {
                    target: self.name.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            self.buffer.lock().unwrap().push_str(payload);
            Ok(())
        }
    }

    fn records() -> Vec<AssetRecord> {
        vec![AssetRecord {
            asset_id: "a1".into(),
            filename: "mug.jpg".into(),
            tags: vec!["mug".into()],
            width: 1500,
            height: 1500,
        }]
    }

    #[test]
    fn test_primary_used_when_it_works() {
        let primary = MemoryTarget::new("clipboard");
        let fallback = MemoryTarget::new("textarea");
        let target = export_with_fallback(&records(), &primary, &fallback).unwrap();

        assert_eq!(target, "clipboard");
        assert!(fallback.contents().is_empty());
        let parsed: Vec<AssetRecord> = serde_json::from_str(&primary.contents()).unwrap();
        assert_eq!(parsed, records());
    }

    #[test]
    fn test_both_failing_reports_both() {
        let err = export_with_fallback(
            &records(),
            &MemoryTarget::failing("clipboard"),
            &MemoryTarget::failing("textarea"),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("clipboard"));
        assert!(message.contains("textarea"));
    }

    #[test]
    fn test_file_target_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.json");
        let target = FileTarget::new(&path);
        export_with_fallback(&records(), &target, &MemoryTarget::new("unused")).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[\n  {"));
    }
}
