//! Sidecar metadata files stored next to a container.
//!
//! The sidecar for `boot.rts.png` is `boot.rts.png.meta.json`. Older tools replaced the image
//! extension instead (`boot.meta.json`); that name is still read, but never written.

use crate::error::PixelRtsResult;
use crate::metadata::Metadata;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Suffix appended to a container path to name its sidecar.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

/// Path of the sidecar written for `container`.
pub fn sidecar_path(container: &Path) -> PathBuf {
    let mut name = container.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Sidecar path used by older tools: `.rts.png` or `.png` replaced by `.meta.json`.
pub fn legacy_sidecar_path(container: &Path) -> Option<PathBuf> {
    let file_name = container.file_name()?.to_str()?;
    let stem = file_name
        .strip_suffix(".rts.png")
        .or_else(|| file_name.strip_suffix(".png"))?;
    Some(container.with_file_name(format!("{stem}{SIDECAR_SUFFIX}")))
}

/// Writes `metadata` as pretty JSON to the sidecar of `container`.
pub fn write_sidecar(container: &Path, metadata: &Metadata) -> PixelRtsResult<PathBuf> {
    let path = sidecar_path(container);
    fs::write(&path, metadata.to_json_pretty()?)?;
    info!("Wrote sidecar metadata to {}", path.display());
    Ok(path)
}

/// Reads the raw sidecar document of `container`, if one exists.
///
/// The current name is tried first, then the legacy name.
pub fn read_sidecar(container: &Path) -> PixelRtsResult<Option<Value>> {
    let candidates = core::iter::once(sidecar_path(container)).chain(legacy_sidecar_path(container));
    for path in candidates {
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!("Using sidecar metadata from {}", path.display());
                return Ok(Some(serde_json::from_str(&text)?));
            }
            Err(error) if error.kind() == ErrorKind::NotFound => continue,
            Err(error) => return Err(error.into()),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("boot.rts.png", "boot.rts.png.meta.json")]
    #[case("dir/image.png", "dir/image.png.meta.json")]
    #[case("noext", "noext.meta.json")]
    fn sidecar_appends_suffix(#[case] container: &str, #[case] expected: &str) {
        assert_eq!(sidecar_path(Path::new(container)), PathBuf::from(expected));
    }

    #[rstest]
    #[case("boot.rts.png", Some("boot.meta.json"))]
    #[case("dir/image.png", Some("dir/image.meta.json"))]
    #[case("image.bin", None)]
    fn legacy_name_replaces_extension(#[case] container: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            legacy_sidecar_path(Path::new(container)),
            expected.map(PathBuf::from)
        );
    }

    #[test]
    fn missing_sidecar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_sidecar(&dir.path().join("absent.png")).unwrap().is_none());
    }

    #[test]
    fn legacy_sidecar_is_read_when_current_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("boot.rts.png");
        fs::write(dir.path().join("boot.meta.json"), r#"{"name":"legacy"}"#).unwrap();
        assert_eq!(read_sidecar(&container).unwrap(), Some(json!({"name": "legacy"})));

        fs::write(sidecar_path(&container), r#"{"name":"current"}"#).unwrap();
        assert_eq!(read_sidecar(&container).unwrap(), Some(json!({"name": "current"})));
    }
}
