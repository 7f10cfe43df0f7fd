use std::path::{Path, PathBuf};

use qstats_core::error::{QstatsError, Result};

/// Sibling path used while an artifact is being written: `name.ext.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to a temp sibling then rename it over `path`.
///
/// Parent directories are created first. A directory at `path` is refused.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if path.is_dir() {
        return Err(QstatsError::InvalidInput(format!(
            "target path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| QstatsError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, bytes).map_err(|source| QstatsError::FileWrite {
        path: tmp.clone(),
        source,
    })?;

    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(QstatsError::FileWrite {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}
