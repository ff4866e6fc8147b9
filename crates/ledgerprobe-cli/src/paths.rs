//! Store path discovery and normalization.

use std::path::{is_separator, Path, PathBuf};

/// `<home>/.ledgerprobe/lmdb`, or `./.ledgerprobe/lmdb` when no home
/// directory is known.
pub fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ledgerprobe")
        .join("lmdb")
}

/// Strip trailing separators, leaving a bare root untouched.
pub fn remove_trailing_path_separator(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    let trimmed = s.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        path.to_path_buf()
    } else {
        PathBuf::from(trimmed)
    }
}

/// The store path to use: command line first, then config file, then default.
pub fn resolve_store_path(cli: Option<&Path>, config: Option<&Path>) -> PathBuf {
    let path = cli
        .or(config)
        .map(Path::to_path_buf)
        .unwrap_or_else(default_store_path);
    remove_trailing_path_separator(&path)
}
