use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

/// Whether any of `targets` needs rebuilding from `contents`.
///
/// True when there are no targets, when a target is missing, or when the newest content
/// file is strictly newer than a target. Content files that do not exist are ignored.
pub fn is_stale(targets: &[PathBuf], contents: &[PathBuf]) -> bool {
  if targets.is_empty() {
    return true;
  }

  let newest = newest_mtime(contents);
  targets.iter().any(|target| match mtime(target) {
    Some(built) => newest.is_some_and(|newest| newest > built),
    None => true,
  })
}

fn newest_mtime(contents: &[PathBuf]) -> Option<SystemTime> {
  contents.iter().filter_map(|path| mtime(path)).max()
}

fn mtime(path: &Path) -> Option<SystemTime> {
  match fs::metadata(path).and_then(|meta| meta.modified()) {
    Ok(time) => Some(time),
    Err(err) if err.kind() == ErrorKind::NotFound => None,
    Err(err) => {
      warn!(path = %path.display(), error = %err, "could not read modification time");
      None
    }
  }
}
