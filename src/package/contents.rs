use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use same_file::is_same_file;

use crate::error::{PackageError, PackageResult};

/// Ordered explicit includes followed by sorted implicit includes, first occurrence kept.
pub fn content_sequence(ordered: &[PathBuf], implicit: &[PathBuf]) -> Vec<PathBuf> {
  let mut implicit = implicit.to_vec();
  implicit.sort();

  let mut seen = BTreeSet::new();
  ordered
    .iter()
    .chain(&implicit)
    .filter(|path| seen.insert(path.as_path()))
    .cloned()
    .collect()
}

/// Remove every target from the sequence so a package never consumes its own output.
pub fn exclude_targets(sequence: Vec<PathBuf>, targets: &[PathBuf]) -> Vec<PathBuf> {
  sequence
    .into_iter()
    .filter(|path| !targets.iter().any(|target| is_target(path, target)))
    .collect()
}

/// Raw file contents joined in order, each followed by `separator`.
pub fn concatenate(paths: &[PathBuf], separator: &str) -> PackageResult<String> {
  let mut body = String::new();
  for path in paths {
    body.push_str(&fs::read_to_string(path).map_err(|err| PackageError::io(path, err))?);
    body.push_str(separator);
  }
  Ok(body)
}

fn is_target(path: &Path, target: &Path) -> bool {
  // Errors mean one side does not exist, in which case only the lexical comparison counts.
  path == target || is_same_file(path, target).unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn paths(values: &[&str]) -> Vec<PathBuf> {
    values.iter().map(PathBuf::from).collect()
  }

  #[test]
  fn ordered_then_sorted_implicit() {
    let sequence = content_sequence(&paths(&["b.js", "a.js"]), &paths(&["d.js", "c.js"]));
    assert_eq!(sequence, paths(&["b.js", "a.js", "c.js", "d.js"]));
  }

  #[test]
  fn duplicates_keep_first_occurrence() {
    let sequence = content_sequence(&paths(&["b.js", "a.js"]), &paths(&["a.js", "c.js"]));
    assert_eq!(sequence, paths(&["b.js", "a.js", "c.js"]));
  }

  #[test]
  fn removes_targets_by_path() {
    let sequence = exclude_targets(
      paths(&["a.css", "all.css", "all-resources.css"]),
      &paths(&["all.css", "all-resources.css"]),
    );
    assert_eq!(sequence, paths(&["a.css"]));
  }

  #[test]
  fn removes_target_reached_through_another_path() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("all.js"), "").unwrap();
    fs::write(dir.path().join("a.js"), "").unwrap();

    let indirect = dir.path().join("lib").join("..").join("all.js");
    let sequence = exclude_targets(
      vec![dir.path().join("a.js"), indirect],
      &[dir.path().join("all.js")],
    );
    assert_eq!(sequence, vec![dir.path().join("a.js")]);
  }

  #[test]
  fn no_target_leaves_sequence_alone() {
    assert_eq!(exclude_targets(paths(&["a.js"]), &[]), paths(&["a.js"]));
  }

  #[test]
  fn concatenates_with_separator() {
    let dir = tempdir().unwrap();
    let (a, b) = (dir.path().join("a.js"), dir.path().join("b.js"));
    fs::write(&a, "var a = 1").unwrap();
    fs::write(&b, "var b = 2").unwrap();

    assert_eq!(concatenate(&[a, b], ";\n").unwrap(), "var a = 1;\nvar b = 2;\n");
    assert!(matches!(
      concatenate(&[dir.path().join("gone.js")], ""),
      Err(PackageError::Io { .. })
    ));
  }
}
