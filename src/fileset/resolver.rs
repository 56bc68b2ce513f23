use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::debug;

use super::expand::FileSet;

/// A file set split by participation in the declared dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileSet {
  /// Included files that appear in the dependency mapping, sorted.
  pub explicit_includes: Vec<PathBuf>,
  /// Included files with no declared ordering constraint, sorted.
  pub implicit_includes: Vec<PathBuf>,
  /// Dependency edges as declared.
  pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
}

/// Partition `includes - excludes` into explicit and implicit includes.
///
/// A file is explicit when it appears anywhere in the dependency mapping, as key or value.
/// No ordering decision is made here beyond lexicographic sorting.
pub fn resolve_file_set(file_set: &FileSet) -> ResolvedFileSet {
  let closure: BTreeSet<&PathBuf> = file_set
    .dependencies
    .iter()
    .flat_map(|(key, values)| std::iter::once(key).chain(values))
    .collect();

  let (explicit_includes, implicit_includes): (Vec<PathBuf>, Vec<PathBuf>) = file_set
    .includes
    .difference(&file_set.excludes)
    .cloned()
    .partition(|path| closure.contains(path));

  debug!(
    explicit = explicit_includes.len(),
    implicit = implicit_includes.len(),
    "resolved file set"
  );

  ResolvedFileSet {
    explicit_includes,
    implicit_includes,
    dependencies: file_set.dependencies.clone(),
  }
}
