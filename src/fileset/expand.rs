use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::debug;

use crate::error::{PackageError, PackageResult};

/// Expands a configured path pattern into the files it names.
///
/// Glob matching lives outside this crate; callers plug in whatever expansion their build uses.
pub trait PathExpander {
  /// Returns every file the pattern names. Order is not significant.
  fn expand(&self, pattern: &Path) -> Vec<PathBuf>;
}

/// Expander that treats every pattern as a single literal path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralPaths;

impl PathExpander for LiteralPaths {
  fn expand(&self, pattern: &Path) -> Vec<PathBuf> {
    vec![pattern.to_path_buf()]
  }
}

impl<F> PathExpander for F
where
  F: Fn(&Path) -> Vec<PathBuf>,
{
  fn expand(&self, pattern: &Path) -> Vec<PathBuf> {
    self(pattern)
  }
}

/// Unexpanded include, exclude and dependency declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSetPatterns {
  /// Patterns naming the files to package.
  pub includes: Vec<PathBuf>,
  /// Patterns naming files to drop from the includes.
  pub excludes: Vec<PathBuf>,
  /// Key pattern mapped to the patterns it depends on.
  pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
}

/// Include, exclude and dependency declarations after pattern expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
  /// Every included file.
  pub includes: BTreeSet<PathBuf>,
  /// Every excluded file.
  pub excludes: BTreeSet<PathBuf>,
  /// File mapped to the files that must precede it, in declared order.
  pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl FileSet {
  /// Expand all patterns, normalising each resulting path lexically.
  ///
  /// A dependency key must name exactly one file. Keys that name nothing are dropped.
  pub fn expand(patterns: &FileSetPatterns, expander: &dyn PathExpander) -> PackageResult<Self> {
    let includes = expand_all(&patterns.includes, expander).collect();
    let excludes = expand_all(&patterns.excludes, expander).collect();

    let mut dependencies: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for (key_pattern, value_patterns) in &patterns.dependencies {
      let mut keys = expand_one(key_pattern, expander);
      let key = match keys.len() {
        0 => {
          debug!(pattern = %key_pattern.display(), "dependency key matched no files");
          continue;
        }
        1 => keys.remove(0),
        _ => {
          return Err(PackageError::AmbiguousDependencyKey {
            pattern: key_pattern.display().to_string(),
            matches: keys,
          });
        }
      };

      let entry = dependencies.entry(key).or_default();
      for value in expand_all(value_patterns, expander) {
        if !entry.contains(&value) {
          entry.push(value);
        }
      }
    }

    Ok(Self {
      includes,
      excludes,
      dependencies,
    })
  }
}

fn expand_one(pattern: &Path, expander: &dyn PathExpander) -> Vec<PathBuf> {
  let mut paths: Vec<PathBuf> = expander
    .expand(pattern)
    .into_iter()
    .map(|path| path.clean())
    .collect();
  paths.sort();
  paths.dedup();
  paths
}

fn expand_all<'a>(
  patterns: &'a [PathBuf],
  expander: &'a dyn PathExpander,
) -> impl Iterator<Item = PathBuf> + 'a {
  patterns
    .iter()
    .flat_map(move |pattern| expand_one(pattern, expander))
}
