use std::fmt;
use std::path::{Path, PathBuf};

/// Call-time overrides for where a package writes its artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOptions {
  /// Directory that replaces the parent directory of every target.
  pub target_path: Option<PathBuf>,
}

impl TargetOptions {
  /// Options that relocate every target into `dir`.
  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    Self {
      target_path: Some(dir.into()),
    }
  }

  /// Apply the directory override to `path`, keeping its file name.
  pub fn relocate(&self, path: PathBuf) -> PathBuf {
    match (&self.target_path, path.file_name()) {
      (Some(dir), Some(name)) => dir.join(name),
      _ => path,
    }
  }
}

/// Where the primary artifact goes.
pub enum TargetSpec {
  /// A fixed path.
  Path(PathBuf),
  /// A path computed from the content sequence before target self-exclusion.
  Derived(Box<dyn Fn(&[PathBuf]) -> PathBuf>),
}

impl TargetSpec {
  pub(crate) fn resolve(&self, sequence: &[PathBuf]) -> PathBuf {
    match self {
      Self::Path(path) => path.clone(),
      Self::Derived(derive) => derive(sequence),
    }
  }
}

impl fmt::Debug for TargetSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
      Self::Derived(_) => f.write_str("Derived(..)"),
    }
  }
}

/// `<dir>/<stem>-resources<ext>` next to `target`.
pub fn derived_partition_path(target: &Path) -> PathBuf {
  let stem = target
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_default();
  let name = match target.extension() {
    Some(ext) => format!("{stem}-resources.{}", ext.to_string_lossy()),
    None => format!("{stem}-resources"),
  };
  target.with_file_name(name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relocation_replaces_parent_directory() {
    let options = TargetOptions::in_dir("/tmp/build");
    assert_eq!(
      options.relocate(PathBuf::from("public/stylesheets/all.css")),
      PathBuf::from("/tmp/build/all.css")
    );
    assert_eq!(
      TargetOptions::default().relocate(PathBuf::from("public/all.css")),
      PathBuf::from("public/all.css")
    );
  }

  #[test]
  fn derives_partition_next_to_target() {
    assert_eq!(
      derived_partition_path(Path::new("public/stylesheets/all.css")),
      PathBuf::from("public/stylesheets/all-resources.css")
    );
    assert_eq!(
      derived_partition_path(Path::new("bundle")),
      PathBuf::from("bundle-resources")
    );
  }

  #[test]
  fn derived_spec_sees_the_sequence() {
    let spec = TargetSpec::Derived(Box::new(|contents: &[PathBuf]| {
      PathBuf::from(format!("bundle-{}.js", contents.len()))
    }));
    let sequence = vec![PathBuf::from("a.js"), PathBuf::from("b.js")];
    assert_eq!(spec.resolve(&sequence), PathBuf::from("bundle-2.js"));
    assert_eq!(format!("{spec:?}"), "Derived(..)");
  }
}
