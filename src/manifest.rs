//! YAML manifests describing a single package each.
//!
//! A manifest uses the same field names as [`PackageConfig`]. The `prefix` stays on the
//! returned configuration and is joined onto every path when the [`crate::Package`] is built,
//! so paths added to that package later are prefixed too. A manifest without a `target` is
//! rejected.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::PackageConfig;
use crate::error::{PackageError, PackageResult};

/// Read and parse the manifest at `path`.
pub fn load_manifest(path: &Path) -> PackageResult<PackageConfig> {
  let text = fs::read_to_string(path).map_err(|err| PackageError::io(path, err))?;
  parse_manifest(&text, path)
}

/// Parse manifest text; `path` is only used in error reports.
pub fn parse_manifest(text: &str, path: &Path) -> PackageResult<PackageConfig> {
  let config: PackageConfig = serde_yaml::from_str(text).map_err(|err| PackageError::Manifest {
    path: path.to_path_buf(),
    reason: err.to_string(),
  })?;

  if config.target.is_none() {
    return Err(PackageError::Manifest {
      path: path.to_path_buf(),
      reason: "no target defined".to_string(),
    });
  }

  debug!(
    manifest = %path.display(),
    prefix = ?config.prefix,
    includes = config.includes.len(),
    "parsed manifest"
  );
  Ok(config)
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;
  use tempfile::tempdir;

  const MANIFEST: &str = "\
prefix: public/javascripts
target: all.js
includes:
  - a.js
  - b.js
  - c.js
excludes: c.js
dependencies:
  a.js: b.js
  b.js:
";

  #[test]
  fn keeps_prefix_for_the_package() {
    let config = parse_manifest(MANIFEST, Path::new("manifest.yml")).unwrap();

    assert_eq!(config.prefix, Some(PathBuf::from("public/javascripts")));
    assert_eq!(config.target, Some(PathBuf::from("all.js")));
    assert_eq!(config.excludes, vec![PathBuf::from("c.js")]);
    assert_eq!(config.dependencies[Path::new("a.js")], vec![PathBuf::from("b.js")]);
    assert!(config.dependencies[Path::new("b.js")].is_empty());

    let applied = config.with_prefix_applied();
    assert_eq!(applied.target, Some(PathBuf::from("public/javascripts/all.js")));
    assert_eq!(applied.includes, vec![
      PathBuf::from("public/javascripts/a.js"),
      PathBuf::from("public/javascripts/b.js"),
      PathBuf::from("public/javascripts/c.js"),
    ]);
    assert_eq!(
      applied.dependencies[Path::new("public/javascripts/a.js")],
      vec![PathBuf::from("public/javascripts/b.js")]
    );
  }

  #[test]
  fn packages_from_manifests_prefix_added_paths() {
    let config = parse_manifest(MANIFEST, Path::new("manifest.yml")).unwrap();
    let mut package = crate::Package::new(config).unwrap();
    package.add_includes(["d.js"]).unwrap();
    package.add_dependency("d.js", ["a.js"]).unwrap();

    assert_eq!(
      package.contents(&crate::TargetOptions::default()),
      vec![
        PathBuf::from("public/javascripts/b.js"),
        PathBuf::from("public/javascripts/a.js"),
        PathBuf::from("public/javascripts/d.js"),
      ]
    );
  }

  #[test]
  fn rejects_manifest_without_target() {
    let error = parse_manifest("includes: [a.js]\n", Path::new("broken.yml")).unwrap_err();
    match error {
      PackageError::Manifest { path, reason } => {
        assert_eq!(path, PathBuf::from("broken.yml"));
        assert!(reason.contains("target"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn reports_yaml_errors_as_manifest_errors() {
    assert!(matches!(
      parse_manifest("target: [unclosed\n", Path::new("bad.yml")),
      Err(PackageError::Manifest { .. })
    ));
  }

  #[test]
  fn loads_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("manifest.yml");
    fs::write(&path, MANIFEST).unwrap();

    let config = load_manifest(&path).unwrap();
    assert_eq!(config.includes.len(), 3);

    assert!(matches!(
      load_manifest(&dir.path().join("missing.yml")),
      Err(PackageError::Io { .. })
    ));
  }
}
