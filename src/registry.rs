//! Packages loaded from manifests, owned by whoever drives the build.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::builder::PackageOutcome;
use crate::error::{PackageError, PackageResult};
use crate::manifest::load_manifest;
use crate::package::{Package, TargetOptions};

/// What happened to one package during [`PackageRegistry::package_all`].
#[derive(Debug)]
pub enum BuildStatus {
  /// Targets were up to date.
  Skipped,
  /// Targets were rewritten.
  Packaged(PackageOutcome),
  /// Packaging failed; other packages were still attempted.
  Failed(PackageError),
}

/// Per-package result of a registry build.
#[derive(Debug)]
pub struct BuildReport {
  /// Primary target of the package, when it has one.
  pub target: Option<PathBuf>,
  /// Outcome.
  pub status: BuildStatus,
}

impl BuildReport {
  /// Whether this package failed.
  pub fn is_failure(&self) -> bool {
    matches!(self.status, BuildStatus::Failed(_))
  }
}

/// Append-only collection of packages.
#[derive(Debug, Default)]
pub struct PackageRegistry {
  packages: Vec<Package>,
}

impl PackageRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a package and return its index.
  pub fn register(&mut self, package: Package) -> usize {
    self.packages.push(package);
    self.packages.len() - 1
  }

  /// Load the manifest at `path` and register the package it describes.
  pub fn load_manifest(&mut self, path: &Path) -> PackageResult<usize> {
    let package = Package::new(load_manifest(path)?)?;
    Ok(self.register(package))
  }

  /// Registered packages in registration order.
  pub fn packages(&self) -> &[Package] {
    &self.packages
  }

  /// Iterate over registered packages.
  pub fn iter(&self) -> impl Iterator<Item = &Package> {
    self.packages.iter()
  }

  /// Number of registered packages.
  pub fn len(&self) -> usize {
    self.packages.len()
  }

  /// Whether nothing has been registered.
  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }

  /// First package whose primary target is `target`.
  pub fn find_by_target(&self, target: &Path, options: &TargetOptions) -> Option<&Package> {
    self
      .packages
      .iter()
      .find(|package| package.target(options).as_deref() == Some(target))
  }

  /// Package every dirty package, or every package when `force` is set.
  ///
  /// A failing package is reported and the remaining packages are still built.
  pub fn package_all(&self, options: &TargetOptions, force: bool) -> Vec<BuildReport> {
    self
      .packages
      .iter()
      .map(|package| {
        let target = package.target(options);
        let status = if !force && !package.is_dirty(options) {
          info!(target = ?target, "up to date");
          BuildStatus::Skipped
        } else {
          match package.package(options) {
            Ok(outcome) => BuildStatus::Packaged(outcome),
            Err(err) => {
              warn!(target = ?target, error = %err, "packaging failed");
              BuildStatus::Failed(err)
            }
          }
        };
        BuildReport { target, status }
      })
      .collect()
  }
}

impl<'a> IntoIterator for &'a PackageRegistry {
  type Item = &'a Package;
  type IntoIter = std::slice::Iter<'a, Package>;

  fn into_iter(self) -> Self::IntoIter {
    self.packages.iter()
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;
  use crate::config::PackageConfig;
  use filetime::{FileTime, set_file_mtime};
  use tempfile::tempdir;

  #[test]
  fn loads_manifests_and_finds_by_target() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("scripts.yml");
    fs::write(
      &manifest,
      "prefix: public/javascripts\ntarget: all.js\nincludes: [a.js, b.js]\n",
    )
    .unwrap();

    let mut registry = PackageRegistry::new();
    assert!(registry.is_empty());
    let index = registry.load_manifest(&manifest).unwrap();
    assert_eq!(index, 0);
    assert_eq!(registry.len(), 1);

    let options = TargetOptions::default();
    let found = registry
      .find_by_target(Path::new("public/javascripts/all.js"), &options)
      .unwrap();
    assert_eq!(found.contents(&options).len(), 2);
    assert!(registry.find_by_target(Path::new("all.js"), &options).is_none());
  }

  #[test]
  fn manifest_errors_leave_registry_untouched() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("broken.yml");
    fs::write(&manifest, "includes: [a.js]\n").unwrap();

    let mut registry = PackageRegistry::new();
    assert!(registry.load_manifest(&manifest).is_err());
    assert!(registry.is_empty());
  }

  #[test]
  fn fresh_packages_are_skipped_and_failures_reported() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a.js");
    let fresh_target = dir.path().join("fresh.js");
    fs::write(&source, "var a;").unwrap();
    fs::write(&fresh_target, "var a;").unwrap();
    set_file_mtime(&source, FileTime::from_unix_time(1_000, 0)).unwrap();
    set_file_mtime(&fresh_target, FileTime::from_unix_time(2_000, 0)).unwrap();

    let mut registry = PackageRegistry::new();
    registry.register(
      Package::new(PackageConfig {
        target: Some(fresh_target.clone()),
        includes: vec![source.clone()],
        ..PackageConfig::default()
      })
      .unwrap(),
    );
    registry.register(Package::new(PackageConfig::default()).unwrap());

    let reports = registry.package_all(&TargetOptions::default(), false);
    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[0].status, BuildStatus::Skipped));
    assert_eq!(reports[0].target, Some(fresh_target));
    assert!(matches!(
      reports[1].status,
      BuildStatus::Failed(PackageError::NoTargetSpecified)
    ));
    assert!(reports[1].is_failure());
    assert_eq!(reports[1].target, None::<PathBuf>);
  }
}
