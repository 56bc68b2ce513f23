//! Packaging orchestration: concatenate, compress, post-process and write a package's targets.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::AssetKind;
use crate::css::{EmbedStrategy, rewrite_stylesheet};
use crate::error::{PackageError, PackageResult};
use crate::package::{Package, TargetOptions, concatenate};

/// Files written by one packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
  /// Primary target.
  pub target: PathBuf,
  /// Partition target, when the package splits asset rules out.
  pub partition: Option<PathBuf>,
}

impl PackageOutcome {
  /// Every written file, primary first.
  pub fn written(&self) -> Vec<&Path> {
    std::iter::once(self.target.as_path())
      .chain(self.partition.as_deref())
      .collect()
  }
}

/// Runs the compressor for a package and writes its artifacts.
///
/// The builder does not look at staleness; callers decide whether a package needs work.
pub struct PackageBuilder<'a> {
  package: &'a Package,
}

impl<'a> PackageBuilder<'a> {
  /// Create a builder for `package`.
  pub fn new(package: &'a Package) -> Self {
    Self { package }
  }

  /// Package into the targets selected by `options`.
  ///
  /// A scratch file used for pre-concatenation lives only for the duration of this call and
  /// is removed on success and failure alike.
  pub fn build(&self, options: &TargetOptions) -> PackageResult<PackageOutcome> {
    let target = self
      .package
      .target(options)
      .ok_or(PackageError::NoTargetSpecified)?;
    let partition = self.package.partition_target(options);
    let contents = self.package.contents(options);

    for path in std::iter::once(&target).chain(partition.as_ref()) {
      ensure_parent_dir(path)?;
    }

    let compressor = self.package.compressor();
    let scratch = if compressor.pre_concatenate() {
      Some(write_scratch(&contents, compressor.separator())?)
    } else {
      None
    };
    let inputs = match &scratch {
      Some(buffer) => vec![buffer.path().to_path_buf()],
      None => contents.clone(),
    };

    info!(
      target = %target.display(),
      kind = self.package.kind().as_str(),
      files = contents.len(),
      "packaging"
    );
    let captured = compressor.command(&inputs, &target).run()?;
    drop(scratch);

    match self.package.kind() {
      AssetKind::Stylesheet => {
        let body = match captured {
          Some(body) => body,
          None => fs::read_to_string(&target).map_err(|err| PackageError::io(&target, err))?,
        };
        self.write_stylesheet(&body, &target, partition.as_deref())?;
      }
      AssetKind::Script => {
        if let Some(body) = captured {
          write_artifact(&target, &body)?;
        }
      }
    }

    let outcome = PackageOutcome { target, partition };
    info!(written = ?outcome.written(), "packaged");
    Ok(outcome)
  }

  fn write_stylesheet(
    &self,
    body: &str,
    target: &Path,
    partition: Option<&Path>,
  ) -> PackageResult<()> {
    let config = self.package.config();
    let strategy =
      EmbedStrategy::from_roots(config.assets_root.as_deref(), config.mhtml_root.as_deref());
    let rewritten = rewrite_stylesheet(body, &strategy, partition.is_some())?;

    write_artifact(target, &rewritten.primary)?;
    if let (Some(path), Some(assets)) = (partition, &rewritten.partition) {
      write_artifact(path, assets)?;
    }
    Ok(())
  }
}

fn ensure_parent_dir(path: &Path) -> PackageResult<()> {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => {
      fs::create_dir_all(parent).map_err(|err| PackageError::io(parent, err))
    }
    _ => Ok(()),
  }
}

fn write_scratch(contents: &[PathBuf], separator: &str) -> PackageResult<NamedTempFile> {
  let body = concatenate(contents, separator)?;
  let mut buffer = NamedTempFile::new().map_err(|err| PackageError::io(std::env::temp_dir(), err))?;
  buffer
    .write_all(body.as_bytes())
    .and_then(|()| buffer.flush())
    .map_err(|err| PackageError::io(buffer.path(), err))?;
  debug!(path = %buffer.path().display(), bytes = body.len(), "wrote scratch buffer");
  Ok(buffer)
}

fn write_artifact(path: &Path, body: &str) -> PackageResult<()> {
  fs::write(path, body).map_err(|err| PackageError::io(path, err))
}
