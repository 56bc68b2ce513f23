//! Error taxonomy shared by resolution, packaging and stylesheet rewriting.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type PackageResult<T> = Result<T, PackageError>;

/// Failures surfaced to the caller of a packaging operation.
///
/// None of these are retried. The orchestrator decides whether a failure aborts the whole
/// build or only the package that produced it.
#[derive(Debug, Error)]
pub enum PackageError {
  /// A package was asked to write its artifacts without a configured target.
  #[error("no target specified for package")]
  NoTargetSpecified,
  /// The declared dependencies contain a cycle.
  #[error("cyclic dependency: {}", display_cycle(.cycle))]
  CyclicDependency {
    /// Nodes on the cycle, with the first node repeated at the end.
    cycle: Vec<PathBuf>,
  },
  /// A dependency key expanded to more than one file.
  #[error("dependency key `{pattern}` matches {} files, expected exactly one", .matches.len())]
  AmbiguousDependencyKey {
    /// The key as written in the configuration.
    pattern: String,
    /// Every file the key expanded to.
    matches: Vec<PathBuf>,
  },
  /// An asset referenced from a stylesheet could not be read for inlining.
  #[error("failed to read referenced asset {}: {source}", .path.display())]
  MissingAssetFile {
    /// Location the asset was expected at.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// The external compressor exited unsuccessfully or produced no output.
  #[error("compressor `{command}` failed: {detail}")]
  CompressorFailure {
    /// Rendered command line.
    command: String,
    /// Exit status and captured diagnostics.
    detail: String,
  },
  /// Reading or writing a package file failed.
  #[error("I/O error on {}: {source}", .path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// A YAML manifest could not be parsed or is incomplete.
  #[error("invalid manifest {}: {reason}", .path.display())]
  Manifest {
    /// Manifest path.
    path: PathBuf,
    /// Parse failure or missing field description.
    reason: String,
  },
  /// A JSON package configuration could not be parsed.
  #[error("failed to parse {}: {source}", .path.display())]
  Config {
    /// Configuration file path.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl PackageError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

fn display_cycle(cycle: &[PathBuf]) -> String {
  cycle
    .iter()
    .map(|path| path.display().to_string())
    .collect::<Vec<_>>()
    .join(" -> ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cycle_message_names_every_node() {
    let error = PackageError::CyclicDependency {
      cycle: vec!["a.js".into(), "b.js".into(), "a.js".into()],
    };
    assert_eq!(error.to_string(), "cyclic dependency: a.js -> b.js -> a.js");
  }

  #[test]
  fn ambiguous_key_reports_match_count() {
    let error = PackageError::AmbiguousDependencyKey {
      pattern: "lib/*.js".into(),
      matches: vec!["lib/a.js".into(), "lib/b.js".into()],
    };
    assert!(error.to_string().contains("matches 2 files"));
  }
}
