//! A single package: its resolved content sequence, its targets and the bookkeeping around them.

mod contents;
mod fingerprint;
mod staleness;
mod target;

use std::fs;
use std::path::PathBuf;

use tracing::debug;

pub use contents::{concatenate, content_sequence, exclude_targets};
pub use fingerprint::fingerprint;
pub use staleness::is_stale;
pub use target::{TargetOptions, TargetSpec, derived_partition_path};

use crate::builder::{PackageBuilder, PackageOutcome};
use crate::compressor::{Compressor, default_compressor};
use crate::config::{AssetKind, PackageConfig, PartitionAssets};
use crate::error::{PackageError, PackageResult};
use crate::fileset::{
  DependencyGraph, FileSet, LiteralPaths, PathExpander, ResolvedFileSet, resolve_file_set,
};

/// A bundle of source files compressed into one target.
///
/// The file set is resolved and ordered once at construction time, so a cyclic or ambiguous
/// dependency declaration is rejected by [`Package::new`] rather than at packaging time.
pub struct Package {
  config: PackageConfig,
  prefix: Option<PathBuf>,
  kind: AssetKind,
  target: Option<TargetSpec>,
  expander: Box<dyn PathExpander>,
  compressor: Box<dyn Compressor>,
  custom_compressor: bool,
  files: ResolvedFileSet,
  ordered: Vec<PathBuf>,
}

impl Package {
  /// Build a package whose patterns are literal paths.
  pub fn new(config: PackageConfig) -> PackageResult<Self> {
    Self::with_expander(config, Box::new(LiteralPaths))
  }

  /// Build a package, expanding every include, exclude and dependency pattern with `expander`.
  pub fn with_expander(
    config: PackageConfig,
    expander: Box<dyn PathExpander>,
  ) -> PackageResult<Self> {
    let prefix = config.prefix.clone();
    let config = config.with_prefix_applied();
    let kind = config.kind();
    let (files, ordered) = resolve(&config, expander.as_ref())?;

    Ok(Self {
      target: config.target.clone().map(TargetSpec::Path),
      compressor: default_compressor(kind),
      custom_compressor: false,
      config,
      prefix,
      kind,
      expander,
      files,
      ordered,
    })
  }

  /// Replace the compressor chosen for the package kind.
  pub fn with_compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
    self.compressor = compressor;
    self.custom_compressor = true;
    self
  }

  /// Compute the target from the content sequence instead of using a fixed path.
  ///
  /// Without an explicit `kind`, the kind is inferred again from the target derived from the
  /// current content sequence, and the default compressor follows it.
  pub fn with_target_fn<F>(mut self, derive: F) -> Self
  where
    F: Fn(&[PathBuf]) -> PathBuf + 'static,
  {
    if self.config.kind.is_none() {
      let target = derive(&self.sequence());
      let kind = AssetKind::infer(Some(target.as_path()));
      if kind != self.kind {
        debug!(from = self.kind.as_str(), to = kind.as_str(), "kind follows derived target");
        self.kind = kind;
        if !self.custom_compressor {
          self.compressor = default_compressor(kind);
        }
      }
    }
    self.target = Some(TargetSpec::Derived(Box::new(derive)));
    self
  }

  /// Add include patterns, re-resolving the file set.
  pub fn add_includes<I, P>(&mut self, patterns: I) -> PackageResult<()>
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    let patterns = self.prefixed(patterns);
    self.update(|config| config.includes.extend(patterns))
  }

  /// Add exclude patterns, re-resolving the file set.
  pub fn add_excludes<I, P>(&mut self, patterns: I) -> PackageResult<()>
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    let patterns = self.prefixed(patterns);
    self.update(|config| config.excludes.extend(patterns))
  }

  /// Declare that `dependent` must come after each of `dependencies`.
  ///
  /// On failure, for example when the new edge closes a cycle, the package is left unchanged.
  pub fn add_dependency<I, P>(
    &mut self,
    dependent: impl Into<PathBuf>,
    dependencies: I,
  ) -> PackageResult<()>
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    let key = self.prefixed_path(dependent.into());
    let values = self.prefixed(dependencies);
    self.update(|config| {
      let entry = config.dependencies.entry(key).or_default();
      for value in values {
        if !entry.contains(&value) {
          entry.push(value);
        }
      }
    })
  }

  fn prefixed<I, P>(&self, patterns: I) -> Vec<PathBuf>
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    patterns
      .into_iter()
      .map(|pattern| self.prefixed_path(pattern.into()))
      .collect()
  }

  fn prefixed_path(&self, path: PathBuf) -> PathBuf {
    match &self.prefix {
      Some(prefix) => prefix.join(path),
      None => path,
    }
  }

  fn update<F>(&mut self, edit: F) -> PackageResult<()>
  where
    F: FnOnce(&mut PackageConfig),
  {
    let mut config = self.config.clone();
    edit(&mut config);
    let (files, ordered) = resolve(&config, self.expander.as_ref())?;

    self.config = config;
    self.files = files;
    self.ordered = ordered;
    Ok(())
  }

  /// Configuration with the prefix already applied.
  pub fn config(&self) -> &PackageConfig {
    &self.config
  }

  /// Stylesheet or script.
  pub fn kind(&self) -> AssetKind {
    self.kind
  }

  /// Resolved include sets and dependency edges.
  pub fn files(&self) -> &ResolvedFileSet {
    &self.files
  }

  /// The compressor used by [`Package::package`].
  pub fn compressor(&self) -> &dyn Compressor {
    self.compressor.as_ref()
  }

  /// Content sequence before the target is removed from it.
  fn sequence(&self) -> Vec<PathBuf> {
    content_sequence(&self.ordered, &self.files.implicit_includes)
  }

  fn target_for(&self, sequence: &[PathBuf], options: &TargetOptions) -> Option<PathBuf> {
    self
      .target
      .as_ref()
      .map(|spec| options.relocate(spec.resolve(sequence)))
  }

  fn partition_for(&self, target: Option<&PathBuf>, options: &TargetOptions) -> Option<PathBuf> {
    if self.kind != AssetKind::Stylesheet {
      return None;
    }
    match &self.config.partition_assets {
      PartitionAssets::Enabled(false) => None,
      PartitionAssets::Enabled(true) => target.map(|target| derived_partition_path(target)),
      PartitionAssets::Path(path) => Some(options.relocate(path.clone())),
    }
  }

  /// Primary output file, if one is configured.
  pub fn target(&self, options: &TargetOptions) -> Option<PathBuf> {
    self.target_for(&self.sequence(), options)
  }

  /// Secondary stylesheet receiving the asset-bearing rules, if partitioning is enabled.
  pub fn partition_target(&self, options: &TargetOptions) -> Option<PathBuf> {
    let target = self.target(options);
    self.partition_for(target.as_ref(), options)
  }

  /// Primary target followed by the partition target.
  pub fn targets(&self, options: &TargetOptions) -> Vec<PathBuf> {
    let target = self.target(options);
    let partition = self.partition_for(target.as_ref(), options);
    target.into_iter().chain(partition).collect()
  }

  /// Source files in packaging order, without the package's own targets.
  pub fn contents(&self, options: &TargetOptions) -> Vec<PathBuf> {
    let sequence = self.sequence();
    let target = self.target_for(&sequence, options);
    let partition = self.partition_for(target.as_ref(), options);
    let targets: Vec<PathBuf> = target.into_iter().chain(partition).collect();
    exclude_targets(sequence, &targets)
  }

  /// Identity of the package output for cache keys.
  pub fn id(&self) -> String {
    fingerprint(&self.contents(&TargetOptions::default()), &self.config)
  }

  /// Whether a target is missing or older than a content file.
  pub fn is_dirty(&self, options: &TargetOptions) -> bool {
    let dirty = is_stale(&self.targets(options), &self.contents(options));
    debug!(dirty, target = ?self.target(options), "checked staleness");
    dirty
  }

  /// Whether the view layer should embed the body instead of linking to it.
  pub fn is_inline(&self) -> bool {
    self.config.inline
  }

  /// Whether assets are embedded as MHTML parts.
  pub fn is_mhtml(&self) -> bool {
    self.kind == AssetKind::Stylesheet && self.config.is_mhtml()
  }

  /// Contents of the packaged target.
  pub fn packaged_body(&self, options: &TargetOptions) -> PackageResult<String> {
    let target = self.target(options).ok_or(PackageError::NoTargetSpecified)?;
    fs::read_to_string(&target).map_err(|err| PackageError::io(target, err))
  }

  /// Raw source files joined in packaging order.
  pub fn unpackaged_body(&self, options: &TargetOptions) -> PackageResult<String> {
    concatenate(&self.contents(options), self.compressor.separator())
  }

  /// Compress the contents into the targets, whether or not they are dirty.
  pub fn package(&self, options: &TargetOptions) -> PackageResult<PackageOutcome> {
    PackageBuilder::new(self).build(options)
  }
}

impl std::fmt::Debug for Package {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Package")
      .field("kind", &self.kind)
      .field("target", &self.target)
      .field("files", &self.files)
      .finish_non_exhaustive()
  }
}

fn resolve(
  config: &PackageConfig,
  expander: &dyn PathExpander,
) -> PackageResult<(ResolvedFileSet, Vec<PathBuf>)> {
  let file_set = FileSet::expand(&config.file_patterns(), expander)?;
  let files = resolve_file_set(&file_set);
  let ordered =
    DependencyGraph::new(&files.explicit_includes, &files.dependencies).topological_order()?;
  Ok((files, ordered))
}
