//! Package configuration consumed when constructing a [`crate::Package`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PackageError, PackageResult};
use crate::fileset::FileSetPatterns;

/// Which compressor and post-processing a package uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
  /// CSS bundles; compressed output is passed through the asset reference rewriter.
  Stylesheet,
  /// JavaScript bundles.
  Script,
}

impl AssetKind {
  /// Guess the kind from a target path, treating anything other than `.css` as script.
  pub fn infer(target: Option<&Path>) -> Self {
    let is_css = target
      .and_then(Path::extension)
      .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
    if is_css { Self::Stylesheet } else { Self::Script }
  }

  /// Lowercase name used in logs and fingerprints.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Stylesheet => "stylesheet",
      Self::Script => "script",
    }
  }
}

/// Whether asset-bearing rules are split into a secondary stylesheet.
///
/// `true` derives the partition path from the target, a path value names it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PartitionAssets {
  /// Partitioning toggle; `true` places `<stem>-resources<ext>` next to the target.
  Enabled(bool),
  /// Explicit partition file.
  Path(PathBuf),
}

impl Default for PartitionAssets {
  fn default() -> Self {
    Self::Enabled(false)
  }
}

impl PartitionAssets {
  /// Returns `true` unless partitioning is switched off.
  pub fn is_enabled(&self) -> bool {
    !matches!(self, Self::Enabled(false))
  }
}

/// Serializable description of a single package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PackageConfig {
  /// Explicit kind; inferred from the target extension when absent.
  pub kind: Option<AssetKind>,
  /// Path segment joined in front of every relative path in this configuration.
  pub prefix: Option<PathBuf>,
  /// Output file for the packaged body.
  pub target: Option<PathBuf>,
  /// Files to package.
  #[serde(deserialize_with = "one_or_many")]
  pub includes: Vec<PathBuf>,
  /// Files to drop from the includes.
  #[serde(deserialize_with = "one_or_many")]
  pub excludes: Vec<PathBuf>,
  /// File mapped to the files that must precede it.
  #[serde(deserialize_with = "dependency_map")]
  pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
  /// Directory holding the images and fonts referenced from stylesheets.
  pub assets_root: Option<PathBuf>,
  /// Public URL of the packaged stylesheet, used as the MHTML part prefix.
  pub mhtml_root: Option<String>,
  /// Partitioning of asset-bearing rules into a secondary file.
  pub partition_assets: PartitionAssets,
  /// Whether the view layer should inline the body instead of linking the target.
  pub inline: bool,
}

impl PackageConfig {
  /// Read configuration from a JSON file.
  pub fn from_json_path(path: &Path) -> PackageResult<Self> {
    let content = fs::read_to_string(path).map_err(|err| PackageError::io(path, err))?;
    serde_json::from_str(&content).map_err(|source| PackageError::Config {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Join `prefix` onto every path entry and clear it.
  ///
  /// Applies to the target, includes, excludes, dependency keys and values and an explicit
  /// partition path. The asset root and MHTML root are left untouched. The target and the
  /// partition path are cleaned whether or not a prefix is set, since they are compared with
  /// cleaned content paths and feed the fingerprint.
  pub fn with_prefix_applied(mut self) -> Self {
    if let Some(prefix) = self.prefix.take() {
      let join = |path: PathBuf| prefix.join(path);

      self.target = self.target.map(join);
      self.includes = self.includes.into_iter().map(join).collect();
      self.excludes = self.excludes.into_iter().map(join).collect();
      self.dependencies = self
        .dependencies
        .into_iter()
        .map(|(key, values)| (join(key), values.into_iter().map(join).collect()))
        .collect();
      if let PartitionAssets::Path(path) = self.partition_assets {
        self.partition_assets = PartitionAssets::Path(join(path));
      }
    }

    self.target = self.target.map(|target| target.clean());
    if let PartitionAssets::Path(path) = &mut self.partition_assets {
      *path = path.clean();
    }
    self
  }

  /// Kind configured explicitly or inferred from the target.
  pub fn kind(&self) -> AssetKind {
    self
      .kind
      .unwrap_or_else(|| AssetKind::infer(self.target.as_deref()))
  }

  /// MHTML embedding needs both an asset root and an MHTML root.
  pub fn is_mhtml(&self) -> bool {
    self.assets_root.is_some() && self.mhtml_root.is_some()
  }

  /// Include, exclude and dependency patterns awaiting expansion.
  pub fn file_patterns(&self) -> FileSetPatterns {
    FileSetPatterns {
      includes: self.includes.clone(),
      excludes: self.excludes.clone(),
      dependencies: self.dependencies.clone(),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
  One(PathBuf),
  Many(Vec<PathBuf>),
}

impl From<OneOrMany> for Vec<PathBuf> {
  fn from(value: OneOrMany) -> Self {
    match value {
      OneOrMany::One(path) => vec![path],
      OneOrMany::Many(paths) => paths,
    }
  }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(
    Option::<OneOrMany>::deserialize(deserializer)?
      .map(Vec::from)
      .unwrap_or_default(),
  )
}

fn dependency_map<'de, D>(deserializer: D) -> Result<BTreeMap<PathBuf, Vec<PathBuf>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<BTreeMap<PathBuf, Option<OneOrMany>>>::deserialize(deserializer)?;
  Ok(
    raw
      .unwrap_or_default()
      .into_iter()
      .map(|(key, values)| (key, values.map(Vec::from).unwrap_or_default()))
      .collect(),
  )
}
