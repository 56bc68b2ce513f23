use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::config::{PackageConfig, PartitionAssets};

/// Hex SHA-256 over the content sequence and the settings that change the output.
///
/// Modification times play no part. The MHTML root only counts when an asset root is set,
/// since it has no effect otherwise.
pub fn fingerprint(contents: &[PathBuf], config: &PackageConfig) -> String {
  let mut hasher = Sha256::new();

  for path in contents {
    hasher.update(format!("src:{}\n", path.display()).as_bytes());
  }
  hasher.update(format!("kind:{}\n", config.kind().as_str()).as_bytes());

  if let Some(root) = &config.assets_root {
    hasher.update(format!("assets:{}\n", root.display()).as_bytes());
    if let Some(mhtml) = &config.mhtml_root {
      hasher.update(format!("mhtml:{mhtml}\n").as_bytes());
    }
  }

  match &config.partition_assets {
    PartitionAssets::Enabled(false) => {}
    PartitionAssets::Enabled(true) => hasher.update(b"partition:derived\n"),
    PartitionAssets::Path(path) => {
      hasher.update(format!("partition:{}\n", path.display()).as_bytes())
    }
  }

  if config.inline {
    hasher.update(b"inline\n");
  }

  format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn contents() -> Vec<PathBuf> {
    vec![PathBuf::from("public/a.css"), PathBuf::from("public/b.css")]
  }

  #[test]
  fn stable_and_hex_encoded() {
    let config = PackageConfig::default();
    let id = fingerprint(&contents(), &config);
    assert_eq!(id, fingerprint(&contents(), &config));
    assert_eq!(id.len(), 64);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn content_order_matters() {
    let mut reversed = contents();
    reversed.reverse();
    let config = PackageConfig::default();
    assert_ne!(fingerprint(&contents(), &config), fingerprint(&reversed, &config));
  }

  #[test]
  fn asset_settings_change_the_id() {
    let plain = PackageConfig::default();
    let with_assets = PackageConfig {
      assets_root: Some(PathBuf::from("public")),
      ..PackageConfig::default()
    };
    let partitioned = PackageConfig {
      partition_assets: PartitionAssets::Enabled(true),
      ..PackageConfig::default()
    };

    let base = fingerprint(&contents(), &plain);
    assert_ne!(base, fingerprint(&contents(), &with_assets));
    assert_ne!(base, fingerprint(&contents(), &partitioned));
  }

  #[test]
  fn mhtml_root_without_assets_root_is_ignored() {
    let plain = PackageConfig::default();
    let mhtml_only = PackageConfig {
      mhtml_root: Some("http://www.example.com/all.css".into()),
      ..PackageConfig::default()
    };
    assert_eq!(
      fingerprint(&contents(), &plain),
      fingerprint(&contents(), &mhtml_only)
    );
  }
}
