//! Post-processing of compressed stylesheets: asset inlining and partitioning.
//!
//! Everything here is a single pass of regular expressions over an already minified body.
//! Only references that occur exactly once are inlined, so a shared sprite is still
//! downloaded and cached once.

mod embed;
mod filters;
mod partition;
mod references;

pub use embed::{EmbedStrategy, MhtmlPart, content_location, mime_type};
pub use filters::is_external_reference;
pub use partition::{PartitionedStylesheet, partition_asset_rules};
pub use references::{
  AssetReference, asset_occurrence_counts, path_from_token, scan_asset_references,
};

use crate::error::PackageResult;

/// Stylesheet bodies ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenStylesheet {
  /// Body for the primary target.
  pub primary: String,
  /// Body for the partition target, when partitioning.
  pub partition: Option<String>,
}

/// Apply partitioning and embedding to a compressed stylesheet.
///
/// When partitioning, embedding only touches the extracted asset rules and the primary body
/// is left free of inlined payloads.
pub fn rewrite_stylesheet(
  body: &str,
  strategy: &EmbedStrategy,
  partition: bool,
) -> PackageResult<RewrittenStylesheet> {
  if !partition {
    return Ok(RewrittenStylesheet {
      primary: strategy.embed(body)?,
      partition: None,
    });
  }

  let split = partition_asset_rules(body);
  Ok(RewrittenStylesheet {
    partition: Some(strategy.embed(&split.assets)?),
    primary: split.primary,
  })
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::fs;

  use base64::{Engine as _, engine::general_purpose};
  use tempfile::{TempDir, tempdir};

  pub const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAACklEQVR4nGMAAQAABQABDQottAAAAABJRU5ErkJggg==";
  pub const GIF_1X1: &str = "R0lGODlhAQABAIAAAAAAAAAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

  /// Temporary asset root holding `images/1x1.png` and `images/1x1.gif`.
  pub fn asset_root() -> TempDir {
    let dir = tempdir().unwrap();
    let images = dir.path().join("images");
    fs::create_dir_all(&images).unwrap();
    for (name, encoded) in [("1x1.png", PNG_1X1), ("1x1.gif", GIF_1X1)] {
      let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
      fs::write(images.join(name), bytes).unwrap();
    }
    dir
  }
}

#[cfg(test)]
mod tests {
  use super::test_support::{GIF_1X1, PNG_1X1, asset_root};
  use super::*;

  const SHORTHAND_BODY: &str = ".css_rule_e1{height:80px;background:transparent url(/images/1x1.png) no-repeat 0;}\
    .css_rule_e2{height:25px;background:transparent url(/images/1x1.gif) no-repeat 0 0 fixed;color:#fff;}\
    .css_rule_a{background-color:transparent;}";

  #[test]
  fn embeds_in_place_without_partition() {
    let root = asset_root();
    let strategy = EmbedStrategy::from_roots(Some(root.path()), None);
    let rewritten = rewrite_stylesheet(
      ".css_rule_b{background-image:url(/images/1x1.png?1);}",
      &strategy,
      false,
    )
    .unwrap();

    assert_eq!(
      rewritten.primary,
      format!(".css_rule_b{{background-image:url(data:image/png;base64,{PNG_1X1});}}")
    );
    assert_eq!(rewritten.partition, None);
  }

  #[test]
  fn partition_embeds_secondary_only() {
    let root = asset_root();
    let strategy = EmbedStrategy::from_roots(Some(root.path()), None);
    let rewritten = rewrite_stylesheet(SHORTHAND_BODY, &strategy, true).unwrap();

    assert!(!rewritten.primary.contains("url("));
    assert_eq!(
      rewritten.partition.unwrap(),
      format!(
        ".css_rule_e1{{background-image:url(data:image/png;base64,{PNG_1X1});}}\
         .css_rule_e2{{background-image:url(data:image/gif;base64,{GIF_1X1});}}"
      )
    );
  }

  #[test]
  fn partition_with_mhtml_leaves_primary_unwrapped() {
    let root = asset_root();
    let strategy =
      EmbedStrategy::from_roots(Some(root.path()), Some("http://www.example.com/f.css"));
    let rewritten = rewrite_stylesheet(
      ".css_rule_f{background:url(/images/1x1.png) no-repeat 0 0 fixed;}",
      &strategy,
      true,
    )
    .unwrap();

    assert_eq!(
      rewritten.primary,
      ".css_rule_f{background-repeat:no-repeat;background-position:0 0;background-attachment:fixed;}"
    );
    let partition = rewritten.partition.unwrap();
    assert!(partition.starts_with("/*\r\nContent-Type: multipart/related"));
    assert!(partition.ends_with(
      ".css_rule_f{background-image:url(mhtml:http://www.example.com/f.css!slK9kH1St5naLvct9uLWLA.png);}"
    ));
  }

  #[test]
  fn partition_without_assets_root_keeps_urls() {
    let rewritten = rewrite_stylesheet(
      ".css_rule_f{background:url(/images/1x1.png) no-repeat 0 0 fixed;}",
      &EmbedStrategy::None,
      true,
    )
    .unwrap();
    assert_eq!(
      rewritten.partition.as_deref(),
      Some(".css_rule_f{background-image:url(/images/1x1.png);}")
    );
  }
}
