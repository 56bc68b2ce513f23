use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use md5::{Digest, Md5};
use tracing::{debug, warn};

use super::filters::is_external_reference;
use super::references::{AssetReference, rewrite_asset_refs};
use crate::error::{PackageError, PackageResult};

const MHTML_START: &str = "/*\r\nContent-Type: multipart/related; boundary=\"MHTML_MARK\"\r\n";
const MHTML_SEPARATOR: &str = "\r\n--MHTML_MARK";
const MHTML_END: &str = "--\r\n*/\r\n";

/// Mime type for the asset extensions that can be embedded.
pub fn mime_type(path: &str) -> Option<&'static str> {
  let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
  let mime = match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "tif" | "tiff" => "image/tiff",
    "ttf" => "font/truetype",
    "otf" => "font/opentype",
    "woff" => "font/woff",
    _ => return None,
  };
  Some(mime)
}

/// Stable MHTML part name for `path`: URL-safe base64 of its MD5 digest plus its extension.
pub fn content_location(path: &str) -> String {
  let digest = general_purpose::URL_SAFE_NO_PAD.encode(Md5::digest(path.as_bytes()));
  match Path::new(path).extension() {
    Some(ext) => format!("{digest}.{}", ext.to_string_lossy()),
    None => digest,
  }
}

/// One embedded asset inside the MHTML header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MhtmlPart {
  /// Part name referenced from `url(mhtml:...)`.
  pub content_location: String,
  /// Mime type of the payload.
  pub mime_type: &'static str,
  /// Base64 asset bytes.
  pub payload: String,
}

impl MhtmlPart {
  fn render(&self) -> String {
    format!(
      "\r\nContent-Location: {}\r\nContent-Type: {}\r\nContent-Transfer-Encoding: base64\r\n\r\n{}",
      self.content_location, self.mime_type, self.payload
    )
  }
}

/// How unique asset references are inlined into a stylesheet body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedStrategy {
  /// Leave the body untouched.
  None,
  /// Replace references with `data:` URIs.
  DataUri {
    /// Directory the referenced paths are resolved against.
    assets_root: PathBuf,
  },
  /// Move assets into a multipart header and reference them by content location.
  Mhtml {
    /// Directory the referenced paths are resolved against.
    assets_root: PathBuf,
    /// Public URL of the stylesheet that will carry the header.
    mhtml_root: String,
  },
}

impl EmbedStrategy {
  /// Pick the strategy implied by the configured roots.
  ///
  /// An MHTML root without an asset root has nothing to embed and falls back to [`Self::None`].
  pub fn from_roots(assets_root: Option<&Path>, mhtml_root: Option<&str>) -> Self {
    match (assets_root, mhtml_root) {
      (None, _) => Self::None,
      (Some(root), None) => Self::DataUri {
        assets_root: root.to_path_buf(),
      },
      (Some(root), Some(mhtml)) => Self::Mhtml {
        assets_root: root.to_path_buf(),
        mhtml_root: mhtml.to_string(),
      },
    }
  }

  /// Rewrite every reference that occurs exactly once in `body`.
  pub fn embed(&self, body: &str) -> PackageResult<String> {
    match self {
      Self::None => Ok(body.to_string()),
      Self::DataUri { assets_root } => rewrite_asset_refs(body, |reference| {
        let Some(mime) = embeddable_mime(reference) else {
          return Ok(None);
        };
        let payload = encode_asset(assets_root, &reference.path)?;
        Ok(Some(format!("url(data:{mime};base64,{payload})")))
      }),
      Self::Mhtml {
        assets_root,
        mhtml_root,
      } => {
        let mut parts = Vec::new();
        let rewritten = rewrite_asset_refs(body, |reference| {
          let Some(mime) = embeddable_mime(reference) else {
            return Ok(None);
          };
          let part = MhtmlPart {
            content_location: content_location(&reference.path),
            mime_type: mime,
            payload: encode_asset(assets_root, &reference.path)?,
          };
          let replacement = format!("url(mhtml:{mhtml_root}!{})", part.content_location);
          parts.push(part);
          Ok(Some(replacement))
        })?;

        debug!(parts = parts.len(), "assembled mhtml header");
        Ok(format!("{}{rewritten}", mhtml_header(&parts)))
      }
    }
  }
}

fn mhtml_header(parts: &[MhtmlPart]) -> String {
  let mut sections = vec![MHTML_START.to_string()];
  sections.extend(parts.iter().map(MhtmlPart::render));
  sections.push(MHTML_END.to_string());
  sections.join(MHTML_SEPARATOR)
}

fn embeddable_mime(reference: &AssetReference) -> Option<&'static str> {
  if !reference.is_unique() || is_external_reference(&reference.path) {
    return None;
  }
  let mime = mime_type(&reference.path);
  if mime.is_none() {
    warn!(path = %reference.path, "no mime type for asset, leaving reference in place");
  }
  mime
}

fn encode_asset(assets_root: &Path, path: &str) -> PackageResult<String> {
  let file = assets_root.join(path.trim_start_matches('/'));
  let bytes = fs::read(&file).map_err(|source| PackageError::MissingAssetFile {
    path: file.clone(),
    source,
  })?;
  Ok(general_purpose::STANDARD.encode(bytes))
}
