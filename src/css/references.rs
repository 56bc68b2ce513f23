use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::PackageResult;

fn url_ref() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"url\([^)]+\)").expect("invalid url() regex"))
}

/// One `url(...)` token found in a stylesheet body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
  /// The token exactly as written, `url(...)` included.
  pub raw_token: String,
  /// Referenced path with quotes and query string removed.
  pub path: String,
  /// How many tokens in the body resolve to the same path.
  pub occurrences: usize,
}

impl AssetReference {
  /// Only references that occur exactly once are inlined.
  pub fn is_unique(&self) -> bool {
    self.occurrences == 1
  }
}

/// Path named by a `url(...)` token.
pub fn path_from_token(token: &str) -> &str {
  let inner = token
    .strip_prefix("url(")
    .and_then(|rest| rest.strip_suffix(')'))
    .unwrap_or(token)
    .trim();
  let unquoted = inner
    .strip_prefix('"')
    .and_then(|rest| rest.strip_suffix('"'))
    .or_else(|| inner.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))
    .unwrap_or(inner);
  unquoted.split('?').next().unwrap_or_default()
}

/// Count the `url(...)` tokens per referenced path.
pub fn asset_occurrence_counts(body: &str) -> BTreeMap<String, usize> {
  let mut counts = BTreeMap::new();
  for token in url_ref().find_iter(body) {
    *counts
      .entry(path_from_token(token.as_str()).to_string())
      .or_insert(0) += 1;
  }
  counts
}

/// Every `url(...)` token in body order, annotated with its path's occurrence count.
pub fn scan_asset_references(body: &str) -> Vec<AssetReference> {
  let counts = asset_occurrence_counts(body);
  url_ref()
    .find_iter(body)
    .map(|token| {
      let path = path_from_token(token.as_str());
      AssetReference {
        raw_token: token.as_str().to_string(),
        path: path.to_string(),
        occurrences: counts.get(path).copied().unwrap_or_default(),
      }
    })
    .collect()
}

/// Replace each `url(...)` token with whatever `replace` returns, keeping it when `None`.
pub(crate) fn rewrite_asset_refs<F>(body: &str, mut replace: F) -> PackageResult<String>
where
  F: FnMut(&AssetReference) -> PackageResult<Option<String>>,
{
  let mut rewritten = String::with_capacity(body.len());
  let mut last = 0;

  for (token, reference) in url_ref().find_iter(body).zip(scan_asset_references(body)) {
    rewritten.push_str(&body[last..token.start()]);
    match replace(&reference)? {
      Some(replacement) => rewritten.push_str(&replacement),
      None => rewritten.push_str(&reference.raw_token),
    }
    last = token.end();
  }

  rewritten.push_str(&body[last..]);
  Ok(rewritten)
}
