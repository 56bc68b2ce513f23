use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::warn;

fn url_rule_ref() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(?m)(?:^|[^}]+)url\([^)]+\)[^}]*\}").expect("invalid url rule regex")
  })
}

fn selector_style_ref() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"([^{]+)\{([^}]+)\}").expect("invalid rule regex"))
}

fn background_style_ref() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(\S+)\s+(url\([^)]+\))").expect("invalid background style regex")
  })
}

/// A stylesheet split into rules without assets and rules carrying them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedStylesheet {
  /// Body with every asset reference removed.
  pub primary: String,
  /// One rule per asset-bearing rule of the input, in input order.
  pub assets: String,
}

/// Move every rule containing a `url(...)` into a separate body.
///
/// A rule whose `background` shorthand carries the `url(...)` stays in the primary body with
/// the shorthand expanded into longhand declarations. Its `background-image` moves, along with
/// any other declaration of the rule that references a url. Any other rule moves whole. Rules
/// must be flat; nested blocks and comments spanning rules are not understood.
pub fn partition_asset_rules(body: &str) -> PartitionedStylesheet {
  let mut assets = String::new();
  let primary = url_rule_ref()
    .replace_all(body, |caps: &Captures| {
      let rule = &caps[0];
      match split_shorthand_rule(rule) {
        Some((kept, moved)) => {
          assets.push_str(&moved);
          kept
        }
        None => {
          assets.push_str(rule);
          String::new()
        }
      }
    })
    .into_owned();

  PartitionedStylesheet { primary, assets }
}

fn split_shorthand_rule(rule: &str) -> Option<(String, String)> {
  let caps = selector_style_ref().captures(rule)?;
  let (selector, styles) = (&caps[1], &caps[2]);

  let declarations = split_declarations(styles);
  if !declarations
    .iter()
    .any(|declaration| shorthand_value(declaration).is_some_and(|value| value.contains("url(")))
  {
    return None;
  }

  let mut kept = Vec::with_capacity(declarations.len());
  let mut moved = Vec::new();
  for declaration in declarations {
    match shorthand_value(declaration) {
      Some(value) if value.contains("url(") => {
        let (longhands, image) = expand_background(selector, value);
        if !longhands.is_empty() {
          kept.push(longhands);
        }
        moved.push(format!("background-image:{}", image.unwrap_or_default()));
      }
      _ if declaration.contains("url(") => moved.push(declaration.trim().to_string()),
      _ => kept.push(declaration.to_string()),
    }
  }

  let kept = format!("{selector}{{{}}}", kept.join(";"));
  let moved: String = moved
    .iter()
    .map(|declaration| format!("{declaration};"))
    .collect();
  Some((kept, format!("{selector}{{{moved}}}")))
}

/// Value of a `background:` shorthand declaration.
fn shorthand_value(declaration: &str) -> Option<&str> {
  declaration.trim_start().strip_prefix("background:")
}

/// Split a declaration block on `;`, ignoring separators inside parentheses such as
/// `url(data:image/png;base64,...)`.
fn split_declarations(styles: &str) -> Vec<&str> {
  let mut declarations = Vec::new();
  let mut depth = 0usize;
  let mut start = 0;
  for (index, ch) in styles.char_indices() {
    match ch {
      '(' => depth += 1,
      ')' => depth = depth.saturating_sub(1),
      ';' if depth == 0 => {
        declarations.push(&styles[start..index]);
        start = index + 1;
      }
      _ => {}
    }
  }
  declarations.push(&styles[start..]);
  declarations
}

/// Longhand declarations for a shorthand value, plus the image it named.
///
/// Slots are positional: color, image, repeat, x position, y position, attachment.
fn expand_background(selector: &str, value: &str) -> (String, Option<String>) {
  let styled = background_style_ref().captures(value);
  let color = styled.as_ref().map(|caps| caps[1].to_string());
  let styled_image = styled.as_ref().map(|caps| caps[2].to_string());

  let rest = background_style_ref().replace_all(value, "");
  let mut slots = rest.split_whitespace();
  let image = styled_image.or_else(|| slots.next().map(str::to_string));
  let repeat = slots.next();
  let xpos = slots.next();
  let ypos = slots.next();
  let attachment = slots.next();

  if !image.as_deref().is_some_and(|image| image.starts_with("url(")) {
    warn!(selector = selector.trim(), value, "background shorthand without a url() image slot");
  }
  if slots.next().is_some() {
    warn!(selector = selector.trim(), value, "unexpected tokens in background shorthand");
  }

  let declarations = [
    color.map(|color| format!("background-color:{color}")),
    repeat.map(|repeat| format!("background-repeat:{repeat}")),
    match (xpos, ypos) {
      (Some(x), Some(y)) => Some(format!("background-position:{x} {y}")),
      (Some(x), None) => Some(format!("background-position-x:{x}")),
      _ => None,
    },
    attachment.map(|attachment| format!("background-attachment:{attachment}")),
  ];

  let joined = declarations.into_iter().flatten().collect::<Vec<_>>().join(";");
  (joined, image)
}
