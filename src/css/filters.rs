use regex::Regex;

fn embed_ignores() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)^https?:").expect("invalid http(s) regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
                Regex::new(r"(?i)^data:").expect("invalid data URI regex"),
                Regex::new(r"(?i)^mhtml:").expect("invalid mhtml regex"),
                Regex::new(r"^#").expect("invalid fragment regex"),
            ]
        })
        .as_slice()
}

/// Whether a stylesheet reference must stay literal no matter how often it occurs.
///
/// Remote resources and references that are already embedded have nothing to read from the
/// asset root.
pub fn is_external_reference(path: &str) -> bool {
    embed_ignores().iter().any(|pattern| pattern.is_match(path))
}
