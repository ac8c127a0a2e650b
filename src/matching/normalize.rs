/// Lowercase and keep only `[a-z0-9]`.
///
/// `"First Name"` and `"first_name"` both become `"firstname"`.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Like [`normalize`] but word boundaries survive as single spaces.
pub fn normalize_spaced(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split into lowercase word tokens on whitespace, `_` and `-`; anything else
/// non-alphanumeric acts as a separator too. Tokens of one character are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|w| w.len() > 1)
        .map(str::to_string)
        .collect()
}

/// Trim a raw label and strip required/colon markers at either end:
/// `"* First Name:"` -> `"First Name"`.
pub fn clean_label(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '*' || c == ':' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
