//! Game-name normalization and fuzzy matching.
//!
//! Names, filenames and document bodies are compared after reducing them to
//! lower-case ASCII alphanumerics, so `"Half-Life 2"` and
//! `"halflife2_eula.txt"` share the key `halflife2`.

/// Lower-cases `s` and drops every character outside `[a-z0-9]`.
pub fn normalize(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// True when either normalized string contains the other.
pub fn is_close_match(name: &str, filename: &str) -> bool {
    let name = normalize(name);
    let file = normalize(filename);
    name.contains(&file) || file.contains(&name)
}

/// True when the normalized document content contains the normalized name.
pub fn content_matches_game(name: &str, content: &str) -> bool {
    normalize(content).contains(&normalize(name))
}
