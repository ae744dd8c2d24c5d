//! Comparison keys for place names.

/// Canonical comparison key: lowercase, ASCII letters and digits only,
/// trailing digit run removed ("Colombo-05" → "colombo").
pub fn normalize(name: &str) -> String {
    let mut key: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    let kept = key.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    key.truncate(kept);
    key
}

/// [`normalize`] for optional fields; absent names map to the empty key.
pub fn normalize_opt(name: Option<&str>) -> String {
    name.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_trailing_digits() {
        assert_eq!(normalize("Colombo 1"), "colombo");
        assert_eq!(normalize("colombo1"), "colombo");
        assert_eq!(normalize("Colombo-05"), "colombo");
    }

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("Galle")), "galle");
    }

    #[test]
    fn test_drops_punctuation_and_spaces() {
        assert_eq!(normalize("Nuwara Eliya"), "nuwaraeliya");
        assert_eq!(normalize("Mount-Lavinia."), "mountlavinia");
    }

    #[test]
    fn test_keeps_inner_digits() {
        assert_eq!(normalize("A9 Junction"), "a9junction");
        assert_eq!(normalize("123"), "");
    }

    #[test]
    fn test_non_ascii_removed() {
        assert_eq!(normalize("කොළඹ"), "");
        assert_eq!(normalize("Hambantōta"), "hambantta");
    }
}
