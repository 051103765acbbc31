//! Abbreviated engagement counts ("1.2K", "3万", "2.5M").

use std::sync::LazyLock;

use regex::Regex;

static COUNT_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\d,.\s]*[KkMm万]?$").expect("static regex"));

/// Whether `text` looks like a rendered count and nothing else
pub fn is_count_like(text: &str) -> bool {
    COUNT_LIKE.is_match(text.trim())
}

/// Parse an abbreviated count. Anything unparseable is 0.
pub fn parse_count(text: &str) -> u64 {
    let text = text.trim();
    if !is_count_like(text) {
        return 0;
    }

    let compact: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let (number, multiplier) = match compact.chars().last() {
        Some('K' | 'k') => (&compact[..compact.len() - 1], 1_000.0),
        Some('M' | 'm') => (&compact[..compact.len() - 1], 1_000_000.0),
        Some('万') => (&compact[..compact.len() - '万'.len_utf8()], 10_000.0),
        _ => return compact.parse().unwrap_or(0),
    };

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * multiplier).round() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abbreviations() {
        assert_eq!(parse_count("1.2K"), 1200);
        assert_eq!(parse_count("3万"), 30000);
        assert_eq!(parse_count("2.5M"), 2_500_000);
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count("12k"), 12_000);
    }

    #[test]
    fn test_parse_grouping() {
        assert_eq!(parse_count("1,234"), 1234);
        assert_eq!(parse_count(" 1,234,567 "), 1_234_567);
        assert_eq!(parse_count("1.5万"), 15000);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("N/A"), 0);
        assert_eq!(parse_count("Reply"), 0);
        assert_eq!(parse_count("1.2.3K"), 0);
        assert_eq!(parse_count("K"), 0);
    }

    #[test]
    fn test_count_like() {
        assert!(is_count_like("1.2K"));
        assert!(is_count_like("3万"));
        assert!(is_count_like("1,024"));
        assert!(!is_count_like("@alice"));
        assert!(!is_count_like("2h"));
        assert!(!is_count_like(""));
    }
}
