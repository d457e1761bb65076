use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::ANONYMOUS_PLAYER;

const MAX_NAME_CHARS: usize = 32;
const MAX_POST_ID_CHARS: usize = 64;

pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ANONYMOUS_PLAYER.to_string();
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}

/// Post ids are opaque but must be present and printable.
pub fn normalize_post_id(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty()
        || trimmed.chars().count() > MAX_POST_ID_CHARS
        || trimmed.chars().any(char::is_control)
    {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn parse_leaderboard_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_applies_trim_default_and_max_len() {
        assert_eq!(sanitize_name(""), "anonymous");
        assert_eq!(sanitize_name("   "), "anonymous");
        assert_eq!(sanitize_name(" spez "), "spez");
        assert_eq!(sanitize_name(&"x".repeat(40)).len(), 32);
    }

    #[test]
    fn post_id_must_be_present_and_printable() {
        assert_eq!(normalize_post_id(None), None);
        assert_eq!(normalize_post_id(Some("  ")), None);
        assert_eq!(normalize_post_id(Some("t3_a\nb")), None);
        assert_eq!(normalize_post_id(Some(&"p".repeat(65))), None);
        assert_eq!(normalize_post_id(Some(" t3_abc ")), Some("t3_abc".to_string()));
    }

    #[test]
    fn leaderboard_limit_parsing_is_lenient_for_invalid_values() {
        assert_eq!(parse_leaderboard_limit(Some("8")), Some(8));
        assert_eq!(parse_leaderboard_limit(Some("0")), Some(0));
        assert_eq!(parse_leaderboard_limit(Some("abc")), None);
        assert_eq!(parse_leaderboard_limit(Some("-1")), None);
        assert_eq!(parse_leaderboard_limit(None), None);
    }

    #[test]
    fn now_ms_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
