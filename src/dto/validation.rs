//! Validation and sanitization helpers for DTOs.

use validator::ValidationError;

use crate::state::errors::RoomError;

/// Longest nickname accepted after sanitization.
pub const NICKNAME_MAX_CHARS: usize = 20;
/// Longest caller-supplied participant id.
pub const PARTICIPANT_ID_MAX_CHARS: usize = 64;

const SCRIPT_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Whether `input` carries HTML or script-injection patterns.
///
/// Matches angle brackets, script URL schemes and inline `on<word>=` handlers,
/// ignoring ASCII case.
pub fn contains_markup(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.contains(['<', '>'])
        || SCRIPT_SCHEMES.iter().any(|scheme| lower.contains(scheme))
        || has_inline_handler(&lower)
}

/// Looks for `on`, one or more word characters, optional spaces, then `=`.
fn has_inline_handler(lower: &str) -> bool {
    let bytes = lower.as_bytes();
    let mut from = 0;
    while let Some(offset) = lower[from..].find("on") {
        let start = from + offset;
        let mut cursor = start + 2;
        while cursor < bytes.len() && (bytes[cursor].is_ascii_alphanumeric() || bytes[cursor] == b'_')
        {
            cursor += 1;
        }
        if cursor > start + 2 {
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            if bytes.get(cursor) == Some(&b'=') {
                return true;
            }
        }
        from = start + 1;
    }
    false
}

/// Unicode format characters (general category `Cf`): zero-width spaces and
/// joiners, bidi controls, soft hyphen, BOM and tag characters.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Drop control and invisible format characters, collapse whitespace runs and trim.
pub fn normalize_text(input: &str) -> String {
    let kept: String = input
        .chars()
        .filter(|&c| c.is_whitespace() || !(c.is_control() || is_format_char(c)))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove anything between `<` and `>`, keeping the surrounding text.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn visible_len(input: &str) -> usize {
    input.chars().filter(|c| !c.is_whitespace()).count()
}

/// Clean a client-supplied nickname, rejecting anything that looks hostile.
pub fn sanitize_nickname(raw: &str) -> Result<String, RoomError> {
    if contains_markup(raw) {
        return Err(RoomError::InvalidNickname(
            "markup or script content is not allowed".into(),
        ));
    }

    let cleaned = normalize_text(raw);
    let before = visible_len(raw);
    let stripped = before - visible_len(&cleaned);
    if stripped * 2 > before {
        return Err(RoomError::InvalidNickname(
            "nickname contains too many invalid characters".into(),
        ));
    }

    match cleaned.chars().count() {
        0 => Err(RoomError::InvalidNickname("nickname is required".into())),
        n if n > NICKNAME_MAX_CHARS => Err(RoomError::InvalidNickname(format!(
            "nickname must be at most {NICKNAME_MAX_CHARS} characters"
        ))),
        _ => Ok(cleaned),
    }
}

/// Validates a caller-supplied participant id: 1 to 64 of `[A-Za-z0-9_-]`.
pub fn validate_participant_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > PARTICIPANT_ID_MAX_CHARS {
        let mut err = ValidationError::new("participant_id_length");
        err.message = Some(
            format!("participant id must be 1 to {PARTICIPANT_ID_MAX_CHARS} characters").into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("participant_id_format");
        err.message =
            Some("participant id may only contain letters, digits, '_' and '-'".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_patterns_are_detected() {
        for input in [
            "<b>bob</b>",
            "a > b",
            "JavaScript:alert(1)",
            "vbscript:x",
            "data:text/html",
            "x onerror=alert(1)",
            "x ONLOAD = y",
        ] {
            assert!(contains_markup(input), "missed {input:?}");
        }
    }

    #[test]
    fn ordinary_text_is_not_markup() {
        for input in ["Bob", "Jean-Luc", "on = off", "Don", "Ramón", "online"] {
            assert!(!contains_markup(input), "flagged {input:?}");
        }
    }

    #[test]
    fn normalize_collapses_and_strips_controls() {
        assert_eq!(normalize_text("  Bob \t  the\nBuilder  "), "Bob the Builder");
        assert_eq!(normalize_text("Bo\u{0007}b"), "Bob");
    }

    #[test]
    fn normalize_drops_invisible_format_characters() {
        assert_eq!(normalize_text("Ali\u{200B}ce"), "Alice");
        assert_eq!(normalize_text("\u{FEFF}Bob\u{200D}\u{2060}"), "Bob");
        assert_eq!(normalize_text("\u{202E}Carol\u{00AD}"), "Carol");
    }

    #[test]
    fn nickname_with_zero_width_padding_matches_plain_one() {
        assert_eq!(sanitize_nickname("Alice\u{200B}").unwrap(), "Alice");
        assert!(sanitize_nickname("\u{200B}\u{200C}\u{200D}").is_err());
    }

    #[test]
    fn strip_tags_keeps_text() {
        assert_eq!(strip_tags("a <i>great</i> film"), "a great film");
        assert_eq!(strip_tags("5 > 3"), "5 > 3");
    }

    #[test]
    fn nickname_is_cleaned() {
        assert_eq!(sanitize_nickname("  Alice   Smith ").unwrap(), "Alice Smith");
    }

    #[test]
    fn nickname_rejections() {
        let cases = [
            "",
            "   ",
            "<script>",
            "javascript:void(0)",
            "abcdefghijklmnopqrstu",
            "\u{0001}\u{0002}\u{0003}a",
        ];
        for raw in cases {
            let err = sanitize_nickname(raw).unwrap_err();
            assert_eq!(err.code(), "invalid_nickname", "accepted {raw:?}");
        }
    }

    #[test]
    fn nickname_length_counts_characters_not_bytes() {
        let raw = "é".repeat(NICKNAME_MAX_CHARS);
        assert_eq!(sanitize_nickname(&raw).unwrap(), raw);
    }

    #[test]
    fn participant_id_format() {
        assert!(validate_participant_id("user_1-A").is_ok());
        assert!(validate_participant_id("").is_err());
        assert!(validate_participant_id(&"a".repeat(65)).is_err());
        assert!(validate_participant_id("has space").is_err());
        assert!(validate_participant_id("semi;colon").is_err());
    }
}
