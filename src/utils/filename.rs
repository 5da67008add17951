use percent_encoding::percent_decode_str;
use regex::Regex;

const MAX_FILENAME_LEN: usize = 255;

/// Sanitize filename to remove invalid characters
///
/// Drops ASCII control characters and `< > : " / \ | ? *`, strips a trailing
/// run of whitespace and periods, then keeps at most 255 characters.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|&c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | '\x00'..='\x1f'))
        .collect();

    cleaned
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect()
}

/// Extracts the filename announced by a `Content-Disposition` header.
///
/// Handles both `filename="..."` and `filename*=UTF-8''...`. The value is
/// percent-decoded; a value that does not decode to UTF-8 is kept raw.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)filename\*?=['"]?(?:UTF-8'')?([^"';]+)['"]?"#).ok()?;
    let caps = re.captures(header)?;
    let raw = caps.get(1)?.as_str();

    let decoded = match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::warn!("Keeping undecodable filename {:?}: {}", raw, e);
            raw.to_string()
        }
    };

    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Default name used when neither the mirror nor the page offers one.
pub fn default_filename(id: &str) -> String {
    format!("beatmapset-{}.osz", id)
}

/// Builds the page-side fallback name from the scraped artist and title.
pub fn fallback_filename(id: &str, artist: Option<&str>, title: Option<&str>) -> String {
    let artist = artist.map(str::trim).unwrap_or_default();
    let title = title.map(str::trim).unwrap_or_default();

    if artist.is_empty() || title.is_empty() {
        return default_filename(id);
    }

    sanitize_filename(&format!("{} {} - {}.osz", id, artist, title))
}

/// Picks the header name over the caller's fallback, then over the default.
pub fn resolve_filename(disposition: Option<&str>, fallback: &str, id: &str) -> String {
    if let Some(name) = disposition.and_then(filename_from_content_disposition) {
        return name;
    }
    if fallback.is_empty() {
        default_filename(id)
    } else {
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        let name = sanitize_filename("CON: Test / File???.osz   ");
        assert_eq!(name, "CON Test  File.osz");
        assert!(!name.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
        assert!(name.len() <= 255);

        assert_eq!(sanitize_filename("normal-name.osz"), "normal-name.osz");
        assert_eq!(sanitize_filename("tab\there\u{1}.osz.. ."), "tabhere.osz");
        assert_eq!(sanitize_filename("a<b>c|d\"e\\f*g"), "abcdefg");
    }

    #[test]
    fn test_sanitize_truncates_to_255_chars() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_filename(&long).chars().count(), 255);

        let wide = "é".repeat(300);
        assert_eq!(sanitize_filename(&wide).chars().count(), 255);
    }

    #[test]
    fn test_content_disposition_quoted() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="Foo Bar.osz""#).as_deref(),
            Some("Foo Bar.osz")
        );
    }

    #[test]
    fn test_content_disposition_extended() {
        assert_eq!(
            filename_from_content_disposition("attachment; FILENAME*=UTF-8''1%20Artist%20-%20T%C3%ADtle.osz")
                .as_deref(),
            Some("1 Artist - Título.osz")
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=plain.osz; size=3").as_deref(),
            Some("plain.osz")
        );
    }

    #[test]
    fn test_content_disposition_without_filename() {
        assert_eq!(filename_from_content_disposition("attachment"), None);
        assert_eq!(filename_from_content_disposition("inline; filename=\"\""), None);
    }

    #[test]
    fn test_content_disposition_bad_utf8_kept_raw() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=bad%FF.osz").as_deref(),
            Some("bad%FF.osz")
        );
    }

    #[test]
    fn test_fallback_filename() {
        assert_eq!(
            fallback_filename("123", Some(" Camellia "), Some("Ghost: Rule?")),
            "123 Camellia - Ghost Rule.osz"
        );
        assert_eq!(fallback_filename("123", Some("Camellia"), None), "beatmapset-123.osz");
        assert_eq!(fallback_filename("123", Some(""), Some("x")), "beatmapset-123.osz");
    }

    #[test]
    fn test_resolve_filename_prefers_header() {
        assert_eq!(
            resolve_filename(Some(r#"attachment; filename="Foo Bar.osz""#), "fallback.osz", "1"),
            "Foo Bar.osz"
        );
        assert_eq!(resolve_filename(Some("attachment"), "fallback.osz", "1"), "fallback.osz");
        assert_eq!(resolve_filename(None, "", "42"), "beatmapset-42.osz");
    }
}
