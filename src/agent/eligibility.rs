use std::sync::LazyLock;

use regex::Regex;

static SINGLE_SET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/beatmapsets/(\d+)(?:#\w+/\d+)?$").ok());
static ANY_SET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"beatmapsets/(\d+)").ok());

/// Returns the beatmapset id when the location shows a single set.
///
/// The path must end in `/beatmapsets/<digits>`, optionally followed by a
/// `#<mode>/<digits>` fragment. The fragment is accepted either inside the
/// path or as the separate location hash.
pub fn eligible_beatmapset(pathname: &str, hash: &str) -> Option<String> {
    let re = SINGLE_SET.as_ref()?;
    let combined = format!("{}{}", pathname, hash);

    re.captures(pathname)
        .or_else(|| re.captures(&combined))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First beatmapset id anywhere in the path, used when building the button.
pub fn beatmapset_id(pathname: &str) -> Option<String> {
    let re = ANY_SET.as_ref()?;
    re.captures(pathname)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligible_paths() {
        assert_eq!(eligible_beatmapset("/beatmapsets/12345", ""), Some("12345".to_string()));
        assert_eq!(
            eligible_beatmapset("/beatmapsets/12345#osu/67", ""),
            Some("12345".to_string())
        );
        assert_eq!(
            eligible_beatmapset("/beatmapsets/12345", "#taiko/9001"),
            Some("12345".to_string())
        );
    }

    #[test]
    fn test_ineligible_paths() {
        assert_eq!(eligible_beatmapset("/beatmapsets/abc", ""), None);
        assert_eq!(eligible_beatmapset("/beatmapsets/12345/discussion", ""), None);
        assert_eq!(eligible_beatmapset("/beatmapsets", ""), None);
        assert_eq!(eligible_beatmapset("/users/2", "#osu/1"), None);
    }

    #[test]
    fn test_beatmapset_id() {
        assert_eq!(beatmapset_id("/beatmapsets/777"), Some("777".to_string()));
        assert_eq!(beatmapset_id("/beatmapsets/777/discussion"), Some("777".to_string()));
        assert_eq!(beatmapset_id("/home"), None);
    }
}
