use chrono::{DateTime, Utc};

/// Shown when a profile has no usable name
pub const FALLBACK_INITIALS: &str = "UN";

/// First letter of each word, uppercased, at most two characters.
pub fn initials(name: Option<&str>) -> String {
    let initials: String = name
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .filter_map(|first| first.to_uppercase().next())
        .take(2)
        .collect();

    if initials.is_empty() {
        FALLBACK_INITIALS.to_string()
    } else {
        initials
    }
}

/// Compact relative age of a timestamp: `5m ago`, `3h ago`, `2d ago`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    let hours = minutes / 60;

    if hours < 1 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{}d ago", hours / 24)
    }
}

/// Human date and time for event pages, e.g. `Mon, Oct 19 at 18:00 UTC`
pub fn event_time(at: DateTime<Utc>) -> String {
    at.format("%a, %b %-d at %H:%M UTC").to_string()
}

/// Split a comma separated tag or skill list. Entries are trimmed, blanks are
/// dropped and repeats (case-insensitive) keep their first spelling.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            items.push(item.to_string());
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn initials_from_two_words() {
        assert_eq!(initials(Some("Sarah Chen")), "SC");
    }

    #[test]
    fn initials_from_single_word() {
        assert_eq!(initials(Some("Madonna")), "M");
    }

    #[test]
    fn initials_capped_at_two() {
        assert_eq!(initials(Some("mary jane watson parker")), "MJ");
    }

    #[test]
    fn initials_take_one_letter_per_word() {
        assert_eq!(initials(Some("ßen Ali")), "SA");
        assert_eq!(initials(Some("élodie durand")), "ÉD");
    }

    #[test]
    fn initials_ignore_extra_whitespace() {
        assert_eq!(initials(Some("  ada   lovelace ")), "AL");
    }

    #[test]
    fn initials_fallback_for_missing_name() {
        assert_eq!(initials(None), FALLBACK_INITIALS);
        assert_eq!(initials(Some("")), FALLBACK_INITIALS);
        assert_eq!(initials(Some("   ")), FALLBACK_INITIALS);
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now - Duration::minutes(30), now), "30m ago");
        assert_eq!(time_ago(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(time_ago(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(time_ago(now - Duration::hours(23), now), "23h ago");
        assert_eq!(time_ago(now - Duration::hours(49), now), "2d ago");
    }

    #[test]
    fn time_ago_clamps_future() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now + Duration::hours(2), now), "0m ago");
    }

    #[test]
    fn event_time_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 18, 5, 0).unwrap();
        assert_eq!(event_time(at), "Mon, Oct 19 at 18:05 UTC");
    }

    #[test]
    fn parse_list_trims_and_dedups() {
        assert_eq!(
            parse_list(" Python, cooking,,python , Knitting "),
            vec!["Python", "cooking", "Knitting"]
        );
        assert!(parse_list(" , ").is_empty());
    }
}
