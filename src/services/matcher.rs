//! Resolve free-text doctor names against the roster.

/// Lowercase, drop every "dr." and "doctor", trim.
pub fn normalize_doctor_name(name: &str) -> String {
    name.to_lowercase()
        .replace("dr.", "")
        .replace("doctor", "")
        .trim()
        .to_string()
}

/// First roster entry whose normalized form equals the normalized input.
///
/// Two roster names that normalize identically are not disambiguated; the
/// earlier one in roster order wins.
pub fn find_matching_doctor<'a, S: AsRef<str>>(input: &str, roster: &'a [S]) -> Option<&'a str> {
    let wanted = normalize_doctor_name(input);
    if wanted.is_empty() {
        return None;
    }

    roster
        .iter()
        .map(|name: &'a S| -> &'a str { name.as_ref() })
        .find(|name| normalize_doctor_name(name) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_doctor_name("  Dr. Smith "), "smith");
        assert_eq!(normalize_doctor_name("Doctor Jones"), "jones");
        assert_eq!(normalize_doctor_name("DR. Ann Lee"), "ann lee");
    }

    #[test]
    fn test_match_ignores_prefix_and_case() {
        let roster = ["Smith"];
        for input in ["dr. Smith", "Dr. Smith", "SMITH", "  smith  ", "Doctor Smith", "doctor smith"] {
            assert_eq!(find_matching_doctor(input, &roster), Some("Smith"), "input {input:?}");
        }
    }

    #[test]
    fn test_match_roster_with_prefix() {
        let roster = vec!["Dr. Emily Carter".to_string(), "Dr. Raj Patel".to_string()];
        assert_eq!(find_matching_doctor("raj patel", &roster), Some("Dr. Raj Patel"));
    }

    #[test]
    fn test_no_match() {
        let roster = ["Smith", "Jones"];
        assert_eq!(find_matching_doctor("Dr. Brown", &roster), None);
        assert_eq!(find_matching_doctor("Smithson", &roster), None);
    }

    #[test]
    fn test_empty_after_normalizing_never_matches() {
        let roster = ["Doctor"];
        assert_eq!(find_matching_doctor("Dr.", &roster), None);
    }

    #[test]
    fn test_colliding_names_pick_first() {
        let roster = ["Dr. Smith", "smith"];
        assert_eq!(find_matching_doctor("Smith", &roster), Some("Dr. Smith"));
    }
}
