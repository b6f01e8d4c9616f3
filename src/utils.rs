/// Truncates a string to at most `limit` characters. Strings over the limit are
/// cut to `limit - 1` characters plus a single ellipsis marker, so the result is
/// exactly `limit` characters long; shorter strings are returned unchanged.
pub fn shorten_string(string: &str, limit: usize) -> String {
    if string.chars().count() > limit {
        let slice: String = string.chars().take(limit - 1).collect();
        format!("{slice}…")
    } else {
        string.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_limit_strings_are_cut_with_an_ellipsis() {
        let input = "a".repeat(41);
        let shortened = shorten_string(&input, 40);
        assert_eq!(shortened.chars().count(), 40);
        assert_eq!(shortened, format!("{}…", "a".repeat(39)));
    }

    #[test]
    fn strings_at_or_under_the_limit_are_unchanged() {
        let input = "a".repeat(40);
        assert_eq!(shorten_string(&input, 40), input);
        assert_eq!(shorten_string("short", 40), "short");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let input = "č".repeat(41);
        let shortened = shorten_string(&input, 40);
        assert_eq!(shortened.chars().count(), 40);
    }
}
