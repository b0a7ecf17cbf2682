//! Shared helper functions for CLI commands.

/// Truncate a string to `max` characters, adding "..." when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("princeton", 20), "princeton");
        assert_eq!(truncate("new-brunswick", 8), "new-b...");
    }
}
