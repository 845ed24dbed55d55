use crate::models::Mode;

/// Starter prompts offered when no image is loaded.
pub const SUGGESTED_PROMPTS: &[&str] = &[
    "Generate exploded engineering diagram of NVIDIA DGX SPARK",
    "Cutaway view of a jet engine with technical labels",
];

/// One-click edits offered once an image is current.
pub const SUGGESTED_EDITS: &[&str] = &[
    "Add a retro filter",
    "Remove the person in the background",
    "Make it cyberpunk style",
    "Turn into a line drawing",
];

pub fn suggestions(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Generate => SUGGESTED_PROMPTS,
        Mode::Edit => SUGGESTED_EDITS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_follow_mode() {
        assert_eq!(suggestions(Mode::Generate), SUGGESTED_PROMPTS);
        assert_eq!(suggestions(Mode::Edit).len(), 4);
    }

    #[test]
    fn test_suggestions_are_non_empty() {
        assert!(SUGGESTED_PROMPTS
            .iter()
            .chain(SUGGESTED_EDITS)
            .all(|s| !s.trim().is_empty()));
    }
}
