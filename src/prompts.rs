pub const MATH_SYSTEM: &str = include_str!("../data/prompts/math_system.txt");

/// System message text with surrounding whitespace removed.
pub fn math_system() -> &'static str {
    MATH_SYSTEM.trim()
}
