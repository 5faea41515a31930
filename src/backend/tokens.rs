/// Rough token estimate for backends that do not report counts: one token per
/// four characters, never less than one. Halves round to even.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count() as f64;
    ((chars / 4.0).round_ties_even() as u32).max(1)
}
