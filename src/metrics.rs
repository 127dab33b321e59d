//! Deterministic metrics over generated text.
//!
//! Tokens are whitespace-delimited. Each metric inspects a single character of
//! a token (the first or the last), not the whole word.

use crate::models::YearParity;

/// Number of tokens whose first character is an uppercase letter.
pub fn capitalized_words_count(text: &str) -> u64 {
    text.split_whitespace()
        .filter(|token| token.chars().next().is_some_and(char::is_uppercase))
        .count() as u64
}

/// Number of tokens whose last character is an ASCII decimal digit (`0-9`).
/// Digits from other scripts, such as Arabic-Indic `٣`, do not count.
///
/// The digit must be part of the token itself: `"abc1"` counts, while
/// `"abc 1"` counts only the `"1"` token.
pub fn words_followed_by_numbers_count(text: &str) -> u64 {
    text.split_whitespace()
        .filter(|token| token.chars().next_back().is_some_and(|c| c.is_ascii_digit()))
        .count() as u64
}

pub fn year_parity(year: i64) -> YearParity {
    if year % 2 == 0 {
        YearParity::Even
    } else {
        YearParity::Odd
    }
}
