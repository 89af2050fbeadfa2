//! Spoken-math notation rewriter for transcribed audio
//!
//! Rules run in table order; each is whole-word and case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;

static RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"squared", "²"),
        (r"cubed", "³"),
        (r"square root of", "√"),
        (r"sqrt of", "√"),
        (r"to the power of (\d+)", "^${1}"),
        (r"pi", "π"),
        (r"theta", "θ"),
        (r"alpha", "α"),
        (r"beta", "β"),
        (r"integral of", "∫"),
        (r"sum of", "Σ"),
        (r"infinity", "∞"),
        (r"delta", "Δ"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| {
        Regex::new(&format!(r"(?i)\b{}\b", pattern))
            .ok()
            .map(|regex| (regex, replacement))
    })
    .collect()
});

/// Rewrite spoken math phrases into symbols
pub fn rewrite_spoken_math(text: &str) -> String {
    RULES.iter().fold(text.to_string(), |acc, (regex, replacement)| {
        regex.replace_all(&acc, *replacement).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powers_and_roots() {
        assert_eq!(rewrite_spoken_math("x squared plus y cubed"), "x ² plus y ³");
        assert_eq!(rewrite_spoken_math("Square Root of 16"), "√ 16");
        assert_eq!(rewrite_spoken_math("2 to the power of 10"), "2 ^10");
    }

    #[test]
    fn test_greek_and_operators() {
        assert_eq!(
            rewrite_spoken_math("integral of sin theta from zero to infinity"),
            "∫ sin θ from zero to ∞"
        );
        assert_eq!(rewrite_spoken_math("sum of alpha and BETA"), "Σ α and β");
        assert_eq!(rewrite_spoken_math("delta x over pi"), "Δ x over π");
    }

    #[test]
    fn test_whole_words_only() {
        assert_eq!(rewrite_spoken_math("spin the alphabet"), "spin the alphabet");
        assert_eq!(rewrite_spoken_math("pizza"), "pizza");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "What is the probability of two heads?";
        assert_eq!(rewrite_spoken_math(text), text);
    }
}
