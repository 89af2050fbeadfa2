//! Keyword-based problem classifier
//!
//! Pure and synchronous: text in, [`ParsedProblem`] out. Topic detection is
//! first-match over a fixed rule table; variables are single-letter tokens
//! drawn from a small allow-list.

use crate::models::{ParsedProblem, Topic};

/// Topic rules in priority order (case-insensitive substring match)
const TOPIC_RULES: &[(Topic, &[&str])] = &[
    (Topic::Probability, &["probability", "p(", "coin", "dice"]),
    (Topic::Calculus, &["derivative", "d/dx", "limit", "integral"]),
    (Topic::LinearAlgebra, &["matrix", "vector", "eigenvalue"]),
    (Topic::Algebra, &["solve", "equation", "x =", "x²"]),
];

/// Letters recognized as variable symbols
const VARIABLE_SYMBOLS: &[char] = &['x', 'y', 'z', 'n', 'a', 'b', 'c'];

/// Classify a problem statement
pub fn classify(text: &str) -> ParsedProblem {
    ParsedProblem {
        problem_text: text.to_string(),
        topic: detect_topic(text),
        variables: extract_variables(text),
        constraints: Vec::new(),
        needs_clarification: false,
        clarification_reason: None,
    }
}

/// First matching topic rule, or [`Topic::Unknown`]
pub fn detect_topic(text: &str) -> Topic {
    let lowered = text.to_lowercase();
    TOPIC_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(topic, _)| *topic)
        .unwrap_or(Topic::Unknown)
}

/// Single-letter tokens in the allow-list, lowercased, first-appearance order
///
/// A token is a maximal run of ASCII letters, so the `x` in `2x` or `f(x)`
/// counts while the `a` inside `area` does not.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();

    for token in text.split(|c: char| !c.is_ascii_alphabetic()) {
        let mut chars = token.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            continue;
        };
        let letter = letter.to_ascii_lowercase();
        if !VARIABLE_SYMBOLS.contains(&letter) {
            continue;
        }
        let symbol = letter.to_string();
        if !variables.contains(&symbol) {
            variables.push(symbol);
        }
    }

    variables
}
