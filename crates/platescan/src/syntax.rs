//! Plate grammar check and look-alike substitution.
//!
//! A plate string reads `<letters><digits><letters>`: a two-letter region
//! prefix, a three- or four-digit body and a two-letter suffix. When a part
//! fails its pattern, characters that OCR commonly confuses are swapped for
//! their counterpart in the expected class. Characters without a
//! counterpart are left alone.

use regex::Regex;

use crate::error::PlateResult;

/// Grammar and substitution tables for one plate format.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlateGrammar {
    /// Pattern a prefix or suffix must match in full.
    pub letters_pattern: String,
    /// Pattern the digit body must match in full.
    pub digits_pattern: String,
    /// Number of leading letters.
    pub prefix_len: usize,
    /// Number of trailing letters.
    pub suffix_len: usize,
    /// `[from, to]` pairs applied to a prefix or suffix that fails.
    pub digit_to_letter: Vec<[char; 2]>,
    /// `[from, to]` pairs applied to a digit body that fails.
    pub letter_to_digit: Vec<[char; 2]>,
}

impl Default for PlateGrammar {
    fn default() -> Self {
        Self {
            letters_pattern: "^[A-ZČĆĐŠŽ]{2}$".to_string(),
            digits_pattern: "^[0-9]{3,4}$".to_string(),
            prefix_len: 2,
            suffix_len: 2,
            digit_to_letter: vec![['0', 'O'], ['1', 'Z'], ['2', 'Z'], ['6', 'G'], ['8', 'B']],
            letter_to_digit: vec![
                ['D', '0'],
                ['H', '0'],
                ['O', '0'],
                ['U', '0'],
                ['B', '8'],
                ['I', '1'],
                ['G', '6'],
            ],
        }
    }
}

/// Compiled [`PlateGrammar`].
#[derive(Debug, Clone)]
pub struct SyntaxCorrector {
    letters: Regex,
    digits: Regex,
    prefix_len: usize,
    suffix_len: usize,
    digit_to_letter: Vec<[char; 2]>,
    letter_to_digit: Vec<[char; 2]>,
}

impl SyntaxCorrector {
    pub fn new(grammar: &PlateGrammar) -> PlateResult<Self> {
        Ok(Self {
            letters: Regex::new(&grammar.letters_pattern)?,
            digits: Regex::new(&grammar.digits_pattern)?,
            prefix_len: grammar.prefix_len,
            suffix_len: grammar.suffix_len,
            digit_to_letter: grammar.digit_to_letter.clone(),
            letter_to_digit: grammar.letter_to_digit.clone(),
        })
    }

    /// Repair a raw plate string.
    ///
    /// Strings too short to hold both letter groups are returned unchanged.
    pub fn correct(&self, raw: &str) -> String {
        let chars: Vec<char> = raw.chars().collect();
        let n = chars.len();
        if n < self.prefix_len + self.suffix_len || n <= 2 {
            return raw.to_string();
        }

        let prefix: String = chars[..self.prefix_len].iter().collect();
        let digits: String = chars[self.prefix_len..n - self.suffix_len].iter().collect();
        let suffix: String = chars[n - self.suffix_len..].iter().collect();

        let prefix = self.fix(prefix, &self.letters, &self.digit_to_letter);
        let digits = self.fix(digits, &self.digits, &self.letter_to_digit);
        let suffix = self.fix(suffix, &self.letters, &self.digit_to_letter);

        let corrected = format!("{prefix}{digits}{suffix}");
        if corrected != raw {
            tracing::debug!("syntax: {raw} -> {corrected}");
        }
        corrected
    }

    fn fix(&self, part: String, pattern: &Regex, table: &[[char; 2]]) -> String {
        if pattern.is_match(&part) {
            return part;
        }
        part.chars().map(|c| substitute(c, table)).collect()
    }
}

fn substitute(c: char, table: &[[char; 2]]) -> char {
    table
        .iter()
        .find(|[from, _]| *from == c)
        .map_or(c, |[_, to]| *to)
}
