//! Porter stemming algorithm implementation.
//!
//! The Porter stemmer applies a series of rewrite rules in five steps:
//! 1. Plurals and -ed/-ing suffixes
//! 2. -ational → -ate, -tional → -tion, etc.
//! 3. -icate → -ic, -ative → "", etc.
//! 4. Remove -al, -ance, -ence, etc.
//! 5. Remove final -e and -ll
//!
//! The rules only make sense for English words, so words containing non-ASCII
//! characters are lowercased and returned as they are.
//!
//! # Examples
//!
//! ```
//! use colloquy::analysis::token_filter::stem::Stemmer;
//! use colloquy::analysis::token_filter::stem::porter::PorterStemmer;
//!
//! let stemmer = PorterStemmer::new();
//!
//! assert_eq!(stemmer.stem("running"), "run");
//! assert_eq!(stemmer.stem("flies"), "fli");
//! assert_eq!(stemmer.stem("traditional"), "tradit");
//! ```

use crate::analysis::token_filter::stem::Stemmer;

/// Porter stemming algorithm implementation.
///
/// A simplified version of the Porter algorithm operating on ASCII bytes.
#[derive(Debug, Clone, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }

    /// Check if the byte at `pos` is a vowel ('y' counts after a consonant).
    fn is_vowel(&self, word: &str, pos: usize) -> bool {
        let bytes = word.as_bytes();
        if pos >= bytes.len() {
            return false;
        }

        match bytes[pos] {
            b'a' | b'e' | b'i' | b'o' | b'u' => true,
            b'y' if pos > 0 => !self.is_vowel(word, pos - 1),
            _ => false,
        }
    }

    /// Calculate the measure of a word (number of VC patterns).
    fn measure(&self, word: &str) -> usize {
        let mut m = 0;
        let n = word.len();
        let mut i = 0;

        // Skip initial consonants
        while i < n && !self.is_vowel(word, i) {
            i += 1;
        }

        while i < n {
            while i < n && self.is_vowel(word, i) {
                i += 1;
            }

            if i >= n {
                break;
            }

            m += 1;

            while i < n && !self.is_vowel(word, i) {
                i += 1;
            }
        }

        m
    }

    fn ends_with(&self, word: &str, suffix: &str) -> bool {
        word.len() >= suffix.len() && word.ends_with(suffix)
    }

    /// Replace suffix if the remaining stem has at least `min_measure`.
    fn replace_suffix(
        &self,
        word: &str,
        old_suffix: &str,
        new_suffix: &str,
        min_measure: usize,
    ) -> String {
        if self.ends_with(word, old_suffix) {
            let stem = &word[..word.len() - old_suffix.len()];
            if self.measure(stem) >= min_measure {
                return format!("{stem}{new_suffix}");
            }
        }
        word.to_string()
    }

    fn step1a(&self, word: &str) -> String {
        if self.ends_with(word, "sses") {
            format!("{}ss", &word[..word.len() - 4])
        } else if self.ends_with(word, "ies") {
            format!("{}i", &word[..word.len() - 3])
        } else if self.ends_with(word, "ss") {
            word.to_string()
        } else if self.ends_with(word, "s") && word.len() > 1 {
            word[..word.len() - 1].to_string()
        } else {
            word.to_string()
        }
    }

    fn step1b(&self, word: &str) -> String {
        let original_word = word;
        let word = if self.ends_with(word, "eed") {
            self.replace_suffix(word, "eed", "ee", 1)
        } else if self.ends_with(word, "ed") {
            let stem = &word[..word.len() - 2];
            if self.contains_vowel(stem) {
                stem.to_string()
            } else {
                word.to_string()
            }
        } else if self.ends_with(word, "ing") {
            let stem = &word[..word.len() - 3];
            if self.contains_vowel(stem) {
                stem.to_string()
            } else {
                word.to_string()
            }
        } else {
            word.to_string()
        };

        if word == original_word {
            return word;
        }

        if self.ends_with(&word, "at") || self.ends_with(&word, "bl") || self.ends_with(&word, "iz")
        {
            format!("{word}e")
        } else if self.ends_with_double_consonant(&word)
            && !self.ends_with(&word, "l")
            && !self.ends_with(&word, "s")
            && !self.ends_with(&word, "z")
        {
            word[..word.len() - 1].to_string()
        } else if self.measure(&word) == 1 && self.ends_cvc(&word) {
            format!("{word}e")
        } else {
            word
        }
    }

    fn contains_vowel(&self, word: &str) -> bool {
        (0..word.len()).any(|i| self.is_vowel(word, i))
    }

    fn ends_with_double_consonant(&self, word: &str) -> bool {
        let bytes = word.as_bytes();
        let len = bytes.len();
        len >= 2 && bytes[len - 1] == bytes[len - 2] && !self.is_vowel(word, len - 1)
    }

    /// Check if word ends with consonant-vowel-consonant, last not w/x/y.
    fn ends_cvc(&self, word: &str) -> bool {
        let len = word.len();
        if len < 3 {
            return false;
        }

        !self.is_vowel(word, len - 3)
            && self.is_vowel(word, len - 2)
            && !self.is_vowel(word, len - 1)
            && !matches!(word.as_bytes()[len - 1], b'w' | b'x' | b'y')
    }

    fn step2(&self, word: &str) -> String {
        const SUFFIXES: [(&str, &str); 20] = [
            ("ational", "ate"),
            ("tional", "tion"),
            ("enci", "ence"),
            ("anci", "ance"),
            ("izer", "ize"),
            ("abli", "able"),
            ("alli", "al"),
            ("entli", "ent"),
            ("eli", "e"),
            ("ousli", "ous"),
            ("ization", "ize"),
            ("ation", "ate"),
            ("ator", "ate"),
            ("alism", "al"),
            ("iveness", "ive"),
            ("fulness", "ful"),
            ("ousness", "ous"),
            ("aliti", "al"),
            ("iviti", "ive"),
            ("biliti", "ble"),
        ];

        for (old_suffix, new_suffix) in &SUFFIXES {
            if self.ends_with(word, old_suffix) {
                return self.replace_suffix(word, old_suffix, new_suffix, 1);
            }
        }

        word.to_string()
    }

    fn step3(&self, word: &str) -> String {
        const SUFFIXES: [(&str, &str); 7] = [
            ("icate", "ic"),
            ("ative", ""),
            ("alize", "al"),
            ("iciti", "ic"),
            ("ical", "ic"),
            ("ful", ""),
            ("ness", ""),
        ];

        for (old_suffix, new_suffix) in &SUFFIXES {
            if self.ends_with(word, old_suffix) {
                return self.replace_suffix(word, old_suffix, new_suffix, 1);
            }
        }

        word.to_string()
    }

    fn step4(&self, word: &str) -> String {
        const SUFFIXES: [&str; 19] = [
            "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
            "ou", "ism", "ate", "iti", "ous", "ive", "ize",
        ];

        for suffix in &SUFFIXES {
            if self.ends_with(word, suffix) {
                let stem = &word[..word.len() - suffix.len()];
                if self.measure(stem) > 1
                    && (*suffix != "ion" || self.ends_with(stem, "s") || self.ends_with(stem, "t"))
                {
                    return stem.to_string();
                }
            }
        }

        word.to_string()
    }

    fn step5(&self, word: &str) -> String {
        let word = if self.ends_with(word, "e") {
            let stem = &word[..word.len() - 1];
            let m = self.measure(stem);
            if m > 1 || (m == 1 && !self.ends_cvc(stem)) {
                stem.to_string()
            } else {
                word.to_string()
            }
        } else {
            word.to_string()
        };

        if self.ends_with(&word, "ll") && self.measure(&word) > 1 {
            word[..word.len() - 1].to_string()
        } else {
            word
        }
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word;
        }

        let word = self.step1a(&word);
        let word = self.step1b(&word);
        let word = self.step2(&word);
        let word = self.step3(&word);
        let word = self.step4(&word);
        self.step5(&word)
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}
