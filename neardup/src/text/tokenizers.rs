/// Word segmentation used ahead of the quality heuristics.
///
/// Implementations must return slices of the input, in order. A tokenizer
/// is supplied by the caller, so a different segmenter can be plugged into
/// [`GopherFilter`](crate::quality::GopherFilter) without touching the filter.
pub trait Tokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Splits text into word tokens and punctuation tokens.
///
/// A word is a run of alphanumeric characters (and `_`); an apostrophe,
/// hyphen or period between two alphanumerics stays inside the word, so
/// `it's`, `e-mail` and `3.14` are single tokens. Every other
/// non-whitespace character becomes its own token, and a run of the same
/// punctuation character is kept together (`...`, `--`, `!!`).
#[derive(Clone, Copy, Debug, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let (start, c) = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            if is_word_char(c) {
                while j < chars.len() {
                    let current = chars[j].1;
                    if is_word_char(current) {
                        j += 1;
                    } else if is_joiner(current)
                        && j + 1 < chars.len()
                        && chars[j - 1].1.is_alphanumeric()
                        && chars[j + 1].1.is_alphanumeric()
                    {
                        j += 2;
                    } else {
                        break;
                    }
                }
            } else {
                while j < chars.len() && chars[j].1 == c {
                    j += 1;
                }
            }
            let end = if j < chars.len() { chars[j].0 } else { text.len() };
            tokens.push(&text[start..end]);
            i = j;
        }
        tokens
    }
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[inline]
fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '-' | '.')
}
