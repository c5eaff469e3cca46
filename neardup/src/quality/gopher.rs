use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DedupError, Result};
use crate::quality::DocumentGate;
use crate::text::{Tokenizer, WordTokenizer};

pub const BULLET_POINTS: [&str; 3] = ["*", "-", "•"];
pub const ELLIPSES: [&str; 2] = ["...", "…"];
pub const STOP_WORDS: [&str; 8] = ["the", "be", "to", "of", "and", "that", "have", "with"];

/// The individual Gopher rules, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GopherHeuristic {
    TokenCount,
    MeanTokenLength,
    EllipsisLines,
    AlphabeticTokens,
    BulletLines,
    StopWords,
}

impl GopherHeuristic {
    pub const ALL: [GopherHeuristic; 6] = [
        GopherHeuristic::TokenCount,
        GopherHeuristic::MeanTokenLength,
        GopherHeuristic::EllipsisLines,
        GopherHeuristic::AlphabeticTokens,
        GopherHeuristic::BulletLines,
        GopherHeuristic::StopWords,
    ];
}

impl fmt::Display for GopherHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GopherHeuristic::TokenCount => "token_count",
            GopherHeuristic::MeanTokenLength => "mean_token_length",
            GopherHeuristic::EllipsisLines => "ellipsis_lines",
            GopherHeuristic::AlphabeticTokens => "alphabetic_tokens",
            GopherHeuristic::BulletLines => "bullet_lines",
            GopherHeuristic::StopWords => "stop_words",
        };
        f.write_str(name)
    }
}

/// Token count within `[min, max]`. Off by default.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCountCheck {
    pub enabled: bool,
    pub min: usize,
    pub max: usize,
}

impl Default for TokenCountCheck {
    fn default() -> Self {
        TokenCountCheck { enabled: false, min: 50, max: 100_000 }
    }
}

/// Mean token length in characters within `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanTokenLengthCheck {
    pub enabled: bool,
    pub min: f64,
    pub max: f64,
}

impl Default for MeanTokenLengthCheck {
    fn default() -> Self {
        MeanTokenLengthCheck { enabled: true, min: 3.0, max: 10.0 }
    }
}

/// Fraction of lines ending in an ellipsis at most `max_fraction`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EllipsisCheck {
    pub enabled: bool,
    pub max_fraction: f64,
}

impl Default for EllipsisCheck {
    fn default() -> Self {
        EllipsisCheck { enabled: true, max_fraction: 0.3 }
    }
}

/// Tokens with at least one alphabetic character: fraction at least
/// `min_fraction` and count within `[min_count, max_count]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphabeticCheck {
    pub enabled: bool,
    pub min_fraction: f64,
    pub min_count: usize,
    pub max_count: usize,
}

impl Default for AlphabeticCheck {
    fn default() -> Self {
        AlphabeticCheck { enabled: true, min_fraction: 0.8, min_count: 50, max_count: 100_000 }
    }
}

/// Fraction of lines starting with a bullet at most `max_fraction`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletCheck {
    pub enabled: bool,
    pub max_fraction: f64,
}

impl Default for BulletCheck {
    fn default() -> Self {
        BulletCheck { enabled: true, max_fraction: 0.9 }
    }
}

/// At least `min_count` tokens from [`STOP_WORDS`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopWordCheck {
    pub enabled: bool,
    pub min_count: usize,
}

impl Default for StopWordCheck {
    fn default() -> Self {
        StopWordCheck { enabled: true, min_count: 2 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GopherConfig {
    pub token_count: TokenCountCheck,
    pub mean_token_length: MeanTokenLengthCheck,
    pub ellipsis_lines: EllipsisCheck,
    pub alphabetic_tokens: AlphabeticCheck,
    pub bullet_lines: BulletCheck,
    pub stop_words: StopWordCheck,
}

impl GopherConfig {
    pub fn is_enabled(&self, heuristic: GopherHeuristic) -> bool {
        match heuristic {
            GopherHeuristic::TokenCount => self.token_count.enabled,
            GopherHeuristic::MeanTokenLength => self.mean_token_length.enabled,
            GopherHeuristic::EllipsisLines => self.ellipsis_lines.enabled,
            GopherHeuristic::AlphabeticTokens => self.alphabetic_tokens.enabled,
            GopherHeuristic::BulletLines => self.bullet_lines.enabled,
            GopherHeuristic::StopWords => self.stop_words.enabled,
        }
    }

    pub fn with_heuristic(mut self, heuristic: GopherHeuristic, enabled: bool) -> Self {
        match heuristic {
            GopherHeuristic::TokenCount => self.token_count.enabled = enabled,
            GopherHeuristic::MeanTokenLength => self.mean_token_length.enabled = enabled,
            GopherHeuristic::EllipsisLines => self.ellipsis_lines.enabled = enabled,
            GopherHeuristic::AlphabeticTokens => self.alphabetic_tokens.enabled = enabled,
            GopherHeuristic::BulletLines => self.bullet_lines.enabled = enabled,
            GopherHeuristic::StopWords => self.stop_words.enabled = enabled,
        }
        self
    }

    pub fn enabled(&self) -> Vec<GopherHeuristic> {
        GopherHeuristic::ALL
            .iter()
            .copied()
            .filter(|heuristic| self.is_enabled(*heuristic))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_count.min > self.token_count.max {
            return Err(DedupError::config("gopher token_count: min exceeds max"));
        }
        if !(self.mean_token_length.min <= self.mean_token_length.max) {
            return Err(DedupError::config("gopher mean_token_length: min exceeds max"));
        }
        if self.alphabetic_tokens.min_count > self.alphabetic_tokens.max_count {
            return Err(DedupError::config("gopher alphabetic_tokens: min_count exceeds max_count"));
        }
        let fractions = [
            ("ellipsis_lines.max_fraction", self.ellipsis_lines.max_fraction),
            ("alphabetic_tokens.min_fraction", self.alphabetic_tokens.min_fraction),
            ("bullet_lines.max_fraction", self.bullet_lines.max_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(DedupError::config(format!("gopher {} must be within [0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GopherVerdict {
    Pass,
    /// The first enabled heuristic the document failed.
    Fail(GopherHeuristic),
}

impl GopherVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, GopherVerdict::Pass)
    }
}

fn fraction(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(count as f64 / total as f64)
    }
}

fn check(heuristic: GopherHeuristic, tokens: &[&str], lines: &[&str], config: &GopherConfig) -> bool {
    match heuristic {
        GopherHeuristic::TokenCount => {
            let c = &config.token_count;
            !tokens.is_empty() && (c.min..=c.max).contains(&tokens.len())
        }
        GopherHeuristic::MeanTokenLength => {
            let c = &config.mean_token_length;
            let chars: usize = tokens.iter().map(|t| t.chars().count()).sum();
            fraction(chars, tokens.len()).map_or(false, |mean| mean >= c.min && mean <= c.max)
        }
        GopherHeuristic::EllipsisLines => {
            let count = lines
                .iter()
                .filter(|line| ELLIPSES.iter().any(|e| line.ends_with(e)))
                .count();
            fraction(count, lines.len()).map_or(false, |f| f <= config.ellipsis_lines.max_fraction)
        }
        GopherHeuristic::AlphabeticTokens => {
            let c = &config.alphabetic_tokens;
            let count = tokens
                .iter()
                .filter(|t| t.chars().any(char::is_alphabetic))
                .count();
            fraction(count, tokens.len()).map_or(false, |f| {
                f >= c.min_fraction && (c.min_count..=c.max_count).contains(&count)
            })
        }
        GopherHeuristic::BulletLines => {
            let count = lines
                .iter()
                .filter(|line| BULLET_POINTS.iter().any(|b| line.starts_with(b)))
                .count();
            fraction(count, lines.len()).map_or(false, |f| f <= config.bullet_lines.max_fraction)
        }
        GopherHeuristic::StopWords => {
            let count = tokens.iter().filter(|t| STOP_WORDS.contains(*t)).count();
            !tokens.is_empty() && count >= config.stop_words.min_count
        }
    }
}

/// Runs the enabled heuristics over pre-tokenized text and reports the
/// first failure. A heuristic whose ratio has a zero denominator fails.
pub fn evaluate<S, L>(tokens: &[S], lines: &[L], config: &GopherConfig) -> GopherVerdict
where
    S: AsRef<str>,
    L: AsRef<str>,
{
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
    for heuristic in GopherHeuristic::ALL {
        if config.is_enabled(heuristic) && !check(heuristic, &tokens, &lines, config) {
            debug!(%heuristic, tokens = tokens.len(), lines = lines.len(), "gopher heuristic failed");
            return GopherVerdict::Fail(heuristic);
        }
    }
    GopherVerdict::Pass
}

/// True when the document passes every enabled heuristic.
pub fn gopher_filter<S, L>(tokens: &[S], lines: &[L], config: &GopherConfig) -> bool
where
    S: AsRef<str>,
    L: AsRef<str>,
{
    evaluate(tokens, lines, config).is_pass()
}

/// Gopher quality filter over raw text, tokenizing with `T`.
#[derive(Clone, Debug, Default)]
pub struct GopherFilter<T = WordTokenizer> {
    config: GopherConfig,
    tokenizer: T,
}

impl GopherFilter<WordTokenizer> {
    pub fn new(config: GopherConfig) -> Self {
        GopherFilter { config, tokenizer: WordTokenizer }
    }
}

impl<T: Tokenizer> GopherFilter<T> {
    pub fn with_tokenizer(config: GopherConfig, tokenizer: T) -> Self {
        GopherFilter { config, tokenizer }
    }

    pub fn config(&self) -> &GopherConfig {
        &self.config
    }

    /// Splits `text` into the tokens and lines the heuristics see. Blank
    /// tokens and bare bullet tokens are dropped; lines are trimmed.
    pub fn prepare<'a>(&self, text: &'a str) -> (Vec<&'a str>, Vec<&'a str>) {
        let text = text.trim();
        let tokens = self
            .tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|token| !token.trim().is_empty() && !BULLET_POINTS.contains(token))
            .collect();
        let lines = text.split('\n').map(str::trim).collect();
        (tokens, lines)
    }

    pub fn evaluate_text(&self, text: &str) -> GopherVerdict {
        let (tokens, lines) = self.prepare(text);
        evaluate(&tokens, &lines, &self.config)
    }

    pub fn filter_text(&self, text: &str) -> bool {
        self.evaluate_text(text).is_pass()
    }
}

impl<T: Tokenizer + Send + Sync> DocumentGate for GopherFilter<T> {
    fn name(&self) -> &str {
        "gopher"
    }

    fn admit(&self, text: &str) -> bool {
        self.filter_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `total` tokens: 3 stop words, `alphabetic - 3` five-letter words, the rest numeric.
    fn tokens(alphabetic: usize, total: usize) -> Vec<String> {
        let mut tokens: Vec<String> = vec!["the".into(), "and".into(), "with".into()];
        tokens.extend((3..alphabetic).map(|_| "words".to_string()));
        tokens.extend((alphabetic..total).map(|_| "12345".to_string()));
        tokens
    }

    fn lines() -> Vec<&'static str> {
        vec!["a plain line of prose", "another plain line", "and a last one."]
    }

    #[test]
    fn test_good_document_passes() {
        let tokens = tokens(54, 60);
        assert_eq!(tokens.len(), 60);
        assert_eq!(evaluate(&tokens, &lines(), &GopherConfig::default()), GopherVerdict::Pass);
        assert!(gopher_filter(&tokens, &lines(), &GopherConfig::default()));
    }

    #[test]
    fn test_low_alphabetic_fraction_fails() {
        let verdict = evaluate(&tokens(30, 60), &lines(), &GopherConfig::default());
        assert_eq!(verdict, GopherVerdict::Fail(GopherHeuristic::AlphabeticTokens));
        // enough alphabetic tokens in absolute terms, still only half of them
        let verdict = evaluate(&tokens(60, 120), &lines(), &GopherConfig::default());
        assert_eq!(verdict, GopherVerdict::Fail(GopherHeuristic::AlphabeticTokens));
    }

    #[test]
    fn test_mean_length() {
        let short = vec!["ab"; 60];
        assert_eq!(
            evaluate(&short, &lines(), &GopherConfig::default()),
            GopherVerdict::Fail(GopherHeuristic::MeanTokenLength)
        );
        let long = vec!["abcdefghijklmnop"; 60];
        assert!(!gopher_filter(&long, &lines(), &GopherConfig::default()));
    }

    #[test]
    fn test_ellipsis_and_bullets() {
        let tokens = tokens(60, 60);
        let ellipsis = vec!["to be continued...", "and so on…", "fine."];
        assert_eq!(
            evaluate(&tokens, &ellipsis, &GopherConfig::default()),
            GopherVerdict::Fail(GopherHeuristic::EllipsisLines)
        );
        let bullets = vec!["* one", "- two", "• three", "* four", "- five", "* six", "- seven", "* eight", "- nine", "* ten"];
        assert_eq!(
            evaluate(&tokens, &bullets, &GopherConfig::default()),
            GopherVerdict::Fail(GopherHeuristic::BulletLines)
        );
    }

    #[test]
    fn test_stop_words_exact_match() {
        let mut tokens = tokens(60, 60);
        tokens[0] = "The".into();
        tokens[1] = "AND".into();
        assert_eq!(
            evaluate(&tokens, &lines(), &GopherConfig::default()),
            GopherVerdict::Fail(GopherHeuristic::StopWords)
        );
    }

    #[test]
    fn test_empty_document_fails_without_panicking() {
        let none: Vec<&str> = Vec::new();
        assert!(!gopher_filter(&none, &none, &GopherConfig::default()));
        let config = GopherConfig::default().with_heuristic(GopherHeuristic::MeanTokenLength, false);
        assert_eq!(evaluate(&none, &none, &config), GopherVerdict::Fail(GopherHeuristic::EllipsisLines));
    }

    #[test]
    fn test_disabled_heuristics_are_skipped() {
        let short = vec!["ab"; 10];
        let mut config = GopherConfig::default();
        for heuristic in GopherHeuristic::ALL {
            config = config.with_heuristic(heuristic, false);
        }
        assert!(config.enabled().is_empty());
        assert!(gopher_filter(&short, &lines(), &config));
    }

    #[test]
    fn test_token_count_off_by_default() {
        let config = GopherConfig::default();
        assert!(!config.is_enabled(GopherHeuristic::TokenCount));
        let config = config.with_heuristic(GopherHeuristic::TokenCount, true);
        let verdict = evaluate(&tokens(30, 30), &lines(), &config);
        assert_eq!(verdict, GopherVerdict::Fail(GopherHeuristic::TokenCount));
    }

    #[test]
    fn test_config_validation() {
        assert!(GopherConfig::default().validate().is_ok());
        let mut config = GopherConfig::default();
        config.bullet_lines.max_fraction = 1.5;
        assert!(config.validate().is_err());
        let mut config = GopherConfig::default();
        config.mean_token_length.min = 12.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filter_text() {
        let sentence = "The quick brown fox jumps over the lazy dog and keeps running with style. ";
        let text = sentence.repeat(6);
        let filter = GopherFilter::new(GopherConfig::default());
        assert_eq!(filter.evaluate_text(&text), GopherVerdict::Pass);
        assert!(filter.admit(&text));

        let (tokens, lines) = filter.prepare("  * item one\n- item two  ");
        assert_eq!(tokens, vec!["item", "one", "item", "two"]);
        assert_eq!(lines, vec!["* item one", "- item two"]);

        assert!(!filter.filter_text("too short"));
    }
}
