//! Per-document quality gates applied ahead of deduplication.
//!
//! A [`GateChain`] runs gates in order and stops at the first rejection.
//! Model-backed gates (language, toxicity, quality classifiers) are plugged
//! in through [`Classifier`]; the crate never loads a model itself.

mod gopher;

use rayon::prelude::*;
use tracing::info;

pub use self::gopher::{
    evaluate, gopher_filter, AlphabeticCheck, BulletCheck, EllipsisCheck, GopherConfig, GopherFilter,
    GopherHeuristic, GopherVerdict, MeanTokenLengthCheck, StopWordCheck, TokenCountCheck, BULLET_POINTS,
    ELLIPSES, STOP_WORDS,
};

/// A yes/no decision about whether a document enters the pipeline.
pub trait DocumentGate: Send + Sync {
    fn name(&self) -> &str;

    fn admit(&self, text: &str) -> bool;
}

/// An externally trained text classifier.
pub trait Classifier: Send + Sync {
    /// Returns the predicted label and its confidence.
    fn classify(&self, text: &str) -> (String, f32);
}

/// Admits documents whose predicted label is `expected_label` with at least
/// `min_confidence`.
pub struct ClassifierGate<C> {
    name: String,
    classifier: C,
    expected_label: String,
    min_confidence: f32,
}

impl<C: Classifier> ClassifierGate<C> {
    pub fn new(name: impl Into<String>, classifier: C, expected_label: impl Into<String>, min_confidence: f32) -> Self {
        ClassifierGate {
            name: name.into(),
            classifier,
            expected_label: expected_label.into(),
            min_confidence,
        }
    }
}

impl<C: Classifier> DocumentGate for ClassifierGate<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn admit(&self, text: &str) -> bool {
        let (label, confidence) = self.classifier.classify(text);
        label == self.expected_label && confidence >= self.min_confidence
    }
}

/// How many documents were left after each gate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateStats {
    pub total: usize,
    /// `(gate name, documents admitted by it and every earlier gate)`.
    pub survivors: Vec<(String, usize)>,
}

impl GateStats {
    pub fn admitted(&self) -> usize {
        self.survivors.last().map_or(self.total, |(_, count)| *count)
    }
}

#[derive(Default)]
pub struct GateChain {
    gates: Vec<Box<dyn DocumentGate>>,
}

impl GateChain {
    pub fn new() -> Self {
        GateChain { gates: Vec::new() }
    }

    pub fn with_gate(mut self, gate: impl DocumentGate + 'static) -> Self {
        self.gates.push(Box::new(gate));
        self
    }

    pub fn push(&mut self, gate: Box<dyn DocumentGate>) {
        self.gates.push(gate);
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Position of the first gate that rejects `text`.
    pub fn first_rejection(&self, text: &str) -> Option<usize> {
        self.gates.iter().position(|gate| !gate.admit(text))
    }

    pub fn admit(&self, text: &str) -> bool {
        self.first_rejection(text).is_none()
    }

    /// Runs the chain over a batch in parallel. Returns one admit flag per
    /// document, in input order, and the survivor count after every gate.
    pub fn filter_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> (Vec<bool>, GateStats) {
        let rejections: Vec<Option<usize>> = texts
            .par_iter()
            .map(|text| self.first_rejection(text.as_ref()))
            .collect();

        let survivors = self
            .gates
            .iter()
            .enumerate()
            .map(|(position, gate)| {
                let count = rejections
                    .iter()
                    .filter(|rejection| rejection.map_or(true, |at| at > position))
                    .count();
                (gate.name().to_string(), count)
            })
            .collect();
        let stats = GateStats { total: texts.len(), survivors };
        for (name, count) in &stats.survivors {
            info!(gate = %name, survivors = count, total = stats.total, "quality gate");
        }
        (rejections.iter().map(Option::is_none).collect(), stats)
    }
}
