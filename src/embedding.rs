//! Deterministic text embedding
//!
//! Folds character codes into a fixed number of slots and max-normalizes the
//! result. This is not a semantic embedding; its shape must match the vector
//! column the store's ranking procedure searches over.

use serde::Serialize;

/// Number of dimensions of every stored feature vector.
pub const EMBEDDING_DIM: usize = 384;

/// A feature vector of exactly [`EMBEDDING_DIM`] values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn zeros() -> Self {
        Self(vec![0.0; EMBEDDING_DIM])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

/// Whitespace and line terminators as ECMAScript `String.prototype.trim`
/// defines them. Unlike `char::is_whitespace` this includes U+FEFF and
/// excludes U+0085.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{B}' | '\u{C}' | ' ' | '\u{A0}' | '\u{FEFF}'
            | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}'
            | '\n' | '\r' | '\u{2028}' | '\u{2029}'
    )
}

/// Embed `text` into a [`FeatureVector`].
///
/// Positions and codes are UTF-16 code units so vectors written by earlier
/// clients stay comparable. Characters at positions `i` and `i + 384` land in
/// the same slot. Blankness follows the same rule as those clients.
pub fn generate_embedding(text: &str) -> FeatureVector {
    if text.trim_matches(is_js_whitespace).is_empty() {
        return FeatureVector::zeros();
    }

    let mut slots = [0f64; EMBEDDING_DIM];
    for (i, unit) in text.encode_utf16().enumerate() {
        slots[i % EMBEDDING_DIM] += f64::from(unit);
    }

    let max_val = slots.iter().copied().fold(1.0_f64, f64::max);

    FeatureVector(slots.iter().map(|v| (v / max_val) as f32).collect())
}
