//! Chunk-count normalization, applied wherever a user-supplied count is consumed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive bounds and fallback for a normalized chunk count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl Default for ChunkBounds {
    fn default() -> Self {
        Self {
            min: 2,
            max: 32,
            default: 10,
        }
    }
}

impl ChunkBounds {
    pub fn new(min: usize, max: usize, default: usize) -> Self {
        Self { min, max, default }
    }

    /// Normalize an already-numeric count (e.g. a CLI flag).
    pub fn normalize_count(&self, count: usize) -> usize {
        self.normalize_number(count as f64)
    }

    /// Missing, non-finite or zero ⇒ default; otherwise round to nearest and clamp.
    pub fn normalize_number(&self, raw: f64) -> usize {
        if !raw.is_finite() || raw == 0.0 {
            return self.default;
        }
        let rounded = raw.round();
        let hi = self.max.max(self.min) as f64;
        let lo = self.min as f64;
        rounded.clamp(lo, hi) as usize
    }
}

/// Normalizes a raw chunk-count value as found in storage or an inbound message.
///
/// `None`, `null`, booleans, non-numeric strings and zero yield `bounds.default`;
/// numeric strings are parsed; non-integers are rounded to nearest; the result
/// is clamped into `[bounds.min, bounds.max]`.
pub fn normalize_chunk_count(raw: Option<&Value>, bounds: &ChunkBounds) -> usize {
    let number = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) => bounds.normalize_number(n),
        None => bounds.default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(v: Option<Value>) -> usize {
        normalize_chunk_count(v.as_ref(), &ChunkBounds::default())
    }

    #[test]
    fn missing_or_garbage_is_default() {
        assert_eq!(norm(None), 10);
        assert_eq!(norm(Some(Value::Null)), 10);
        assert_eq!(norm(Some(json!("abc"))), 10);
        assert_eq!(norm(Some(json!(true))), 10);
        assert_eq!(norm(Some(json!(0))), 10);
    }

    #[test]
    fn clamps_into_bounds() {
        assert_eq!(norm(Some(json!(1))), 2);
        assert_eq!(norm(Some(json!(100))), 32);
        assert_eq!(norm(Some(json!(-4))), 2);
    }

    #[test]
    fn passes_through_valid_values() {
        assert_eq!(norm(Some(json!(8))), 8);
        assert_eq!(norm(Some(json!(16))), 16);
        assert_eq!(norm(Some(json!(2))), 2);
        assert_eq!(norm(Some(json!(32))), 32);
        assert_eq!(norm(Some(json!("12"))), 12);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(norm(Some(json!(7.6))), 8);
        assert_eq!(norm(Some(json!(7.2))), 7);
    }

    #[test]
    fn custom_bounds() {
        let bounds = ChunkBounds::new(1, 20, 5);
        assert_eq!(normalize_chunk_count(Some(&json!(50)), &bounds), 20);
        assert_eq!(normalize_chunk_count(None, &bounds), 5);
        assert_eq!(bounds.normalize_count(1), 1);
    }
}
