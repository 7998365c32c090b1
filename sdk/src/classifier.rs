//! Opaque seed classifier trait and feature-vector contract
//!
//! The classifier is an external collaborator: the engine only knows how to
//! build its input and consume its output. The feature vector is a strict
//! contract: exactly [`FEATURE_COUNT`] values, in the order nitrogen,
//! phosphorus, potassium, pH, moisture, temperature. A model that indexes
//! outside that range is broken, not the adapter.

use crate::types::SeedCategory;

/// Width of the classifier feature vector.
pub const FEATURE_COUNT: usize = 6;

/// Fixed-order classifier input: `[n, p, k, ph, moisture, temperature]`.
pub type FeatureVector = [i16; FEATURE_COUNT];

/// Opaque `predict(features) -> category` function.
///
/// Implementations must be pure: identical inputs yield identical categories
/// across calls. Training and serialization are out of scope.
pub trait SeedClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> SeedCategory;
}
