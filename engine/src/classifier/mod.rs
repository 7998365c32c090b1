//! Classifier adapter and bundled default model
//!
//! The adapter is the only place that knows how a `ReadingSnapshot` becomes
//! classifier input. The mapping is the fixed feature-vector contract from
//! the SDK: width 6, order `[n, p, k, ph, moisture, temperature]`. The
//! adapter holds no state and the classifier trait demands purity, so
//! classifying the same snapshot twice always yields the same category.
//!
//! `DecisionTreeModel` is a compact soil-suitability tree shipped as the
//! default model so the binary works out of the box. It discriminates on
//! temperature bands first, then moisture, pH and nitrogen, yielding the
//! same label space (0..=21) as the trained model it stands in for. Every
//! comparison stays inside the six-feature contract.

use std::sync::Arc;

use sdk::classifier::{FeatureVector, SeedClassifier};
use sdk::types::{ReadingSnapshot, SeedCategory};

/// Build the classifier input from a snapshot.
///
/// Feature order is a strict external contract; changing it silently
/// changes every prediction.
pub fn feature_vector(snapshot: &ReadingSnapshot) -> FeatureVector {
    [
        snapshot.nitrogen,
        snapshot.phosphorus,
        snapshot.potassium,
        snapshot.ph,
        snapshot.moisture,
        snapshot.temperature,
    ]
}

/// Stateless bridge between snapshots and the opaque classifier.
pub struct ClassifierAdapter {
    model: Arc<dyn SeedClassifier>,
}

impl ClassifierAdapter {
    pub fn new(model: Arc<dyn SeedClassifier>) -> Self {
        Self { model }
    }

    /// Map a snapshot onto the feature vector and predict its category.
    pub fn classify(&self, snapshot: &ReadingSnapshot) -> SeedCategory {
        let features = feature_vector(snapshot);
        let category = self.model.predict(&features);
        tracing::debug!(?features, %category, "Snapshot classified");
        category
    }
}

/// Default seed-selection model.
///
/// A hand-checked decision tree over the six contract features. It exists so
/// deployments without a trained model still sow something sensible; swap in
/// a real `SeedClassifier` implementation for production fields.
pub struct DecisionTreeModel;

impl SeedClassifier for DecisionTreeModel {
    fn predict(&self, features: &FeatureVector) -> SeedCategory {
        let [n, p, _k, ph, moisture, temperature] = *features;

        let label = if p < 107 {
            if temperature < 13 {
                // Cold band: frost-tolerant seeds, split by soil nitrogen
                if temperature < 8 {
                    if temperature < 4 {
                        if n < 70 {
                            if moisture < 55 {
                                3
                            } else {
                                4
                            }
                        } else {
                            1
                        }
                    } else if temperature < 7 {
                        6
                    } else {
                        8
                    }
                } else if temperature < 10 {
                    9
                } else if temperature < 11 {
                    10
                } else if temperature < 12 {
                    11
                } else {
                    12
                }
            } else if n < 75 {
                // Temperate band: acidity decides between legume groups
                if temperature < 16 {
                    if ph < 6 {
                        16
                    } else {
                        14
                    }
                } else if temperature < 17 {
                    17
                } else if moisture < 77 {
                    18
                } else {
                    19
                }
            } else {
                15
            }
        } else if temperature < 20 {
            // Phosphorus-rich soil
            if temperature < 19 {
                13
            } else {
                2
            }
        } else if moisture < 87 {
            7
        } else {
            0
        };

        SeedCategory(label)
    }
}
