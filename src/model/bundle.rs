//! Checksummed model persistence. A bundle carries everything inference
//! needs: the trained ensemble, the feature layout with imputation medians
//! and the weather encoder, and the risk thresholds in force at training
//! time. The envelope pins a SHA-256 of the payload so a truncated or
//! hand-edited file is rejected at load.

use super::gbdt::GbdtClassifier;
use crate::config::{FeaturesConfig, RiskConfig};
use crate::error::{Result, RiskError};
use crate::select::SelectorState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: u32,
    pub classifier: GbdtClassifier,
    pub selector: SelectorState,
    /// Feature-engineering parameters in force at training time; scoring
    /// must rebuild the exact same derived features.
    pub features: FeaturesConfig,
    pub risk: RiskConfig,
    /// Gain importance aligned with `selector` layout order.
    pub importance: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    payload: String,
}

impl ModelBundle {
    pub fn new(
        classifier: GbdtClassifier,
        selector: SelectorState,
        features: FeaturesConfig,
        risk: RiskConfig,
    ) -> Self {
        let importance = classifier.importance().to_vec();
        Self {
            version: BUNDLE_VERSION,
            classifier,
            selector,
            features,
            risk,
            importance,
        }
    }

    /// Write atomically: serialize to a sibling temp file, then rename over
    /// the target so a crash never leaves a half-written bundle behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_string(self)?;
        let envelope = Envelope {
            checksum: hex_sha256(payload.as_bytes()),
            payload,
        };
        let encoded = serde_json::to_vec(&envelope)?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &encoded)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        let envelope: Envelope = serde_json::from_slice(&raw)
            .map_err(|e| RiskError::Bundle(format!("malformed envelope: {e}")))?;
        let actual = hex_sha256(envelope.payload.as_bytes());
        if actual != envelope.checksum {
            return Err(RiskError::Bundle(format!(
                "checksum mismatch: expected {}, computed {}",
                envelope.checksum, actual
            )));
        }
        let bundle: Self = serde_json::from_str(&envelope.payload)
            .map_err(|e| RiskError::Bundle(format!("malformed payload: {e}")))?;
        if bundle.version != BUNDLE_VERSION {
            return Err(RiskError::Bundle(format!(
                "unsupported bundle version {}",
                bundle.version
            )));
        }
        Ok(bundle)
    }
}

fn hex_sha256(data: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(data);
    format!("{:x}", h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeaturesConfig, TrainingConfig};
    use ndarray::Array2;

    fn trained() -> GbdtClassifier {
        let mut x = Array2::zeros((40, 2));
        let mut y = Vec::new();
        for i in 0..40 {
            x[[i, 0]] = if i % 2 == 0 { 90.0 } else { 30.0 } + (i % 5) as f64;
            x[[i, 1]] = i as f64;
            y.push(if i % 2 == 0 { 1.0 } else { 0.0 });
        }
        let cfg = TrainingConfig {
            n_estimators: 10,
            min_samples_leaf: 2,
            ..TrainingConfig::default()
        };
        GbdtClassifier::train(&x, &y, &x, &y, &cfg).unwrap().0
    }

    fn selector_state() -> SelectorState {
        SelectorState {
            layout: vec!["speed".into(), "rpm".into()],
            medians: vec![50.0, 2000.0],
            encoder: None,
        }
    }

    #[test]
    fn save_load_round_trip() {
        use crate::model::TrainableClassifier;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let bundle = ModelBundle::new(trained(), selector_state(), FeaturesConfig::default(), RiskConfig::default());
        bundle.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.selector.layout, bundle.selector.layout);
        let row = ndarray::arr1(&[85.0, 7.0]);
        assert_eq!(
            loaded.classifier.predict_probability(row.view()),
            bundle.classifier.predict_probability(row.view()),
        );
    }

    #[test]
    fn tampered_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        ModelBundle::new(trained(), selector_state(), FeaturesConfig::default(), RiskConfig::default())
            .save(&path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replacen("speed", "SPEED", 1);
        std::fs::write(&path, tampered).unwrap();

        let err = ModelBundle::load(&path).unwrap_err();
        assert!(matches!(err, RiskError::Bundle(_)));
    }

    #[test]
    fn garbage_file_is_a_bundle_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            ModelBundle::load(&path).unwrap_err(),
            RiskError::Bundle(_)
        ));
    }
}
