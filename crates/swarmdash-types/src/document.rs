//! The dashboard document pushed to viewers.
//!
//! One [`DashboardDoc`] is a complete refresh of everything the
//! dashboard plots: per-miner training-loss series, per-validator
//! all-reduce series, and the global model evaluation-loss curve.
//! Series are column-oriented (parallel `epoch` / value vectors)
//! because that is the shape the plotting frontend consumes directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// Per-epoch mean training loss reported by one miner.
///
/// `epoch` and `loss` are parallel vectors sorted by epoch ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinerSeries {
    /// Epochs with at least one loss report, ascending.
    pub epoch: Vec<u64>,
    /// Mean loss per epoch, parallel to `epoch`.
    pub loss: Vec<f64>,
}

/// Per-epoch count of miners that completed a validator's all-reduce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSeries {
    /// Epochs observed by this validator, ascending.
    pub epoch: Vec<u64>,
    /// Successful peer count per epoch, parallel to `epoch`.
    pub count: Vec<u32>,
}

/// Per-epoch learning rate observed by one validator.
///
/// The learning rate field is not reported for every epoch; missing
/// entries are carried as `None` and serialize to JSON `null`, which
/// the frontend renders as a gap in the curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningRateSeries {
    /// Epochs observed by this validator, ascending.
    pub epoch: Vec<u64>,
    /// Learning rate per epoch (or `None`), parallel to `epoch`.
    pub value: Vec<Option<f64>>,
}

/// All series attributed to a single validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSeries {
    /// Successful all-reduce peer counts per epoch.
    pub peers: PeerSeries,
    /// Learning rate per epoch.
    pub learning_rate: LearningRateSeries,
}

/// Global model evaluation loss per outer optimization step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossCurve {
    /// Outer steps with an evaluation result, ascending.
    pub outer_steps: Vec<u64>,
    /// Evaluation loss per outer step, parallel to `outer_steps`.
    pub losses: Vec<f64>,
}

// ---------------------------------------------------------------------------
// DashboardDoc
// ---------------------------------------------------------------------------

/// One complete dashboard refresh.
///
/// Maps are keyed by miner / validator UID strings. `BTreeMap` keeps
/// the serialized key order deterministic, so two documents built from
/// the same upstream rows serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardDoc {
    /// The training run this document describes.
    pub run_id: String,
    /// Training-loss series keyed by miner UID.
    pub miners: BTreeMap<String, MinerSeries>,
    /// All-reduce series keyed by validator UID.
    pub validators: BTreeMap<String, ValidatorSeries>,
    /// Global model evaluation-loss curve.
    #[serde(rename = "global_loss_data")]
    pub global_loss: LossCurve,
    /// Distinct miners that reported within the query window.
    ///
    /// Counted before any plot sampling, so it reflects swarm size
    /// rather than the number of plotted series.
    pub active_miners: u32,
    /// Human-readable model size label, e.g. `"1.1B"`.
    pub model_size: String,
}

impl DashboardDoc {
    /// The document's recency marker: the maximum epoch across every
    /// series in the payload (each miner's epochs and each validator's
    /// peer epochs).
    ///
    /// Returns `None` when no series carries an epoch, in which case
    /// the caller must treat the previously accepted version as still
    /// current.
    pub fn latest_epoch(&self) -> Option<u64> {
        let miner_epochs = self.miners.values().flat_map(|s| s.epoch.iter());
        let validator_epochs = self.validators.values().flat_map(|s| s.peers.epoch.iter());
        miner_epochs.chain(validator_epochs).copied().max()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn doc_with_epochs(miner_epochs: &[u64], validator_epochs: &[u64]) -> DashboardDoc {
        let mut doc = DashboardDoc {
            run_id: String::from("6"),
            ..DashboardDoc::default()
        };
        if !miner_epochs.is_empty() {
            doc.miners.insert(
                String::from("12"),
                MinerSeries {
                    epoch: miner_epochs.to_vec(),
                    loss: miner_epochs.iter().map(|_| 2.5).collect(),
                },
            );
        }
        if !validator_epochs.is_empty() {
            doc.validators.insert(
                String::from("25"),
                ValidatorSeries {
                    peers: PeerSeries {
                        epoch: validator_epochs.to_vec(),
                        count: validator_epochs.iter().map(|_| 8).collect(),
                    },
                    learning_rate: LearningRateSeries::default(),
                },
            );
        }
        doc
    }

    #[test]
    fn latest_epoch_spans_miners_and_validators() {
        let doc = doc_with_epochs(&[1, 2, 3], &[2, 5]);
        assert_eq!(doc.latest_epoch(), Some(5));

        let doc = doc_with_epochs(&[7, 9], &[2, 5]);
        assert_eq!(doc.latest_epoch(), Some(9));
    }

    #[test]
    fn latest_epoch_from_single_side() {
        assert_eq!(doc_with_epochs(&[4], &[]).latest_epoch(), Some(4));
        assert_eq!(doc_with_epochs(&[], &[6]).latest_epoch(), Some(6));
    }

    #[test]
    fn latest_epoch_none_when_no_series() {
        assert_eq!(DashboardDoc::default().latest_epoch(), None);
    }

    #[test]
    fn latest_epoch_ignores_learning_rate_epochs() {
        // Learning-rate epochs always accompany peer epochs from the
        // same pivoted rows; only peer epochs feed the version rule.
        let mut doc = doc_with_epochs(&[], &[3]);
        if let Some(series) = doc.validators.get_mut("25") {
            series.learning_rate = LearningRateSeries {
                epoch: vec![99],
                value: vec![Some(0.001)],
            };
        }
        assert_eq!(doc.latest_epoch(), Some(3));
    }

    #[test]
    fn serializes_with_viewer_contract_keys() {
        let mut doc = doc_with_epochs(&[1], &[1]);
        doc.active_miners = 42;
        doc.model_size = String::from("1.1B");
        doc.global_loss = LossCurve {
            outer_steps: vec![0, 1],
            losses: vec![3.1, 2.9],
        };

        let json: serde_json::Value = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["run_id"], "6");
        assert_eq!(json["miners"]["12"]["epoch"][0], 1);
        assert_eq!(json["validators"]["25"]["peers"]["count"][0], 8);
        assert_eq!(json["global_loss_data"]["outer_steps"][1], 1);
        assert_eq!(json["active_miners"], 42);
        assert_eq!(json["model_size"], "1.1B");
    }

    #[test]
    fn missing_learning_rate_serializes_as_null() {
        let series = LearningRateSeries {
            epoch: vec![1, 2],
            value: vec![Some(0.01), None],
        };
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["value"][1], serde_json::Value::Null);
    }
}
