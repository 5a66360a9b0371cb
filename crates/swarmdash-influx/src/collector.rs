//! Dashboard document assembly.
//!
//! [`DashboardCollector`] runs the four Flux queries for the current
//! run and reshapes the resulting records into one
//! [`DashboardDoc`]. It implements the core's
//! [`SnapshotSource`] seam, so the refresh loop drives it without
//! knowing anything about Flux or CSV.
//!
//! Value-level tolerance mirrors the upstream reality: rows with
//! unparsable uids, epochs, or values are dropped row-by-row rather
//! than failing the whole poll.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use rand::seq::IteratorRandom;
use serde::Deserialize;
use tracing::{debug, info};

use swarmdash_core::{FetchError, SnapshotSource};
use swarmdash_types::{
    DashboardDoc, LearningRateSeries, LossCurve, MinerSeries, PeerSeries, ValidatorSeries,
};

use crate::client::{InfluxClient, InfluxConfig};
use crate::csv::Record;
use crate::error::InfluxError;
use crate::flux;

/// Assembly options for the collector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectorConfig {
    /// At most this many miner series are kept per document, sampled
    /// uniformly when more miners report. Keeps the plot legible.
    #[serde(default = "default_miner_sample_size")]
    pub miner_sample_size: usize,

    /// Model size label carried verbatim in the document.
    #[serde(default = "default_model_size")]
    pub model_size: String,
}

const fn default_miner_sample_size() -> usize {
    10
}

fn default_model_size() -> String {
    String::from("1.1B")
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            miner_sample_size: default_miner_sample_size(),
            model_size: default_model_size(),
        }
    }
}

/// Collects the complete dashboard document from the metrics store.
pub struct DashboardCollector {
    client: InfluxClient,
    config: InfluxConfig,
    options: CollectorConfig,
}

impl DashboardCollector {
    /// Build a collector from connection settings and assembly options.
    ///
    /// # Errors
    ///
    /// Returns [`InfluxError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: InfluxConfig, options: CollectorConfig) -> Result<Self, InfluxError> {
        let client = InfluxClient::new(&config)?;
        Ok(Self {
            client,
            config,
            options,
        })
    }

    /// Run all queries and assemble one dashboard document.
    ///
    /// # Errors
    ///
    /// Returns [`InfluxError`] when a query fails, its response cannot
    /// be decoded, or no run id exists in the discovery window.
    pub async fn collect(&self) -> Result<DashboardDoc, InfluxError> {
        let run_id = self.latest_run_id().await?;

        let miner_records = self
            .client
            .query(&flux::miner_training(
                &self.config.bucket,
                &run_id,
                self.config.series_window_days,
            ))
            .await?;
        let validator_records = self
            .client
            .query(&flux::validator_allreduce(
                &self.config.bucket,
                &run_id,
                self.config.series_window_days,
            ))
            .await?;
        let eval_records = self
            .client
            .query(&flux::eval_loss(
                &self.config.bucket,
                &run_id,
                self.config.eval_window_days,
            ))
            .await?;

        let (mut miners, active_miners) = miner_series(&miner_records);
        sample_miners(&mut miners, self.options.miner_sample_size);
        let validators = validator_series(&validator_records);
        let global_loss = loss_curve(&eval_records);

        info!(
            run_id,
            miners = miners.len(),
            validators = validators.len(),
            eval_points = global_loss.outer_steps.len(),
            active_miners,
            "dashboard document assembled"
        );

        Ok(DashboardDoc {
            run_id,
            miners,
            validators,
            global_loss,
            active_miners,
            model_size: self.options.model_size.clone(),
        })
    }

    /// The numerically greatest run id seen in the discovery window.
    async fn latest_run_id(&self) -> Result<String, InfluxError> {
        let query = flux::latest_run_id(&self.config.bucket, self.config.run_window_days);
        let records = self.client.query(&query).await?;

        records
            .iter()
            .filter_map(|r| r.get("_value"))
            .filter_map(|v| parse_u64(v).map(|n| (n, v.clone())))
            .max_by_key(|(n, _)| *n)
            .map(|(_, v)| v)
            .ok_or_else(|| InfluxError::NoData(String::from("run ids")))
    }
}

impl SnapshotSource for DashboardCollector {
    fn fetch(&mut self) -> impl Future<Output = Result<DashboardDoc, FetchError>> + Send {
        async move { self.collect().await.map_err(FetchError::from) }
    }
}

// ---------------------------------------------------------------------------
// Series assembly
// ---------------------------------------------------------------------------

/// Reshape mean-loss records into per-miner series.
///
/// Returns the series plus the count of distinct reporting miners
/// (taken before any sampling). Losses must be positive; zero and
/// negative values are sentinel junk from crashed reporters.
fn miner_series(records: &[Record]) -> (BTreeMap<String, MinerSeries>, u32) {
    let mut by_miner: BTreeMap<String, BTreeMap<u64, f64>> = BTreeMap::new();
    let mut reporting: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        let Some(uid) = record.get("miner_uid") else {
            continue;
        };
        reporting.insert(uid.as_str());

        let (Some(epoch), Some(loss)) = (
            record.get("epoch").and_then(|v| parse_u64(v)),
            record.get("_value").and_then(|v| v.parse::<f64>().ok()),
        ) else {
            debug!(miner_uid = %uid, "skipping unparsable miner row");
            continue;
        };
        if loss <= 0.0 {
            continue;
        }
        by_miner.entry(uid.clone()).or_default().insert(epoch, loss);
    }

    let miners = by_miner
        .into_iter()
        .map(|(uid, points)| {
            let mut series = MinerSeries::default();
            for (epoch, loss) in points {
                series.epoch.push(epoch);
                series.loss.push(loss);
            }
            (uid, series)
        })
        .collect();

    let active = u32::try_from(reporting.len()).unwrap_or(u32::MAX);
    (miners, active)
}

/// Keep at most `cap` miner series, sampled uniformly.
fn sample_miners(miners: &mut BTreeMap<String, MinerSeries>, cap: usize) {
    if miners.len() <= cap {
        return;
    }
    let mut rng = rand::rng();
    let keep: BTreeSet<String> = miners
        .keys()
        .cloned()
        .choose_multiple(&mut rng, cap)
        .into_iter()
        .collect();
    miners.retain(|uid, _| keep.contains(uid));
}

/// Reshape pivoted all-reduce records into per-validator series.
///
/// Successful peers = `participating_miners - failed_miners` (missing
/// failure counts mean none failed). The learning rate is optional per
/// epoch and carried as `None` where absent.
fn validator_series(records: &[Record]) -> BTreeMap<String, ValidatorSeries> {
    let mut by_validator: BTreeMap<String, BTreeMap<u64, (u32, Option<f64>)>> = BTreeMap::new();

    for record in records {
        let Some(uid) = record.get("validator_uid") else {
            continue;
        };
        let (Some(epoch), Some(participating)) = (
            record.get("epoch").and_then(|v| parse_u64(v)),
            record.get("participating_miners").and_then(|v| parse_count(v)),
        ) else {
            debug!(validator_uid = %uid, "skipping unparsable validator row");
            continue;
        };
        let failed = record
            .get("failed_miners")
            .and_then(|v| parse_count(v))
            .unwrap_or(0);
        let successful = participating.saturating_sub(failed);
        let learning_rate = record
            .get("learning_rate")
            .and_then(|v| v.parse::<f64>().ok());

        by_validator
            .entry(uid.clone())
            .or_default()
            .insert(epoch, (successful, learning_rate));
    }

    by_validator
        .into_iter()
        .map(|(uid, points)| {
            let mut peers = PeerSeries::default();
            let mut learning_rate = LearningRateSeries::default();
            for (epoch, (count, rate)) in points {
                peers.epoch.push(epoch);
                peers.count.push(count);
                learning_rate.epoch.push(epoch);
                learning_rate.value.push(rate);
            }
            (
                uid,
                ValidatorSeries {
                    peers,
                    learning_rate,
                },
            )
        })
        .collect()
}

/// Reshape evaluation records into the global loss curve.
///
/// Rows are tagged `"<run>.<outer_step>"` with an optional trailing
/// component; records arrive sorted by time ascending, so the newest
/// evaluation of a re-run step wins.
fn loss_curve(records: &[Record]) -> LossCurve {
    let mut by_step: BTreeMap<u64, f64> = BTreeMap::new();

    for record in records {
        let (Some(step), Some(loss)) = (
            record.get("tag").and_then(|t| parse_outer_step(t)),
            record.get("_value").and_then(|v| v.parse::<f64>().ok()),
        ) else {
            continue;
        };
        by_step.insert(step, loss);
    }

    let mut curve = LossCurve::default();
    for (step, loss) in by_step {
        curve.outer_steps.push(step);
        curve.losses.push(loss);
    }
    curve
}

/// Parse the outer step out of an evaluation tag like `"6.40"` or
/// `"6.40.0"`.
fn parse_outer_step(tag: &str) -> Option<u64> {
    tag.split('.').nth(1).and_then(parse_u64)
}

/// Parse an integer that some writers emit in float form (`"40"` or
/// `"40.0"`).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_u64(value: &str) -> Option<u64> {
    if let Ok(n) = value.parse::<u64>() {
        return Some(n);
    }
    value.parse::<f64>().ok().and_then(|f| {
        if f.is_finite() && f >= 0.0 {
            Some(f.round() as u64)
        } else {
            None
        }
    })
}

/// Parse a count field that aggregation turned into a float.
fn parse_count(value: &str) -> Option<u32> {
    parse_u64(value).and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn miner_series_groups_and_sorts_by_epoch() {
        let records = vec![
            record(&[("miner_uid", "12"), ("epoch", "41"), ("_value", "2.41")]),
            record(&[("miner_uid", "12"), ("epoch", "40"), ("_value", "2.46")]),
            record(&[("miner_uid", "77"), ("epoch", "41"), ("_value", "2.50")]),
        ];

        let (miners, active) = miner_series(&records);
        assert_eq!(active, 2);
        assert_eq!(miners["12"].epoch, vec![40, 41]);
        assert_eq!(miners["12"].loss, vec![2.46, 2.41]);
        assert_eq!(miners["77"].epoch, vec![41]);
    }

    #[test]
    fn miner_series_drops_nonpositive_and_unparsable_rows() {
        let records = vec![
            record(&[("miner_uid", "12"), ("epoch", "40"), ("_value", "0.0")]),
            record(&[("miner_uid", "12"), ("epoch", "41"), ("_value", "-1.5")]),
            record(&[("miner_uid", "12"), ("epoch", "oops"), ("_value", "2.4")]),
            record(&[("miner_uid", "12"), ("epoch", "42"), ("_value", "2.4")]),
        ];

        let (miners, active) = miner_series(&records);
        // The miner still counts as reporting even though most rows
        // were junk.
        assert_eq!(active, 1);
        assert_eq!(miners["12"].epoch, vec![42]);
    }

    #[test]
    fn miner_series_accepts_float_form_epochs() {
        let records = vec![record(&[
            ("miner_uid", "12"),
            ("epoch", "40.0"),
            ("_value", "2.4"),
        ])];
        let (miners, _) = miner_series(&records);
        assert_eq!(miners["12"].epoch, vec![40]);
    }

    #[test]
    fn sampling_caps_the_miner_count() {
        let records: Vec<Record> = (0..25)
            .map(|uid| {
                record(&[
                    ("miner_uid", uid.to_string().as_str()),
                    ("epoch", "1"),
                    ("_value", "2.0"),
                ])
            })
            .collect();

        let (mut miners, active) = miner_series(&records);
        assert_eq!(active, 25);

        sample_miners(&mut miners, 10);
        assert_eq!(miners.len(), 10);
    }

    #[test]
    fn sampling_is_a_noop_under_the_cap() {
        let records = vec![
            record(&[("miner_uid", "1"), ("epoch", "1"), ("_value", "2.0")]),
            record(&[("miner_uid", "2"), ("epoch", "1"), ("_value", "2.0")]),
        ];
        let (mut miners, _) = miner_series(&records);
        sample_miners(&mut miners, 10);
        assert_eq!(miners.len(), 2);
        assert!(miners.contains_key("1") && miners.contains_key("2"));
    }

    #[test]
    fn validator_series_computes_successful_peers() {
        let records = vec![
            record(&[
                ("validator_uid", "25"),
                ("epoch", "40"),
                ("participating_miners", "12"),
                ("failed_miners", "2"),
                ("learning_rate", "0.001"),
            ]),
            record(&[
                ("validator_uid", "25"),
                ("epoch", "41"),
                ("participating_miners", "11.0"),
            ]),
        ];

        let validators = validator_series(&records);
        let series = &validators["25"];
        assert_eq!(series.peers.epoch, vec![40, 41]);
        assert_eq!(series.peers.count, vec![10, 11]);
        assert_eq!(series.learning_rate.value, vec![Some(0.001), None]);
    }

    #[test]
    fn validator_series_never_underflows_on_bad_failure_counts() {
        let records = vec![record(&[
            ("validator_uid", "25"),
            ("epoch", "40"),
            ("participating_miners", "3"),
            ("failed_miners", "5"),
        ])];

        let validators = validator_series(&records);
        assert_eq!(validators["25"].peers.count, vec![0]);
    }

    #[test]
    fn loss_curve_parses_steps_from_tags() {
        let records = vec![
            record(&[("tag", "6.0.0"), ("_value", "3.2")]),
            record(&[("tag", "6.40.0"), ("_value", "2.8")]),
            record(&[("tag", "6.40"), ("_value", "2.7")]),
            record(&[("tag", "malformed"), ("_value", "9.9")]),
        ];

        let curve = loss_curve(&records);
        assert_eq!(curve.outer_steps, vec![0, 40]);
        // The later (newer) evaluation of step 40 wins.
        assert_eq!(curve.losses, vec![3.2, 2.7]);
    }

    #[test]
    fn outer_step_parsing_handles_both_tag_shapes() {
        assert_eq!(parse_outer_step("6.40.0"), Some(40));
        assert_eq!(parse_outer_step("6.40"), Some(40));
        assert_eq!(parse_outer_step("6"), None);
        assert_eq!(parse_outer_step("6.x.0"), None);
    }

    #[test]
    fn collector_config_defaults() {
        let options = CollectorConfig::default();
        assert_eq!(options.miner_sample_size, 10);
        assert_eq!(options.model_size, "1.1B");
    }
}
