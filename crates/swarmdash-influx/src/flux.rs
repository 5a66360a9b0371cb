//! Flux query construction.
//!
//! Each builder returns the full Flux source text for one of the four
//! dashboard queries. Aggregation (mean/max per group) happens server
//! side; value-level parsing and reshaping happen in
//! [`collector`](crate::collector).
//!
//! Run ids and bucket names are operator-controlled configuration, not
//! end-user input; they are interpolated verbatim.

/// Query the distinct run ids seen on validator all-reduce operations
/// within the window.
///
/// The collector picks the numerically greatest id as the current run.
pub fn latest_run_id(bucket: &str, days: u32) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -{days}d)
  |> filter(fn: (r) => r._measurement == "allreduce_operations")
  |> filter(fn: (r) => exists r.run_id)
  |> keep(columns: ["run_id"])
  |> group()
  |> distinct(column: "run_id")
"#
    )
}

/// Query mean training loss per (miner, epoch) for one run.
///
/// Grouping by tag on the server collapses each miner's many step
/// reports into one mean loss per epoch.
pub fn miner_training(bucket: &str, run_id: &str, days: u32) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -{days}d)
  |> filter(fn: (r) => r._measurement == "training_metrics")
  |> filter(fn: (r) => r._field == "loss")
  |> filter(fn: (r) => r.run_id == "{run_id}")
  |> group(columns: ["miner_uid", "epoch", "run_id"])
  |> mean()
"#
    )
}

/// Query all-reduce outcomes per (validator, epoch) for one run,
/// pivoted so each record carries `participating_miners`,
/// `failed_miners`, and `learning_rate` columns.
pub fn validator_allreduce(bucket: &str, run_id: &str, days: u32) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -{days}d)
  |> filter(fn: (r) => r._measurement == "allreduce_operations")
  |> filter(fn: (r) => exists r.epoch and exists r.validator_uid and exists r._value)
  |> filter(fn: (r) => r.run_id == "{run_id}")
  |> drop(columns: ["_start", "_stop"])
  |> group(columns: ["validator_uid", "epoch", "run_id", "_field"])
  |> max()
  |> pivot(rowKey: ["epoch", "validator_uid"], columnKey: ["_field"], valueColumn: "_value")
  |> sort(columns: ["epoch"])
"#
    )
}

/// Query global model evaluation losses for one run.
///
/// Evaluation rows are tagged `"<run>.<outer_step>"` (plus a trailing
/// component on some writers); the collector parses the outer step out
/// of the tag. Sorted by time ascending so the newest evaluation of a
/// re-run step wins during assembly.
pub fn eval_loss(bucket: &str, run_id: &str, days: u32) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: -{days}d)
  |> filter(fn: (r) => r._measurement == "evaluation_metrics")
  |> filter(fn: (r) => r.task == "fineweb")
  |> filter(fn: (r) => r.tag =~ /^{run_id}\./)
  |> sort(columns: ["_time"])
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_run_id_targets_allreduce_measurement() {
        let q = latest_run_id("swarm-metrics", 7);
        assert!(q.contains(r#"from(bucket: "swarm-metrics")"#));
        assert!(q.contains("range(start: -7d)"));
        assert!(q.contains(r#"r._measurement == "allreduce_operations""#));
        assert!(q.contains(r#"distinct(column: "run_id")"#));
    }

    #[test]
    fn miner_training_filters_run_and_field() {
        let q = miner_training("swarm-metrics", "6", 30);
        assert!(q.contains(r#"r._field == "loss""#));
        assert!(q.contains(r#"r.run_id == "6""#));
        assert!(q.contains(r#"group(columns: ["miner_uid", "epoch", "run_id"])"#));
        assert!(q.contains("mean()"));
    }

    #[test]
    fn validator_allreduce_pivots_fields() {
        let q = validator_allreduce("swarm-metrics", "6", 30);
        assert!(q.contains("pivot(rowKey: [\"epoch\", \"validator_uid\"]"));
        assert!(q.contains("max()"));
        assert!(q.contains(r#"r.run_id == "6""#));
    }

    #[test]
    fn eval_loss_matches_run_tags() {
        let q = eval_loss("swarm-metrics", "6", 365);
        assert!(q.contains(r"r.tag =~ /^6\./"));
        assert!(q.contains(r#"r.task == "fineweb""#));
        assert!(q.contains("range(start: -365d)"));
    }
}
