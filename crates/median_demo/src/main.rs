use running_median::{
    Ascending, BalanceMode, Comparator, Descending, MedianTree, OrderedMapMedian, RunningMedian,
};
use serde::Deserialize;

const STREAM: [f64; 8] = [3.0, 1.0, 2.0, 2.0, 7.0, 9.0, 4.0, 6.0];

/// Read from `MEDIAN_*` environment variables.
#[derive(Debug, Deserialize)]
struct DemoConfig {
    #[serde(default)]
    mode: BalanceMode,
    #[serde(default = "default_descending")]
    descending: bool,
}

fn default_descending() -> bool {
    true
}

fn feed<M: RunningMedian>(
    median: &mut M,
    values: impl IntoIterator<Item = M::Value>,
) -> Option<M::Value> {
    median.extend(values);
    median.median()
}

fn tree_median<C: Comparator<f64>>(compare: C, mode: BalanceMode) -> Option<f64> {
    let mut tree = MedianTree::<f64, C>::with_capacity_and_comparator(STREAM.len(), compare, mode);
    let median = feed(&mut tree, STREAM);
    if let Err(violation) = tree.validate() {
        tracing::error!(%violation, "tree invariants broken after demo stream");
    }
    median
}

fn medians<C>(compare: C, mode: BalanceMode) -> (Option<f64>, Option<f64>)
where
    C: Comparator<f64> + Clone,
{
    let tree = tree_median(compare.clone(), mode);
    let map = feed(&mut OrderedMapMedian::<f64, C>::with_comparator(compare), STREAM);
    (tree, map)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(error) = dotenv::dotenv() {
        tracing::debug!(%error, "no .env file loaded");
    }
    let config: DemoConfig = envy::prefixed("MEDIAN_").from_env()?;
    tracing::info!(?config, "running demo stream {:?}", STREAM);

    let (tree, map) = if config.descending {
        medians(Descending, config.mode)
    } else {
        medians(Ascending, config.mode)
    };

    match tree {
        Some(median) => tracing::info!("AVL median = {median:.3}"),
        None => tracing::warn!("AVL median unavailable"),
    }
    match map {
        Some(median) => tracing::info!("Map median = {median:.3}"),
        None => tracing::warn!("Map median unavailable"),
    }
    Ok(())
}
