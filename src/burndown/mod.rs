//! Aggregation of issue snapshots into burndown series.

pub mod daily;
pub mod weighted;

pub use daily::{DailyBucket, DailyBurndown};
pub use weighted::{WeightedBurndown, WeightedPoint};

/// Output of either aggregation mode, as consumed by the renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Burndown {
    Daily(DailyBurndown),
    Weighted(WeightedBurndown),
}

impl From<DailyBurndown> for Burndown {
    fn from(value: DailyBurndown) -> Self {
        Self::Daily(value)
    }
}

impl From<WeightedBurndown> for Burndown {
    fn from(value: WeightedBurndown) -> Self {
        Self::Weighted(value)
    }
}
