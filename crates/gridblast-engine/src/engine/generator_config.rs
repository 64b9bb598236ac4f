use serde::{Deserialize, Serialize};

use crate::core::{ShapeCatalog, ShapeId};

/// Number of drop buckets in the weight table and last drop of the schedule.
///
/// Weights for drops past this value reuse the last bucket.
pub const DROP_BUCKETS: usize = 40;

/// Number of scheduled drops (drops 2 through [`DROP_BUCKETS`]).
pub const SCHEDULE_LEN: usize = DROP_BUCKETS - 1;

/// How the pieces of a drop are chosen.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
pub enum GenerationMode {
    /// Heuristic search biased toward pieces that clear lines.
    Favorable,
    /// Weighted random draw.
    Random,
    /// Weighted random draw; the steady state after the schedule ends.
    Standard,
    /// Two single cells plus one favorable pick, only on explicit request.
    AdContinue,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GeneratorConfigError {
    #[display("weight table has {actual} rows, but the catalog has {expected} shapes")]
    WeightRowCount { expected: usize, actual: usize },
    #[display("weight row for shape #{shape} has {actual} buckets, expected {DROP_BUCKETS}")]
    WeightBucketCount { shape: usize, actual: usize },
    #[display("schedule has {actual} entries, expected {SCHEDULE_LEN}")]
    ScheduleLength { actual: usize },
    #[display("schedule entry for drop {drop} is AdContinue, which is only entered on request")]
    ScheduledContinue { drop: usize },
    #[display("at least one shape must be unlocked initially")]
    NoInitialShapes,
    #[display("unlock interval must be at least 1")]
    ZeroUnlockInterval,
    #[display("favorable candidate count must be at least 1")]
    ZeroFavorableCandidates,
}

/// Immutable tuning for [`PieceGenerator`](super::PieceGenerator).
///
/// Built once (either [`Self::for_catalog`] or deserialized from JSON), checked
/// with [`Self::validate`] and then owned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Catalog prefix available from the first drop.
    pub initial_unlocked: usize,
    /// First drop that unlocks additional shapes.
    pub unlock_start_drop: usize,
    /// Drops between two unlocks.
    pub unlock_interval: usize,
    /// Shapes unlocked at each step.
    pub unlock_step: usize,
    /// How many of the best favorable candidates take part in the final draw.
    pub favorable_top_k: usize,
    /// Generation mode for drops 2 through 40.
    pub schedule: Vec<GenerationMode>,
    /// `weights[shape][bucket]`, where bucket `b` is drop `b + 1`.
    pub weights: Vec<Vec<usize>>,
}

impl GeneratorConfig {
    /// Default tuning for `catalog`.
    ///
    /// Weights depend only on cell count: small shapes fade out over the
    /// buckets, large ones become more common, single cells stay rare.
    #[must_use]
    pub fn for_catalog(catalog: &ShapeCatalog) -> Self {
        let weights = catalog
            .shapes()
            .iter()
            .map(|shape| {
                (0..DROP_BUCKETS)
                    .map(|bucket| default_weight(shape.cell_count(), bucket))
                    .collect()
            })
            .collect();
        Self {
            initial_unlocked: 19,
            unlock_start_drop: 10,
            unlock_interval: 5,
            unlock_step: 4,
            favorable_top_k: 5,
            schedule: (2..=DROP_BUCKETS).map(default_mode).collect(),
            weights,
        }
    }

    /// Checks the configuration against the catalog it will be used with.
    pub fn validate(&self, catalog: &ShapeCatalog) -> Result<(), GeneratorConfigError> {
        if self.initial_unlocked == 0 {
            return Err(GeneratorConfigError::NoInitialShapes);
        }
        if self.unlock_interval == 0 {
            return Err(GeneratorConfigError::ZeroUnlockInterval);
        }
        if self.favorable_top_k == 0 {
            return Err(GeneratorConfigError::ZeroFavorableCandidates);
        }
        if self.schedule.len() != SCHEDULE_LEN {
            return Err(GeneratorConfigError::ScheduleLength {
                actual: self.schedule.len(),
            });
        }
        if let Some(i) = self.schedule.iter().position(|m| m.is_ad_continue()) {
            return Err(GeneratorConfigError::ScheduledContinue { drop: i + 2 });
        }
        if self.weights.len() != catalog.len() {
            return Err(GeneratorConfigError::WeightRowCount {
                expected: catalog.len(),
                actual: self.weights.len(),
            });
        }
        if let Some((shape, row)) = self
            .weights
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != DROP_BUCKETS)
        {
            return Err(GeneratorConfigError::WeightBucketCount {
                shape,
                actual: row.len(),
            });
        }
        Ok(())
    }

    /// Mode for a drop: drop 1 (and the pre-game drop 0) is favorable,
    /// drops 2-40 follow the schedule, later drops are standard.
    #[must_use]
    pub fn mode_for_drop(&self, drop: usize) -> GenerationMode {
        match drop {
            0 | 1 => GenerationMode::Favorable,
            2..=DROP_BUCKETS => self
                .schedule
                .get(drop - 2)
                .copied()
                .unwrap_or(GenerationMode::Standard),
            _ => GenerationMode::Standard,
        }
    }

    /// Number of catalog shapes available at `drop`.
    #[must_use]
    pub fn unlocked_count(&self, drop: usize, catalog_len: usize) -> usize {
        let extra = if drop >= self.unlock_start_drop {
            ((drop - self.unlock_start_drop) / self.unlock_interval.max(1) + 1) * self.unlock_step
        } else {
            0
        };
        (self.initial_unlocked + extra).min(catalog_len)
    }

    /// Weight of `shape` at `drop`, with the drop clamped into `1..=40`.
    #[must_use]
    pub fn weight(&self, shape: ShapeId, drop: usize) -> usize {
        let bucket = drop.clamp(1, DROP_BUCKETS) - 1;
        self.weights
            .get(shape.index())
            .and_then(|row| row.get(bucket))
            .copied()
            .unwrap_or(0)
    }
}

fn default_weight(cell_count: usize, bucket: usize) -> usize {
    match cell_count {
        1 => 2,
        2 | 3 => 12 - bucket / 5,
        4 => 10 + bucket / 8,
        5 => 4 + bucket / 4,
        6 => 2 + bucket / 5,
        _ => 1 + bucket / 6,
    }
}

fn default_mode(drop: usize) -> GenerationMode {
    use GenerationMode::{Favorable, Random, Standard};
    match drop {
        ..=6 => Favorable,
        7..=15 if drop % 2 == 1 => Favorable,
        7..=15 => Random,
        16..=28 if drop % 3 == 0 => Favorable,
        16..=28 => Random,
        _ if drop % 5 == 0 => Favorable,
        _ => Standard,
    }
}
