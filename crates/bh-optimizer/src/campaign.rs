//! Campaigns: the ask/observe loop around a search space, objective and recommender.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use bh_types::{BhResult, Measurement, Objective, Point, RecommenderError};

use crate::recommenders::{RecommendContext, Recommender, RecommenderConfig};
use crate::search::SearchSpace;

/// Unique campaign identifier.
pub type CampaignId = Uuid;

/// One optimization campaign.
///
/// Owns its recommender instance and RNG; two campaigns built with the same
/// inputs and seed produce the same recommendations.
pub struct Campaign {
    id: CampaignId,
    created_at: DateTime<Utc>,
    search_space: SearchSpace,
    objective: Objective,
    recommender_config: RecommenderConfig,
    recommender: Box<dyn Recommender>,
    measurements: Vec<Measurement>,
    n_batches_done: usize,
    allow_repeated: bool,
    rng: ChaCha8Rng,
}

impl Campaign {
    pub fn new(
        search_space: SearchSpace,
        objective: Objective,
        recommender_config: RecommenderConfig,
        seed: u64,
    ) -> BhResult<Self> {
        let space_type = search_space.space_type()?;
        if !recommender_config.supports(space_type) {
            return Err(RecommenderError::IncompatibleSearchSpace {
                recommender: recommender_config.label(),
                space: space_type,
            }
            .into());
        }
        let recommender = recommender_config.build()?;
        let id = Uuid::new_v4();
        debug!(
            campaign = %id,
            recommender = %recommender_config.label(),
            space = %space_type,
            "campaign created"
        );

        Ok(Self {
            id,
            created_at: Utc::now(),
            search_space,
            objective,
            recommender_config,
            recommender,
            measurements: Vec::new(),
            n_batches_done: 0,
            allow_repeated: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Allow already measured discrete candidates to be recommended again.
    pub fn with_allow_repeated(mut self, allow: bool) -> Self {
        self.allow_repeated = allow;
        self
    }

    pub fn id(&self) -> CampaignId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn recommender_config(&self) -> &RecommenderConfig {
        &self.recommender_config
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn n_batches_done(&self) -> usize {
        self.n_batches_done
    }

    /// Ask for the next `batch_size` points to evaluate.
    pub fn recommend(&mut self, batch_size: usize) -> BhResult<Vec<Point>> {
        if batch_size == 0 {
            return Err(RecommenderError::ZeroBatchSize.into());
        }
        let ctx = RecommendContext {
            space: &self.search_space,
            objective: &self.objective,
            measurements: &self.measurements,
            allow_repeated: self.allow_repeated,
        };
        let points = self.recommender.recommend(&ctx, batch_size, &mut self.rng)?;
        for point in &points {
            self.search_space.contains(point)?;
        }

        self.n_batches_done += 1;
        info!(
            campaign = %self.id,
            batch = self.n_batches_done,
            batch_size,
            recommender = self.recommender.name(),
            "recommended batch"
        );
        Ok(points)
    }

    /// Record observed outcomes. Nothing is added unless every measurement
    /// lies in the search space and has a finite value for each target.
    pub fn add_measurements(&mut self, measurements: Vec<Measurement>) -> BhResult<()> {
        for measurement in &measurements {
            self.search_space.contains(&measurement.point)?;
            self.objective.score(&measurement.values)?;
        }
        debug!(
            campaign = %self.id,
            added = measurements.len(),
            total = self.measurements.len() + measurements.len(),
            "measurements added"
        );
        self.measurements.extend(measurements);
        Ok(())
    }

    /// Best objective score observed so far.
    pub fn best_score(&self) -> Option<f64> {
        self.measurements
            .iter()
            .filter_map(|m| self.objective.score(&m.values).ok())
            .fold(None, |best, s| Some(best.map_or(s, |b: f64| b.max(s))))
    }
}

impl std::fmt::Debug for Campaign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Campaign")
            .field("id", &self.id)
            .field("recommender", &self.recommender_config.label())
            .field("measurements", &self.measurements.len())
            .field("n_batches_done", &self.n_batches_done)
            .finish()
    }
}
