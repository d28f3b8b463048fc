//! Meta recommenders: choose which pure recommender serves each batch.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bh_types::{BhResult, Point, RecommenderError, SearchSpaceType};

use super::{RecommendContext, Recommender, RecommenderConfig};

/// Selects the recommender responsible for the next batch.
pub trait MetaRecommender {
    fn select_recommender(&mut self, ctx: &RecommendContext<'_>) -> BhResult<&mut dyn Recommender>;
}

// ---- Two-phase ----

/// Uses `initial` until `switch_after` measurements exist, then `recommender`.
pub struct TwoPhaseMetaRecommender {
    initial: Box<dyn Recommender>,
    recommender: Box<dyn Recommender>,
    switch_after: usize,
}

impl TwoPhaseMetaRecommender {
    pub fn new(
        initial: Box<dyn Recommender>,
        recommender: Box<dyn Recommender>,
        switch_after: usize,
    ) -> Self {
        Self {
            initial,
            recommender,
            switch_after,
        }
    }
}

impl MetaRecommender for TwoPhaseMetaRecommender {
    fn select_recommender(&mut self, ctx: &RecommendContext<'_>) -> BhResult<&mut dyn Recommender> {
        if ctx.measurements.len() >= self.switch_after {
            Ok(self.recommender.as_mut())
        } else {
            Ok(self.initial.as_mut())
        }
    }
}

impl Recommender for TwoPhaseMetaRecommender {
    fn name(&self) -> &'static str {
        "TwoPhaseMetaRecommender"
    }

    fn compatibility(&self) -> SearchSpaceType {
        SearchSpaceType::Hybrid
    }

    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        let selected = self.select_recommender(ctx)?;
        debug!(recommender = selected.name(), "two-phase selection");
        selected.recommend(ctx, batch_size, rng)
    }
}

/// What a sequential meta recommender does once its list is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceMode {
    /// Fail with [`RecommenderError::SequenceExhausted`].
    Raise,
    /// Keep using the last recommender.
    ReuseLast,
    /// Start over from the first recommender.
    Cyclic,
}

/// Tracks when new measurements arrived, which advances a sequence.
#[derive(Debug, Clone, Copy, Default)]
struct SequenceCursor {
    position: usize,
    last_seen: Option<usize>,
}

impl SequenceCursor {
    /// Advance when data arrived since the previous selection; returns the position.
    fn step(&mut self, n_measurements: usize) -> usize {
        if let Some(previous) = self.last_seen {
            if n_measurements > previous {
                self.position += 1;
            }
        }
        self.last_seen = Some(n_measurements);
        self.position
    }
}

// ---- Sequential ----

/// Walks a fixed list of recommenders, moving on each time new data arrives.
pub struct SequentialMetaRecommender {
    recommenders: Vec<Box<dyn Recommender>>,
    mode: SequenceMode,
    cursor: SequenceCursor,
}

impl SequentialMetaRecommender {
    pub fn new(recommenders: Vec<Box<dyn Recommender>>, mode: SequenceMode) -> BhResult<Self> {
        if recommenders.is_empty() {
            return Err(RecommenderError::InvalidConfig {
                message: "sequential meta recommender needs at least one recommender".into(),
            }
            .into());
        }
        Ok(Self {
            recommenders,
            mode,
            cursor: SequenceCursor::default(),
        })
    }
}

impl MetaRecommender for SequentialMetaRecommender {
    fn select_recommender(&mut self, ctx: &RecommendContext<'_>) -> BhResult<&mut dyn Recommender> {
        let position = self.cursor.step(ctx.measurements.len());
        let len = self.recommenders.len();
        let index = match self.mode {
            SequenceMode::Raise if position >= len => {
                return Err(RecommenderError::SequenceExhausted { used: len }.into())
            }
            SequenceMode::Raise => position,
            SequenceMode::ReuseLast => position.min(len - 1),
            SequenceMode::Cyclic => position % len,
        };
        Ok(self.recommenders[index].as_mut())
    }
}

impl Recommender for SequentialMetaRecommender {
    fn name(&self) -> &'static str {
        "SequentialMetaRecommender"
    }

    fn compatibility(&self) -> SearchSpaceType {
        SearchSpaceType::Hybrid
    }

    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        self.select_recommender(ctx)?
            .recommend(ctx, batch_size, rng)
    }
}

// ---- Streaming sequential ----

type RecommenderStream = Box<dyn Iterator<Item = BhResult<Box<dyn Recommender>>> + Send>;

/// Like [`SequentialMetaRecommender`] but pulls recommenders lazily from a
/// possibly unbounded stream.
pub struct StreamingSequentialMetaRecommender {
    stream: RecommenderStream,
    current: Option<Box<dyn Recommender>>,
    cursor: SequenceCursor,
    used: usize,
}

impl StreamingSequentialMetaRecommender {
    pub fn new(stream: RecommenderStream) -> Self {
        Self {
            stream,
            current: None,
            cursor: SequenceCursor::default(),
            used: 0,
        }
    }

    /// Stream built from configurations; every configuration is validated up front.
    pub fn from_configs(configs: Vec<RecommenderConfig>, cycle: bool) -> BhResult<Self> {
        if configs.is_empty() {
            return Err(RecommenderError::InvalidConfig {
                message: "streaming meta recommender needs at least one recommender".into(),
            }
            .into());
        }
        for config in &configs {
            config.build()?;
        }
        let stream: RecommenderStream = if cycle {
            Box::new(configs.into_iter().cycle().map(|c| c.build()))
        } else {
            Box::new(configs.into_iter().map(|c| c.build()))
        };
        Ok(Self::new(stream))
    }
}

impl MetaRecommender for StreamingSequentialMetaRecommender {
    fn select_recommender(&mut self, ctx: &RecommendContext<'_>) -> BhResult<&mut dyn Recommender> {
        let position = self.cursor.step(ctx.measurements.len());
        while self.current.is_none() || self.used <= position {
            match self.stream.next() {
                Some(next) => {
                    self.current = Some(next?);
                    self.used += 1;
                }
                None => {
                    return Err(RecommenderError::SequenceExhausted { used: self.used }.into())
                }
            }
        }
        match self.current.as_mut() {
            Some(recommender) => Ok(recommender.as_mut()),
            None => Err(RecommenderError::SequenceExhausted { used: self.used }.into()),
        }
    }
}

impl Recommender for StreamingSequentialMetaRecommender {
    fn name(&self) -> &'static str {
        "StreamingSequentialMetaRecommender"
    }

    fn compatibility(&self) -> SearchSpaceType {
        SearchSpaceType::Hybrid
    }

    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        self.select_recommender(ctx)?
            .recommend(ctx, batch_size, rng)
    }
}
