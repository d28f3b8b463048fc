use rand::RngCore;

use bh_types::{BhResult, Point, RecommenderError, SearchSpaceType};

use super::{ensure_compatible, RecommendContext, Recommender, RecommenderConfig};

/// Splits a hybrid space into its discrete and continuous parts and lets a
/// dedicated recommender handle each; the two batches are merged pointwise.
pub struct NaiveHybridSpaceRecommender {
    disc_recommender: Box<dyn Recommender>,
    cont_recommender: Box<dyn Recommender>,
}

impl NaiveHybridSpaceRecommender {
    pub fn new(
        disc_recommender: Box<dyn Recommender>,
        cont_recommender: Box<dyn Recommender>,
    ) -> BhResult<Self> {
        if !disc_recommender
            .compatibility()
            .supports(SearchSpaceType::Discrete)
        {
            return Err(RecommenderError::InvalidConfig {
                message: format!(
                    "{} cannot be used for the discrete subspace",
                    disc_recommender.name()
                ),
            }
            .into());
        }
        if !cont_recommender
            .compatibility()
            .supports(SearchSpaceType::Continuous)
        {
            return Err(RecommenderError::InvalidConfig {
                message: format!(
                    "{} cannot be used for the continuous subspace",
                    cont_recommender.name()
                ),
            }
            .into());
        }
        Ok(Self {
            disc_recommender,
            cont_recommender,
        })
    }

    pub fn from_configs(disc: &RecommenderConfig, cont: &RecommenderConfig) -> BhResult<Self> {
        Self::new(disc.build()?, cont.build()?)
    }
}

impl Recommender for NaiveHybridSpaceRecommender {
    fn name(&self) -> &'static str {
        "NaiveHybridSpaceRecommender"
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
        let space_type = ensure_compatible(self.name(), self.compatibility(), ctx.space)?;
        let discrete = ctx.space.discrete_subspace();
        let continuous = ctx.space.continuous_subspace();

        match space_type {
            SearchSpaceType::Discrete => {
                self.disc_recommender
                    .recommend(&ctx.with_space(&discrete), batch_size, rng)
            }
            SearchSpaceType::Continuous => {
                self.cont_recommender
                    .recommend(&ctx.with_space(&continuous), batch_size, rng)
            }
            SearchSpaceType::Hybrid | SearchSpaceType::Either => {
                let disc_points =
                    self.disc_recommender
                        .recommend(&ctx.with_space(&discrete), batch_size, rng)?;
                let cont_points =
                    self.cont_recommender
                        .recommend(&ctx.with_space(&continuous), batch_size, rng)?;
                Ok(disc_points
                    .into_iter()
                    .zip(cont_points)
                    .map(|(mut point, cont)| {
                        point.extend(cont);
                        point
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommenders::{FpsRecommender, RandomRecommender};
    use crate::search::SearchSpace;
    use bh_types::{Measurement, Objective, Target, TargetMode};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn merges_subspace_batches() {
        let space = SearchSpace::new()
            .add_categorical("c", vec!["a", "b", "c"])
            .add_continuous("x", 0.0, 1.0)
            .add_continuous("z", -1.0, 1.0);
        let objective = Objective::new(vec![Target::new("y", TargetMode::Max)]).unwrap();
        let data: Vec<Measurement> = Vec::new();
        let ctx = RecommendContext {
            space: &space,
            objective: &objective,
            measurements: &data,
            allow_repeated: false,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut naive =
            NaiveHybridSpaceRecommender::new(Box::new(FpsRecommender), Box::new(RandomRecommender))
                .unwrap();
        let recs = naive.recommend(&ctx, 3, &mut rng).unwrap();
        assert_eq!(recs.len(), 3);
        for rec in &recs {
            assert_eq!(rec.len(), 3);
            assert!(space.contains(rec).is_ok());
        }
    }

    #[test]
    fn rejects_discrete_only_continuous_part() {
        let result =
            NaiveHybridSpaceRecommender::new(Box::new(RandomRecommender), Box::new(FpsRecommender));
        assert!(result.is_err());
    }
}
