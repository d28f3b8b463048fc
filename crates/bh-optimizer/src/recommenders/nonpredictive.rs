//! Recommenders that do not consult a surrogate model.

use rand::seq::SliceRandom;
use rand::RngCore;

use bh_types::{BhResult, Point, RecommenderError, SearchSpaceType};

use super::{
    available_candidates, ensure_compatible, farthest_point_indices, squared_distance,
    RecommendContext, Recommender,
};

fn check_pool(pool: &[Point], batch_size: usize) -> BhResult<()> {
    if pool.len() < batch_size {
        return Err(RecommenderError::ExhaustedCandidates {
            requested: batch_size,
            available: pool.len(),
        }
        .into());
    }
    Ok(())
}

fn encode_all(ctx: &RecommendContext<'_>, points: &[Point]) -> BhResult<Vec<Vec<f64>>> {
    points
        .iter()
        .map(|p| ctx.space.encode(p).map_err(Into::into))
        .collect()
}

// ---- Random ----

/// Uniform random sampling over discrete candidates and continuous bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRecommender;

impl Recommender for RandomRecommender {
    fn name(&self) -> &'static str {
        "RandomRecommender"
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
        let continuous = ctx.space.continuous_subspace();

        let discrete_part: Vec<Point> = if space_type == SearchSpaceType::Continuous {
            vec![Point::new(); batch_size]
        } else {
            let pool = available_candidates(ctx)?;
            if space_type == SearchSpaceType::Discrete {
                check_pool(&pool, batch_size)?;
                pool.choose_multiple(rng, batch_size).cloned().collect()
            } else {
                // Hybrid: discrete configurations may repeat with different continuous parts.
                (0..batch_size)
                    .map(|_| pool.choose(rng).cloned().unwrap_or_default())
                    .collect()
            }
        };

        Ok(discrete_part
            .into_iter()
            .map(|mut point| {
                point.extend(continuous.sample_continuous(rng));
                point
            })
            .collect())
    }
}

// ---- Farthest point sampling ----

/// Picks discrete candidates that are maximally spread out, starting from the
/// already measured points.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpsRecommender;

impl Recommender for FpsRecommender {
    fn name(&self) -> &'static str {
        "FPSRecommender"
    }

    fn compatibility(&self) -> SearchSpaceType {
        SearchSpaceType::Discrete
    }

    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        _rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        ensure_compatible(self.name(), self.compatibility(), ctx.space)?;
        let pool = available_candidates(ctx)?;
        check_pool(&pool, batch_size)?;

        let encoded = encode_all(ctx, &pool)?;
        let anchors = ctx
            .measurements
            .iter()
            .map(|m| ctx.space.encode(&m.point))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(farthest_point_indices(&encoded, batch_size, &anchors)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect())
    }
}

// ---- k-means clustering ----

/// Clusters the discrete candidates into `batch_size` groups and recommends
/// the candidate closest to each centroid.
#[derive(Debug, Clone, Copy)]
pub struct KMeansClusteringRecommender {
    max_iterations: usize,
}

impl KMeansClusteringRecommender {
    pub fn new(max_iterations: usize) -> BhResult<Self> {
        if max_iterations == 0 {
            return Err(RecommenderError::InvalidConfig {
                message: "k-means needs at least one iteration".into(),
            }
            .into());
        }
        Ok(Self { max_iterations })
    }
}

impl Recommender for KMeansClusteringRecommender {
    fn name(&self) -> &'static str {
        "KMeansClusteringRecommender"
    }

    fn compatibility(&self) -> SearchSpaceType {
        SearchSpaceType::Discrete
    }

    fn recommend(
        &mut self,
        ctx: &RecommendContext<'_>,
        batch_size: usize,
        _rng: &mut dyn RngCore,
    ) -> BhResult<Vec<Point>> {
        ensure_compatible(self.name(), self.compatibility(), ctx.space)?;
        let pool = available_candidates(ctx)?;
        check_pool(&pool, batch_size)?;
        let encoded = encode_all(ctx, &pool)?;

        let mut centroids: Vec<Vec<f64>> = farthest_point_indices(&encoded, batch_size, &[])
            .into_iter()
            .map(|i| encoded[i].clone())
            .collect();
        let mut assignment = vec![usize::MAX; encoded.len()];

        for _ in 0..self.max_iterations {
            let mut changed = false;
            for (i, point) in encoded.iter().enumerate() {
                let nearest = nearest_index(&centroids, point, &[]);
                if assignment[i] != nearest {
                    assignment[i] = nearest;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            for (c, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&Vec<f64>> = encoded
                    .iter()
                    .zip(&assignment)
                    .filter(|(_, a)| **a == c)
                    .map(|(p, _)| p)
                    .collect();
                if members.is_empty() {
                    continue;
                }
                for (d, value) in centroid.iter_mut().enumerate() {
                    *value = members.iter().map(|m| m[d]).sum::<f64>() / members.len() as f64;
                }
            }
        }

        let mut chosen = Vec::with_capacity(batch_size);
        for centroid in &centroids {
            let idx = nearest_index(&encoded, centroid, &chosen);
            chosen.push(idx);
        }
        Ok(chosen.into_iter().map(|i| pool[i].clone()).collect())
    }
}

/// Index of the point in `points` closest to `target`, skipping `exclude`.
fn nearest_index(points: &[Vec<f64>], target: &[f64], exclude: &[usize]) -> usize {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| !exclude.contains(i))
        .min_by(|a, b| squared_distance(a.1, target).total_cmp(&squared_distance(b.1, target)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchSpace;
    use bh_types::{Measurement, Objective, Target, TargetMode};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn objective() -> Objective {
        Objective::new(vec![Target::new("y", TargetMode::Max)]).unwrap()
    }

    fn discrete_space() -> SearchSpace {
        SearchSpace::new()
            .add_discrete("a", vec![1.0, 2.0, 3.0, 4.0])
            .add_categorical("b", vec!["x", "y", "z"])
    }

    fn ctx<'a>(
        space: &'a SearchSpace,
        objective: &'a Objective,
        data: &'a [Measurement],
    ) -> RecommendContext<'a> {
        RecommendContext {
            space,
            objective,
            measurements: data,
            allow_repeated: false,
        }
    }

    #[test]
    fn random_returns_distinct_discrete_points() {
        let space = discrete_space();
        let objective = objective();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let recs = RandomRecommender
            .recommend(&ctx(&space, &objective, &[]), 5, &mut rng)
            .unwrap();
        assert_eq!(recs.len(), 5);
        let unique: HashSet<String> = recs.iter().map(|p| format!("{p:?}")).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn random_samples_hybrid_space() {
        let space = discrete_space().add_continuous("c", 0.0, 1.0);
        let objective = objective();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let recs = RandomRecommender
            .recommend(&ctx(&space, &objective, &[]), 20, &mut rng)
            .unwrap();
        assert_eq!(recs.len(), 20);
        for rec in &recs {
            assert!(space.contains(rec).is_ok());
        }
    }

    #[test]
    fn fps_skips_measured_and_rejects_continuous() {
        let space = discrete_space();
        let objective = objective();
        let first = space.discrete_candidates()[0].clone();
        let data = vec![Measurement::new(first.clone()).with_value("y", 1.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let recs = FpsRecommender
            .recommend(&ctx(&space, &objective, &data), 4, &mut rng)
            .unwrap();
        assert_eq!(recs.len(), 4);
        assert!(!recs.contains(&first));

        let continuous = SearchSpace::new().add_continuous("c", 0.0, 1.0);
        let err = FpsRecommender
            .recommend(&ctx(&continuous, &objective, &[]), 1, &mut rng)
            .unwrap_err();
        assert!(err.to_string().contains("does not support"));
    }

    #[test]
    fn kmeans_returns_distinct_points() {
        let space = discrete_space();
        let objective = objective();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut km = KMeansClusteringRecommender::new(20).unwrap();
        let recs = km.recommend(&ctx(&space, &objective, &[]), 3, &mut rng).unwrap();
        assert_eq!(recs.len(), 3);
        let unique: HashSet<String> = recs.iter().map(|p| format!("{p:?}")).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn exhausted_pool_is_an_error() {
        let space = SearchSpace::new().add_discrete("a", vec![1.0, 2.0]);
        let objective = objective();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let err = FpsRecommender
            .recommend(&ctx(&space, &objective, &[]), 3, &mut rng)
            .unwrap_err();
        assert!(err.to_string().contains("only 2 remain"));
    }
}
