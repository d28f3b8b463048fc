//! Named parameter and target fixtures scenarios are assembled from, plus
//! synthetic measurements.

use rand::Rng;

use bh_optimizer::SearchSpace;
use bh_types::{
    BhResult, MatchShape, Measurement, Objective, ParameterDef, Point, SearchSpaceError, Target,
    TargetMode,
};

/// Parameters used when a scenario does not name its own.
pub const DEFAULT_PARAMETERS: [&str; 3] = ["Categorical_1", "Categorical_2", "Num_disc_1"];

pub const DEFAULT_TARGETS: [&str; 1] = ["Target_max"];

/// Range fake values are drawn from for unbounded targets.
pub const UNBOUNDED_RANGE: (f64, f64) = (0.0, 100.0);

/// Every parameter fixture by name.
pub fn parameter(name: &str) -> Option<ParameterDef> {
    Some(match name {
        "Categorical_1" => ParameterDef::categorical(name, vec!["A", "B", "C"]),
        "Categorical_2" => ParameterDef::categorical(name, vec!["bad", "OK", "good"]),
        "Num_disc_1" => ParameterDef::numerical_discrete(name, vec![1.0, 2.0, 7.0]),
        "SomeSetting" => ParameterDef::categorical(name, vec!["slow", "normal", "fast"]),
        "Conti_finite1" => ParameterDef::numerical_continuous(name, 0.0, 1.0),
        "Conti_finite2" => ParameterDef::numerical_continuous(name, -1.0, 0.0),
        _ => return None,
    })
}

/// Every target fixture by name.
pub fn target(name: &str) -> Option<Target> {
    Some(match name {
        "Target_max" => Target::new(name, TargetMode::Max),
        "Target_min" => Target::new(name, TargetMode::Min),
        "Target_match_bell" => {
            Target::new(name, TargetMode::Match(MatchShape::Bell)).with_bounds(0.0, 100.0)
        }
        "Target_match_triangular" => {
            Target::new(name, TargetMode::Match(MatchShape::Triangular)).with_bounds(0.0, 100.0)
        }
        "Target_max_bounded" => Target::new(name, TargetMode::Max).with_bounds(0.0, 100.0),
        "Target_min_bounded" => Target::new(name, TargetMode::Min).with_bounds(0.0, 100.0),
        _ => return None,
    })
}

pub fn search_space<S: AsRef<str>>(names: &[S]) -> BhResult<SearchSpace> {
    let parameters = names
        .iter()
        .map(|n| {
            parameter(n.as_ref()).ok_or_else(|| SearchSpaceError::UnknownParameter {
                name: n.as_ref().to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SearchSpace::from_parameters(parameters)?)
}

pub fn objective<S: AsRef<str>>(names: &[S]) -> BhResult<Objective> {
    let targets = names
        .iter()
        .map(|n| {
            target(n.as_ref())
                .ok_or_else(|| bh_types::config_error!("unknown target fixture {}", n.as_ref()))
        })
        .collect::<BhResult<Vec<_>>>()?;
    Objective::new(targets)
}

/// One measurement per point with a uniform random value for each target,
/// drawn within the target's bounds when it has them.
pub fn fake_measurements<R: Rng + ?Sized>(
    points: Vec<Point>,
    objective: &Objective,
    batch: usize,
    rng: &mut R,
) -> Vec<Measurement> {
    points
        .into_iter()
        .map(|point| {
            objective
                .targets()
                .iter()
                .fold(Measurement::new(point).with_batch(batch), |m, target| {
                    let (low, high) = target.bounds.unwrap_or(UNBOUNDED_RANGE);
                    m.with_value(target.name.clone(), rng.gen_range(low..=high))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bh_types::SearchSpaceType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn default_space_is_discrete() {
        let space = search_space(&DEFAULT_PARAMETERS).unwrap();
        assert_eq!(space.space_type().unwrap(), SearchSpaceType::Discrete);
        assert_eq!(space.discrete_candidates().len(), 27);
    }

    #[test]
    fn hybrid_fixture_space() {
        let space = search_space(&[
            "Categorical_1",
            "SomeSetting",
            "Num_disc_1",
            "Conti_finite1",
            "Conti_finite2",
        ])
        .unwrap();
        assert_eq!(space.space_type().unwrap(), SearchSpaceType::Hybrid);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(search_space(&["Nope"]).is_err());
        assert!(objective(&["Nope"]).is_err());
        assert!(search_space::<&str>(&[]).is_err());
    }

    #[test]
    fn fake_values_respect_bounds() {
        let space = search_space(&DEFAULT_PARAMETERS).unwrap();
        let objective = objective(&["Target_max_bounded", "Target_min_bounded"]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let points = space.discrete_candidates();
        let data = fake_measurements(points.clone(), &objective, 1, &mut rng);
        assert_eq!(data.len(), points.len());
        for m in &data {
            assert_eq!(m.values.len(), 2);
            assert!(m.values.values().all(|v| (0.0..=100.0).contains(v)));
            assert!(objective.score(&m.values).is_ok());
        }
    }
}
