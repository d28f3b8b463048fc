//! Search space definitions, candidate enumeration and encoding.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use bh_types::{
    ParameterDef, ParameterKind, ParameterValue, Point, SearchSpaceError, SearchSpaceType,
};

/// The full search space: an ordered list of parameter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub parameters: Vec<ParameterDef>,
}

/// Lower and upper bounds of the numerical parameters, one column per parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub names: Vec<String>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ParameterBounds {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bounds as a 2 x n matrix: row 0 holds lower, row 1 upper bounds.
    pub fn to_rows(&self) -> [Vec<f64>; 2] {
        [self.lower.clone(), self.upper.clone()]
    }
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    /// Build and validate a search space in one step.
    pub fn from_parameters(parameters: Vec<ParameterDef>) -> Result<Self, SearchSpaceError> {
        let space = Self { parameters };
        space.validate()?;
        Ok(space)
    }

    pub fn add_discrete(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.parameters
            .push(ParameterDef::numerical_discrete(name, values));
        self
    }

    pub fn add_categorical<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        values: Vec<S>,
    ) -> Self {
        self.parameters.push(ParameterDef::categorical(name, values));
        self
    }

    pub fn add_continuous(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters
            .push(ParameterDef::numerical_continuous(name, low, high));
        self
    }

    pub fn add_parameter(mut self, parameter: ParameterDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Purely continuous space from explicit (name, low, high) bounds.
    pub fn continuous_from_bounds(bounds: &[(&str, f64, f64)]) -> Result<Self, SearchSpaceError> {
        Self::from_parameters(
            bounds
                .iter()
                .map(|(name, low, high)| ParameterDef::numerical_continuous(*name, *low, *high))
                .collect(),
        )
    }

    /// Smallest hyperrectangle containing all `points` (rows ordered like `names`).
    pub fn continuous_from_points(
        names: &[&str],
        points: &[Vec<f64>],
    ) -> Result<Self, SearchSpaceError> {
        let mut parameters = Vec::with_capacity(names.len());
        for (column, name) in names.iter().enumerate() {
            let mut low = f64::INFINITY;
            let mut high = f64::NEG_INFINITY;
            for row in points {
                let value = *row.get(column).ok_or_else(|| SearchSpaceError::InvalidParameter {
                    name: name.to_string(),
                    message: "point is missing this coordinate".into(),
                })?;
                low = low.min(value);
                high = high.max(value);
            }
            parameters.push(ParameterDef::numerical_continuous(*name, low, high));
        }
        Self::from_parameters(parameters)
    }

    /// Reject empty spaces, invalid parameters and duplicate names.
    pub fn validate(&self) -> Result<(), SearchSpaceError> {
        if self.parameters.is_empty() {
            return Err(SearchSpaceError::Empty);
        }
        let mut seen = HashSet::new();
        for param in &self.parameters {
            param.validate()?;
            if !seen.insert(param.name.as_str()) {
                return Err(SearchSpaceError::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn space_type(&self) -> Result<SearchSpaceType, SearchSpaceError> {
        let n_discrete = self.parameters.iter().filter(|p| p.is_discrete()).count();
        let n_continuous = self.parameters.len() - n_discrete;
        SearchSpaceType::classify(n_discrete, n_continuous).ok_or(SearchSpaceError::Empty)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The discrete part of the space (may be empty).
    pub fn discrete_subspace(&self) -> SearchSpace {
        Self {
            parameters: self
                .parameters
                .iter()
                .filter(|p| p.is_discrete())
                .cloned()
                .collect(),
        }
    }

    /// The continuous part of the space (may be empty).
    pub fn continuous_subspace(&self) -> SearchSpace {
        Self {
            parameters: self
                .parameters
                .iter()
                .filter(|p| !p.is_discrete())
                .cloned()
                .collect(),
        }
    }

    /// Bounds of the numerical parameters: discrete parameters first, then
    /// continuous, each group in declaration order.
    pub fn numerical_bounds(&self) -> ParameterBounds {
        let mut bounds = ParameterBounds {
            names: Vec::new(),
            lower: Vec::new(),
            upper: Vec::new(),
        };
        let discrete = self.parameters.iter().filter(|p| p.is_discrete());
        let continuous = self.parameters.iter().filter(|p| !p.is_discrete());
        for param in discrete.chain(continuous) {
            if let Some((low, high)) = param.bounds() {
                bounds.names.push(param.name.clone());
                bounds.lower.push(low);
                bounds.upper.push(high);
            }
        }
        bounds
    }

    /// Number of discrete candidates (returns `None` if any parameter is continuous).
    pub fn grid_size(&self) -> Option<usize> {
        let mut total: usize = 1;
        for param in &self.parameters {
            let dim_size = match &param.kind {
                ParameterKind::NumericalDiscrete { values } => values.len(),
                ParameterKind::Categorical { values } => values.len(),
                ParameterKind::NumericalContinuous { .. } => return None,
            };
            total = total.checked_mul(dim_size)?;
        }
        Some(total)
    }

    /// Cartesian product of all discrete parameters, in declaration order.
    ///
    /// Continuous parameters are ignored; an empty discrete part yields a single
    /// empty point.
    pub fn discrete_candidates(&self) -> Vec<Point> {
        let mut result: Vec<Point> = vec![Point::new()];
        for param in self.parameters.iter().filter(|p| p.is_discrete()) {
            let values = param.discrete_values();
            let mut next = Vec::with_capacity(result.len() * values.len());
            for existing in &result {
                for value in &values {
                    let mut combo = existing.clone();
                    combo.insert(param.name.clone(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }
        result
    }

    /// Uniform sample of every continuous parameter.
    pub fn sample_continuous<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let mut point = Point::new();
        for param in &self.parameters {
            if let ParameterKind::NumericalContinuous { low, high } = &param.kind {
                let value = if high > low {
                    rng.gen_range(*low..=*high)
                } else {
                    *low
                };
                point.insert(param.name.clone(), ParameterValue::Float(value));
            }
        }
        point
    }

    /// Fail unless `point` assigns an in-domain value to every parameter.
    pub fn contains(&self, point: &Point) -> Result<(), SearchSpaceError> {
        for param in &self.parameters {
            let value = point
                .get(&param.name)
                .ok_or_else(|| SearchSpaceError::PointOutsideSpace {
                    message: format!("missing parameter {}", param.name),
                })?;
            if !param.contains(value) {
                return Err(SearchSpaceError::PointOutsideSpace {
                    message: format!("{}={} is not in the parameter domain", param.name, value),
                });
            }
        }
        Ok(())
    }

    /// Restrict `point` to this space's parameters.
    pub fn project(&self, point: &Point) -> Point {
        self.parameters
            .iter()
            .filter_map(|p| point.get(&p.name).map(|v| (p.name.clone(), v.clone())))
            .collect()
    }

    /// Width of the encoded representation produced by [`SearchSpace::encode`].
    pub fn encoded_dim(&self) -> usize {
        self.parameters
            .iter()
            .map(|p| match &p.kind {
                ParameterKind::Categorical { values } => values.len(),
                _ => 1,
            })
            .sum()
    }

    /// Encode a point as features in [0, 1]: numerical values are min-max
    /// scaled by their bounds, categorical values are one-hot.
    pub fn encode(&self, point: &Point) -> Result<Vec<f64>, SearchSpaceError> {
        let mut features = Vec::with_capacity(self.encoded_dim());
        for param in &self.parameters {
            let value = point
                .get(&param.name)
                .ok_or_else(|| SearchSpaceError::UnknownParameter {
                    name: param.name.clone(),
                })?;
            match (&param.kind, value) {
                (ParameterKind::Categorical { values }, ParameterValue::Categorical(label)) => {
                    let idx = values.iter().position(|v| v == label).ok_or_else(|| {
                        SearchSpaceError::PointOutsideSpace {
                            message: format!("{}={} is not a known category", param.name, label),
                        }
                    })?;
                    features.extend((0..values.len()).map(|i| if i == idx { 1.0 } else { 0.0 }));
                }
                (_, ParameterValue::Float(v)) if param.is_numerical() => {
                    let (low, high) = param.bounds().unwrap_or((0.0, 1.0));
                    let scaled = if high > low { (v - low) / (high - low) } else { 0.5 };
                    features.push(scaled);
                }
                _ => {
                    return Err(SearchSpaceError::PointOutsideSpace {
                        message: format!("{} has a value of the wrong kind", param.name),
                    })
                }
            }
        }
        Ok(features)
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_parameters_are_rejected() {
        assert_eq!(SearchSpace::from_parameters(vec![]), Err(SearchSpaceError::Empty));
        assert_eq!(SearchSpace::new().space_type(), Err(SearchSpaceError::Empty));
    }

    #[test]
    fn bounds_are_ordered_discrete_first() {
        let space = SearchSpace::from_parameters(vec![
            ParameterDef::numerical_discrete("A_disc", vec![1.0, 2.0, 3.0]),
            ParameterDef::numerical_continuous("A_cont", 4.0, 6.0),
            ParameterDef::numerical_discrete("B_disc", vec![7.0, 8.0, 9.0]),
            ParameterDef::numerical_continuous("B_cont", 10.0, 12.0),
        ])
        .unwrap();
        let bounds = space.numerical_bounds();
        assert_eq!(bounds.names, vec!["A_disc", "B_disc", "A_cont", "B_cont"]);
        assert_eq!(
            bounds.to_rows(),
            [vec![1.0, 7.0, 4.0, 10.0], vec![3.0, 9.0, 6.0, 12.0]]
        );
    }

    #[test]
    fn empty_subspaces_have_empty_bounds() {
        let discrete = SearchSpace::new().add_discrete("x", vec![1.0, 2.0]);
        let continuous = discrete.continuous_subspace();
        assert!(continuous.numerical_bounds().is_empty());
        assert!(SearchSpace::new().discrete_subspace().numerical_bounds().is_empty());
    }

    #[test]
    fn discrete_space_from_mixed_parameters() {
        let space = SearchSpace::new()
            .add_discrete("num_specified", vec![1.0, 2.0, 3.0])
            .add_categorical("cat_specified", vec!["a", "b", "c"]);
        assert_eq!(space.space_type(), Ok(SearchSpaceType::Discrete));
        assert_eq!(space.grid_size(), Some(9));
        assert_eq!(space.discrete_candidates().len(), 9);
    }

    #[test]
    fn continuous_space_from_bounds() {
        let space =
            SearchSpace::continuous_from_bounds(&[("param1", 0.0, 1.0), ("param2", -1.0, 1.0)])
                .unwrap();
        assert_eq!(space.space_type(), Ok(SearchSpaceType::Continuous));
        assert_eq!(
            space.parameters,
            vec![
                ParameterDef::numerical_continuous("param1", 0.0, 1.0),
                ParameterDef::numerical_continuous("param2", -1.0, 1.0),
            ]
        );
    }

    #[test]
    fn hyperrectangle_spans_points() {
        let points = vec![vec![0.0, -1.0], vec![1.0, 0.0], vec![2.0, 1.0]];
        let space = SearchSpace::continuous_from_points(&["param1", "param2"], &points).unwrap();
        assert_eq!(space.space_type(), Ok(SearchSpaceType::Continuous));
        assert_eq!(
            space.parameters,
            vec![
                ParameterDef::numerical_continuous("param1", 0.0, 2.0),
                ParameterDef::numerical_continuous("param2", -1.0, 1.0),
            ]
        );
    }

    #[test]
    fn hybrid_space_type_and_subspaces() {
        let space = SearchSpace::new()
            .add_categorical("c", vec!["a", "b"])
            .add_continuous("x", 0.0, 1.0);
        assert_eq!(space.space_type(), Ok(SearchSpaceType::Hybrid));
        assert_eq!(space.discrete_subspace().parameters.len(), 1);
        assert_eq!(space.continuous_subspace().parameters.len(), 1);
        assert_eq!(space.grid_size(), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let space = SearchSpace::new()
            .add_discrete("x", vec![1.0])
            .add_continuous("x", 0.0, 1.0);
        assert!(matches!(
            space.validate(),
            Err(SearchSpaceError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn samples_stay_in_bounds_and_encode_to_unit_cube() {
        let space = SearchSpace::new()
            .add_categorical("c", vec!["a", "b", "c"])
            .add_discrete("n", vec![10.0, 20.0])
            .add_continuous("x", -5.0, 5.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let candidates = space.discrete_candidates();
        assert_eq!(candidates.len(), 6);

        for candidate in &candidates {
            let mut point = candidate.clone();
            point.extend(space.sample_continuous(&mut rng));
            assert!(space.contains(&point).is_ok());
            let encoded = space.encode(&point).unwrap();
            assert_eq!(encoded.len(), space.encoded_dim());
            assert!(encoded.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn contains_rejects_foreign_points() {
        let space = SearchSpace::new().add_discrete("n", vec![1.0, 2.0]);
        let mut point = Point::new();
        point.insert("n".into(), ParameterValue::Float(3.0));
        assert!(space.contains(&point).is_err());
        assert!(space.contains(&Point::new()).is_err());
    }
}
