use serde::{Deserialize, Serialize};

/// Kind of parameter domain.
///
/// Used both for the type of a concrete search space (only `Discrete`,
/// `Continuous` and `Hybrid` occur there) and for the compatibility a
/// recommender declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchSpaceType {
    Discrete,
    Continuous,
    Hybrid,
    /// Either purely discrete or purely continuous, but not mixed.
    Either,
}

impl SearchSpaceType {
    /// Whether a variant declaring `self` can operate on a space of type `space`.
    pub fn supports(self, space: SearchSpaceType) -> bool {
        match (self, space) {
            (Self::Discrete, Self::Discrete) => true,
            (Self::Continuous, Self::Continuous) => true,
            (Self::Either, Self::Discrete | Self::Continuous) => true,
            (Self::Hybrid, Self::Discrete | Self::Continuous | Self::Hybrid) => true,
            // `Either` is never the type of a concrete space.
            (_, Self::Either) => false,
            (Self::Discrete, Self::Continuous | Self::Hybrid) => false,
            (Self::Continuous, Self::Discrete | Self::Hybrid) => false,
            (Self::Either, Self::Hybrid) => false,
        }
    }

    /// Classify a space from the number of discrete and continuous parameters.
    pub fn classify(n_discrete: usize, n_continuous: usize) -> Option<Self> {
        match (n_discrete, n_continuous) {
            (0, 0) => None,
            (_, 0) => Some(Self::Discrete),
            (0, _) => Some(Self::Continuous),
            _ => Some(Self::Hybrid),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discrete => "discrete",
            Self::Continuous => "continuous",
            Self::Hybrid => "hybrid",
            Self::Either => "either",
        }
    }
}

impl std::fmt::Display for SearchSpaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_matrix() {
        use SearchSpaceType::*;

        assert!(Discrete.supports(Discrete));
        assert!(!Discrete.supports(Continuous));
        assert!(!Discrete.supports(Hybrid));

        assert!(Continuous.supports(Continuous));
        assert!(!Continuous.supports(Discrete));

        assert!(Either.supports(Discrete));
        assert!(Either.supports(Continuous));
        assert!(!Either.supports(Hybrid));

        assert!(Hybrid.supports(Discrete));
        assert!(Hybrid.supports(Continuous));
        assert!(Hybrid.supports(Hybrid));

        for kind in [Discrete, Continuous, Hybrid, Either] {
            assert!(!kind.supports(Either));
        }
    }

    #[test]
    fn classify_by_parameter_counts() {
        assert_eq!(SearchSpaceType::classify(0, 0), None);
        assert_eq!(SearchSpaceType::classify(3, 0), Some(SearchSpaceType::Discrete));
        assert_eq!(SearchSpaceType::classify(0, 2), Some(SearchSpaceType::Continuous));
        assert_eq!(SearchSpaceType::classify(1, 1), Some(SearchSpaceType::Hybrid));
    }
}
