//! Enumerates registered variants of a capability category.
//!
//! Predicates see only the descriptor metadata and are applied before any
//! factory runs, so an excluded variant is never instantiated.

use tracing::{debug, error};

use bh_optimizer::registry::{
    registry, Category, Family, Registry, VariantConfig, VariantDescriptor,
};
use bh_optimizer::{AcquisitionFunction, RecommenderConfig, SurrogateConfig};
use bh_types::{BhError, SearchSpaceType};

use crate::errors::CatalogError;

/// Filter over variant descriptors.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    ExcludeName(String),
    /// Keep variants whose `is_mc` flag equals the value.
    Mc(bool),
    /// Keep variants whose declared compatibility supports the space type.
    CompatibleWith(SearchSpaceType),
    /// Keep variants whose declared compatibility is exactly this type.
    CompatibilityIs(SearchSpaceType),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn exclude(name: impl Into<String>) -> Self {
        Self::ExcludeName(name.into())
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::And(mut all) => {
                all.push(other);
                Self::And(all)
            }
            first => Self::And(vec![first, other]),
        }
    }

    pub fn matches<C>(&self, descriptor: &VariantDescriptor<C>) -> bool {
        match self {
            Self::All => true,
            Self::ExcludeName(name) => descriptor.name != name.as_str(),
            Self::Mc(is_mc) => descriptor.is_mc == *is_mc,
            Self::CompatibleWith(space) => descriptor
                .compatibility
                .map_or(false, |c| c.supports(*space)),
            Self::CompatibilityIs(kind) => descriptor.compatibility == Some(*kind),
            Self::And(all) => all.iter().all(|p| p.matches(descriptor)),
        }
    }
}

/// An instantiated, validated variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry<C> {
    pub name: &'static str,
    pub abbreviation: &'static str,
    pub family: Family,
    pub compatibility: Option<SearchSpaceType>,
    pub is_mc: bool,
    pub config: C,
}

/// Snapshot of a registry that scenario generators enumerate.
#[derive(Debug, Clone)]
pub struct Catalog {
    registry: Registry,
}

impl Catalog {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Snapshot of the process-wide registry.
    pub fn global() -> Self {
        Self::new(registry().read().clone())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Every variant of `category` matching `predicate`, in registration order.
    ///
    /// Fails on the first variant whose factory or validation fails.
    pub fn variants<C: VariantConfig>(
        &self,
        category: Category,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<C>>, CatalogError> {
        let entries = C::descriptors(&self.registry)
            .iter()
            .filter(|d| category.includes(d.family) && predicate.matches(d))
            .map(|d| instantiate(category, d))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(%category, count = entries.len(), "catalog enumerated");
        Ok(entries)
    }

    pub fn surrogates(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<SurrogateConfig>>, CatalogError> {
        self.variants(Category::Surrogate, predicate)
    }

    pub fn pure_recommenders(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<RecommenderConfig>>, CatalogError> {
        self.variants(Category::PureRecommender, predicate)
    }

    pub fn non_predictive_recommenders(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<RecommenderConfig>>, CatalogError> {
        self.variants(Category::NonPredictiveRecommender, predicate)
    }

    pub fn bayesian_recommenders(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<RecommenderConfig>>, CatalogError> {
        self.variants(Category::BayesianRecommender, predicate)
    }

    pub fn meta_recommenders(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<RecommenderConfig>>, CatalogError> {
        self.variants(Category::MetaRecommender, predicate)
    }

    pub fn acquisition_functions(
        &self,
        predicate: &Predicate,
    ) -> Result<Vec<CatalogEntry<AcquisitionFunction>>, CatalogError> {
        self.variants(Category::AcquisitionFunction, predicate)
    }
}

fn instantiate<C: VariantConfig>(
    category: Category,
    descriptor: &VariantDescriptor<C>,
) -> Result<CatalogEntry<C>, CatalogError> {
    let fail = |source: BhError| {
        error!(
            %category,
            variant = descriptor.name,
            error = %source,
            "variant instantiation failed"
        );
        CatalogError::Instantiation {
            category,
            variant: descriptor.name.to_string(),
            source,
        }
    };
    let config = (descriptor.factory)().map_err(fail)?;
    config.check().map_err(fail)?;
    Ok(CatalogEntry {
        name: descriptor.name,
        abbreviation: descriptor.abbreviation,
        family: descriptor.family,
        compatibility: descriptor.compatibility,
        is_mc: descriptor.is_mc,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bh_types::{validation_error, BhResult};

    fn names<C>(entries: &[CatalogEntry<C>]) -> Vec<&'static str> {
        entries.iter().map(|e| e.name).collect()
    }

    fn failing_factory() -> BhResult<SurrogateConfig> {
        Err(validation_error!("model path is required"))
    }

    fn with_failing_surrogate() -> Catalog {
        let mut registry = Registry::builtin();
        registry
            .register_surrogate(VariantDescriptor {
                name: "ModelFileSurrogate",
                abbreviation: "MF",
                family: Family::Surrogate,
                compatibility: None,
                is_mc: false,
                factory: failing_factory,
            })
            .unwrap();
        Catalog::new(registry)
    }

    #[test]
    fn enumeration_is_idempotent_and_ordered() {
        let catalog = Catalog::new(Registry::builtin());
        let first = catalog.pure_recommenders(&Predicate::All).unwrap();
        let second = catalog.pure_recommenders(&Predicate::All).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            names(&first),
            vec![
                "RandomRecommender",
                "FPSRecommender",
                "KMeansClusteringRecommender",
                "SequentialGreedyRecommender",
                "NaiveHybridSpaceRecommender"
            ]
        );
    }

    #[test]
    fn compatibility_predicates() {
        let catalog = Catalog::new(Registry::builtin());
        let continuous = catalog
            .pure_recommenders(&Predicate::CompatibleWith(SearchSpaceType::Continuous))
            .unwrap();
        assert!(!names(&continuous).contains(&"FPSRecommender"));

        let discrete_only = catalog
            .non_predictive_recommenders(&Predicate::CompatibilityIs(SearchSpaceType::Discrete))
            .unwrap();
        assert_eq!(
            names(&discrete_only),
            vec!["FPSRecommender", "KMeansClusteringRecommender"]
        );
    }

    #[test]
    fn mc_split_of_acquisition_functions() {
        let catalog = Catalog::new(Registry::builtin());
        let mc = catalog.acquisition_functions(&Predicate::Mc(true)).unwrap();
        let analytic = catalog.acquisition_functions(&Predicate::Mc(false)).unwrap();
        assert_eq!(mc.len(), 6);
        assert_eq!(analytic.len(), 5);
        assert!(mc.iter().all(|e| e.config.is_mc()));
    }

    #[test]
    fn failing_factory_aborts_catalog() {
        let catalog = with_failing_surrogate();
        let err = catalog.surrogates(&Predicate::All).unwrap_err();
        let CatalogError::Instantiation { category, variant, .. } = err;
        assert_eq!(category, Category::Surrogate);
        assert_eq!(variant, "ModelFileSurrogate");
    }

    #[test]
    fn excluded_variant_is_never_instantiated() {
        let catalog = with_failing_surrogate();
        let surrogates = catalog
            .surrogates(&Predicate::exclude("ModelFileSurrogate"))
            .unwrap();
        assert_eq!(surrogates.len(), 3);

        let fewer = catalog
            .surrogates(
                &Predicate::exclude("ModelFileSurrogate")
                    .and(Predicate::exclude("MeanPredictionSurrogate")),
            )
            .unwrap();
        assert_eq!(
            names(&fewer),
            vec!["GaussianProcessSurrogate", "BayesianLinearSurrogate"]
        );
    }
}
