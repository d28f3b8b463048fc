//! Variants registered with the process-wide registry reach the global catalog.
//!
//! Kept in its own test binary because registration mutates process state.

use bh_harness::catalog::{Catalog, Predicate};
use bh_optimizer::registry::{self, Category, Family, VariantDescriptor};
use bh_optimizer::{RecommenderConfig, Registry};
use bh_types::SearchSpaceType;

fn coarse_kmeans() -> VariantDescriptor<RecommenderConfig> {
    VariantDescriptor {
        name: "CoarseKMeansRecommender",
        abbreviation: "KM5",
        family: Family::NonPredictive,
        compatibility: Some(SearchSpaceType::Discrete),
        is_mc: false,
        factory: || Ok(RecommenderConfig::KMeansClustering { max_iterations: 5 }),
    }
}

#[test]
fn registered_recommender_is_listed_after_builtins() {
    let builtin = Registry::builtin().count(Category::PureRecommender);

    registry::register_recommender(coarse_kmeans()).unwrap();

    let entries = Catalog::global()
        .pure_recommenders(&Predicate::All)
        .unwrap();
    assert_eq!(entries.len(), builtin + 1);
    let last = entries.last().unwrap();
    assert_eq!(last.name, "CoarseKMeansRecommender");
    assert_eq!(
        last.config,
        RecommenderConfig::KMeansClustering { max_iterations: 5 }
    );

    let discrete_only = Catalog::global()
        .non_predictive_recommenders(&Predicate::CompatibilityIs(SearchSpaceType::Discrete))
        .unwrap();
    assert!(discrete_only.iter().any(|e| e.abbreviation == "KM5"));

    // Append-only: the same name cannot be registered twice.
    assert!(registry::register_recommender(coarse_kmeans()).is_err());
    let again = Catalog::global()
        .pure_recommenders(&Predicate::All)
        .unwrap();
    assert_eq!(again.len(), builtin + 1);
}
