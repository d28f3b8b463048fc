use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parameters::Point;

/// One observed outcome: the evaluated point and a value per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub point: Point,
    pub values: BTreeMap<String, f64>,
    /// Index of the recommendation batch this point came from, if any.
    pub batch: Option<usize>,
    pub recorded_at: DateTime<Utc>,
}

impl Measurement {
    pub fn new(point: Point) -> Self {
        Self {
            point,
            values: BTreeMap::new(),
            batch: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_value(mut self, target: impl Into<String>, value: f64) -> Self {
        self.values.insert(target.into(), value);
        self
    }

    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = Some(batch);
        self
    }
}
