//! Vector features with attribute maps

use serde_json::{Map, Value};

use crate::coordinate::{BoundingBox, CoordinateTransformer, Crs, Geo, Geometry};
use crate::errors::Result;

/// A polygonal feature and its attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<Geo>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry<Geo>) -> Self {
        Feature {
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Integer class id stored under `field`
    ///
    /// Accepts integer numbers, integral floats and numeric strings.
    pub fn class_id(&self, field: &str) -> Option<i64> {
        match self.properties.get(field)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Attribute rendered as a grouping key; strings are used verbatim
    pub fn property_key(&self, field: &str) -> Option<String> {
        match self.properties.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Features sharing one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub crs: Crs,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(crs: Crs, features: Vec<Feature>) -> Self {
        FeatureCollection { crs, features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Union of all feature bounds
    pub fn bounds(&self) -> Option<BoundingBox<Geo>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    /// Copy of this collection expressed in `target`
    pub fn reproject(&self, target: &Crs, transformer: &CoordinateTransformer) -> Result<FeatureCollection> {
        if *target == self.crs {
            return Ok(self.clone());
        }
        let features = self
            .features
            .iter()
            .map(|f| {
                Ok(Feature {
                    geometry: transformer.transform_geometry(&f.geometry, &self.crs, target)?,
                    properties: f.properties.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureCollection::new(*target, features))
    }
}
