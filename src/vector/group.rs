//! Dissolve features into one bounding rectangle per attribute value

use std::collections::BTreeMap;

use log::{info, warn};
use serde_json::{Map, Value};

use crate::coordinate::{BoundingBox, Geo, Polygon};
use crate::vector::feature::{Feature, FeatureCollection};

/// One rectangle per distinct value of `field`, covering its members
///
/// Groups are ordered by key. Each output feature carries the attributes
/// of the first member of its group. Features without the field are left
/// out.
pub fn group_bounding_boxes(collection: &FeatureCollection, field: &str) -> FeatureCollection {
    let mut groups: BTreeMap<String, (BoundingBox<Geo>, Map<String, Value>)> = BTreeMap::new();
    let mut missing = 0usize;

    for feature in &collection.features {
        let (key, bounds) = match (feature.property_key(field), feature.geometry.bounds()) {
            (Some(key), Some(bounds)) => (key, bounds),
            _ => {
                missing += 1;
                continue;
            }
        };
        groups
            .entry(key)
            .and_modify(|(acc, _)| *acc = acc.union(&bounds))
            .or_insert_with(|| (bounds, feature.properties.clone()));
    }

    if missing > 0 {
        warn!("{} feature(s) have no '{}' value and were not grouped", missing, field);
    }
    info!(
        "Grouped {} feature(s) into {} box(es) by '{}'",
        collection.len() - missing,
        groups.len(),
        field
    );

    let features = groups
        .into_values()
        .map(|(bounds, properties)| Feature {
            geometry: Polygon::rectangle(&bounds).into(),
            properties,
        })
        .collect();
    FeatureCollection::new(collection.crs, features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Crs;

    fn feature(min_x: f64, min_y: f64, max_x: f64, max_y: f64, id: Value) -> Feature {
        Feature::new(Polygon::rectangle(&BoundingBox::new(min_x, min_y, max_x, max_y)).into())
            .with_property("Id", id)
    }

    #[test]
    fn groups_by_attribute() {
        let fc = FeatureCollection::new(
            Crs::Epsg(32633),
            vec![
                feature(0.0, 0.0, 1.0, 1.0, Value::from(2)),
                feature(5.0, 5.0, 6.0, 8.0, Value::from(2)),
                feature(10.0, 10.0, 11.0, 11.0, Value::from(1)),
                feature(20.0, 20.0, 21.0, 21.0, Value::Null),
            ],
        );
        let grouped = group_bounding_boxes(&fc, "Id");
        assert_eq!(grouped.crs, Crs::Epsg(32633));
        assert_eq!(grouped.len(), 2);

        let first = &grouped.features[0];
        assert_eq!(first.class_id("Id"), Some(1));
        let second = &grouped.features[1];
        assert_eq!(
            second.geometry.bounds().unwrap(),
            BoundingBox::new(0.0, 0.0, 6.0, 8.0)
        );
    }
}
