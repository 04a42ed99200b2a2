use geo::{Distance, Haversine};
use rstar::primitives::GeomWithData;
use rstar::{AABB, Envelope, PointDistance, RTree, RTreeObject};

use super::location::{Location, LocationIdx, LocationRole};

pub struct FacilityData {
    location_id: LocationIdx,
    role: LocationRole,
}

pub struct FacilityPoint {
    lon: f64,
    lat: f64,
}

impl RTreeObject for FacilityPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

impl PointDistance for FacilityPoint {
    fn distance_2(
        &self,
        point: &<Self::Envelope as Envelope>::Point,
    ) -> <<Self::Envelope as Envelope>::Point as rstar::Point>::Scalar {
        let distance = Haversine.distance(
            geo::Point::new(self.lon, self.lat),
            geo::Point::new(point[0], point[1]),
        );

        distance * distance
    }
}

pub type FacilityIndexObject = GeomWithData<FacilityPoint, FacilityData>;

/// Spatial index over depots, fuel stations and rest areas, used by the
/// itinerary builder to find staging and rest waypoints.
pub struct FacilityIndex {
    tree: RTree<FacilityIndexObject>,
}

impl FacilityIndex {
    pub fn new(locations: &[Location]) -> FacilityIndex {
        let tree: RTree<FacilityIndexObject> = RTree::bulk_load(
            locations
                .iter()
                .enumerate()
                .filter(|(_, location)| location.role().is_facility())
                .map(|(index, location)| {
                    FacilityIndexObject::new(
                        FacilityPoint {
                            lon: location.lon(),
                            lat: location.lat(),
                        },
                        FacilityData {
                            location_id: LocationIdx::new(index),
                            role: location.role(),
                        },
                    )
                })
                .collect(),
        );

        FacilityIndex { tree }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Facilities with one of `roles`, closest to `point` first.
    pub fn nearest_iter<'a, P>(
        &'a self,
        point: P,
        roles: &'a [LocationRole],
    ) -> impl Iterator<Item = LocationIdx> + 'a
    where
        P: Into<geo::Point>,
    {
        let point: geo::Point = point.into();
        self.tree
            .nearest_neighbor_iter(&[point.x(), point.y()])
            .filter(move |object| roles.contains(&object.data.role))
            .map(|object| object.data.location_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::location::LocationBuilder;

    use super::*;

    fn facility(id: &str, lat: f64, lon: f64, role: LocationRole) -> Location {
        let mut builder = LocationBuilder::new(id, lat, lon);
        builder.set_role(role);
        builder.build()
    }

    #[test]
    fn test_nearest_by_role() {
        let locations = vec![
            facility("depot", 50.0, 4.0, LocationRole::Depot),
            LocationBuilder::new("stop", 50.5, 4.5).build(),
            facility("rest", 50.6, 4.6, LocationRole::Rest),
            facility("fuel", 50.4, 4.4, LocationRole::Fuel),
        ];
        let index = FacilityIndex::new(&locations);
        let target = geo::Point::new(4.5, 50.5);

        let rest_or_depot: Vec<_> = index
            .nearest_iter(target, &[LocationRole::Rest, LocationRole::Depot])
            .collect();
        assert_eq!(rest_or_depot, vec![LocationIdx::new(2), LocationIdx::new(0)]);

        let first = index
            .nearest_iter(target, &[LocationRole::Fuel, LocationRole::Depot])
            .next();
        assert_eq!(first, Some(LocationIdx::new(3)));
    }
}
