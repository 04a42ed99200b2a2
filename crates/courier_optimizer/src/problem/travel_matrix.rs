use rayon::prelude::*;

use super::location::{Location, LocationIdx};

/// Great-circle distances (km) between every pair of locations, stored flat:
/// `index = from * num_locations + to`.
pub struct TravelMatrix {
    distances: Vec<f64>,
    num_locations: usize,
}

impl TravelMatrix {
    pub fn from_haversine(locations: &[Location]) -> Self {
        let num_locations = locations.len();
        let distances = (0..num_locations * num_locations)
            .into_par_iter()
            .map(|index| {
                let from = &locations[index / num_locations];
                let to = &locations[index % num_locations];
                from.haversine_km(to)
            })
            .collect();

        TravelMatrix {
            distances,
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn distance(&self, from: LocationIdx, to: LocationIdx) -> f64 {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }

    pub fn max_distance(&self) -> f64 {
        self.distances.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::location::LocationBuilder;

    use super::*;

    #[test]
    fn test_symmetric_haversine() {
        let locations = vec![
            LocationBuilder::new("a", 50.0, 4.0).build(),
            LocationBuilder::new("b", 50.5, 4.5).build(),
            LocationBuilder::new("c", 51.0, 3.5).build(),
        ];
        let matrix = TravelMatrix::from_haversine(&locations);

        assert_eq!(matrix.num_locations(), 3);
        for from in LocationIdx::range(3) {
            assert_eq!(matrix.distance(from, from), 0.0);
            for to in LocationIdx::range(3) {
                assert!((matrix.distance(from, to) - matrix.distance(to, from)).abs() < 1e-9);
            }
        }
        assert!(matrix.max_distance() > 0.0);
    }
}
