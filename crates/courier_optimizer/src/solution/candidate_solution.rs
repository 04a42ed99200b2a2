use fixedbitset::FixedBitSet;

use crate::problem::{
    location::LocationIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx,
};

use super::route_evaluation::{SolutionEvaluation, evaluate_solution};

/// Stop sequences per vehicle plus the routable stops left out. Depots,
/// fuel and rest facilities never appear in the sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSolution {
    routes: Vec<Vec<LocationIdx>>,
    unassigned: Vec<LocationIdx>,
}

impl CandidateSolution {
    pub fn empty(problem: &RoutingProblem) -> Self {
        CandidateSolution {
            routes: vec![vec![]; problem.num_vehicles()],
            unassigned: problem.routable_stops().to_vec(),
        }
    }

    /// Builds a solution from per-vehicle routes. Routable stops missing
    /// from every route become unassigned.
    pub fn from_routes(problem: &RoutingProblem, mut routes: Vec<Vec<LocationIdx>>) -> Self {
        routes.resize(problem.num_vehicles(), vec![]);

        let mut assigned = FixedBitSet::with_capacity(problem.locations().len());
        for stop in routes.iter().flatten() {
            assigned.insert(stop.get());
        }

        let unassigned = problem
            .routable_stops()
            .iter()
            .copied()
            .filter(|stop| !assigned.contains(stop.get()))
            .collect();

        CandidateSolution { routes, unassigned }
    }

    pub fn routes(&self) -> &[Vec<LocationIdx>] {
        &self.routes
    }

    pub fn route(&self, vehicle_id: VehicleIdx) -> &[LocationIdx] {
        &self.routes[vehicle_id.get()]
    }

    pub fn route_mut(&mut self, vehicle_id: VehicleIdx) -> &mut Vec<LocationIdx> {
        &mut self.routes[vehicle_id.get()]
    }

    pub fn set_route(&mut self, vehicle_id: VehicleIdx, route: Vec<LocationIdx>) {
        self.routes[vehicle_id.get()] = route;
    }

    pub fn unassigned(&self) -> &[LocationIdx] {
        &self.unassigned
    }

    pub fn mark_assigned(&mut self, stop: LocationIdx) {
        self.unassigned.retain(|&unassigned| unassigned != stop);
    }

    pub fn mark_unassigned(&mut self, stop: LocationIdx) {
        if !self.unassigned.contains(&stop) {
            self.unassigned.push(stop);
        }
    }

    pub fn num_assigned(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    pub fn non_empty_routes(&self) -> impl Iterator<Item = (VehicleIdx, &[LocationIdx])> {
        self.routes
            .iter()
            .enumerate()
            .filter(|(_, route)| !route.is_empty())
            .map(|(index, route)| (VehicleIdx::new(index), route.as_slice()))
    }

    /// Every routable stop appears exactly once, in a route or unassigned.
    pub fn is_partition(&self, problem: &RoutingProblem) -> bool {
        let mut seen = FixedBitSet::with_capacity(problem.locations().len());
        for stop in self.routes.iter().flatten().chain(self.unassigned.iter()) {
            if !problem.location(*stop).role().is_stop() || seen.put(stop.get()) {
                return false;
            }
        }

        seen.count_ones(..) == problem.routable_stops().len()
    }

    /// Giant tour of all assigned stops in vehicle order, used to seed
    /// permutation based solvers.
    pub fn giant_tour(&self) -> Vec<LocationIdx> {
        self.routes
            .iter()
            .flatten()
            .chain(self.unassigned.iter())
            .copied()
            .collect()
    }

    pub fn evaluate(&self, problem: &RoutingProblem) -> SolutionEvaluation {
        evaluate_solution(problem, self)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils;

    use super::*;

    #[test]
    fn test_from_routes_tracks_unassigned() {
        let problem = test_utils::create_problem(&[10.0, 10.0, 10.0], &[100.0, 100.0]);
        let solution = CandidateSolution::from_routes(
            &problem,
            vec![vec![LocationIdx::new(3), LocationIdx::new(1)]],
        );

        assert_eq!(solution.routes().len(), 2);
        assert_eq!(solution.unassigned(), &[LocationIdx::new(2)]);
        assert_eq!(solution.num_assigned(), 2);
        assert!(solution.is_partition(&problem));
    }

    #[test]
    fn test_partition_detects_duplicates() {
        let problem = test_utils::create_problem(&[10.0, 10.0], &[100.0]);
        let solution = CandidateSolution::from_routes(
            &problem,
            vec![vec![
                LocationIdx::new(1),
                LocationIdx::new(2),
                LocationIdx::new(1),
            ]],
        );

        assert!(!solution.is_partition(&problem));
    }
}
