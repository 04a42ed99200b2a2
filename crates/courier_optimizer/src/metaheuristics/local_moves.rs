use rand::{Rng, seq::IndexedRandom};

use crate::{
    problem::{routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solution::{candidate_solution::CandidateSolution, route_evaluation::is_route_feasible},
};

/// Attempts at drawing a feasible neighbor before giving up.
const MAX_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMove {
    /// Swap two stops of the same route.
    IntraSwap {
        vehicle_id: VehicleIdx,
        first: usize,
        second: usize,
    },
    /// Reverse `from..=to` within one route.
    Reverse {
        vehicle_id: VehicleIdx,
        from: usize,
        to: usize,
    },
    /// Exchange one stop between two routes.
    InterSwap {
        first_vehicle: VehicleIdx,
        first: usize,
        second_vehicle: VehicleIdx,
        second: usize,
    },
    /// Move one stop to another position, possibly in another route.
    Relocate {
        from_vehicle: VehicleIdx,
        from: usize,
        to_vehicle: VehicleIdx,
        to: usize,
    },
    /// Insert an unassigned stop.
    InsertUnassigned {
        unassigned: usize,
        vehicle_id: VehicleIdx,
        position: usize,
    },
}

impl LocalMove {
    /// Draws a random move applicable to `solution`.
    pub fn random<R: Rng>(solution: &CandidateSolution, rng: &mut R) -> Option<LocalMove> {
        let non_empty: Vec<VehicleIdx> = solution
            .non_empty_routes()
            .map(|(vehicle_id, _)| vehicle_id)
            .collect();
        let num_vehicles = solution.routes().len();

        let mut kinds = vec![];
        if solution
            .non_empty_routes()
            .any(|(_, route)| route.len() >= 2)
        {
            kinds.push(0);
            kinds.push(1);
        }
        if non_empty.len() >= 2 {
            kinds.push(2);
        }
        if !non_empty.is_empty() {
            kinds.push(3);
        }
        if !solution.unassigned().is_empty() {
            kinds.push(4);
        }

        let random_vehicle = |rng: &mut R| VehicleIdx::new(rng.random_range(0..num_vehicles));

        let kind = *kinds.choose(rng)?;
        match kind {
            0 | 1 => {
                let long_routes: Vec<VehicleIdx> = solution
                    .non_empty_routes()
                    .filter(|(_, route)| route.len() >= 2)
                    .map(|(vehicle_id, _)| vehicle_id)
                    .collect();
                let vehicle_id = *long_routes.choose(rng)?;
                let len = solution.route(vehicle_id).len();
                let first = rng.random_range(0..len);
                let mut second = rng.random_range(0..len - 1);
                if second >= first {
                    second += 1;
                }

                if kind == 0 {
                    Some(LocalMove::IntraSwap {
                        vehicle_id,
                        first,
                        second,
                    })
                } else {
                    Some(LocalMove::Reverse {
                        vehicle_id,
                        from: first.min(second),
                        to: first.max(second),
                    })
                }
            }
            2 => {
                let first_vehicle = *non_empty.choose(rng)?;
                let others: Vec<VehicleIdx> = non_empty
                    .iter()
                    .copied()
                    .filter(|&vehicle_id| vehicle_id != first_vehicle)
                    .collect();
                let second_vehicle = *others.choose(rng)?;

                Some(LocalMove::InterSwap {
                    first_vehicle,
                    first: rng.random_range(0..solution.route(first_vehicle).len()),
                    second_vehicle,
                    second: rng.random_range(0..solution.route(second_vehicle).len()),
                })
            }
            3 => {
                let from_vehicle = *non_empty.choose(rng)?;
                let from = rng.random_range(0..solution.route(from_vehicle).len());
                let to_vehicle = random_vehicle(rng);
                let target_len = if to_vehicle == from_vehicle {
                    solution.route(to_vehicle).len() - 1
                } else {
                    solution.route(to_vehicle).len()
                };

                Some(LocalMove::Relocate {
                    from_vehicle,
                    from,
                    to_vehicle,
                    to: rng.random_range(0..=target_len),
                })
            }
            _ => {
                let vehicle_id = random_vehicle(rng);
                Some(LocalMove::InsertUnassigned {
                    unassigned: rng.random_range(0..solution.unassigned().len()),
                    vehicle_id,
                    position: rng.random_range(0..=solution.route(vehicle_id).len()),
                })
            }
        }
    }

    /// Applies the move to a copy of `solution`. Returns the neighbor only
    /// when every route it touches stays feasible.
    pub fn apply(
        &self,
        problem: &RoutingProblem,
        solution: &CandidateSolution,
    ) -> Option<CandidateSolution> {
        let mut neighbor = solution.clone();

        let touched: Vec<VehicleIdx> = match *self {
            LocalMove::IntraSwap {
                vehicle_id,
                first,
                second,
            } => {
                neighbor.route_mut(vehicle_id).swap(first, second);
                vec![vehicle_id]
            }
            LocalMove::Reverse {
                vehicle_id,
                from,
                to,
            } => {
                neighbor.route_mut(vehicle_id)[from..=to].reverse();
                vec![vehicle_id]
            }
            LocalMove::InterSwap {
                first_vehicle,
                first,
                second_vehicle,
                second,
            } => {
                let first_stop = neighbor.route(first_vehicle)[first];
                let second_stop = neighbor.route(second_vehicle)[second];
                neighbor.route_mut(first_vehicle)[first] = second_stop;
                neighbor.route_mut(second_vehicle)[second] = first_stop;
                vec![first_vehicle, second_vehicle]
            }
            LocalMove::Relocate {
                from_vehicle,
                from,
                to_vehicle,
                to,
            } => {
                let stop = neighbor.route_mut(from_vehicle).remove(from);
                neighbor.route_mut(to_vehicle).insert(to, stop);
                if from_vehicle == to_vehicle {
                    vec![from_vehicle]
                } else {
                    vec![from_vehicle, to_vehicle]
                }
            }
            LocalMove::InsertUnassigned {
                unassigned,
                vehicle_id,
                position,
            } => {
                let stop = neighbor.unassigned()[unassigned];
                neighbor.route_mut(vehicle_id).insert(position, stop);
                neighbor.mark_assigned(stop);
                vec![vehicle_id]
            }
        };

        touched
            .iter()
            .all(|&vehicle_id| is_route_feasible(problem, vehicle_id, neighbor.route(vehicle_id)))
            .then_some(neighbor)
    }
}

/// Random feasible neighbor of `solution`, if one is found within a few
/// attempts.
pub fn random_neighbor<R: Rng>(
    problem: &RoutingProblem,
    solution: &CandidateSolution,
    rng: &mut R,
) -> Option<CandidateSolution> {
    (0..MAX_ATTEMPTS).find_map(|_| LocalMove::random(solution, rng)?.apply(problem, solution))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::{
        construction::nearest_neighbor::nearest_neighbor, problem::location::LocationIdx,
        test_utils,
    };

    use super::*;

    #[test]
    fn test_neighbors_stay_feasible_partitions() {
        let problem = test_utils::create_problem(
            &[30.0, 20.0, 50.0, 10.0, 40.0, 25.0, 35.0, 15.0],
            &[100.0, 100.0, 100.0],
        );
        let mut solution = nearest_neighbor(&problem);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..200 {
            if let Some(neighbor) = random_neighbor(&problem, &solution, &mut rng) {
                assert!(neighbor.is_partition(&problem));
                for (vehicle_id, route) in neighbor.non_empty_routes() {
                    assert!(is_route_feasible(&problem, vehicle_id, route));
                }
                solution = neighbor;
            }
        }
    }

    #[test]
    fn test_insert_unassigned() {
        let problem = test_utils::create_problem(&[30.0, 20.0], &[100.0]);
        let solution = CandidateSolution::from_routes(&problem, vec![vec![LocationIdx::new(1)]]);

        let neighbor = LocalMove::InsertUnassigned {
            unassigned: 0,
            vehicle_id: VehicleIdx::new(0),
            position: 1,
        }
        .apply(&problem, &solution)
        .unwrap();

        assert!(neighbor.unassigned().is_empty());
        assert_eq!(
            neighbor.route(VehicleIdx::new(0)),
            &[LocationIdx::new(1), LocationIdx::new(2)]
        );
    }

    #[test]
    fn test_rejects_capacity_breaking_relocate() {
        let problem = test_utils::create_problem(&[60.0, 60.0], &[100.0, 100.0]);
        let solution = CandidateSolution::from_routes(
            &problem,
            vec![vec![LocationIdx::new(1)], vec![LocationIdx::new(2)]],
        );

        let relocate = LocalMove::Relocate {
            from_vehicle: VehicleIdx::new(0),
            from: 0,
            to_vehicle: VehicleIdx::new(1),
            to: 1,
        };
        assert!(relocate.apply(&problem, &solution).is_none());
    }
}
