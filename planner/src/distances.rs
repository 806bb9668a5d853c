use std::collections::HashMap;

use dronerouting_structs::{instance::Instance, NodeId};
use log::debug;

use crate::error::ModelError;

/// Directed travel times between every ordered pair of distinct nodes.
#[derive(Debug, Clone, Default)]
pub struct TravelTimes {
    times: HashMap<(NodeId, NodeId), f64>,
}

impl TravelTimes {
    pub fn compute(instance: &Instance) -> Self {
        let nodes = instance.nodes().collect::<Vec<_>>();
        let mut times = HashMap::with_capacity(nodes.len() * nodes.len());
        for (n1, p1) in nodes.iter() {
            for (n2, p2) in nodes.iter() {
                if n1.id != n2.id {
                    times.insert((n1.id, n2.id), p1.dist(p2) / instance.speed);
                }
            }
        }
        debug!("Computed {} travel times for {} nodes", times.len(), nodes.len());
        TravelTimes { times }
    }

    pub fn get(&self, from: NodeId, to: NodeId) -> Result<f64, ModelError> {
        self.times
            .get(&(from, to))
            .copied()
            .ok_or(ModelError::MissingTravelTime { from, to })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::line_instance;

    #[test]
    fn euclidean_over_speed() {
        let mut instance = line_instance(10.0, 1);
        instance.speed = 2.0;
        let tt = TravelTimes::compute(&instance);
        // 3 nodes on the line plus the far depot
        assert_eq!(tt.len(), 4 * 3);
        assert_eq!(tt.get(2, 3).unwrap(), 5.0);
        assert_eq!(tt.get(3, 2).unwrap(), 5.0);
        assert_eq!(tt.get(1, 2).unwrap(), 2.5);
    }

    #[test]
    fn missing_pair_names_the_key() {
        let tt = TravelTimes::compute(&line_instance(10.0, 1));
        match tt.get(2, 2) {
            Err(ModelError::MissingTravelTime { from: 2, to: 2 }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(tt.get(2, 99).is_err());
    }
}
