use serde::{Deserialize, Serialize};

use crate::Node;

#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct RouteArc {
    pub from: Node,
    pub to: Node,
    pub travel_time: f64,
    /// Service performed at `from` before departing.
    pub service_time: f64,
    /// Recharge performed at `from` before departing (pass-through stops only).
    pub recharge_time: f64,
}

impl RouteArc {
    pub fn duration(&self) -> f64 {
        self.travel_time + self.service_time + self.recharge_time
    }
}

#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Route {
    pub drone: usize,
    pub arcs: Vec<RouteArc>,
    pub total_time: f64,
}

impl Route {
    pub fn new(drone: usize, arcs: Vec<RouteArc>) -> Self {
        let total_time = arcs.iter().map(|a| a.duration()).sum();
        Route { drone, arcs, total_time }
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.arcs.first().map(|a| a.from).into_iter().chain(self.arcs.iter().map(|a| a.to))
    }

    pub fn flight_time(&self) -> f64 {
        self.arcs.iter().map(|a| a.travel_time).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct RoutePlan {
    pub routes: Vec<Route>,
}

impl RoutePlan {
    pub fn print(&self) {
        for route in self.routes.iter() {
            println!("drone {} ({:.2})", route.drone, route.total_time);
            for arc in route.arcs.iter() {
                println!("  - {} -> {}  {:.2}", arc.from, arc.to, arc.travel_time);
            }
        }
    }

    pub fn total_flight_time(&self) -> f64 {
        self.routes.iter().map(|r| r.flight_time()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_totals() {
        let arc = |from, to, service_time, recharge_time| RouteArc {
            from,
            to,
            travel_time: 5.0,
            service_time,
            recharge_time,
        };
        let arcs = vec![
            arc(Node::station(1), Node::location(2), 0.0, 0.0),
            arc(Node::location(2), Node::station(1), 1.0, 0.0),
            arc(Node::station(1), Node::location(3), 0.0, 2.0),
        ];
        let route = Route::new(0, arcs);
        assert_eq!(route.total_time, 18.0);
        assert_eq!(route.flight_time(), 15.0);
        let nodes = route.nodes().collect::<Vec<_>>();
        let expected =
            vec![Node::station(1), Node::location(2), Node::station(1), Node::location(3)];
        assert_eq!(nodes, expected);
    }
}
