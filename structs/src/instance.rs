use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Node, NodeId, Point, DEPOT};

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("could not read instance file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed instance: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("instance has no depot (recharge station with id 0)")]
    MissingDepot,
    #[error("node id {0} is used more than once")]
    DuplicateId(NodeId),
    #[error("field `{field}` must be positive and finite, got {value}")]
    NotPositive { field: String, value: f64 },
    #[error("field `{field}` must be non-negative and finite, got {value}")]
    Negative { field: String, value: f64 },
    #[error("coordinates of node {0} are not finite")]
    BadCoordinates(NodeId),
}

fn default_battery_big_m() -> f64 {
    1.0
}

/// Problem data for one drone routing run.
///
/// Service locations and recharge stations share one id space. Station `0`
/// is the depot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: u32,
    pub max_battery: f64,
    /// Battery drained per unit of flight time.
    pub travel_energy_rate: f64,
    /// Battery drained per unit of hovering (service) time.
    pub hover_energy_rate: f64,
    pub recharge_time: f64,
    /// Time horizon, also the big-M of the time propagation rows.
    pub tbig: f64,
    pub speed: f64,
    /// Relaxation constant of the battery rows.
    #[serde(default = "default_battery_big_m")]
    pub battery_big_m: f64,
    pub locations: Vec<Location>,
    pub stations: Vec<RechargeStation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub service_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeStation {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub initial_drones: u32,
}

impl Instance {
    pub fn from_json_str(s: &str) -> Result<Self, InstanceError> {
        let instance: Instance = serde_json::from_str(s)?;
        instance.validate()?;
        Ok(instance)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, InstanceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| InstanceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), InstanceError> {
        let positive = [
            ("max_battery", self.max_battery),
            ("tbig", self.tbig),
            ("speed", self.speed),
            ("battery_big_m", self.battery_big_m),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(InstanceError::NotPositive { field: field.to_string(), value });
            }
        }

        let non_negative = [
            ("travel_energy_rate", self.travel_energy_rate),
            ("hover_energy_rate", self.hover_energy_rate),
            ("recharge_time", self.recharge_time),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(InstanceError::Negative { field: field.to_string(), value });
            }
        }

        let mut seen = HashSet::new();
        for loc in self.locations.iter() {
            if !seen.insert(loc.id) {
                return Err(InstanceError::DuplicateId(loc.id));
            }
            if !(loc.x.is_finite() && loc.y.is_finite()) {
                return Err(InstanceError::BadCoordinates(loc.id));
            }
            if !(loc.service_time.is_finite() && loc.service_time >= 0.0) {
                return Err(InstanceError::Negative {
                    field: format!("locations[{}].service_time", loc.id),
                    value: loc.service_time,
                });
            }
        }
        for rs in self.stations.iter() {
            if !seen.insert(rs.id) {
                return Err(InstanceError::DuplicateId(rs.id));
            }
            if !(rs.x.is_finite() && rs.y.is_finite()) {
                return Err(InstanceError::BadCoordinates(rs.id));
            }
        }

        if self.station(DEPOT).is_none() {
            return Err(InstanceError::MissingDepot);
        }
        Ok(())
    }

    pub fn location(&self, id: NodeId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn station(&self, id: NodeId) -> Option<&RechargeStation> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn node(&self, id: NodeId) -> Option<Node> {
        if self.location(id).is_some() {
            Some(Node::location(id))
        } else {
            self.station(id).map(|_| Node::station(id))
        }
    }

    /// All nodes, locations first, each group in file order.
    pub fn nodes(&self) -> impl Iterator<Item = (Node, Point)> + '_ {
        let locs = self.locations.iter().map(|l| (Node::location(l.id), Point { x: l.x, y: l.y }));
        let stations =
            self.stations.iter().map(|s| (Node::station(s.id), Point { x: s.x, y: s.y }));
        locs.chain(stations)
    }

    /// Service time at a node; zero for recharge stations.
    pub fn service_time(&self, id: NodeId) -> Option<f64> {
        match self.location(id) {
            Some(l) => Some(l.service_time),
            None => self.station(id).map(|_| 0.0),
        }
    }

    pub fn initial_drones(&self, id: NodeId) -> Option<u32> {
        self.station(id).map(|s| s.initial_drones)
    }

    /// Fraction of a full battery used by flying `travel_time` after hovering
    /// for `service_time`.
    pub fn energy_fraction(&self, travel_time: f64, service_time: f64) -> f64 {
        (self.travel_energy_rate * travel_time + self.hover_energy_rate * service_time)
            / self.max_battery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "id": 7,
        "max_battery": 10.0,
        "travel_energy_rate": 1.0,
        "hover_energy_rate": 0.5,
        "recharge_time": 2.0,
        "tbig": 100.0,
        "speed": 1.0,
        "locations": [ { "id": 2, "x": 0.0, "y": 0.0, "service_time": 1.0 } ],
        "stations": [ { "id": 0, "x": 5.0, "y": 0.0, "initial_drones": 1 } ]
    }"#;

    #[test]
    fn parse_small_instance() {
        let instance = Instance::from_json_str(SMALL).unwrap();
        assert_eq!(instance.id, 7);
        assert_eq!(instance.battery_big_m, 1.0);
        assert_eq!(instance.node(2), Some(Node::location(2)));
        assert_eq!(instance.node(0), Some(Node::station(0)));
        assert_eq!(instance.node(9), None);
        assert_eq!(instance.service_time(0), Some(0.0));
        assert_eq!(instance.service_time(2), Some(1.0));
        assert_eq!(instance.energy_fraction(4.0, 2.0), 0.5);
    }

    #[test]
    fn missing_field_is_named() {
        let broken = SMALL.replace(r#""speed": 1.0,"#, "");
        let err = Instance::from_json_str(&broken).unwrap_err();
        assert!(err.to_string().contains("speed"), "{}", err);
    }

    #[test]
    fn missing_depot() {
        let broken = SMALL.replace(r#""id": 0, "x": 5.0"#, r#""id": 4, "x": 5.0"#);
        assert!(matches!(Instance::from_json_str(&broken), Err(InstanceError::MissingDepot)));
    }

    #[test]
    fn duplicate_id() {
        let broken = SMALL.replace(r#""id": 2, "x""#, r#""id": 0, "x""#);
        assert!(matches!(Instance::from_json_str(&broken), Err(InstanceError::DuplicateId(0))));
    }

    #[test]
    fn bad_speed() {
        let broken = SMALL.replace(r#""speed": 1.0"#, r#""speed": 0.0"#);
        match Instance::from_json_str(&broken) {
            Err(InstanceError::NotPositive { field, .. }) => assert_eq!(field, "speed"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
