//! Common types for the junction environment abstraction.

use serde::{Deserialize, Serialize};

/// Identifier of a road junction (the OpenDRIVE junction id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JunctionId(pub i32);

impl JunctionId {
    /// Returns the raw junction id.
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for JunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "junction#{}", self.0)
    }
}

/// Identifier of an actor placed in the scene.
///
/// Used by scene queries (ignore lists, hit attribution) and by traffic
/// light controllers to name the signal heads they drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Semantic category attached to scene geometry.
///
/// Discriminants are the wire values used by the simulator's RPC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CityObjectLabel {
    /// Unlabelled geometry (also the miss sentinel)
    #[default]
    None = 0,
    Buildings = 1,
    Fences = 2,
    Other = 3,
    Pedestrians = 4,
    Poles = 5,
    RoadLines = 6,
    Roads = 7,
    Sidewalks = 8,
    Vegetation = 9,
    Vehicles = 10,
    Walls = 11,
    TrafficSigns = 12,
    Sky = 13,
    Ground = 14,
    Bridge = 15,
    RailTrack = 16,
    GuardRail = 17,
    TrafficLight = 18,
    Static = 19,
    Dynamic = 20,
    Water = 21,
    Terrain = 22,
    /// Wildcard used by filters, never attached to geometry
    Any = 255,
}

impl CityObjectLabel {
    /// Decodes a wire value. Unknown values map to [`CityObjectLabel::None`].
    pub fn from_u8(value: u8) -> Self {
        use CityObjectLabel::*;
        match value {
            1 => Buildings,
            2 => Fences,
            3 => Other,
            4 => Pedestrians,
            5 => Poles,
            6 => RoadLines,
            7 => Roads,
            8 => Sidewalks,
            9 => Vegetation,
            10 => Vehicles,
            11 => Walls,
            12 => TrafficSigns,
            13 => Sky,
            14 => Ground,
            15 => Bridge,
            16 => RailTrack,
            17 => GuardRail,
            18 => TrafficLight,
            19 => Static,
            20 => Dynamic,
            21 => Water,
            22 => Terrain,
            255 => Any,
            _ => None,
        }
    }

    /// Returns the wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the "unlabelled" tag.
    pub fn is_unlabelled(self) -> bool {
        self == CityObjectLabel::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_wire_values() {
        assert_eq!(CityObjectLabel::None.as_u8(), 0);
        assert_eq!(CityObjectLabel::TrafficLight.as_u8(), 18);
        assert_eq!(CityObjectLabel::Any.as_u8(), 255);
        assert_eq!(CityObjectLabel::from_u8(7), CityObjectLabel::Roads);
    }

    #[test]
    fn test_unknown_label_decodes_to_none() {
        assert_eq!(CityObjectLabel::from_u8(200), CityObjectLabel::None);
        assert!(CityObjectLabel::from_u8(23).is_unlabelled());
    }

    #[test]
    fn test_junction_display() {
        assert_eq!(JunctionId(42).to_string(), "junction#42");
        assert_eq!(JunctionId(-3).get(), -3);
    }
}
