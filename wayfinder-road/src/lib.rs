//! # Road and arc attribute schemas
//!
//! Two distinct packed 32-bit attribute words exist in the toolkit:
//!
//! - the **arc attribute word** ([`ArcAttributes`]) carried by every directed
//!   edge of the routing graph, and
//! - the **road-type word** ([`RoadTypeFlags`]) carried by road objects in the
//!   map data store.
//!
//! They are deliberately separate layouts and must not be conflated; the
//! [`object`] module provides the conversion between them.

mod arc;
mod object;

use enumset::{enum_set, EnumSet, EnumSetType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use arc::ArcAttributes;
pub use object::{ObjectAccess, RoadType, RoadTypeFlags};

/// The number of arc road types representable in the 5-bit field.
pub const ARC_ROAD_TYPE_COUNT: usize = 32;

/// The number of gradient bins representable in the 3-bit field.
pub const GRADIENT_COUNT: usize = 8;

/// Road classes used on arcs of the routing graph.
///
/// The discriminants and the external names returned by
/// [`ArcRoadType::name`] are a stable vocabulary: route and profile
/// serialization depends on them, so they must never be renumbered.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ArcRoadType {
    Motorway = 0,
    MotorwayLink = 1,
    Trunk = 2,
    TrunkLink = 3,
    Primary = 4,
    PrimaryLink = 5,
    Secondary = 6,
    SecondaryLink = 7,
    Tertiary = 8,
    Unclassified = 9,
    Residential = 10,
    Track = 11,
    ServiceRoad = 12,
    PedestrianRoad = 13,
    VehicularFerry = 14,
    PassengerFerry = 15,
    LivingStreet = 16,
    Cycleway = 17,
    Path = 18,
    Footway = 19,
    Bridleway = 20,
    Steps = 21,
    Unknown = 22,
    Unpaved = 23,
    Other0 = 24,
    Other1 = 25,
    Other2 = 26,
    Other3 = 27,
    Other4 = 28,
    Other5 = 29,
    Other6 = 30,
    Other7 = 31,
}

/// The stable external names, indexed by discriminant.
const ARC_ROAD_TYPE_NAMES: [&str; ARC_ROAD_TYPE_COUNT] = [
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "unclassified",
    "residential",
    "track",
    "service_road",
    "pedestrian_road",
    "vehicular_ferry",
    "passenger_ferry",
    "living_street",
    "cycleway",
    "path",
    "footway",
    "bridleway",
    "steps",
    "unknown_road_type",
    "unpaved_road",
    "other_road_type_0",
    "other_road_type_1",
    "other_road_type_2",
    "other_road_type_3",
    "other_road_type_4",
    "other_road_type_5",
    "other_road_type_6",
    "other_road_type_7",
];

impl ArcRoadType {
    pub(crate) const fn into_bits(self) -> u32 {
        self as _
    }

    pub(crate) const fn from_bits(value: u32) -> Self {
        // Total over the 5-bit field; every pattern names a road type.
        match value {
            0 => Self::Motorway,
            1 => Self::MotorwayLink,
            2 => Self::Trunk,
            3 => Self::TrunkLink,
            4 => Self::Primary,
            5 => Self::PrimaryLink,
            6 => Self::Secondary,
            7 => Self::SecondaryLink,
            8 => Self::Tertiary,
            9 => Self::Unclassified,
            10 => Self::Residential,
            11 => Self::Track,
            12 => Self::ServiceRoad,
            13 => Self::PedestrianRoad,
            14 => Self::VehicularFerry,
            15 => Self::PassengerFerry,
            16 => Self::LivingStreet,
            17 => Self::Cycleway,
            18 => Self::Path,
            19 => Self::Footway,
            20 => Self::Bridleway,
            21 => Self::Steps,
            22 => Self::Unknown,
            23 => Self::Unpaved,
            24 => Self::Other0,
            25 => Self::Other1,
            26 => Self::Other2,
            27 => Self::Other3,
            28 => Self::Other4,
            29 => Self::Other5,
            30 => Self::Other6,
            _ => Self::Other7,
        }
    }

    /// The index of this road type in per-road-type arrays (0..31).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The road type with the given array index; indexes wrap modulo 32.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self::from_bits((index % ARC_ROAD_TYPE_COUNT) as u32)
    }

    /// The stable external name, e.g. `"motorway_link"`.
    #[inline]
    pub fn name(self) -> &'static str {
        ARC_ROAD_TYPE_NAMES[self.index()]
    }

    /// Looks a road type up by its stable external name.
    pub fn from_name(name: &str) -> Option<Self> {
        ARC_ROAD_TYPE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::from_bits(i as u32))
    }

    /// Is this a link (ramp) variant of its class?
    #[inline]
    pub const fn is_link(self) -> bool {
        matches!(
            self,
            Self::MotorwayLink | Self::TrunkLink | Self::PrimaryLink | Self::SecondaryLink
        )
    }

    /// Relative importance of the road class; smaller is more major.
    ///
    /// Link roads rank with the class they serve, so leaving a motorway via
    /// its ramp does not count as a turn onto a lower-class road until the
    /// ramp ends.
    pub const fn hierarchy(self) -> u8 {
        match self {
            Self::Motorway | Self::MotorwayLink => 0,
            Self::Trunk | Self::TrunkLink => 1,
            Self::Primary | Self::PrimaryLink => 2,
            Self::Secondary | Self::SecondaryLink => 3,
            Self::Tertiary => 4,
            Self::Unclassified | Self::Unknown => 5,
            Self::Residential | Self::LivingStreet => 6,
            Self::ServiceRoad => 7,
            Self::Track | Self::Unpaved => 8,
            Self::VehicularFerry | Self::PassengerFerry => 9,
            Self::PedestrianRoad | Self::Cycleway | Self::Path => 10,
            Self::Footway | Self::Bridleway | Self::Steps => 11,
            Self::Other0
            | Self::Other1
            | Self::Other2
            | Self::Other3
            | Self::Other4
            | Self::Other5
            | Self::Other6
            | Self::Other7 => 12,
        }
    }
}

/// Average gradient of an arc, binned by direction and magnitude.
///
/// The external names (`"up0"` … `"down3"`) index the gradient speed and
/// bonus arrays in serialized profiles and are stable.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Gradient {
    Up0 = 0,
    Up1 = 1,
    Up2 = 2,
    Up3 = 3,
    Down0 = 4,
    Down1 = 5,
    Down2 = 6,
    Down3 = 7,
}

const GRADIENT_NAMES: [&str; GRADIENT_COUNT] =
    ["up0", "up1", "up2", "up3", "down0", "down1", "down2", "down3"];

impl Gradient {
    pub(crate) const fn into_bits(self) -> u32 {
        self as _
    }

    pub(crate) const fn from_bits(value: u32) -> Self {
        match value {
            0 => Self::Up0,
            1 => Self::Up1,
            2 => Self::Up2,
            3 => Self::Up3,
            4 => Self::Down0,
            5 => Self::Down1,
            6 => Self::Down2,
            _ => Self::Down3,
        }
    }

    /// The index of this gradient bin in per-gradient arrays (0..7).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The gradient bin with the given array index; indexes wrap modulo 8.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self::from_bits((index % GRADIENT_COUNT) as u32)
    }

    /// The top bit of the field is the direction flag.
    #[inline]
    pub const fn is_downhill(self) -> bool {
        (self as u8) & 0x4 != 0
    }

    /// Gradient magnitude bin, 0..3.
    #[inline]
    pub const fn magnitude(self) -> u8 {
        (self as u8) & 0x3
    }

    /// The stable external name, e.g. `"down2"`.
    #[inline]
    pub fn name(self) -> &'static str {
        GRADIENT_NAMES[self.index()]
    }

    /// Looks a gradient bin up by its stable external name.
    pub fn from_name(name: &str) -> Option<Self> {
        GRADIENT_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::from_bits(i as u32))
    }
}

/// Direction and driving side of a road or arc.
///
/// At most one of the one-way variants can be in effect, and roundabout arcs
/// are always one-way along their defined direction; both invariants are
/// structural here because the two bits form a single field.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum RoadDirection {
    /// Two-way traffic, driving on the right.
    #[default]
    DriveOnRight = 0,
    /// One-way in the direction in which the geometry is defined.
    OneWayForward = 1,
    /// One-way in the reverse direction to the geometry.
    OneWayBackward = 2,
    /// Two-way traffic, driving on the left.
    DriveOnLeft = 3,
}

impl RoadDirection {
    pub(crate) const fn into_bits(self) -> u32 {
        self as _
    }

    pub(crate) const fn from_bits(value: u32) -> Self {
        match value {
            0 => Self::DriveOnRight,
            1 => Self::OneWayForward,
            2 => Self::OneWayBackward,
            _ => Self::DriveOnLeft,
        }
    }

    #[inline]
    pub const fn is_one_way(self) -> bool {
        matches!(self, Self::OneWayForward | Self::OneWayBackward)
    }

    /// Driving side for two-way traffic; one-way roads default to right.
    #[inline]
    pub const fn drive_on_left(self) -> bool {
        matches!(self, Self::DriveOnLeft)
    }
}

/// Per-vehicle-class access restriction flags on an arc.
///
/// Each flag *forbids* access to the named class. This is stored as a bit
/// field; only the low TWELVE bits of the `u16` representation are used by
/// [`ArcAttributes`].
#[derive(Debug, EnumSetType, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[enumset(repr = "u16")]
pub enum VehicleAccess {
    /// The arc goes the wrong way along a one-way road. Pedestrians and
    /// emergency vehicles may still use it.
    WrongWay,
    Bicycle,
    Motorcycle,
    Car,
    HighOccupancy,
    LightGoods,
    HeavyGoods,
    Bus,
    Taxi,
    Pedestrian,
    Emergency,
    /// Supplementary restrictions apply: weight, dimensions, or hazardous
    /// materials. Set if and only if such details are present.
    Other,
}

/// Every restriction flag except [`VehicleAccess::Other`].
pub const ACCESS_RESTRICTION_MASK: EnumSet<VehicleAccess> = enum_set!(
    VehicleAccess::WrongWay
        | VehicleAccess::Bicycle
        | VehicleAccess::Motorcycle
        | VehicleAccess::Car
        | VehicleAccess::HighOccupancy
        | VehicleAccess::LightGoods
        | VehicleAccess::HeavyGoods
        | VehicleAccess::Bus
        | VehicleAccess::Taxi
        | VehicleAccess::Pedestrian
        | VehicleAccess::Emergency
);

/// Restriction set closing an arc to everything but bicycles (and the
/// wrong-way exemption).
pub const BICYCLE_ACCESS_ONLY: EnumSet<VehicleAccess> = enum_set!(
    VehicleAccess::Motorcycle
        | VehicleAccess::Car
        | VehicleAccess::HighOccupancy
        | VehicleAccess::LightGoods
        | VehicleAccess::HeavyGoods
        | VehicleAccess::Bus
        | VehicleAccess::Taxi
        | VehicleAccess::Pedestrian
        | VehicleAccess::Emergency
);

/// Restriction set affecting all motor vehicles.
pub const ALL_MOTOR_VEHICLES: EnumSet<VehicleAccess> = enum_set!(
    VehicleAccess::Motorcycle
        | VehicleAccess::Car
        | VehicleAccess::HighOccupancy
        | VehicleAccess::LightGoods
        | VehicleAccess::HeavyGoods
        | VehicleAccess::Bus
        | VehicleAccess::Taxi
        | VehicleAccess::Emergency
);

/// Restriction set affecting all vehicles, leaving only pedestrian access.
pub const ALL_VEHICLES: EnumSet<VehicleAccess> = enum_set!(
    VehicleAccess::Bicycle
        | VehicleAccess::Motorcycle
        | VehicleAccess::Car
        | VehicleAccess::HighOccupancy
        | VehicleAccess::LightGoods
        | VehicleAccess::HeavyGoods
        | VehicleAccess::Bus
        | VehicleAccess::Taxi
        | VehicleAccess::Emergency
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn road_type_names_are_stable() {
        assert_eq!(ArcRoadType::Motorway.name(), "motorway");
        assert_eq!(ArcRoadType::ServiceRoad.name(), "service_road");
        assert_eq!(ArcRoadType::Other7.name(), "other_road_type_7");
        for i in 0..ARC_ROAD_TYPE_COUNT {
            let rt = ArcRoadType::from_bits(i as u32);
            assert_eq!(rt.index(), i);
            assert_eq!(ArcRoadType::from_name(rt.name()), Some(rt));
        }
    }

    #[test]
    fn gradient_names_are_stable() {
        assert_eq!(Gradient::Up0.name(), "up0");
        assert_eq!(Gradient::Down3.name(), "down3");
        for i in 0..GRADIENT_COUNT {
            let g = Gradient::from_bits(i as u32);
            assert_eq!(g.index(), i);
            assert_eq!(Gradient::from_name(g.name()), Some(g));
        }
        assert!(Gradient::Down1.is_downhill());
        assert!(!Gradient::Up3.is_downhill());
        assert_eq!(Gradient::Down2.magnitude(), 2);
    }

    #[test]
    fn access_mask_excludes_other() {
        assert_eq!(ACCESS_RESTRICTION_MASK.len(), 11);
        assert!(!ACCESS_RESTRICTION_MASK.contains(VehicleAccess::Other));
        assert_eq!(
            ALL_MOTOR_VEHICLES,
            ACCESS_RESTRICTION_MASK
                - VehicleAccess::WrongWay
                - VehicleAccess::Pedestrian
                - VehicleAccess::Bicycle
        );
        assert_eq!(
            ALL_VEHICLES,
            ACCESS_RESTRICTION_MASK - VehicleAccess::WrongWay - VehicleAccess::Pedestrian
        );
    }

    #[test]
    fn hierarchy_orders_major_above_minor() {
        assert!(ArcRoadType::Motorway.hierarchy() < ArcRoadType::Primary.hierarchy());
        assert!(ArcRoadType::Primary.hierarchy() < ArcRoadType::Residential.hierarchy());
        assert!(ArcRoadType::Residential.hierarchy() < ArcRoadType::Footway.hierarchy());
        assert_eq!(
            ArcRoadType::Motorway.hierarchy(),
            ArcRoadType::MotorwayLink.hierarchy()
        );
    }
}
