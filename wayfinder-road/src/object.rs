use crate::{ArcAttributes, ArcRoadType, RoadDirection, VehicleAccess};
use bitfield_struct::bitfield;
use enumset::{EnumSet, EnumSetType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard types for road objects in the map data store.
///
/// The discriminant packs the 6-bit road-type field of [`RoadTypeFlags`]:
/// bit 0 marks a link (ramp), bit 1 a lower-grade distinction within the
/// major class, and bits 2..6 the major class itself.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum RoadType {
    /// Roads of unknown type.
    #[default]
    UnknownMajor = 0,
    /// Primary road with limited access (motorway, freeway, etc.).
    Motorway = 0x04,
    /// Access ramp or link to a motorway.
    MotorwayLink = 0x05,
    /// Primary road without limited access: UK trunk road.
    Trunk = 0x08,
    /// Access ramp or link to a trunk road.
    TrunkLink = 0x09,
    /// Primary road: UK 'A' road.
    Primary = 0x0A,
    /// Access ramp or link to a primary road.
    PrimaryLink = 0x0B,
    /// Secondary road: UK 'B' road.
    Secondary = 0x0C,
    /// Access ramp or link to a secondary road.
    SecondaryLink = 0x0D,
    /// Tertiary road: one level above minor and residential roads.
    Tertiary = 0x0E,
    /// Access ramp or link to a tertiary road.
    TertiaryLink = 0x0F,
    /// Local road or town or city street.
    Minor = 0x10,
    /// Narrow road or street with residential housing.
    Residential = 0x12,
    /// Byway: road or track open to motor vehicles.
    Track = 0x14,
    /// Access ramp to a limited access road.
    AccessRamp = 0x18,
    /// Service road or access road.
    Service = 0x1C,
    /// Vehicular ferry route.
    VehicularFerry = 0x20,
    /// Passenger-only ferry route.
    PassengerFerry = 0x24,
    /// Path or walkway for pedestrians.
    Path = 0x28,
    /// Stairway or escalator for pedestrians.
    Stairway = 0x2C,
    /// Cycle path.
    CyclePath = 0x30,
    /// Footpath.
    FootPath = 0x34,
    Other0 = 0x38,
    Other1 = 0x3A,
    Other2 = 0x39,
    Other3 = 0x3B,
    Other4 = 0x3C,
    Other5 = 0x3E,
    Other6 = 0x3D,
    Other7 = 0x3F,
}

impl RoadType {
    const fn into_bits(self) -> u32 {
        self as _
    }

    const fn from_bits(value: u32) -> Self {
        // Patterns with no named road type collapse to UnknownMajor.
        match value {
            0x04 => Self::Motorway,
            0x05 => Self::MotorwayLink,
            0x08 => Self::Trunk,
            0x09 => Self::TrunkLink,
            0x0A => Self::Primary,
            0x0B => Self::PrimaryLink,
            0x0C => Self::Secondary,
            0x0D => Self::SecondaryLink,
            0x0E => Self::Tertiary,
            0x0F => Self::TertiaryLink,
            0x10 => Self::Minor,
            0x12 => Self::Residential,
            0x14 => Self::Track,
            0x18 => Self::AccessRamp,
            0x1C => Self::Service,
            0x20 => Self::VehicularFerry,
            0x24 => Self::PassengerFerry,
            0x28 => Self::Path,
            0x2C => Self::Stairway,
            0x30 => Self::CyclePath,
            0x34 => Self::FootPath,
            0x38 => Self::Other0,
            0x3A => Self::Other1,
            0x39 => Self::Other2,
            0x3B => Self::Other3,
            0x3C => Self::Other4,
            0x3E => Self::Other5,
            0x3D => Self::Other6,
            0x3F => Self::Other7,
            _ => Self::UnknownMajor,
        }
    }

    /// Is this a link (ramp) sub-type of its major class?
    #[inline]
    pub const fn is_link(self) -> bool {
        (self as u8) & 0x01 != 0
    }

    /// The corresponding arc road type used on the routing graph.
    ///
    /// Road types with no direct arc counterpart map onto the nearest arc
    /// class; [`ArcRoadType::to_road_type`] inverts this mapping exactly for
    /// the directly representable values.
    pub const fn to_arc_road_type(self) -> ArcRoadType {
        match self {
            Self::UnknownMajor => ArcRoadType::Unknown,
            Self::Motorway => ArcRoadType::Motorway,
            Self::MotorwayLink | Self::AccessRamp => ArcRoadType::MotorwayLink,
            Self::Trunk => ArcRoadType::Trunk,
            Self::TrunkLink => ArcRoadType::TrunkLink,
            Self::Primary => ArcRoadType::Primary,
            Self::PrimaryLink => ArcRoadType::PrimaryLink,
            Self::Secondary => ArcRoadType::Secondary,
            Self::SecondaryLink => ArcRoadType::SecondaryLink,
            Self::Tertiary | Self::TertiaryLink => ArcRoadType::Tertiary,
            Self::Minor => ArcRoadType::Unclassified,
            Self::Residential => ArcRoadType::Residential,
            Self::Track => ArcRoadType::Track,
            Self::Service => ArcRoadType::ServiceRoad,
            Self::VehicularFerry => ArcRoadType::VehicularFerry,
            Self::PassengerFerry => ArcRoadType::PassengerFerry,
            Self::Path => ArcRoadType::PedestrianRoad,
            Self::Stairway => ArcRoadType::Steps,
            Self::CyclePath => ArcRoadType::Cycleway,
            Self::FootPath => ArcRoadType::Footway,
            Self::Other0 => ArcRoadType::Other0,
            Self::Other1 => ArcRoadType::Other1,
            Self::Other2 => ArcRoadType::Other2,
            Self::Other3 => ArcRoadType::Other3,
            Self::Other4 => ArcRoadType::Other4,
            Self::Other5 => ArcRoadType::Other5,
            Self::Other6 => ArcRoadType::Other6,
            Self::Other7 => ArcRoadType::Other7,
        }
    }
}

impl ArcRoadType {
    /// The road-object type best describing this arc class, inverting
    /// [`RoadType::to_arc_road_type`] for directly representable values.
    pub const fn to_road_type(self) -> RoadType {
        match self {
            Self::Motorway => RoadType::Motorway,
            Self::MotorwayLink => RoadType::MotorwayLink,
            Self::Trunk => RoadType::Trunk,
            Self::TrunkLink => RoadType::TrunkLink,
            Self::Primary => RoadType::Primary,
            Self::PrimaryLink => RoadType::PrimaryLink,
            Self::Secondary => RoadType::Secondary,
            Self::SecondaryLink => RoadType::SecondaryLink,
            Self::Tertiary => RoadType::Tertiary,
            Self::Unclassified => RoadType::Minor,
            Self::Residential | Self::LivingStreet => RoadType::Residential,
            Self::Track | Self::Unpaved => RoadType::Track,
            Self::ServiceRoad => RoadType::Service,
            Self::PedestrianRoad | Self::Path | Self::Bridleway => RoadType::Path,
            Self::VehicularFerry => RoadType::VehicularFerry,
            Self::PassengerFerry => RoadType::PassengerFerry,
            Self::Cycleway => RoadType::CyclePath,
            Self::Footway => RoadType::FootPath,
            Self::Steps => RoadType::Stairway,
            Self::Unknown => RoadType::UnknownMajor,
            Self::Other0 => RoadType::Other0,
            Self::Other1 => RoadType::Other1,
            Self::Other2 => RoadType::Other2,
            Self::Other3 => RoadType::Other3,
            Self::Other4 => RoadType::Other4,
            Self::Other5 => RoadType::Other5,
            Self::Other6 => RoadType::Other6,
            Self::Other7 => RoadType::Other7,
        }
    }
}

/// Access flags on road objects. Each flag forbids access to the named class.
///
/// These occupy the high bits of the road-type word, which non-road layers
/// reuse for other purposes, so the set is wider than the arc-side
/// [`VehicleAccess`] flags.
#[derive(Debug, EnumSetType, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[enumset(repr = "u16")]
pub enum ObjectAccess {
    Bicycle,
    Motorcycle,
    MotorCar,
    HighOccupancy,
    Goods,
    HeavyGoods,
    Bus,
    Taxi,
    Pedestrian,
    Agricultural,
    Forestry,
    Emergency,
    /// Weight, dimension, or hazardous-materials restrictions apply.
    Other,
    Wheelchair,
    Disabled,
}

/// The packed road-type word carried by road objects in the map data store.
///
/// Layout, least significant bit first:
///
/// ```text
/// bit   0      tunnel
/// bit   1      toll
/// bit   2      roundabout
/// bit   3      a restricted turn exists at this road
/// bits  4..6   direction and driving side
/// bits  6..12  road type (link, lower-grade, major class)
/// bits 12..16  level as a signed nybble (0 = surface)
/// bit   16     bridge
/// bits 17..32  access flags
/// ```
///
/// Levels above zero are not necessarily bridges and levels below zero are
/// not necessarily tunnels; the dedicated flags mark those.
#[bitfield(u32)]
#[derive(PartialEq, Eq, Hash)]
pub struct RoadTypeFlags {
    #[bits(1)]
    pub tunnel: bool,
    #[bits(1)]
    pub toll: bool,
    #[bits(1)]
    pub roundabout: bool,
    #[bits(1)]
    pub restricted_turn: bool,
    #[bits(2)]
    pub direction: RoadDirection,
    #[bits(6)]
    pub road_type: RoadType,
    #[bits(4)]
    level_bits: u8,
    #[bits(1)]
    pub bridge: bool,
    #[bits(15)]
    access_bits: u16,
}

impl RoadTypeFlags {
    /// The level: 0 = surface, positive = above surface, negative = below.
    #[inline]
    pub const fn level(&self) -> i8 {
        let v = self.level_bits() as i8;
        if v >= 8 { v - 16 } else { v }
    }

    /// Sets the level, clamping to the representable range -8..=7.
    pub fn set_level(&mut self, level: i8) {
        let clamped = level.clamp(-8, 7);
        self.set_level_bits((clamped & 0x0F) as u8);
    }

    /// Builder-style variant of [`RoadTypeFlags::set_level`].
    pub fn with_level(mut self, level: i8) -> Self {
        self.set_level(level);
        self
    }

    /// The access flags as a typed set.
    #[inline]
    pub fn access(&self) -> EnumSet<ObjectAccess> {
        // SAFETY: The field is 15 bits wide, so every representation is a
        // valid set of the 15 flags.
        unsafe { EnumSet::from_repr_unchecked(self.access_bits()) }
    }

    /// Replaces the access flags.
    #[inline]
    pub fn set_access(&mut self, access: EnumSet<ObjectAccess>) {
        self.set_access_bits(access.as_repr());
    }

    /// Builder-style variant of [`RoadTypeFlags::set_access`].
    #[inline]
    pub fn with_access(self, access: EnumSet<ObjectAccess>) -> Self {
        self.with_access_bits(access.as_repr())
    }

    /// Is the road one-way? Exactly one of the two one-way states must be in
    /// effect for this to hold.
    #[inline]
    pub fn is_one_way(&self) -> bool {
        self.direction().is_one_way()
    }

    /// Derives the routing-graph attribute word for an arc following this
    /// road in its defined direction.
    ///
    /// The object word carries neither speed limit nor gradient, so those
    /// fields are left unknown. Roundabout roads are forced one-way along
    /// their defined direction. Access flags with no arc counterpart
    /// (agricultural, forestry, wheelchair, disabled) are dropped.
    pub fn to_arc_attributes(&self) -> ArcAttributes {
        let direction = if self.roundabout() && !self.direction().is_one_way() {
            RoadDirection::OneWayForward
        } else {
            self.direction()
        };
        ArcAttributes::new()
            .with_road_type(self.road_type().to_arc_road_type())
            .with_direction(direction)
            .with_roundabout(self.roundabout())
            .with_toll(self.toll())
            .with_access(object_access_to_arc(self.access()))
    }
}

/// Maps object access flags onto their arc-side counterparts.
fn object_access_to_arc(access: EnumSet<ObjectAccess>) -> EnumSet<VehicleAccess> {
    let mut out = EnumSet::empty();
    for flag in access {
        let mapped = match flag {
            ObjectAccess::Bicycle => Some(VehicleAccess::Bicycle),
            ObjectAccess::Motorcycle => Some(VehicleAccess::Motorcycle),
            ObjectAccess::MotorCar => Some(VehicleAccess::Car),
            ObjectAccess::HighOccupancy => Some(VehicleAccess::HighOccupancy),
            ObjectAccess::Goods => Some(VehicleAccess::LightGoods),
            ObjectAccess::HeavyGoods => Some(VehicleAccess::HeavyGoods),
            ObjectAccess::Bus => Some(VehicleAccess::Bus),
            ObjectAccess::Taxi => Some(VehicleAccess::Taxi),
            ObjectAccess::Pedestrian => Some(VehicleAccess::Pedestrian),
            ObjectAccess::Emergency => Some(VehicleAccess::Emergency),
            ObjectAccess::Other => Some(VehicleAccess::Other),
            ObjectAccess::Agricultural
            | ObjectAccess::Forestry
            | ObjectAccess::Wheelchair
            | ObjectAccess::Disabled => None,
        };
        if let Some(m) = mapped {
            out |= m;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Arc road types whose object mapping inverts exactly.
    const REPRESENTABLE: [ArcRoadType; 26] = [
        ArcRoadType::Motorway,
        ArcRoadType::MotorwayLink,
        ArcRoadType::Trunk,
        ArcRoadType::TrunkLink,
        ArcRoadType::Primary,
        ArcRoadType::PrimaryLink,
        ArcRoadType::Secondary,
        ArcRoadType::SecondaryLink,
        ArcRoadType::Tertiary,
        ArcRoadType::Unclassified,
        ArcRoadType::Residential,
        ArcRoadType::Track,
        ArcRoadType::ServiceRoad,
        ArcRoadType::PedestrianRoad,
        ArcRoadType::VehicularFerry,
        ArcRoadType::PassengerFerry,
        ArcRoadType::Cycleway,
        ArcRoadType::Footway,
        ArcRoadType::Steps,
        ArcRoadType::Unknown,
        ArcRoadType::Other0,
        ArcRoadType::Other1,
        ArcRoadType::Other2,
        ArcRoadType::Other3,
        ArcRoadType::Other4,
        ArcRoadType::Other5,
    ];

    #[test]
    fn duality_round_trips_for_representable_values() {
        for arc in REPRESENTABLE {
            assert_eq!(arc.to_road_type().to_arc_road_type(), arc, "{arc:?}");
        }
    }

    #[test]
    fn one_way_is_xor_of_direction_bits() {
        let two_way = RoadTypeFlags::new().with_direction(RoadDirection::DriveOnRight);
        let left = RoadTypeFlags::new().with_direction(RoadDirection::DriveOnLeft);
        let forward = RoadTypeFlags::new().with_direction(RoadDirection::OneWayForward);
        let backward = RoadTypeFlags::new().with_direction(RoadDirection::OneWayBackward);
        assert!(!two_way.is_one_way());
        assert!(!left.is_one_way());
        assert!(forward.is_one_way());
        assert!(backward.is_one_way());
    }

    #[test]
    fn level_is_a_signed_nybble() {
        let mut flags = RoadTypeFlags::new();
        assert_eq!(flags.level(), 0);
        flags.set_level(1);
        assert_eq!(flags.level(), 1);
        flags.set_level(-2);
        assert_eq!(flags.level(), -2);
        flags.set_level(-100);
        assert_eq!(flags.level(), -8);
    }

    #[test]
    fn arc_derivation_forces_roundabouts_one_way() {
        let flags = RoadTypeFlags::new()
            .with_road_type(RoadType::Minor)
            .with_roundabout(true)
            .with_direction(RoadDirection::DriveOnRight);
        let arc = flags.to_arc_attributes();
        assert!(arc.roundabout());
        assert_eq!(arc.direction(), RoadDirection::OneWayForward);
        assert_eq!(arc.road_type(), ArcRoadType::Unclassified);
    }

    #[test]
    fn arc_derivation_maps_access_flags() {
        let flags = RoadTypeFlags::new()
            .with_road_type(RoadType::Track)
            .with_access(ObjectAccess::MotorCar | ObjectAccess::HeavyGoods | ObjectAccess::Forestry);
        let arc = flags.to_arc_attributes();
        assert_eq!(
            arc.access(),
            VehicleAccess::Car | VehicleAccess::HeavyGoods
        );
    }
}
