use crate::{ArcRoadType, Gradient, RoadDirection, VehicleAccess};
use bitfield_struct::bitfield;
use enumset::EnumSet;

/// The packed attribute word carried by every arc of the routing graph.
///
/// Layout, least significant bit first:
///
/// ```text
/// bits  0..5   road type
/// bits  5..8   gradient (top bit of the field is the direction flag)
/// bits  8..10  direction and driving side
/// bit   10     roundabout
/// bit   11     toll
/// bits 12..20  speed limit in kph (0 = unknown)
/// bits 20..32  access restriction flags
/// ```
#[bitfield(u32)]
#[derive(PartialEq, Eq, Hash)]
pub struct ArcAttributes {
    #[bits(5)]
    pub road_type: ArcRoadType,
    #[bits(3)]
    pub gradient: Gradient,
    #[bits(2)]
    pub direction: RoadDirection,
    #[bits(1)]
    pub roundabout: bool,
    #[bits(1)]
    pub toll: bool,
    #[bits(8)]
    pub speed_limit: u8,
    #[bits(12)]
    access_bits: u16,
}

impl ArcAttributes {
    /// The access restriction flags as a typed set.
    #[inline]
    pub fn access(&self) -> EnumSet<VehicleAccess> {
        // SAFETY: The field is 12 bits wide, so every representation is a
        // valid set of the 12 flags.
        unsafe { EnumSet::from_repr_unchecked(self.access_bits()) }
    }

    /// Replaces the access restriction flags.
    #[inline]
    pub fn set_access(&mut self, access: EnumSet<VehicleAccess>) {
        self.set_access_bits(access.as_repr());
    }

    /// Builder-style variant of [`ArcAttributes::set_access`].
    #[inline]
    pub fn with_access(self, access: EnumSet<VehicleAccess>) -> Self {
        self.with_access_bits(access.as_repr())
    }

    /// Is the arc one-way (in either direction)?
    #[inline]
    pub fn is_one_way(&self) -> bool {
        self.direction().is_one_way()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ALL_MOTOR_VEHICLES;
    use proptest::prelude::*;

    #[test]
    fn word_round_trips_through_accessors() {
        let attr = ArcAttributes::new()
            .with_road_type(ArcRoadType::Secondary)
            .with_gradient(Gradient::Down2)
            .with_direction(RoadDirection::OneWayForward)
            .with_roundabout(true)
            .with_toll(true)
            .with_speed_limit(70)
            .with_access(ALL_MOTOR_VEHICLES);

        assert_eq!(attr.road_type(), ArcRoadType::Secondary);
        assert_eq!(attr.gradient(), Gradient::Down2);
        assert_eq!(attr.direction(), RoadDirection::OneWayForward);
        assert!(attr.roundabout());
        assert!(attr.toll());
        assert_eq!(attr.speed_limit(), 70);
        assert_eq!(attr.access(), ALL_MOTOR_VEHICLES);
        assert!(attr.is_one_way());

        let reparsed = ArcAttributes::from(u32::from(attr));
        assert_eq!(reparsed, attr);
    }

    #[test]
    fn default_word_is_empty() {
        let attr = ArcAttributes::new();
        assert_eq!(attr.road_type(), ArcRoadType::Motorway);
        assert_eq!(attr.speed_limit(), 0);
        assert!(attr.access().is_empty());
        assert!(!attr.is_one_way());
    }

    proptest! {
        #[test]
        fn any_word_reparses_identically(raw in any::<u32>()) {
            let attr = ArcAttributes::from(raw);
            let rebuilt = ArcAttributes::new()
                .with_road_type(attr.road_type())
                .with_gradient(attr.gradient())
                .with_direction(attr.direction())
                .with_roundabout(attr.roundabout())
                .with_toll(attr.toll())
                .with_speed_limit(attr.speed_limit())
                .with_access(attr.access());
            prop_assert_eq!(rebuilt, attr);
        }
    }
}
