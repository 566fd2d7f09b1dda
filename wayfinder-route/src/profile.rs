use enumset::EnumSet;
use wayfinder_road::{
    ArcAttributes, ArcRoadType, VehicleAccess, ARC_ROAD_TYPE_COUNT, GRADIENT_COUNT,
};

/// A vehicle type used in routing: access flags plus optional physical
/// dimensions.
///
/// Arcs whose restriction flags intersect `access` (less any per-road-type
/// override in the profile) will not be taken.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleType {
    /// Restriction flags that stop this vehicle.
    pub access: EnumSet<VehicleAccess>,
    /// Weight in metric tons. Zero or less means unknown.
    pub weight: f64,
    /// Axle load in metric tons. Zero or less means unknown.
    pub axle_load: f64,
    /// Double axle load in metric tons. Zero or less means unknown.
    pub double_axle_load: f64,
    /// Triple axle load in metric tons. Zero or less means unknown.
    pub triple_axle_load: f64,
    /// Height in meters. Zero or less means unknown.
    pub height: f64,
    /// Width in meters. Zero or less means unknown.
    pub width: f64,
    /// Length in meters. Zero or less means unknown.
    pub length: f64,
    /// True if the vehicle is carrying hazardous materials.
    pub hazmat: bool,
}

impl Default for VehicleType {
    fn default() -> Self {
        Self {
            access: VehicleAccess::Car | VehicleAccess::WrongWay,
            weight: 0.0,
            axle_load: 0.0,
            double_axle_load: 0.0,
            triple_axle_load: 0.0,
            height: 0.0,
            width: 0.0,
            length: 0.0,
            hazmat: false,
        }
    }
}

impl VehicleType {
    /// Ensures the [`VehicleAccess::Other`] flag is set if and only if
    /// dimensional details are given, and clamps negative dimensions to zero.
    pub fn normalize(&mut self) {
        self.weight = self.weight.max(0.0);
        self.axle_load = self.axle_load.max(0.0);
        self.double_axle_load = self.double_axle_load.max(0.0);
        self.triple_axle_load = self.triple_axle_load.max(0.0);
        self.height = self.height.max(0.0);
        self.width = self.width.max(0.0);
        self.length = self.length.max(0.0);

        let has_details = self.weight > 0.0
            || self.axle_load > 0.0
            || self.double_axle_load > 0.0
            || self.triple_axle_load > 0.0
            || self.height > 0.0
            || self.width > 0.0
            || self.length > 0.0
            || self.hazmat;
        if has_details {
            self.access |= VehicleAccess::Other;
        } else {
            self.access -= VehicleAccess::Other;
        }
    }
}

/// Frequently used profile presets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileType {
    /// Private car navigation.
    #[default]
    Car,
    /// Walking.
    Walk,
    /// Cycling.
    Cycle,
    /// Walking, preferring off-road paths.
    Hike,
}

/// How a road type may be used under a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usability {
    /// Usable anywhere on a route.
    Normal,
    /// Usable only as the first or last segment of a route: the base speed
    /// is positive but the bonus cancels it exactly, the pattern used for
    /// residential or farm tracks that only serve origins and destinations.
    EndpointOnly,
    /// Never usable.
    Unusable,
}

/// A routing profile: the complete parameter bundle controlling cost and
/// legality during route planning.
///
/// Immutable while a route is being planned; freely mutable between routes.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProfile {
    /// The vehicle type, defined by access flags, dimensions, and weight.
    pub vehicle: VehicleType,
    /// Base speeds along roads in kph, indexed by arc road type.
    pub speed: [f64; ARC_ROAD_TYPE_COUNT],
    /// Bonuses or penalties in notional kph added to road types to make them
    /// more or less likely to be used.
    pub bonus: [f64; ARC_ROAD_TYPE_COUNT],
    /// Per-road-type masks letting the profile defeat specific access
    /// restrictions; for example, allowing heavy goods vehicles along
    /// tracks even where motor vehicles are otherwise forbidden.
    pub restriction_override: [EnumSet<VehicleAccess>; ARC_ROAD_TYPE_COUNT],
    /// Estimated seconds for any turn at a junction that is neither slight
    /// nor straight ahead.
    pub turn_time: i32,
    /// Estimated seconds for a U-turn: a turn within 11.75 degrees of a
    /// half circle.
    pub u_turn_time: i32,
    /// Estimated seconds for a turn across oncoming traffic from the right
    /// of way onto a lower-rank road. Doubled when joining the right of way
    /// from the lower-rank road.
    pub cross_traffic_turn_time: i32,
    /// Estimated delay in seconds caused by traffic lights.
    pub traffic_light_time: i32,
    /// If true, ignore speeds, bonuses, and turn times and minimize
    /// distance instead of time. Legality rules are unaffected.
    pub shortest: bool,
    /// Penalty applied to toll roads, from 0 (none) to 1 (toll roads are
    /// forbidden). Out-of-range values are clamped when used.
    pub toll_penalty: f64,
    /// Speeds in kph added to arcs in each gradient bin. Intended for
    /// cycling and walking profiles where speed varies with slope more than
    /// with road class.
    pub gradient_speed: [f64; GRADIENT_COUNT],
    /// Bonuses applied to arcs in each gradient bin.
    pub gradient_bonus: [f64; GRADIENT_COUNT],
    /// Bitmask of arc road types affected by gradient speeds and bonuses;
    /// bit `n` covers the road type with index `n`.
    pub gradient_flags: u32,
}

/// Gradients leave steps and ferries unaffected unless reconfigured.
pub const DEFAULT_GRADIENT_FLAGS: u32 = !((1 << ArcRoadType::Steps.index())
    | (1 << ArcRoadType::PassengerFerry.index())
    | (1 << ArcRoadType::VehicularFerry.index()));

impl Default for RouteProfile {
    fn default() -> Self {
        Self::new(ProfileType::Car)
    }
}

impl RouteProfile {
    /// Creates one of the canonical presets.
    pub fn new(kind: ProfileType) -> Self {
        match kind {
            ProfileType::Car => car_profile(),
            ProfileType::Walk => walk_profile(),
            ProfileType::Cycle => cycle_profile(),
            ProfileType::Hike => hike_profile(),
        }
    }

    /// A profile with every speed and bonus zeroed; the starting point for
    /// presets and deserialization.
    pub fn empty() -> Self {
        Self {
            vehicle: VehicleType::default(),
            speed: [0.0; ARC_ROAD_TYPE_COUNT],
            bonus: [0.0; ARC_ROAD_TYPE_COUNT],
            restriction_override: [EnumSet::empty(); ARC_ROAD_TYPE_COUNT],
            turn_time: 4,
            u_turn_time: 300,
            cross_traffic_turn_time: 8,
            traffic_light_time: 10,
            shortest: false,
            toll_penalty: 0.0,
            gradient_speed: [0.0; GRADIENT_COUNT],
            gradient_bonus: [0.0; GRADIENT_COUNT],
            gradient_flags: DEFAULT_GRADIENT_FLAGS,
        }
    }

    /// The toll penalty clamped to its valid range.
    #[inline]
    pub fn toll_penalty_clamped(&self) -> f64 {
        self.toll_penalty.clamp(0.0, 1.0)
    }

    /// Do gradient speeds and bonuses apply to this road type?
    #[inline]
    pub fn gradient_applies(&self, road_type: ArcRoadType) -> bool {
        self.gradient_flags & (1 << road_type.index()) != 0
    }

    /// How this road type may be used, from its speed and bonus alone.
    pub fn usability(&self, road_type: ArcRoadType) -> Usability {
        let speed = self.speed[road_type.index()];
        let sum = speed + self.bonus[road_type.index()];
        if sum > 0.0 {
            Usability::Normal
        } else if speed > 0.0 && sum == 0.0 {
            Usability::EndpointOnly
        } else {
            Usability::Unusable
        }
    }

    /// The effective speed in kph for an arc, including gradient terms where
    /// they apply. Non-positive results mean the arc cannot be traversed at
    /// this point of the route.
    pub fn effective_speed(&self, arc: ArcAttributes) -> f64 {
        let rt = arc.road_type();
        let mut speed = self.speed[rt.index()] + self.bonus[rt.index()];
        if self.gradient_applies(rt) {
            let g = arc.gradient().index();
            speed += self.gradient_speed[g] + self.gradient_bonus[g];
        }
        speed
    }

    /// The restriction flags that stop this profile's vehicle on the given
    /// arc, after applying the road type's restriction override.
    pub fn restrictions_against(&self, arc: ArcAttributes) -> EnumSet<VehicleAccess> {
        let overridden = self.vehicle.access - self.restriction_override[arc.road_type().index()];
        arc.access() & overridden
    }
}

fn set(array: &mut [f64; ARC_ROAD_TYPE_COUNT], road_type: ArcRoadType, value: f64) {
    array[road_type.index()] = value;
}

fn car_profile() -> RouteProfile {
    use ArcRoadType::{
        LivingStreet, Motorway, MotorwayLink, Primary, PrimaryLink, Residential, Secondary,
        SecondaryLink, ServiceRoad, Tertiary, Track, Trunk, TrunkLink, Unclassified, Unknown,
        Unpaved, VehicularFerry,
    };

    let mut p = RouteProfile::empty();
    p.vehicle.access = VehicleAccess::Car | VehicleAccess::WrongWay;
    set(&mut p.speed, Motorway, 110.0);
    set(&mut p.speed, MotorwayLink, 60.0);
    set(&mut p.speed, Trunk, 90.0);
    set(&mut p.speed, TrunkLink, 55.0);
    set(&mut p.speed, Primary, 65.0);
    set(&mut p.speed, PrimaryLink, 50.0);
    set(&mut p.speed, Secondary, 55.0);
    set(&mut p.speed, SecondaryLink, 45.0);
    set(&mut p.speed, Tertiary, 45.0);
    set(&mut p.speed, Unclassified, 35.0);
    set(&mut p.speed, Residential, 30.0);
    set(&mut p.speed, LivingStreet, 10.0);
    set(&mut p.speed, ServiceRoad, 20.0);
    set(&mut p.speed, Unknown, 30.0);
    set(&mut p.speed, Unpaved, 15.0);
    set(&mut p.speed, VehicularFerry, 20.0);
    // Tracks carry traffic only at the very start or end of a route.
    set(&mut p.speed, Track, 10.0);
    set(&mut p.bonus, Track, -10.0);
    p
}

fn walk_profile() -> RouteProfile {
    use ArcRoadType::{
        Bridleway, Cycleway, Footway, LivingStreet, Path, PassengerFerry, PedestrianRoad, Primary,
        Residential, Secondary, ServiceRoad, Steps, Tertiary, Track, Trunk, Unclassified, Unknown,
        Unpaved, VehicularFerry,
    };

    let mut p = RouteProfile::empty();
    p.vehicle.access = EnumSet::only(VehicleAccess::Pedestrian);
    set(&mut p.speed, Footway, 5.0);
    set(&mut p.speed, Path, 5.0);
    set(&mut p.speed, PedestrianRoad, 5.0);
    set(&mut p.speed, Steps, 4.0);
    set(&mut p.speed, Bridleway, 4.5);
    set(&mut p.speed, Cycleway, 4.5);
    set(&mut p.speed, Track, 5.0);
    set(&mut p.speed, LivingStreet, 5.0);
    set(&mut p.speed, Residential, 4.5);
    set(&mut p.speed, ServiceRoad, 4.5);
    set(&mut p.speed, Unclassified, 4.5);
    set(&mut p.speed, Unknown, 4.5);
    set(&mut p.speed, Unpaved, 5.0);
    set(&mut p.speed, Tertiary, 4.5);
    set(&mut p.speed, Secondary, 4.5);
    set(&mut p.speed, Primary, 4.5);
    set(&mut p.speed, Trunk, 4.0);
    set(&mut p.speed, VehicularFerry, 15.0);
    set(&mut p.speed, PassengerFerry, 15.0);
    // Walking along busy roads is less pleasant than the quiet ones.
    set(&mut p.bonus, Tertiary, -0.5);
    set(&mut p.bonus, Secondary, -1.0);
    set(&mut p.bonus, Primary, -1.0);
    set(&mut p.bonus, Trunk, -1.5);
    p.gradient_speed = [0.0, -0.5, -1.0, -2.0, 0.0, 0.25, 0.0, -1.0];
    p.turn_time = 0;
    p.u_turn_time = 0;
    p.cross_traffic_turn_time = 0;
    p
}

fn cycle_profile() -> RouteProfile {
    use ArcRoadType::{
        Bridleway, Cycleway, Footway, LivingStreet, PassengerFerry, Path, PedestrianRoad, Primary,
        Residential, Secondary, ServiceRoad, Tertiary, Track, Unclassified, Unknown, Unpaved,
        VehicularFerry,
    };

    let mut p = RouteProfile::empty();
    p.vehicle.access = VehicleAccess::Bicycle | VehicleAccess::WrongWay;
    set(&mut p.speed, Cycleway, 18.0);
    set(&mut p.bonus, Cycleway, 2.0);
    set(&mut p.speed, LivingStreet, 15.0);
    set(&mut p.speed, Residential, 15.0);
    set(&mut p.speed, ServiceRoad, 14.0);
    set(&mut p.speed, Unclassified, 16.0);
    set(&mut p.speed, Tertiary, 16.0);
    set(&mut p.speed, Secondary, 16.0);
    set(&mut p.bonus, Secondary, -2.0);
    set(&mut p.speed, Primary, 16.0);
    set(&mut p.bonus, Primary, -4.0);
    set(&mut p.speed, Track, 12.0);
    set(&mut p.speed, Unpaved, 12.0);
    set(&mut p.speed, Path, 10.0);
    set(&mut p.speed, Bridleway, 10.0);
    set(&mut p.speed, Footway, 8.0);
    set(&mut p.bonus, Footway, -4.0);
    set(&mut p.speed, PedestrianRoad, 8.0);
    set(&mut p.bonus, PedestrianRoad, -4.0);
    set(&mut p.speed, Unknown, 14.0);
    set(&mut p.speed, VehicularFerry, 10.0);
    set(&mut p.speed, PassengerFerry, 10.0);
    p.gradient_speed = [0.0, -2.0, -5.0, -8.0, 0.0, 2.0, 4.0, 2.0];
    p.turn_time = 2;
    p.u_turn_time = 10;
    p.cross_traffic_turn_time = 4;
    p
}

fn hike_profile() -> RouteProfile {
    use ArcRoadType::{Bridleway, Path, Primary, Secondary, Tertiary, Track, Trunk, Unclassified};

    let mut p = walk_profile();
    // Prefer going off-road.
    set(&mut p.bonus, Path, 0.5);
    set(&mut p.bonus, Track, 0.5);
    set(&mut p.bonus, Bridleway, 0.5);
    set(&mut p.bonus, Unclassified, -1.0);
    set(&mut p.bonus, Tertiary, -1.5);
    set(&mut p.bonus, Secondary, -2.0);
    set(&mut p.bonus, Primary, -2.0);
    set(&mut p.bonus, Trunk, -2.5);
    p.gradient_speed = [0.0, -0.25, -0.5, -1.0, 0.0, 0.25, 0.25, -0.5];
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_preset_orders_road_classes() {
        let p = RouteProfile::new(ProfileType::Car);
        let motorway = p.speed[ArcRoadType::Motorway.index()];
        let residential = p.speed[ArcRoadType::Residential.index()];
        let footway = p.speed[ArcRoadType::Footway.index()]
            + p.bonus[ArcRoadType::Footway.index()];
        assert!(motorway > residential);
        assert!(footway <= 0.0);
        assert_eq!(p.usability(ArcRoadType::Footway), Usability::Unusable);
    }

    #[test]
    fn car_preset_allows_tracks_only_at_endpoints() {
        let p = RouteProfile::new(ProfileType::Car);
        assert_eq!(p.usability(ArcRoadType::Track), Usability::EndpointOnly);
        assert_eq!(p.usability(ArcRoadType::Motorway), Usability::Normal);
    }

    #[test]
    fn walk_preset_ignores_one_way_restrictions() {
        let p = RouteProfile::new(ProfileType::Walk);
        assert!(!p.vehicle.access.contains(VehicleAccess::WrongWay));
        assert!(p.vehicle.access.contains(VehicleAccess::Pedestrian));
    }

    #[test]
    fn normalize_ties_other_flag_to_details() {
        let mut v = VehicleType {
            weight: 7.5,
            ..VehicleType::default()
        };
        v.normalize();
        assert!(v.access.contains(VehicleAccess::Other));

        v.weight = -1.0;
        v.normalize();
        assert_eq!(v.weight, 0.0);
        assert!(!v.access.contains(VehicleAccess::Other));
    }

    #[test]
    fn restriction_override_defeats_specific_flags() {
        let mut p = RouteProfile::new(ProfileType::Car);
        p.vehicle.access = VehicleAccess::HeavyGoods | VehicleAccess::WrongWay;
        p.restriction_override[ArcRoadType::Track.index()] =
            EnumSet::only(VehicleAccess::HeavyGoods);

        let track = ArcAttributes::new()
            .with_road_type(ArcRoadType::Track)
            .with_access(wayfinder_road::ALL_MOTOR_VEHICLES);
        assert!(p.restrictions_against(track).is_empty());

        let residential = ArcAttributes::new()
            .with_road_type(ArcRoadType::Residential)
            .with_access(wayfinder_road::ALL_MOTOR_VEHICLES);
        assert_eq!(
            p.restrictions_against(residential),
            EnumSet::only(VehicleAccess::HeavyGoods)
        );
    }

    #[test]
    fn gradient_flags_exclude_steps_and_ferries_by_default() {
        let p = RouteProfile::empty();
        assert!(!p.gradient_applies(ArcRoadType::Steps));
        assert!(!p.gradient_applies(ArcRoadType::PassengerFerry));
        assert!(!p.gradient_applies(ArcRoadType::VehicularFerry));
        assert!(p.gradient_applies(ArcRoadType::Footway));
    }

    #[test]
    fn toll_penalty_is_clamped() {
        let mut p = RouteProfile::empty();
        p.toll_penalty = 3.0;
        assert_eq!(p.toll_penalty_clamped(), 1.0);
        p.toll_penalty = -0.5;
        assert_eq!(p.toll_penalty_clamped(), 0.0);
    }
}
