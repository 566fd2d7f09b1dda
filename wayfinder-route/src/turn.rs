/// Turn types on a route.
///
/// Turns at junctions are classified by angle, except for forks and
/// turn-offs, which have special rules to avoid classifying them as ahead,
/// and turns back along the same road, which classify as [`TurnType::Around`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnType {
    /// No turn exists or is needed; used at the start of a route and on
    /// arrival.
    #[default]
    None,
    /// A turn of 15 degrees or less left or right, unless this is a fork
    /// with two choices or a turn onto a lower-class road.
    Ahead,
    /// A turn between 15 and 45 degrees right, or a smaller turn which is
    /// the rightmost of a two-way fork.
    BearRight,
    /// A turn between 45 and 120 degrees right.
    Right,
    /// A turn of more than 120 degrees right, short of a U-turn.
    SharpRight,
    /// A turn back along the same road: within 11.75 degrees of a half
    /// circle, either way round.
    Around,
    /// A turn of more than 120 degrees left, short of a U-turn.
    SharpLeft,
    /// A turn between 45 and 120 degrees left.
    Left,
    /// A turn between 15 and 45 degrees left, or a smaller turn which is
    /// the leftmost of a two-way fork.
    BearLeft,
}

const TURN_TYPE_NAMES: [(&str, TurnType); 9] = [
    ("none", TurnType::None),
    ("ahead", TurnType::Ahead),
    ("bear_right", TurnType::BearRight),
    ("right", TurnType::Right),
    ("sharp_right", TurnType::SharpRight),
    ("around", TurnType::Around),
    ("sharp_left", TurnType::SharpLeft),
    ("left", TurnType::Left),
    ("bear_left", TurnType::BearLeft),
];

impl TurnType {
    /// The stable external name, e.g. `"bear_right"`.
    pub fn name(self) -> &'static str {
        TURN_TYPE_NAMES
            .iter()
            .find(|(_, t)| *t == self)
            .map(|(n, _)| *n)
            .unwrap_or("none")
    }

    /// Looks a turn type up by its stable external name.
    pub fn from_name(name: &str) -> Option<Self> {
        TURN_TYPE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }
}

/// Roundabout states. Turns involving roundabouts are marked so that exit
/// numbers can be counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundaboutState {
    /// The junction does not involve a roundabout.
    #[default]
    None,
    /// The junction enters a roundabout.
    Enter,
    /// The junction continues around a roundabout.
    Continue,
    /// The junction exits a roundabout.
    Exit,
}

const ROUNDABOUT_STATE_NAMES: [(&str, RoundaboutState); 4] = [
    ("none", RoundaboutState::None),
    ("enter", RoundaboutState::Enter),
    ("continue", RoundaboutState::Continue),
    ("exit", RoundaboutState::Exit),
];

impl RoundaboutState {
    /// The stable external name, e.g. `"enter"`.
    pub fn name(self) -> &'static str {
        ROUNDABOUT_STATE_NAMES
            .iter()
            .find(|(_, s)| *s == self)
            .map(|(n, _)| *n)
            .unwrap_or("none")
    }

    /// Looks a roundabout state up by its stable external name.
    pub fn from_name(name: &str) -> Option<Self> {
        ROUNDABOUT_STATE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| *s)
    }
}

/// Half-width of the angle window, either side of a half circle, treated as
/// turning around.
pub const U_TURN_WINDOW_DEGREES: f64 = 11.75;

/// Classifies a signed turn angle in degrees: positive is right, negative is
/// left, zero is straight ahead.
///
/// Boundary angles belong to the smaller turn: exactly 15 degrees is ahead,
/// exactly 45 degrees a bear, exactly 120 degrees a plain turn.
pub fn classify_turn(angle: f64) -> TurnType {
    if angle.abs() >= 180.0 - U_TURN_WINDOW_DEGREES {
        TurnType::Around
    } else if angle > 120.0 {
        TurnType::SharpRight
    } else if angle > 45.0 {
        TurnType::Right
    } else if angle > 15.0 {
        TurnType::BearRight
    } else if angle >= -15.0 {
        TurnType::Ahead
    } else if angle >= -45.0 {
        TurnType::BearLeft
    } else if angle >= -120.0 {
        TurnType::Left
    } else {
        TurnType::SharpLeft
    }
}

/// Topology of the junction at which a route arc was chosen, as reported by
/// a router. Input to turn classification when segments are appended to a
/// route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JunctionInfo {
    /// The turn angle in degrees: positive right, negative left.
    pub turn_angle: f64,
    /// The number of choices at the junction, or zero if unknown.
    pub choices: i32,
    /// Choices to the left of the turn actually taken.
    pub left_alternatives: i32,
    /// Choices to the right of the turn actually taken.
    pub right_alternatives: i32,
    /// True if an alternative lies within 22.5 degrees of the turn taken.
    pub is_fork: bool,
    /// True if the turn is onto a road of strictly lower class.
    pub is_turn_off: bool,
    /// Roundabout involvement of the junction.
    pub roundabout: RoundaboutState,
    /// The junction to take, counting the roundabout entry as 0, when
    /// exiting a roundabout.
    pub exit_number: i32,
    /// True if the junction is controlled by traffic lights.
    pub signalized: bool,
    /// The estimated seconds needed to navigate the junction, as charged by
    /// the cost model.
    pub turn_time: f64,
    /// The name of the junction, if any.
    pub junction_name: String,
    /// The reference code of the junction, if any.
    pub junction_ref: String,
}

/// A turn: a choice of route through a junction.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// The classified turn type.
    pub turn_type: TurnType,
    /// True if this turn continues the current road and needs no
    /// notification.
    pub continues: bool,
    /// The roundabout state.
    pub roundabout: RoundaboutState,
    /// The turn angle in degrees: 0 = straight ahead, negative = left,
    /// positive = right.
    pub angle: f64,
    /// The junction to take, counting the current junction as 0, if this
    /// junction is part of a roundabout.
    pub exit_number: i32,
    /// The number of choices at this turning, or zero if unknown.
    pub choices: i32,
    /// Choices to the left of the turn taken; meaningless if `choices` is 0.
    pub left_alternatives: i32,
    /// Choices to the right of the turn taken; meaningless if `choices` is 0.
    pub right_alternatives: i32,
    /// True if this turn is a fork.
    pub is_fork: bool,
    /// True if this turn is onto a road of strictly lower class.
    pub is_turn_off: bool,
    /// The name of the junction.
    pub junction_name: String,
    /// The reference code of the junction.
    pub junction_ref: String,
}

impl Default for Turn {
    fn default() -> Self {
        Self {
            turn_type: TurnType::None,
            continues: true,
            roundabout: RoundaboutState::None,
            angle: 0.0,
            exit_number: 0,
            choices: 0,
            left_alternatives: 0,
            right_alternatives: 0,
            is_fork: false,
            is_turn_off: false,
            junction_name: String::new(),
            junction_ref: String::new(),
        }
    }
}

impl Turn {
    /// Resets to the no-turn state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sets the angle and classifies it, without topology.
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
        self.turn_type = classify_turn(angle);
    }

    /// Sets the angle and junction topology, classifying the turn.
    ///
    /// A turn classified as ahead is promoted to a bear when it is a
    /// turn-off or one arm of a two-way fork: to the right if any
    /// alternative lies to the left, otherwise to the left.
    pub fn set_turn(
        &mut self,
        angle: f64,
        choices: i32,
        left_alternatives: i32,
        right_alternatives: i32,
        is_fork: bool,
        is_turn_off: bool,
    ) {
        self.set_angle(angle);
        self.choices = choices;
        self.left_alternatives = left_alternatives;
        self.right_alternatives = right_alternatives;
        self.is_fork = is_fork;
        self.is_turn_off = is_turn_off;
        if self.turn_type == TurnType::Ahead && (is_turn_off || (is_fork && choices == 2)) {
            self.turn_type = if left_alternatives > 0 {
                TurnType::BearRight
            } else {
                TurnType::BearLeft
            };
        }
    }

    /// Builds the turn descriptor for a junction reported by a router.
    pub fn from_junction(junction: &JunctionInfo) -> Self {
        let mut turn = Self::default();
        turn.set_turn(
            junction.turn_angle,
            junction.choices,
            junction.left_alternatives,
            junction.right_alternatives,
            junction.is_fork,
            junction.is_turn_off,
        );
        turn.roundabout = junction.roundabout;
        turn.exit_number = junction.exit_number;
        turn.junction_name.clone_from(&junction.junction_name);
        turn.junction_ref.clone_from(&junction.junction_ref);
        turn.continues = turn.turn_type == TurnType::Ahead
            && turn.roundabout == RoundaboutState::None
            && !junction.is_fork
            && !junction.is_turn_off;
        turn
    }

    /// A short English instruction for this turn; `onto` names the road
    /// turned onto and may be empty.
    pub fn instruction(&self, onto: &str) -> String {
        let mut text = match self.roundabout {
            RoundaboutState::Enter | RoundaboutState::Exit if self.exit_number > 0 => {
                format!("Take exit {} at the roundabout", self.exit_number)
            }
            RoundaboutState::Enter => "Enter the roundabout".to_string(),
            RoundaboutState::Continue => "Continue around the roundabout".to_string(),
            _ => match self.turn_type {
                TurnType::None => "Arrive".to_string(),
                TurnType::Ahead => "Continue ahead".to_string(),
                TurnType::BearRight => "Bear right".to_string(),
                TurnType::Right => "Turn right".to_string(),
                TurnType::SharpRight => "Turn sharp right".to_string(),
                TurnType::Around => "Turn around".to_string(),
                TurnType::SharpLeft => "Turn sharp left".to_string(),
                TurnType::Left => "Turn left".to_string(),
                TurnType::BearLeft => "Bear left".to_string(),
            },
        };
        if !onto.is_empty() && self.turn_type != TurnType::None {
            text.push_str(" onto ");
            text.push_str(onto);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// The reference classification over integer degrees.
    fn oracle(angle: i32) -> TurnType {
        match angle.abs() {
            0..=15 => TurnType::Ahead,
            16..=45 => {
                if angle > 0 {
                    TurnType::BearRight
                } else {
                    TurnType::BearLeft
                }
            }
            46..=120 => {
                if angle > 0 {
                    TurnType::Right
                } else {
                    TurnType::Left
                }
            }
            121..=168 => {
                if angle > 0 {
                    TurnType::SharpRight
                } else {
                    TurnType::SharpLeft
                }
            }
            _ => TurnType::Around,
        }
    }

    #[test]
    fn classifier_matches_boundary_table() {
        for angle in -180..=180 {
            assert_eq!(
                classify_turn(f64::from(angle)),
                oracle(angle),
                "angle {angle}"
            );
        }
    }

    #[test]
    fn boundaries_belong_to_the_smaller_turn() {
        assert_eq!(classify_turn(15.0), TurnType::Ahead);
        assert_eq!(classify_turn(-15.0), TurnType::Ahead);
        assert_eq!(classify_turn(45.0), TurnType::BearRight);
        assert_eq!(classify_turn(-45.0), TurnType::BearLeft);
        assert_eq!(classify_turn(120.0), TurnType::Right);
        assert_eq!(classify_turn(-120.0), TurnType::Left);
    }

    #[test]
    fn near_reversal_classifies_as_around() {
        assert_eq!(classify_turn(178.0), TurnType::Around);
        assert_eq!(classify_turn(-172.0), TurnType::Around);
        assert_eq!(classify_turn(168.0), TurnType::SharpRight);
    }

    #[test]
    fn fork_overrides_ahead() {
        let mut turn = Turn::default();
        // Not a fork, not a turn-off: a plain bear right.
        turn.set_turn(20.0, 3, 1, 1, false, false);
        assert_eq!(turn.turn_type, TurnType::BearRight);

        // A two-way fork with no left alternatives promotes ahead to a
        // bear left.
        turn.set_turn(5.0, 2, 0, 1, true, false);
        assert_eq!(turn.turn_type, TurnType::BearLeft);

        // With a left alternative it promotes to a bear right.
        turn.set_turn(5.0, 2, 1, 0, true, false);
        assert_eq!(turn.turn_type, TurnType::BearRight);

        // A turn-off straight ahead also bears.
        turn.set_turn(0.0, 3, 0, 1, false, true);
        assert_eq!(turn.turn_type, TurnType::BearLeft);
    }

    #[test]
    fn continuation_requires_plain_ahead() {
        let junction = JunctionInfo {
            turn_angle: 4.0,
            choices: 2,
            right_alternatives: 1,
            ..JunctionInfo::default()
        };
        let turn = Turn::from_junction(&junction);
        assert_eq!(turn.turn_type, TurnType::Ahead);
        assert!(turn.continues);

        let fork = JunctionInfo {
            is_fork: true,
            ..junction
        };
        let turn = Turn::from_junction(&fork);
        assert!(!turn.continues);
    }

    #[test]
    fn names_round_trip() {
        for (name, turn_type) in TURN_TYPE_NAMES {
            assert_eq!(TurnType::from_name(name), Some(turn_type));
            assert_eq!(turn_type.name(), name);
        }
        for (name, state) in ROUNDABOUT_STATE_NAMES {
            assert_eq!(RoundaboutState::from_name(name), Some(state));
            assert_eq!(state.name(), name);
        }
    }

    proptest! {
        #[test]
        fn classification_is_symmetric(angle in 0.0f64..168.0) {
            let right = classify_turn(angle);
            let left = classify_turn(-angle);
            let mirrored = match right {
                TurnType::BearRight => TurnType::BearLeft,
                TurnType::Right => TurnType::Left,
                TurnType::SharpRight => TurnType::SharpLeft,
                other => other,
            };
            prop_assert_eq!(left, mirrored);
        }
    }
}
