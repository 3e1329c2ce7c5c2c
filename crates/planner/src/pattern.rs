//! Shot patterns.
//!
//! Each shoot mode turns the operator's aim point into a fixed sequence of
//! aim points. Most of the patterns are tables of offsets from a reference
//! point; pan offsets wrap around and tilt offsets are pulled out of the dead
//! zone.

use kaptx_geom::{AimPoint, Angle, PanTilt, TILT_MAX, TILT_MIN};

/// The longest pattern (360) has this many shots, which is also the length
/// of the rig's shot queue.
pub const MAX_SHOTS: usize = 36;

pub type Shots = heapless::Vec<AimPoint, MAX_SHOTS>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[repr(u8)]
pub enum ShootMode {
    /// One shot at the aim point.
    #[default]
    Single = 0,
    /// Seven shots clustered around the aim point.
    Cluster = 1,
    /// A vertical strip spanning about 90 degrees of tilt.
    Vpan = 2,
    /// Two rows spanning about 90 degrees of pan.
    Hpan = 3,
    /// A quarter of the sky, from the horizon down.
    Quad = 4,
    /// Four quads, for a full panorama.
    Pan360 = 5,
}

impl From<u8> for ShootMode {
    /// Unknown modes fall back to `Single`.
    fn from(raw: u8) -> Self {
        match raw {
            1 => ShootMode::Cluster,
            2 => ShootMode::Vpan,
            3 => ShootMode::Hpan,
            4 => ShootMode::Quad,
            5 => ShootMode::Pan360,
            _ => ShootMode::Single,
        }
    }
}

impl ShootMode {
    pub const ALL: [ShootMode; 6] = [
        ShootMode::Single,
        ShootMode::Cluster,
        ShootMode::Vpan,
        ShootMode::Hpan,
        ShootMode::Quad,
        ShootMode::Pan360,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShootMode::Single => "single",
            ShootMode::Cluster => "cluster",
            ShootMode::Vpan => "vpan",
            ShootMode::Hpan => "hpan",
            ShootMode::Quad => "quad",
            ShootMode::Pan360 => "360",
        }
    }

    /// How many shots a single trigger queues in this mode.
    pub fn shot_count(self) -> usize {
        match self {
            ShootMode::Single => 1,
            ShootMode::Cluster => CLUSTER_HIGH.len(),
            ShootMode::Vpan => VPAN_ROWS + 1,
            ShootMode::Hpan => 1 + 2 * HPAN_COLUMNS.len(),
            ShootMode::Quad => QUAD.len(),
            ShootMode::Pan360 => 4 * QUADRANT.len(),
        }
    }
}

const fn off(pan: i8, tilt: i8) -> PanTilt<i8> {
    PanTilt { pan, tilt }
}

// Near the horizon, a tight ring.
const CLUSTER_HIGH: [PanTilt<i8>; 7] = [
    off(0, 0),
    off(1, 1),
    off(2, 0),
    off(1, -1),
    off(-1, -1),
    off(-2, 0),
    off(-1, 1),
];

// Further down the pan steps cover less ground, so spread them out.
const CLUSTER_MED: [PanTilt<i8>; 7] = [
    off(0, 0),
    off(1, 1),
    off(2, 0),
    off(2, -1),
    off(-2, -1),
    off(-2, 0),
    off(-1, 1),
];

// Straight down.
const CLUSTER_LOW: [PanTilt<i8>; 7] = [
    off(0, 0),
    off(0, 2),
    off(0, -2),
    off(4, -2),
    off(4, 2),
    off(-4, 2),
    off(-4, -2),
];

const VPAN_ROWS: usize = 6;

const HPAN_COLUMNS: [i32; 4] = [-3, -1, 1, 3];

const QUAD: [PanTilt<i8>; 13] = [
    off(-3, 0),
    off(-3, -2),
    off(-3, -4),
    off(-3, -6),
    off(-1, 0),
    off(-1, -2),
    off(0, -4),
    off(1, -2),
    off(1, 0),
    off(3, 0),
    off(3, -2),
    off(3, -4),
    off(3, -6),
];

// One quarter of the 360 pattern. Four of these, rotated by a quarter turn
// each, tile the whole sky below the horizon.
const QUADRANT: [PanTilt<i8>; 9] = [
    off(0, 0),
    off(0, -2),
    off(0, -4),
    off(0, -6),
    off(2, 0),
    off(2, -2),
    off(3, -4),
    off(4, -2),
    off(4, 0),
];

/// Expands a shoot mode into the aim points to shoot, in order.
pub fn plan(mode: ShootMode, user: AimPoint) -> Shots {
    let mut shots = Shots::new();
    match mode {
        ShootMode::Single => push(&mut shots, user),
        ShootMode::Cluster => cluster(user, &mut shots),
        ShootMode::Vpan => vpan(user, &mut shots),
        ShootMode::Hpan => hpan(user, &mut shots),
        ShootMode::Quad => {
            let reference = PanTilt {
                pan: user.pan,
                tilt: Angle::new(0),
            };
            apply(reference, &QUAD, &mut shots);
        }
        ShootMode::Pan360 => {
            for quarter in 0..4 {
                let reference = PanTilt {
                    pan: user.pan + quarter * 6,
                    tilt: Angle::new(0),
                };
                apply(reference, &QUADRANT, &mut shots);
            }
        }
    }
    shots
}

fn push(shots: &mut Shots, aim: AimPoint) {
    // The biggest pattern is exactly MAX_SHOTS long.
    let _ = shots.push(aim);
}

fn apply(reference: AimPoint, offsets: &[PanTilt<i8>], shots: &mut Shots) {
    for offset in offsets {
        push(
            shots,
            PanTilt {
                pan: reference.pan + offset.pan as i32,
                tilt: reference.tilt.add_tilt(offset.tilt as i32),
            },
        );
    }
}

fn cluster(user: AimPoint, shots: &mut Shots) {
    let mut base = user;

    // Get the tilt off the limits, otherwise half the cluster collapses onto them.
    if base.tilt == TILT_MAX {
        base.tilt = base.tilt + -1;
    }
    if base.tilt == TILT_MIN {
        base.tilt = base.tilt + 1;
    }

    let tilt = base.tilt.index();
    let table = if tilt <= 2 || tilt >= 22 {
        &CLUSTER_HIGH
    } else if tilt >= 19 {
        &CLUSTER_MED
    } else if tilt == 18 {
        &CLUSTER_LOW
    } else {
        // Past straight down: turn around and use the mirror image on the
        // other side.
        base.pan = base.pan + 12;
        base.tilt = Angle::new(36 - tilt as i32);
        &CLUSTER_MED
    };
    apply(base, table, shots);
}

fn vpan(user: AimPoint, shots: &mut Shots) {
    push(shots, user);

    // Start 45 degrees below the user's tilt (but no lower than we can go),
    // then come back up 90 degrees (but no higher than we can go).
    let mut bottom = user.tilt + -3;
    if bottom < TILT_MIN {
        bottom = TILT_MIN;
    }
    // The bottom is at least 15, so the top can only overshoot into the dead
    // zone from below the horizon; clamping sends it to the top limit.
    let top = (bottom + 6).clamp_tilt();

    for row in 0..VPAN_ROWS as i32 {
        push(
            shots,
            PanTilt {
                pan: user.pan,
                tilt: top + -row,
            },
        );
    }
}

fn hpan(user: AimPoint, shots: &mut Shots) {
    let tilt = user.tilt;
    // The second row goes away from whichever limit is nearby.
    let tilt2 = if tilt.index() <= 2 || tilt.index() > 18 {
        tilt + -2
    } else {
        tilt + 2
    };

    push(shots, user);
    for column in HPAN_COLUMNS {
        let pan = user.pan + column;
        push(shots, PanTilt { pan, tilt });
        push(shots, PanTilt { pan, tilt: tilt2 });
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reachable_aim() -> impl Strategy<Value = AimPoint> {
        (0i32..24, prop_oneof![0i32..=2, 15i32..24]).prop_map(|(pan, tilt)| AimPoint::new(pan, tilt))
    }

    #[test]
    fn single() {
        let shots = plan(ShootMode::Single, AimPoint::new(6, 0));
        assert_eq!(shots.as_slice(), &[AimPoint::new(6, 0)]);
    }

    #[test]
    fn cluster_nudges_off_the_top() {
        let shots = plan(ShootMode::Cluster, AimPoint::new(6, 2));
        assert_eq!(shots.len(), 7);
        assert_eq!(shots[0], AimPoint::new(6, 1));
        assert_eq!(shots[1], AimPoint::new(7, 2));
        assert!(shots.iter().all(|s| s.tilt.is_tilt_reachable()));
    }

    #[test]
    fn cluster_past_nadir_turns_around() {
        // Tilt 16 is below straight down, so the cluster is shot from the other
        // side: pan + 180, tilt 20.
        let shots = plan(ShootMode::Cluster, AimPoint::new(3, 16));
        assert_eq!(shots[0], AimPoint::new(15, 20));
        let shots = plan(ShootMode::Cluster, AimPoint::new(3, 15));
        assert_eq!(shots[0], AimPoint::new(15, 20));
    }

    #[test]
    fn cluster_straight_down() {
        let shots = plan(ShootMode::Cluster, AimPoint::new(0, 18));
        assert_eq!(shots[3], AimPoint::new(4, 16));
        assert_eq!(shots[6], AimPoint::new(20, 16));
    }

    #[test]
    fn vpan_from_level() {
        let shots = plan(ShootMode::Vpan, AimPoint::new(6, 0));
        let tilts: Vec<u8> = shots.iter().map(|s| s.tilt.index()).collect();
        // From level, 45 degrees down is 21 and 90 up from there hits the top limit.
        assert_eq!(tilts, vec![0, 2, 1, 0, 23, 22, 21]);
        assert!(shots.iter().all(|s| s.pan == Angle::new(6)));
    }

    #[test]
    fn vpan_near_the_bottom() {
        let shots = plan(ShootMode::Vpan, AimPoint::new(6, 16));
        let tilts: Vec<u8> = shots.iter().map(|s| s.tilt.index()).collect();
        assert_eq!(tilts, vec![16, 21, 20, 19, 18, 17, 16]);
    }

    #[test]
    fn hpan_rows() {
        let shots = plan(ShootMode::Hpan, AimPoint::new(1, 0));
        assert_eq!(shots.len(), 9);
        assert_eq!(shots[1], AimPoint::new(22, 0));
        assert_eq!(shots[2], AimPoint::new(22, 22));
        assert_eq!(shots[8], AimPoint::new(4, 22));

        let shots = plan(ShootMode::Hpan, AimPoint::new(1, 16));
        assert_eq!(shots[2], AimPoint::new(22, 18));
    }

    #[test]
    fn quad() {
        // The user's tilt doesn't matter: the grid hangs from the horizon.
        let shots = plan(ShootMode::Quad, AimPoint::new(6, 20));
        assert_eq!(shots.len(), 13);
        assert_eq!(shots[0], AimPoint::new(3, 0));
        assert_eq!(shots[3], AimPoint::new(3, 18));
        assert_eq!(shots[5], AimPoint::new(5, 22));
        assert_eq!(shots[6], AimPoint::new(6, 20));
        assert_eq!(shots[12], AimPoint::new(9, 18));

        let shots = plan(ShootMode::Quad, AimPoint::new(1, 0));
        assert_eq!(shots[0], AimPoint::new(22, 0));
        assert_eq!(shots[9], AimPoint::new(4, 0));
    }

    #[test]
    fn full_circle() {
        let shots = plan(ShootMode::Pan360, AimPoint::new(6, 23));
        assert_eq!(shots.len(), 36);
        assert_eq!(shots[0], AimPoint::new(6, 0));
        assert_eq!(shots[9], AimPoint::new(12, 0));
        assert_eq!(shots[27], AimPoint::new(0, 0));
        assert_eq!(shots[35], AimPoint::new(4, 0));
    }

    #[test]
    fn unknown_modes_are_single() {
        assert_eq!(ShootMode::from(4), ShootMode::Quad);
        assert_eq!(ShootMode::from(6), ShootMode::Single);
        assert_eq!(ShootMode::from(255), ShootMode::Single);
    }

    proptest! {
        #[test]
        fn shot_counts(mode: ShootMode, aim in reachable_aim()) {
            let shots = plan(mode, aim);
            prop_assert_eq!(shots.len(), mode.shot_count());
        }

        #[test]
        fn patterns_stay_reachable(mode: ShootMode, aim in reachable_aim()) {
            for shot in plan(mode, aim) {
                prop_assert!(shot.tilt.is_tilt_reachable(), "{:?} from {:?}", shot, aim);
            }
        }

        #[test]
        fn raw_modes_round_trip(mode: ShootMode) {
            prop_assert_eq!(ShootMode::from(mode as u8), mode);
        }
    }

    #[test]
    fn expected_counts() {
        let counts: Vec<usize> = ShootMode::ALL.iter().map(|m| m.shot_count()).collect();
        assert_eq!(counts, vec![1, 7, 7, 9, 13, 36]);
    }
}
