//! Basic geometry of the kaptx rig: the angular index that pan and tilt are
//! expressed in, the unreachable tilt band, joystick sector classification,
//! and conversion from angular indices to servo PWM offsets.
//!
//! Angles are integers in `0..24`, each step being 15 degrees, in standard
//! orientation: 0 is pan to the right with level tilt, 6 is a quarter turn
//! (pan away from the operator, tilt straight up), 18 is pan upwind and
//! tilt straight down.
//!
//! Tilt can only reach indices 2, 1, 0, 23, ..., 15 (+30 degrees down to -135
//! degrees). Indices 3 through 14 are the dead zone.
//!
//! This crate supports `no_std` so that the same arithmetic runs on the
//! transmitter and in the host bench.

#![cfg_attr(not(feature = "std"), no_std)]

use core::ops::Add;

mod joystick;
mod tuning;

pub use joystick::{
    from_polar, is_center, is_out, sector16, sector24, Js, JsVector, JS_NEUTRAL, JS_OUT, JS_SLIDE, JS_SPAN,
};
pub use tuning::{Tuning, TuningBuilder, TuningError};

/// Number of angular indices in a full turn.
pub const ANG_360: u8 = 24;

/// The highest reachable tilt (30 degrees above the horizon).
pub const TILT_MAX: Angle = Angle(2);

/// The lowest reachable tilt (45 degrees past straight down).
pub const TILT_MIN: Angle = Angle(15);

/// Largest PWM offset from center that a servo will accept, in half microseconds.
pub const PWM_MAX_OFFSET: Pwm = 1600;

/// A signed offset from a servo's center pulse, in half microseconds.
pub type Pwm = i16;

/// A direction, in 15 degree steps.
///
/// All arithmetic on angles is circular.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct Angle(u8);

impl Angle {
    pub const fn new(index: i32) -> Self {
        Angle(index.rem_euclid(ANG_360 as i32) as u8)
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub const fn degrees(self) -> u16 {
        self.0 as u16 * 15
    }

    /// The index as a signed value in `-12..12`.
    ///
    /// Tilt's legal range straddles the wraparound, so 23 means "one step
    /// below the horizon" rather than "almost a full turn."
    pub const fn signed(self) -> i32 {
        if self.0 < ANG_360 / 2 {
            self.0 as i32
        } else {
            self.0 as i32 - ANG_360 as i32
        }
    }

    /// The number of steps between two angles, going the short way around.
    pub fn distance(self, other: Angle) -> u8 {
        let d = self.0.abs_diff(other.0);
        d.min(ANG_360 - d)
    }

    pub fn is_tilt_reachable(self) -> bool {
        self <= TILT_MAX || self >= TILT_MIN
    }

    /// Moves a tilt out of the dead zone, to whichever limit is closer.
    pub fn clamp_tilt(self) -> Angle {
        if self.is_tilt_reachable() {
            self
        } else if self.0 - TILT_MAX.0 <= TILT_MIN.0 - self.0 {
            TILT_MAX
        } else {
            TILT_MIN
        }
    }

    /// Nudges a tilt by `adj` steps. Pushing past either limit does nothing.
    pub fn adj_tilt(self, adj: i32) -> Angle {
        if (adj > 0 && self == TILT_MAX) || (adj < 0 && self == TILT_MIN) {
            return self;
        }
        (self + adj).clamp_tilt()
    }

    /// Adds a pattern offset to a tilt. Anything that lands in the dead zone
    /// is pulled back to the nearest limit.
    pub fn add_tilt(self, n: i32) -> Angle {
        (self + n).clamp_tilt()
    }
}

impl Add<i32> for Angle {
    type Output = Angle;

    fn add(self, rhs: i32) -> Angle {
        Angle::new(self.0 as i32 + rhs)
    }
}

impl From<u8> for Angle {
    fn from(index: u8) -> Self {
        Angle::new(index.into())
    }
}

impl From<Angle> for u8 {
    fn from(a: Angle) -> u8 {
        a.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PanTilt<T> {
    pub pan: T,
    pub tilt: T,
}

impl<T> PanTilt<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PanTilt<U> {
        PanTilt {
            pan: f(self.pan),
            tilt: f(self.tilt),
        }
    }
}

/// A commanded direction, in angular indices.
pub type AimPoint = PanTilt<Angle>;

/// Servo positions (or velocities), as PWM offsets.
pub type ServoPoint = PanTilt<Pwm>;

impl AimPoint {
    pub const fn new(pan: i32, tilt: i32) -> Self {
        PanTilt {
            pan: Angle::new(pan),
            tilt: Angle::new(tilt),
        }
    }
}

/// The default aim: facing away from the operator, level.
pub const HOME: AimPoint = AimPoint::new(6, 0);
