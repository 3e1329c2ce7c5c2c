//! Bounded-acceleration servo motion.
//!
//! Every tick, each axis either speeds up or slows down by one acceleration
//! step. It speeds up only while it could still stop in time, so a move that
//! starts at rest arrives at the target without overshooting it.

use kaptx_geom::{PanTilt, Pwm, ServoPoint};

/// Position and velocity of one servo, in PWM units (and PWM units per tick).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Axis {
    pub pos: Pwm,
    pub vel: Pwm,
}

impl Axis {
    pub fn at_rest(pos: Pwm) -> Self {
        Axis { pos, vel: 0 }
    }

    pub fn is_at(&self, target: Pwm) -> bool {
        self.pos == target && self.vel == 0
    }

    /// Advances one tick toward `target`, changing the velocity by `accel`.
    pub fn step(&mut self, target: Pwm, accel: Pwm) {
        let accel = (accel as i32).max(1);
        let mut delta = target as i32 - self.pos as i32;
        let mut vel = self.vel as i32;

        // Work in the direction of the target, so that `vel` is positive when
        // we're heading toward it.
        let dir = if delta < 0 {
            delta = -delta;
            vel = -vel;
            -1
        } else {
            1
        };

        // The fastest we can be going and still stop by the target.
        let mut vel_limit = 0;
        let mut stopping_dist = 0;
        while stopping_dist < delta {
            vel_limit += accel;
            stopping_dist += vel_limit;
        }

        if delta <= accel && vel.abs() <= accel {
            self.pos = target;
            self.vel = 0;
            return;
        }

        if vel + accel < vel_limit {
            vel += accel;
        } else {
            vel -= accel;
        }
        self.pos = (self.pos as i32 + dir * vel) as Pwm;
        self.vel = (dir * vel) as Pwm;
    }
}

pub fn step_toward(axes: &mut PanTilt<Axis>, target: ServoPoint, accel: ServoPoint) {
    axes.pan.step(target.pan, accel.pan);
    axes.tilt.step(target.tilt, accel.tilt);
}

pub fn is_at(axes: &PanTilt<Axis>, target: ServoPoint) -> bool {
    axes.pan.is_at(target.pan) && axes.tilt.is_at(target.tilt)
}

/// The positions that a pair of axes passes through on the way to a target,
/// one per tick, ending when both have come to rest there.
pub struct SlewIter {
    axes: PanTilt<Axis>,
    target: ServoPoint,
    accel: ServoPoint,
}

impl SlewIter {
    pub fn new(axes: PanTilt<Axis>, target: ServoPoint, accel: ServoPoint) -> Self {
        SlewIter { axes, target, accel }
    }

    /// A move between two points, starting at rest.
    pub fn between(from: ServoPoint, to: ServoPoint, accel: ServoPoint) -> Self {
        SlewIter::new(from.map(Axis::at_rest), to, accel)
    }
}

impl Iterator for SlewIter {
    type Item = ServoPoint;

    fn next(&mut self) -> Option<ServoPoint> {
        if is_at(&self.axes, self.target) {
            return None;
        }
        step_toward(&mut self.axes, self.target, self.accel);
        Some(PanTilt {
            pan: self.axes.pan.pos,
            tilt: self.axes.tilt.pos,
        })
    }
}
