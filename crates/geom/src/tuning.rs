//! Per-rig servo calibration and timing.
//!
//! The conversion from angular index to servo position is linear:
//!
//! ```text
//! pan PWM  = pan  * pan_factor  + pan_offset
//! tilt PWM = tilt * tilt_factor + tilt_offset
//! ```
//!
//! The defaults are correct for one particular rig and probably not yours.
//! To calibrate, first set both factors to zero and adjust the offsets until
//! the rig powers on with level tilt and pan to the right. Then set the
//! factors to 100, aim at pan 6 / tilt 18 (away from you, straight down) and
//! adjust the factors until the rig actually points there. A factor with the
//! wrong sign makes the servo move the wrong way.

use crate::{AimPoint, Angle, PanTilt, Pwm, ServoPoint, ANG_360, PWM_MAX_OFFSET};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TuningError {
    #[error("{name} is {value}, which is outside of +/-1600")]
    OutOfRange { name: &'static str, value: Pwm },
    #[error("{axis} acceleration must be positive, not {value}")]
    Accel { axis: &'static str, value: Pwm },
}

/// The servo calibration and timing of a rig.
///
/// All times are in 50Hz ticks, so 50 is one second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tuning {
    pub pan_factor: Pwm,
    pub pan_offset: Pwm,
    pub tilt_factor: Pwm,
    pub tilt_offset: Pwm,

    /// Shutter servo position while the shutter is pressed.
    pub shutter_down: Pwm,
    /// Shutter servo position at rest.
    pub shutter_up: Pwm,
    /// Hover (portrait/landscape) servo position for landscape shots.
    pub hover_horizontal: Pwm,
    /// Hover servo position for portrait shots.
    pub hover_vertical: Pwm,

    /// Velocity change per tick, in PWM units.
    pub accel: ServoPoint,

    /// How long to wait after the servos stop before the rig counts as stable.
    pub time_stabilizing: u16,
    /// How long the shutter stays pressed.
    pub time_shutter_down: u16,
    /// How long to wait after releasing the shutter before moving again. This
    /// needs to cover the camera's focus and exposure time.
    pub time_shutter_post: u16,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            pan_factor: 133,
            pan_offset: -800,
            tilt_factor: 265,
            tilt_offset: 893,
            shutter_down: 600,
            shutter_up: -600,
            hover_horizontal: 600,
            hover_vertical: -600,
            accel: PanTilt { pan: 1, tilt: 1 },
            // 0.2s
            time_stabilizing: 10,
            // 100ms, fast enough to trigger a GentLED
            time_shutter_down: 5,
            // 700ms, needs to be longer if autofocus is on.
            time_shutter_post: 35,
        }
    }
}

fn clamp_pwm(pwm: i32) -> Pwm {
    pwm.clamp(-(PWM_MAX_OFFSET as i32), PWM_MAX_OFFSET as i32) as Pwm
}

impl Tuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        let positions = [
            ("pan offset", self.pan_offset),
            ("tilt offset", self.tilt_offset),
            ("shutter down position", self.shutter_down),
            ("shutter up position", self.shutter_up),
            ("horizontal hover position", self.hover_horizontal),
            ("vertical hover position", self.hover_vertical),
        ];
        for (name, value) in positions {
            if !(-PWM_MAX_OFFSET..=PWM_MAX_OFFSET).contains(&value) {
                return Err(TuningError::OutOfRange { name, value });
            }
        }
        if self.accel.pan <= 0 {
            return Err(TuningError::Accel {
                axis: "pan",
                value: self.accel.pan,
            });
        }
        if self.accel.tilt <= 0 {
            return Err(TuningError::Accel {
                axis: "tilt",
                value: self.accel.tilt,
            });
        }
        Ok(())
    }

    /// Converts a pan index to PWM.
    ///
    /// Pan is free-running, so the same heading can often be reached from two
    /// indices a full turn apart. Of the candidates that the servo can reach,
    /// we pick the one closest to `current` to avoid long sweeps.
    pub fn pan_to_pwm(&self, pan: Angle, current: Pwm) -> Pwm {
        let to_pwm = |index: i32| index * self.pan_factor as i32 + self.pan_offset as i32;
        let max = PWM_MAX_OFFSET as i32;
        let current = current as i32;

        // On a tie the earlier candidate wins, so the lower turn is preferred.
        [-(ANG_360 as i32), 0, ANG_360 as i32]
            .into_iter()
            .map(|cycle| to_pwm(pan.index() as i32 + cycle))
            .filter(|pwm| (-max..=max).contains(pwm))
            .min_by_key(|pwm| (pwm - current).abs())
            .map(|pwm| pwm as Pwm)
            .unwrap_or_else(|| clamp_pwm(to_pwm(pan.index() as i32)))
    }

    /// Converts a tilt index to PWM, treating indices past a half turn as
    /// negative.
    pub fn tilt_to_pwm(&self, tilt: Angle) -> Pwm {
        clamp_pwm(tilt.signed() * self.tilt_factor as i32 + self.tilt_offset as i32)
    }

    /// Converts an aim point to servo positions, given where the servos are now.
    pub fn to_pwm(&self, aim: AimPoint, current: ServoPoint) -> ServoPoint {
        PanTilt {
            pan: self.pan_to_pwm(aim.pan, current.pan),
            tilt: self.tilt_to_pwm(aim.tilt),
        }
    }

    pub fn shutter_pwm(&self, pressed: bool) -> Pwm {
        if pressed {
            self.shutter_down
        } else {
            self.shutter_up
        }
    }

    pub fn hover_pwm(&self, vertical: bool) -> Pwm {
        if vertical {
            self.hover_vertical
        } else {
            self.hover_horizontal
        }
    }
}

#[derive(Default)]
pub struct TuningBuilder {
    tuning: Tuning,
}

impl TuningBuilder {
    pub fn build(&self) -> Result<Tuning, TuningError> {
        self.tuning.validate()?;
        Ok(self.tuning)
    }

    pub fn with_pan(&mut self, factor: Pwm, offset: Pwm) -> &mut Self {
        self.tuning.pan_factor = factor;
        self.tuning.pan_offset = offset;
        self
    }

    pub fn with_tilt(&mut self, factor: Pwm, offset: Pwm) -> &mut Self {
        self.tuning.tilt_factor = factor;
        self.tuning.tilt_offset = offset;
        self
    }

    pub fn with_shutter(&mut self, down: Pwm, up: Pwm) -> &mut Self {
        self.tuning.shutter_down = down;
        self.tuning.shutter_up = up;
        self
    }

    pub fn with_hover(&mut self, horizontal: Pwm, vertical: Pwm) -> &mut Self {
        self.tuning.hover_horizontal = horizontal;
        self.tuning.hover_vertical = vertical;
        self
    }

    pub fn with_accel(&mut self, pan: Pwm, tilt: Pwm) -> &mut Self {
        self.tuning.accel = PanTilt { pan, tilt };
        self
    }

    pub fn with_stabilizing_time(&mut self, ticks: u16) -> &mut Self {
        self.tuning.time_stabilizing = ticks;
        self
    }

    pub fn with_shutter_times(&mut self, down: u16, post: u16) -> &mut Self {
        self.tuning.time_shutter_down = down;
        self.tuning.time_shutter_post = post;
        self
    }
}
