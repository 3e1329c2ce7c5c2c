use kaptx_planner::slew::step_toward;

use crate::model::Model;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SlewState {
    /// At the goal and settled.
    #[default]
    Stable = 0,
    Moving = 1,
    /// At the goal, waiting for the rig to stop swinging.
    Stabilizing = 2,
}

impl From<u8> for SlewState {
    fn from(raw: u8) -> Self {
        match raw {
            1 => SlewState::Moving,
            2 => SlewState::Stabilizing,
            _ => SlewState::Stable,
        }
    }
}

/// Moves the servos toward the model's goal.
#[derive(Clone, Debug, Default)]
pub struct Slew {
    state: SlewState,
    timer: u16,
}

impl Slew {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SlewState {
        self.state
    }

    /// Runs one tick. New moves only start if `shutter_idle`, but a move
    /// that's already underway keeps going.
    pub fn update(&mut self, model: &mut Model, shutter_idle: bool) {
        let prev = self.state;
        match self.state {
            SlewState::Stable => {
                if shutter_idle && !model.at_goal() {
                    self.state = SlewState::Moving;
                    move_servos(model);
                }
            }
            SlewState::Moving => {
                if model.at_goal() {
                    self.timer = model.tuning().time_stabilizing;
                    self.state = SlewState::Stabilizing;
                } else {
                    move_servos(model);
                }
            }
            SlewState::Stabilizing => {
                if !model.at_goal() {
                    self.timer = 0;
                    self.state = SlewState::Moving;
                    move_servos(model);
                } else if self.timer > 0 {
                    self.timer -= 1;
                } else {
                    self.state = SlewState::Stable;
                }
            }
        }
        if prev != self.state {
            log::debug!("slew {prev:?} -> {:?}", self.state);
        }
        model.set_slew_stable(self.state == SlewState::Stable);
    }

    /// Restores a state read back from storage or a script. Unknown values
    /// mean stable.
    pub fn restore(&mut self, raw: u8) {
        self.state = SlewState::from(raw);
        if self.state as u8 != raw {
            log::warn!("unknown slew state {raw}, reset to {:?}", self.state);
        }
        self.timer = 0;
    }
}

fn move_servos(model: &mut Model) {
    let goal = model.goal();
    let mut servos = model.servos();
    step_toward(&mut servos, goal, model.tuning().accel);
    log::trace!("servos {:?} -> {:?}", servos.map(|a| a.pos), goal);
    model.set_servos(servos);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaptx_geom::{AimPoint, Angle};

    fn run_until_stable(slew: &mut Slew, model: &mut Model) -> usize {
        let mut ticks = 0;
        loop {
            slew.update(model, true);
            ticks += 1;
            if slew.state() == SlewState::Stable {
                return ticks;
            }
            assert!(ticks < 1000, "never settled");
        }
    }

    #[test]
    fn stays_put_at_goal() {
        let mut model = Model::default();
        let mut slew = Slew::new();
        slew.update(&mut model, true);
        assert_eq!(slew.state(), SlewState::Stable);
        assert!(model.slew_stable());
    }

    #[test]
    fn follows_user() {
        let mut model = Model::default();
        let mut slew = Slew::new();
        model.set_pan(Angle::new(7));

        slew.update(&mut model, true);
        assert_eq!(slew.state(), SlewState::Moving);
        assert!(!model.slew_stable());

        run_until_stable(&mut slew, &mut model);
        assert!(model.at_goal());
        assert_eq!(model.servo_position().pan, 7 * 133 - 800);
    }

    #[test]
    fn settle_time() {
        let mut model = Model::default();
        let mut slew = Slew::new();
        model.set_tilt(Angle::new(1));
        while slew.state() != SlewState::Stabilizing {
            slew.update(&mut model, true);
        }
        let mut ticks = 0;
        while slew.state() == SlewState::Stabilizing {
            assert!(!model.slew_stable());
            slew.update(&mut model, true);
            ticks += 1;
        }
        assert_eq!(ticks, model.tuning().time_stabilizing as usize + 1);
        assert!(model.slew_stable());
    }

    #[test]
    fn goal_change_while_settling() {
        let mut model = Model::default();
        let mut slew = Slew::new();
        model.set_tilt(Angle::new(1));
        while slew.state() != SlewState::Stabilizing {
            slew.update(&mut model, true);
        }
        model.queue_shot(AimPoint::new(6, 23));
        slew.update(&mut model, false);
        assert_eq!(slew.state(), SlewState::Moving);
    }

    #[test]
    fn busy_shutter_blocks_new_moves() {
        let mut model = Model::default();
        let mut slew = Slew::new();
        model.set_pan(Angle::new(12));
        for _ in 0..5 {
            slew.update(&mut model, false);
            assert_eq!(slew.state(), SlewState::Stable);
        }
        assert!(!model.at_goal());
        slew.update(&mut model, true);
        assert_eq!(slew.state(), SlewState::Moving);
    }

    #[test]
    fn bad_state_resets() {
        let mut slew = Slew::new();
        slew.restore(7);
        assert_eq!(slew.state(), SlewState::Stable);
    }
}
