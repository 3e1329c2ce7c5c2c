//! Camera shutter sequencing.
//!
//! Once shots are queued, we wait for the rig to settle, hold the shutter
//! down for a moment, release it, and give the camera time to finish before
//! dropping the shot from the queue.

use crate::model::Model;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShutterState {
    #[default]
    Idle = 0,
    /// A shot is queued; waiting for the rig to be stable.
    Triggered = 1,
    /// The shutter is pressed.
    Down = 2,
    /// The shutter is released and the camera is busy.
    Post = 3,
}

impl From<u8> for ShutterState {
    fn from(raw: u8) -> Self {
        match raw {
            1 => ShutterState::Triggered,
            2 => ShutterState::Down,
            3 => ShutterState::Post,
            _ => ShutterState::Idle,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Shutter {
    state: ShutterState,
    timer: u16,
}

impl Shutter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ShutterState {
        self.state
    }

    /// The slew only starts new moves while this is true.
    pub fn is_idle(&self) -> bool {
        self.state == ShutterState::Idle
    }

    pub fn update(&mut self, model: &mut Model) {
        let prev = self.state;
        match self.state {
            ShutterState::Idle => {
                if model.shots_queued() > 0 {
                    self.state = ShutterState::Triggered;
                }
            }
            ShutterState::Triggered => {
                if model.slew_stable() {
                    model.set_shutter(true);
                    self.timer = model.tuning().time_shutter_down;
                    self.state = ShutterState::Down;
                }
            }
            ShutterState::Down => {
                if self.timer > 0 {
                    self.timer -= 1;
                } else {
                    model.set_shutter(false);
                    self.timer = model.tuning().time_shutter_post;
                    self.state = ShutterState::Post;
                }
            }
            ShutterState::Post => {
                if self.timer > 0 {
                    self.timer -= 1;
                } else {
                    if let Some(shot) = model.dequeue_shot() {
                        log::debug!("shot at {shot:?} done, {} left", model.shots_queued());
                    }
                    self.state = ShutterState::Idle;
                }
            }
        }
        if prev != self.state {
            log::debug!("shutter {prev:?} -> {:?}", self.state);
        }
        model.set_shutter_state(self.state);
    }

    /// Restores a state read back from storage or a script. Unknown values
    /// put the shutter back to idle.
    pub fn restore(&mut self, raw: u8) {
        self.state = ShutterState::from(raw);
        if self.state as u8 != raw {
            log::warn!("unknown shutter state {raw}, reset to {:?}", self.state);
        }
        self.timer = 0;
    }
}
