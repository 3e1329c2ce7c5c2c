//! Turning joystick movement into aim and setting changes.
//!
//! A quick push and release (a "bump") nudges the aim by one step. Pushing
//! and then sliding sideways switches to tracking, where the aim follows the
//! stick's direction until it's released. Pushing toward one of the
//! diagonals enters a setting (shoot mode, hover orientation, auto mode)
//! that follows the stick until release.

use kaptx_geom::{Angle, JsVector, JS_SLIDE};
use kaptx_planner::ShootMode;
use kaptx_protocol::{JsReading, Press};

use crate::model::Model;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GestureState {
    #[default]
    Idle = 0,
    Right = 1,
    Left = 2,
    Up = 3,
    Down = 4,
    SetPan = 5,
    SetTilt = 6,
    SetMode = 7,
    SetHover = 8,
    SetAuto = 9,
}

impl From<u8> for GestureState {
    fn from(raw: u8) -> Self {
        match raw {
            1 => GestureState::Right,
            2 => GestureState::Left,
            3 => GestureState::Up,
            4 => GestureState::Down,
            5 => GestureState::SetPan,
            6 => GestureState::SetTilt,
            7 => GestureState::SetMode,
            8 => GestureState::SetHover,
            9 => GestureState::SetAuto,
            _ => GestureState::Idle,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Gestures {
    state: GestureState,
    // Where the stick was when the gesture started, for detecting slides.
    slide_start: JsVector,
}

impl Gestures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Handles one joystick reading, and passes on the button press if there
    /// was one.
    pub fn update(&mut self, mut js: JsReading, model: &mut Model) -> Option<Press> {
        let prev = self.state;
        match self.state {
            GestureState::Idle => {
                if js.is_out() {
                    self.start(&js, model);
                }
            }
            GestureState::Right | GestureState::Left => {
                if js.is_center() {
                    model.adj_pan(if self.state == GestureState::Right { -1 } else { 1 });
                    self.state = GestureState::Idle;
                } else if (js.pos.y - self.slide_start.y).abs() > JS_SLIDE {
                    self.state = GestureState::SetPan;
                    track_pan(&js, model);
                }
            }
            GestureState::Up => {
                if js.is_center() {
                    model.adj_tilt(1);
                    self.state = GestureState::Idle;
                }
            }
            GestureState::Down => {
                if js.is_center() {
                    model.adj_tilt(-1);
                    self.state = GestureState::Idle;
                } else if (js.pos.x - self.slide_start.x).abs() > JS_SLIDE {
                    self.state = GestureState::SetTilt;
                    track_tilt(&js, model);
                }
            }
            GestureState::SetPan => {
                if js.is_center() {
                    self.state = GestureState::Idle;
                } else {
                    track_pan(&js, model);
                }
            }
            GestureState::SetTilt => {
                if js.is_center() {
                    self.state = GestureState::Idle;
                } else {
                    track_tilt(&js, model);
                }
            }
            GestureState::SetMode => {
                if js.is_center() {
                    model.commit_display_mode();
                    model.blink_mode(false);
                    self.state = GestureState::Idle;
                } else {
                    track_mode(&js, model);
                }
            }
            GestureState::SetHover => {
                if js.is_center() {
                    model.blink_hover(false);
                    self.state = GestureState::Idle;
                } else {
                    track_hover(&js, model);
                }
            }
            GestureState::SetAuto => {
                if js.is_center() {
                    model.blink_auto(false);
                    self.state = GestureState::Idle;
                } else {
                    track_auto(&js, model);
                }
            }
        }
        if prev != self.state {
            log::debug!("gesture {prev:?} -> {:?}", self.state);
        }
        js.take_press()
    }

    fn start(&mut self, js: &JsReading, model: &mut Model) {
        self.slide_start = js.pos;
        self.state = match js.sector16() {
            0 | 15 => GestureState::Right,
            1 | 2 => {
                model.set_display_mode(ShootMode::Single);
                track_mode(js, model);
                model.blink_mode(true);
                GestureState::SetMode
            }
            3 | 4 => GestureState::Up,
            5 | 6 => {
                model.blink_auto(true);
                GestureState::SetAuto
            }
            7 | 8 => GestureState::Left,
            11 | 12 => GestureState::Down,
            13 | 14 => {
                model.blink_hover(true);
                GestureState::SetHover
            }
            // 9 and 10 are spare.
            _ => GestureState::Idle,
        };
    }

    /// Restores a state read back from storage or a script. Unknown values
    /// mean idle.
    pub fn restore(&mut self, raw: u8) {
        self.state = GestureState::from(raw);
        if self.state as u8 != raw {
            log::warn!("unknown gesture state {raw}, reset to {:?}", self.state);
        }
    }
}

fn track_pan(js: &JsReading, model: &mut Model) {
    model.set_pan(Angle::new(js.sector24().into()));
}

fn track_tilt(js: &JsReading, model: &mut Model) {
    model.set_tilt(Angle::new(js.sector24().into()));
}

fn track_mode(js: &JsReading, model: &mut Model) {
    let mode = match js.sector24() {
        3 => ShootMode::Single,
        1 => ShootMode::Cluster,
        23 => ShootMode::Vpan,
        21 => ShootMode::Hpan,
        5 => ShootMode::Quad,
        7 => ShootMode::Pan360,
        // Pointing back toward the operator means "never mind".
        9..=19 => model.shoot_mode(),
        _ => model.shoot_mode_display(),
    };
    model.set_display_mode(mode);
}

fn track_hover(js: &JsReading, model: &mut Model) {
    match js.sector16() {
        0 | 7 | 8 | 15 => model.set_hover(false),
        3 | 4 | 11 | 12 => model.set_hover(true),
        _ => {}
    }
}

fn track_auto(js: &JsReading, model: &mut Model) {
    match js.sector16() {
        3 | 4 => model.set_auto(true),
        7 | 8 => model.set_auto(false),
        _ => {}
    }
}
