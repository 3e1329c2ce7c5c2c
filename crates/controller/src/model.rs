//! The rig's shared state.
//!
//! Every state machine reads and writes the model, one after the other, once
//! per tick. The display reads it (through [`Model::read_status`]) whenever
//! it gets around to it.

use heapless::Deque;
use kaptx_geom::{AimPoint, Angle, PanTilt, ServoPoint, Tuning, HOME};
use kaptx_planner::{Axis, ShootMode, MAX_SHOTS};
use kaptx_protocol::{Channel, PpmFrame, Refresh, ShutterIndicator, Status};

use crate::shutter::ShutterState;

pub type ShotQueue = Deque<ServoPoint, MAX_SHOTS>;

#[derive(Clone, Debug)]
pub struct Model {
    tuning: Tuning,

    user: AimPoint,
    servos: PanTilt<Axis>,
    shutter_pressed: bool,

    shoot_mode: ShootMode,
    shoot_mode_display: ShootMode,
    queue: ShotQueue,

    hover_vertical: bool,
    auto: bool,

    shutter_state: ShutterState,
    slew_stable: bool,
    indicator: ShutterIndicator,

    refresh: Refresh,
}

impl Default for Model {
    fn default() -> Self {
        Model::new(Tuning::default())
    }
}

impl Model {
    /// A model aimed at [`HOME`], with the servos already there.
    pub fn new(tuning: Tuning) -> Self {
        let servos = tuning.to_pwm(HOME, PanTilt::default()).map(Axis::at_rest);
        let mut model = Model {
            tuning,
            user: HOME,
            servos,
            shutter_pressed: false,
            shoot_mode: ShootMode::Single,
            shoot_mode_display: ShootMode::Single,
            queue: ShotQueue::new(),
            hover_vertical: false,
            auto: false,
            shutter_state: ShutterState::Idle,
            slew_stable: true,
            indicator: ShutterIndicator::No,
            refresh: Refresh::default(),
        };
        model.update_indicator();
        model
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn user(&self) -> AimPoint {
        self.user
    }

    pub fn set_pan(&mut self, pan: Angle) {
        if self.user.pan != pan {
            self.user.pan = pan;
            self.refresh |= Refresh::PAN_TILT;
        }
    }

    pub fn adj_pan(&mut self, adj: i32) {
        self.user.pan = self.user.pan + adj;
        self.refresh |= Refresh::PAN_TILT;
    }

    /// Sets the tilt, pulling it out of the dead zone if necessary.
    pub fn set_tilt(&mut self, tilt: Angle) {
        let tilt = tilt.clamp_tilt();
        if self.user.tilt != tilt {
            self.user.tilt = tilt;
            self.refresh |= Refresh::PAN_TILT;
        }
    }

    /// Nudges the tilt by one step. At the limits, nudging further does nothing.
    pub fn adj_tilt(&mut self, adj: i32) {
        let tilt = self.user.tilt.adj_tilt(adj);
        if tilt != self.user.tilt {
            self.user.tilt = tilt;
            self.refresh |= Refresh::PAN_TILT;
        }
    }

    pub fn hover_vertical(&self) -> bool {
        self.hover_vertical
    }

    pub fn set_hover(&mut self, vertical: bool) {
        if self.hover_vertical != vertical {
            self.hover_vertical = vertical;
            self.refresh |= Refresh::HOVER;
        }
    }

    pub fn blink_hover(&mut self, on: bool) {
        self.refresh.set(Refresh::INV_HOVER, on);
        self.refresh |= Refresh::HOVER;
    }

    pub fn auto(&self) -> bool {
        self.auto
    }

    pub fn set_auto(&mut self, auto: bool) {
        if self.auto != auto {
            log::debug!("auto mode {}", if auto { "on" } else { "off" });
            self.auto = auto;
            self.refresh |= Refresh::AUTO_COUNT;
        }
        self.update_indicator();
    }

    pub fn blink_auto(&mut self, on: bool) {
        self.refresh.set(Refresh::INV_AUTO_COUNT, on);
        self.refresh |= Refresh::AUTO_COUNT;
    }

    /// The mode that triggers actually shoot.
    pub fn shoot_mode(&self) -> ShootMode {
        self.shoot_mode
    }

    /// The mode on the display, which may be a mode still being chosen.
    pub fn shoot_mode_display(&self) -> ShootMode {
        self.shoot_mode_display
    }

    pub fn set_display_mode(&mut self, mode: ShootMode) {
        if self.shoot_mode_display != mode {
            self.shoot_mode_display = mode;
            self.refresh |= Refresh::SHOOT_MODE;
        }
    }

    /// Makes the displayed mode the active one.
    pub fn commit_display_mode(&mut self) {
        if self.shoot_mode != self.shoot_mode_display {
            log::debug!(
                "shoot mode {} -> {}",
                self.shoot_mode.name(),
                self.shoot_mode_display.name()
            );
        }
        self.shoot_mode = self.shoot_mode_display;
        self.refresh |= Refresh::SHOOT_MODE;
    }

    pub fn blink_mode(&mut self, on: bool) {
        self.refresh.set(Refresh::INV_SHOOT_MODE, on);
        self.refresh |= Refresh::SHOOT_MODE;
    }

    /// The refresh and invert bits, without clearing anything.
    pub fn refresh(&self) -> Refresh {
        self.refresh
    }

    /// Snapshot for the display. This clears the change bits (but not the
    /// invert bits), so each change gets drawn once.
    pub fn read_status(&mut self) -> Status {
        let status = Status {
            refresh: self.refresh,
            user: self.user,
            shoot_mode: self.shoot_mode_display,
            auto: self.auto,
            shots_queued: self.queue.len() as u8,
            hover_vertical: self.hover_vertical,
            shutter: self.indicator,
        };
        self.refresh.remove(Refresh::CHANGES);
        status
    }

    pub fn shutter_indicator(&self) -> ShutterIndicator {
        self.indicator
    }

    /// Where the servos are headed: the next shot if there is one, or else
    /// wherever the user is pointing.
    pub fn goal(&self) -> ServoPoint {
        match self.queue.front() {
            Some(shot) => *shot,
            None => self.tuning.to_pwm(self.user, self.servo_position()),
        }
    }

    pub fn at_goal(&self) -> bool {
        kaptx_planner::slew::is_at(&self.servos, self.goal())
    }

    /// Converts a shot to servo positions and adds it to the queue.
    ///
    /// Returns `false` (and drops the shot) if the queue is full.
    pub fn queue_shot(&mut self, aim: AimPoint) -> bool {
        let pwm = self.tuning.to_pwm(aim, self.servo_position());
        if self.queue.push_back(pwm).is_err() {
            log::warn!("shot queue full, dropping {aim:?}");
            return false;
        }
        self.refresh |= Refresh::AUTO_COUNT;
        true
    }

    pub fn shots_queued(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &ShotQueue {
        &self.queue
    }

    pub fn dequeue_shot(&mut self) -> Option<ServoPoint> {
        let shot = self.queue.pop_front()?;
        self.refresh |= Refresh::AUTO_COUNT;
        Some(shot)
    }

    pub fn servos(&self) -> PanTilt<Axis> {
        self.servos
    }

    pub fn set_servos(&mut self, servos: PanTilt<Axis>) {
        self.servos = servos;
    }

    pub fn servo_position(&self) -> ServoPoint {
        self.servos.map(|axis| axis.pos)
    }

    pub fn shutter_pressed(&self) -> bool {
        self.shutter_pressed
    }

    pub fn set_shutter(&mut self, pressed: bool) {
        self.shutter_pressed = pressed;
    }

    pub fn shutter_state(&self) -> ShutterState {
        self.shutter_state
    }

    pub fn set_shutter_state(&mut self, state: ShutterState) {
        self.shutter_state = state;
        self.update_indicator();
    }

    pub fn slew_stable(&self) -> bool {
        self.slew_stable
    }

    pub fn set_slew_stable(&mut self, stable: bool) {
        self.slew_stable = stable;
        self.update_indicator();
    }

    /// The servo outputs for this tick.
    pub fn ppm_frame(&self) -> PpmFrame {
        let pos = self.servo_position();
        let mut frame = PpmFrame::default();
        frame.set(Channel::Pan, pos.pan);
        frame.set(Channel::Tilt, pos.tilt);
        frame.set(Channel::Shutter, self.tuning.shutter_pwm(self.shutter_pressed));
        frame.set(Channel::Hover, self.tuning.hover_pwm(self.hover_vertical));
        frame
    }

    fn update_indicator(&mut self) {
        let indicator = match self.shutter_state {
            ShutterState::Down => ShutterIndicator::Triggered,
            ShutterState::Post | ShutterState::Triggered => ShutterIndicator::Active,
            ShutterState::Idle if !self.auto && self.slew_stable => ShutterIndicator::Ready,
            ShutterState::Idle => ShutterIndicator::No,
        };
        if indicator != self.indicator {
            self.indicator = indicator;
            self.refresh |= Refresh::SHUTTER;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaptx_geom::{TILT_MAX, TILT_MIN};

    #[test]
    fn starts_at_home() {
        let mut model = Model::default();
        assert_eq!(model.user(), HOME);
        assert!(model.at_goal());
        assert_eq!(model.shutter_indicator(), ShutterIndicator::Ready);
        let status = model.read_status();
        assert!(status.refresh.contains(Refresh::CHANGES));
        assert!(!model.read_status().is_dirty());
    }

    #[test]
    fn read_keeps_invert_bits() {
        let mut model = Model::default();
        model.read_status();
        model.blink_hover(true);
        let status = model.read_status();
        assert!(status.refresh.contains(Refresh::HOVER | Refresh::INV_HOVER));
        let status = model.read_status();
        assert_eq!(status.refresh, Refresh::INV_HOVER);

        model.blink_hover(false);
        assert_eq!(model.read_status().refresh, Refresh::HOVER);
    }

    #[test]
    fn tilt_edits() {
        let mut model = Model::default();
        model.set_tilt(Angle::new(5));
        assert_eq!(model.user().tilt, TILT_MAX);
        model.set_tilt(Angle::new(12));
        assert_eq!(model.user().tilt, TILT_MIN);

        model.read_status();
        model.adj_tilt(-1);
        assert_eq!(model.user().tilt, TILT_MIN);
        assert!(!model.read_status().is_dirty());
    }

    #[test]
    fn pan_wraps() {
        let mut model = Model::default();
        model.set_pan(Angle::new(23));
        model.adj_pan(1);
        assert_eq!(model.user().pan, Angle::new(0));
        model.adj_pan(-1);
        assert_eq!(model.user().pan, Angle::new(23));
    }

    #[test]
    fn full_queue_drops_shots() {
        let mut model = Model::default();
        for i in 0..MAX_SHOTS {
            assert!(model.queue_shot(AimPoint::new(i as i32, 0)));
        }
        let before = model.queue().clone();
        assert!(!model.queue_shot(AimPoint::new(0, 18)));
        assert_eq!(model.shots_queued(), MAX_SHOTS);
        assert!(model.queue().iter().eq(before.iter()));

        for _ in 0..MAX_SHOTS {
            assert!(model.dequeue_shot().is_some());
        }
        assert_eq!(model.dequeue_shot(), None);
        assert_eq!(model.shots_queued(), 0);
    }

    #[test]
    fn goal_follows_queue() {
        let mut model = Model::default();
        let user_goal = model.goal();
        model.queue_shot(AimPoint::new(0, 18));
        assert_eq!(model.goal(), model.tuning().to_pwm(AimPoint::new(0, 18), user_goal));
        assert!(!model.at_goal());
        model.dequeue_shot();
        assert_eq!(model.goal(), user_goal);
    }

    #[test]
    fn indicator() {
        let mut model = Model::default();
        model.set_slew_stable(false);
        assert_eq!(model.shutter_indicator(), ShutterIndicator::No);
        model.set_slew_stable(true);
        model.set_auto(true);
        assert_eq!(model.shutter_indicator(), ShutterIndicator::No);
        model.set_shutter_state(ShutterState::Triggered);
        assert_eq!(model.shutter_indicator(), ShutterIndicator::Active);
        model.set_shutter_state(ShutterState::Down);
        assert_eq!(model.shutter_indicator(), ShutterIndicator::Triggered);
        model.read_status();
        model.set_shutter_state(ShutterState::Post);
        assert!(model.read_status().refresh.contains(Refresh::SHUTTER));
    }

    #[test]
    fn outputs() {
        let mut model = Model::default();
        model.set_hover(true);
        model.set_shutter(true);
        let frame = model.ppm_frame();
        assert_eq!(frame.get(Channel::Pan), -2);
        assert_eq!(frame.get(Channel::Tilt), 893);
        assert_eq!(frame.get(Channel::Shutter), 600);
        assert_eq!(frame.get(Channel::Hover), -600);
    }
}
