#![cfg_attr(not(feature = "std"), no_std)]

//! The kaptx rig controller.
//!
//! Four state machines share one [`Model`] and run in a fixed order every
//! 20ms tick: the joystick [`Gestures`] adjust the aim and settings, the
//! [`Shooter`] queues shots, the [`Slew`] moves the servos, and the
//! [`Shutter`] fires the camera once the servos have settled.
//!
//! [`Rig`] wires the controller up to the hardware through the [`Joystick`],
//! [`Ppm`] and [`Display`] traits.

use kaptx_protocol::{JsReading, PpmFrame, Status};

pub mod gesture;
pub mod model;
pub mod shoot;
pub mod shutter;
pub mod slew;

pub use gesture::{GestureState, Gestures};
pub use model::{Model, ShotQueue};
pub use shoot::Shooter;
pub use shutter::{Shutter, ShutterState};
pub use slew::{Slew, SlewState};

/// The four state machines, in the order they run.
#[derive(Clone, Debug, Default)]
pub struct Controller {
    pub gestures: Gestures,
    pub shooter: Shooter,
    pub slew: Slew,
    pub shutter: Shutter,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one tick. Returns the number of shots queued this tick.
    pub fn update(&mut self, reading: JsReading, model: &mut Model) -> usize {
        let press = self.gestures.update(reading, model);
        let queued = self.shooter.update(press, model);
        self.slew.update(model, self.shutter.is_idle());
        self.shutter.update(model);
        queued
    }
}

pub trait Joystick {
    /// The current stick position, and the button press if there was one
    /// since the last poll.
    fn poll(&mut self) -> JsReading;
}

pub trait Ppm {
    fn write(&mut self, frame: &PpmFrame);
}

pub trait Display {
    fn render(&mut self, status: &Status);
}

/// A controller and a model, hooked up to some hardware.
pub struct Rig<J, P, D> {
    pub controller: Controller,
    pub model: Model,
    pub joystick: J,
    pub ppm: P,
    pub display: D,
}

impl<J: Joystick, P: Ppm, D: Display> Rig<J, P, D> {
    pub fn new(model: Model, joystick: J, ppm: P, display: D) -> Self {
        Rig {
            controller: Controller::new(),
            model,
            joystick,
            ppm,
            display,
        }
    }

    /// Reads the joystick, runs the controller, and updates the outputs.
    ///
    /// The caller is responsible for pacing this to once per frame.
    pub fn tick(&mut self) -> usize {
        let reading = self.joystick.poll();
        let queued = self.controller.update(reading, &mut self.model);
        self.ppm.write(&self.model.ppm_frame());
        if self.model.refresh().intersects(kaptx_protocol::Refresh::CHANGES) {
            let status = self.model.read_status();
            self.display.render(&status);
        }
        queued
    }

    /// Whether there's nothing left to do: no shots waiting and the servos
    /// at rest.
    pub fn is_settled(&self) -> bool {
        self.model.shots_queued() == 0
            && self.controller.shutter.is_idle()
            && self.controller.slew.state() == SlewState::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaptx_geom::{from_polar, AimPoint, JsVector, PanTilt, TILT_MAX};
    use kaptx_planner::{slew::is_at, ShootMode};
    use kaptx_protocol::{Channel, Press, ShutterIndicator};
    use proptest::prelude::*;

    // A scripted joystick: each entry is a position and whether the button
    // was pressed.
    struct Script(std::collections::VecDeque<(JsVector, bool)>);

    impl Joystick for Script {
        fn poll(&mut self) -> JsReading {
            match self.0.pop_front() {
                Some((pos, true)) => JsReading::pressed(pos),
                Some((pos, false)) => JsReading::new(pos),
                None => JsReading::default(),
            }
        }
    }

    #[derive(Default)]
    struct Frames(Vec<PpmFrame>);

    impl Ppm for Frames {
        fn write(&mut self, frame: &PpmFrame) {
            self.0.push(*frame);
        }
    }

    #[derive(Default)]
    struct Screen(Vec<Status>);

    impl Display for Screen {
        fn render(&mut self, status: &Status) {
            self.0.push(*status);
        }
    }

    fn press_at_center() -> Vec<(JsVector, bool)> {
        vec![(JsVector::zero(), true)]
    }

    fn rig(script: Vec<(JsVector, bool)>) -> Rig<Script, Frames, Screen> {
        Rig::new(
            Model::default(),
            Script(script.into()),
            Frames::default(),
            Screen::default(),
        )
    }

    fn run_until_settled(rig: &mut Rig<Script, Frames, Screen>) -> usize {
        let mut ticks = 0;
        loop {
            rig.tick();
            ticks += 1;
            if rig.is_settled() && rig.joystick.0.is_empty() {
                return ticks;
            }
            assert!(ticks < 10_000, "rig never settled");
        }
    }

    #[test]
    fn single_shot() {
        let mut rig = rig(press_at_center());
        rig.tick();
        assert_eq!(rig.model.shots_queued(), 1);
        run_until_settled(&mut rig);

        // Exactly one shutter press, at the home position.
        let pressed: Vec<_> = rig
            .ppm
            .0
            .iter()
            .filter(|f| f.get(Channel::Shutter) == rig.model.tuning().shutter_down)
            .collect();
        let tuning = *rig.model.tuning();
        assert_eq!(pressed.len(), tuning.time_shutter_down as usize + 1);
        let home = tuning.to_pwm(AimPoint::new(6, 0), PanTilt::default());
        assert!(pressed.iter().all(|f| f.get(Channel::Pan) == home.pan && f.get(Channel::Tilt) == home.tilt));
    }

    #[test]
    fn shutter_only_fires_when_stable() {
        let mut script = vec![];
        // Bump right, then press.
        script.push((from_polar(0.0, 480.0), false));
        script.push((JsVector::zero(), true));
        let mut rig = rig(script);

        let mut moving_while_pressed = false;
        for _ in 0..400 {
            rig.tick();
            let state = rig.controller.shutter.state();
            if state == ShutterState::Down && rig.controller.slew.state() != SlewState::Stable {
                moving_while_pressed = true;
            }
        }
        assert!(!moving_while_pressed);
        assert_eq!(rig.model.shots_queued(), 0);
        assert_eq!(rig.model.user().pan, kaptx_geom::Angle::new(5));
    }

    #[test]
    fn cluster_shots_are_visited_in_order() {
        let mut model = Model::default();
        let mut controller = Controller::new();
        model.set_tilt(TILT_MAX);
        model.set_display_mode(ShootMode::Cluster);
        model.commit_display_mode();

        controller.update(JsReading::pressed(JsVector::zero()), &mut model);
        let expected: Vec<_> = model.queue().iter().copied().collect();
        assert_eq!(expected.len(), 7);

        let mut visited = Vec::new();
        for _ in 0..5000 {
            controller.update(JsReading::default(), &mut model);
            if model.shutter_state() == ShutterState::Down && visited.last() != Some(&model.servo_position()) {
                visited.push(model.servo_position());
            }
        }
        assert_eq!(visited, expected);
    }

    #[test]
    fn display_sees_every_change() {
        let mut rig = rig(press_at_center());
        rig.tick();
        let first = rig.display.0[0];
        assert_eq!(first.shots_queued, 1);
        assert_eq!(rig.model.shutter_indicator(), ShutterIndicator::Active);
        run_until_settled(&mut rig);
        let last = rig.display.0.last().copied();
        assert_eq!(last.map(|s| s.shots_queued), Some(0));
        assert_eq!(last.map(|s| s.shutter), Some(ShutterIndicator::Ready));
    }

    #[test]
    fn auto_keeps_shooting() {
        let mut model = Model::default();
        let mut controller = Controller::new();
        model.set_auto(true);
        let mut total = 0;
        for _ in 0..500 {
            total += controller.update(JsReading::default(), &mut model);
        }
        assert!(total > 5, "only {total} shots");
    }

    #[test]
    fn press_cannot_trigger_twice() {
        let mut model = Model::default();
        let mut controller = Controller::new();
        let mut reading = JsReading::pressed(JsVector::zero());
        let press: Option<Press> = reading.take_press();
        assert!(press.is_some());
        // The press has been taken, so the controller doesn't see one.
        assert_eq!(controller.update(reading, &mut model), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Random stick waggling and pressing never breaks the invariants.
        #[test]
        fn random_sessions(steps in proptest::collection::vec((0f32..360.0, 0f32..520.0, any::<bool>()), 0..300)) {
            let mut model = Model::default();
            let mut controller = Controller::new();
            for (deg, radius, press) in steps {
                let pos = from_polar(deg, radius);
                let reading = if press { JsReading::pressed(pos) } else { JsReading::new(pos) };
                let shutter_before = controller.shutter.state();
                controller.update(reading, &mut model);

                prop_assert!(model.shots_queued() <= kaptx_planner::MAX_SHOTS);
                prop_assert!(model.user().tilt.is_tilt_reachable());
                let pos = model.servo_position();
                prop_assert!(pos.pan.abs() <= kaptx_geom::PWM_MAX_OFFSET);
                prop_assert!(pos.tilt.abs() <= kaptx_geom::PWM_MAX_OFFSET);
                if shutter_before == ShutterState::Triggered && controller.shutter.state() == ShutterState::Down {
                    prop_assert_eq!(controller.slew.state(), SlewState::Stable);
                    prop_assert!(is_at(&model.servos(), model.goal()));
                }
            }
        }
    }
}
