use anyhow::anyhow;
use kaptx_controller::{Display, Model, Ppm, Rig};
use kaptx_planner::SlewIter;
use kaptx_protocol::{Channel, PpmFrame, Status, MAX_FRAME_LEN};

use crate::script::{Script, ScriptedJoystick};

/// Keeps every frame written to the servos.
#[derive(Default)]
pub struct FrameRecorder {
    pub frames: Vec<PpmFrame>,
}

impl Ppm for FrameRecorder {
    fn write(&mut self, frame: &PpmFrame) {
        self.frames.push(*frame);
    }
}

impl FrameRecorder {
    /// The ticks on which the shutter went down.
    pub fn shutter_presses(&self, down: i16) -> Vec<usize> {
        let mut was_down = false;
        let mut ret = Vec::new();
        for (tick, frame) in self.frames.iter().enumerate() {
            let is_down = frame.get(Channel::Shutter) == down;
            if is_down && !was_down {
                ret.push(tick);
            }
            was_down = is_down;
        }
        ret
    }

    /// All the frames, COBS-framed back to back.
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let mut ret = Vec::with_capacity(self.frames.len() * MAX_FRAME_LEN);
        let mut buf = [0u8; MAX_FRAME_LEN];
        for frame in &self.frames {
            let encoded = frame
                .encode(&mut buf)
                .map_err(|e| anyhow!("failed to encode {frame:?}: {e}"))?;
            ret.extend_from_slice(encoded);
        }
        Ok(ret)
    }
}

/// A display that logs what it would show.
#[derive(Default)]
pub struct LogDisplay {
    pub renders: usize,
    pub last: Option<Status>,
}

impl Display for LogDisplay {
    fn render(&mut self, status: &Status) {
        log::info!("display: {status}");
        self.renders += 1;
        self.last = Some(*status);
    }
}

pub type BenchRig = Rig<ScriptedJoystick, FrameRecorder, LogDisplay>;

pub struct Simulation {
    pub rig: BenchRig,
    pub ticks: usize,
    pub shots_queued: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub ticks: usize,
    pub shots_queued: usize,
    pub shots_fired: usize,
    pub settled: bool,
}

impl Simulation {
    pub fn new(script: &Script) -> Self {
        let model = Model::new(script.tuning());
        let rig = Rig::new(
            model,
            ScriptedJoystick::new(script),
            FrameRecorder::default(),
            LogDisplay::default(),
        );
        Simulation {
            rig,
            ticks: 0,
            shots_queued: 0,
        }
    }

    /// Whether the script is over and the rig has nothing left to do.
    pub fn is_finished(&self) -> bool {
        self.rig.joystick.is_done() && self.rig.is_settled()
    }

    pub fn step(&mut self) {
        let queued = self.rig.tick();
        self.ticks += 1;
        if queued > 0 {
            self.shots_queued += queued;
            let model = &self.rig.model;
            let first_move = SlewIter::new(model.servos(), model.goal(), model.tuning().accel).count();
            log::info!(
                "tick {}: queued {queued} shots, first move takes {first_move} ticks",
                self.ticks
            );
        }
    }

    pub fn report(&self) -> Report {
        let down = self.rig.model.tuning().shutter_down;
        Report {
            ticks: self.ticks,
            shots_queued: self.shots_queued,
            shots_fired: self.rig.ppm.shutter_presses(down).len(),
            settled: self.is_finished(),
        }
    }
}
