//! Scripted joystick sessions.
//!
//! A script is a JSON file like
//!
//! ```json
//! {
//!   "tuning": { ... },
//!   "steps": [
//!     { "gesture": { "deg": 30, "ticks": 5 } },
//!     { "press": {} },
//!     { "idle": 200 }
//!   ]
//! }
//! ```
//!
//! where `tuning` is optional and every step expands into one joystick
//! reading per tick.

use std::{collections::VecDeque, path::Path};

use anyhow::Context as _;
use kaptx_controller::Joystick;
use kaptx_geom::{from_polar, JsVector, Tuning, JS_SPAN};
use kaptx_protocol::JsReading;
use serde::Deserialize;

/// Full deflection, a little inside the edge of travel.
const FULL: f32 = 480.0;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Hold the stick at a position.
    Hold { x: i32, y: i32, ticks: u32 },
    /// Push the stick all the way toward `deg` (counterclockwise from
    /// right), hold it there, then let go.
    Gesture { deg: f32, ticks: u32 },
    /// Swing the stick around at full deflection, then let go.
    Sweep { from: f32, to: f32, ticks: u32 },
    /// Click the button with the stick centered.
    Press {},
    /// Leave the stick alone.
    Idle(u32),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Script {
    pub tuning: Option<Tuning>,
    pub steps: Vec<Step>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub pos: JsVector,
    pub press: bool,
}

impl Sample {
    fn at(pos: JsVector) -> Self {
        Sample { pos, press: false }
    }

    fn center() -> Self {
        Sample::at(JsVector::zero())
    }
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Script> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Script::parse(&data).with_context(|| format!("bad script {}", path.display()))
    }

    pub fn parse(data: &str) -> anyhow::Result<Script> {
        let script: Script = serde_json::from_str(data)?;
        if let Some(tuning) = &script.tuning {
            tuning.validate()?;
        }
        for step in &script.steps {
            if let Step::Hold { x, y, .. } = step {
                if x.abs() > JS_SPAN || y.abs() > JS_SPAN {
                    anyhow::bail!("stick position ({x}, {y}) is outside of +/-{JS_SPAN}");
                }
            }
        }
        Ok(script)
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning.unwrap_or_default()
    }

    /// The joystick samples, one per tick.
    pub fn samples(&self) -> Vec<Sample> {
        let mut ret = Vec::new();
        for step in &self.steps {
            match *step {
                Step::Hold { x, y, ticks } => {
                    ret.extend((0..ticks).map(|_| Sample::at(JsVector::new(x, y))));
                }
                Step::Gesture { deg, ticks } => {
                    ret.extend((0..ticks.max(1)).map(|_| Sample::at(from_polar(deg, FULL))));
                    ret.push(Sample::center());
                }
                Step::Sweep { from, to, ticks } => {
                    let ticks = ticks.max(1);
                    for i in 0..=ticks {
                        let deg = from + (to - from) * i as f32 / ticks as f32;
                        ret.push(Sample::at(from_polar(deg, FULL)));
                    }
                    ret.push(Sample::center());
                }
                Step::Press {} => ret.push(Sample {
                    pos: JsVector::zero(),
                    press: true,
                }),
                Step::Idle(ticks) => ret.extend((0..ticks).map(|_| Sample::center())),
            }
        }
        ret
    }
}

/// A joystick that plays back a script, and then sits centered.
pub struct ScriptedJoystick {
    samples: VecDeque<Sample>,
}

impl ScriptedJoystick {
    pub fn new(script: &Script) -> Self {
        ScriptedJoystick {
            samples: script.samples().into(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Joystick for ScriptedJoystick {
    fn poll(&mut self) -> JsReading {
        match self.samples.pop_front() {
            Some(Sample { pos, press: true }) => JsReading::pressed(pos),
            Some(Sample { pos, press: false }) => JsReading::new(pos),
            None => JsReading::default(),
        }
    }
}
