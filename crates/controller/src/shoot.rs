use kaptx_planner::plan;
use kaptx_protocol::Press;

use crate::model::Model;

/// Decides when to start a shot sequence, and queues it.
#[derive(Clone, Debug, Default)]
pub struct Shooter;

impl Shooter {
    pub fn new() -> Self {
        Self::default()
    }

    /// In auto mode, a new sequence starts as soon as the last one is done.
    /// Otherwise, a button press starts one.
    ///
    /// Returns the number of shots queued.
    pub fn update(&mut self, press: Option<Press>, model: &mut Model) -> usize {
        let trigger = if model.auto() {
            model.shots_queued() == 0
        } else {
            press.is_some()
        };
        if !trigger {
            return 0;
        }

        let mode = model.shoot_mode();
        let shots = plan(mode, model.user());
        let mut queued = 0;
        for shot in shots {
            if model.queue_shot(shot) {
                queued += 1;
            }
        }
        log::debug!("{} triggered: {queued} shots queued", mode.name());
        queued
    }
}
