//! Danger zone: the game ends when the pile stays too high for too long
//!
//! The zone remembers which entities are inside it. While it is occupied a
//! stay timer accumulates once per tick; emptying the zone resets it.

use std::collections::BTreeSet;

use super::entity::EntityId;

#[derive(Debug, Clone, Default)]
pub struct DangerZone {
    occupants: BTreeSet<EntityId>,
    stay_timer: f32,
}

impl DangerZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter(&mut self, id: EntityId) {
        if self.occupants.is_empty() {
            self.stay_timer = 0.0;
        }
        self.occupants.insert(id);
    }

    pub fn on_exit(&mut self, id: EntityId) {
        self.occupants.remove(&id);
        if self.occupants.is_empty() {
            self.stay_timer = 0.0;
        }
    }

    /// Forget occupants that no longer exist
    pub fn purge(&mut self, is_alive: impl Fn(EntityId) -> bool) {
        self.occupants.retain(|&id| is_alive(id));
        if self.occupants.is_empty() {
            self.stay_timer = 0.0;
        }
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }

    pub fn stay_timer(&self) -> f32 {
        self.stay_timer
    }

    /// Advance by `dt`. Returns true when the stay limit is reached, in which
    /// case the zone resets itself. The limit is not checked while `paused`.
    pub fn tick(&mut self, dt: f32, defeat_time: f32, paused: bool) -> bool {
        if self.occupants.is_empty() {
            return false;
        }
        self.stay_timer += dt;
        if self.stay_timer >= defeat_time && !paused {
            self.reset();
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.occupants.clear();
        self.stay_timer = 0.0;
    }
}
