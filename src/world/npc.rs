//! Non-player entity with a wander decision procedure
//!
//! An NPC feeds the same controller and replay machinery as players, so
//! its movement looks and corrects exactly like theirs on every client.

use std::time::Instant;
use rand::Rng;

use crate::protocol::{BufferedActionController, InputState};
use super::actor::Actor;
use super::collision::CollisionMap;
use super::direction::{Action, Direction};
use super::player::drive;

#[derive(Debug)]
pub struct Npc {
    actor: Actor,
    controller: BufferedActionController,
    /// Probability per idle think tick of starting a wander step
    wander_chance: f64,
}

impl Npc {
    pub fn new(actor: Actor) -> Self {
        let speed = actor.speed();
        Self {
            actor,
            controller: BufferedActionController::new(false, speed),
            wander_chance: 0.05,
        }
    }

    pub fn with_wander_chance(mut self, chance: f64) -> Self {
        self.wander_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    pub fn think(&mut self, map: &CollisionMap, step_size: f32, now: Instant) {
        if !self.actor.is_moving() && !self.controller.has_pending() {
            if let Some(input) = self.decide() {
                self.controller.process_input(&self.actor, map, input);
            }
        }
        drive(&mut self.actor, &mut self.controller, step_size, now);
    }

    fn decide(&self) -> Option<InputState> {
        let mut rng = rand::rng();
        if !rng.random_bool(self.wander_chance) {
            return None;
        }
        // cardinals only; diagonal drift looks erratic on an idle bot
        let direction = match rng.random_range(0..4) {
            0 => Direction::North,
            1 => Direction::South,
            2 => Direction::East,
            _ => Direction::West,
        };
        Some(InputState {
            direction,
            speed: self.actor.speed(),
            action: Action::Move,
        })
    }
}
