//! Local and remote player entities
//!
//! Both wrap an actor plus a buffered action controller and differ only
//! in where commands come from: the local player encodes polled input,
//! the remote player replays buffers decoded from the network. The drive
//! sequence on a think tick is identical, which is what keeps local
//! prediction and remote playback in lockstep.

use std::time::Instant;

use crate::protocol::{BufferedActionController, Command, InputState, MovePacket};
use super::actor::Actor;
use super::collision::CollisionMap;

/// One think tick worth of state application, shared by every entity
/// kind: drain commands while idle, step while moving, animate otherwise.
pub(crate) fn drive(
    actor: &mut Actor,
    controller: &mut BufferedActionController,
    step_size: f32,
    now: Instant,
) {
    if !actor.is_moving() {
        controller.process_actions(actor);
    }
    actor.refresh_keyframe(now);
    if actor.is_moving() {
        actor.process_movement(step_size);
    } else {
        actor.avatar_mut().animate(now);
    }
}

/// The locally controlled player: polls an input sample each think tick.
#[derive(Debug)]
pub struct Player {
    actor: Actor,
    controller: BufferedActionController,
    input: InputState,
}

impl Player {
    pub fn new(actor: Actor) -> Self {
        let speed = actor.speed();
        Self {
            actor,
            controller: BufferedActionController::new(true, speed),
            input: InputState::default(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    /// Latest input sample from the input collaborator; held until
    /// replaced.
    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    pub fn think(&mut self, map: &CollisionMap, step_size: f32, now: Instant) {
        self.controller.process_input(&self.actor, map, self.input);
        drive(&mut self.actor, &mut self.controller, step_size, now);
    }

    /// Drain the staged network buffer into a move packet, if anything
    /// beyond the leftover speed marker accumulated this window.
    pub fn flush(&mut self) -> Option<MovePacket> {
        self.controller.flush(&self.actor)
    }
}

/// A peer's player: its buffer is filled by the inbound packet router,
/// never by local input.
#[derive(Debug)]
pub struct RemotePlayer {
    actor: Actor,
    controller: BufferedActionController,
}

impl RemotePlayer {
    pub fn new(actor: Actor) -> Self {
        let speed = actor.speed();
        Self {
            actor,
            controller: BufferedActionController::new(false, speed),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    pub fn feed<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = Command>,
    {
        self.controller.feed(commands);
    }

    pub fn think(&mut self, _map: &CollisionMap, step_size: f32, now: Instant) {
        drive(&mut self.actor, &mut self.controller, step_size, now);
    }
}
