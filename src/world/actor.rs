//! Movable, animated world entity
//!
//! An actor holds position, facing, speed and action, plus its avatar.
//! Movement is destination-based: a step sets a destination a whole speed
//! unit away, and `process_movement` advances toward it by a fixed
//! per-tick increment until arrival. State changes are applied between
//! steps, never during one; the owning entity's think loop guarantees
//! that ordering.
//!
//! Actors do not call into collaborators directly. Every observable
//! change is queued as an `ActorEvent` and drained by the world, which
//! fans it out through the event bus.

use std::time::Instant;
use glam::{Vec2, Vec3};
use tracing::warn;
use uuid::Uuid;

use super::avatar::{keyframe_name, Avatar, AvatarMetadata};
use super::collision::CollisionMap;
use super::direction::{Action, Direction, Speed};

/// State change queued by an actor for the world to publish.
#[derive(Debug, Clone)]
pub enum ActorEvent {
    Moved(Vec3),
    DirectionChanged(Direction),
    SpeedChanged(Speed),
    ActionChanged(Action),
    AvatarChanged,
    NickChanged(String),
    LookFailed(String),
}

#[derive(Debug)]
pub struct Actor {
    id: Uuid,
    nick: String,
    position: Vec3,
    destination: Vec2,
    moving: bool,
    direction: Direction,
    speed: Speed,
    action: Action,
    step_count: u64,
    zorder: i32,
    avatar: Avatar,
    pending: Vec<ActorEvent>,
}

impl Actor {
    pub fn new(nick: impl Into<String>, position: Vec3, look: AvatarMetadata, now: Instant) -> Self {
        let mut actor = Self {
            id: Uuid::new_v4(),
            nick: nick.into(),
            position,
            destination: position.truncate(),
            moving: false,
            direction: Direction::South,
            speed: Speed::Walk,
            action: Action::Idle,
            step_count: 0,
            zorder: position.y as i32,
            avatar: Avatar::new(AvatarMetadata::default_look(), now),
            pending: Vec::new(),
        };
        actor.set_avatar(look, now);
        actor
    }

    /// Adopt an externally assigned id (e.g. the sender id of a move
    /// packet that first revealed this actor).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn zorder(&self) -> i32 {
        self.zorder
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    /// A step is in flight: destination differs from position.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Drain queued state-change events.
    pub fn take_events(&mut self) -> Vec<ActorEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn set_nick(&mut self, nick: impl Into<String>) {
        let nick = nick.into();
        if self.nick != nick {
            self.nick = nick.clone();
            self.pending.push(ActorEvent::NickChanged(nick));
        }
    }

    /// Give the actor a new look. Metadata with no keyframes cannot
    /// animate; the default look is substituted and the failure reported.
    pub fn set_avatar(&mut self, look: AvatarMetadata, now: Instant) {
        if look.keyframes.is_empty() || look.width == 0 || look.height == 0 {
            warn!("rejecting unusable look '{}' for {}", look.image, self.nick);
            self.pending
                .push(ActorEvent::LookFailed(format!("unusable look '{}'", look.image)));
            self.avatar = Avatar::new(AvatarMetadata::default_look(), now);
        } else {
            self.avatar = Avatar::new(look, now);
        }
        self.pending.push(ActorEvent::AvatarChanged);
        self.refresh_keyframe(now);
    }

    /// Face a direction without moving. `None` carries no facing and is
    /// ignored; re-facing the current direction is a no-op.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction == Direction::None || direction == self.direction {
            return;
        }
        self.direction = direction;
        self.pending.push(ActorEvent::DirectionChanged(direction));
    }

    pub fn set_speed(&mut self, speed: Speed) {
        if speed != self.speed {
            self.speed = speed;
            self.pending.push(ActorEvent::SpeedChanged(speed));
        }
    }

    pub fn set_action(&mut self, action: Action) {
        if action != self.action {
            self.action = action;
            self.pending.push(ActorEvent::ActionChanged(action));
        }
    }

    /// Whether a full-speed step in `direction` lands on walkable ground.
    pub fn can_move(&self, direction: Direction, map: &CollisionMap) -> bool {
        if direction == Direction::None {
            return false;
        }
        let probe = self.position.truncate() + direction.unit() * self.speed.units();
        map.is_walkable(probe)
    }

    /// Begin a step: destination = position + unit(direction) × speed.
    pub fn step_in_direction(&mut self, direction: Direction) {
        if direction == Direction::None {
            return;
        }
        self.set_direction(direction);
        self.destination = self.position.truncate() + direction.unit() * self.speed.units();
        self.moving = true;
    }

    /// Advance one movement sub-step toward the destination; snap exactly
    /// onto it on arrival. Fires `Moved` on every sub-step so dependents
    /// (nametags, camera follow) track the actor smoothly.
    pub fn process_movement(&mut self, step_size: f32) {
        if !self.moving {
            return;
        }
        let next = crate::utils::step_toward(self.position.truncate(), self.destination, step_size);
        self.position.x = next.x;
        self.position.y = next.y;
        self.zorder = self.position.y as i32;
        self.step_count += 1;
        self.pending.push(ActorEvent::Moved(self.position));
        if next == self.destination {
            self.moving = false;
        }
    }

    /// Authoritative position correction from the network: hard-set,
    /// cancelling any in-flight step.
    pub fn set_position(&mut self, target: Vec2) {
        self.position.x = target.x;
        self.position.y = target.y;
        self.destination = target;
        self.moving = false;
        self.zorder = self.position.y as i32;
        self.pending.push(ActorEvent::Moved(self.position));
    }

    /// Point the avatar at the keyframe for the current action and facing.
    pub fn refresh_keyframe(&mut self, now: Instant) {
        let action = if self.moving { Action::Move } else { self.action };
        let key = keyframe_name(action, self.direction);
        self.avatar.set_keyframe(&key, now);
    }
}
