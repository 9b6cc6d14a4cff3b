//! The world: entity registry, collision, events, and the tick loop
//!
//! One `World` instance owns every entity, the collision map, the event
//! bus, and the interval scheduler. `tick` is the single entry point the
//! host loop calls: it drains inbound frames, runs due think ticks and
//! network flushes, fans actor state changes out through the event bus,
//! and applies deferred removals. Removal is deferred so an entity
//! destroyed from within an event handler never invalidates the entity
//! collection mid-traversal.

pub mod direction;
pub mod avatar;
pub mod actor;
pub mod collision;
pub mod events;
pub mod player;
pub mod npc;

// Re-export all core types for easier access
pub use actor::{Actor, ActorEvent};
pub use avatar::{keyframe_name, Avatar, AvatarMetadata, ClipRect, FramePair, Keyframe};
pub use collision::CollisionMap;
pub use direction::{Action, Direction, Speed};
pub use events::{EventBus, EventKind, Subscription, WorldEvent};
pub use npc::Npc;
pub use player::{Player, RemotePlayer};

use std::collections::HashMap;
use std::time::{Duration, Instant};
use glam::Vec3;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::network::{decode_packet, encode_packet, NetworkResult, Transport};
use crate::protocol::{decode_commands, Command, InputState, Packet};
use crate::scheduler::Timers;

/// Work items the scheduler hands back to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    Think(Uuid),
    Flush(Uuid),
}

/// Entity kinds, selected at construction time.
#[derive(Debug)]
pub enum Entity {
    Player(Player),
    Remote(RemotePlayer),
    Npc(Npc),
}

impl Entity {
    pub fn actor(&self) -> &Actor {
        match self {
            Entity::Player(player) => player.actor(),
            Entity::Remote(remote) => remote.actor(),
            Entity::Npc(npc) => npc.actor(),
        }
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        match self {
            Entity::Player(player) => player.actor_mut(),
            Entity::Remote(remote) => remote.actor_mut(),
            Entity::Npc(npc) => npc.actor_mut(),
        }
    }

    fn think(&mut self, map: &CollisionMap, step_size: f32, now: Instant) {
        match self {
            Entity::Player(player) => player.think(map, step_size, now),
            Entity::Remote(remote) => remote.think(map, step_size, now),
            Entity::Npc(npc) => npc.think(map, step_size, now),
        }
    }
}

pub struct World {
    settings: EngineSettings,
    map: CollisionMap,
    entities: HashMap<Uuid, Entity>,
    removals: Vec<Uuid>,
    events: EventBus,
    timers: Timers<TimerTask>,
}

impl World {
    pub fn new(settings: EngineSettings, map: CollisionMap) -> Self {
        let timers = Timers::new(settings.scheduler.max_catchup);
        Self {
            settings,
            map,
            entities: HashMap::new(),
            removals: Vec::new(),
            events: EventBus::new(),
            timers,
        }
    }

    pub fn map(&self) -> &CollisionMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut CollisionMap {
        &mut self.map
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn entity(&self, id: Uuid) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn think_period(&self) -> Duration {
        Duration::from_millis(self.settings.scheduler.think_interval_ms)
    }

    fn flush_period(&self) -> Duration {
        Duration::from_millis(self.settings.network.flush_interval_ms)
    }

    /// Spawn the locally controlled player. Registers its think tick and
    /// the slower network-flush interval.
    pub fn add_player(
        &mut self,
        nick: impl Into<String>,
        position: Vec3,
        look: AvatarMetadata,
        now: Instant,
    ) -> Uuid {
        let actor = Actor::new(nick, position, look, now);
        let id = actor.id();
        let think = self.think_period();
        let flush = self.flush_period();
        self.timers
            .add_interval(Some(id), TimerTask::Think(id), think, false, now);
        self.timers
            .add_interval(Some(id), TimerTask::Flush(id), flush, false, now);
        self.entities.insert(id, Entity::Player(Player::new(actor)));
        info!("player {} joined", id);
        id
    }

    /// Spawn an actor for a remote peer, seeded with the state carried by
    /// the packet that revealed it.
    pub fn add_remote(
        &mut self,
        id: Uuid,
        position: Vec3,
        direction: Direction,
        action: Action,
        now: Instant,
    ) -> Uuid {
        let mut actor = Actor::new(
            format!("peer-{}", &id.to_string()[..8]),
            position,
            AvatarMetadata::default_look(),
            now,
        )
        .with_id(id);
        actor.set_direction(direction);
        if let Action::Sit | Action::Jump = action {
            actor.set_action(action);
        }
        let think = self.think_period();
        self.timers
            .add_interval(Some(id), TimerTask::Think(id), think, false, now);
        self.entities
            .insert(id, Entity::Remote(RemotePlayer::new(actor)));
        info!("remote player {} entered view", id);
        id
    }

    pub fn add_npc(
        &mut self,
        nick: impl Into<String>,
        position: Vec3,
        look: AvatarMetadata,
        now: Instant,
    ) -> Uuid {
        let actor = Actor::new(nick, position, look, now);
        let id = actor.id();
        let think = self.think_period();
        self.timers
            .add_interval(Some(id), TimerTask::Think(id), think, false, now);
        self.entities.insert(id, Entity::Npc(Npc::new(actor)));
        id
    }

    /// Queue an entity for removal. Deferred until the end of the current
    /// tick so in-progress traversal is never invalidated.
    pub fn remove_entity(&mut self, id: Uuid) {
        self.removals.push(id);
    }

    /// Update the local player's held input sample.
    pub fn set_player_input(&mut self, id: Uuid, input: InputState) {
        match self.entities.get_mut(&id) {
            Some(Entity::Player(player)) => player.set_input(input),
            Some(_) => warn!("input sample for non-player entity {}", id),
            None => warn!("input sample for unknown entity {}", id),
        }
    }

    /// One host-loop pass: drain inbound frames, run due intervals,
    /// publish events, apply deferred removals.
    pub fn tick(&mut self, now: Instant, transport: &mut dyn Transport) -> NetworkResult<()> {
        while let Some(frame) = transport.try_recv()? {
            match decode_packet(&frame) {
                Ok(packet) => self.handle_packet(packet, now),
                // a peer's bad frame must not stop the loop
                Err(err) => warn!("dropping inbound frame: {}", err),
            }
        }

        for firing in self.timers.tick(now) {
            match firing.task {
                TimerTask::Think(id) => {
                    let mut pending = Vec::new();
                    if let Some(entity) = self.entities.get_mut(&id) {
                        for _ in 0..firing.times {
                            entity.think(&self.map, self.settings.movement.step_size, now);
                        }
                        pending = entity.actor_mut().take_events();
                    }
                    for event in pending {
                        let event = Self::world_event(id, event);
                        self.events.emit(&event);
                    }
                }
                TimerTask::Flush(id) => {
                    if let Some(Entity::Player(player)) = self.entities.get_mut(&id) {
                        // multiple missed flush windows still produce one
                        // packet; the buffer already coalesced them
                        if let Some(packet) = player.flush() {
                            let frame = encode_packet(&Packet::Move(packet))?;
                            transport.send(frame)?;
                        }
                    }
                }
            }
        }

        self.apply_removals();
        Ok(())
    }

    /// Route one decoded packet.
    pub fn handle_packet(&mut self, packet: Packet, now: Instant) {
        match packet {
            Packet::Move(move_packet) => {
                let id = move_packet.from;
                if !self.entities.contains_key(&id) {
                    self.add_remote(
                        id,
                        Vec3::new(move_packet.x, move_packet.y, 0.0),
                        move_packet.direction(),
                        move_packet.action().unwrap_or(Action::Idle),
                        now,
                    );
                }
                let commands = decode_commands(&move_packet.buffer);
                if let Some(Entity::Remote(remote)) = self.entities.get_mut(&id) {
                    debug!("queueing {} commands for {}", commands.len(), id);
                    remote.feed(commands);
                    // sender's authoritative destination trails the batch
                    remote.feed([Command::Correct(
                        move_packet.x.round() as i32,
                        move_packet.y.round() as i32,
                    )]);
                } else {
                    warn!("move packet for non-remote entity {}", id);
                }
            }
            Packet::Chat(chat) => {
                let event = WorldEvent::Chat {
                    id: chat.from,
                    nick: chat.nick,
                    text: chat.text,
                };
                self.events.emit(&event);
            }
        }
    }

    fn world_event(id: Uuid, event: ActorEvent) -> WorldEvent {
        match event {
            ActorEvent::Moved(position) => WorldEvent::Moved { id, position },
            ActorEvent::DirectionChanged(direction) => {
                WorldEvent::DirectionChanged { id, direction }
            }
            ActorEvent::SpeedChanged(speed) => WorldEvent::SpeedChanged { id, speed },
            ActorEvent::ActionChanged(action) => WorldEvent::ActionChanged { id, action },
            ActorEvent::AvatarChanged => WorldEvent::AvatarChanged { id },
            ActorEvent::NickChanged(nick) => WorldEvent::NickChanged { id, nick },
            ActorEvent::LookFailed(reason) => WorldEvent::LookFailed { id, reason },
        }
    }

    fn apply_removals(&mut self) {
        while let Some(id) = self.removals.pop() {
            if self.entities.remove(&id).is_some() {
                self.timers.remove_owner(id);
                self.events.emit(&WorldEvent::Removed { id });
                info!("entity {} left", id);
            }
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("timers", &self.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NullTransport;
    use std::sync::{Arc, Mutex};

    fn world() -> World {
        World::new(EngineSettings::default(), CollisionMap::new(256.0, 256.0, 16.0))
    }

    fn after_ticks(n: u64) -> (Instant, Instant) {
        let start = Instant::now();
        (start, start + Duration::from_millis(50 * n + 1))
    }

    #[test]
    fn player_think_tick_applies_held_input() {
        let mut world = world();
        let (start, later) = after_ticks(4);
        let id = world.add_player("ada", Vec3::new(32.0, 32.0, 0.0), AvatarMetadata::default_look(), start);
        world.set_player_input(id, InputState {
            direction: Direction::East,
            speed: Speed::Walk,
            action: Action::Move,
        });

        let mut transport = NullTransport;
        world.tick(later, &mut transport).unwrap();
        let actor = world.entity(id).unwrap().actor();
        assert!(actor.position().x > 32.0);
        assert_eq!(actor.direction(), Direction::East);
    }

    #[test]
    fn removal_during_tick_is_deferred_and_cancels_timers() {
        let mut world = world();
        let (start, later) = after_ticks(1);
        let id = world.add_npc("bot", Vec3::new(32.0, 32.0, 0.0), AvatarMetadata::default_look(), start);

        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = removed.clone();
        world.events().subscribe(EventKind::Removed, move |event| {
            if let WorldEvent::Removed { id } = event {
                sink.lock().unwrap().push(*id);
            }
        });

        world.remove_entity(id);
        let mut transport = NullTransport;
        world.tick(later, &mut transport).unwrap();

        assert_eq!(world.entity_count(), 0);
        assert!(world.timers.is_empty());
        assert_eq!(*removed.lock().unwrap(), vec![id]);
    }

    #[test]
    fn first_move_packet_spawns_a_seeded_remote() {
        let mut world = world();
        let peer = Uuid::new_v4();
        let packet = Packet::Move(crate::protocol::MovePacket {
            from: peer,
            buffer: "r".to_string(),
            x: 64.0,
            y: 80.0,
            action: Action::Sit as u8,
            direction: Direction::West.bits(),
        });

        world.handle_packet(packet, Instant::now());
        let actor = world.entity(peer).unwrap().actor();
        assert_eq!(actor.position().truncate(), glam::Vec2::new(64.0, 80.0));
        assert_eq!(actor.direction(), Direction::West);
        assert_eq!(actor.action(), Action::Sit);
    }

    #[test]
    fn chat_packets_route_to_the_event_bus() {
        let mut world = world();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        world.events().subscribe(EventKind::Chat, move |event| {
            if let WorldEvent::Chat { nick, text, .. } = event {
                sink.lock().unwrap().push(format!("{}: {}", nick, text));
            }
        });

        world.handle_packet(
            Packet::Chat(crate::protocol::ChatPacket {
                from: Uuid::new_v4(),
                nick: "ada".to_string(),
                text: "hello".to_string(),
            }),
            Instant::now(),
        );
        assert_eq!(*seen.lock().unwrap(), vec!["ada: hello".to_string()]);
    }
}
