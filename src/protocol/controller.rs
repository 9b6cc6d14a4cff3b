//! Buffered action controller
//!
//! Translates desired state (from polled input or a decoded network
//! buffer) into commands, replays them against the bound actor at a
//! controlled rate, and — for the local player — stages a coalesced copy
//! for periodic network flushes. Applying locally every think tick while
//! flushing on a much slower timer keeps the local player responsive and
//! the wire traffic bursty-cheap.

use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::world::{Action, Actor, CollisionMap, Direction, Speed};
use super::command::{encode_commands, Command};
use super::messages::MovePacket;

/// Desired state polled from an input device, one sample per think tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub direction: Direction,
    pub speed: Speed,
    pub action: Action,
}

#[derive(Debug)]
pub struct BufferedActionController {
    /// Commands pending local replay, consumed strictly front-to-back
    buffer: VecDeque<Command>,
    /// Commands staged for the next network flush; player controllers only
    network_buffer: Vec<Command>,
    is_player: bool,
}

impl BufferedActionController {
    pub fn new(is_player: bool, initial_speed: Speed) -> Self {
        let network_buffer = if is_player {
            // Seed with the current speed so the receiver replays the
            // batch at the right pace even when no speed change happened
            // inside the window.
            vec![Command::SetSpeed(initial_speed)]
        } else {
            Vec::new()
        };
        Self {
            buffer: VecDeque::new(),
            network_buffer,
            is_player,
        }
    }

    pub fn is_player(&self) -> bool {
        self.is_player
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Commands staged for transmission, in wire form.
    pub fn staged_wire(&self) -> String {
        encode_commands(&self.network_buffer)
    }

    /// Encode the desired state against the actor's current state.
    ///
    /// Called once per think tick with the *desired* state, not a delta.
    /// Emission order: speed change, then sit / jump / move-or-turn.
    /// A blocked move degrades to a turn-in-place.
    pub fn process_input(&mut self, actor: &Actor, map: &CollisionMap, input: InputState) {
        if input.speed != actor.speed() {
            self.push(Command::SetSpeed(input.speed));
        }

        if input.action == Action::Sit {
            let direction_changing =
                input.direction != Direction::None && input.direction != actor.direction();
            if direction_changing || actor.action() != Action::Sit {
                let facing = if input.direction == Direction::None {
                    actor.direction()
                } else {
                    input.direction
                };
                self.push(Command::Sit(facing));
            }
        } else if input.action == Action::Jump {
            if input.direction != Direction::None && input.direction != actor.direction() {
                self.push(Command::Turn(input.direction));
            }
            self.push(Command::Jump);
            // Trailing marker tells the receiver how the jump resolves:
            // at speed when moving, seated when standing.
            if actor.is_moving() {
                self.push(Command::SetSpeed(input.speed));
            } else {
                let facing = if input.direction == Direction::None {
                    actor.direction()
                } else {
                    input.direction
                };
                self.push(Command::Sit(facing));
            }
        } else if input.direction != Direction::None {
            if actor.can_move(input.direction, map) {
                self.push(Command::Move(input.direction));
            } else if input.direction != actor.direction() {
                self.push(Command::Turn(input.direction));
            }
        }
    }

    /// Append commands decoded from an inbound network buffer.
    pub fn feed<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = Command>,
    {
        for command in commands {
            self.buffer.push_back(command);
        }
    }

    /// Replay pending commands against the actor: one visible action per
    /// pass, with transparent commands (speed, correction) applied for
    /// free along the way. Must only run while the actor is not moving.
    pub fn process_actions(&mut self, actor: &mut Actor) {
        while let Some(command) = self.buffer.pop_front() {
            trace!("replaying {:?} onto {}", command, actor.nick());
            match command {
                Command::SetSpeed(speed) => {
                    actor.set_speed(speed);
                }
                Command::Correct(x, y) => {
                    self.apply_correction(actor, x, y);
                }
                Command::Move(direction) => {
                    actor.set_action(Action::Idle);
                    actor.step_in_direction(direction);
                    break;
                }
                Command::Sit(direction) => {
                    actor.set_direction(direction);
                    actor.set_action(Action::Sit);
                    break;
                }
                Command::Turn(direction) => {
                    actor.set_direction(direction);
                    actor.set_action(Action::Idle);
                    break;
                }
                Command::Jump => {
                    actor.set_action(Action::Jump);
                    break;
                }
            }
        }
    }

    fn apply_correction(&self, actor: &mut Actor, x: i32, y: i32) {
        // (0,0) is the wire sentinel for "no correction"
        if x == 0 && y == 0 {
            return;
        }
        let target = glam::Vec2::new(x as f32, y as f32);
        if actor.position().truncate() != target {
            debug!(
                "position correction for {}: {:?} -> {:?}",
                actor.nick(),
                actor.position().truncate(),
                target
            );
            actor.set_position(target);
        }
    }

    /// Drain the staged buffer into a move packet, or `None` when nothing
    /// but the leftover speed marker is staged. After a flush the staged
    /// buffer holds a single speed marker carrying the current speed.
    pub fn flush(&mut self, actor: &Actor) -> Option<MovePacket> {
        if !self.is_player {
            return None;
        }
        let wire = encode_commands(&self.network_buffer);
        if wire.len() <= 1 {
            return None;
        }
        self.network_buffer = vec![Command::SetSpeed(actor.speed())];
        Some(MovePacket {
            from: actor.id(),
            buffer: wire,
            x: actor.destination().x,
            y: actor.destination().y,
            action: actor.action() as u8,
            direction: actor.direction().bits(),
        })
    }

    fn push(&mut self, command: Command) {
        self.buffer.push_back(command);
        if self.is_player {
            self.push_network(command);
        }
    }

    /// Redundant consecutive speed markers collapse to the latest one.
    fn push_network(&mut self, command: Command) {
        if let Command::SetSpeed(_) = command {
            if let Some(last @ Command::SetSpeed(_)) = self.network_buffer.last_mut() {
                *last = command;
                return;
            }
        }
        self.network_buffer.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::AvatarMetadata;
    use glam::{Vec2, Vec3};
    use std::time::Instant;

    fn open_map() -> CollisionMap {
        CollisionMap::new(256.0, 256.0, 16.0)
    }

    fn actor_at(x: f32, y: f32) -> Actor {
        Actor::new(
            "test",
            Vec3::new(x, y, 0.0),
            AvatarMetadata::default_look(),
            Instant::now(),
        )
    }

    #[test]
    fn speed_markers_coalesce_in_the_network_buffer() {
        let map = open_map();
        let mut actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(true, actor.speed());

        // desiring walk while already walking encodes nothing
        controller.process_input(&actor, &map, InputState {
            speed: Speed::Walk,
            ..Default::default()
        });
        assert_eq!(controller.staged_wire(), "w");

        // switching to run replaces the staged marker instead of growing it
        controller.process_input(&actor, &map, InputState {
            speed: Speed::Run,
            ..Default::default()
        });
        assert_eq!(controller.staged_wire(), "r");
        controller.process_actions(&mut actor);
        assert_eq!(actor.speed(), Speed::Run);

        // and back again: still a single marker, holding the latest
        controller.process_input(&actor, &map, InputState {
            speed: Speed::Walk,
            ..Default::default()
        });
        assert_eq!(controller.staged_wire(), "w");
    }

    #[test]
    fn desired_move_north_emits_single_direction_command() {
        let map = open_map();
        let mut actor = actor_at(32.0, 32.0); // facing south by default
        let mut controller = BufferedActionController::new(true, actor.speed());

        controller.process_input(&actor, &map, InputState {
            direction: Direction::North,
            speed: Speed::Walk,
            action: Action::Move,
        });
        assert_eq!(controller.staged_wire(), "wB");

        controller.process_actions(&mut actor);
        assert!(actor.is_moving());
        assert_eq!(actor.destination(), Vec2::new(32.0, 32.0 + Speed::Walk.units()));
        assert_eq!(actor.direction(), Direction::North);
        assert_eq!(actor.action(), Action::Idle);
    }

    #[test]
    fn blocked_move_degrades_to_turn() {
        let mut map = open_map();
        // wall across the row a walk-step north lands in
        for tx in 0..16 {
            map.block_tile(tx, 2);
        }
        let mut actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(false, actor.speed());

        controller.process_input(&actor, &map, InputState {
            direction: Direction::North,
            speed: Speed::Walk,
            action: Action::Move,
        });
        controller.process_actions(&mut actor);

        assert!(!actor.is_moving());
        assert_eq!(actor.direction(), Direction::North);
        assert_eq!(actor.action(), Action::Idle);
    }

    #[test]
    fn blocked_move_in_current_facing_emits_nothing() {
        let mut map = open_map();
        for tx in 0..16 {
            map.block_tile(tx, 1);
        }
        let actor = actor_at(32.0, 32.0); // facing south, south row blocked
        let mut controller = BufferedActionController::new(false, actor.speed());

        controller.process_input(&actor, &map, InputState {
            direction: Direction::South,
            speed: Speed::Walk,
            action: Action::Move,
        });
        assert!(!controller.has_pending());
    }

    #[test]
    fn sit_reuses_current_facing_when_no_direction_held() {
        let map = open_map();
        let mut actor = actor_at(32.0, 32.0);
        actor.set_direction(Direction::East);
        let mut controller = BufferedActionController::new(false, actor.speed());

        controller.process_input(&actor, &map, InputState {
            direction: Direction::None,
            speed: Speed::Walk,
            action: Action::Sit,
        });
        controller.process_actions(&mut actor);
        assert_eq!(actor.action(), Action::Sit);
        assert_eq!(actor.direction(), Direction::East);

        // already seated facing east: re-sending the same desire is a no-op
        controller.process_input(&actor, &map, InputState {
            direction: Direction::None,
            speed: Speed::Walk,
            action: Action::Sit,
        });
        assert!(!controller.has_pending());
    }

    #[test]
    fn jump_with_new_facing_turns_first() {
        let map = open_map();
        let mut actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(true, actor.speed());

        controller.process_input(&actor, &map, InputState {
            direction: Direction::East,
            speed: Speed::Walk,
            action: Action::Jump,
        });
        // turn east, jump, standing marker
        assert_eq!(controller.staged_wire(), "wtEjsE");

        controller.process_actions(&mut actor);
        assert_eq!(actor.direction(), Direction::East);
        assert_eq!(actor.action(), Action::Idle);
        controller.process_actions(&mut actor);
        assert_eq!(actor.action(), Action::Jump);
    }

    #[test]
    fn transparent_commands_chain_in_one_pass() {
        let map = open_map();
        let mut actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(false, actor.speed());

        controller.feed([
            Command::SetSpeed(Speed::Run),
            Command::Correct(40, 48),
            Command::Move(Direction::East),
            Command::Move(Direction::East),
        ]);
        controller.process_actions(&mut actor);

        // speed and correction applied for free, first move consumed
        assert_eq!(actor.speed(), Speed::Run);
        assert_eq!(actor.position().truncate(), Vec2::new(40.0, 48.0));
        assert!(actor.is_moving());
        assert!(controller.has_pending());
        let _ = map;
    }

    #[test]
    fn origin_correction_is_ignored() {
        let mut actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(false, actor.speed());
        controller.feed([Command::Correct(0, 0)]);
        controller.process_actions(&mut actor);
        assert_eq!(actor.position().truncate(), Vec2::new(32.0, 32.0));
    }

    #[test]
    fn flush_emits_packet_and_resets_to_speed_marker() {
        let map = open_map();
        let mut actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(true, actor.speed());

        // nothing staged beyond the speed marker: no packet
        assert!(controller.flush(&actor).is_none());

        controller.process_input(&actor, &map, InputState {
            direction: Direction::North,
            speed: Speed::Walk,
            action: Action::Move,
        });
        controller.process_actions(&mut actor);

        let packet = controller.flush(&actor).expect("staged commands flush");
        assert_eq!(packet.buffer, "wB");
        assert_eq!(packet.x, actor.destination().x);
        assert_eq!(packet.y, actor.destination().y);
        assert_eq!(packet.direction, Direction::North.bits());

        // leftover marker only: nothing more to send
        assert_eq!(controller.staged_wire(), "w");
        assert!(controller.flush(&actor).is_none());
    }

    #[test]
    fn non_player_controller_never_stages_network_traffic() {
        let map = open_map();
        let actor = actor_at(32.0, 32.0);
        let mut controller = BufferedActionController::new(false, actor.speed());
        controller.process_input(&actor, &map, InputState {
            direction: Direction::East,
            speed: Speed::Run,
            action: Action::Move,
        });
        assert!(controller.staged_wire().is_empty());
        assert!(controller.flush(&actor).is_none());
    }
}
