//! Wire packet envelope
//!
//! Packets are small JSON objects tagged by an `id` field, matching the
//! browser peer on the other end of the connection. The `move` packet
//! carries a raw action buffer in the character form plus the sender's
//! authoritative destination and state at flush time; the state seeds a
//! remote actor that has no buffered history yet (first sight).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::world::{Action, Direction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Packet {
    Move(MovePacket),
    Chat(ChatPacket),
}

/// Coalesced movement batch from one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovePacket {
    /// Sending entity
    pub from: Uuid,
    /// Action buffer in wire character form
    pub buffer: String,
    /// Sender's destination x at flush time, for correction
    pub x: f32,
    /// Sender's destination y at flush time, for correction
    pub y: f32,
    /// Sender's action at flush time (0-3)
    pub action: u8,
    /// Sender's direction at flush time (0-10)
    pub direction: u8,
}

impl MovePacket {
    pub fn action(&self) -> Option<Action> {
        Action::from_u8(self.action)
    }

    pub fn direction(&self) -> Direction {
        Direction::from_bits(self.direction).unwrap_or(Direction::None)
    }
}

/// Chat line relayed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPacket {
    pub from: Uuid,
    pub nick: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_packet_is_tagged_json() {
        let packet = Packet::Move(MovePacket {
            from: Uuid::nil(),
            buffer: "wBB".to_string(),
            x: 32.0,
            y: 40.0,
            action: Action::Idle as u8,
            direction: Direction::North.bits(),
        });
        let json = serde_json::to_value(&packet).unwrap();
        assert_eq!(json["id"], "move");
        assert_eq!(json["buffer"], "wBB");
        assert_eq!(json["direction"], 1);

        let back: Packet = serde_json::from_value(json).unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn out_of_range_state_fields_degrade_safely() {
        let packet = MovePacket {
            from: Uuid::nil(),
            buffer: String::new(),
            x: 0.0,
            y: 0.0,
            action: 9,
            direction: 7,
        };
        assert_eq!(packet.action(), None);
        assert_eq!(packet.direction(), Direction::None);
    }
}
