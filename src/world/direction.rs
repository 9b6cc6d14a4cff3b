//! Movement intent vocabulary shared by actors and the action protocol
//!
//! Direction values are bit patterns: the four cardinals occupy one bit
//! each, and the diagonals are exactly the union of their two components.

use glam::Vec2;
use serde::{Serialize, Deserialize};

/// Facing / movement direction of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    #[default]
    None = 0,
    North = 1,
    South = 2,
    East = 4,
    Northeast = 5,
    Southeast = 6,
    West = 8,
    Northwest = 9,
    Southwest = 10,
}

impl Direction {
    /// All non-`None` directions, cardinals first.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Northeast,
        Direction::Northwest,
        Direction::Southeast,
        Direction::Southwest,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Reconstruct a direction from its bit pattern. Patterns that do not
    /// name a direction (e.g. north|south) yield `None`.
    pub fn from_bits(bits: u8) -> Option<Direction> {
        match bits {
            0 => Some(Direction::None),
            1 => Some(Direction::North),
            2 => Some(Direction::South),
            4 => Some(Direction::East),
            5 => Some(Direction::Northeast),
            6 => Some(Direction::Southeast),
            8 => Some(Direction::West),
            9 => Some(Direction::Northwest),
            10 => Some(Direction::Southwest),
            _ => None,
        }
    }

    pub fn is_diagonal(self) -> bool {
        let b = self.bits();
        (b & 0b0011 != 0) && (b & 0b1100 != 0)
    }

    /// Unit step vector in world coordinates (north is +y).
    ///
    /// Diagonals step a full unit on both axes; the protocol treats each
    /// axis destination independently, so they are deliberately not
    /// normalized.
    pub fn unit(self) -> Vec2 {
        let b = self.bits();
        let mut v = Vec2::ZERO;
        if b & Direction::North.bits() != 0 {
            v.y += 1.0;
        }
        if b & Direction::South.bits() != 0 {
            v.y -= 1.0;
        }
        if b & Direction::East.bits() != 0 {
            v.x += 1.0;
        }
        if b & Direction::West.bits() != 0 {
            v.x -= 1.0;
        }
        v
    }

    /// Collapse to a cardinal for sprite-sheet facing: diagonals use their
    /// horizontal component, `None` faces south.
    pub fn facing(self) -> Direction {
        let b = self.bits();
        if b & Direction::East.bits() != 0 {
            Direction::East
        } else if b & Direction::West.bits() != 0 {
            Direction::West
        } else if b & Direction::North.bits() != 0 {
            Direction::North
        } else {
            Direction::South
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::None => "none",
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "northeast",
            Direction::Northwest => "northwest",
            Direction::Southeast => "southeast",
            Direction::Southwest => "southwest",
        };
        write!(f, "{}", name)
    }
}

/// Movement speed. The numeric value doubles as the step distance in world
/// units that one movement command covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Speed {
    #[default]
    Walk = 4,
    Run = 8,
}

impl Speed {
    pub fn units(self) -> f32 {
        self as u8 as f32
    }
}

/// High-level activity of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    #[default]
    Idle = 0,
    Move = 1,
    Sit = 2,
    Jump = 3,
}

impl Action {
    pub fn from_u8(value: u8) -> Option<Action> {
        match value {
            0 => Some(Action::Idle),
            1 => Some(Action::Move),
            2 => Some(Action::Sit),
            3 => Some(Action::Jump),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Idle => "idle",
            Action::Move => "move",
            Action::Sit => "sit",
            Action::Jump => "jump",
        };
        write!(f, "{}", name)
    }
}
