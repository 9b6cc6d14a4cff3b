//! Tagged commands and their character codec
//!
//! | char(s)    | meaning                                   |
//! |------------|-------------------------------------------|
//! | 'A'..      | move one step in Direction (char - 'A')   |
//! | 'w' / 'r'  | switch to walk / run speed                |
//! | 's' + dir  | sit facing dir                            |
//! | 't' + dir  | turn/stand facing dir                     |
//! | 'j'        | jump                                      |
//! | 'c'+"X.Y." | authoritative position correction to (X,Y)|
//!
//! Decoding is tolerant: a malformed command is reported and skipped,
//! never fatal, because a remote peer's buffer must not crash playback.

use tracing::warn;

use crate::world::{Direction, Speed};
use super::{ProtocolError, ProtocolResult};

/// One logical command of the action buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Step one speed unit in a direction (sets action to idle first)
    Move(Direction),
    SetSpeed(Speed),
    /// Sit facing a direction
    Sit(Direction),
    /// Turn in place, standing
    Turn(Direction),
    Jump,
    /// Authoritative position correction. (0, 0) is the wire sentinel for
    /// "no correction" and is ignored on replay; a legitimate correction
    /// to the exact origin is therefore indistinguishable from "absent".
    /// Kept for wire compatibility.
    Correct(i32, i32),
}

impl Command {
    /// Transparent commands do not consume a replay turn: the decoder
    /// keeps draining after applying one.
    pub fn is_transparent(self) -> bool {
        matches!(self, Command::SetSpeed(_) | Command::Correct(_, _))
    }
}

/// Direction value to its wire letter: 'A' + bit pattern.
pub fn direction_to_char(direction: Direction) -> char {
    (b'A' + direction.bits()) as char
}

/// Wire letter back to a direction. Letters that do not carry a valid
/// direction bit pattern decode as `None`.
pub fn char_to_direction(c: char) -> Direction {
    let offset = (c as u32).wrapping_sub('A' as u32);
    u8::try_from(offset)
        .ok()
        .and_then(Direction::from_bits)
        .unwrap_or(Direction::None)
}

fn is_direction_char(c: char) -> bool {
    let offset = (c as u32).wrapping_sub('A' as u32);
    u8::try_from(offset)
        .ok()
        .and_then(Direction::from_bits)
        .is_some()
}

/// Serialize commands into the wire character form.
pub fn encode_commands(commands: &[Command]) -> String {
    let mut out = String::new();
    for command in commands {
        match *command {
            Command::Move(direction) => out.push(direction_to_char(direction)),
            Command::SetSpeed(Speed::Walk) => out.push('w'),
            Command::SetSpeed(Speed::Run) => out.push('r'),
            Command::Sit(direction) => {
                out.push('s');
                out.push(direction_to_char(direction));
            }
            Command::Turn(direction) => {
                out.push('t');
                out.push(direction_to_char(direction));
            }
            Command::Jump => out.push('j'),
            Command::Correct(x, y) => {
                out.push('c');
                out.push_str(&format!("{}.{}.", x, y));
            }
        }
    }
    out
}

/// Decode one logical command from the front of `input`, returning it and
/// the number of bytes consumed.
pub fn decode_one(input: &str) -> ProtocolResult<(Command, usize)> {
    let mut chars = input.chars();
    let opcode = chars.next().ok_or(ProtocolError::Truncated { opcode: ' ' })?;
    match opcode {
        'w' => Ok((Command::SetSpeed(Speed::Walk), 1)),
        'r' => Ok((Command::SetSpeed(Speed::Run), 1)),
        'j' => Ok((Command::Jump, 1)),
        's' | 't' => {
            let dir_char = chars.next().ok_or(ProtocolError::Truncated { opcode })?;
            let direction = char_to_direction(dir_char);
            let command = if opcode == 's' {
                Command::Sit(direction)
            } else {
                Command::Turn(direction)
            };
            Ok((command, 1 + dir_char.len_utf8()))
        }
        'c' => decode_correction(&input[1..]).map(|(cmd, used)| (cmd, used + 1)),
        c if is_direction_char(c) => Ok((Command::Move(char_to_direction(c)), 1)),
        c => Err(ProtocolError::UnknownOpcode { opcode: c }),
    }
}

fn decode_correction(rest: &str) -> ProtocolResult<(Command, usize)> {
    let first_dot = rest.find('.').ok_or(ProtocolError::MissingDelimiter)?;
    let after_x = &rest[first_dot + 1..];
    let second_dot = after_x.find('.').ok_or(ProtocolError::MissingDelimiter)?;

    let x_text = &rest[..first_dot];
    let y_text = &after_x[..second_dot];
    let x = x_text.parse::<i32>().map_err(|_| ProtocolError::BadCoordinate {
        text: x_text.to_string(),
    })?;
    let y = y_text.parse::<i32>().map_err(|_| ProtocolError::BadCoordinate {
        text: y_text.to_string(),
    })?;

    // consumed through the second '.' inclusive
    Ok((Command::Correct(x, y), first_dot + 1 + second_dot + 1))
}

/// Decode an entire wire buffer, skipping malformed commands with a
/// warning. Used for buffers received from the network.
pub fn decode_commands(input: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        match decode_one(rest) {
            Ok((command, used)) => {
                commands.push(command);
                rest = &rest[used..];
            }
            Err(ProtocolError::UnknownOpcode { opcode }) => {
                warn!("skipping unknown op-code '{}' in action buffer", opcode);
                rest = &rest[opcode.len_utf8()..];
            }
            Err(err) => {
                // Truncated or malformed tail: nothing after it can be
                // framed reliably, drop the remainder.
                warn!("malformed action buffer tail {:?}: {}", rest, err);
                break;
            }
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_chars_round_trip() {
        for direction in Direction::ALL {
            if direction.bits() <= 9 {
                assert_eq!(char_to_direction(direction_to_char(direction)), direction);
            }
        }
        assert_eq!(char_to_direction(direction_to_char(Direction::None)), Direction::None);
    }

    #[test]
    fn unmapped_chars_decode_as_none() {
        for c in ['z', '0', '@', '!', 'D', 'H'] {
            assert_eq!(char_to_direction(c), Direction::None);
        }
    }

    #[test]
    fn north_is_letter_b() {
        assert_eq!(direction_to_char(Direction::North), 'B');
    }

    #[test]
    fn commands_survive_the_wire() {
        let commands = vec![
            Command::SetSpeed(Speed::Run),
            Command::Move(Direction::North),
            Command::Turn(Direction::West),
            Command::Jump,
            Command::Sit(Direction::South),
            Command::Correct(12, 340),
        ];
        let wire = encode_commands(&commands);
        assert_eq!(wire, "rBtIjsCc12.340.");
        assert_eq!(decode_commands(&wire), commands);
    }

    #[test]
    fn sit_consumes_exactly_two_chars() {
        let (command, used) = decode_one("sAextra").unwrap();
        assert_eq!(command, Command::Sit(Direction::None));
        assert_eq!(used, 2);
        let (command, used) = decode_one("sC").unwrap();
        assert_eq!(command, Command::Sit(Direction::South));
        assert_eq!(used, 2);
    }

    #[test]
    fn correction_missing_delimiter_is_malformed() {
        assert!(matches!(
            decode_one("c12"),
            Err(ProtocolError::MissingDelimiter)
        ));
        assert!(matches!(
            decode_one("c12.5"),
            Err(ProtocolError::MissingDelimiter)
        ));
        assert_eq!(decode_commands("c12"), Vec::new());
    }

    #[test]
    fn unknown_opcode_is_skipped_not_fatal() {
        assert_eq!(
            decode_commands("x?Bw"),
            vec![Command::Move(Direction::North), Command::SetSpeed(Speed::Walk)]
        );
    }

    #[test]
    fn correction_consumes_through_second_dot() {
        let (command, used) = decode_one("c-4.7.Bw").unwrap();
        assert_eq!(command, Command::Correct(-4, 7));
        assert_eq!(used, 6);
    }
}
