//! Line commands accepted by the coordinator driver

use shared::Direction;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join { id: String },
    Move { id: String, x: f32, y: f32 },
    /// Movement sent as a single-character upsert instead of a snapshot
    Upsert { id: String, x: f32, y: f32 },
    Leave { id: String },
    Attack { id: String, direction: Direction },
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            ["join", id] => Ok(Command::Join { id: id.to_string() }),
            ["move", id, x, y] => Ok(Command::Move {
                id: id.to_string(),
                x: parse_coord(x)?,
                y: parse_coord(y)?,
            }),
            ["upsert", id, x, y] => Ok(Command::Upsert {
                id: id.to_string(),
                x: parse_coord(x)?,
                y: parse_coord(y)?,
            }),
            ["leave", id] => Ok(Command::Leave { id: id.to_string() }),
            ["attack", id, direction] => Ok(Command::Attack {
                id: id.to_string(),
                direction: direction.parse()?,
            }),
            ["quit"] | ["exit"] => Ok(Command::Quit),
            [] => Err("empty command".to_string()),
            _ => Err(format!("unrecognized command '{}'", line.trim())),
        }
    }
}

fn parse_coord(value: &str) -> Result<f32, String> {
    value
        .parse::<f32>()
        .map_err(|_| format!("invalid coordinate '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("join h1"),
            Ok(Command::Join { id: "h1".to_string() })
        );
        assert_eq!(
            Command::parse("  move h1 10 -2.5 "),
            Ok(Command::Move {
                id: "h1".to_string(),
                x: 10.0,
                y: -2.5
            })
        );
        assert_eq!(
            Command::parse("upsert h1 3 4"),
            Ok(Command::Upsert {
                id: "h1".to_string(),
                x: 3.0,
                y: 4.0
            })
        );
        assert_eq!(
            Command::parse("attack h1 down"),
            Ok(Command::Attack {
                id: "h1".to_string(),
                direction: Direction::Down
            })
        );
        assert_eq!(
            Command::parse("attack h1 4"),
            Ok(Command::Attack {
                id: "h1".to_string(),
                direction: Direction::UpLeft
            })
        );
        assert_eq!(Command::parse("leave h1"), Ok(Command::Leave { id: "h1".to_string() }));
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("dance h1").is_err());
        assert!(Command::parse("move h1 ten 2").is_err());
        assert!(Command::parse("attack h1 sideways").is_err());
        assert!(Command::parse("join").is_err());
    }
}
