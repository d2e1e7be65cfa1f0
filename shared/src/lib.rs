use serde::{Deserialize, Serialize};

pub mod protocol;

pub use protocol::{decode, encode, Message, WireError};

/// Attack reach along the facing axis.
pub const HITBOX_LENGTH: f32 = 183.0;
/// Attack width across the facing axis.
pub const HITBOX_BREADTH: f32 = 66.0;
/// Downward attacks start this far below the attacker's origin.
pub const DOWN_OFFSET: f32 = 121.0;
/// Rightward attacks start this far right of the attacker's origin.
pub const RIGHT_OFFSET: f32 = 61.0;
/// Collision resolution period (50Hz).
pub const TICK_INTERVAL_MS: u64 = 20;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub last_update: u64,
}

impl Character {
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            last_update: 0,
        }
    }
}

/// Eight-way facing, encoded on the wire as an integer code.
///
/// Codes outside 0..=7 are kept as `Other` so that a bad direction drops the
/// attack instead of failing the whole message.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "u8", into = "u8")]
pub enum Direction {
    DownLeft,
    Down,
    DownRight,
    Left,
    UpLeft,
    Right,
    UpRight,
    Up,
    Other(u8),
}

impl From<u8> for Direction {
    fn from(code: u8) -> Self {
        match code {
            0 => Direction::DownLeft,
            1 => Direction::Down,
            2 => Direction::DownRight,
            3 => Direction::Left,
            4 => Direction::UpLeft,
            5 => Direction::Right,
            6 => Direction::UpRight,
            7 => Direction::Up,
            other => Direction::Other(other),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::DownLeft => 0,
            Direction::Down => 1,
            Direction::DownRight => 2,
            Direction::Left => 3,
            Direction::UpLeft => 4,
            Direction::Right => 5,
            Direction::UpRight => 6,
            Direction::Up => 7,
            Direction::Other(code) => code,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DOWNLEFT" => Ok(Direction::DownLeft),
            "DOWN" => Ok(Direction::Down),
            "DOWNRIGHT" => Ok(Direction::DownRight),
            "LEFT" => Ok(Direction::Left),
            "UPLEFT" => Ok(Direction::UpLeft),
            "RIGHT" => Ok(Direction::Right),
            "UPRIGHT" => Ok(Direction::UpRight),
            "UP" => Ok(Direction::Up),
            other => other
                .parse::<u8>()
                .map(Direction::from)
                .map_err(|_| format!("unknown direction '{}'", s)),
        }
    }
}

/// An attack request before its hitbox has been derived.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttackIntent {
    pub attacker_id: String,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict overlap test; rectangles sharing only an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// An attack with its derived hitbox, ready to be resolved.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub attacker_id: String,
    pub direction: Direction,
    pub hitbox: Rect,
}

impl Attack {
    /// Returns true when this attack lands on `character`.
    ///
    /// The attacker never hits itself. The character is tested as a box of
    /// the attack's own width and height at the character's position.
    pub fn hits(&self, character: &Character) -> bool {
        if character.id == self.attacker_id {
            return false;
        }

        let body = Rect::new(
            character.x,
            character.y,
            self.hitbox.width,
            self.hitbox.height,
        );
        self.hitbox.overlaps(&body)
    }
}

/// Turns an attack intent into its hitbox.
///
/// Both the broadcast path and the authoritative resolution path go through
/// here. Diagonal and unknown directions yield `None` and the attack is
/// dropped.
pub fn derive_attack(intent: &AttackIntent) -> Option<Attack> {
    let (x, y) = (intent.x, intent.y);
    let hitbox = match intent.direction {
        Direction::Down => Rect::new(x, y + DOWN_OFFSET, HITBOX_BREADTH, HITBOX_LENGTH),
        Direction::Left => Rect::new(x - HITBOX_LENGTH, y, HITBOX_LENGTH, HITBOX_BREADTH),
        Direction::Right => Rect::new(x + RIGHT_OFFSET, y, HITBOX_LENGTH, HITBOX_BREADTH),
        Direction::Up => Rect::new(x, y - HITBOX_LENGTH, HITBOX_BREADTH, HITBOX_LENGTH),
        Direction::DownLeft
        | Direction::DownRight
        | Direction::UpLeft
        | Direction::UpRight
        | Direction::Other(_) => return None,
    };

    Some(Attack {
        attacker_id: intent.attacker_id.clone(),
        direction: intent.direction,
        hitbox,
    })
}
