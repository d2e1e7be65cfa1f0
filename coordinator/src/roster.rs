//! Coordinator-side character roster
//!
//! The roster is the source of truth the combat worker mirrors. Every
//! structural change and every movement update produces the message that
//! keeps the worker in sync; callers forward it over the worker link.

use log::{debug, info};
use shared::{derive_attack, Attack, AttackIntent, Character, Direction, Message};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Authoritative character map for one session group
#[derive(Debug, Default)]
pub struct Roster {
    characters: HashMap<String, Character>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a character at the origin and returns the snapshot to send
    pub fn join(&mut self, id: &str) -> Message {
        let mut character = Character::new(id, 0.0, 0.0);
        character.last_update = timestamp_ms();

        info!("Character {} joined", id);
        self.characters.insert(id.to_string(), character);
        self.snapshot()
    }

    /// Replaces the character owned by session `id` with `update` wholesale
    ///
    /// The entry is keyed by the session's id whatever the update carries,
    /// and stamped with the time it was received. Positions are trusted
    /// as-is. Returns the full snapshot to send.
    pub fn apply_movement(&mut self, id: &str, mut update: Character) -> Message {
        update.id = id.to_string();
        update.last_update = timestamp_ms();

        debug!("Character {} moved to ({}, {})", id, update.x, update.y);
        self.characters.insert(id.to_string(), update);
        self.snapshot()
    }

    /// Single-character alternative to a full snapshot
    pub fn upsert_message(&self, id: &str) -> Option<Message> {
        self.characters
            .get(id)
            .cloned()
            .map(Message::CharacterUpsert)
    }

    /// Removes a character and returns it with the snapshot to send
    pub fn leave(&mut self, id: &str) -> Option<(Character, Message)> {
        let character = self.characters.remove(id)?;
        info!("Character {} left", id);
        Some((character, self.snapshot()))
    }

    /// Derives the hitbox for an attack request
    ///
    /// Returns the derived attack for the visual broadcast together with the
    /// submission for the worker, or `None` when the direction has no hitbox.
    pub fn relay_attack(&self, intent: AttackIntent) -> Option<(Attack, Message)> {
        match derive_attack(&intent) {
            Some(attack) => Some((attack, Message::AttackSubmit(intent))),
            None => {
                debug!(
                    "Not handling attack from {} facing {:?}",
                    intent.attacker_id, intent.direction
                );
                None
            }
        }
    }

    /// Builds an attack from the attacker's current roster position
    pub fn attack(&self, attacker_id: &str, direction: Direction) -> Option<(Attack, Message)> {
        let attacker = self.characters.get(attacker_id)?;
        self.relay_attack(AttackIntent {
            attacker_id: attacker.id.clone(),
            x: attacker.x,
            y: attacker.y,
            direction,
        })
    }

    pub fn snapshot(&self) -> Message {
        Message::snapshot(self.characters.values())
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn snapshot_ids(message: &Message) -> Vec<String> {
        match message {
            Message::RegistrySnapshot(map) => {
                let mut ids: Vec<String> = map.keys().cloned().collect();
                ids.sort();
                ids
            }
            other => panic!("Expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_join_produces_snapshot() {
        let mut roster = Roster::new();
        roster.join("h1");
        let message = roster.join("h2");

        assert_eq!(snapshot_ids(&message), vec!["h1", "h2"]);
        let h1 = roster.get("h1").unwrap();
        assert_eq!((h1.x, h1.y), (0.0, 0.0));
        assert!(h1.last_update > 0);
    }

    #[test]
    fn test_movement_overwrites_and_stamps() {
        let mut roster = Roster::new();
        roster.join("h1");

        let message = roster.apply_movement("h1", Character::new("spoofed", 12.5, 40.0));

        assert_eq!(snapshot_ids(&message), vec!["h1"]);
        let h1 = roster.get("h1").unwrap();
        assert_eq!(h1.id, "h1");
        assert_approx_eq!(h1.x, 12.5);
        assert_approx_eq!(h1.y, 40.0);
        assert!(h1.last_update > 0);
        assert!(roster.get("spoofed").is_none());
    }

    #[test]
    fn test_upsert_message() {
        let mut roster = Roster::new();
        roster.join("h1");

        match roster.upsert_message("h1") {
            Some(Message::CharacterUpsert(character)) => assert_eq!(character.id, "h1"),
            other => panic!("Unexpected message: {:?}", other),
        }
        assert!(roster.upsert_message("nobody").is_none());
    }

    #[test]
    fn test_leave() {
        let mut roster = Roster::new();
        roster.join("h1");
        roster.join("h2");

        let (left, message) = roster.leave("h1").unwrap();
        assert_eq!(left.id, "h1");
        assert_eq!(snapshot_ids(&message), vec!["h2"]);
        assert!(roster.leave("h1").is_none());
    }

    #[test]
    fn test_attack_samples_current_position() {
        let mut roster = Roster::new();
        roster.join("h1");
        roster.apply_movement("h1", Character::new("h1", 100.0, 100.0));

        let (attack, message) = roster.attack("h1", Direction::Left).unwrap();
        assert_approx_eq!(attack.hitbox.x, -83.0);
        assert_approx_eq!(attack.hitbox.y, 100.0);

        match message {
            Message::AttackSubmit(intent) => {
                assert_eq!(intent.x, 100.0);
                assert_eq!(intent.y, 100.0);
                assert_eq!(intent.direction, Direction::Left);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_diagonal_attack_not_relayed() {
        let mut roster = Roster::new();
        roster.join("h1");

        assert!(roster.attack("h1", Direction::UpRight).is_none());
        assert!(roster.attack("nobody", Direction::Up).is_none());
    }

    #[test]
    fn test_relay_attack_for_unknown_attacker() {
        let roster = Roster::new();
        let relayed = roster.relay_attack(AttackIntent {
            attacker_id: "ghost".to_string(),
            x: 0.0,
            y: 0.0,
            direction: Direction::Up,
        });

        let (attack, _) = relayed.unwrap();
        assert_approx_eq!(attack.hitbox.y, -183.0);
    }
}
