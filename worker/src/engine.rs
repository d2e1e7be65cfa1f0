use crate::registry::Registry;
use log::{debug, info, warn};
use shared::{derive_attack, Attack, Message};

/// Authoritative combat state: the registry mirror plus pending attacks.
///
/// Only the worker task touches this. Messages mutate it between ticks and
/// `tick` resolves everything queued since the previous tick.
#[derive(Debug, Default)]
pub struct CombatEngine {
    registry: Registry,
    attacks: Vec<Attack>,
    tick: u64,
}

impl CombatEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_message(&mut self, message: Message) {
        match message {
            Message::RegistrySnapshot(snapshot) => self.registry.replace_all(snapshot),
            Message::CharacterUpsert(character) => self.registry.upsert(character),
            Message::AttackSubmit(intent) => match derive_attack(&intent) {
                Some(attack) => {
                    debug!(
                        "Queued attack from {} facing {:?}",
                        attack.attacker_id, attack.direction
                    );
                    self.attacks.push(attack);
                }
                None => debug!(
                    "Dropped attack from {} with unmapped direction {:?}",
                    intent.attacker_id, intent.direction
                ),
            },
            Message::HitNotification(victim) => {
                warn!("Ignoring hit notification for {} sent to worker", victim);
            }
            Message::Unrecognized(tag) => {
                warn!("Type not recognized: {}", tag);
            }
        }
    }

    /// Resolves every queued attack against the registry.
    ///
    /// Returns the ids of the characters hit, in the order they were hit. Each
    /// victim is removed immediately, so later attacks in the same tick no
    /// longer see it. The queue is empty afterwards whatever the outcome.
    pub fn tick(&mut self) -> Vec<String> {
        self.tick += 1;

        if self.attacks.is_empty() {
            return Vec::new();
        }

        let mut victims = Vec::new();
        for attack in std::mem::take(&mut self.attacks) {
            for key in self.registry.ids() {
                // Notifications name the record's own id, which a snapshot
                // may key differently.
                let victim = match self.registry.get(&key) {
                    Some(character) if attack.hits(character) => character.id.clone(),
                    _ => {
                        debug!("miss: {} -> {}", attack.attacker_id, key);
                        continue;
                    }
                };

                info!("{} hit {} on tick {}", attack.attacker_id, victim, self.tick);
                self.registry.remove(&key);
                victims.push(victim);
            }
        }

        victims
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn pending_attacks(&self) -> &[Attack] {
        &self.attacks
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}
