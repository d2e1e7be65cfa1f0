//! Message envelope exchanged between the coordinator and the combat worker.
//!
//! Every message travels as one JSON object per line:
//! `{"type": "<tag>", "data": <payload>}`. Delivery is fire-and-forget and
//! ordered per direction; nothing is acknowledged.

use crate::{AttackIntent, Character};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const REGISTRY_SNAPSHOT: &str = "registrySnapshot";
pub const CHARACTER_UPSERT: &str = "characterUpsert";
pub const ATTACK_SUBMIT: &str = "attackSubmit";
pub const HIT_NOTIFICATION: &str = "hitNotification";

const KNOWN_TAGS: [&str; 4] = [
    REGISTRY_SNAPSHOT,
    CHARACTER_UPSERT,
    ATTACK_SUBMIT,
    HIT_NOTIFICATION,
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Message {
    /// Coordinator -> worker: replace the whole registry.
    RegistrySnapshot(HashMap<String, Character>),
    /// Coordinator -> worker: insert or replace one character.
    CharacterUpsert(Character),
    /// Coordinator -> worker: queue an attack for the next tick.
    AttackSubmit(AttackIntent),
    /// Worker -> coordinator: the character with this id was hit.
    HitNotification(String),
    /// A tag this build does not know. Only ever produced by [`decode`].
    #[serde(skip)]
    Unrecognized(String),
}

impl Message {
    pub fn snapshot<'a>(characters: impl IntoIterator<Item = &'a Character>) -> Self {
        Message::RegistrySnapshot(
            characters
                .into_iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
        )
    }

    pub fn tag(&self) -> &str {
        match self {
            Message::RegistrySnapshot(_) => REGISTRY_SNAPSHOT,
            Message::CharacterUpsert(_) => CHARACTER_UPSERT,
            Message::AttackSubmit(_) => ATTACK_SUBMIT,
            Message::HitNotification(_) => HIT_NOTIFICATION,
            Message::Unrecognized(tag) => tag,
        }
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("cannot encode unrecognized message type '{0}'")]
    Unencodable(String),
    #[error("channel i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Tag-only view used to classify lines the typed decoder rejected.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    tag: String,
}

/// Encodes a message as a single line, without the trailing newline.
pub fn encode(message: &Message) -> Result<String, WireError> {
    if let Message::Unrecognized(tag) = message {
        return Err(WireError::Unencodable(tag.clone()));
    }
    Ok(serde_json::to_string(message)?)
}

/// Decodes one line.
///
/// An unknown tag is not an error: it comes back as
/// [`Message::Unrecognized`] so the receiver can log it and carry on.
pub fn decode(line: &str) -> Result<Message, WireError> {
    match serde_json::from_str::<Message>(line) {
        Ok(message) => Ok(message),
        Err(err) => {
            let envelope = match serde_json::from_str::<Envelope>(line) {
                Ok(envelope) => envelope,
                Err(_) => return Err(err.into()),
            };
            // Known tag with a broken payload.
            if KNOWN_TAGS.contains(&envelope.tag.as_str()) {
                return Err(err.into());
            }
            Ok(Message::Unrecognized(envelope.tag))
        }
    }
}
