use core::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::truncate::{Digest, DIGEST_LEN};
use crate::CandidateSource;

/// Length of every generated message.
pub const MESSAGE_LEN: usize = 14;

// Draws span '0'..='z' and are rejected until they land on an alphanumeric.
const DRAW_LOW: u8 = b'0';
const DRAW_HIGH: u8 = b'z';

/// A fixed-length ASCII message over `[0-9A-Za-z]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Message(String);

impl Message {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Message {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() != MESSAGE_LEN || !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRecord(format!(
                "message {value:?} is not {MESSAGE_LEN} alphanumeric characters"
            )));
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for Message {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<Message> for String {
    fn from(message: Message) -> Self {
        message.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draws a message by rejection sampling each character.
///
/// Every draw is uniform over `'0'..='z'` and repeats until it is
/// alphanumeric, which leaves the result uniform over the 62-character
/// alphabet while keeping the retry behaviour of a raw code point draw.
pub fn random_message<R: Rng + ?Sized>(rng: &mut R) -> Message {
    let mut text = String::with_capacity(MESSAGE_LEN);
    for _ in 0..MESSAGE_LEN {
        let c = loop {
            let c = rng.gen_range(DRAW_LOW..=DRAW_HIGH);
            if c.is_ascii_alphanumeric() {
                break c;
            }
        };
        text.push(char::from(c));
    }
    Message(text)
}

pub fn random_digest<R: Rng + ?Sized>(rng: &mut R) -> Digest {
    let mut digest = [0u8; DIGEST_LEN];
    rng.fill(&mut digest);
    digest
}

/// Candidate source backed by a random number generator.
pub struct RandomCandidates<R> {
    rng: R,
}

impl<R: Rng> RandomCandidates<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomCandidates<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible source, for debugging and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CandidateSource for RandomCandidates<R> {
    fn message(&mut self) -> Message {
        random_message(&mut self.rng)
    }

    fn digest(&mut self) -> Digest {
        random_digest(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn messages_are_fixed_length_alphanumeric() {
        let mut source = RandomCandidates::seeded(7);
        for _ in 0..1000 {
            let m = source.message();
            assert_eq!(m.as_str().len(), MESSAGE_LEN);
            assert!(m.as_str().bytes().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn every_alphabet_class_shows_up() {
        let mut source = RandomCandidates::seeded(11);
        let seen: HashSet<u8> = (0..500)
            .flat_map(|_| source.message().as_str().bytes().collect::<Vec<_>>())
            .collect();
        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RandomCandidates::seeded(3);
        let mut b = RandomCandidates::seeded(3);
        assert_eq!(a.message(), b.message());
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn message_validation() {
        assert!(Message::try_from("abcdefgHIJK012").is_ok());
        assert!(Message::try_from("short").is_err());
        assert!(Message::try_from("abcdefgHIJK01_").is_err());
    }
}
