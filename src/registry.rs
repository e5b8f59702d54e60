use std::collections::HashMap;

use crate::candidate::Message;
use crate::error::{Error, Result};
use crate::truncate::{BitWidth, Digest};
use crate::CandidateSource;

/// Run-wide record of collision anchors and pre-image targets.
///
/// Each entry remembers the width of the trial that owns it. One registry is
/// built per run and handed to every trial operation.
#[derive(Debug, Default)]
pub struct UniquenessRegistry {
    anchors: HashMap<Message, BitWidth>,
    targets: HashMap<Digest, BitWidth>,
}

impl UniquenessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_anchor_registered(&self, message: &Message) -> bool {
        self.anchors.contains_key(message)
    }

    pub fn is_target_registered(&self, digest: &Digest) -> bool {
        self.targets.contains_key(digest)
    }

    pub fn anchor_owner(&self, message: &Message) -> Option<BitWidth> {
        self.anchors.get(message).copied()
    }

    pub fn target_owner(&self, digest: &Digest) -> Option<BitWidth> {
        self.targets.get(digest).copied()
    }

    /// Records `message` as an anchor of `trial`.
    ///
    /// Re-registering for the same trial is a no-op; an anchor owned by a
    /// different trial is rejected.
    pub fn register_anchor(&mut self, message: Message, trial: BitWidth) -> Result<()> {
        match self.anchors.get(&message) {
            Some(&owner) if owner != trial => Err(Error::DuplicateAnchor {
                message: message.to_string(),
                owner: owner.bits(),
            }),
            Some(_) => Ok(()),
            None => {
                self.anchors.insert(message, trial);
                Ok(())
            }
        }
    }

    pub fn register_target(&mut self, digest: Digest, trial: BitWidth) -> Result<()> {
        match self.targets.get(&digest) {
            Some(&owner) if owner != trial => Err(Error::DuplicateTarget {
                digest: hex::encode(digest),
                owner: owner.bits(),
            }),
            Some(_) => Ok(()),
            None => {
                self.targets.insert(digest, trial);
                Ok(())
            }
        }
    }

    /// Registers a trial's target and anchors together.
    ///
    /// Every entry is checked before any is inserted, so a conflict leaves
    /// the registry as it was.
    pub fn claim(&mut self, trial: BitWidth, target: Digest, anchors: Vec<Message>) -> Result<()> {
        if let Some(owner) = self.target_owner(&target).filter(|&owner| owner != trial) {
            return Err(Error::DuplicateTarget {
                digest: hex::encode(target),
                owner: owner.bits(),
            });
        }
        for anchor in &anchors {
            if let Some(owner) = self.anchor_owner(anchor).filter(|&owner| owner != trial) {
                return Err(Error::DuplicateAnchor {
                    message: anchor.to_string(),
                    owner: owner.bits(),
                });
            }
        }
        self.targets.insert(target, trial);
        for anchor in anchors {
            self.anchors.insert(anchor, trial);
        }
        Ok(())
    }

    /// Draws digests until one is not yet a target, then registers it.
    pub fn fresh_target<S>(&mut self, source: &mut S, trial: BitWidth) -> Result<Digest>
    where
        S: CandidateSource + ?Sized,
    {
        let digest = loop {
            let digest = source.digest();
            if !self.is_target_registered(&digest) {
                break digest;
            }
        };
        self.register_target(digest, trial)?;
        Ok(digest)
    }

    /// Draws messages until one is not yet an anchor. Does not register it.
    pub fn fresh_anchor<S>(&self, source: &mut S) -> Message
    where
        S: CandidateSource + ?Sized,
    {
        loop {
            let message = source.message();
            if !self.is_anchor_registered(&message) {
                return message;
            }
        }
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
