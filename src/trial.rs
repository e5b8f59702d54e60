//! Experiment state for one truncation width.
//!
//! A trial runs two independent phases. The collision phase picks a fresh
//! anchor message per sample and searches for any message whose truncated
//! digest equals the anchor's. The pre-image phase searches against one
//! target digest fixed when the trial was created. Each phase stops at the
//! sample target and never runs again once it gets there.

use core::fmt;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::candidate::Message;
use crate::error::{Error, Result};
use crate::registry::UniquenessRegistry;
use crate::stats::PhaseStats;
use crate::store::PersistedTrial;
use crate::truncate::{equal_under_truncation, sha256, to_bitstring, BitWidth, Digest};
use crate::{CandidateSource, StateStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionSample {
    pub anchor: Message,
    pub partner: Message,
    pub iterations: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreImageSample {
    pub message: Message,
    pub iterations: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Collision,
    PreImage,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Collision => "collision",
            Phase::PreImage => "pre-image",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Trial {
    width: BitWidth,
    target_digest: Digest,
    sample_target: usize,
    /// `None` searches until a match, however long that takes.
    iteration_ceiling: Option<u64>,
    collision_samples: Vec<CollisionSample>,
    anchors: HashSet<Message>,
    pre_image_samples: Vec<PreImageSample>,
}

impl Trial {
    /// Empty trial around an already chosen target. The target is not
    /// registered; `fresh` and `reconstruct` are the entry points that keep
    /// targets unique.
    pub(crate) fn new(width: BitWidth, target_digest: Digest, sample_target: usize) -> Self {
        Self {
            width,
            target_digest,
            sample_target,
            iteration_ceiling: None,
            collision_samples: Vec::new(),
            anchors: HashSet::new(),
            pre_image_samples: Vec::new(),
        }
    }

    /// Empty trial with a newly drawn target that no other trial owns.
    pub fn fresh<S>(
        width: BitWidth,
        sample_target: usize,
        registry: &mut UniquenessRegistry,
        source: &mut S,
    ) -> Result<Self>
    where
        S: CandidateSource + ?Sized,
    {
        let width = trial_width(width.bits())?;
        let target = registry.fresh_target(source, width)?;
        info!(width = width.bits(), target = %hex::encode(target), "created new trial");
        Ok(Self::new(width, target, sample_target))
    }

    /// Rebuilds a trial from its record, then registers its target and
    /// anchors so later sampling cannot reuse them.
    pub fn reconstruct(
        record: PersistedTrial,
        sample_target: usize,
        registry: &mut UniquenessRegistry,
    ) -> Result<Self> {
        let width = trial_width(record.bit_width)?;
        let mut trial = Self::new(width, record.target_digest, sample_target);

        for sample in record.collision_samples {
            trial.check_collision(&sample)?;
            trial.anchors.insert(sample.anchor.clone());
            trial.collision_samples.push(sample);
        }
        for sample in record.pre_image_samples {
            trial.check_pre_image(&sample)?;
            trial.pre_image_samples.push(sample);
        }

        let anchors: Vec<Message> = trial
            .collision_samples
            .iter()
            .map(|s| s.anchor.clone())
            .collect();
        registry.claim(width, trial.target_digest, anchors)?;

        info!(
            width = width.bits(),
            collision = trial.collision_samples.len(),
            pre_image = trial.pre_image_samples.len(),
            "resumed trial"
        );
        Ok(trial)
    }

    pub fn with_iteration_ceiling(mut self, ceiling: Option<u64>) -> Self {
        self.iteration_ceiling = ceiling;
        self
    }

    pub fn width(&self) -> BitWidth {
        self.width
    }

    pub fn target_digest(&self) -> &Digest {
        &self.target_digest
    }

    pub fn sample_target(&self) -> usize {
        self.sample_target
    }

    pub fn collision_samples(&self) -> &[CollisionSample] {
        &self.collision_samples
    }

    pub fn pre_image_samples(&self) -> &[PreImageSample] {
        &self.pre_image_samples
    }

    pub fn sample_count(&self, phase: Phase) -> usize {
        match phase {
            Phase::Collision => self.collision_samples.len(),
            Phase::PreImage => self.pre_image_samples.len(),
        }
    }

    pub fn is_complete(&self, phase: Phase) -> bool {
        self.sample_count(phase) >= self.sample_target
    }

    pub fn stats(&self, phase: Phase) -> PhaseStats {
        let iterations: Vec<u64> = match phase {
            Phase::Collision => self.collision_samples.iter().map(|s| s.iterations).collect(),
            Phase::PreImage => self.pre_image_samples.iter().map(|s| s.iterations).collect(),
        };
        PhaseStats::from_iterations(self.width, &iterations)
    }

    pub fn to_record(&self) -> PersistedTrial {
        PersistedTrial {
            bit_width: self.width.bits(),
            target_digest: self.target_digest,
            collision_samples: self.collision_samples.clone(),
            pre_image_samples: self.pre_image_samples.clone(),
        }
    }

    /// Collects collision samples until the phase is complete, saving after each.
    ///
    /// Returns the number of samples added; zero when the phase was already complete.
    pub fn run_collision<S, T>(
        &mut self,
        registry: &mut UniquenessRegistry,
        source: &mut S,
        store: &mut T,
    ) -> Result<usize>
    where
        S: CandidateSource + ?Sized,
        T: StateStore + ?Sized,
    {
        let width = self.width.bits();
        if self.is_complete(Phase::Collision) {
            info!(width, "all collision samples complete; no new tests will be run");
            return Ok(0);
        }

        let mut added = 0;
        while !self.is_complete(Phase::Collision) {
            info!(
                width,
                sample = self.collision_samples.len(),
                "running collision experiment"
            );
            let anchor = registry.fresh_anchor(source);
            let target = sha256(anchor.as_str().as_bytes());
            debug!(
                width,
                %anchor,
                target = %to_bitstring(&target, self.width),
                "chose anchor"
            );

            let (partner, iterations) = self.search(&target, source)?;
            info!(width, iterations, "collision found");

            self.anchors.insert(anchor.clone());
            self.collision_samples.push(CollisionSample {
                anchor: anchor.clone(),
                partner,
                iterations,
            });
            registry.register_anchor(anchor, self.width)?;
            store.save(&self.to_record())?;
            added += 1;
        }

        info!(width, added, "collision phase complete");
        Ok(added)
    }

    /// Collects pre-image samples against the trial's target until complete.
    pub fn run_pre_image<S, T>(&mut self, source: &mut S, store: &mut T) -> Result<usize>
    where
        S: CandidateSource + ?Sized,
        T: StateStore + ?Sized,
    {
        let width = self.width.bits();
        if self.is_complete(Phase::PreImage) {
            info!(width, "all pre-image samples complete; no new tests will be run");
            return Ok(0);
        }

        let target = self.target_digest;
        let mut added = 0;
        while !self.is_complete(Phase::PreImage) {
            info!(
                width,
                sample = self.pre_image_samples.len(),
                "running pre-image experiment"
            );
            let (message, iterations) = self.search(&target, source)?;
            info!(width, iterations, "pre-image found");

            self.pre_image_samples.push(PreImageSample {
                message,
                iterations,
            });
            store.save(&self.to_record())?;
            added += 1;
        }

        info!(width, added, "pre-image phase complete");
        Ok(added)
    }

    /// Draws candidates until one agrees with `target` under this width.
    ///
    /// Draws are counted from 1. Candidates are not filtered, so a collision
    /// partner may equal its anchor.
    fn search<S>(&self, target: &Digest, source: &mut S) -> Result<(Message, u64)>
    where
        S: CandidateSource + ?Sized,
    {
        let mut iterations = 0u64;
        loop {
            if let Some(limit) = self.iteration_ceiling {
                if iterations >= limit {
                    return Err(Error::IterationCeiling {
                        width: self.width.bits(),
                        limit,
                    });
                }
            }
            let candidate = source.message();
            iterations += 1;
            let digest = sha256(candidate.as_str().as_bytes());
            if equal_under_truncation(&digest, target, self.width) {
                return Ok((candidate, iterations));
            }
        }
    }

    fn check_collision(&self, sample: &CollisionSample) -> Result<()> {
        if self.anchors.contains(&sample.anchor) {
            return Err(Error::InvalidRecord(format!(
                "anchor {} appears twice in the {}-bit trial",
                sample.anchor, self.width
            )));
        }
        let a = sha256(sample.anchor.as_str().as_bytes());
        let b = sha256(sample.partner.as_str().as_bytes());
        if sample.iterations == 0 || !equal_under_truncation(&a, &b, self.width) {
            return Err(Error::InvalidRecord(format!(
                "collision sample {} / {} does not hold at {} bits",
                sample.anchor, sample.partner, self.width
            )));
        }
        Ok(())
    }

    fn check_pre_image(&self, sample: &PreImageSample) -> Result<()> {
        let digest = sha256(sample.message.as_str().as_bytes());
        if sample.iterations == 0 || !equal_under_truncation(&digest, &self.target_digest, self.width)
        {
            return Err(Error::InvalidRecord(format!(
                "pre-image sample {} does not hold at {} bits",
                sample.message, self.width
            )));
        }
        Ok(())
    }
}

/// Width for a trial: within the digest and positive.
fn trial_width(bits: u32) -> Result<BitWidth> {
    let width = BitWidth::new(bits)?;
    if width.bits() == 0 {
        return Err(Error::ZeroWidth);
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::RandomCandidates;
    use crate::store::MemoryStore;
    use crate::truncate::hash_and_truncate;

    fn width(bits: u32) -> BitWidth {
        BitWidth::new(bits).unwrap()
    }

    #[test]
    fn fresh_trial_registers_its_target() {
        let mut registry = UniquenessRegistry::new();
        let mut source = RandomCandidates::seeded(1);
        let trial = Trial::fresh(width(8), 50, &mut registry, &mut source).unwrap();
        assert_eq!(registry.target_owner(trial.target_digest()), Some(width(8)));
        assert_eq!(trial.sample_count(Phase::Collision), 0);
        assert_eq!(trial.sample_count(Phase::PreImage), 0);
    }

    #[test]
    fn small_width_runs_to_completion() {
        let mut registry = UniquenessRegistry::new();
        let mut source = RandomCandidates::seeded(2);
        let mut store = MemoryStore::new();
        let mut trial = Trial::fresh(width(4), 5, &mut registry, &mut source).unwrap();

        assert_eq!(trial.run_collision(&mut registry, &mut source, &mut store).unwrap(), 5);
        assert_eq!(trial.run_pre_image(&mut source, &mut store).unwrap(), 5);
        assert_eq!(store.saves(), 10);
        assert!(trial.is_complete(Phase::Collision));
        assert!(trial.is_complete(Phase::PreImage));

        for sample in trial.collision_samples() {
            assert!(sample.iterations >= 1);
            assert!(registry.is_anchor_registered(&sample.anchor));
            assert_eq!(
                hash_and_truncate(sample.anchor.as_str(), width(4)),
                hash_and_truncate(sample.partner.as_str(), width(4))
            );
        }
        let target = to_bitstring(trial.target_digest(), width(4));
        for sample in trial.pre_image_samples() {
            assert_eq!(hash_and_truncate(sample.message.as_str(), width(4)), target);
        }
        assert_eq!(store.get(width(4)), Some(&trial.to_record()));
    }

    #[test]
    fn complete_phases_are_no_ops() {
        let mut registry = UniquenessRegistry::new();
        let mut source = RandomCandidates::seeded(3);
        let mut store = MemoryStore::new();
        let mut trial = Trial::fresh(width(2), 3, &mut registry, &mut source).unwrap();
        trial.run_collision(&mut registry, &mut source, &mut store).unwrap();
        trial.run_pre_image(&mut source, &mut store).unwrap();
        let before = trial.to_record();
        let saves = store.saves();

        assert_eq!(trial.run_collision(&mut registry, &mut source, &mut store).unwrap(), 0);
        assert_eq!(trial.run_pre_image(&mut source, &mut store).unwrap(), 0);
        assert_eq!(trial.to_record(), before);
        assert_eq!(store.saves(), saves);
    }

    #[test]
    fn ceiling_stops_search_without_recording() {
        let mut registry = UniquenessRegistry::new();
        let mut source = RandomCandidates::seeded(4);
        let mut store = MemoryStore::new();
        let mut trial = Trial::fresh(width(256), 1, &mut registry, &mut source)
            .unwrap()
            .with_iteration_ceiling(Some(10));
        let err = trial.run_pre_image(&mut source, &mut store).unwrap_err();
        assert!(matches!(
            err,
            Error::IterationCeiling {
                width: 256,
                limit: 10
            }
        ));
        assert_eq!(trial.sample_count(Phase::PreImage), 0);
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn reconstruct_rejects_samples_that_do_not_match() {
        let mut record = Trial::new(width(8), [0u8; 32], 50).to_record();
        record.collision_samples.push(CollisionSample {
            anchor: Message::try_from("anchorMessage0").unwrap(),
            partner: Message::try_from("missAAAAAAAAA1").unwrap(),
            iterations: 3,
        });
        let mut registry = UniquenessRegistry::new();
        assert!(matches!(
            Trial::reconstruct(record, 50, &mut registry),
            Err(Error::InvalidRecord(_))
        ));
        assert_eq!(registry.target_count(), 0);
    }

    #[test]
    fn zero_width_trials_are_rejected() {
        let mut registry = UniquenessRegistry::new();
        let mut source = RandomCandidates::seeded(5);
        assert!(matches!(
            Trial::fresh(width(0), 3, &mut registry, &mut source),
            Err(Error::ZeroWidth)
        ));
        assert_eq!(registry.target_count(), 0);

        let mut record = Trial::new(width(8), [0u8; 32], 50).to_record();
        record.bit_width = 0;
        assert!(matches!(
            Trial::reconstruct(record, 50, &mut registry),
            Err(Error::ZeroWidth)
        ));
        assert_eq!(registry.target_count(), 0);
    }

    #[test]
    fn rejected_record_leaves_registry_untouched() {
        let anchor = Message::try_from("anchorMessage0").unwrap();
        let mut registry = UniquenessRegistry::new();
        registry.register_anchor(anchor.clone(), width(6)).unwrap();

        let mut record = Trial::new(width(8), [5u8; 32], 50).to_record();
        record.collision_samples.push(CollisionSample {
            anchor,
            partner: Message::try_from("partner0000047").unwrap(),
            iterations: 1,
        });
        assert!(matches!(
            Trial::reconstruct(record, 50, &mut registry),
            Err(Error::DuplicateAnchor { owner: 6, .. })
        ));
        assert!(!registry.is_target_registered(&[5u8; 32]));
        assert_eq!(registry.anchor_count(), 1);
    }

    #[test]
    fn reconstruct_rejects_out_of_range_width() {
        let mut record = Trial::new(width(8), [0u8; 32], 50).to_record();
        record.bit_width = 300;
        let mut registry = UniquenessRegistry::new();
        assert!(matches!(
            Trial::reconstruct(record, 50, &mut registry),
            Err(Error::InvalidWidth(300))
        ));
    }
}
