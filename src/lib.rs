//! Empirical cost of brute-force collision and pre-image search against
//! truncated SHA-256 digests.
//!
//! For each truncation width a [`Trial`] gathers a fixed number of collision
//! samples (a fresh anchor message and any message agreeing with it on the
//! leading bits) and pre-image samples (any message agreeing with a fixed
//! random target), recording how many draws each search took. Trials are
//! saved after every sample and resume where they stopped.

mod candidate;
mod config;
mod error;
mod experiment;
mod printer;
mod registry;
mod stats;
mod store;
mod trial;
pub mod truncate;

pub use crate::candidate::{random_digest, random_message, Message, RandomCandidates, MESSAGE_LEN};
pub use crate::config::{ExperimentConfig, Invocation, DEFAULT_SAMPLES, DEFAULT_WIDTHS, USAGE};
pub use crate::error::{Error, Result};
pub use crate::experiment::Experiment;
pub use crate::printer::summary_table;
pub use crate::registry::UniquenessRegistry;
pub use crate::stats::PhaseStats;
pub use crate::store::{JsonDirStore, MemoryStore, PersistedTrial};
pub use crate::trial::{CollisionSample, Phase, PreImageSample, Trial};
pub use crate::truncate::{
    equal_under_truncation, hash_and_truncate, sha256, to_bitstring, BitWidth, Digest,
    TruncatedValue,
};

/// Supplies candidate messages and target digests to the searches.
pub trait CandidateSource {
    fn message(&mut self) -> Message;
    fn digest(&mut self) -> Digest;
}

/// Keeps one trial record per width between runs.
pub trait StateStore {
    /// `Ok(None)` when no record exists yet for `width`.
    fn load(&mut self, width: BitWidth) -> Result<Option<PersistedTrial>>;
    fn save(&mut self, record: &PersistedTrial) -> Result<()>;
}

impl<S: CandidateSource + ?Sized> CandidateSource for &mut S {
    fn message(&mut self) -> Message {
        (**self).message()
    }

    fn digest(&mut self) -> Digest {
        (**self).digest()
    }
}

impl<T: StateStore + ?Sized> StateStore for &mut T {
    fn load(&mut self, width: BitWidth) -> Result<Option<PersistedTrial>> {
        (**self).load(width)
    }

    fn save(&mut self, record: &PersistedTrial) -> Result<()> {
        (**self).save(record)
    }
}
