use tracing::info;

use crate::config::ExperimentConfig;
use crate::error::Result;
use crate::registry::UniquenessRegistry;
use crate::trial::Trial;
use crate::{CandidateSource, StateStore};

/// Every trial of a run, opened against one store and one registry.
pub struct Experiment<S, T> {
    config: ExperimentConfig,
    registry: UniquenessRegistry,
    source: S,
    store: T,
    trials: Vec<Trial>,
}

impl<S: CandidateSource, T: StateStore> Experiment<S, T> {
    /// Loads or creates one trial per configured width.
    ///
    /// All stored trials are replayed into the registry before any fresh
    /// target is drawn, so new targets never clash with resumed ones.
    pub fn open(config: ExperimentConfig, mut store: T, mut source: S) -> Result<Self> {
        config.validate()?;
        let mut registry = UniquenessRegistry::new();

        let mut resumed = Vec::with_capacity(config.widths.len());
        for &width in &config.widths {
            match store.load(width)? {
                Some(record) => {
                    resumed.push(Some(Trial::reconstruct(record, config.samples, &mut registry)?))
                }
                None => {
                    info!(width = width.bits(), "no stored trial, creating a new one");
                    resumed.push(None);
                }
            }
        }

        let mut trials = Vec::with_capacity(config.widths.len());
        for (&width, slot) in config.widths.iter().zip(resumed) {
            let trial = match slot {
                Some(trial) => trial,
                None => Trial::fresh(width, config.samples, &mut registry, &mut source)?,
            };
            trials.push(trial.with_iteration_ceiling(config.iteration_ceiling));
        }

        Ok(Self {
            config,
            registry,
            source,
            store,
            trials,
        })
    }

    /// Runs the collision phase then the pre-image phase of every trial, in width order.
    pub fn run(&mut self) -> Result<()> {
        for trial in &mut self.trials {
            trial.run_collision(&mut self.registry, &mut self.source, &mut self.store)?;
            trial.run_pre_image(&mut self.source, &mut self.store)?;
        }
        info!(trials = self.trials.len(), "experiment complete");
        Ok(())
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn registry(&self) -> &UniquenessRegistry {
        &self.registry
    }

    pub fn store(&self) -> &T {
        &self.store
    }
}
