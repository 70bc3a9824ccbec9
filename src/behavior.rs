//! The weighted behavior of one virtual user: which action to perform next,
//! and how long to think in between.

use std::time::Duration;

use anyhow::Context;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;
use rand_distr::weighted::WeightedIndex;

use crate::config::{Wait, Weights};

/// One discrete behavior a virtual user may perform.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Fetch the profile of the logged-in user.
    Profile,
    /// List the orgs shared with the logged-in user.
    Orgs,
    /// List projects.
    Projects,
    /// Publish a fresh form.
    PublishForm,
    /// Submit a data record against the published form.
    Submission,
}

const ACTIONS: [Action; 5] = [
    Action::Profile,
    Action::Orgs,
    Action::Projects,
    Action::PublishForm,
    Action::Submission,
];

impl Action {
    /// The action name used for metric keys.
    pub fn name(self) -> &'static str {
        match self {
            Action::Profile => "profiles",
            Action::Orgs => "orgs",
            Action::Projects => "projects",
            Action::PublishForm => "forms",
            Action::Submission => "submission",
        }
    }
}

/// Weighted action selection and think-time sampling for one virtual user.
#[derive(Debug)]
pub struct Behavior {
    distribution: WeightedIndex<u8>,
    wait_min: Duration,
    wait_max: Duration,
    rng: SmallRng,
}

impl Behavior {
    /// Builds a behavior from the configured action table and wait bounds.
    ///
    /// Fails when all weights are zero or the wait bounds are inverted.
    pub fn new(weights: Weights, wait: &Wait, seed: u64) -> anyhow::Result<Self> {
        anyhow::ensure!(
            wait.max >= wait.min,
            "wait.max must not be below wait.min"
        );
        let distribution = WeightedIndex::new([
            weights.profile,
            weights.orgs,
            weights.projects,
            weights.publish_form,
            weights.submission,
        ])
        .context("at least one action weight must be non-zero")?;

        Ok(Self {
            distribution,
            wait_min: wait.min,
            wait_max: wait.max,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Samples the next action from the weighted table.
    pub fn next_action(&mut self) -> Action {
        ACTIONS[self.distribution.sample(&mut self.rng)]
    }

    /// Samples a think time uniformly from the configured bounds.
    pub fn think_time(&mut self) -> Duration {
        self.rng.random_range(self.wait_min..=self.wait_max)
    }
}
