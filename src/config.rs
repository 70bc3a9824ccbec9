//! YAML run configuration: target service, virtual-user count, think-time
//! bounds and the weighted action table.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration of a load-test run, parsed from YAML.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the target service, e.g. `https://api.example.org`.
    pub remote: String,

    /// Root path of the API, prepended to every `.json` endpoint.
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Comma-separated credential file. A missing file means no credentials.
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,

    /// Number of concurrent virtual users to spawn.
    pub users: usize,

    /// Total duration of the run.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Bounds for the randomized think time between actions.
    #[serde(default)]
    pub wait: Wait,

    /// Relative selection frequencies for the actions.
    #[serde(default)]
    pub weights: Weights,
}

/// Think-time bounds; each virtual user sleeps a uniformly sampled duration
/// from this range after every action.
#[derive(Debug, Deserialize)]
pub struct Wait {
    /// Minimum think time.
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    /// Maximum think time.
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(9),
        }
    }
}

/// The weighted action table handed to the scheduler. A weight of zero
/// excludes the action from the run.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Weights {
    /// Weight of the profile fetch.
    #[serde(default = "default_weight")]
    pub profile: u8,
    /// Weight of the shared-orgs listing.
    #[serde(default = "default_weight")]
    pub orgs: u8,
    /// Weight of the projects listing.
    #[serde(default = "default_weight")]
    pub projects: u8,
    /// Weight of the form publish.
    #[serde(default = "default_weight")]
    pub publish_form: u8,
    /// Weight of the data submission.
    #[serde(default = "default_weight")]
    pub submission: u8,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            profile: 1,
            orgs: 1,
            projects: 1,
            publish_form: 1,
            submission: 1,
        }
    }
}

fn default_root_path() -> String {
    "/api/v1/".to_owned()
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.csv")
}

fn default_weight() -> u8 {
    1
}
