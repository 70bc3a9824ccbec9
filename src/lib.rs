//! A load-generation harness for a form/survey submission REST API.
//!
//! Each virtual user logs in with digest credentials, trades them for a
//! temporary token, and then repeatedly performs a weighted-random [`Action`]
//! (fetch profile, list orgs/projects, publish a form, submit data) with
//! randomized think time in between.
//!
//! Every action performs exactly one primary HTTP call and reports a timer
//! sample plus status-coded counters to an injected [`Metrics`] sink, which is
//! printed as a report at the end of the run.
//!
//! [`Action`]: crate::behavior::Action
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod api;
pub mod behavior;
pub mod config;
pub mod credentials;
pub mod loadtest;
pub mod metrics;
pub mod session;


pub use crate::loadtest::run;
pub use crate::metrics::Metrics;
