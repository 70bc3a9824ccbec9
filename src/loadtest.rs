//! Spawns virtual users and drives their weighted action loops until the
//! deadline, then prints the metrics report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::api::ApiRemote;
use crate::behavior::{Action, Behavior};
use crate::config::Config;
use crate::credentials::Credential;
use crate::metrics::Metrics;
use crate::session::Session;

/// Runs the configured number of virtual users against the remote.
///
/// Each virtual user owns its session exclusively; the credential store and
/// the metrics sink are the only shared state, the former read-only and the
/// latter internally synchronized.
pub async fn run(remote: ApiRemote, credentials: Vec<Credential>, config: &Config) -> Result<()> {
    anyhow::ensure!(
        !credentials.is_empty(),
        "no credentials loaded from {}",
        config.users_file.display()
    );

    let remote = Arc::new(remote);
    let credentials: Arc<[Credential]> = credentials.into();
    let metrics = Arc::new(Metrics::default());
    let deadline = tokio::time::Instant::now() + config.duration;

    let users: Result<Vec<_>> = (0..config.users)
        .map(|_| {
            let behavior = Behavior::new(config.weights, &config.wait, rand::random())?;
            let remote = Arc::clone(&remote);
            let credentials = Arc::clone(&credentials);
            let metrics = Arc::clone(&metrics);
            Ok(tokio::spawn(run_user(
                remote,
                credentials,
                behavior,
                metrics,
                deadline,
            )))
        })
        .collect();

    futures::future::join_all(users?).await;

    metrics.print_report(config.duration);
    Ok(())
}

/// One virtual user: log in once, then loop weighted actions with think time
/// until the deadline. Failed calls are logged and never halt other users.
async fn run_user(
    remote: Arc<ApiRemote>,
    credentials: Arc<[Credential]>,
    mut behavior: Behavior,
    metrics: Arc<Metrics>,
    deadline: tokio::time::Instant,
) {
    let credential = credentials[rand::random_range(0..credentials.len())].clone();
    tracing::info!(username = %credential.username, "authenticating virtual user");

    let mut session = Session::new(credential);
    if let Err(err) = remote.login(&mut session, &metrics).await {
        tracing::warn!("login failed: {err:#}");
    }

    loop {
        if deadline.elapsed() > Duration::ZERO {
            break;
        }

        let action = behavior.next_action();
        let result = match action {
            Action::Profile => remote.user_profile(&mut session, &metrics).await,
            Action::Orgs => remote.orgs_shared_with(&mut session, &metrics).await,
            Action::Projects => remote.projects(&mut session, &metrics).await,
            Action::PublishForm => remote.publish_form(&mut session, &metrics).await,
            Action::Submission => remote.post_submission(&mut session, &metrics).await,
        };
        if let Err(err) = result {
            tracing::warn!(action = action.name(), "action failed: {err:#}");
        }

        let wakeup = tokio::time::Instant::now() + behavior.think_time();
        tokio::time::sleep_until(wakeup.min(deadline)).await;
    }
}
