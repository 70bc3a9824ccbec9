//! The API action set: one HTTP interaction per action, session updates as a
//! side effect, and a timer plus counters reported for every call.
//!
//! Non-2xx responses are not errors here. Login and publish log the raw body
//! and leave the session untouched, so the dependent action simply re-attempts
//! the prerequisite on its next invocation. Transport failures propagate as
//! [`anyhow::Error`] to the runner.

use anyhow::Result;
use digest_auth::{AuthContext, HttpMethod};
use reqwest::{RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use uuid::Uuid;

use crate::credentials::Credential;
use crate::metrics::Metrics;
use crate::session::{Auth, Session};

/// Client for the target form API, shared by all virtual users.
#[derive(Debug)]
pub struct ApiRemote {
    remote: String,
    root_path: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    temp_token: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormResponse {
    id_string: Option<String>,
}

impl ApiRemote {
    /// Creates a client for the service at `remote` with the given API root.
    pub fn new(remote: &str, root_path: &str) -> Self {
        Self {
            remote: remote.trim_end_matches('/').to_owned(),
            root_path: root_path.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Path of an API endpoint under the configured root, `.json` suffixed.
    fn api_path(&self, endpoint: &str) -> String {
        format!("{}{endpoint}.json", self.root_path)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.remote)
    }

    /// Digest challenge-response round trip.
    ///
    /// Sends the request bare first; on a 401 carrying a digest challenge the
    /// request is rebuilt with the computed `Authorization` answer. Any other
    /// response is returned as-is.
    async fn send_digest<F>(
        &self,
        credential: &Credential,
        path: &str,
        method: HttpMethod<'_>,
        build: F,
    ) -> Result<Response>
    where
        F: Fn() -> Result<RequestBuilder>,
    {
        let response = build()?.send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(challenge) = response.headers().get(header::WWW_AUTHENTICATE) else {
            return Ok(response);
        };

        let mut prompt = digest_auth::parse(challenge.to_str()?)?;
        let context = AuthContext::new_with_method(
            credential.username.as_str(),
            credential.password.as_str(),
            path,
            Option::<&[u8]>::None,
            method,
        );
        let answer = prompt.respond(&context)?.to_header_string();

        Ok(build()?.header(header::AUTHORIZATION, answer).send().await?)
    }

    /// Sends a request with the session's current auth scheme attached.
    async fn send_session<F>(
        &self,
        session: &Session,
        path: &str,
        method: HttpMethod<'_>,
        build: F,
    ) -> Result<Response>
    where
        F: Fn() -> Result<RequestBuilder>,
    {
        match &session.auth {
            Auth::Digest => {
                self.send_digest(&session.credential, path, method, build)
                    .await
            }
            Auth::TempToken(token) => {
                let request =
                    build()?.header(header::AUTHORIZATION, format!("TempToken {token}"));
                Ok(request.send().await?)
            }
            Auth::None => Ok(build()?.send().await?),
        }
    }

    /// Bootstraps the session: a digest-authenticated `GET user.json`.
    ///
    /// On 200 the temp token and username move onto the session and the auth
    /// scheme switches to [`Auth::TempToken`]; if the service issued no token
    /// the session continues unauthenticated. Any other status is logged and
    /// leaves the session unpopulated.
    pub async fn login(&self, session: &mut Session, metrics: &Metrics) -> Result<()> {
        let path = self.api_path("user");
        {
            let _timer = metrics.timer("user");
            let response = self
                .send_session(session, &path, HttpMethod::GET, || {
                    Ok(self.client.get(self.url(&path)))
                })
                .await?;
            let status = response.status();
            metrics.incr(&format!("user_{}", status.as_u16()));
            if status == StatusCode::OK {
                let body: UserResponse = response.json().await?;
                session.username = body.username;
                session.temp_token = body.temp_token;
                session.auth = match &session.temp_token {
                    Some(token) => Auth::TempToken(token.clone()),
                    None => Auth::None,
                };
            } else {
                let body = response.text().await?;
                tracing::info!(%status, body = %body, "login request failed");
            }
        }
        metrics.incr("user_no_requests");
        metrics.incr("no_requests");
        Ok(())
    }

    /// Fetches the profile of the logged-in user, logging in first if the
    /// session has no username yet.
    pub async fn user_profile(&self, session: &mut Session, metrics: &Metrics) -> Result<()> {
        if session.username.is_none() {
            self.login(session, metrics).await?;
        }
        let Some(username) = session.username.clone() else {
            return Ok(());
        };

        let path = self.api_path(&format!("profiles/{username}"));
        {
            let _timer = metrics.timer("profiles");
            let response = self
                .send_session(session, &path, HttpMethod::GET, || {
                    Ok(self.client.get(self.url(&path)))
                })
                .await?;
            metrics.incr(&format!("profiles_{}", response.status().as_u16()));
        }
        metrics.incr("profiles_no_requests");
        metrics.incr("no_requests");
        Ok(())
    }

    /// Lists the orgs shared with the logged-in user.
    pub async fn orgs_shared_with(&self, session: &mut Session, metrics: &Metrics) -> Result<()> {
        if session.username.is_none() {
            self.login(session, metrics).await?;
        }
        let Some(username) = session.username.clone() else {
            return Ok(());
        };

        let path = self.api_path("orgs");
        {
            let _timer = metrics.timer("orgs");
            let response = self
                .send_session(session, &path, HttpMethod::GET, || {
                    Ok(self
                        .client
                        .get(self.url(&path))
                        .query(&[("shared_with", username.as_str())]))
                })
                .await?;
            metrics.incr(&format!("orgs_{}", response.status().as_u16()));
        }
        metrics.incr("orgs_no_requests");
        metrics.incr("no_requests");
        Ok(())
    }

    /// Lists projects.
    pub async fn projects(&self, session: &mut Session, metrics: &Metrics) -> Result<()> {
        let path = self.api_path("projects");
        {
            let _timer = metrics.timer("projects");
            let response = self
                .send_session(session, &path, HttpMethod::GET, || {
                    Ok(self.client.get(self.url(&path)))
                })
                .await?;
            metrics.incr(&format!("projects_{}", response.status().as_u16()));
        }
        metrics.incr("projects_no_requests");
        metrics.incr("no_requests");
        Ok(())
    }

    /// Publishes a fresh single-question form.
    ///
    /// The form identifier is embedded both as the title suffix and as the
    /// form id. On 201 the server-assigned `id_string` is stored on the
    /// session for later submissions; any other status is logged and leaves
    /// it unset, so the next submission re-attempts the publish.
    pub async fn publish_form(&self, session: &mut Session, metrics: &Metrics) -> Result<()> {
        let id_string = new_form_id();
        let text_xls_form = format!(
            "survey\r\n\
             ,type,name,label\r\n\
             ,text,fruit,Fruit\r\n\
             settings\r\n\
             form_title,form_id\r\n\
             ,Demo {id_string},{id_string}\r\n"
        );

        let path = self.api_path("forms");
        {
            let _timer = metrics.timer("forms");
            let response = self
                .send_session(session, &path, HttpMethod::POST, || {
                    Ok(self
                        .client
                        .post(self.url(&path))
                        .form(&[("text_xls_form", text_xls_form.as_str())]))
                })
                .await?;
            let status = response.status();
            metrics.incr(&format!("forms_{}", status.as_u16()));
            if status == StatusCode::CREATED {
                let body: FormResponse = response.json().await?;
                session.id_string = body.id_string;
            } else {
                let body = response.text().await?;
                tracing::info!(%status, body = %body, "form publish failed");
            }
        }
        metrics.incr("forms_no_requests");
        metrics.incr("no_requests");
        Ok(())
    }

    /// Submits one data record against the session's form, publishing a form
    /// first when none exists yet.
    ///
    /// The submission endpoint sits outside the API root and expects digest
    /// credentials rather than the temp token.
    pub async fn post_submission(&self, session: &mut Session, metrics: &Metrics) -> Result<()> {
        if session.id_string.is_none() {
            self.publish_form(session, metrics).await?;
        }
        let (Some(id_string), Some(username)) =
            (session.id_string.clone(), session.username.clone())
        else {
            return Ok(());
        };

        let instance_id = Uuid::new_v4();
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\
             <{id_string} id=\"{id_string}\">\
             <fruit>mango</fruit>\
             <meta><instanceID>{instance_id}</instanceID></meta>\
             </{id_string}>"
        );

        let path = format!("/{username}/submission");
        {
            let _timer = metrics.timer("submission");
            let response = self
                .send_digest(&session.credential, &path, HttpMethod::POST, || {
                    let part = reqwest::multipart::Part::text(document.clone())
                        .file_name("submission.xml")
                        .mime_str("text/xml")?;
                    let form = reqwest::multipart::Form::new().part("xml_submission_file", part);
                    Ok(self.client.post(self.url(&path)).multipart(form))
                })
                .await?;
            metrics.incr(&format!("submission_{}", response.status().as_u16()));
        }
        metrics.incr("submission_no_requests");
        metrics.incr("no_requests");
        Ok(())
    }
}

/// A practically unique form identifier: fixed prefix plus 8 random hex chars.
fn new_form_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("a{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_ids_are_prefixed_and_unique() {
        let first = new_form_id();
        let second = new_form_id();

        assert_eq!(first.len(), 9);
        assert!(first.starts_with('a'));
        assert!(first[1..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
