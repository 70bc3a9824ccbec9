//! Per-virtual-user session state.

use crate::credentials::Credential;

/// Authentication scheme currently attached to a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Auth {
    /// HTTP digest with the session credential. Used for the login bootstrap
    /// and for data submissions.
    Digest,
    /// `Authorization: TempToken <token>` on every request, acquired through
    /// a successful login.
    TempToken(String),
    /// No authentication; requests go out bare.
    None,
}

/// Mutable state of one virtual user.
///
/// Created once when the virtual user starts and dropped when it terminates;
/// only login and publish actions mutate it. The `Option` fields implement
/// the lazy-initialization policy: dependent actions check them and perform
/// the prerequisite action when they are unset.
#[derive(Clone, Debug)]
pub struct Session {
    /// The credential this virtual user was assigned at start.
    pub credential: Credential,
    /// The scheme applied to outgoing requests. Starts as [`Auth::Digest`]
    /// and switches to [`Auth::TempToken`] after a successful login.
    pub auth: Auth,
    /// Username reported by the service, set by a successful login.
    pub username: Option<String>,
    /// Temporary token obtained at login, if the service issued one.
    pub temp_token: Option<String>,
    /// Identifier of the last form this user published, required to submit
    /// data against it.
    pub id_string: Option<String>,
}

impl Session {
    /// Creates a fresh session authenticating with the given credential.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            auth: Auth::Digest,
            username: None,
            temp_token: None,
            id_string: None,
        }
    }
}
