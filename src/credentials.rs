//! The credential store: (username, password) pairs loaded once at startup
//! and shared read-only between all virtual users.

use std::fs;
use std::io;
use std::path::Path;

/// A (username, password) pair from the credential file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credential {
    /// Account username.
    pub username: String,
    /// Account password, used for digest authentication.
    pub password: String,
}

/// Loads credentials from a comma-separated UTF-8 file.
///
/// A missing file is not an error and yields an empty list. Each row
/// contributes its first two fields; extra fields are ignored and rows with
/// fewer than two fields are skipped. The contents are test fixture data and
/// are not validated further.
pub fn load_credentials(path: &Path) -> io::Result<Vec<Credential>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)?;
    let mut credentials = Vec::new();
    for line in contents.lines() {
        let mut fields = line.split(',');
        let (Some(username), Some(password)) = (fields.next(), fields.next()) else {
            continue;
        };
        credentials.push(Credential {
            username: username.to_owned(),
            password: password.to_owned(),
        });
    }

    Ok(credentials)
}
