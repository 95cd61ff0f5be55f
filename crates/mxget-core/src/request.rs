//! Request description for one `get` call.

use std::fmt;

use crate::error::GetError;

/// Default max size of one part (5 MiB). Larger frames should not be streamed into RAM.
pub const DEFAULT_MAX_PART_BYTES: usize = 5 * 1024 * 1024;

/// Username/password for HTTP digest authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What to fetch and how. Immutable for the duration of a call.
#[derive(Debug, Clone)]
pub struct Request {
    pub uri: String,
    pub credentials: Option<Credentials>,
    /// Raw outgoing header lines, e.g. `"Accept: image/jpeg"`.
    pub custom_headers: Vec<String>,
    /// Upper bound on buffered bytes for one part (or the whole single-shot body).
    pub max_part_bytes: usize,
}

impl Request {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            credentials: None,
            custom_headers: Vec::new(),
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
        }
    }

    /// Sets credentials. Empty user or password means no authentication.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        let creds = Credentials::new(user, password);
        self.credentials = if creds.user.is_empty() || creds.password.is_empty() {
            None
        } else {
            Some(creds)
        };
        self
    }

    pub fn with_header(mut self, line: impl Into<String>) -> Self {
        self.custom_headers.push(line.into());
        self
    }

    pub fn with_max_part_bytes(mut self, max: usize) -> Self {
        self.max_part_bytes = max;
        self
    }

    /// Checks the URI is an absolute http(s) URL and the part limit is usable.
    pub fn validate(&self) -> Result<(), GetError> {
        let parsed = url::Url::parse(&self.uri)
            .map_err(|e| GetError::InvalidRequest(format!("bad URI {:?}: {}", self.uri, e)))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(GetError::InvalidRequest(format!(
                    "unsupported scheme {:?} (only http and https)",
                    other
                )))
            }
        }
        if self.max_part_bytes == 0 {
            return Err(GetError::InvalidRequest("max_part_bytes must be > 0".into()));
        }
        if let Some(bad) = self.custom_headers.iter().find(|h| h.contains(['\r', '\n'])) {
            return Err(GetError::InvalidRequest(format!(
                "header line contains a line break: {:?}",
                bad
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let req = Request::new("http://10.0.0.22/stream");
        assert_eq!(req.max_part_bytes, DEFAULT_MAX_PART_BYTES);
        assert!(req.credentials.is_none());
        assert!(req.custom_headers.is_empty());
        req.validate().unwrap();
    }

    #[test]
    fn empty_credentials_mean_no_auth() {
        let req = Request::new("http://cam/").with_credentials("admin", "");
        assert!(req.credentials.is_none());
        let req = Request::new("http://cam/").with_credentials("admin", "secret");
        assert_eq!(req.credentials.as_ref().unwrap().user, "admin");
    }

    #[test]
    fn debug_hides_password() {
        let req = Request::new("http://cam/").with_credentials("admin", "hunter2");
        let s = format!("{:?}", req);
        assert!(s.contains("admin"));
        assert!(!s.contains("hunter2"));
    }

    #[test]
    fn validate_rejects_bad_input() {
        assert!(Request::new("not a url").validate().is_err());
        assert!(Request::new("ftp://host/file").validate().is_err());
        assert!(Request::new("http://host/").with_max_part_bytes(0).validate().is_err());
        assert!(Request::new("http://host/")
            .with_header("X-A: 1\r\nX-B: 2")
            .validate()
            .is_err());
        Request::new("https://host/a.jpg")
            .with_header("Accept: image/jpeg")
            .validate()
            .unwrap();
    }
}
