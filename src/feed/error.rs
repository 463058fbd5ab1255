use thiserror::Error;

/// Failure talking to a registry endpoint
///
/// `Network` and `Status` are transport failures, `Decode` means the
/// document could not be interpreted. `target` is either the feed path or
/// the package name.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("network error fetching {target}: {source}")]
    Network {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status fetching {target}: {status}")]
    Status {
        target: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode {target}: {message}")]
    Decode { target: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl RegistryError {
    pub fn decode(target: &str, message: impl Into<String>) -> Self {
        RegistryError::Decode {
            target: target.to_string(),
            message: message.into(),
        }
    }

    /// Network failures and error statuses, as opposed to documents that
    /// arrived but could not be read
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RegistryError::Network { .. } | RegistryError::Status { .. }
        )
    }
}

/// Error reported by a poll call
#[derive(Debug, Error)]
pub enum PollError {
    /// The activity feed could not be fetched; nothing else was attempted
    #[error("failed to fetch activity feed: {0}")]
    Feed(#[source] RegistryError),

    #[error("failed to poll package {name}: {source}")]
    PackagePoll {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("package {name} is currently unpublished")]
    Unpublished { name: String },

    #[error("no packages were successfully polled")]
    NoPackagesPolled,
}

impl PollError {
    /// Name of the package this error concerns, if any
    pub fn package(&self) -> Option<&str> {
        match self {
            PollError::PackagePoll { name, .. } | PollError::Unpublished { name } => Some(name),
            PollError::Feed(_) | PollError::NoPackagesPolled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_poll_error_message_contains_name_and_status() {
        let err = PollError::PackagePoll {
            name: "left-pad".to_string(),
            source: RegistryError::Status {
                target: "left-pad".to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            },
        };

        let message = err.to_string();
        assert!(message.contains("left-pad"));
        assert!(message.contains("404"));
        assert_eq!(err.package(), Some("left-pad"));
    }

    #[test]
    fn terminal_errors_carry_no_package() {
        assert_eq!(PollError::NoPackagesPolled.package(), None);
        assert_eq!(
            PollError::Feed(RegistryError::decode("/-/rss", "bad")).package(),
            None
        );
    }

    #[test]
    fn unpublished_error_mentions_package() {
        let err = PollError::Unpublished {
            name: "qux".to_string(),
        };
        assert!(err.to_string().contains("qux"));
        assert_eq!(err.package(), Some("qux"));
    }

    #[test]
    fn decode_is_not_transport() {
        let err = RegistryError::decode("foo", "missing 'time'");
        assert!(!err.is_transport());

        let err = RegistryError::Status {
            target: "foo".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert!(err.is_transport());

        let err = RegistryError::Client(
            reqwest::Client::builder()
                .user_agent("bad\nagent")
                .build()
                .unwrap_err(),
        );
        assert!(!err.is_transport());
    }
}
