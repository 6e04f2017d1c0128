//! Mail id generation.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Number of random characters before the `@`.
pub const ID_RANDOM_LEN: usize = 64;

/// Produces the id sent as `Message-ID` and expected back from the server.
pub trait MailIdGenerator {
    /// Returns a new, globally unique id.
    fn generate(&self) -> String;
}

/// Random alphanumeric id qualified with a domain: `<64 chars>@<domain>`.
#[derive(Debug, Clone)]
pub struct RandomMailId {
    domain: String,
}

impl RandomMailId {
    /// Uses the `HOSTNAME` environment variable as domain, else `localhost`.
    #[must_use]
    pub fn new() -> Self {
        let domain = std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        Self::with_domain(domain)
    }

    /// Uses `domain` after the `@`.
    #[must_use]
    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Default for RandomMailId {
    fn default() -> Self {
        Self::new()
    }
}

impl MailIdGenerator for RandomMailId {
    fn generate(&self) -> String {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_RANDOM_LEN)
            .map(char::from)
            .collect();
        format!("{random}@{}", self.domain)
    }
}
