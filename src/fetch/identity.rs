use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
const FIREFOX_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

/// One request-identity: a user agent plus any extra headers sent with it.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
}

impl IdentityProfile {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// All headers for a request carrying this identity, user agent included.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("user-agent".to_string(), self.user_agent.clone())];
        pairs.extend(self.headers.iter().cloned());
        pairs
    }
}

/// Read-mostly pool of identities shared across concurrent resolutions.
/// Rotation is best-effort round-robin through an atomic cursor.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    profiles: Arc<Vec<IdentityProfile>>,
    cursor: Arc<AtomicUsize>,
}

impl IdentityPool {
    pub fn new(profiles: Vec<IdentityProfile>) -> Self {
        let profiles = if profiles.is_empty() {
            vec![IdentityProfile::new(CHROME_UA)]
        } else {
            profiles
        };
        Self {
            profiles: Arc::new(profiles),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn next(&self) -> &IdentityProfile {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        &self.profiles[index % self.profiles.len()]
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new(vec![
            IdentityProfile::new(CHROME_UA).with_header("accept-language", "en-US,en;q=0.9"),
            IdentityProfile::new(SAFARI_UA).with_header("accept-language", "en-US,en;q=0.9"),
            IdentityProfile::new(FIREFOX_UA).with_header("accept-language", "en-US,en;q=0.5"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_round_robin() {
        let pool = IdentityPool::new(vec![
            IdentityProfile::new("ua-one"),
            IdentityProfile::new("ua-two"),
        ]);
        assert_eq!(pool.next().user_agent, "ua-one");
        assert_eq!(pool.next().user_agent, "ua-two");
        assert_eq!(pool.next().user_agent, "ua-one");
    }

    #[test]
    fn empty_pool_falls_back_to_a_default_identity() {
        let pool = IdentityPool::new(Vec::new());
        assert_eq!(pool.len(), 1);
        assert!(!pool.next().user_agent.is_empty());
    }

    #[test]
    fn header_pairs_lead_with_user_agent() {
        let profile = IdentityProfile::new("ua").with_header("accept-language", "en-US");
        let pairs = profile.header_pairs();
        assert_eq!(pairs[0], ("user-agent".to_string(), "ua".to_string()));
        assert_eq!(pairs.len(), 2);
    }
}
