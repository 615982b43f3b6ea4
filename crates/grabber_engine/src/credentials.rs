use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use url::Url;

/// Session identity used for every remote call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub bearer_token: String,
    pub cookies: BTreeMap<String, String>,
    pub user_agent: String,
    pub target_site: Option<Url>,
}

impl Credentials {
    /// `Cookie` header value, or `None` when there are no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    pub fn has_token(&self) -> bool {
        !self.bearer_token.trim().is_empty()
    }
}

/// Shared holder of the current [`Credentials`].
///
/// Readers get an `Arc` to an immutable snapshot; the login flow swaps in a
/// whole new value. A reader therefore never sees a token from one login
/// paired with cookies from another.
#[derive(Debug, Default)]
pub struct CredentialStore {
    current: RwLock<Arc<Credentials>>,
}

impl CredentialStore {
    pub fn new(initial: Credentials) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn current(&self) -> Arc<Credentials> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, credentials: Credentials) {
        let next = Arc::new(credentials);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn clear(&self) {
        self.replace(Credentials::default());
    }
}
