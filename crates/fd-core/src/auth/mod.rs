//! Auth key namespace and limbo detection
//!
//! Everything the client writes to local storage for authentication lives
//! under the namespace declared here: a fixed list of exact keys plus a set
//! of owned prefixes. Cleanup and limbo detection only ever look at keys in
//! this namespace; a key outside it is never treated as auth state.

use serde::{Deserialize, Serialize};

/// Flag set by the demo / mock login flow.
pub const MOCK_SESSION_KEY: &str = "mock_session";
/// Role cached alongside a session (`admin`, `contador`, `cliente`).
pub const USER_ROLE_KEY: &str = "user_role";

/// Exact keys owned by the auth module.
pub const AUTH_KEYS: &[&str] = &[
    MOCK_SESSION_KEY,
    USER_ROLE_KEY,
    "supabase.auth.token",
    "fiscaldesk.auth.session",
    "fiscaldesk.auth.user",
];

/// Key prefixes owned by the auth module.
pub const AUTH_KEY_PREFIXES: &[&str] = &["sb-", "supabase.auth.", "fiscaldesk.auth."];

const ACCESS_TOKEN_SUFFIXES: &[&str] = &["access-token", "access_token"];
const REFRESH_TOKEN_SUFFIXES: &[&str] = &["refresh-token", "refresh_token"];

/// Whether `key` belongs to the auth namespace.
pub fn is_auth_key(key: &str) -> bool {
    AUTH_KEYS.contains(&key) || AUTH_KEY_PREFIXES.iter().any(|p| key.starts_with(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Classify a namespaced key as an access or refresh token key.
pub fn token_kind(key: &str) -> Option<TokenKind> {
    if !is_auth_key(key) {
        return None;
    }
    if ACCESS_TOKEN_SUFFIXES.iter().any(|s| key.ends_with(s)) {
        Some(TokenKind::Access)
    } else if REFRESH_TOKEN_SUFFIXES.iter().any(|s| key.ends_with(s)) {
        Some(TokenKind::Refresh)
    } else {
        None
    }
}

/// Why stored auth state is inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimboReason {
    /// Exactly one of the mock-session flag and the user-role flag is set.
    MockSessionRoleMismatch,
    AccessTokenWithoutRefresh,
    RefreshTokenWithoutAccess,
}

impl std::fmt::Display for LimboReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            LimboReason::MockSessionRoleMismatch => "mock session and user role disagree",
            LimboReason::AccessTokenWithoutRefresh => "access token without refresh token",
            LimboReason::RefreshTokenWithoutAccess => "refresh token without access token",
        };
        f.write_str(text)
    }
}

/// Inspect the keys of one storage area for inconsistent auth state.
pub fn detect_limbo<'a, I>(keys: I) -> Option<LimboReason>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut has_mock_session = false;
    let mut has_user_role = false;
    let mut has_access = false;
    let mut has_refresh = false;

    for key in keys {
        match key {
            MOCK_SESSION_KEY => has_mock_session = true,
            USER_ROLE_KEY => has_user_role = true,
            _ => match token_kind(key) {
                Some(TokenKind::Access) => has_access = true,
                Some(TokenKind::Refresh) => has_refresh = true,
                None => {}
            },
        }
    }

    if has_mock_session != has_user_role {
        Some(LimboReason::MockSessionRoleMismatch)
    } else if has_access && !has_refresh {
        Some(LimboReason::AccessTokenWithoutRefresh)
    } else if has_refresh && !has_access {
        Some(LimboReason::RefreshTokenWithoutAccess)
    } else {
        None
    }
}
