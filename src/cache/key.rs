//! Dashboard cache key grammar.
//!
//! ```text
//! key    = "dashboard_" user-id "_" ROLE [ page ] [ window ]
//! page   = "_" limit "_" offset
//! window = "_" rfc3339-start "_" rfc3339-end
//! ```
//!
//! Pattern invalidation is a plain substring match, so a bare
//! `"dashboard_user1"` would also hit `"dashboard_user10_USER"`.
//! [`CacheKey::user_prefix`] ends in the separator, which rules that out.
//! User ids are not escaped, so an id containing `_` can still collide:
//! the prefix of `"a"` also matches the keys of user `"a_b"`.

use std::fmt;

use crate::domain::{DateRange, UserRole};

/// Prefix shared by every dashboard cache key.
pub const KEY_PREFIX: &str = "dashboard_";

/// Builder for dashboard cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    user_id: String,
    role: UserRole,
    page: Option<(u32, u32)>,
    window: Option<DateRange>,
}

impl CacheKey {
    /// The standard key: `dashboard_{user_id}_{ROLE}`.
    pub fn dashboard(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            page: None,
            window: None,
        }
    }

    /// Appends the `_{limit}_{offset}` segment.
    #[must_use]
    pub const fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.page = Some((limit, offset));
        self
    }

    /// Appends the date window segment.
    #[must_use]
    pub const fn with_window(mut self, window: Option<DateRange>) -> Self {
        self.window = window;
        self
    }

    /// Substring that matches every key of `user_id`.
    ///
    /// Keys of another user whose id extends `user_id` past a `_` match as
    /// well, since ids are written into the key verbatim.
    #[must_use]
    pub fn user_prefix(user_id: &str) -> String {
        format!("{KEY_PREFIX}{user_id}_")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{KEY_PREFIX}{}_{}", self.user_id, self.role)?;
        if let Some((limit, offset)) = self.page {
            write!(f, "_{limit}_{offset}")?;
        }
        if let Some(w) = self.window {
            write!(f, "_{}_{}", w.start.to_rfc3339(), w.end.to_rfc3339())?;
        }
        Ok(())
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}
