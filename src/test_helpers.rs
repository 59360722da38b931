//! Helpers for database-backed tests.
//!
//! Tests that need a server read its URL from `TEST_DATABASE_URL`. When the variable is unset
//! [`TestDatabase::from_env`] returns `None` and the test is expected to skip itself.

use crate::connection::{connect, ConnectionError};
use crate::executor::MayPostgresExecutor;
use std::env;

/// Environment variable holding the test server's connection string.
pub const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

/// A PostgreSQL server reserved for tests
pub struct TestDatabase {
    url: String,
}

impl TestDatabase {
    /// Read `TEST_DATABASE_URL`, or `None` if it is unset or blank.
    pub fn from_env() -> Option<Self> {
        env::var(TEST_DATABASE_URL)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self { url })
    }

    /// Like [`TestDatabase::from_env`] but treats a missing URL as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidConnectionString`] when `TEST_DATABASE_URL` is unset.
    pub fn new() -> Result<Self, ConnectionError> {
        Self::from_env().ok_or_else(|| {
            ConnectionError::InvalidConnectionString(format!("{} is not set", TEST_DATABASE_URL))
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the server can't be reached.
    pub fn executor(&self) -> Result<MayPostgresExecutor, ConnectionError> {
        connect(&self.url)
    }

    /// A table name unlikely to collide with concurrent test runs.
    pub fn unique_name(prefix: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        format!("{}_{}_{}", prefix, std::process::id(), nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_shape() {
        let name = TestDatabase::unique_name("sg_test");
        assert!(name.starts_with("sg_test_"));
        assert!(name.len() <= 63);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
