//! Port for reading user accounts during sign-in.

use async_trait::async_trait;

use crate::domain::{EmailAddress, UserAccount};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user account repository adapters.
    pub enum UserAccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            ServiceUnavailable("user account repository connection failed: {message}"),
        /// Query failed during execution, or a stored row could not be read.
        Query { message: String } =>
            InternalError("user account repository query failed: {message}"),
    }
}

/// Lookup of stored accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccountRepository: Send + Sync {
    /// Account registered under `email`, if any.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError>;
}

