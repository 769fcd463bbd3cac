//! PostgreSQL-backed [`UserAccountRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserAccountRepository, UserAccountRepositoryError};
use crate::domain::{EmailAddress, OrganizationId, PermissionOverride, UserAccount, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::UserAccountRow;
use super::pool::DbPool;
use super::schema::user_accounts;

/// Diesel implementation of [`UserAccountRepository`].
#[derive(Clone)]
pub struct DieselUserAccountRepository {
    pool: DbPool,
}

impl DieselUserAccountRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_account(row: UserAccountRow) -> Result<UserAccount, UserAccountRepositoryError> {
    let email = EmailAddress::new(&row.email).map_err(|err| {
        UserAccountRepositoryError::query(format!("stored email for {} is invalid: {err}", row.id))
    })?;
    let permission_override = row
        .permission_override
        .map(serde_json::from_value::<PermissionOverride>)
        .transpose()
        .map_err(|err| {
            UserAccountRepositoryError::query(format!(
                "stored permission override for {} is invalid: {err}",
                row.id
            ))
        })?;

    Ok(UserAccount {
        id: UserId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        email,
        role: row.role,
        permission_override,
    })
}

#[async_trait]
impl UserAccountRepository for DieselUserAccountRepository {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, UserAccountRepositoryError::connection))?;

        let row: Option<UserAccountRow> = user_accounts::table
            .filter(user_accounts::email.eq(email.as_str()))
            .select(UserAccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    UserAccountRepositoryError::query,
                    UserAccountRepositoryError::connection,
                )
            })?;

        row.map(row_to_account).transpose()
    }
}
