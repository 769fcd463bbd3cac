//! In-process adapters for single-node deployments and tests.
//!
//! Every operation takes one lock, so the compare-and-swap in
//! [`InMemoryTemplateRepository::publish_version`] observes and writes the
//! lineage atomically.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    TemplateRepository, TemplateRepositoryError, UserAccountRepository,
    UserAccountRepositoryError,
};
use crate::domain::{
    EmailAddress, LifecycleState, OrganizationScope, Template, TemplateId, UserAccount,
};

/// Template rows held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTemplateRepository {
    rows: Mutex<HashMap<TemplateId, Template>>,
}

impl InMemoryTemplateRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<TemplateId, Template>>, TemplateRepositoryError> {
        self.rows
            .lock()
            .map_err(|_| TemplateRepositoryError::query("template store lock poisoned"))
    }

    fn visible<'a>(
        rows: &'a HashMap<TemplateId, Template>,
        scope: &'a OrganizationScope,
    ) -> impl Iterator<Item = &'a Template> + 'a {
        rows.values()
            .filter(move |row| row.is_active() && scope.contains(*row))
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn insert(&self, template: &Template) -> Result<(), TemplateRepositoryError> {
        let mut rows = self.rows()?;
        if rows.contains_key(&template.id) {
            return Err(TemplateRepositoryError::query(format!(
                "template {} already exists",
                template.id
            )));
        }
        rows.insert(template.id, template.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OrganizationScope,
        id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let rows = self.rows()?;
        let found = rows.get(id).filter(|row| row.is_active()).cloned();
        Ok(scope.admit(found))
    }

    async fn find_source(
        &self,
        id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let rows = self.rows()?;
        Ok(rows.get(id).filter(|row| row.is_active()).cloned())
    }

    async fn find_version(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
        version: u32,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let rows = self.rows()?;
        Ok(Self::visible(&rows, scope)
            .find(|row| row.lineage_id == *lineage_id && row.version == version)
            .cloned())
    }

    async fn find_latest(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
    ) -> Result<Option<Template>, TemplateRepositoryError> {
        let rows = self.rows()?;
        Ok(Self::visible(&rows, scope)
            .find(|row| row.lineage_id == *lineage_id && row.is_latest_version)
            .cloned())
    }

    async fn list_lineage(
        &self,
        scope: &OrganizationScope,
        lineage_id: &TemplateId,
    ) -> Result<Vec<Template>, TemplateRepositoryError> {
        let rows = self.rows()?;
        let mut lineage: Vec<Template> = Self::visible(&rows, scope)
            .filter(|row| row.lineage_id == *lineage_id)
            .cloned()
            .collect();
        lineage.sort_by_key(|row| row.version);
        Ok(lineage)
    }

    async fn list_categories(
        &self,
        scope: &OrganizationScope,
    ) -> Result<Vec<String>, TemplateRepositoryError> {
        let rows = self.rows()?;
        let categories: BTreeSet<String> = Self::visible(&rows, scope)
            .filter_map(|row| row.category.clone())
            .filter(|category| !category.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn publish_version(
        &self,
        expected_latest: &Template,
        next: &Template,
    ) -> Result<(), TemplateRepositoryError> {
        let mut rows = self.rows()?;
        let conflict = || {
            TemplateRepositoryError::version_conflict(
                expected_latest.lineage_id.to_string(),
                expected_latest.version,
            )
        };

        let still_latest = rows.get(&expected_latest.id).is_some_and(|current| {
            current.is_active()
                && current.is_latest_version
                && current.version == expected_latest.version
                && current.lineage_id == next.lineage_id
        });
        let version_taken = rows
            .values()
            .any(|row| row.lineage_id == next.lineage_id && row.version == next.version);
        if !still_latest || version_taken {
            return Err(conflict());
        }

        if let Some(current) = rows.get_mut(&expected_latest.id) {
            current.is_latest_version = false;
            current.updated_at = next.created_at;
        }
        rows.insert(next.id, next.clone());
        Ok(())
    }

    async fn soft_delete(
        &self,
        scope: &OrganizationScope,
        id: &TemplateId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, TemplateRepositoryError> {
        let mut rows = self.rows()?;
        match rows.get_mut(id) {
            Some(row) if row.is_active() && scope.contains(&*row) => {
                row.state = LifecycleState::Deleted { deleted_at };
                row.updated_at = deleted_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// User accounts held in memory, keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryUserAccounts {
    accounts: Mutex<HashMap<EmailAddress, UserAccount>>,
}

impl InMemoryUserAccounts {
    /// Directory containing `accounts`.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        Self {
            accounts: Mutex::new(
                accounts
                    .into_iter()
                    .map(|account| (account.email.clone(), account))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl UserAccountRepository for InMemoryUserAccounts {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| UserAccountRepositoryError::query("account store lock poisoned"))?;
        Ok(accounts.get(email).cloned())
    }
}
