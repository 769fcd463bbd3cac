//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    FixtureIdentityProvider, SignInService, TemplateCommand, TemplateQuery, TokenService,
};
use crate::domain::{
    AuthenticationService, CapabilitySet, EmailAddress, IdentityClaim, OrganizationId, Role,
    TemplateVersionManager, UserId,
};
use crate::outbound::memory::{InMemoryTemplateRepository, InMemoryUserAccounts};
use crate::outbound::token::JwtTokenService;

use super::state::{HttpState, HttpStatePorts};

/// Signing secret shared by every HTTP test.
pub const TEST_SECRET: &[u8] = b"http-adapter-test-secret";

/// Clock frozen at a single instant.
pub struct FixtureClock(pub DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Instant every HTTP test runs at.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Codec using [`TEST_SECRET`] and a one-hour lifetime.
pub fn token_service() -> Arc<JwtTokenService> {
    Arc::new(JwtTokenService::new(Some(TEST_SECRET), Duration::minutes(60)))
}

/// Claim for a fresh user of `organization_id` holding `role` defaults.
pub fn claim_for(role: Role, organization_id: OrganizationId) -> IdentityClaim {
    IdentityClaim {
        user_id: UserId::random(),
        organization_id,
        email: EmailAddress::new("member@example.com").expect("valid email"),
        role,
        permissions: CapabilitySet::defaults_for(role),
    }
}

/// `Authorization` header value carrying a token for `claim`.
pub fn bearer(claim: &IdentityClaim) -> String {
    let signed = token_service()
        .issue(claim, fixed_now())
        .expect("issue test token");
    format!("Bearer {}", signed.token)
}

/// State over explicit template ports and a sign-in service.
pub fn state_with(
    templates: Arc<dyn TemplateCommand>,
    templates_query: Arc<dyn TemplateQuery>,
    sign_in: Arc<dyn SignInService>,
) -> HttpState {
    HttpState::new(HttpStatePorts {
        templates,
        templates_query,
        sign_in,
        tokens: token_service(),
        clock: Arc::new(FixtureClock(fixed_now())),
    })
}

/// State over a real template manager and an in-memory store.
pub fn in_memory_state() -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(FixtureClock(fixed_now()));
    let manager = Arc::new(TemplateVersionManager::new(
        Arc::new(InMemoryTemplateRepository::new()),
        clock.clone(),
    ));
    let sign_in = Arc::new(AuthenticationService::new(
        Arc::new(FixtureIdentityProvider),
        Arc::new(InMemoryUserAccounts::default()),
        token_service(),
        clock,
    ));
    state_with(manager.clone(), manager, sign_in)
}
