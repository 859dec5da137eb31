//! Identity store: registration, credential checks and token issuance.

use std::sync::Arc;

use anyhow::Context;
use shelf_authz::{password, IssuedToken, SessionAuthenticator};
use shelf_db::{users, RecordId, Salutation, Store, User};
use shelf_kernel::DomainError;
use time::OffsetDateTime;

use super::models::{LoginRequest, LoginResponse, RegisterUser};
use crate::utils::{canonical_phone, is_valid_email, is_valid_phone, present};

const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=15;

#[derive(Clone)]
pub struct IdentityStore {
    store: Store,
    sessions: Arc<SessionAuthenticator>,
}

impl IdentityStore {
    pub fn new(store: Store, sessions: Arc<SessionAuthenticator>) -> Self {
        Self { store, sessions }
    }

    /// Register a new user. Email and phone must both be unused; phones are
    /// compared in their ten-digit form.
    pub async fn register(&self, input: RegisterUser) -> Result<User, DomainError> {
        let title = present(input.title);
        let name = present(input.name);
        let phone = present(input.phone);
        let email = present(input.email).map(|email| email.to_lowercase());
        let password = input.password.filter(|p| !p.is_empty());

        let missing: Vec<(&str, &str)> = [
            ("title", title.is_none()),
            ("name", name.is_none()),
            ("phone", phone.is_none()),
            ("email", email.is_none()),
            ("password", password.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| (field, "required"))
        .collect();

        let (Some(title), Some(name), Some(phone), Some(email), Some(password)) =
            (title, name, phone, email, password)
        else {
            return Err(DomainError::invalid_fields("All fields are mandatory.", &missing));
        };

        let title: Salutation = title.parse().map_err(|_| {
            DomainError::invalid_fields(
                "title must be one of Mr, Mrs, Miss.",
                &[("title", "invalid")],
            )
        })?;
        if !is_valid_phone(&phone) {
            return Err(DomainError::invalid_fields(
                "phone must be a 10 digit number, optionally prefixed with +91.",
                &[("phone", "invalid")],
            ));
        }
        let phone = canonical_phone(&phone);
        if !is_valid_email(&email) {
            return Err(DomainError::invalid_fields(
                "email is not a valid address.",
                &[("email", "invalid")],
            ));
        }
        if !PASSWORD_LENGTH.contains(&password.chars().count()) {
            return Err(DomainError::invalid_fields(
                "password must be 8 to 15 characters long.",
                &[("password", "length")],
            ));
        }

        if users::find_by_email(self.store.pool(), &email).await?.is_some() {
            return Err(DomainError::conflict("email", "User already exists."));
        }

        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .context("password hashing task failed")??;

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: RecordId::new(),
            title,
            name,
            phone,
            email,
            password_hash,
            address: input.address,
            created_at: now,
            updated_at: now,
        };

        users::insert(self.store.pool(), &user).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Resolve an email/password pair to its user.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = email.trim().to_lowercase();
        let user = users::find_by_email(self.store.pool(), &email).await?;

        let Some(user) = user else {
            tracing::info!("login rejected, unknown email");
            return Err(DomainError::auth("Invalid credentials."));
        };

        let attempt = password.to_string();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || password::verify_password(&attempt, &stored))
            .await
            .context("password verification task failed")?;

        if !verified {
            tracing::info!(user_id = %user.id, "login rejected, wrong password");
            return Err(DomainError::auth("Invalid credentials."));
        }

        Ok(user)
    }

    pub fn issue_token(&self, user_id: RecordId) -> Result<IssuedToken, DomainError> {
        self.sessions.issue(user_id)
    }

    pub async fn login(&self, input: LoginRequest) -> Result<LoginResponse, DomainError> {
        let email = present(input.email);
        let password = input.password.filter(|p| !p.is_empty());

        let (Some(email), Some(password)) = (email, password) else {
            return Err(DomainError::validation("Email and Password are required."));
        };

        let user = self.authenticate(&email, &password).await?;
        let issued = self.issue_token(user.id)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            token: issued.token,
            user_id: user.id,
            expires_at: issued.expires_at,
        })
    }
}
