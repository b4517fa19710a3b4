use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_against_dummy, verify_password_blocking},
};
use crate::{
    config::RootUserConfig,
    error::{AppError, AppResult},
    referral_code,
    store::{NewUser, StoreError, UniqueField, User, UserStore},
};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_CODE_ATTEMPTS: usize = 10;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_new_credentials(email: &str, password: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Inserts a user under a freshly generated referral code.
///
/// Each candidate is pre-checked against the store; a code that still
/// loses the race at insert time costs one attempt. An email conflict at
/// insert time means a concurrent registration won.
async fn insert_with_unique_code<G>(
    store: &dyn UserStore,
    email: &str,
    password_hash: &str,
    referred_by_id: Option<i64>,
    mut next_code: G,
) -> AppResult<User>
where
    G: FnMut() -> String + Send,
{
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = next_code();
        if store.referral_code_exists(&code).await? {
            debug!(attempt, "referral code taken, retrying");
            continue;
        }

        let new_user = NewUser {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            referral_code: code,
            referred_by_id,
        };
        match store.insert(new_user).await {
            Ok(user) => return Ok(user),
            Err(StoreError::Conflict(UniqueField::ReferralCode)) => {
                debug!(attempt, "referral code collided on insert, retrying");
            }
            Err(StoreError::Conflict(UniqueField::Email)) => return Err(AppError::DuplicateEmail),
            Err(e) => return Err(e.into()),
        }
    }

    warn!(attempts = MAX_CODE_ATTEMPTS, "could not find a free referral code");
    Err(AppError::CodeGenerationExhausted)
}

pub async fn register(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<AuthResponse> {
    register_with_codes(store, keys, req, referral_code::generate).await
}

#[instrument(skip_all)]
pub(crate) async fn register_with_codes<G>(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
    next_code: G,
) -> AppResult<AuthResponse>
where
    G: FnMut() -> String + Send,
{
    let (Some(email), Some(password), Some(code)) = (
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
        non_blank(req.referral_code),
    ) else {
        warn!("registration with missing fields");
        return Err(AppError::Validation(
            "Email, password, and referral code are required".into(),
        ));
    };

    let email = normalize_email(&email);
    let code = code.trim().to_string();
    if let Err(e) = validate_new_credentials(&email, &password) {
        warn!(%email, error = %e, "registration rejected");
        return Err(e);
    }

    let Some(referrer) = store.find_by_referral_code(&code).await? else {
        warn!(referral_code = %code, "unknown referral code");
        return Err(AppError::ReferralNotFound);
    };

    if store.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let hash = hash_password_blocking(password).await?;
    let user = insert_with_unique_code(store, &email, &hash, Some(referrer.id), next_code).await?;
    let token = keys.sign(user.id)?;

    info!(user_id = user.id, referrer_id = referrer.id, "user registered");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

#[instrument(skip_all)]
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<AuthResponse> {
    let (Some(email), Some(password)) = (
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    };

    let email = normalize_email(&email);
    let Some(user) = store.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        verify_against_dummy(password).await;
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

/// Creates the parentless root account if it does not exist yet.
pub async fn ensure_root_user(store: &dyn UserStore, root: &RootUserConfig) -> AppResult<User> {
    let email = normalize_email(&root.email);
    if let Some(existing) = store.find_by_email(&email).await? {
        debug!(user_id = existing.id, "root user already present");
        return Ok(existing);
    }
    validate_new_credentials(&email, &root.password)?;

    let mut preferred = match root.referral_code.as_deref().map(str::to_uppercase) {
        Some(code) if referral_code::is_valid(&code) => Some(code),
        Some(code) => {
            warn!(referral_code = %code, "ignoring malformed ROOT_REFERRAL_CODE");
            None
        }
        None => None,
    };

    let hash = hash_password_blocking(root.password.clone()).await?;
    let user = insert_with_unique_code(store, &email, &hash, None, move || {
        preferred.take().unwrap_or_else(referral_code::generate)
    })
    .await?;

    info!(user_id = user.id, referral_code = %user.referral_code, "root user created");
    Ok(user)
}
