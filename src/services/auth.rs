use uuid::Uuid;

use crate::crypto::password::{hash_password, verify_password};
use crate::error::{AppError, Result};
use crate::models::session::SessionPayload;
use crate::models::user::{AuthUser, NewUser, Role, User};
use crate::repositories::user::UserStore;

const WRONG_CREDENTIALS: &str = "Wrong credentials";

/// Trims and lowercases an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a new user with the default role.
///
/// # Returns
///
/// The created `User`, or [`AppError::Conflict`] if the email is taken.
pub async fn register_user(
    users: &dyn UserStore,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<User> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Registering user: {}", email);

    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(password)?;

    let user = users
        .create(NewUser {
            full_name: full_name.trim().to_string(),
            email,
            password_hash,
            role: Role::default(),
        })
        .await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(user)
}

/// Verifies login credentials.
///
/// An unknown email and a wrong password produce the same error.
pub async fn authenticate_user(users: &dyn UserStore, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Authentication(WRONG_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::Authentication(WRONG_CREDENTIALS.to_string()));
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}

/// Loads display data for the principal of a verified session.
///
/// Store failures are logged and reported as `None`, like a missing user.
pub async fn current_user(users: &dyn UserStore, session: &SessionPayload) -> Option<AuthUser> {
    let id = match Uuid::parse_str(&session.user_id) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Session user id is not a UUID: {}", session.user_id);
            return None;
        }
    };

    match users.find_by_id(&id).await {
        Ok(Some(user)) => Some(AuthUser::from(&user)),
        Ok(None) => {
            tracing::warn!("Session refers to unknown user: {}", id);
            None
        }
        Err(e) => {
            tracing::error!("❌ Failed to fetch user {}: {}", id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryUserStore;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn register_normalizes_and_hashes() {
        let store = MemoryUserStore::new();
        let user = register_user(&store, "  Mary Jackson ", " Mary@Example.COM ", "hunter2hunter2")
            .await
            .unwrap();

        assert_eq!(user.email, "mary@example.com");
        assert_eq!(user.full_name, "Mary Jackson");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password, "hunter2hunter2");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = MemoryUserStore::new();
        register_user(&store, "Mary", "mary@example.com", "hunter2hunter2").await.unwrap();
        let err = register_user(&store, "Mary", "MARY@example.com", "another-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let store = MemoryUserStore::new();
        let created = register_user(&store, "Mary", "mary@example.com", "hunter2hunter2")
            .await
            .unwrap();

        let user = authenticate_user(&store, "MARY@example.com", "hunter2hunter2").await.unwrap();
        assert_eq!(user.id, created.id);

        let wrong_password = authenticate_user(&store, "mary@example.com", "nope-nope").await;
        let unknown_email = authenticate_user(&store, "who@example.com", "hunter2hunter2").await;
        match (wrong_password, unknown_email) {
            (Err(AppError::Authentication(a)), Err(AppError::Authentication(b))) => assert_eq!(a, b),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn current_user_resolves_session() {
        let store = MemoryUserStore::new();
        let created = register_user(&store, "Mary", "mary@example.com", "hunter2hunter2")
            .await
            .unwrap();
        let session = SessionPayload::for_user(&created, Utc::now() + Duration::days(1));

        let user = current_user(&store, &session).await.unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(user.full_name, "Mary");
        assert_eq!(user.image_url, None);

        let mut stranger = session.clone();
        stranger.user_id = Uuid::new_v4().to_string();
        assert!(current_user(&store, &stranger).await.is_none());

        stranger.user_id = "not-a-uuid".to_string();
        assert!(current_user(&store, &stranger).await.is_none());
    }
}
