//! Core business logic for the authentication system.
//!
//! Every operation ends in the same token issuance step: a fresh random
//! refresh token replaces whatever the account held, and a signed access
//! token is minted for the account id.

use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::{Account, AccountKind, CreateAccount};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::account_repository::{AccountRepository, is_unique_violation};
use crate::utils::generate_random_string::{REFRESH_TOKEN_LENGTH, generate_random_string};
use crate::utils::jwt::JwtUtils;
use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::Validate;

/// Authentication service for login, registration and token rotation
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    jwt_utils: &'a JwtUtils,
    config: &'a Config,
}

impl<'a> AuthService<'a> {
    pub fn new(pool: &'a SqlitePool, jwt_utils: &'a JwtUtils, config: &'a Config) -> Self {
        AuthService {
            pool,
            jwt_utils,
            config,
        }
    }

    /// Checks a login/password pair and issues a new token pair.
    ///
    /// # Errors
    /// `ServiceError::Unauthorized` for an unknown login or a wrong password;
    /// no token is issued in either case
    pub async fn authenticate(
        &self,
        kind: AccountKind,
        request: CredentialsRequest,
    ) -> ServiceResult<TokenResponse> {
        request
            .validate()
            .map_err(ServiceError::from_validation_errors)?;

        let account_repo = AccountRepository::new(self.pool);
        let account = match account_repo.get_account_by_login(kind, &request.login).await? {
            Some(account) => account,
            None => {
                warn!("Login attempt for unknown {} '{}'", kind, request.login);
                return Err(ServiceError::unauthorized("Invalid login or password"));
            }
        };

        if !Self::verify_password(&request.password, &account.password_hash)? {
            warn!("Wrong password for {} '{}'", kind, request.login);
            return Err(ServiceError::unauthorized("Invalid login or password"));
        }

        self.issue_tokens(&account).await
    }

    /// Creates an account and issues its first token pair.
    ///
    /// # Errors
    /// `ServiceError::AlreadyExists` if the login is taken within `kind`
    pub async fn register(
        &self,
        kind: AccountKind,
        request: CredentialsRequest,
    ) -> ServiceResult<TokenResponse> {
        request
            .validate()
            .map_err(ServiceError::from_validation_errors)?;

        let account_repo = AccountRepository::new(self.pool);
        if account_repo.login_exists(kind, &request.login).await? {
            return Err(ServiceError::already_exists("Account", &request.login));
        }

        let password_hash = self.hash_password(&request.password)?;
        let refresh_token = generate_random_string(REFRESH_TOKEN_LENGTH);

        let account = account_repo
            .create_account(CreateAccount {
                id: uuid::Uuid::now_v7().to_string(),
                kind,
                login: request.login.clone(),
                password_hash,
                refresh_token: refresh_token.clone(),
                refresh_token_expires_at: self.refresh_expiry(),
            })
            .await
            .map_err(|e| {
                // Lost a race with a concurrent registration of the same login.
                if is_unique_violation(&e) {
                    ServiceError::already_exists("Account", &request.login)
                } else {
                    ServiceError::from(e)
                }
            })?;

        info!("Registered {} '{}' as {}", kind, account.login, account.id);
        self.token_response(&account, refresh_token)
    }

    /// Replaces the password after checking the current one.
    ///
    /// # Errors
    /// - `ServiceError::NotFound` if the login is unknown
    /// - `ServiceError::Unauthorized` if the current password does not match
    pub async fn change_password(
        &self,
        kind: AccountKind,
        request: ChangePasswordRequest,
    ) -> ServiceResult<TokenResponse> {
        request
            .validate()
            .map_err(ServiceError::from_validation_errors)?;

        let account_repo = AccountRepository::new(self.pool);
        let account = account_repo
            .get_account_by_login(kind, &request.login)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account", &request.login))?;

        if !Self::verify_password(&request.password, &account.password_hash)? {
            warn!("Password change refused for {} '{}'", kind, request.login);
            return Err(ServiceError::unauthorized("Invalid login or password"));
        }

        let password_hash = self.hash_password(&request.new_password)?;
        let refresh_token = generate_random_string(REFRESH_TOKEN_LENGTH);
        account_repo
            .update_password(&account.id, &password_hash, &refresh_token, self.refresh_expiry())
            .await?;

        info!("Password changed for {} '{}'", kind, account.login);
        self.token_response(&account, refresh_token)
    }

    /// Trades a refresh token for a new token pair. Each refresh token works once.
    ///
    /// # Errors
    /// - `ServiceError::NotFound` if no account holds the token, including a
    ///   token that was already consumed
    /// - `ServiceError::Expired` if the token is past its expiry
    pub async fn refresh(
        &self,
        kind: AccountKind,
        request: RefreshTokenRequest,
    ) -> ServiceResult<TokenResponse> {
        request
            .validate()
            .map_err(ServiceError::from_validation_errors)?;

        let account_repo = AccountRepository::new(self.pool);
        let account = match account_repo
            .get_account_by_refresh_token(kind, &request.refresh_token)
            .await?
        {
            Some(account) => account,
            None => {
                warn!("Unknown {} refresh token presented", kind);
                return Err(ServiceError::not_found("Refresh token", "presented token"));
            }
        };

        let still_valid = account
            .refresh_token_expires_at
            .is_some_and(|expires_at| expires_at > Utc::now());
        if !still_valid {
            warn!("Expired refresh token presented for {}", account.id);
            return Err(ServiceError::expired("Refresh token"));
        }

        let new_token = generate_random_string(REFRESH_TOKEN_LENGTH);
        let rotated = account_repo
            .rotate_refresh_token(
                &account.id,
                &request.refresh_token,
                &new_token,
                self.refresh_expiry(),
            )
            .await?;
        if !rotated {
            // A concurrent refresh consumed the token between lookup and swap.
            return Err(ServiceError::not_found("Refresh token", "presented token"));
        }

        self.token_response(&account, new_token)
    }

    async fn issue_tokens(&self, account: &Account) -> ServiceResult<TokenResponse> {
        let refresh_token = generate_random_string(REFRESH_TOKEN_LENGTH);
        AccountRepository::new(self.pool)
            .set_refresh_token(&account.id, &refresh_token, self.refresh_expiry())
            .await?;

        self.token_response(account, refresh_token)
    }

    fn token_response(&self, account: &Account, refresh_token: String) -> ServiceResult<TokenResponse> {
        let access_token = self.jwt_utils.generate_token(&account.id, account.kind)?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_utils.expires_in(),
        })
    }

    fn refresh_expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.config.refresh_token_ttl_seconds as i64)
    }

    fn hash_password(&self, password: &str) -> ServiceResult<String> {
        hash(password, self.config.bcrypt_cost)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
        verify(password, hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    struct Harness {
        db: Database,
        jwt: JwtUtils,
        config: Config,
    }

    impl Harness {
        async fn new() -> Self {
            let config = Config::for_tests();
            Self {
                db: Database::in_memory().await.unwrap(),
                jwt: JwtUtils::new(&config),
                config,
            }
        }

        fn auth(&self) -> AuthService<'_> {
            AuthService::new(self.db.pool(), &self.jwt, &self.config)
        }
    }

    fn credentials(login: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    fn refresh_request(token: &str) -> RefreshTokenRequest {
        RefreshTokenRequest {
            refresh_token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login_scenario() {
        let h = Harness::new().await;
        let auth = h.auth();

        let tokens = auth
            .register(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();
        assert!(!tokens.access_token.is_empty());
        assert_eq!(tokens.refresh_token.len(), REFRESH_TOKEN_LENGTH);

        let err = auth
            .register(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let login = auth
            .authenticate(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();
        let claims = h.jwt.validate_token(&login.access_token).unwrap();
        assert_eq!(claims.kind, AccountKind::User);

        let err = auth
            .authenticate(AccountKind::User, credentials("abc", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_login_replaces_previous_refresh_token() {
        let h = Harness::new().await;
        let auth = h.auth();

        let first = auth
            .register(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();
        auth.authenticate(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();

        let err = auth
            .refresh(AccountKind::User, refresh_request(&first.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_login_is_unauthorized() {
        let h = Harness::new().await;
        let err = h
            .auth()
            .authenticate(AccountKind::User, credentials("ghost", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_empty_credentials_are_rejected() {
        let h = Harness::new().await;
        let err = h
            .auth()
            .register(AccountKind::User, credentials("", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_refresh_is_single_use() {
        let h = Harness::new().await;
        let auth = h.auth();
        let tokens = auth
            .register(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();

        let rotated = auth
            .refresh(AccountKind::User, refresh_request(&tokens.refresh_token))
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);

        let err = auth
            .refresh(AccountKind::User, refresh_request(&tokens.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        auth.refresh(AccountKind::User, refresh_request(&rotated.refresh_token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let h = Harness::new().await;
        let auth = h.auth();
        let tokens = auth
            .register(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();

        sqlx::query("UPDATE accounts SET refresh_token_expires_at = ?")
            .bind(Utc::now() - Duration::hours(1))
            .execute(h.db.pool())
            .await
            .unwrap();

        let err = auth
            .refresh(AccountKind::User, refresh_request(&tokens.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = Harness::new().await;
        let auth = h.auth();
        auth.register(AccountKind::User, credentials("abc", "abc"))
            .await
            .unwrap();

        let change = |login: &str, password: &str| ChangePasswordRequest {
            login: login.to_string(),
            password: password.to_string(),
            new_password: "new-secret".to_string(),
        };

        let err = auth
            .change_password(AccountKind::User, change("nobody", "abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = auth
            .change_password(AccountKind::User, change("abc", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));

        auth.change_password(AccountKind::User, change("abc", "abc"))
            .await
            .unwrap();

        assert!(
            auth.authenticate(AccountKind::User, credentials("abc", "abc"))
                .await
                .is_err()
        );
        auth.authenticate(AccountKind::User, credentials("abc", "new-secret"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_staff_and_user_namespaces_are_separate() {
        let h = Harness::new().await;
        let auth = h.auth();

        auth.register(AccountKind::User, credentials("abc", "user-pw"))
            .await
            .unwrap();
        let staff = auth
            .register(AccountKind::Staff, credentials("abc", "staff-pw"))
            .await
            .unwrap();

        let claims = h.jwt.validate_token(&staff.access_token).unwrap();
        assert!(claims.is_staff());

        assert!(
            auth.authenticate(AccountKind::Staff, credentials("abc", "user-pw"))
                .await
                .is_err()
        );

        // A staff refresh token means nothing on the user side.
        let err = auth
            .refresh(AccountKind::User, refresh_request(&staff.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
