//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{
    ApiTokenMetadata, AuthServiceError, BearerToken, IssuedApiToken, NewApiToken, Principal,
    repository::PgAuthRepository,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
        }
    }

    /// Issue a new API token for the given principal.
    ///
    /// # Errors
    ///
    /// Returns an error if database insertion fails.
    pub async fn issue_api_token(
        &self,
        principal: Principal,
    ) -> Result<IssuedApiToken, AuthServiceError> {
        let token = BearerToken::generate(Uuid::now_v7());

        let metadata = self
            .repository
            .create_api_token(&NewApiToken {
                uuid: token.uuid(),
                principal,
                version: token.version(),
                token_hash: token.verifier(principal.uuid),
            })
            .await?;

        info!(token_uuid = %token.uuid(), role = %principal.role, "issued api token");

        Ok(IssuedApiToken {
            token: token.to_string(),
            metadata,
        })
    }

    /// List all tokens for the given principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_api_tokens(
        &self,
        principal_uuid: Uuid,
    ) -> Result<Vec<ApiTokenMetadata>, AuthServiceError> {
        Ok(self
            .repository
            .list_api_tokens_by_principal(principal_uuid)
            .await?)
    }

    /// Revoke a token by UUID. Returns `true` if the token was active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn revoke_api_token(&self, token_uuid: Uuid) -> Result<bool, AuthServiceError> {
        Ok(self
            .repository
            .revoke_api_token(token_uuid)
            .await?
            .is_some())
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError> {
        let presented: BearerToken = bearer_token.parse()?;

        let stored = self
            .repository
            .find_active_api_token_by_uuid(presented.uuid(), presented.version())
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        if !presented.matches(stored.principal.uuid, &stored.token_hash) {
            return Err(AuthServiceError::NotFound);
        }

        if let Err(source) = self
            .repository
            .touch_api_token_last_used(presented.uuid())
            .await
        {
            debug!("failed to record api token use: {source}");
        }

        Ok(stored.principal)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a raw bearer token to the principal that owns it.
    async fn authenticate_bearer(&self, bearer_token: &str)
    -> Result<Principal, AuthServiceError>;
}
