/*
[INPUT]:  Signed login payloads and stored refresh tokens
[OUTPUT]: Token pairs issued by the auth endpoints
[POS]:    HTTP layer - auth endpoints
[UPDATE]: When auth endpoint paths or payloads change
*/

// ### Auth Endpoints

use reqwest::Method;
use tracing::info;

use crate::http::interceptor::{ACCESS_TOKEN_ENDPOINT, REFRESH_TOKEN_ENDPOINT, tokens_from_response};
use crate::http::{Result, SandwatchClient, SandwatchError};
use crate::types::{AccessTokenRequest, RefreshTokenRequest, TokenKey, TokenPair};

impl SandwatchClient {
    /// Exchange a signed login message for tokens
    ///
    /// POST /auth/access_token
    ///
    /// Runs through both token stages, so issued tokens are already stored
    /// when this returns.
    pub async fn request_access_token(&self, body: &AccessTokenRequest) -> Result<TokenPair> {
        let builder = self
            .request(Method::POST, ACCESS_TOKEN_ENDPOINT)?
            .json(body);
        let response = self.send(builder).await?;
        let pair = tokens_from_response(response)?;

        if pair.access.is_none() {
            return Err(SandwatchError::InvalidResponse(
                "access token response carried no token".to_string(),
            ));
        }
        info!(public_key = %body.public_key, "access token issued");
        Ok(pair)
    }

    /// Exchange the stored refresh token for a new pair
    ///
    /// POST /auth/refresh_token
    pub async fn refresh(&self) -> Result<TokenPair> {
        let refresh_token = self
            .store()
            .get(TokenKey::RefreshToken)
            .await?
            .ok_or_else(|| SandwatchError::RefreshFailed("no refresh token stored".to_string()))?;

        let body = RefreshTokenRequest { refresh_token };
        let builder = self
            .request(Method::POST, REFRESH_TOKEN_ENDPOINT)?
            .json(&body);

        let response = self
            .dispatch(builder)
            .await
            .map_err(|e| SandwatchError::RefreshFailed(e.to_string()))?;
        tokens_from_response(response).map_err(|e| SandwatchError::RefreshFailed(e.to_string()))
    }
}
