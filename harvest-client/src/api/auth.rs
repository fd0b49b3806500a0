use reqwest::Method;
use shared::models::{LoginRequest, SignupRequest, TokenResponse, User};

use crate::{ClientError, ClientResult, HttpClient};

// ========== Auth API ==========

impl HttpClient {
    /// Login with email and password, establishing the session
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: TokenResponse = self.post("/auth/login", &request).await?;
        self.session()
            .establish(response.access_token, response.user.clone())?;
        Ok(response.user)
    }

    /// Create an account, establishing the session
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<User> {
        let response: TokenResponse = self.post("/auth/signup", request).await?;
        self.session()
            .establish(response.access_token, response.user.clone())?;
        Ok(response.user)
    }

    /// Get current user information
    pub async fn me(&self) -> ClientResult<User> {
        self.get("/auth/me").await
    }

    /// Resume the session from the stored token
    ///
    /// Returns `None` when there is no stored token or it is no longer
    /// accepted; in both cases the session ends up cleared.
    pub async fn restore(&self) -> ClientResult<Option<User>> {
        let Some(token) = self.session().stored_token()? else {
            return Ok(None);
        };
        let request = self.request_with_token(Method::GET, "/auth/me", &token);
        match self.execute::<User>(request).await {
            Ok(user) => {
                self.session().establish(token, user.clone())?;
                Ok(Some(user))
            }
            Err(ClientError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Logout; the service keeps no server-side session
    pub fn logout(&self) {
        self.session().clear();
    }
}
