use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::HuddleError;

/// Token and key returned by the auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    #[serde(default)]
    pub user_id: String,
    pub token: String,
    pub api_key: String,
}

/// Remote collaborator that issues credentials for a user.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn auth_data(&self, environment: &str, user_id: &str) -> Result<AuthData, HuddleError>;
}

/// HTTP implementation of [`AuthApi`].
pub struct AuthService {
    http: reqwest::Client,
    auth_url: String,
}

impl AuthService {
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: auth_url.into(),
        }
    }

    fn request_url(&self, environment: &str, user_id: &str) -> String {
        format!(
            "{}?environment={}&user_id={}",
            self.auth_url.trim_end_matches('?'),
            urlencoding::encode(environment),
            urlencoding::encode(user_id),
        )
    }
}

#[async_trait]
impl AuthApi for AuthService {
    async fn auth_data(&self, environment: &str, user_id: &str) -> Result<AuthData, HuddleError> {
        let url = self.request_url(environment, user_id);
        tracing::info!("requesting token for {user_id} ({environment})");

        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(HuddleError::Auth(format!(
                "auth endpoint returned status {}",
                resp.status()
            )));
        }

        let mut data: AuthData = resp
            .json()
            .await
            .map_err(|e| HuddleError::Auth(format!("invalid auth response: {e}")))?;
        if data.user_id.is_empty() {
            data.user_id = user_id.to_string();
        }
        Ok(data)
    }
}
