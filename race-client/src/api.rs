use std::time::Duration;

use race_utils::{
    Store,
    api::{
        CREATE_USER_PATH, CreateUserRequest, CreateUserResponse, ErrorResponse, PROGRESS_PATH,
        TOGGLE_UNIT_PATH, ToggleUnitRequest, ToggleUnitResponse, UPDATE_PLAYER_PATH,
        UpdatePlayerRequest, UpdatePlayerResponse,
    },
};
use serde::{Serialize, de::DeserializeOwned};

use crate::ClientError;

/// The four store operations as seen from a client.
pub trait ProgressApi: Send + Sync + 'static {
    fn fetch_progress(&self) -> impl Future<Output = Result<Store, ClientError>> + Send;

    fn create_user(
        &self,
        player: &str,
    ) -> impl Future<Output = Result<CreateUserResponse, ClientError>> + Send;

    fn toggle_unit(
        &self,
        request: ToggleUnitRequest,
    ) -> impl Future<Output = Result<ToggleUnitResponse, ClientError>> + Send;

    fn update_player(
        &self,
        request: UpdatePlayerRequest,
    ) -> impl Future<Output = Result<UpdatePlayerResponse, ClientError>> + Send;
}

pub struct HttpProgressApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProgressApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Res, ClientError> {
        let response = self.client.post(self.url(path)).json(request).send().await?;
        decode(response).await
    }
}

async fn decode<Res: DeserializeOwned>(response: reqwest::Response) -> Result<Res, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

impl ProgressApi for HttpProgressApi {
    async fn fetch_progress(&self) -> Result<Store, ClientError> {
        let response = self.client.get(self.url(PROGRESS_PATH)).send().await?;
        decode(response).await
    }

    async fn create_user(&self, player: &str) -> Result<CreateUserResponse, ClientError> {
        let request = CreateUserRequest {
            player: player.to_string(),
        };
        self.post(CREATE_USER_PATH, &request).await
    }

    async fn toggle_unit(
        &self,
        request: ToggleUnitRequest,
    ) -> Result<ToggleUnitResponse, ClientError> {
        self.post(TOGGLE_UNIT_PATH, &request).await
    }

    async fn update_player(
        &self,
        request: UpdatePlayerRequest,
    ) -> Result<UpdatePlayerResponse, ClientError> {
        self.post(UPDATE_PLAYER_PATH, &request).await
    }
}
