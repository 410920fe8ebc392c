//! REST gateway to the chat API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Channel, ChannelId, Message},
    error::ApiErrorBody,
    protocol::{AuthResponse, ChannelNameRequest, Credentials, NewMessageRequest},
};
use tracing::{debug, warn};

use crate::{error::GatewayError, session::Session};

const API_PREFIX: &str = "/api/v1";

#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, GatewayError>;
    async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, GatewayError>;
    async fn list_channels(&self, session: &Session) -> Result<Vec<Channel>, GatewayError>;
    async fn list_messages(&self, session: &Session) -> Result<Vec<Message>, GatewayError>;
    async fn create_channel(&self, session: &Session, name: &str)
        -> Result<Channel, GatewayError>;
    async fn rename_channel(
        &self,
        session: &Session,
        channel_id: &ChannelId,
        name: &str,
    ) -> Result<Channel, GatewayError>;
    async fn remove_channel(
        &self,
        session: &Session,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError>;
    async fn post_message(
        &self,
        session: &Session,
        request: &NewMessageRequest,
    ) -> Result<(), GatewayError>;
}

pub struct HttpGateway {
    http: Client,
    server_url: String,
}

impl HttpGateway {
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_client(http, server_url))
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.server_url)
    }

    fn authorized(builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.header(reqwest::header::AUTHORIZATION, session.authorization_header())
    }

    async fn send(builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder.send().await.map_err(GatewayError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = ApiErrorBody::parse(&raw).map(|body| body.summary());
        warn!(
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "gateway: request rejected"
        );
        Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, GatewayError> {
        Self::send(builder)
            .await?
            .json()
            .await
            .map_err(GatewayError::Decode)
    }
}

#[async_trait]
impl ChatGateway for HttpGateway {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, GatewayError> {
        debug!(username = %credentials.username, "gateway: login");
        Self::send_json(self.http.post(self.endpoint("/login")).json(credentials)).await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, GatewayError> {
        debug!(username = %credentials.username, "gateway: signup");
        Self::send_json(self.http.post(self.endpoint("/signup")).json(credentials)).await
    }

    async fn list_channels(&self, session: &Session) -> Result<Vec<Channel>, GatewayError> {
        let request = Self::authorized(self.http.get(self.endpoint("/channels")), session);
        Self::send_json(request).await
    }

    async fn list_messages(&self, session: &Session) -> Result<Vec<Message>, GatewayError> {
        let request = Self::authorized(self.http.get(self.endpoint("/messages")), session);
        Self::send_json(request).await
    }

    async fn create_channel(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Channel, GatewayError> {
        let request = Self::authorized(self.http.post(self.endpoint("/channels")), session).json(
            &ChannelNameRequest {
                name: name.to_string(),
            },
        );
        Self::send_json(request).await
    }

    async fn rename_channel(
        &self,
        session: &Session,
        channel_id: &ChannelId,
        name: &str,
    ) -> Result<Channel, GatewayError> {
        let request = Self::authorized(
            self.http
                .patch(self.endpoint(&format!("/channels/{channel_id}"))),
            session,
        )
        .json(&ChannelNameRequest {
            name: name.to_string(),
        });
        Self::send_json(request).await
    }

    async fn remove_channel(
        &self,
        session: &Session,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError> {
        let request = Self::authorized(
            self.http
                .delete(self.endpoint(&format!("/channels/{channel_id}"))),
            session,
        );
        Self::send(request).await?;
        Ok(())
    }

    async fn post_message(
        &self,
        session: &Session,
        request: &NewMessageRequest,
    ) -> Result<(), GatewayError> {
        let request =
            Self::authorized(self.http.post(self.endpoint("/messages")), session).json(request);
        Self::send(request).await?;
        Ok(())
    }
}
