//! Test helpers for integration tests
//!
//! Spawns the real gateway on an ephemeral port and drives it with
//! WebSocket and HTTP clients.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use estate_common::{AppConfig, JwtService};
use estate_core::{InboundEvent, OutboundEvent, PresenceEntry, RegistrationPolicy, UserId};
use estate_gateway::{create_app, create_gateway_state, server::serve};
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, client::IntoClientRequest, http::HeaderValue, Message},
    MaybeTlsStream, WebSocketStream,
};

/// Shared secret used to mint test tokens
pub const TEST_SECRET: &str = "integration-test-secret-key";

/// How long to wait for an expected event
pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// How long to listen when asserting that nothing arrives
pub const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Build a test configuration through the same path as `from_env`
pub fn test_config(policy: RegistrationPolicy, strict_identity: bool) -> Result<AppConfig> {
    let vars: HashMap<&str, String> = HashMap::from([
        ("APP_ENV", "development".to_string()),
        ("GATEWAY_PORT", "0".to_string()),
        ("JWT_SECRET", TEST_SECRET.to_string()),
        ("PRESENCE_REGISTRATION_POLICY", policy.as_str().to_string()),
        ("PRESENCE_STRICT_IDENTITY", strict_identity.to_string()),
    ]);

    AppConfig::from_lookup(|key| vars.get(key).cloned())
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Test gateway instance that manages lifecycle
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: Client,
    jwt: JwtService,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a gateway with the default policy and strict identity
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config(RegistrationPolicy::default(), true)?).await
    }

    /// Start a gateway with a custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let jwt = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = create_app(create_gateway_state(config));

        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            jwt,
            _handle: handle,
        })
    }

    /// Get base URL for HTTP requests
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket endpoint URL
    pub fn socket_url(&self) -> String {
        format!("ws://{}/socket", self.addr)
    }

    /// Mint a valid token for a user
    pub fn token_for(&self, user_id: &str) -> Result<String> {
        self.jwt
            .issue_token(&UserId::from(user_id))
            .map_err(|e| anyhow::anyhow!("Token error: {e}"))
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Fetch the registry snapshot over HTTP
    pub async fn presence(&self) -> Result<Vec<PresenceEntry>> {
        let response = self.get("/presence").await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Open a socket authenticated with the `Authorization` header
    pub async fn connect(&self, user_id: &str) -> Result<WsClient> {
        let token = self.token_for(user_id)?;
        self.connect_with_header(Some(&format!("Bearer {token}"))).await
    }

    /// Open a socket with an arbitrary (or no) `Authorization` header
    pub async fn connect_with_header(&self, authorization: Option<&str>) -> Result<WsClient> {
        let mut request = self.socket_url().into_client_request()?;
        if let Some(value) = authorization {
            request
                .headers_mut()
                .insert("Authorization", HeaderValue::from_str(value)?);
        }

        let (stream, _) = connect_async(request).await?;
        Ok(WsClient { stream })
    }

    /// Open a socket passing the token as a query parameter
    pub async fn connect_with_query(&self, token: &str) -> Result<WsClient> {
        let url = format!("{}?token={token}", self.socket_url());
        let (stream, _) = connect_async(url).await?;
        Ok(WsClient { stream })
    }

    /// Connect, announce, and wait for the snapshot that lists this user.
    ///
    /// Once the snapshot arrives the connection is known to the relay, so
    /// later broadcasts reach it.
    pub async fn join(&self, user_id: &str) -> Result<(WsClient, Vec<PresenceEntry>)> {
        let mut client = self.connect(user_id).await?;
        client.send(&crate::announce(user_id)).await?;

        let snapshot = client.recv_snapshot().await?;
        if !snapshot.iter().any(|e| e.user_id.as_str() == user_id) {
            bail!("snapshot after announce does not list {user_id}: {snapshot:?}");
        }
        Ok((client, snapshot))
    }
}

/// HTTP status of a refused WebSocket handshake, if that is what failed
pub fn handshake_status(err: &anyhow::Error) -> Option<u16> {
    match err.downcast_ref::<tungstenite::Error>() {
        Some(tungstenite::Error::Http(response)) => Some(response.status().as_u16()),
        _ => None,
    }
}

/// WebSocket test client speaking the gateway's JSON events
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send a typed inbound event
    pub async fn send(&mut self, event: &InboundEvent) -> Result<()> {
        self.send_raw(&event.to_json()?).await
    }

    /// Send an arbitrary text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a binary frame
    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.stream.send(Message::Binary(bytes)).await?;
        Ok(())
    }

    /// Receive the next event, failing after `RECV_TIMEOUT`
    pub async fn recv(&mut self) -> Result<OutboundEvent> {
        tokio::time::timeout(RECV_TIMEOUT, self.next_event())
            .await
            .context("timed out waiting for event")?
    }

    /// Receive the next event and require it to be a presence snapshot
    pub async fn recv_snapshot(&mut self) -> Result<Vec<PresenceEntry>> {
        match self.recv().await? {
            OutboundEvent::PresenceSnapshot(entries) => Ok(entries),
            other => bail!("expected presenceSnapshot, got {other:?}"),
        }
    }

    /// Assert that no event arrives within `SILENCE_WINDOW`
    pub async fn expect_silence(&mut self) -> Result<()> {
        match tokio::time::timeout(SILENCE_WINDOW, self.next_event()).await {
            Err(_) => Ok(()),
            Ok(Ok(event)) => bail!("expected no event, got {event:?}"),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Wait for the server to close the socket
    pub async fn expect_closed(&mut self) -> Result<()> {
        let closed = async {
            loop {
                match self.stream.next().await {
                    None | Some(Ok(Message::Close(_)) | Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
        };
        tokio::time::timeout(RECV_TIMEOUT, closed)
            .await
            .context("socket was not closed")
    }

    /// Close the socket with a close frame
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<OutboundEvent> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(OutboundEvent::from_json(&text)?),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(other)) => bail!("unexpected frame: {other:?}"),
                Some(Err(e)) => return Err(e.into()),
                None => bail!("connection closed"),
            }
        }
    }
}
