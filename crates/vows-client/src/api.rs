use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use vows_types::api::{
    Ack, ErrorBody, GuestStats, GuestbookRequest, LoginRequest, LoginResponse, MemoryCreated,
    ReminderReport, RsvpRequest, SubmitRsvpResponse, ToggleLikeRequest, ToggleLikeResponse,
};
use vows_types::filter::GuestFilter;
use vows_types::models::{Memory, RsvpEntry};

use crate::error::ClientError;

/// Thin wrapper over the site's HTTP API. Dashboard calls need a token from
/// [`ApiClient::login`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
        Ok(builder.bearer_auth(token))
    }

    // -- Public site --

    pub async fn submit_rsvp(&self, req: &RsvpRequest) -> Result<SubmitRsvpResponse, ClientError> {
        let resp = self.http.post(self.url("/rsvp")).json(req).send().await?;
        read_json(resp).await
    }

    pub async fn list_memories(&self) -> Result<Vec<Memory>, ClientError> {
        let resp = self.http.get(self.url("/guestbook")).send().await?;
        read_json(resp).await
    }

    pub async fn create_memory(&self, req: &GuestbookRequest) -> Result<MemoryCreated, ClientError> {
        let resp = self.http.post(self.url("/guestbook")).json(req).send().await?;
        read_json(resp).await
    }

    /// Adds (`liked = true`) or withdraws one like. Returns the new count.
    pub async fn set_like(&self, id: Uuid, liked: bool) -> Result<u32, ClientError> {
        let resp = self
            .http
            .post(self.url(&format!("/guestbook/{}/like", id)))
            .json(&ToggleLikeRequest { liked })
            .send()
            .await?;
        let body: ToggleLikeResponse = read_json(resp).await?;
        Ok(body.likes)
    }

    // -- Dashboard --

    /// Exchanges the dashboard password for a session token and keeps it.
    pub async fn login(&mut self, password: &str) -> Result<LoginResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                password: password.to_string(),
            })
            .send()
            .await?;
        let session: LoginResponse = read_json(resp).await?;
        self.token = Some(session.token.clone());
        debug!("Signed in until {}", session.expires_at);
        Ok(session)
    }

    pub async fn list_rsvps(&self, filter: &GuestFilter) -> Result<Vec<RsvpEntry>, ClientError> {
        let resp = self
            .authed(self.http.get(self.url("/admin/rsvps")).query(filter))?
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn stats(&self) -> Result<GuestStats, ClientError> {
        let resp = self.authed(self.http.get(self.url("/admin/stats")))?.send().await?;
        read_json(resp).await
    }

    pub async fn add_rsvp(&self, req: &RsvpRequest) -> Result<RsvpEntry, ClientError> {
        let resp = self
            .authed(self.http.post(self.url("/admin/rsvps")).json(req))?
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn update_rsvp(&self, id: Uuid, req: &RsvpRequest) -> Result<RsvpEntry, ClientError> {
        let resp = self
            .authed(self.http.put(self.url(&format!("/admin/rsvps/{}", id))).json(req))?
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn delete_rsvp(&self, id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .authed(self.http.delete(self.url(&format!("/admin/rsvps/{}", id))))?
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn resend_invitation(&self, id: Uuid) -> Result<Ack, ClientError> {
        let resp = self
            .authed(self.http.post(self.url(&format!("/admin/rsvps/{}/resend", id))))?
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn send_reminders(&self) -> Result<ReminderReport, ClientError> {
        let resp = self
            .authed(self.http.post(self.url("/admin/reminders")))?
            .send()
            .await?;
        read_json(resp).await
    }

    // -- Live feeds --

    /// WebSocket URL of the dashboard feed, carrying the session token.
    pub fn admin_feed_url(&self) -> Result<String, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
        Ok(format!("{}/admin/live?token={}", ws_base(&self.base_url), token))
    }

    pub fn guestbook_feed_url(&self) -> String {
        format!("{}/guestbook/live", ws_base(&self.base_url))
    }
}

fn ws_base(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base_url.to_string()
    }
}

/// Turns a non-2xx response into `ClientError::Api`, keeping the server's
/// title and description when the body carries them.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_else(|_| ErrorBody {
        title: "Something went wrong".into(),
        description: status
            .canonical_reason()
            .unwrap_or("Unexpected response from the server.")
            .to_string(),
        fields: None,
    });
    Err(ClientError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check(resp).await?;
    Ok(resp.json::<T>().await?)
}
