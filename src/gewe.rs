use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GewechatConfig;

/// Upper bound on a single invitation request.
pub const INVITE_TIMEOUT: Duration = Duration::from_secs(30);

/// `ret` value the gateway uses for success.
const RET_OK: i64 = 200;

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("request to gateway failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API responded with error (ret={ret}): {msg}")]
    Api { ret: i64, msg: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InviteRequest<'a> {
    app_id: &'a str,
    wxids: &'a str,
    chatroom_id: &'a str,
    reason: &'a str,
}

/// Body returned by `/group/inviteMember`.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteResponse {
    pub ret: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Anything that can add a user to a group chat.
#[async_trait]
pub trait GroupInviter: Send + Sync {
    async fn invite(
        &self,
        wxid: &str,
        chatroom_id: &str,
        reason: &str,
    ) -> Result<InviteResponse, InviteError>;
}

/// HTTP client for the GeWe WeChat gateway.
pub struct GeweClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    app_id: String,
}

impl GeweClient {
    pub fn new(config: &GewechatConfig) -> anyhow::Result<Self> {
        Self::with_timeout(config, INVITE_TIMEOUT)
    }

    fn with_timeout(config: &GewechatConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            app_id: config.app_id.clone(),
        })
    }
}

#[async_trait]
impl GroupInviter for GeweClient {
    async fn invite(
        &self,
        wxid: &str,
        chatroom_id: &str,
        reason: &str,
    ) -> Result<InviteResponse, InviteError> {
        let url = format!("{}/group/inviteMember", self.base_url);
        let request = InviteRequest {
            app_id: &self.app_id,
            wxids: wxid,
            chatroom_id,
            reason,
        };

        info!("Inviting {} into {}", wxid, chatroom_id);
        debug!("POST {} payload: {:?}", url, request);

        let response = self
            .client
            .post(&url)
            .header("X-GEWE-TOKEN", &self.token)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Gateway responded {}: {}", status, body);

        if status != StatusCode::OK {
            return Err(InviteError::Status { status, body });
        }

        let result: InviteResponse = serde_json::from_str(&body)?;
        if result.ret != RET_OK {
            return Err(InviteError::Api {
                ret: result.ret,
                msg: result.msg.unwrap_or_default(),
            });
        }

        info!("Invited {} into {}", wxid, chatroom_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> GeweClient {
        GeweClient::new(&GewechatConfig {
            base_url: format!("{}/", server.url()),
            token: "test-token".to_string(),
            app_id: "wx_app".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_invite_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/group/inviteMember")
            .match_header("X-GEWE-TOKEN", "test-token")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "appId": "wx_app",
                "wxids": "wxid_alice",
                "chatroomId": "123@chatroom",
                "reason": "welcome"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ret": 200, "msg": "操作成功", "data": null}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .invite("wxid_alice", "123@chatroom", "welcome")
            .await
            .unwrap();

        assert_eq!(response.ret, 200);
        assert_eq!(response.msg.as_deref(), Some("操作成功"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invite_http_failure_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/group/inviteMember")
            .with_status(500)
            .with_body("gateway exploded")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .invite("wxid_alice", "123@chatroom", "")
            .await
            .unwrap_err();

        assert!(matches!(err, InviteError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.to_string().contains("gateway exploded"));
    }

    #[tokio::test]
    async fn test_invite_api_failure_keeps_msg() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/group/inviteMember")
            .with_status(200)
            .with_body(r#"{"ret": 500, "msg": "chatroom not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .invite("wxid_alice", "404@chatroom", "")
            .await
            .unwrap_err();

        assert!(matches!(err, InviteError::Api { ret: 500, .. }));
        assert!(err.to_string().contains("chatroom not found"));
    }

    #[tokio::test]
    async fn test_invite_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/group/inviteMember")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .invite("wxid_alice", "123@chatroom", "")
            .await
            .unwrap_err();

        assert!(matches!(err, InviteError::Decode(_)));
    }

    #[tokio::test]
    async fn test_invite_non_200_success_status_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/group/inviteMember")
            .with_status(201)
            .with_body(r#"{"ret": 200, "msg": "ok"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .invite("wxid_alice", "123@chatroom", "")
            .await
            .unwrap_err();

        assert!(matches!(err, InviteError::Status { status, .. } if status == StatusCode::CREATED));
    }

    #[test]
    fn test_invite_timeout_is_thirty_seconds() {
        assert_eq!(INVITE_TIMEOUT, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let client = GeweClient::with_timeout(
            &GewechatConfig {
                base_url: format!("http://{}", addr),
                token: String::new(),
                app_id: String::new(),
            },
            Duration::from_millis(200),
        )
        .unwrap();

        let err = client.invite("wxid", "1@chatroom", "").await.unwrap_err();
        match err {
            InviteError::Request(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let client = GeweClient::new(&GewechatConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            token: String::new(),
            app_id: String::new(),
        })
        .unwrap();

        let err = client.invite("wxid", "1@chatroom", "").await.unwrap_err();
        assert!(matches!(err, InviteError::Request(_)));
    }
}
