//! In-process stand-in for the managed service's REST endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use super::{AccessTokenSource, ServiceAccountKey};

pub const PROJECT_ID: &str = "plateshare-test";
pub const CLIENT_EMAIL: &str = "svc@plateshare-test.iam.gserviceaccount.com";
pub const TOKEN_PATH: &str = "/token";
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";

pub const PRIVATE_KEY_PEM: &str = include_str!("testdata/service_account_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("testdata/service_account_pub.pem");

/// Response served for one method and path
pub struct Canned {
    method: Method,
    path: String,
    status: StatusCode,
    body: Value,
}

impl Canned {
    pub fn new(method: Method, path: &str, status: StatusCode, body: Value) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            body,
        }
    }

    /// Successful OAuth token exchange
    pub fn access_token(expires_in: u64) -> Self {
        Self::new(
            Method::POST,
            TOKEN_PATH,
            StatusCode::OK,
            json!({ "access_token": ACCESS_TOKEN, "expires_in": expires_in, "token_type": "Bearer" }),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

type Upstream = (Arc<Vec<Canned>>, Arc<Mutex<Vec<RecordedRequest>>>);

pub struct MockUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    /// Serve `responses` on an ephemeral local port; unknown routes answer 404
    pub async fn start(responses: Vec<Canned>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .fallback(respond)
            .with_state((Arc::new(responses), requests.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self { base_url, requests }
    }

    pub fn token_uri(&self) -> String {
        format!("{}{}", self.base_url, TOKEN_PATH)
    }

    /// Requests received on `path`, oldest first
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    pub fn token_source(&self) -> Arc<AccessTokenSource> {
        let key = ServiceAccountKey {
            project_id: PROJECT_ID.to_string(),
            private_key: PRIVATE_KEY_PEM.to_string(),
            client_email: CLIENT_EMAIL.to_string(),
            token_uri: self.token_uri(),
        };
        Arc::new(AccessTokenSource::new(reqwest::Client::new(), &key, &key.token_uri).unwrap())
    }
}

async fn respond(
    State((responses, requests)): State<Upstream>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    match responses
        .iter()
        .find(|canned| canned.method == method && canned.path == path)
    {
        Some(canned) => (canned.status, Json(canned.body.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": 404, "message": "NOT_FOUND" } })),
        )
            .into_response(),
    }
}
