//! A local stand-in for the Aula login and API endpoints.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aulabot_config::AulaConfig;
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Clone, Default)]
pub(crate) struct MockPortal {
    pub base_url: String,
    pub logins: Arc<AtomicUsize>,
    /// API calls to answer with 401 before serving again.
    pub reject_next: Arc<AtomicUsize>,
}

impl MockPortal {
    pub async fn start() -> Self {
        let mut portal = MockPortal::default();
        let app = Router::new()
            .route("/auth/authenticate", post(authenticate))
            .route("/api/v20", get(api_get).post(api_post))
            .with_state(portal.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        portal.base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        portal
    }

    fn rejects(&self, headers: &HeaderMap) -> bool {
        let has_cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|c| c.starts_with("PHPSESSID="));
        if !has_cookie {
            return true;
        }
        self.reject_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

pub(crate) fn portal_config(base_url: &str) -> AulaConfig {
    AulaConfig {
        username: Some("parent".into()),
        password: Some("secret".into()),
        api_url: format!("{base_url}/api/v20"),
        login_url: format!("{base_url}/auth/authenticate"),
        ..AulaConfig::default()
    }
}

async fn authenticate(
    State(portal): State<MockPortal>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let valid = form.get("username").map(String::as_str) == Some("parent")
        && form.get("password").map(String::as_str) == Some("secret")
        && form.get("selected-aktoer").map(String::as_str) == Some("KONTAKT");
    if !valid {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let n = portal.logins.fetch_add(1, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, format!("PHPSESSID=session{n}; path=/; HttpOnly"))],
        "ok",
    )
        .into_response()
}

async fn api_get(
    State(portal): State<MockPortal>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if portal.rejects(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let body = match q.get("method").map(String::as_str) {
        Some("profiles.getProfilesByLogin") => json!({"data": {"profiles": [{
            "children": [
                {"id": 101, "name": "Emma Hansen",
                 "institutionProfile": {"institutionName": "Nørre Skole"}},
                {"id": 102, "name": "Oscar Hansen",
                 "institutionProfile": {"institutionName": "Solsikken"}}
            ]
        }]}}),
        Some("presence.getDailyOverview") => json!({"data": [{
            "status": "present",
            "childId": q.get("childIds[]").cloned().unwrap_or_default()
        }]}),
        Some("messaging.getThreads") => json!({"data": {"threads": [
            {"id": 7, "subject": "Udflugt"}
        ]}}),
        Some("messaging.getMessagesForThread") => json!({"data": {"messages": [
            {"messageType": "Message", "text": {"html": "Husk madpakke"},
             "sender": {"fullName": "Lærer Jensen"},
             "sendDateTime": "2024-05-02T08:15:00+02:00"},
            {"messageType": "RecipientAdded", "text": "joined"}
        ]}}),
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };
    Json(body).into_response()
}

async fn api_post(
    State(portal): State<MockPortal>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if portal.rejects(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if q.get("method").map(String::as_str) != Some("calendar.getEventsByProfileIdsAndResourceIds")
        || body["start"].as_str().is_none()
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({"data": [
        {"title": "Svømning", "startDateTime": "2024-05-03T10:00:00+02:00",
         "endDateTime": "2024-05-03T11:30:00+02:00", "belongsToProfiles": [101]},
        {"title": "Fodbold", "startDateTime": "2024-05-04T15:00:00+02:00",
         "endDateTime": "2024-05-04T16:00:00+02:00", "belongsToProfiles": [102]}
    ]}))
    .into_response()
}
