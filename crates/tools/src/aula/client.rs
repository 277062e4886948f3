//! HTTP client for the Aula parent portal.
//!
//! Owns login and session reuse. Which child a conversation is about is
//! not stored here; callers pass the child's first name per operation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use aulabot_config::AulaConfig;
use aulabot_core::error::ToolError;
use chrono::{DateTime, Days, NaiveDateTime, Utc};
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::session::SessionCache;

/// A child reachable from the logged-in parent profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildProfile {
    pub id: String,
    pub name: String,
    pub institution: String,
}

impl ChildProfile {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// An authenticated portal session.
#[derive(Debug)]
pub struct AulaSession {
    cookie: String,
    children: Vec<ChildProfile>,
}

impl AulaSession {
    pub fn children(&self) -> &[ChildProfile] {
        &self.children
    }

    /// Look up a child by first name.
    pub fn child(&self, first_name: &str) -> Result<&ChildProfile, ToolError> {
        self.children
            .iter()
            .find(|c| c.first_name() == first_name)
            .ok_or_else(|| ToolError::InvalidState(format!("Child '{first_name}' not found")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildSummary {
    pub name: String,
    pub institution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadMessage {
    pub text: String,
    pub sender: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageThread {
    pub subject: String,
    pub messages: Vec<ThreadMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub end: String,
    pub date: String,
    pub formatted_time: String,
}

pub struct AulaClient {
    config: AulaConfig,
    http: reqwest::Client,
    sessions: SessionCache<AulaSession>,
}

impl AulaClient {
    pub fn new(config: AulaConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        let sessions = SessionCache::new(Duration::from_secs(config.session_ttl_secs));
        Self {
            config,
            http,
            sessions,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn cache_key(&self) -> &str {
        self.config.username.as_deref().unwrap_or_default()
    }

    /// The cached session, logging in when it is missing or expired.
    pub async fn session(&self) -> Result<Arc<AulaSession>, ToolError> {
        if !self.is_configured() {
            return Err(ToolError::NotConfigured("Aula integration".into()));
        }
        self.sessions
            .get_or_refresh(self.cache_key(), || self.login())
            .await
    }

    async fn login(&self) -> Result<AulaSession, ToolError> {
        let username = self.config.username.as_deref().unwrap_or_default();
        let password = self.config.password.as_deref().unwrap_or_default();

        let response = self
            .http
            .post(&self.config.login_url)
            .form(&[
                ("username", username),
                ("password", password),
                ("selected-aktoer", "KONTAKT"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::upstream("Aula login", e.to_string()))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            warn!(status = status.as_u16(), "Aula authentication rejected");
            return Err(ToolError::upstream("Aula login", "Authentication failed"));
        }

        let cookie = session_cookie(response.headers()).ok_or_else(|| {
            ToolError::upstream("Aula login", "Authentication failed: no session cookie")
        })?;

        let children = self.fetch_profiles(&cookie).await?;
        info!(children = children.len(), "Logged in to Aula");
        Ok(AulaSession { cookie, children })
    }

    async fn fetch_profiles(&self, cookie: &str) -> Result<Vec<ChildProfile>, ToolError> {
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[("method", "profiles.getProfilesByLogin")])
            .header(COOKIE, cookie)
            .send()
            .await
            .map_err(|e| ToolError::upstream("Aula", e.to_string()))?;
        let data = read_json(response).await?;
        Ok(children_from_profiles(&data))
    }

    /// Send an authenticated request. A 401/403 drops the session and the
    /// request is retried once after a fresh login.
    async fn send<F>(&self, build: F) -> Result<Value, ToolError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let session = self.session().await?;
        let response = build()
            .header(COOKIE, &session.cookie)
            .send()
            .await
            .map_err(|e| ToolError::upstream("Aula", e.to_string()))?;

        let status = response.status().as_u16();
        if status != 401 && status != 403 {
            return read_json(response).await;
        }

        warn!(status, "Aula session rejected, logging in again");
        self.sessions.invalidate(self.cache_key(), &session).await;
        let session = self.session().await?;
        let response = build()
            .header(COOKIE, &session.cookie)
            .send()
            .await
            .map_err(|e| ToolError::upstream("Aula", e.to_string()))?;
        read_json(response).await
    }

    /// Validate a child name against the logged-in profile.
    pub async fn resolve_child(&self, first_name: &str) -> Result<ChildProfile, ToolError> {
        self.session().await?.child(first_name).cloned()
    }

    pub async fn fetch_basic_data(&self) -> Result<Vec<ChildSummary>, ToolError> {
        let session = self.session().await?;
        Ok(session
            .children()
            .iter()
            .map(|c| ChildSummary {
                name: c.name.clone(),
                institution: c.institution.clone(),
            })
            .collect())
    }

    pub async fn fetch_daily_overview(&self, child: &str) -> Result<Value, ToolError> {
        let child = self.resolve_child(child).await?;
        debug!(child = %child.id, "Fetching daily overview");
        let data = self
            .send(|| {
                self.http.get(&self.config.api_url).query(&[
                    ("method", "presence.getDailyOverview"),
                    ("childIds[]", child.id.as_str()),
                ])
            })
            .await?;
        Ok(data
            .pointer("/data/0")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    pub async fn fetch_messages(&self) -> Result<Vec<MessageThread>, ToolError> {
        let data = self
            .send(|| {
                self.http.get(&self.config.api_url).query(&[
                    ("method", "messaging.getThreads"),
                    ("sortOn", "date"),
                    ("orderDirection", "desc"),
                    ("page", "0"),
                ])
            })
            .await?;

        let threads = data
            .pointer("/data/threads")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut out = Vec::with_capacity(threads.len());
        for thread in &threads {
            let thread_id = id_string(&thread["id"]);
            let messages = self
                .send(|| {
                    self.http.get(&self.config.api_url).query(&[
                        ("method", "messaging.getMessagesForThread"),
                        ("threadId", thread_id.as_str()),
                        ("page", "0"),
                    ])
                })
                .await?;
            out.push(MessageThread {
                subject: thread["subject"].as_str().unwrap_or_default().to_string(),
                messages: thread_messages(&messages),
            });
        }
        Ok(out)
    }

    pub async fn fetch_calendar(
        &self,
        child: &str,
        days: u64,
    ) -> Result<BTreeMap<String, Vec<CalendarEvent>>, ToolError> {
        let child = self.resolve_child(child).await?;
        let today = Utc::now().date_naive();
        let until = today
            .checked_add_days(Days::new(days))
            .ok_or_else(|| ToolError::InvalidArguments(format!("'days' out of range: {days}")))?;
        let body = serde_json::json!({
            "instProfileIds": [child.id],
            "resourceIds": [],
            "start": format!("{} 00:00:00.0000+00:00", today.format("%Y-%m-%d")),
            "end": format!("{} 00:00:00.0000+00:00", until.format("%Y-%m-%d")),
        });

        let data = self
            .send(|| {
                self.http
                    .post(&self.config.api_url)
                    .query(&[("method", "calendar.getEventsByProfileIdsAndResourceIds")])
                    .json(&body)
            })
            .await?;

        Ok(group_events(&data, &child.id))
    }
}

/// `name=value` of the first `Set-Cookie` header.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .find(|pair| pair.contains('=') && !pair.ends_with('='))
        .map(String::from)
}

async fn read_json(response: reqwest::Response) -> Result<Value, ToolError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::upstream(
            "Aula",
            format!("request returned status {}", status.as_u16()),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| ToolError::upstream("Aula", format!("invalid response: {e}")))
}

/// Portal ids arrive as numbers or strings.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn children_from_profiles(data: &Value) -> Vec<ChildProfile> {
    data.pointer("/data/profiles")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .flat_map(|profile| profile["children"].as_array().cloned().unwrap_or_default())
        .map(|child| ChildProfile {
            id: id_string(&child["id"]),
            name: child["name"].as_str().unwrap_or_default().to_string(),
            institution: child
                .pointer("/institutionProfile/institutionName")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
        })
        .collect()
}

fn parse_portal_time(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn format_portal_time(raw: &str) -> String {
    parse_portal_time(raw)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn thread_messages(data: &Value) -> Vec<ThreadMessage> {
    data.pointer("/data/messages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|m| m["messageType"] == "Message")
        .map(|m| ThreadMessage {
            text: m
                .pointer("/text/html")
                .and_then(Value::as_str)
                .or_else(|| m["text"].as_str())
                .unwrap_or("No content")
                .to_string(),
            sender: m
                .pointer("/sender/fullName")
                .and_then(Value::as_str)
                .unwrap_or("Unknown sender")
                .to_string(),
            date: format_portal_time(m["sendDateTime"].as_str().unwrap_or_default()),
        })
        .collect()
}

fn group_events(data: &Value, child_id: &str) -> BTreeMap<String, Vec<CalendarEvent>> {
    let mut grouped: BTreeMap<String, Vec<CalendarEvent>> = BTreeMap::new();

    let events = data
        .get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|e| {
            e["belongsToProfiles"]
                .as_array()
                .is_some_and(|ids| ids.iter().any(|id| id_string(id) == child_id))
        });

    for event in events {
        let start_raw = event["startDateTime"].as_str().unwrap_or_default();
        let end_raw = event["endDateTime"].as_str().unwrap_or_default();
        let start = parse_portal_time(start_raw);
        let end = parse_portal_time(end_raw);

        let date = match start {
            Some(s) => s.format("%Y-%m-%d").to_string(),
            None => start_raw.chars().take(10).collect(),
        };
        let clock = |t: Option<NaiveDateTime>| t.map(|t| t.format("%H:%M").to_string());
        let formatted_time = format!(
            "{} - {}",
            clock(start).unwrap_or_default(),
            clock(end).unwrap_or_default()
        );

        grouped.entry(date.clone()).or_default().push(CalendarEvent {
            title: event["title"].as_str().unwrap_or_default().to_string(),
            start: format_portal_time(start_raw),
            end: format_portal_time(end_raw),
            date,
            formatted_time,
        });
    }

    grouped
}
