//! In-memory stand-ins for the MangaDex API.
//!
//! Only compiled for tests and with the `test-util` feature.

use crate::api::{ApiRequest, ApiSettings, MangadexClient, Session, SessionSettings, Transport};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&ApiRequest) -> Result<Value, ApiError> + Send + Sync;

/// Transport that answers from a closure and records every request
///
/// Clones share the same request log.
#[derive(Clone)]
pub struct MockTransport {
    responder: Arc<Responder>,
    log: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().expect("request log poisoned").clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.endpoint == endpoint)
            .collect()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.requests_to(endpoint).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let response = (self.responder)(&request);
        self.log.lock().expect("request log poisoned").push(request);
        response
    }
}

/// Body of a successful login or refresh exchange
pub fn token_body(session: &str, refresh: &str) -> Value {
    json!({
        "result": "ok",
        "token": {"session": session, "refresh": refresh}
    })
}

/// One chapter in a fake feed
#[derive(Debug, Clone)]
pub struct FakeChapter {
    pub id: String,
    pub number: Option<String>,
}

impl FakeChapter {
    pub fn new(id: &str, number: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            number: number.map(str::to_string),
        }
    }
}

/// One manga in a fake library
#[derive(Debug, Clone, Default)]
pub struct FakeManga {
    pub id: String,
    pub status: String,
    pub titles: Vec<(String, String)>,
    pub rating: Option<i64>,
    pub read_markers: Vec<String>,
    pub chapters: Vec<FakeChapter>,
}

impl FakeManga {
    pub fn new(id: &str, status: &str) -> Self {
        Self {
            id: id.to_string(),
            status: status.to_string(),
            ..Self::default()
        }
    }

    pub fn title(mut self, lang: &str, title: &str) -> Self {
        self.titles.push((lang.to_string(), title.to_string()));
        self
    }

    pub fn rating(mut self, rating: i64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn chapter(mut self, id: &str, number: Option<&str>) -> Self {
        self.chapters.push(FakeChapter::new(id, number));
        self
    }

    pub fn read(mut self, chapter_id: &str) -> Self {
        self.read_markers.push(chapter_id.to_string());
        self
    }
}

/// A whole account library served the way MangaDex serves it
///
/// Empty rating and read-marker batches come back as `[]`, and feeds honour
/// `offset`/`limit`.
#[derive(Debug, Clone, Default)]
pub struct FakeLibrary {
    pub manga: Vec<FakeManga>,
}

impl FakeLibrary {
    pub fn new(manga: Vec<FakeManga>) -> Self {
        Self { manga }
    }

    /// Transport answering auth and library endpoints from this library
    pub fn into_transport(self) -> MockTransport {
        let library = Arc::new(self);
        MockTransport::new(move |request| library.respond(request))
    }

    fn find(&self, id: &str) -> Option<&FakeManga> {
        self.manga.iter().find(|m| m.id == id)
    }

    /// Answer one request the way the API would
    pub fn respond(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let endpoint = request.endpoint.as_str();
        match endpoint {
            "auth/login" | "auth/refresh" => Ok(token_body("session", "refresh")),
            "manga/status" => {
                let statuses: Map<String, Value> = self
                    .manga
                    .iter()
                    .map(|m| (m.id.clone(), json!(m.status)))
                    .collect();
                Ok(json!({"result": "ok", "statuses": statuses}))
            }
            "rating" => {
                let ratings: Map<String, Value> = request
                    .query_values("manga[]")
                    .into_iter()
                    .filter_map(|id| self.find(id))
                    .filter_map(|m| {
                        m.rating.map(|r| {
                            (
                                m.id.clone(),
                                json!({"rating": r, "createdAt": "2024-01-01T00:00:00+00:00"}),
                            )
                        })
                    })
                    .collect();
                Ok(json!({"result": "ok", "ratings": map_or_sentinel(ratings)}))
            }
            "manga" => {
                let data: Vec<Value> = request
                    .query_values("ids[]")
                    .into_iter()
                    .filter_map(|id| self.find(id))
                    .map(|m| {
                        let titles: Map<String, Value> = m
                            .titles
                            .iter()
                            .map(|(lang, title)| (lang.clone(), json!(title)))
                            .collect();
                        json!({
                            "id": m.id,
                            "type": "manga",
                            "attributes": {"title": titles, "altTitles": []}
                        })
                    })
                    .collect();
                let total = data.len();
                Ok(json!({"result": "ok", "data": data, "total": total}))
            }
            "manga/read" => {
                let markers: Map<String, Value> = request
                    .query_values("ids[]")
                    .into_iter()
                    .filter_map(|id| self.find(id))
                    .filter(|m| !m.read_markers.is_empty())
                    .map(|m| (m.id.clone(), json!(m.read_markers)))
                    .collect();
                Ok(json!({"result": "ok", "data": map_or_sentinel(markers)}))
            }
            _ => {
                let manga_id = endpoint
                    .strip_prefix("manga/")
                    .and_then(|rest| rest.strip_suffix("/feed"));
                match manga_id.and_then(|id| self.find(id)) {
                    Some(manga) => Ok(feed_page(manga, request)),
                    None => Err(ApiError::Status {
                        endpoint: endpoint.to_string(),
                        status: 404,
                        body: "not found".to_string(),
                    }),
                }
            }
        }
    }
}

fn map_or_sentinel(map: Map<String, Value>) -> Value {
    if map.is_empty() {
        json!([])
    } else {
        Value::Object(map)
    }
}

fn feed_page(manga: &FakeManga, request: &ApiRequest) -> Value {
    let param = |key: &str, default: usize| {
        request
            .query_values(key)
            .first()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(default)
    };
    let offset = param("offset", 0);
    let limit = param("limit", 10);

    let data: Vec<Value> = manga
        .chapters
        .iter()
        .skip(offset)
        .take(limit)
        .map(|c| {
            json!({
                "id": c.id,
                "type": "chapter",
                "attributes": {"chapter": c.number, "translatedLanguage": "en"}
            })
        })
        .collect();

    json!({
        "result": "ok",
        "data": data,
        "limit": limit,
        "offset": offset,
        "total": manga.chapters.len(),
    })
}

/// Authenticated client over `transport`, with its token file under `dir`
pub async fn connect_mock<T: Transport>(
    transport: T,
    dir: &Path,
    settings: ApiSettings,
) -> Result<MangadexClient<T>, ApiError> {
    let token_file = dir.join("refresh_token");
    std::fs::write(&token_file, "refresh").map_err(|source| ApiError::TokenFile {
        path: token_file.clone(),
        source,
    })?;
    let session_settings = SessionSettings {
        token_file,
        username_env: "MD_TEST_UNUSED_USER".to_string(),
        password_env: "MD_TEST_UNUSED_PWD".to_string(),
        ttl: chrono::Duration::minutes(15),
    };
    let session = Session::obtain(transport, session_settings).await?;
    Ok(MangadexClient::new(session, settings))
}
