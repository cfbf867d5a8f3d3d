use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use movie_night_back::config::AppConfig;
use movie_night_back::dao::session_store::MemoryStore;
use movie_night_back::routes;
use movie_night_back::state::AppState;

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a server on an ephemeral port with default settings.
    pub async fn new() -> Self {
        Self::from_config(AppConfig::default()).await
    }

    pub async fn from_config(config: AppConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        let app = routes::router(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            client: reqwest::Client::new(),
            _shutdown: handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POST a JSON body and return the status with the decoded response body.
    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Create a room hosted by `nickname`. Returns (room code, host id).
    pub async fn create_room(&self, nickname: &str) -> (String, String) {
        let (status, body) = self
            .post("/rooms", json!({ "hostNickname": nickname }))
            .await;
        assert_eq!(status, 201, "create failed: {body}");
        (
            body["roomCode"].as_str().unwrap().to_string(),
            body["hostId"].as_str().unwrap().to_string(),
        )
    }

    /// Join with a fixed participant id, asserting success.
    pub async fn join(&self, code: &str, id: &str, nickname: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/rooms/{code}/join"),
                json!({ "participantId": id, "nickname": nickname }),
            )
            .await;
        assert_eq!(status, 200, "join failed: {body}");
        body
    }

    pub async fn host_action(&self, code: &str, action: &str, host_id: &str) -> (u16, Value) {
        self.post(
            &format!("/rooms/{code}/{action}"),
            json!({ "requesterId": host_id }),
        )
        .await
    }

    pub async fn nominate(&self, code: &str, participant_id: &str, movie_id: &str) -> (u16, Value) {
        self.post(
            &format!("/rooms/{code}/nominations"),
            json!({
                "participantId": participant_id,
                "movie": { "id": movie_id, "title": format!("Movie {movie_id}") },
            }),
        )
        .await
    }

    pub async fn vote(&self, code: &str, participant_id: &str, movie_id: &str) -> (u16, Value) {
        self.post(
            &format!("/rooms/{code}/votes"),
            json!({ "participantId": participant_id, "movieId": movie_id }),
        )
        .await
    }
}

/// Open the event stream of a room.
pub async fn open_stream(server: &TestServer, code: &str) -> reqwest::Response {
    let resp = server
        .client
        .get(server.url(&format!("/rooms/{code}/events")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp
}

/// Read SSE chunks until `count` named events arrived or the deadline passed.
/// Returns the event names in arrival order.
pub async fn read_events(resp: &mut reqwest::Response, count: usize) -> Vec<String> {
    let mut buffer = String::new();
    let mut names = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(3), async {
        while names.len() < count {
            match resp.chunk().await {
                Ok(Some(bytes)) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    while let Some(end) = buffer.find("\n\n") {
                        let frame: String = buffer.drain(..end + 2).collect();
                        if let Some(name) = frame
                            .lines()
                            .find_map(|line| line.strip_prefix("event:"))
                        {
                            names.push(name.trim().to_string());
                        }
                    }
                },
                _ => return,
            }
        }
    })
    .await;
    names
}
