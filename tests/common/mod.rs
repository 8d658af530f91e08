//! In-process stand-in for the agent backend's log API.
//!
//! Binds `127.0.0.1:0`, serves `GET /api/logs` from a mutable record list and
//! records every `PUT /api/logs/{id}/feedback` body it receives.

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use agentmon::logs::{Feedback, InteractionLog};
use tiny_http::{Header, Method, Response, Server, StatusCode};

/// How the mock answers `GET /api/logs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Healthy,
    ServerError,
    Garbage,
}

#[derive(Default)]
struct Shared {
    logs: Vec<InteractionLog>,
    mode: Mode,
    feedback_calls: Vec<(String, String)>,
    get_calls: usize,
}

pub struct MockBackend {
    server: Arc<Server>,
    shared: Arc<Mutex<Shared>>,
    handle: Option<JoinHandle<()>>,
    pub base_url: String,
}

impl MockBackend {
    pub fn start(logs: Vec<InteractionLog>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind mock server"));
        let addr = server.server_addr().to_ip().expect("tcp listener");
        let shared = Arc::new(Mutex::new(Shared {
            logs,
            ..Shared::default()
        }));

        let handle = {
            let server = Arc::clone(&server);
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let url = request.url().to_string();
                    let method = request.method().clone();

                    let (status, payload) = {
                        let mut state = shared.lock().unwrap();
                        match (method, url.as_str()) {
                            (Method::Get, "/api/logs") => {
                                state.get_calls += 1;
                                match state.mode {
                                    Mode::Healthy => (
                                        200,
                                        serde_json::json!({
                                            "logs": state.logs,
                                            "total": state.logs.len(),
                                        })
                                        .to_string(),
                                    ),
                                    Mode::ServerError => (500, "{\"detail\":\"boom\"}".to_string()),
                                    Mode::Garbage => (200, "<html>not json</html>".to_string()),
                                }
                            }
                            (Method::Put, path) if path.ends_with("/feedback") => {
                                let id = path
                                    .trim_start_matches("/api/logs/")
                                    .trim_end_matches("/feedback")
                                    .to_string();
                                state.feedback_calls.push((id.clone(), body.clone()));
                                match state.logs.iter_mut().find(|l| l.id == id) {
                                    Some(log) => {
                                        let value: serde_json::Value =
                                            serde_json::from_str(&body).unwrap_or_default();
                                        log.feedback = match value["feedback"].as_str() {
                                            Some("up") => Some(Feedback::Up),
                                            Some("down") => Some(Feedback::Down),
                                            _ => log.feedback,
                                        };
                                        (200, "{\"status\":\"success\"}".to_string())
                                    }
                                    None => (404, "{\"detail\":\"Log not found\"}".to_string()),
                                }
                            }
                            _ => (404, "{}".to_string()),
                        }
                    };

                    let response = Response::from_string(payload)
                        .with_status_code(StatusCode(status))
                        .with_header(
                            Header::from_bytes("Content-Type", "application/json").unwrap(),
                        );
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            shared,
            handle: Some(handle),
            base_url: format!("http://{addr}"),
        }
    }

    pub fn set_logs(&self, logs: Vec<InteractionLog>) {
        self.shared.lock().unwrap().logs = logs;
    }

    pub fn set_mode(&self, mode: Mode) {
        self.shared.lock().unwrap().mode = mode;
    }

    pub fn feedback_calls(&self) -> Vec<(String, String)> {
        self.shared.lock().unwrap().feedback_calls.clone()
    }

    pub fn get_calls(&self) -> usize {
        self.shared.lock().unwrap().get_calls
    }

    pub fn stored_feedback(&self, id: &str) -> Option<Feedback> {
        let state = self.shared.lock().unwrap();
        state.logs.iter().find(|l| l.id == id).and_then(|l| l.feedback)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A record with the backend's timestamp format.
pub fn log(id: &str, user: &str, duration: u64, feedback: Option<Feedback>) -> InteractionLog {
    InteractionLog {
        id: id.to_string(),
        timestamp: format!("2026-10-17 09:{:02}:00", duration % 60),
        user_id: user.to_string(),
        question: format!("question from {user}"),
        answer: format!("answer {id}"),
        duration,
        feedback,
    }
}
