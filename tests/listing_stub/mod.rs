use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ListingStubConfig {
    pub names: Vec<String>,
    /// Reported as `totalCount` when set.
    pub total_count: Option<usize>,
    /// Include `returnedCount` in every page.
    pub returned_count: bool,
    /// Sent as `returnedCount` instead of the real page length.
    pub returned_count_override: Option<serde_json::Value>,
    pub status: u16,
}

impl ListingStubConfig {
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self {
            total_count: Some(names.len()),
            names,
            returned_count: true,
            returned_count_override: None,
            status: 200,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
}

#[allow(dead_code)]
impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct ListingStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl ListingStub {
    pub fn spawn(config: ListingStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start listing stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = url::Url::parse(&format!("http://stub{}", request.url()))
                    .expect("parse request url");
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_owned());
                let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
                recorded.lock().unwrap().push(RecordedRequest {
                    path: url.path().to_owned(),
                    query: query.clone(),
                    authorization,
                });

                if request.method() != &tiny_http::Method::Get || url.path() != "/api/manage/list" {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                if config.status != 200 {
                    let _ = request.respond(
                        tiny_http::Response::from_string("listing denied")
                            .with_status_code(config.status),
                    );
                    continue;
                }

                let param = |key: &str| {
                    query
                        .iter()
                        .find(|(k, _)| k == key)
                        .and_then(|(_, v)| v.parse::<usize>().ok())
                };
                let start = param("start").unwrap_or(0).min(config.names.len());
                let count = param("count").unwrap_or(200);
                let end = (start + count).min(config.names.len());

                let files: Vec<serde_json::Value> = config.names[start..end]
                    .iter()
                    .map(|name| serde_json::json!({ "name": name }))
                    .collect();
                let mut body = serde_json::json!({ "files": files });
                if let Some(returned) = &config.returned_count_override {
                    body["returnedCount"] = returned.clone();
                } else if config.returned_count {
                    body["returnedCount"] = serde_json::json!(end - start);
                }
                if let Some(total) = config.total_count {
                    body["totalCount"] = serde_json::json!(total);
                }

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(body.to_string())
                    .with_status_code(200)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for ListingStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
