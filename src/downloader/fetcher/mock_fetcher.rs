use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use super::{HttpFetcher, Response};

/// Canned responses keyed by URL. Unknown URLs answer with a network error.
pub struct MockFetcher {
    responses: HashMap<String, (Response, Duration)>,
    calls: Mutex<Vec<String>>,
}

impl HttpFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Response {
        self.calls.lock().unwrap().push(url.to_string());

        match self.responses.get(url) {
            Some((response, delay)) => {
                if !delay.is_zero() {
                    thread::sleep(*delay);
                }
                response.clone()
            }
            None => Response::network_error(format!("no mocked response for {url}")),
        }
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, url: &str, response: Response) -> Self {
        self.responses
            .insert(url.to_string(), (response, Duration::ZERO));
        self
    }

    pub fn with_delay(mut self, url: &str, response: Response, delay: Duration) -> Self {
        self.responses.insert(url.to_string(), (response, delay));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}
