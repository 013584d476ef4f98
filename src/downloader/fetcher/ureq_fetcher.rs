use std::error::Error as _;
use std::io::Read;
use std::time::Duration;

use ureq::{Agent, AgentBuilder, Transport};

use super::{HttpFetcher, Response};

const USER_AGENT: &str = concat!("pixabay-downloader/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP transport over one pooled [`ureq::Agent`].
///
/// Clones share the agent's connection pool and TLS configuration.
#[derive(Clone)]
pub struct UReqFetcher {
    agent: Agent,
}

impl HttpFetcher for UReqFetcher {
    fn fetch(&self, url: &str) -> Response {
        let response = self.agent.request("GET", url).call();

        match response {
            Ok(response) if response.status() == 200 => {
                let mut body = Vec::new();

                if response.into_reader().read_to_end(&mut body).is_err() {
                    return Response::invalid_body();
                }

                Response::ok(body)
            }

            Ok(response) => Response::status(response.status()),

            Err(ureq::Error::Status(code, _)) => Response::status(code),

            Err(ureq::Error::Transport(transport)) => {
                Response::network_error(describe(&transport))
            }
        }
    }
}

impl UReqFetcher {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .user_agent(USER_AGENT)
            .build();

        UReqFetcher { agent }
    }
}

// `Transport`'s Display starts with the request URL, query string included.
fn describe(transport: &Transport) -> String {
    let mut message = transport.kind().to_string();

    if let Some(detail) = transport.message() {
        message.push_str(": ");
        message.push_str(detail);
    }

    if let Some(source) = transport.source() {
        message.push_str(": ");
        message.push_str(&source.to_string());
    }

    message
}
