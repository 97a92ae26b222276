//! HTTP probe logic.
//!
//! One probe is one GET against the endpoint's primary path with a
//! client-side timeout. If the primary path fails at the transport level
//! (connection refused, handshake failure, timeout), a secondary
//! known-good path is tried before the probe is declared down.

use std::time::Duration;

use tracing::debug;

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered within the timeout. Any HTTP status counts:
    /// a 503 during rollover is still "reachable", so status-level
    /// outages are not reflected in downtime figures.
    Up {
        status: u16,
        /// True if the primary path failed and the fallback answered.
        fell_back: bool,
    },
    /// Transport-level failure or timeout on every attempted path.
    Down { cause: String },
}

impl ProbeOutcome {
    pub fn is_up(&self) -> bool {
        matches!(self, ProbeOutcome::Up { .. })
    }
}

/// A source of probe outcomes. The monitor is generic over this so tests
/// can script outcomes without a live endpoint.
pub trait Prober: Send + Sync {
    fn probe(&self) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Probes a real HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// `host:port` of the service endpoint.
    address: String,
    path: String,
    fallback_path: Option<String>,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(address: &str, path: &str, fallback_path: Option<&str>, timeout: Duration) -> Self {
        Self {
            address: address.to_string(),
            path: path.to_string(),
            fallback_path: fallback_path.map(str::to_string),
            timeout,
        }
    }
}

impl Prober for HttpProber {
    async fn probe(&self) -> ProbeOutcome {
        match http_get(&self.address, &self.path, self.timeout).await {
            Ok(status) => ProbeOutcome::Up {
                status,
                fell_back: false,
            },
            Err(primary_cause) => {
                let Some(fallback) = &self.fallback_path else {
                    return ProbeOutcome::Down {
                        cause: primary_cause,
                    };
                };
                debug!(path = %self.path, %fallback, "primary probe failed, trying fallback");
                match http_get(&self.address, fallback, self.timeout).await {
                    Ok(status) => ProbeOutcome::Up {
                        status,
                        fell_back: true,
                    },
                    Err(_) => ProbeOutcome::Down {
                        cause: primary_cause,
                    },
                }
            }
        }
    }
}

/// One GET request. `Ok(status)` for any HTTP response; `Err(cause)` for
/// transport-level failure or timeout.
async fn http_get(address: &str, path: &str, timeout: Duration) -> Result<u16, String> {
    let uri = format!("http://{address}{path}");

    let attempt = tokio::time::timeout(timeout, async {
        let stream = tokio::net::TcpStream::connect(address)
            .await
            .map_err(|e| format!("connect {address}: {e}"))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| format!("handshake {uri}: {e}"))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", address)
            .header("user-agent", "cutover-health/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| format!("request {uri}: {e}"))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| format!("request {uri}: {e}"))?;
        Ok::<u16, String>(resp.status().as_u16())
    })
    .await;

    match attempt {
        Ok(result) => result,
        Err(_) => Err(format!("timeout after {timeout:?} for {uri}")),
    }
}
