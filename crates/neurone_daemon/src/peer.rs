use neurone_core::{excitation_url, PeerNotifier};
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound on a single notification; stragglers are abandoned.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Excites peers with a plain HTTP GET. Each request runs on its own detached
/// task: no response is read, nothing is retried, failures are dropped.
#[derive(Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl PeerNotifier for HttpNotifier {
    fn notify(&self, address: &str, transfer: f32) {
        let url = excitation_url(address, transfer);
        info!(url = %url, "Exciting peer");

        let request = self.client.get(&url);
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => debug!(url = %url, status = %response.status(), "Peer notified"),
                Err(e) => debug!(url = %url, error = %e, "Peer notification dropped"),
            }
        });
    }
}
