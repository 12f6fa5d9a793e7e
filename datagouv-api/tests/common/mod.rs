#![allow(dead_code)]

use async_trait::async_trait;
use datagouv_api::session::{RawResponse, UpstreamRequest};
use datagouv_api::{Configuration, Connector, Endpoints, Transport, UpstreamError, UpstreamResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

/// Endpoints that route every upstream service to the stub server.
pub fn stub_endpoints(server: &MockServer) -> Endpoints {
    let base = server.uri();
    Endpoints {
        catalog_api: format!("{base}/api"),
        site: format!("{base}/site"),
        tabular_api: format!("{base}/tabular/api"),
        metrics_api: format!("{base}/metric/api"),
    }
}

pub fn stub_config(server: &MockServer) -> Arc<Configuration> {
    Arc::new(
        Configuration::new()
            .with_endpoints(stub_endpoints(server))
            .with_user_agent("datagouv-api-tests/1.0"),
    )
}

/// What a [`FakeTransport`] does when asked to execute a request
#[derive(Debug, Clone)]
pub enum Behaviour {
    Respond { status: u16, body: String },
    Refuse,
    Panic,
}

/// Records how many sessions were opened and closed, and which URLs were hit
#[derive(Debug, Default)]
pub struct Probe {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
}

impl Probe {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct FakeConnector {
    pub probe: Arc<Probe>,
    pub behaviour: Behaviour,
}

impl FakeConnector {
    pub fn new(behaviour: Behaviour) -> (Arc<Self>, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        let connector = Arc::new(Self {
            probe: probe.clone(),
            behaviour,
        });
        (connector, probe)
    }
}

impl Connector for FakeConnector {
    fn open(&self, _timeout: Duration) -> UpstreamResult<Box<dyn Transport>> {
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTransport {
            probe: self.probe.clone(),
            behaviour: self.behaviour.clone(),
        }))
    }
}

pub struct FakeTransport {
    probe: Arc<Probe>,
    behaviour: Behaviour,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: &UpstreamRequest) -> UpstreamResult<RawResponse> {
        self.probe.urls.lock().unwrap().push(request.url.clone());
        match &self.behaviour {
            Behaviour::Respond { status, body } => Ok(RawResponse {
                status: *status,
                body: body.clone(),
            }),
            Behaviour::Refuse => Err(UpstreamError::Transport {
                url: request.url.clone(),
                message: "connection refused".to_string(),
            }),
            Behaviour::Panic => panic!("transport blew up"),
        }
    }

    fn close(&self) {
        self.probe.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn fake_config(connector: Arc<FakeConnector>) -> Arc<Configuration> {
    Arc::new(Configuration::new().with_connector(connector))
}
