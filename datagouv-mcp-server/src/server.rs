use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use datagouv::{DataGouvClient, DataGouvError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::Args;
use crate::tools;

const SERVER_NAME: &str = "datagouv-mcp-server";

/// MCP protocol revisions this server speaks, newest first.
const PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

pub struct DataGouvMcpServer {
    client: Arc<DataGouvClient>,
}

impl DataGouvMcpServer {
    pub async fn bootstrap(args: &Args) -> Result<(), ServerError> {
        let server = Self::new(args)?;
        let addr = args.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            %addr,
            environment = %server.client.environment(),
            "data.gouv.fr MCP server listening"
        );

        axum::serve(listener, server.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("data.gouv.fr MCP server stopped");
        Ok(())
    }

    fn new(args: &Args) -> Result<Self, ServerError> {
        let client = DataGouvClient::with_config(args.data_gouv_config())?;
        Ok(Self::with_client(Arc::new(client)))
    }

    pub fn with_client(client: Arc<DataGouvClient>) -> Self {
        Self { client }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/mcp", post(handle_mcp))
            .route("/health", get(health))
            .with_state(Arc::new(self))
    }

    async fn handle_request(&self, request: Request) -> Response {
        match self.dispatch(&request.method, request.params).await {
            Ok(result) => Response::success(request.id, result),
            Err(err) => {
                tracing::debug!(method = %request.method, error = %err, "request failed");
                Response::error(request.id, err)
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, ServerError> {
        match method {
            "initialize" => {
                let params: InitializeParams = parse_optional_params(method, params)?;
                if let Some(client) = &params.client_info {
                    tracing::info!(
                        client = %client.name,
                        version = client.version.as_deref().unwrap_or("unknown"),
                        "client connected"
                    );
                }
                let result = InitializeResult::new(params.protocol_version.as_deref());
                serde_json::to_value(result).map_err(ServerError::Serialization)
            }
            "ping" => Ok(json!({})),
            "tools/list" => {
                let params: ListToolsParams = parse_optional_params(method, params)?;
                let result = ListToolsResult {
                    tools: tools::tool_descriptors(),
                    next_cursor: None,
                };
                serde_json::to_value(result).map_err(ServerError::Serialization)
            }
            "tools/call" => {
                let params: CallToolParams = parse_required_params(method, params)?;
                tracing::info!(tool = %params.name, "tool call");
                let response =
                    tools::call_tool(&self.client, &params.name, params.arguments).await?;
                if response.is_error() {
                    tracing::warn!(tool = %params.name, "tool reported an upstream failure");
                }
                serde_json::to_value(response).map_err(ServerError::Serialization)
            }
            other => Err(ServerError::InvalidMethod(other.to_string())),
        }
    }
}

async fn handle_mcp(State(server): State<Arc<DataGouvMcpServer>>, body: Bytes) -> HttpResponse {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("invalid request: {err}");
            return Json(Response::error(None, ServerError::Json(err))).into_response();
        }
    };

    if value.is_array() {
        let err = ServerError::InvalidRequest("batch requests are not supported".to_string());
        return Json(Response::error(None, err)).into_response();
    }

    let request = match serde_json::from_value::<Request>(value) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!("invalid request: {err}");
            return Json(Response::error(None, ServerError::InvalidRequest(err.to_string())))
                .into_response();
        }
    };

    if let Some(version) = request.jsonrpc.as_deref()
        && version != "2.0"
    {
        let err = ServerError::InvalidRequest(format!("unsupported jsonrpc version: {version}"));
        return Json(Response::error(request.id, err)).into_response();
    }

    // Notifications carry no id and get no JSON-RPC response.
    if request.id.is_none() {
        tracing::debug!(method = %request.method, "notification received");
        return StatusCode::ACCEPTED.into_response();
    }

    Json(server.handle_request(request).await).into_response()
}

async fn health(State(server): State<Arc<DataGouvMcpServer>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "environment": server.client.environment().name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

impl Response {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, error: ServerError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ResponseError::from(error)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl From<ServerError> for ResponseError {
    fn from(err: ServerError) -> Self {
        let code = match &err {
            ServerError::InvalidRequest(_) => -32600,
            ServerError::InvalidMethod(_) => -32601,
            ServerError::InvalidParams(_) | ServerError::UnknownTool(_) => -32602,
            ServerError::Json(_) => -32700,
            ServerError::Io(_) => -32020,
            ServerError::DataGouv(_) => -32010,
            ServerError::Address(_) | ServerError::Serialization(_) => -32603,
        };
        let message = match err {
            ServerError::InvalidMethod(method) => format!("Unknown method: {method}"),
            ServerError::UnknownTool(name) => format!("Unknown tool: {name}"),
            ServerError::InvalidRequest(message) | ServerError::InvalidParams(message) => message,
            other => other.to_string(),
        };
        Self {
            code,
            message,
            data: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown method: {0}")]
    InvalidMethod(String),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    DataGouv(#[from] DataGouvError),
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

fn parse_required_params<T>(method: &str, params: Option<Value>) -> ServerResult<T>
where
    T: DeserializeOwned,
{
    match params {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ServerError::InvalidParams(format!("{method}: {err}"))),
        None => Err(ServerError::InvalidParams(format!(
            "{method}: missing parameters"
        ))),
    }
}

fn parse_optional_params<T>(method: &str, params: Option<Value>) -> ServerResult<T>
where
    T: DeserializeOwned + Default,
{
    match params {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ServerError::InvalidParams(format!("{method}: {err}"))),
        None => Ok(T::default()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct InitializeParams {
    #[serde(default, rename = "protocolVersion")]
    protocol_version: Option<String>,
    #[serde(default, rename = "clientInfo")]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: &'static str,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
    capabilities: Value,
    instructions: &'static str,
}

impl InitializeResult {
    /// Echo the client's protocol revision when supported, else offer the newest.
    fn new(requested: Option<&str>) -> Self {
        let protocol_version = PROTOCOL_VERSIONS
            .iter()
            .copied()
            .find(|version| Some(*version) == requested)
            .unwrap_or(PROTOCOL_VERSIONS[0]);

        Self {
            protocol_version,
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: env!("CARGO_PKG_VERSION"),
            },
            capabilities: json!({
                "tools": {
                    "listChanged": false
                }
            }),
            instructions: "Read-only access to the data.gouv.fr open-data catalog: search datasets, \
                inspect resources, query tabular data, preview files and read usage metrics.",
        }
    }
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ListToolsParams {
    #[serde(default, rename = "cursor")]
    _cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ListToolsResult {
    tools: Vec<tools::ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use datagouv::DataGouvConfig;
    use datagouv_api::Endpoints;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer) -> Router {
        let base = server.uri();
        let config = DataGouvConfig::new().with_endpoints(Endpoints {
            catalog_api: format!("{base}/api"),
            site: format!("{base}/site"),
            tabular_api: format!("{base}/tabular/api"),
            metrics_api: format!("{base}/metric/api"),
        });
        let client = DataGouvClient::with_config(config).unwrap();
        DataGouvMcpServer::with_client(Arc::new(client)).router()
    }

    async fn post_mcp(app: Router, body: Value) -> (StatusCode, Value) {
        post_raw(app, body.to_string()).await
    }

    async fn post_raw(app: Router, body: String) -> (StatusCode, Value) {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn call(id: u64, tool: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        })
    }

    fn text_of(result: &Value) -> &str {
        result["result"]["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn health_reports_status_and_environment() {
        let server = MockServer::start().await;
        let request = HttpRequest::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app(&server).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "prod");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn initialize_negotiates_protocol_version() {
        let server = MockServer::start().await;
        let (status, body) = post_mcp(
            app(&server),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(body["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(body["result"]["capabilities"]["tools"].is_object());

        let (_, body) = post_mcp(
            app(&server),
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "initialize",
                "params": {"protocolVersion": "1999-01-01"}
            }),
        )
        .await;
        assert_eq!(body["result"]["protocolVersion"], PROTOCOL_VERSIONS[0]);
    }

    #[tokio::test]
    async fn notifications_are_accepted_without_body() {
        let server = MockServer::start().await;
        let (status, body) = post_mcp(
            app(&server),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn protocol_errors_use_jsonrpc_codes() {
        let server = MockServer::start().await;

        let (_, body) = post_mcp(
            app(&server),
            json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}),
        )
        .await;
        assert_eq!(body["error"]["code"], -32601);

        let (_, body) = post_raw(app(&server), "{not json".to_string()).await;
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());

        let (_, body) = post_mcp(app(&server), json!({"jsonrpc": "2.0", "id": 3})).await;
        assert_eq!(body["error"]["code"], -32600);

        let (_, body) = post_mcp(
            app(&server),
            json!([{"jsonrpc": "2.0", "id": 4, "method": "ping"}]),
        )
        .await;
        assert_eq!(body["error"]["code"], -32600);

        let (_, body) = post_mcp(app(&server), call(5, "drop_tables", json!({}))).await;
        assert_eq!(body["error"]["code"], -32602);

        let (_, body) =
            post_mcp(app(&server), json!({"jsonrpc": "2.0", "id": 6, "method": "ping"})).await;
        assert_eq!(body["result"], json!({}));
    }

    #[tokio::test]
    async fn tools_list_describes_every_tool() {
        let server = MockServer::start().await;
        let (_, body) = post_mcp(
            app(&server),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await;

        let tools = body["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        for tool in tools {
            assert_eq!(tool["inputSchema"]["type"], "object");
        }
    }

    #[tokio::test]
    async fn search_tool_renders_datasets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/1/datasets/"))
            .and(query_param("q", "transport"))
            .and(query_param("page_size", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "d1",
                    "title": "Horaires des bus",
                    "slug": "horaires-des-bus",
                    "description": "x".repeat(400),
                    "organization": {"name": "Ville de Brest"},
                    "tags": ["transport", {"name": "bus"}],
                    "resources": [{"id": "r1"}]
                }],
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_, body) = post_mcp(
            app(&server),
            call(1, "search_datasets", json!({"query": "transport", "page_size": 2})),
        )
        .await;

        assert!(body["result"]["isError"].is_null());
        let text = text_of(&body);
        assert!(text.starts_with("Found 3 dataset(s) for 'transport'"), "{text}");
        assert!(text.contains("1. Horaires des bus"));
        assert!(text.contains("Organization: Ville de Brest"));
        assert!(text.contains("Tags: transport, bus"));
        assert!(text.contains(&format!("{}...", "x".repeat(300))));
        assert!(text.contains("/site/datasets/horaires-des-bus/"));
        assert!(text.contains("use page=2"));
    }

    #[tokio::test]
    async fn upstream_failure_is_tool_error_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/1/datasets/missing/"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Dataset not found"})),
            )
            .mount(&server)
            .await;

        let (status, body) = post_mcp(
            app(&server),
            call(7, "get_dataset_info", json!({"dataset_id": "missing"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_null());
        assert_eq!(body["result"]["isError"], true);
        assert_eq!(
            text_of(&body),
            "Error fetching dataset missing: upstream returned 404: Dataset not found"
        );
    }

    #[tokio::test]
    async fn search_hint_on_last_addressable_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/1/datasets/"))
            .and(query_param("page", u32::MAX.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "d9", "title": "Fin de liste", "slug": "fin-de-liste"}],
                "total": 5_000_000_000u64
            })))
            .mount(&server)
            .await;

        let (_, body) = post_mcp(
            app(&server),
            call(1, "search_datasets", json!({"query": "eau", "page": u32::MAX, "page_size": 1})),
        )
        .await;

        assert!(body["result"]["isError"].is_null(), "{body}");
        let text = text_of(&body);
        assert!(text.contains("4294967295. Fin de liste"), "{text}");
        assert!(text.contains(&format!("use page={}", u32::MAX)));
    }

    #[tokio::test]
    async fn unknown_tool_arguments_are_invalid_params() {
        let server = MockServer::start().await;

        let (_, body) = post_mcp(
            app(&server),
            call(1, "get_dataset_info", json!({"dataset_id": "d1", "verbose": true})),
        )
        .await;

        assert_eq!(body["error"]["code"], -32602);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resource_info_includes_parent_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2/datasets/resources/r1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resource": {
                    "id": "r1",
                    "title": "communes.csv",
                    "format": "csv",
                    "filesize": 2048,
                    "extras": {"analysis:parsing:parsing_table": "abc"}
                },
                "dataset_id": "d1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/1/datasets/d1/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "d1", "title": "Communes"})),
            )
            .mount(&server)
            .await;

        let (_, body) = post_mcp(
            app(&server),
            call(1, "get_resource_info", json!({"resource_id": "r1"})),
        )
        .await;
        let text = text_of(&body);

        assert!(text.contains("Resource: communes.csv"));
        assert!(text.contains("Size: 2.0 KB"));
        assert!(text.contains("Dataset: Communes (d1)"));
        assert!(text.contains("Tabular API: available"));
    }

    #[tokio::test]
    async fn query_tool_renders_rows_and_rejects_bad_operator() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tabular/api/resources/r1/data/"))
            .and(query_param("dep__exact", "29"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"commune": "Brest", "population": 139000}],
                "meta": {"page": 1, "page_size": 20, "total": 1},
                "links": {"next": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_, body) = post_mcp(
            app(&server),
            call(
                1,
                "query_dataset_data",
                json!({"resource_id": "r1", "filter_column": "dep", "filter_value": "29"}),
            ),
        )
        .await;
        let text = text_of(&body);
        assert!(text.contains("(1 matching rows)"), "{text}");
        assert!(text.contains("Filter: dep exact '29'"));
        assert!(text.contains("Row 1:\n  commune: Brest\n  population: 139000"));

        let (_, body) = post_mcp(
            app(&server),
            call(
                2,
                "query_dataset_data",
                json!({
                    "resource_id": "r1",
                    "filter_column": "dep",
                    "filter_operator": "like",
                    "filter_value": "2%"
                }),
            ),
        )
        .await;
        assert_eq!(body["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn metrics_tool_validates_and_orders_months() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metric/api/datasets/data/"))
            .and(query_param("page_size", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"metric_month": "2024-02", "monthly_visit": 10, "monthly_download_resource": 1},
                    {"metric_month": "2024-01", "monthly_visit": 5, "monthly_download_resource": 2}
                ]
            })))
            .mount(&server)
            .await;

        let (_, body) = post_mcp(app(&server), call(1, "get_metrics", json!({}))).await;
        assert_eq!(body["error"]["code"], -32602);

        let (_, body) = post_mcp(
            app(&server),
            call(2, "get_metrics", json!({"dataset_id": "d1", "limit": 2})),
        )
        .await;
        let text = text_of(&body);
        let january = text.find("2024-01").unwrap();
        let february = text.find("2024-02").unwrap();
        assert!(january < february, "{text}");
    }

    #[tokio::test]
    async fn download_tool_previews_csv() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2/datasets/resources/r9/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resource": {
                    "id": "r9",
                    "title": "Export",
                    "format": "csv",
                    "url": format!("{}/files/export.csv", server.uri())
                },
                "dataset_id": "d1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/export.csv"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("nom\tvaleur\na\t1\nb\t2\nc\t3\n"),
            )
            .mount(&server)
            .await;

        let (_, body) = post_mcp(
            app(&server),
            call(1, "download_and_parse_resource", json!({"resource_id": "r9", "max_rows": 2})),
        )
        .await;
        let text = text_of(&body);

        assert!(text.contains("Format: csv"), "{text}");
        assert!(text.contains("Delimiter: '\\t'"));
        assert!(text.contains("Total rows: 3"));
        assert!(text.contains("Columns (2): nom, valeur"));
        assert!(text.contains("Showing 2 of 3 rows."));
    }

    #[tokio::test]
    async fn download_tool_hints_at_unknown_resource() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2/datasets/resources/gone/"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Resource not found"})),
            )
            .mount(&server)
            .await;

        let (_, body) = post_mcp(
            app(&server),
            call(1, "download_and_parse_resource", json!({"resource_id": "gone"})),
        )
        .await;

        assert_eq!(body["result"]["isError"], true);
        assert_eq!(
            text_of(&body),
            "Error downloading resource gone: upstream returned 404: Resource not found\n\
             Check the resource ID with list_dataset_resources."
        );
    }
}
