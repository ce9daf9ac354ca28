//! Remote catalog against an in-process MCP server.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use orpheus_tools::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeCatalog {
    seen_auth: Mutex<Vec<Option<String>>>,
    seen_sessions: Mutex<Vec<Option<String>>>,
    use_event_stream: bool,
    cycle_cursors: bool,
    list_calls: Mutex<usize>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle(
    State(catalog): State<Arc<FakeCatalog>>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    catalog
        .seen_auth
        .lock()
        .unwrap()
        .push(header_value(&headers, "authorization"));

    let method = request["method"].as_str().unwrap_or_default().to_string();
    if method != "initialize" {
        catalog
            .seen_sessions
            .lock()
            .unwrap()
            .push(header_value(&headers, "mcp-session-id"));
    }

    let id = request["id"].clone();
    let result = match method.as_str() {
        "initialize" => json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "fake", "version": "0.0.1"}
        }),
        "notifications/initialized" => return StatusCode::ACCEPTED.into_response(),
        "tools/list" => {
            *catalog.list_calls.lock().unwrap() += 1;
            let cursor = request["params"]["cursor"].as_str();
            if catalog.cycle_cursors {
                let next = if cursor == Some("A") { "B" } else { "A" };
                json!({"tools": [], "nextCursor": next})
            } else {
                match cursor {
                    None => json!({
                        "tools": [{
                            "name": "list_repositories",
                            "description": "List repositories for the user",
                            "inputSchema": {"type": "object", "properties": {"owner": {"type": "string"}}}
                        }],
                        "nextCursor": "page-2"
                    }),
                    Some("page-2") => json!({
                        "tools": [{"name": "create_issue", "description": "Open an issue", "inputSchema": {}}]
                    }),
                    Some(_) => json!({"tools": []}),
                }
            }
        }
        "tools/call" => {
            let name = request["params"]["name"].as_str().unwrap_or_default();
            if name == "create_issue" {
                json!({"content": [{"type": "text", "text": "repository is archived"}], "isError": true})
            } else {
                let owner = request["params"]["arguments"]["owner"].as_str().unwrap_or("nobody");
                json!({"content": [{"type": "text", "text": format!("{}/orpheus", owner)}]})
            }
        }
        _ => {
            let body = json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}});
            return Json(body).into_response();
        }
    };

    let body = json!({"jsonrpc": "2.0", "id": id, "result": result});
    let mut response = if catalog.use_event_stream {
        (
            [(header::CONTENT_TYPE, "text/event-stream")],
            format!("event: message\ndata: {}\n\n", body),
        )
            .into_response()
    } else {
        Json(body).into_response()
    };

    if method == "initialize" {
        response
            .headers_mut()
            .insert("mcp-session-id", "session-42".parse().unwrap());
    }
    response
}

async fn spawn_catalog(catalog: Arc<FakeCatalog>) -> String {
    let app = Router::new()
        .route("/mcp/", post(handle))
        .with_state(catalog);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/mcp/", addr)
}

#[tokio::test]
async fn test_fetch_descriptors_follows_pagination() {
    let catalog = Arc::new(FakeCatalog::default());
    let url = spawn_catalog(Arc::clone(&catalog)).await;

    let source = RemoteCatalogSource::new(
        RemoteCatalogConfig::new("github", url).with_bearer_token(Some("secret".to_string())),
    );
    let tools = source.fetch_descriptors().await.unwrap();

    let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["list_repositories", "create_issue"]);
    assert!(tools.iter().all(|t| t.origin() == "github"));
    assert_eq!(tools[1].input_schema()["type"], "object");

    let auth = catalog.seen_auth.lock().unwrap().clone();
    assert!(auth.iter().all(|a| a.as_deref() == Some("Bearer secret")));

    let sessions = catalog.seen_sessions.lock().unwrap().clone();
    assert!(!sessions.is_empty());
    assert!(sessions.iter().all(|s| s.as_deref() == Some("session-42")));
}

#[tokio::test]
async fn test_remote_invocation_success_and_error() {
    let catalog = Arc::new(FakeCatalog::default());
    let url = spawn_catalog(catalog).await;

    let sources: Vec<Box<dyn ToolSource>> = vec![Box::new(RemoteCatalogSource::new(
        RemoteCatalogConfig::new("github", url),
    ))];
    let build = ToolRegistry::build(sources, CollisionPolicy::KeepFirst).await;
    assert!(build.diagnostics.is_empty());

    let output = build
        .registry
        .invoke("list_repositories", json!({"owner": "octo"}))
        .await
        .unwrap();
    assert_eq!(output, "octo/orpheus");

    let err = build
        .registry
        .invoke("create_issue", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Remote(ref text) if text == "repository is archived"));
}

#[tokio::test]
async fn test_event_stream_responses() {
    let catalog = Arc::new(FakeCatalog {
        use_event_stream: true,
        ..FakeCatalog::default()
    });
    let url = spawn_catalog(catalog).await;

    let source = RemoteCatalogSource::new(RemoteCatalogConfig::new("github", url));
    let tools = source.fetch_descriptors().await.unwrap();
    assert_eq!(tools.len(), 2);
}

#[tokio::test]
async fn test_anonymous_connection_sends_no_auth_header() {
    let catalog = Arc::new(FakeCatalog::default());
    let url = spawn_catalog(Arc::clone(&catalog)).await;

    let source = RemoteCatalogSource::new(RemoteCatalogConfig::new("github", url));
    source.fetch_descriptors().await.unwrap();

    let auth = catalog.seen_auth.lock().unwrap().clone();
    assert!(auth.iter().all(Option::is_none));
}

#[tokio::test]
async fn test_cycling_cursors_end_the_listing() {
    let catalog = Arc::new(FakeCatalog {
        cycle_cursors: true,
        ..FakeCatalog::default()
    });
    let url = spawn_catalog(Arc::clone(&catalog)).await;

    let source = RemoteCatalogSource::new(RemoteCatalogConfig::new("github", url));
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        source.fetch_descriptors(),
    )
    .await
    .expect("listing should stop on a repeated cursor");

    let err = result.unwrap_err();
    assert_eq!(err.source_name, "github");
    assert!(err.reason.contains("repeated cursor 'A'"), "{}", err.reason);
    assert_eq!(*catalog.list_calls.lock().unwrap(), 3);
}

#[tokio::test]
async fn test_non_object_arguments_are_rejected_locally() {
    let catalog = Arc::new(FakeCatalog::default());
    let url = spawn_catalog(Arc::clone(&catalog)).await;

    let source = RemoteCatalogSource::new(RemoteCatalogConfig::new("github", url));
    let tools = source.fetch_descriptors().await.unwrap();
    let list_repositories = tools.iter().find(|t| t.name() == "list_repositories").unwrap();

    let err = list_repositories.invoke(json!(["octo"])).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments(_)));
}
