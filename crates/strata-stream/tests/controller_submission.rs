//! Submission and commit-path tests against a mock ingestion controller.
//!
//! The controller is a throwaway axum server bound to `127.0.0.1:0`, shut
//! down via oneshot when the test ends.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tokio::sync::oneshot;

use strata_core::commit::{commit_write, plan_ctas_write};
use strata_core::descriptor::{TableDescriptor, TableName};
use strata_core::error::Error;
use strata_core::handler::CommitProperties;
use strata_core::registry::HandlerRegistry;
use strata_stream::ingestion::{submit_supervisor_spec, SupervisorSpec};
use strata_stream::{properties, StreamingStorageHandler};

#[derive(Clone)]
struct ControllerState {
    status: StatusCode,
    body: &'static str,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

struct MockController {
    base_url: String,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockController {
    async fn spawn(status: StatusCode, body: &'static str) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = ControllerState {
            status,
            body,
            received: received.clone(),
        };

        let app = Router::new()
            .route("/supervisor", post(accept_spec))
            .route("/supervisor/:source/terminate", post(accept_terminate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock controller");
        let addr: SocketAddr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Self {
            base_url: format!("http://{addr}"),
            received,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/supervisor", self.base_url)
    }
}

impl Drop for MockController {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn accept_spec(
    State(state): State<ControllerState>,
    Json(spec): Json<serde_json::Value>,
) -> (StatusCode, &'static str) {
    state.received.lock().expect("lock").push(spec);
    (state.status, state.body)
}

async fn accept_terminate(State(state): State<ControllerState>) -> (StatusCode, &'static str) {
    (state.status, state.body)
}

fn streaming_table(endpoint: &str) -> TableDescriptor {
    TableDescriptor::builder(TableName::new("metrics", "events"))
        .column("ts", "timestamp")
        .column("v", "double")
        .property(properties::SOURCE_TOPIC, "events")
        .property(properties::SOURCE_BROKERS, "broker-1:9092")
        .property(properties::CONTROLLER_ENDPOINT, endpoint)
        .build()
}

#[tokio::test]
async fn accepted_submission_delivers_the_spec() {
    let controller = MockController::spawn(StatusCode::OK, "").await;
    let table = streaming_table(&controller.endpoint());

    let spec = SupervisorSpec::from_table(&table).expect("spec");
    submit_supervisor_spec(&controller.endpoint(), &spec)
        .await
        .expect("accepted");

    let received = controller.received.lock().expect("lock");
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0]["ioConfig"]["topic"],
        serde_json::json!("events")
    );
    assert_eq!(
        received[0]["dataSchema"]["timestampColumn"],
        serde_json::json!("ts")
    );
}

#[tokio::test]
async fn overloaded_controller_surfaces_status_and_body() {
    let controller = MockController::spawn(StatusCode::INTERNAL_SERVER_ERROR, "overload").await;
    let table = streaming_table(&controller.endpoint());

    let spec = SupervisorSpec::from_table(&table).expect("spec");
    let err = submit_supervisor_spec(&controller.endpoint(), &spec)
        .await
        .expect_err("rejected");

    match err {
        Error::RemoteSubmission { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "overload");
        }
        other => panic!("expected remote submission error, got {other}"),
    }
}

#[tokio::test]
async fn unreadable_rejection_body_is_reported_not_swallowed() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // A controller that advertises a longer body than it sends, then closes:
    // the status line parses but the body read fails.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nshort",
                )
                .await;
            let _ = stream.shutdown().await;
        }
    });

    let endpoint = format!("http://{addr}/supervisor");
    let table = streaming_table(&endpoint);
    let spec = SupervisorSpec::from_table(&table).expect("spec");
    let err = submit_supervisor_spec(&endpoint, &spec)
        .await
        .expect_err("rejected");

    match err {
        Error::RemoteSubmission { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("body unavailable"), "body: {body}");
        }
        other => panic!("expected remote submission error, got {other}"),
    }
}

#[tokio::test]
async fn commit_write_submits_through_the_handler() {
    let controller = MockController::spawn(StatusCode::OK, "").await;
    let handler = StreamingStorageHandler::new();
    let table = streaming_table(&controller.endpoint());

    commit_write(&handler, &table, &CommitProperties::new(), false)
        .await
        .expect("handler commit");

    assert_eq!(controller.received.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn commit_failure_performs_no_protocol_cleanup() {
    let controller =
        MockController::spawn(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;
    let handler = StreamingStorageHandler::new();
    let table = streaming_table(&controller.endpoint());

    let err = commit_write(&handler, &table, &CommitProperties::new(), true)
        .await
        .expect_err("controller down");
    assert!(matches!(err, Error::RemoteSubmission { status: 503, .. }));

    // One delivery attempt, no retries, no compensating requests.
    assert_eq!(controller.received.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn commit_without_endpoint_is_a_configuration_error() {
    let handler = StreamingStorageHandler::new();
    let table = TableDescriptor::builder(TableName::new("metrics", "events"))
        .column("ts", "timestamp")
        .property(properties::SOURCE_TOPIC, "events")
        .property(properties::SOURCE_BROKERS, "broker-1:9092")
        .build();

    let err = commit_write(&handler, &table, &CommitProperties::new(), false)
        .await
        .expect_err("no endpoint");
    assert!(matches!(err, Error::Configuration { .. }));
}

#[tokio::test]
async fn drop_hook_terminates_the_supervisor_best_effort() {
    use strata_core::handler::StorageHandler as _;

    let controller = MockController::spawn(StatusCode::OK, "").await;
    let handler = StreamingStorageHandler::new();
    let hook = handler.meta_hook().expect("streaming handler has a hook");
    let table = streaming_table(&controller.endpoint());

    hook.commit_drop_table(&table, true)
        .await
        .expect("drop succeeds");

    // An unreachable controller must not fail the drop either.
    let gone = streaming_table("http://127.0.0.1:1/supervisor");
    hook.commit_drop_table(&gone, true)
        .await
        .expect("best-effort termination");
}

#[test]
fn registered_handler_plans_the_engine_owned_ctas_path() {
    let mut registry = HandlerRegistry::new();
    registry
        .register(
            "streaming",
            Box::new(|| Arc::new(StreamingStorageHandler::new())),
        )
        .expect("register");

    let handler = registry.resolve("streaming").expect("resolve");
    let plan = plan_ctas_write(handler.as_ref());

    // Direct-insert CTAS: the engine compiles neither a create-table nor a
    // move task; commit routes through the handler.
    assert!(!plan.create_table_task);
    assert!(!plan.move_task);
    assert!(plan.handler_commit);
}
