//! Integration tests for seam-rpc.
//!
//! Each test spins up a real axum server on a loopback port and drives it
//! with a real [`SeamClient`], so the full path is exercised: codec →
//! framer → HTTP → framer → codec → handler and back.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use seam_rpc::client::{
    RequestContext, RequestInterceptor, ResponseContext, ResponseInterceptor,
};
use seam_rpc::server::{ErrorContext, ErrorObserver};
use seam_rpc::{Attachment, HandlerError, RouterTable, SeamClient, SeamError, SeamSpace, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn spawn_server(space: SeamSpace) -> String {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, space.into_router()).await.unwrap();
    });
    format!("http://{}", addr)
}

fn users_space() -> SeamSpace {
    SeamSpace::new().router(
        RouterTable::new("users")
            .function("getUsers", |_args, _ctx| async {
                Ok(Value::from_json(serde_json::json!([
                    {"name": "john"},
                    {"name": "jane"},
                ])))
            })
            .function("createUser", |args: Vec<Value>, _ctx| async move {
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| HandlerError::msg("name required"))?;
                let avatar_len = args
                    .get(1)
                    .and_then(Value::as_attachment)
                    .map(Attachment::len)
                    .unwrap_or(0);
                Ok(Value::from_json(serde_json::json!({
                    "name": name,
                    "avatarBytes": avatar_len,
                })))
            })
            .function("deleteUser", |_args, _ctx| async {
                Err(HandlerError::msg("user not found"))
            }),
    )
}

#[tokio::test]
async fn test_json_only_call_round_trip() {
    let base = spawn_server(users_space()).await;
    let client = SeamClient::builder(&base).build();

    let result = client.call("users", "getUsers", vec![]).await.unwrap();

    let users = result.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].get("name").and_then(Value::as_str), Some("john"));
}

#[tokio::test]
async fn test_unknown_function_is_not_found() {
    let base = spawn_server(users_space()).await;
    let client = SeamClient::builder(&base).build();

    let error = client.call("users", "missingFn", vec![]).await.unwrap_err();
    assert!(matches!(error, SeamError::Status { status: 404, .. }));

    let error = client.call("nope", "getUsers", vec![]).await.unwrap_err();
    assert!(matches!(error, SeamError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_handler_rejection_round_trip() {
    let base = spawn_server(users_space()).await;
    let client = SeamClient::builder(&base).build();

    let error = client.call("users", "deleteUser", vec![]).await.unwrap_err();
    match error {
        SeamError::Api(message) => assert_eq!(message, "user not found"),
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mixed_attachment_call() {
    let base = spawn_server(users_space()).await;
    let client = SeamClient::builder(&base).build();

    let result = client
        .call(
            "users",
            "createUser",
            vec![
                Value::from("john"),
                Value::from(
                    Attachment::new(vec![0u8; 10])
                        .with_file_name("avatar.png")
                        .with_media_type("image/png"),
                ),
            ],
        )
        .await
        .unwrap();

    assert_eq!(result.get("name").and_then(Value::as_str), Some("john"));
    assert_eq!(result.get("avatarBytes").and_then(Value::as_i64), Some(10));
}

#[tokio::test]
async fn test_attachment_in_result() {
    let space = SeamSpace::new().router(RouterTable::new("files").function(
        "download",
        |_args, _ctx| async {
            let mut map = std::collections::BTreeMap::new();
            map.insert("name".to_string(), Value::from("report"));
            map.insert(
                "content".to_string(),
                Value::from(
                    Attachment::new(vec![1u8, 2, 3, 4])
                        .with_file_name("report.pdf")
                        .with_media_type("application/pdf"),
                ),
            );
            Ok(Value::Object(map))
        },
    ));

    let base = spawn_server(space).await;
    let client = SeamClient::builder(&base).build();

    let result = client.call("files", "download", vec![]).await.unwrap();

    assert_eq!(result.get("name").and_then(Value::as_str), Some("report"));
    let content = result.get("content").and_then(Value::as_attachment).unwrap();
    assert_eq!(content.data().as_ref(), &[1, 2, 3, 4]);
    assert_eq!(content.file_name(), Some("report.pdf"));
    assert_eq!(content.media_type(), Some("application/pdf"));
}

#[tokio::test]
async fn test_unsupported_content_type_is_rejected() {
    let base = spawn_server(users_space()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/users/getUsers", base))
        .header("content-type", "text/plain")
        .body("[]")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 415);
}

#[tokio::test]
async fn test_not_found_body_is_empty() {
    let base = spawn_server(users_space()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/users/missingFn", base))
        .header("content-type", "application/json")
        .body("[]")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejection_body_shape() {
    let base = spawn_server(users_space()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/users/deleteUser", base))
        .header("content-type", "application/json")
        .body("[]")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({"error": "user not found"}));
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let base = spawn_server(users_space()).await;
    let client = SeamClient::builder(&base).build();

    let ok_call = client.call("users", "getUsers", vec![]);
    let failing_call = client.call("users", "deleteUser", vec![]);

    let (ok, failed) = tokio::join!(ok_call, failing_call);

    assert!(ok.is_ok());
    assert!(matches!(failed, Err(SeamError::Api(_))));
}

#[tokio::test]
async fn test_request_interceptor_mutation_reaches_server() {
    struct AddToken;

    #[async_trait]
    impl RequestInterceptor for AddToken {
        async fn before_send(&self, ctx: &mut RequestContext<'_>) -> seam_rpc::Result<()> {
            ctx.headers.insert("x-token", "secret".parse().unwrap());
            Ok(())
        }
    }

    let space = SeamSpace::new().router(RouterTable::new("auth").function(
        "whoami",
        |_args, ctx: seam_rpc::CallContext| async move {
            let token = ctx
                .headers()
                .get("x-token")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| HandlerError::msg("missing token"))?;
            Ok(Value::from(token))
        },
    ));

    let base = spawn_server(space).await;
    let client = SeamClient::builder(&base)
        .request_interceptor(AddToken)
        .build();

    let result = client.call("auth", "whoami", vec![]).await.unwrap();
    assert_eq!(result.as_str(), Some("secret"));
}

#[tokio::test]
async fn test_response_interceptor_observes_decoded_result() {
    struct Recorder {
        seen: Arc<Mutex<Vec<(String, String, usize, Value)>>>,
    }

    #[async_trait]
    impl ResponseInterceptor for Recorder {
        async fn after_receive(&self, ctx: &ResponseContext<'_>) -> seam_rpc::Result<()> {
            self.seen.lock().unwrap().push((
                ctx.router_name.to_string(),
                ctx.func_name.to_string(),
                ctx.args.len(),
                ctx.result.clone(),
            ));
            Ok(())
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let base = spawn_server(users_space()).await;
    let client = SeamClient::builder(&base)
        .response_interceptor(Recorder { seen: seen.clone() })
        .build();

    let result = client
        .call("users", "createUser", vec![Value::from("john")])
        .await
        .unwrap();

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (router, func, arg_count, observed) = &seen[0];
        assert_eq!(router, "users");
        assert_eq!(func, "createUser");
        assert_eq!(*arg_count, 1);
        assert_eq!(observed, &result);
    }

    // A rejected call never reaches the response interceptors.
    let _ = client.call("users", "deleteUser", vec![]).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failing_interceptor_aborts_before_network() {
    struct Reject;

    #[async_trait]
    impl RequestInterceptor for Reject {
        async fn before_send(&self, _ctx: &mut RequestContext<'_>) -> seam_rpc::Result<()> {
            Err(SeamError::Protocol("interceptor said no".into()))
        }
    }

    // Deliberately unroutable base URL: if the interceptor aborts first,
    // the address is never contacted.
    let client = SeamClient::builder("http://127.0.0.1:1")
        .request_interceptor(Reject)
        .build();

    let error = client.call("users", "getUsers", vec![]).await.unwrap_err();
    assert!(matches!(error, SeamError::Protocol(_)));
}

#[tokio::test]
async fn test_observer_sees_handler_rejections() {
    struct Recorder {
        seen: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl ErrorObserver for Recorder {
        fn on_api_error(&self, error: &HandlerError, ctx: &ErrorContext) {
            self.seen.lock().unwrap().push((
                ctx.router_path.clone(),
                ctx.function_name.clone(),
                error.message().to_string(),
            ));
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let space = users_space().observer(Recorder { seen: seen.clone() });

    let base = spawn_server(space).await;
    let client = SeamClient::builder(&base).build();

    client.call("users", "getUsers", vec![]).await.unwrap();
    let _ = client.call("users", "deleteUser", vec![]).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0],
        (
            "/users".to_string(),
            "deleteUser".to_string(),
            "user not found".to_string()
        )
    );
}

#[tokio::test]
async fn test_zero_attachment_response_uses_json_framing() {
    let base = spawn_server(users_space()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/users/getUsers", base))
        .header("content-type", "application/json")
        .body("[]")
        .send()
        .await
        .unwrap();

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("application/json"));

    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert!(body.get("result").is_some());
}
