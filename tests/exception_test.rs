//! Integration tests for the error, forbidden and CSRF hooks.

mod helpers;

use std::sync::Arc;

use serde_json::Value;

use lantern_core::error::{AppError, ErrorKind};
use lantern_core::types::{Request, Response};
use lantern_plugin::Plugin;

fn request() -> Option<Arc<Request>> {
    Some(Arc::new(Request::get("/fixtures/boom")))
}

#[tokio::test]
async fn test_unhandled_error_is_returned_unchanged() {
    let kernel = helpers::kernel();
    let err = kernel
        .handle_exception(request(), AppError::internal("database exploded"))
        .await
        .expect_err("nobody handles it");
    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(err.message, "database exploded");

    let response = Response::from_error(&err);
    assert_eq!(response.status, 500);
    assert!(!response.text_body().contains("exploded"));
}

#[tokio::test]
async fn test_handler_response_wins() {
    let kernel = helpers::kernel();
    helpers::install(
        &kernel,
        Plugin::new("pretty-errors").sync_hook("handle_exception", &["exception", "request"], |args| {
            let err = args.exception().ok_or_else(|| AppError::internal("no exception"))?;
            let path = args.request().map(|r| r.path.clone()).unwrap_or_default();
            Ok(Some(
                Response::html(format!("<h1>{}</h1><p>{path}</p>", err.kind))
                    .with_status(err.status_code())
                    .into(),
            ))
        }),
    );

    let response = kernel
        .handle_exception(request(), AppError::not_found("Table not found"))
        .await
        .expect("handled");
    assert_eq!(response.status, 404);
    assert_eq!(response.text_body(), "<h1>NOT_FOUND</h1><p>/fixtures/boom</p>");
}

#[tokio::test]
async fn test_broken_handler_never_masks_original_error() {
    let kernel = helpers::kernel();
    let calls = helpers::Calls::default();
    let counter = calls.clone();
    helpers::install(
        &kernel,
        Plugin::new("broken-handler").sync_hook("handle_exception", &[], move |_| {
            counter.hit();
            Err(AppError::plugin("handler bug"))
        }),
    );

    let err = kernel
        .handle_exception(request(), AppError::validation("bad _size"))
        .await
        .expect_err("original error");
    assert_eq!(calls.count(), 1);
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "bad _size");
}

#[tokio::test]
async fn test_forbidden_default_and_override() {
    let kernel = helpers::kernel();
    let req = Arc::new(Request::get("/fixtures"));

    let response = kernel.forbidden(req.clone(), "Permission denied").await.expect("default");
    assert_eq!(response.status, 403);
    let body: Value = serde_json::from_str(&response.text_body()).expect("json");
    assert_eq!(body["error"], "Permission denied");

    helpers::install(
        &kernel,
        Plugin::new("login-redirect").sync_hook("forbidden", &["message"], |args| {
            let message = args.str("message").unwrap_or_default().to_string();
            Ok(Some(
                Response::text(message)
                    .with_status(302)
                    .with_header("location", "/-/login")
                    .into(),
            ))
        }),
    );
    let response = kernel.forbidden(req, "Permission denied").await.expect("override");
    assert_eq!(response.status, 302);
    assert_eq!(response.header("location"), Some("/-/login"));
}

#[tokio::test]
async fn test_skip_csrf_defaults_to_false() {
    let kernel = helpers::kernel();
    let api = Arc::new(Request::new("POST", "/-/api/insert"));
    assert!(!kernel.skip_csrf(api.clone()).await.expect("default"));

    helpers::install(
        &kernel,
        Plugin::new("api-csrf").sync_hook("skip_csrf", &["request"], |args| {
            let is_api = args.request().is_some_and(|r| r.path.starts_with("/-/api/"));
            Ok(is_api.then(|| true.into()))
        }),
    );
    assert!(kernel.skip_csrf(api).await.expect("api"));
    assert!(!kernel
        .skip_csrf(Arc::new(Request::new("POST", "/fixtures/-/query")))
        .await
        .expect("form"));
}

#[tokio::test]
async fn test_skip_csrf_false_never_vetoes_true() {
    let kernel = helpers::kernel();
    helpers::install(
        &kernel,
        Plugin::new("strict-csrf").sync_hook("skip_csrf", &[], |_| Ok(Some(false.into()))),
    );
    helpers::install(
        &kernel,
        Plugin::new("api-csrf").sync_hook("skip_csrf", &[], |_| Ok(Some(true.into()))),
    );
    let req = Arc::new(Request::new("POST", "/-/api/insert"));
    assert!(kernel.skip_csrf(req).await.expect("any skips"));
}

#[tokio::test]
async fn test_skip_csrf_rejects_non_bool_answer() {
    let kernel = helpers::kernel();
    helpers::install(
        &kernel,
        Plugin::new("confused-csrf").sync_hook("skip_csrf", &[], |_| Ok(Some("yes".into()))),
    );
    let req = Arc::new(Request::new("POST", "/-/api/insert"));
    let err = kernel.skip_csrf(req).await.expect_err("not a bool");
    assert_eq!(err.kind, ErrorKind::Plugin);
}
