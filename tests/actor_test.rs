//! Integration tests for actor resolution.

mod helpers;

use std::sync::Arc;

use serde_json::json;

use lantern_core::types::Request;
use lantern_plugin::Plugin;

#[tokio::test]
async fn test_flagged_request_resolves_bot_actor() {
    let kernel = helpers::kernel();
    helpers::install(&kernel, helpers::bot_actor_plugin());

    let anonymous = kernel
        .actor_from_request(Arc::new(Request::get("/")))
        .await
        .expect("anonymous");
    assert_eq!(anonymous, None);

    let bot = kernel
        .actor_from_request(Arc::new(Request::get("/?_bot=1")))
        .await
        .expect("bot");
    assert_eq!(bot, json!({"id": "bot"}).as_object().cloned());
}

#[tokio::test]
async fn test_upstream_actor_skips_plugins() {
    let kernel = helpers::bare_kernel();
    let calls = helpers::Calls::default();
    let counter = calls.clone();
    helpers::install(
        &kernel,
        Plugin::new("counting").sync_hook("actor_from_request", &[], move |_| {
            counter.hit();
            Ok(Some(json!({"id": "plugin"}).into()))
        }),
    );

    let upstream = json!({"id": "upstream"}).as_object().cloned().expect("object");
    let request = Request::get("/?_bot=1").with_actor(upstream.clone());
    let actor = kernel
        .actor_from_request(Arc::new(request))
        .await
        .expect("actor");

    assert_eq!(actor, Some(upstream));
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_suspending_resolver_and_first_non_null() {
    let kernel = helpers::bare_kernel();
    helpers::install(
        &kernel,
        Plugin::new("token").async_hook("actor_from_request", &["request"], |args| async move {
            tokio::task::yield_now().await;
            let token = args.request().and_then(|r| r.header("authorization").map(str::to_string));
            Ok(token.map(|t| json!({"id": "token", "token": t}).into()))
        }),
    );
    helpers::install(&kernel, helpers::bot_actor_plugin());

    let both = Request::get("/?_bot=1").with_header("Authorization", "Bearer abc");
    let actor = kernel
        .actor_from_request(Arc::new(both))
        .await
        .expect("actor")
        .expect("resolved");
    assert_eq!(actor.get("id"), Some(&json!("token")));

    let bot_only = kernel
        .actor_from_request(Arc::new(Request::get("/?_bot=1")))
        .await
        .expect("actor")
        .expect("resolved");
    assert_eq!(bot_only.get("id"), Some(&json!("bot")));
}

#[tokio::test]
async fn test_resolved_actor_reaches_magic_parameters() {
    let kernel = helpers::kernel();
    helpers::install(&kernel, helpers::bot_actor_plugin());

    let unresolved = Request::get("/fixtures/q?_bot=1");
    assert_eq!(
        kernel.resolve_magic_parameter("_actor_id", &unresolved).await.expect("before"),
        None
    );

    let request = kernel.resolve_request_actor(unresolved).await.expect("resolve");
    assert_eq!(request.actor, json!({"id": "bot"}).as_object().cloned());
    assert_eq!(
        kernel.resolve_magic_parameter("_actor_id", &request).await.expect("after"),
        Some(json!("bot"))
    );

    let anonymous = kernel
        .resolve_request_actor(Request::get("/fixtures/q"))
        .await
        .expect("anonymous");
    assert_eq!(anonymous.actor, None);
}

#[tokio::test]
async fn test_resolve_keeps_upstream_actor() {
    let kernel = helpers::kernel();
    helpers::install(&kernel, helpers::bot_actor_plugin());

    let upstream = json!({"id": "upstream"}).as_object().cloned().expect("object");
    let request = kernel
        .resolve_request_actor(Request::get("/?_bot=1").with_actor(upstream.clone()))
        .await
        .expect("resolve");
    assert_eq!(request.actor, Some(upstream));
}
