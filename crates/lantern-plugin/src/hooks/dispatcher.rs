//! Hook dispatcher: calls implementations in order and folds their results.
//!
//! Implementations always run one after another in dispatch order and their
//! results are recorded by position, so a suspending implementation never
//! lets a later one jump ahead. Suspension only yields the current task; other
//! requests keep running.
//!
//! Failures raised by an implementation propagate to the caller unchanged.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;

use super::context::CallContext;
use super::definitions::HookValue;
use super::policy;
use super::spec::{AggregationPolicy, HookSpec, HookSpecRegistry};
use crate::registry::PluginRegistry;

/// Folded result of one dispatch.
#[derive(Debug, Clone)]
pub enum Aggregated {
    /// Winning value of a first-result hook, if any.
    Single(Option<HookValue>),
    /// Decision of a decisive-chain hook, if any implementation decided.
    Decision(Option<bool>),
    /// Flattened results of a collecting hook.
    List(Vec<HookValue>),
    /// Merged mapping of a merge-dict hook.
    Map(Map<String, Value>),
    /// A broadcast hook finished.
    Unit,
}

impl Aggregated {
    /// Winning value, for first-result hooks.
    pub fn into_single(self) -> Option<HookValue> {
        match self {
            Self::Single(v) => v,
            Self::Decision(d) => d.map(HookValue::Bool),
            _ => None,
        }
    }

    /// Decision, for decisive-chain hooks.
    pub fn into_decision(self) -> Option<bool> {
        match self {
            Self::Decision(d) => d,
            _ => None,
        }
    }

    /// Items, for collecting hooks.
    pub fn into_list(self) -> Vec<HookValue> {
        match self {
            Self::List(items) => items,
            _ => Vec::new(),
        }
    }

    /// Mapping, for merge-dict hooks.
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            Self::Map(map) => map,
            _ => Map::new(),
        }
    }
}

/// Dispatches hook calls to registered implementations.
#[derive(Debug)]
pub struct HookDispatcher {
    specs: Arc<HookSpecRegistry>,
    plugins: Arc<PluginRegistry>,
}

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new(specs: Arc<HookSpecRegistry>, plugins: Arc<PluginRegistry>) -> Self {
        Self { specs, plugins }
    }

    /// Calls `hook` and folds the results with its declared policy.
    ///
    /// Collecting hooks are not de-duplicated and merge-dict hooks get no
    /// local mapping; use [`HookDispatcher::call_unique`] and
    /// [`HookDispatcher::call_merged`] for those.
    pub async fn call(&self, hook: &str, context: CallContext) -> AppResult<Aggregated> {
        let spec = self.prepare(hook, &context)?;
        let policy = spec.policy();
        let results = self
            .invoke(&spec, &context, policy == AggregationPolicy::DecisiveChain)
            .await?;

        Ok(match policy {
            AggregationPolicy::FirstNonNull => Aggregated::Single(policy::first_non_null(results)),
            AggregationPolicy::DecisiveChain => {
                Aggregated::Decision(policy::decisive(hook, results)?)
            }
            AggregationPolicy::CollectFlatten => {
                let no_key: Option<fn(&HookValue) -> Option<String>> = None;
                Aggregated::List(policy::collect_flatten(results, no_key))
            }
            AggregationPolicy::MergeDict => {
                Aggregated::Map(policy::merge_dict(hook, results, None)?)
            }
            AggregationPolicy::Broadcast => Aggregated::Unit,
        })
    }

    /// Calls a collecting hook, keeping only the first item per identity.
    pub async fn call_unique<K>(
        &self,
        hook: &str,
        context: CallContext,
        key: K,
    ) -> AppResult<Vec<HookValue>>
    where
        K: Fn(&HookValue) -> Option<String>,
    {
        let spec = self.prepare(hook, &context)?;
        expect_policy(&spec, AggregationPolicy::CollectFlatten)?;
        let results = self.invoke(&spec, &context, false).await?;
        Ok(policy::collect_flatten(results, Some(key)))
    }

    /// Calls a merge-dict hook, merging `local` last.
    pub async fn call_merged(
        &self,
        hook: &str,
        context: CallContext,
        local: Option<&Map<String, Value>>,
    ) -> AppResult<Map<String, Value>> {
        let spec = self.prepare(hook, &context)?;
        expect_policy(&spec, AggregationPolicy::MergeDict)?;
        let results = self.invoke(&spec, &context, false).await?;
        policy::merge_dict(hook, results, local)
    }

    /// Resolves the spec and checks the supplied argument names.
    fn prepare(&self, hook: &str, context: &CallContext) -> AppResult<Arc<HookSpec>> {
        self.specs.seal();
        let spec = self.specs.lookup(hook)?;
        if let Some(unknown) = context.keys().find(|k| !spec.accepts(k)) {
            return Err(AppError::validation(format!(
                "Hook '{hook}' does not take an argument named '{unknown}'"
            )));
        }
        Ok(spec)
    }

    /// Runs implementations sequentially, recording results by position.
    async fn invoke(
        &self,
        spec: &HookSpec,
        context: &CallContext,
        stop_at_first: bool,
    ) -> AppResult<Vec<Option<HookValue>>> {
        let implementations = self
            .plugins
            .implementations_for(spec.name(), spec.defaults_last());

        debug!(
            hook = %spec.name(),
            implementations = implementations.len(),
            "Dispatching hook"
        );

        let mut results = Vec::with_capacity(implementations.len());
        for implementation in implementations {
            let args = context.project(implementation.handler.argnames());
            let result = implementation.handler.call(args).await?;
            let decided = result.as_ref().is_some_and(|v| !v.is_null());

            debug!(
                hook = %spec.name(),
                plugin = %implementation.plugin,
                kind = ?implementation.handler.kind(),
                answered = decided,
                "Implementation returned"
            );

            results.push(result);
            if stop_at_first && decided {
                break;
            }
        }
        Ok(results)
    }

    /// Returns the spec registry.
    pub fn specs(&self) -> &Arc<HookSpecRegistry> {
        &self.specs
    }

    /// Returns the plugin registry.
    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }
}

fn expect_policy(spec: &HookSpec, expected: AggregationPolicy) -> AppResult<()> {
    if spec.policy() == expected {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Hook '{}' uses {:?}, not {:?}",
            spec.name(),
            spec.policy(),
            expected
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::registry::Plugin;
    use lantern_core::error::ErrorKind;

    fn dispatcher() -> HookDispatcher {
        HookDispatcher::new(
            Arc::new(HookSpecRegistry::with_builtin_hooks()),
            Arc::new(PluginRegistry::new()),
        )
    }

    fn register(d: &HookDispatcher, plugin: Plugin) {
        d.plugins().register(plugin, d.specs()).expect("register");
    }

    #[tokio::test]
    async fn test_unknown_hook() {
        let err = dispatcher()
            .call("nope", CallContext::new())
            .await
            .expect_err("unknown");
        assert_eq!(err.kind, ErrorKind::UnknownHook);
    }

    #[tokio::test]
    async fn test_unrecognised_argument_is_rejected() {
        let err = dispatcher()
            .call("startup", CallContext::new().with("request", "x"))
            .await
            .expect_err("bad arg");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_implementation_sees_only_its_arguments() {
        let d = dispatcher();
        register(
            &d,
            Plugin::new("p").sync_hook("extra_template_vars", &["view_name"], |args| {
                assert!(!args.contains("database"));
                Ok(Some(serde_json::json!({"view_name": args.str("view_name")}).into()))
            }),
        );
        let map = d
            .call(
                "extra_template_vars",
                CallContext::new()
                    .with("view_name", "table")
                    .with("database", "fixtures"),
            )
            .await
            .expect("call")
            .into_map();
        assert_eq!(map.get("view_name"), Some(&serde_json::json!("table")));
    }

    #[tokio::test]
    async fn test_results_keep_registration_order_across_suspension() {
        let d = dispatcher();
        register(
            &d,
            Plugin::new("slow").async_hook("menu_links", &[], |_| async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(Some("slow".into()))
            }),
        );
        register(
            &d,
            Plugin::new("fast").sync_hook("menu_links", &[], |_| Ok(Some("fast".into()))),
        );
        let items = d
            .call("menu_links", CallContext::new())
            .await
            .expect("call")
            .into_list();
        let names: Vec<&str> = items
            .iter()
            .filter_map(|v| v.as_json().and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_first_non_null_does_not_short_circuit() {
        let d = dispatcher();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        register(
            &d,
            Plugin::new("a").sync_hook("actor_from_request", &[], |_| {
                Ok(Some(serde_json::json!({"id": "a"}).into()))
            }),
        );
        register(
            &d,
            Plugin::new("b").sync_hook("actor_from_request", &[], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(serde_json::json!({"id": "b"}).into()))
            }),
        );
        let winner = d
            .call("actor_from_request", CallContext::new())
            .await
            .expect("call")
            .into_single()
            .expect("winner");
        assert_eq!(winner.as_json(), Some(&serde_json::json!({"id": "a"})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decisive_chain_stops_at_first_decision() {
        let d = dispatcher();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        register(
            &d,
            Plugin::new("abstains").sync_hook("permission_allowed", &[], |_| Ok(None)),
        );
        register(
            &d,
            Plugin::new("allows").sync_hook("permission_allowed", &[], |_| Ok(Some(true.into()))),
        );
        register(
            &d,
            Plugin::new("denies").sync_hook("permission_allowed", &[], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(false.into()))
            }),
        );
        let decision = d
            .call("permission_allowed", CallContext::new())
            .await
            .expect("call")
            .into_decision();
        assert_eq!(decision, Some(true));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_implementation_errors_propagate() {
        let d = dispatcher();
        register(
            &d,
            Plugin::new("broken").sync_hook("startup", &[], |_| Err(AppError::plugin("boom"))),
        );
        let err = d
            .call("startup", CallContext::new())
            .await
            .expect_err("propagates");
        assert_eq!(err.message, "boom");
    }

    #[tokio::test]
    async fn test_registration_changes_seen_by_next_call() {
        let d = dispatcher();
        register(
            &d,
            Plugin::new("temp").sync_hook("menu_links", &[], |_| Ok(Some("x".into()))),
        );
        assert_eq!(d.call("menu_links", CallContext::new()).await.expect("call").into_list().len(), 1);
        d.plugins().unregister("temp").expect("unregister");
        assert!(d.call("menu_links", CallContext::new()).await.expect("call").into_list().is_empty());
    }

    #[tokio::test]
    async fn test_call_unique_requires_collecting_hook() {
        let err = dispatcher()
            .call_unique("startup", CallContext::new(), |_| None)
            .await
            .expect_err("wrong policy");
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
