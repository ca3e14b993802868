//! Hook specifications, the declared extension points.
//!
//! A spec names a hook, the arguments it recognises and how the results of
//! its implementations are combined. Specs are declared at process start and
//! the registry is sealed on the first dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;

use super::definitions::HookPoint;

/// How the results of a hook's implementations are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationPolicy {
    /// Every implementation runs; the first non-null result wins.
    FirstNonNull,
    /// Implementations run until one returns a boolean; the rest are skipped.
    DecisiveChain,
    /// Every non-null result is flattened into one ordered list.
    CollectFlatten,
    /// Mapping results are deep-merged left to right.
    MergeDict,
    /// Every implementation runs for its side effects; results are discarded.
    Broadcast,
}

/// Declaration of one extension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSpec {
    name: String,
    arguments: Vec<String>,
    policy: AggregationPolicy,
    defaults_last: bool,
}

impl HookSpec {
    /// Creates a spec.
    pub fn new(name: impl Into<String>, arguments: &[&str], policy: AggregationPolicy) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            policy,
            defaults_last: false,
        }
    }

    /// Marks the hook as override-sensitive: built-in plugins are consulted
    /// only after third-party plugins.
    pub fn with_defaults_last(mut self) -> Self {
        self.defaults_last = true;
        self
    }

    /// Hook name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recognised argument names in declaration order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Aggregation policy.
    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Whether built-in plugins run after third-party plugins.
    pub fn defaults_last(&self) -> bool {
        self.defaults_last
    }

    /// Whether the hook resolves to a single winning value.
    pub fn firstresult(&self) -> bool {
        matches!(
            self.policy,
            AggregationPolicy::FirstNonNull | AggregationPolicy::DecisiveChain
        )
    }

    /// Whether `argument` is part of this hook's vocabulary.
    pub fn accepts(&self, argument: &str) -> bool {
        self.arguments.iter().any(|a| a == argument)
    }
}

/// Registry of declared hook specifications.
#[derive(Debug, Default)]
pub struct HookSpecRegistry {
    specs: RwLock<BTreeMap<String, Arc<HookSpec>>>,
    sealed: AtomicBool,
}

impl HookSpecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every [`HookPoint`].
    pub fn with_builtin_hooks() -> Self {
        let registry = Self::new();
        {
            let mut specs = registry.specs.write();
            for point in HookPoint::ALL {
                specs.insert(point.as_str().to_string(), Arc::new(point.spec()));
            }
        }
        registry
    }

    /// Declares a hook.
    ///
    /// Re-declaring an identical spec is a no-op. A different spec under an
    /// existing name, or any declaration after the first dispatch, is a
    /// startup error.
    pub fn declare(&self, spec: HookSpec) -> AppResult<()> {
        if self.sealed.load(Ordering::Acquire) {
            return Err(AppError::startup(format!(
                "Cannot declare hook '{}' after dispatch has started",
                spec.name
            )));
        }

        let mut specs = self.specs.write();
        if let Some(existing) = specs.get(&spec.name) {
            if **existing == spec {
                return Ok(());
            }
            return Err(AppError::startup(format!(
                "Duplicate hook spec '{}' with a different signature",
                spec.name
            )));
        }

        debug!(hook = %spec.name, arguments = ?spec.arguments, policy = ?spec.policy, "Hook declared");
        specs.insert(spec.name.clone(), Arc::new(spec));
        Ok(())
    }

    /// Looks up a spec by name.
    pub fn lookup(&self, name: &str) -> AppResult<Arc<HookSpec>> {
        self.specs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::unknown_hook(name))
    }

    /// Freezes the registry. Called by the dispatcher on first use.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Whether the registry has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Declared hook names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.specs.read().keys().cloned().collect()
    }
}
