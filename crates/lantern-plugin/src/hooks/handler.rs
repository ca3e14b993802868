//! Hook implementations, the callables plugins bind to hooks.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{self, BoxFuture};

use lantern_core::result::AppResult;

use super::context::CallContext;
use super::definitions::HookValue;

/// Result of one implementation call. `None` means "no answer".
pub type HookOutcome = AppResult<Option<HookValue>>;

/// Whether an implementation can suspend before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplKind {
    /// Runs to completion inline.
    Sync,
    /// May await its own I/O before returning.
    Suspending,
}

/// Trait for hook implementations.
///
/// The dispatcher always awaits [`HookHandler::call`]; synchronous
/// implementations simply return an already-completed future.
#[async_trait]
pub trait HookHandler: Send + Sync + fmt::Debug {
    /// Name of the hook this implementation is bound to.
    fn hook_name(&self) -> &str;

    /// Argument names this implementation consumes.
    fn argnames(&self) -> &[String];

    /// Implementation kind, for logging and listings.
    fn kind(&self) -> ImplKind {
        ImplKind::Suspending
    }

    /// Runs the implementation with its projected arguments.
    async fn call(&self, args: CallContext) -> HookOutcome;
}

type HandlerFn = Arc<dyn Fn(CallContext) -> BoxFuture<'static, HookOutcome> + Send + Sync>;

/// A closure-based hook implementation.
pub struct ClosureHandler {
    hook: String,
    argnames: Vec<String>,
    kind: ImplKind,
    handler: HandlerFn,
}

impl fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("hook", &self.hook)
            .field("argnames", &self.argnames)
            .field("kind", &self.kind)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Wraps a synchronous closure.
    pub fn sync<F>(hook: &str, argnames: &[&str], handler: F) -> Self
    where
        F: Fn(&CallContext) -> HookOutcome + Send + Sync + 'static,
    {
        Self {
            hook: hook.to_string(),
            argnames: to_owned(argnames),
            kind: ImplKind::Sync,
            handler: Arc::new(move |args: CallContext| future::ready(handler(&args)).boxed()),
        }
    }

    /// Wraps a closure returning a future.
    pub fn suspending<F, Fut>(hook: &str, argnames: &[&str], handler: F) -> Self
    where
        F: Fn(CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookOutcome> + Send + 'static,
    {
        Self {
            hook: hook.to_string(),
            argnames: to_owned(argnames),
            kind: ImplKind::Suspending,
            handler: Arc::new(move |args: CallContext| handler(args).boxed()),
        }
    }
}

#[async_trait]
impl HookHandler for ClosureHandler {
    fn hook_name(&self) -> &str {
        &self.hook
    }

    fn argnames(&self) -> &[String] {
        &self.argnames
    }

    fn kind(&self) -> ImplKind {
        self.kind
    }

    async fn call(&self, args: CallContext) -> HookOutcome {
        (self.handler)(args).await
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
