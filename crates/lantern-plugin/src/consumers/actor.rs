//! Actor resolution.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::{Actor, Request};

use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

impl PluginManager {
    /// Resolves the actor for `request`.
    ///
    /// An actor already placed on the request by an upstream layer is
    /// returned as-is without consulting any plugin.
    pub async fn actor_from_request(&self, request: Arc<Request>) -> AppResult<Option<Actor>> {
        if let Some(actor) = &request.actor {
            debug!(path = %request.path, "Actor supplied upstream");
            return Ok(Some(actor.clone()));
        }

        let hook = HookPoint::ActorFromRequest.as_str();
        let winner = self
            .call(hook, CallContext::new().with("request", request))
            .await?
            .into_single();

        match winner {
            None => Ok(None),
            Some(HookValue::Json(Value::Object(actor))) => Ok(Some(actor)),
            Some(other) => Err(AppError::plugin(format!(
                "Hook '{hook}' returned {}, expected an actor mapping",
                other.kind_name()
            ))),
        }
    }

    /// Places the resolved actor on `request` so later consumers, such as
    /// `_actor_*` magic parameters, see it.
    pub async fn resolve_request_actor(&self, mut request: Request) -> AppResult<Request> {
        if request.actor.is_none() {
            request.actor = self.actor_from_request(Arc::new(request.clone())).await?;
        }
        Ok(request)
    }
}
