//! Error, forbidden and CSRF hooks.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::{Request, Response};

use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

impl PluginManager {
    /// Gives plugins a chance to turn an unhandled error into a response.
    ///
    /// Returns the original error when every plugin abstains or when a
    /// handler itself fails; the host then reports it with
    /// [`Response::from_error`]. A broken handler never masks the original
    /// error.
    pub async fn handle_exception(
        &self,
        request: Option<Arc<Request>>,
        err: AppError,
    ) -> Result<Response, AppError> {
        let hook = HookPoint::HandleException.as_str();
        let context = CallContext::new()
            .with("request", request)
            .with("exception", Arc::new(err.clone()));

        match self.call(hook, context).await {
            Ok(aggregated) => match aggregated.into_single() {
                Some(HookValue::Response(response)) => Ok(response),
                None => {
                    debug!(error = %err, "No plugin handled the error");
                    Err(err)
                }
                Some(other) => {
                    error!(
                        hook = %hook,
                        returned = other.kind_name(),
                        error = %err,
                        "Exception handler returned a non-response value"
                    );
                    Err(err)
                }
            },
            Err(handler_err) => {
                error!(
                    hook = %hook,
                    handler_error = %handler_err,
                    error = %err,
                    "Exception handler failed"
                );
                Err(err)
            }
        }
    }

    /// Response for a forbidden request.
    ///
    /// The first plugin response wins; otherwise a plain 403.
    pub async fn forbidden(&self, request: Arc<Request>, message: &str) -> AppResult<Response> {
        let hook = HookPoint::Forbidden.as_str();
        let context = CallContext::new()
            .with("request", request)
            .with("message", message);

        match self.call(hook, context).await?.into_single() {
            Some(HookValue::Response(response)) => Ok(response),
            None => Ok(Response::from_error(&AppError::authorization(message))),
            Some(other) => Err(AppError::plugin(format!(
                "Hook '{hook}' returned {}, expected a Response",
                other.kind_name()
            ))),
        }
    }

    /// Whether CSRF protection is skipped for `request`.
    ///
    /// Every implementation is consulted and any `true` skips the check; a
    /// `false` from one plugin never vetoes another plugin's `true`.
    pub async fn skip_csrf(&self, request: Arc<Request>) -> AppResult<bool> {
        let hook = HookPoint::SkipCsrf.as_str();
        let answers = self
            .call(hook, CallContext::new().with("request", request))
            .await?
            .into_list();

        let mut skip = false;
        for answer in answers {
            match answer {
                HookValue::Bool(b) | HookValue::Json(Value::Bool(b)) => skip |= b,
                other => {
                    return Err(AppError::plugin(format!(
                        "Hook '{hook}' returned {}, expected a bool or no answer",
                        other.kind_name()
                    )));
                }
            }
        }
        Ok(skip)
    }
}
