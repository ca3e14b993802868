//! Magic parameters for canned queries.
//!
//! A parameter named `_<prefix>_<key>` (for example `_header_user_agent`)
//! is filled in by the resolver registered for `<prefix>`, which receives
//! `<key>` and the current request.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::Request;

use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

type ResolverFn = Arc<dyn Fn(&str, &Request) -> AppResult<Option<Value>> + Send + Sync>;

/// A `(prefix, resolver)` pair.
#[derive(Clone)]
pub struct MagicParameter {
    prefix: String,
    resolver: ResolverFn,
}

impl fmt::Debug for MagicParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicParameter")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl MagicParameter {
    /// Creates a resolver for `prefix`.
    pub fn new<F>(prefix: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&str, &Request) -> AppResult<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            prefix: prefix.into(),
            resolver: Arc::new(resolver),
        }
    }

    /// The prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Installed magic parameter resolvers; one per prefix.
#[derive(Debug, Clone, Default)]
pub struct MagicParameters {
    params: Vec<MagicParameter>,
}

impl MagicParameters {
    /// Builds the set, keeping the first resolver for each prefix.
    pub fn new(params: Vec<MagicParameter>) -> Self {
        let mut set = Self::default();
        for param in params {
            if set.params.iter().any(|p| p.prefix == param.prefix) {
                warn!(prefix = %param.prefix, "Ignoring duplicate magic parameter");
                continue;
            }
            set.params.push(param);
        }
        set
    }

    /// Registered prefixes in order.
    pub fn prefixes(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.prefix.as_str()).collect()
    }

    /// Whether `name` has the shape of a magic parameter with a known prefix.
    pub fn is_magic(&self, name: &str) -> bool {
        split(name).is_some_and(|(prefix, _)| self.params.iter().any(|p| p.prefix == prefix))
    }

    /// Resolves a parameter such as `_cookie_session`.
    ///
    /// Unknown prefixes and names without the `_prefix_key` shape resolve
    /// to `None`.
    pub fn resolve(&self, name: &str, request: &Request) -> AppResult<Option<Value>> {
        let Some((prefix, key)) = split(name) else {
            return Ok(None);
        };
        match self.params.iter().find(|p| p.prefix == prefix) {
            Some(param) => (param.resolver)(key, request),
            None => Ok(None),
        }
    }
}

fn split(name: &str) -> Option<(&str, &str)> {
    name.strip_prefix('_')?.split_once('_')
}

impl PluginManager {
    /// Collects magic parameter resolvers; third-party prefixes win.
    pub async fn magic_parameters(&self) -> AppResult<MagicParameters> {
        let hook = HookPoint::RegisterMagicParameters.as_str();
        let params = self
            .call(hook, CallContext::new())
            .await?
            .into_list()
            .into_iter()
            .map(|item| match item {
                HookValue::MagicParameter(p) => Ok(p),
                other => Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected a MagicParameter",
                    other.kind_name()
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(MagicParameters::new(params))
    }

    /// Resolves one magic parameter for `request`.
    pub async fn resolve_magic_parameter(
        &self,
        name: &str,
        request: &Request,
    ) -> AppResult<Option<Value>> {
        self.magic_parameters().await?.resolve(name, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_and_first_prefix_wins() {
        let params = MagicParameters::new(vec![
            MagicParameter::new("upper", |key, _| Ok(Some(Value::from(key.to_uppercase())))),
            MagicParameter::new("upper", |_, _| Ok(Some(Value::from("shadowed")))),
        ]);
        let req = Request::get("/");

        assert_eq!(params.prefixes(), vec!["upper"]);
        assert_eq!(
            params.resolve("_upper_some_key", &req).expect("resolve"),
            Some(Value::from("SOME_KEY"))
        );
        assert_eq!(params.resolve("_lower_x", &req).expect("unknown"), None);
        assert_eq!(params.resolve("plain", &req).expect("plain"), None);
        assert!(params.is_magic("_upper_x"));
        assert!(!params.is_magic("upper_x"));
    }
}
