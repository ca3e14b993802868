//! Named-argument bag passed to hook implementations.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use lantern_core::error::AppError;
use lantern_core::types::{Actor, Request, Resource};

use crate::api::context::PluginContext;

/// One call-time argument.
#[derive(Clone)]
pub enum HookArg {
    /// Explicitly absent (e.g. no table on a database page).
    Null,
    /// Plain data.
    Json(Value),
    /// A host object, downcast by the implementation that needs it.
    Object(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for HookArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Json(v) => write!(f, "Json({v})"),
            Self::Object(_) => write!(f, "Object(<host object>)"),
        }
    }
}

impl From<Value> for HookArg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Json(other),
        }
    }
}

impl From<&str> for HookArg {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

impl From<String> for HookArg {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

impl From<Vec<String>> for HookArg {
    fn from(value: Vec<String>) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<Actor> for HookArg {
    fn from(value: Actor) -> Self {
        Self::Json(Value::Object(value))
    }
}

impl From<Resource> for HookArg {
    fn from(value: Resource) -> Self {
        match value {
            Resource::Database(database) => Self::Json(Value::String(database)),
            Resource::Child(database, child) => Self::Json(Value::Array(vec![
                Value::String(database),
                Value::String(child),
            ])),
        }
    }
}

impl From<Arc<Request>> for HookArg {
    fn from(value: Arc<Request>) -> Self {
        Self::Object(value)
    }
}

impl From<Arc<PluginContext>> for HookArg {
    fn from(value: Arc<PluginContext>) -> Self {
        Self::Object(value)
    }
}

impl From<Arc<AppError>> for HookArg {
    fn from(value: Arc<AppError>) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<HookArg>> From<Option<T>> for HookArg {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// The full set of named arguments for one dispatch.
///
/// The dispatcher projects this onto each implementation's declared
/// argument subset, so an implementation never sees names it did not ask
/// for.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    args: BTreeMap<String, HookArg>,
}

impl CallContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument.
    pub fn with(mut self, name: &str, arg: impl Into<HookArg>) -> Self {
        self.insert(name, arg);
        self
    }

    /// Adds an opaque host object.
    pub fn with_object<T: Any + Send + Sync>(mut self, name: &str, object: Arc<T>) -> Self {
        self.args.insert(name.to_string(), HookArg::Object(object));
        self
    }

    /// Adds or replaces an argument in place.
    pub fn insert(&mut self, name: &str, arg: impl Into<HookArg>) {
        self.args.insert(name.to_string(), arg.into());
    }

    /// Argument names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(String::as_str)
    }

    /// Whether `name` was supplied (even as null).
    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    /// Number of supplied arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Keeps only the arguments in `names`.
    pub fn project(&self, names: &[String]) -> CallContext {
        let args = names
            .iter()
            .filter_map(|n| self.args.get(n).map(|a| (n.clone(), a.clone())))
            .collect();
        CallContext { args }
    }

    /// Plain-data argument; `None` when missing, null, or a host object.
    pub fn json(&self, name: &str) -> Option<&Value> {
        match self.args.get(name) {
            Some(HookArg::Json(v)) => Some(v),
            _ => None,
        }
    }

    /// String argument.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.json(name).and_then(Value::as_str)
    }

    /// Host object argument downcast to `T`.
    pub fn object<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        match self.args.get(name) {
            Some(HookArg::Object(obj)) => obj.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// The `request` argument.
    pub fn request(&self) -> Option<Arc<Request>> {
        self.object::<Request>("request")
    }

    /// The `host` argument.
    pub fn host(&self) -> Option<Arc<PluginContext>> {
        self.object::<PluginContext>("host")
    }

    /// The `actor` argument.
    pub fn actor(&self) -> Option<Actor> {
        self.json("actor").and_then(Value::as_object).cloned()
    }

    /// The `exception` argument.
    pub fn exception(&self) -> Option<Arc<AppError>> {
        self.object::<AppError>("exception")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_argument_shapes() {
        let ctx = CallContext::new()
            .with("resource", Resource::Child("fixtures".into(), "facetable".into()))
            .with("database", Resource::Database("fixtures".into()));
        assert_eq!(ctx.json("resource"), Some(&json!(["fixtures", "facetable"])));
        assert_eq!(ctx.json("database"), Some(&json!("fixtures")));
    }

    #[test]
    fn test_projection_drops_unrequested_names() {
        let ctx = CallContext::new()
            .with("database", "fixtures")
            .with("table", None::<String>)
            .with("view_name", "database");
        let projected = ctx.project(&["view_name".to_string(), "columns".to_string()]);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.str("view_name"), Some("database"));
        assert!(!projected.contains("database"));
        assert!(!projected.contains("columns"));
    }

    #[test]
    fn test_null_is_supplied_but_empty() {
        let ctx = CallContext::new().with("table", None::<String>);
        assert!(ctx.contains("table"));
        assert_eq!(ctx.json("table"), None);
    }

    #[test]
    fn test_object_downcast() {
        let req = Arc::new(Request::get("/?_bot=1"));
        let ctx = CallContext::new().with("request", req);
        assert_eq!(ctx.request().and_then(|r| r.arg("_bot").map(str::to_string)), Some("1".into()));
        assert!(ctx.object::<String>("request").is_none());
    }

    #[test]
    fn test_actor_accessor() {
        let actor = json!({"id": "bot"}).as_object().cloned().expect("object");
        let ctx = CallContext::new().with("actor", Some(actor.clone()));
        assert_eq!(ctx.actor(), Some(actor));
    }
}
