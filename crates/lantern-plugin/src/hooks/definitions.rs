//! Built-in hook points and the values hook implementations return.

use std::fmt;

use serde_json::Value;

use lantern_core::types::{Permission, Response};

use super::spec::{AggregationPolicy, HookSpec};
use crate::consumers::magic::MagicParameter;
use crate::consumers::renderers::OutputRenderer;
use crate::consumers::routes::Route;

/// Enumeration of all hook points the host calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    // ── Lifecycle ──
    /// Fired once the permission table is built.
    Startup,
    /// Fired for every new database connection.
    PrepareConnection,

    // ── Templates ──
    /// Stylesheet URLs for a page.
    ExtraCssUrls,
    /// Script URLs for a page.
    ExtraJsUrls,
    /// Inline scripts appended to the page body.
    ExtraBodyScript,
    /// Extra variables merged into the template context.
    ExtraTemplateVars,
    /// Custom rendering of a single table cell.
    RenderCell,

    // ── Registration ──
    /// Output renderers keyed by file extension.
    RegisterOutputRenderer,
    /// Extra routes, tried ahead of the built-in ones.
    RegisterRoutes,
    /// Extra CLI commands.
    RegisterCommands,
    /// Magic parameter resolvers for canned queries.
    RegisterMagicParameters,
    /// Permission definitions.
    RegisterPermissions,

    // ── Auth ──
    /// Decides whether an actor may perform an action.
    PermissionAllowed,
    /// Resolves the actor for a request.
    ActorFromRequest,
    /// Custom response for a forbidden request.
    Forbidden,
    /// Whether CSRF protection is skipped for a request.
    SkipCsrf,

    // ── Content ──
    /// Canned queries contributed for a database.
    CannedQueries,
    /// Metadata fragments contributed by plugins.
    GetMetadata,

    // ── Errors ──
    /// Custom response for an unhandled error.
    HandleException,

    // ── Navigation ──
    /// Links in the global navigation menu.
    MenuLinks,
    /// Links in a table's actions menu.
    TableActions,
    /// Links in a database's actions menu.
    DatabaseActions,
}

const TEMPLATE_ARGS: &[&str] = &[
    "template",
    "database",
    "table",
    "columns",
    "view_name",
    "request",
    "host",
];

impl HookPoint {
    /// Every built-in hook point in declaration order.
    pub const ALL: [HookPoint; 22] = [
        Self::Startup,
        Self::PrepareConnection,
        Self::ExtraCssUrls,
        Self::ExtraJsUrls,
        Self::ExtraBodyScript,
        Self::ExtraTemplateVars,
        Self::RenderCell,
        Self::RegisterOutputRenderer,
        Self::RegisterRoutes,
        Self::RegisterCommands,
        Self::RegisterMagicParameters,
        Self::RegisterPermissions,
        Self::PermissionAllowed,
        Self::ActorFromRequest,
        Self::Forbidden,
        Self::SkipCsrf,
        Self::CannedQueries,
        Self::GetMetadata,
        Self::HandleException,
        Self::MenuLinks,
        Self::TableActions,
        Self::DatabaseActions,
    ];

    /// Returns the string name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::PrepareConnection => "prepare_connection",
            Self::ExtraCssUrls => "extra_css_urls",
            Self::ExtraJsUrls => "extra_js_urls",
            Self::ExtraBodyScript => "extra_body_script",
            Self::ExtraTemplateVars => "extra_template_vars",
            Self::RenderCell => "render_cell",
            Self::RegisterOutputRenderer => "register_output_renderer",
            Self::RegisterRoutes => "register_routes",
            Self::RegisterCommands => "register_commands",
            Self::RegisterMagicParameters => "register_magic_parameters",
            Self::RegisterPermissions => "register_permissions",
            Self::PermissionAllowed => "permission_allowed",
            Self::ActorFromRequest => "actor_from_request",
            Self::Forbidden => "forbidden",
            Self::SkipCsrf => "skip_csrf",
            Self::CannedQueries => "canned_queries",
            Self::GetMetadata => "get_metadata",
            Self::HandleException => "handle_exception",
            Self::MenuLinks => "menu_links",
            Self::TableActions => "table_actions",
            Self::DatabaseActions => "database_actions",
        }
    }

    /// Argument names this hook recognises.
    pub fn arguments(&self) -> &'static [&'static str] {
        match self {
            Self::Startup => &["host"],
            Self::PrepareConnection => &["conn", "database", "host"],
            Self::ExtraCssUrls
            | Self::ExtraJsUrls
            | Self::ExtraBodyScript
            | Self::ExtraTemplateVars => TEMPLATE_ARGS,
            Self::RenderCell => &[
                "row", "value", "column", "table", "database", "host", "request",
            ],
            Self::RegisterOutputRenderer
            | Self::RegisterRoutes
            | Self::RegisterMagicParameters
            | Self::RegisterPermissions => &["host"],
            Self::RegisterCommands => &["cli"],
            Self::PermissionAllowed => &["host", "actor", "action", "resource"],
            Self::ActorFromRequest => &["host", "request"],
            Self::Forbidden => &["host", "request", "message"],
            Self::SkipCsrf => &["host", "request"],
            Self::CannedQueries => &["host", "database", "actor"],
            Self::GetMetadata => &["host", "key", "database", "table"],
            Self::HandleException => &["host", "request", "exception"],
            Self::MenuLinks => &["host", "actor", "request"],
            Self::TableActions => &["host", "actor", "database", "table", "request"],
            Self::DatabaseActions => &["host", "actor", "database", "request"],
        }
    }

    /// How the results of this hook are combined.
    pub fn policy(&self) -> AggregationPolicy {
        match self {
            Self::Startup | Self::PrepareConnection | Self::RegisterCommands => {
                AggregationPolicy::Broadcast
            }
            Self::RenderCell
            | Self::ActorFromRequest
            | Self::Forbidden
            | Self::HandleException => AggregationPolicy::FirstNonNull,
            Self::PermissionAllowed => AggregationPolicy::DecisiveChain,
            Self::ExtraTemplateVars | Self::CannedQueries | Self::GetMetadata => {
                AggregationPolicy::MergeDict
            }
            _ => AggregationPolicy::CollectFlatten,
        }
    }

    /// Whether built-in plugins are consulted only after third-party ones.
    pub fn defaults_last(&self) -> bool {
        matches!(
            self,
            Self::RenderCell
                | Self::RegisterOutputRenderer
                | Self::RegisterMagicParameters
                | Self::PermissionAllowed
                | Self::ActorFromRequest
                | Self::Forbidden
                | Self::HandleException
        )
    }

    /// Builds the specification for this hook point.
    pub fn spec(&self) -> HookSpec {
        let spec = HookSpec::new(self.as_str(), self.arguments(), self.policy());
        if self.defaults_last() {
            spec.with_defaults_last()
        } else {
            spec
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for HookPoint {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A non-null value returned by one hook implementation.
///
/// Abstention is expressed as `None` around this type, never as a variant.
#[derive(Debug, Clone)]
pub enum HookValue {
    /// A yes/no decision.
    Bool(bool),
    /// Plain data: strings, mappings, lists of links.
    Json(Value),
    /// Several values from one implementation, flattened by collecting hooks.
    List(Vec<HookValue>),
    /// A ready-made response.
    Response(Response),
    /// A permission definition.
    Permission(Permission),
    /// A route contribution.
    Route(Route),
    /// An output renderer contribution.
    Renderer(OutputRenderer),
    /// A magic parameter resolver contribution.
    MagicParameter(MagicParameter),
}

impl HookValue {
    /// Short description of the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Json(Value::Null) => "null",
            Self::Json(Value::Bool(_)) => "json bool",
            Self::Json(Value::Number(_)) => "number",
            Self::Json(Value::String(_)) => "string",
            Self::Json(Value::Array(_)) => "list",
            Self::Json(Value::Object(_)) => "mapping",
            Self::List(_) => "list",
            Self::Response(_) => "Response",
            Self::Permission(_) => "Permission",
            Self::Route(_) => "Route",
            Self::Renderer(_) => "OutputRenderer",
            Self::MagicParameter(_) => "MagicParameter",
        }
    }

    /// Whether this value counts as an abstention.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    /// Borrows the inner JSON value, if this is plain data.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for HookValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Value> for HookValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for HookValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

impl From<String> for HookValue {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

impl From<Response> for HookValue {
    fn from(value: Response) -> Self {
        Self::Response(value)
    }
}

impl From<Permission> for HookValue {
    fn from(value: Permission) -> Self {
        Self::Permission(value)
    }
}

impl From<Route> for HookValue {
    fn from(value: Route) -> Self {
        Self::Route(value)
    }
}

impl From<OutputRenderer> for HookValue {
    fn from(value: OutputRenderer) -> Self {
        Self::Renderer(value)
    }
}

impl From<MagicParameter> for HookValue {
    fn from(value: MagicParameter) -> Self {
        Self::MagicParameter(value)
    }
}

impl<T: Into<HookValue>> From<Vec<T>> for HookValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = HookPoint::ALL.iter().map(|h| h.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), HookPoint::ALL.len());
    }

    #[test]
    fn test_override_sensitive_hooks() {
        assert!(HookPoint::PermissionAllowed.defaults_last());
        assert!(HookPoint::HandleException.defaults_last());
        assert!(!HookPoint::RegisterRoutes.defaults_last());
        assert_eq!(
            HookPoint::PermissionAllowed.policy(),
            AggregationPolicy::DecisiveChain
        );
        assert_eq!(HookPoint::SkipCsrf.policy(), AggregationPolicy::CollectFlatten);
        assert!(!HookPoint::SkipCsrf.defaults_last());
    }

    #[test]
    fn test_vec_into_list() {
        let value: HookValue = vec!["a.js", "b.js"].into();
        match value {
            HookValue::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }
}
