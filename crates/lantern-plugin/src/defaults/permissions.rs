//! Built-in permission set.

use serde_json::Value;

use lantern_core::types::Permission;
use lantern_core::types::actor::actor_id;

use crate::hooks::definitions::{HookPoint, HookValue};
use crate::registry::Plugin;

/// Name of the built-in permissions plugin.
pub const NAME: &str = "lantern.default_permissions";

/// Actions granted to the `root` actor unless another plugin decides first.
const ROOT_ONLY: &[&str] = &["permissions-debug", "debug-menu"];

/// The permissions every instance knows about.
pub fn builtin_permissions() -> Vec<Permission> {
    // (name, abbr, description, takes_database, takes_resource, default)
    let table: &[(&str, &str, &str, bool, bool, bool)] = &[
        ("view-instance", "vi", "View instance", false, false, true),
        ("view-database", "vd", "View database", true, false, true),
        ("view-database-download", "vdd", "Download database file", true, false, true),
        ("view-table", "vt", "View table", true, true, true),
        ("view-query", "vq", "View named query results", true, true, true),
        ("execute-sql", "es", "Execute read-only SQL queries", true, false, true),
        ("permissions-debug", "pd", "Access permission debug tool", false, false, false),
        ("debug-menu", "dm", "View debug menu items", false, false, false),
        ("insert-row", "ir", "Insert rows", true, true, false),
        ("delete-row", "dr", "Delete rows", true, true, false),
        ("update-row", "ur", "Update rows", true, true, false),
        ("create-table", "ct", "Create tables", true, false, false),
        ("drop-table", "dt", "Drop tables", true, true, false),
    ];

    table
        .iter()
        .map(|&(name, abbr, description, db, resource, default)| {
            Permission::new(name)
                .with_abbr(abbr)
                .with_description(description)
                .scoped(db, resource)
                .with_default(default)
        })
        .collect()
}

/// Builds the plugin.
pub fn plugin() -> Plugin {
    Plugin::builtin(NAME)
        .sync_hook(HookPoint::RegisterPermissions.as_str(), &[], |_| {
            Ok(Some(builtin_permissions().into()))
        })
        .sync_hook(
            HookPoint::PermissionAllowed.as_str(),
            &["actor", "action"],
            |args| {
                let is_root = args.actor().as_ref().and_then(actor_id) == Some("root");
                let root_only = args.str("action").is_some_and(|a| ROOT_ONLY.contains(&a));
                Ok((is_root && root_only).then_some(HookValue::Json(Value::Bool(true))))
            },
        )
}
