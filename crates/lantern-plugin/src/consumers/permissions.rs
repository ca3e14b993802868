//! Permission registration and resolution.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::{debug, info};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;
use lantern_core::types::{Actor, Permission, Resource};

use crate::hooks::context::CallContext;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::manager::PluginManager;

/// Registered permissions keyed by name.
///
/// Written at startup, read on every permission check.
#[derive(Debug, Default)]
pub struct PermissionTable {
    entries: RwLock<BTreeMap<String, Permission>>,
}

impl PermissionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a batch of permissions.
    ///
    /// The whole batch is validated before anything is stored: identical
    /// re-registrations are skipped, while reusing a name or abbreviation
    /// for a different definition is a startup error and leaves the table
    /// unchanged. Returns how many new permissions were added.
    pub fn register_all(&self, permissions: Vec<Permission>) -> AppResult<usize> {
        let mut entries = self.entries.write();
        let mut staged = entries.clone();
        let mut added = 0;

        for permission in permissions {
            if let Some(existing) = staged.get(&permission.name) {
                if *existing == permission {
                    continue;
                }
                return Err(AppError::startup(format!(
                    "Duplicate permission name: {}",
                    permission.name
                )));
            }
            if let Some(abbr) = &permission.abbr {
                if let Some(owner) = staged.values().find(|p| p.abbr.as_ref() == Some(abbr)) {
                    return Err(AppError::startup(format!(
                        "Duplicate permission abbreviation: {abbr} (used by {} and {})",
                        owner.name, permission.name
                    )));
                }
            }
            staged.insert(permission.name.clone(), permission);
            added += 1;
        }

        *entries = staged;
        Ok(added)
    }

    /// Looks up a permission by name.
    pub fn get(&self, name: &str) -> Option<Permission> {
        self.entries.read().get(name).cloned()
    }

    /// All permissions, sorted by name.
    pub fn list(&self) -> Vec<Permission> {
        self.entries.read().values().cloned().collect()
    }

    /// Number of registered permissions.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no permissions are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PluginManager {
    /// Collects permission definitions from plugins into the table.
    ///
    /// Items may be [`Permission`] values or mappings with the same fields.
    pub async fn register_permissions(&self) -> AppResult<usize> {
        let hook = HookPoint::RegisterPermissions.as_str();
        let items = self.call(hook, CallContext::new()).await?.into_list();

        let permissions = items
            .into_iter()
            .map(|item| match item {
                HookValue::Permission(p) => Ok(p),
                HookValue::Json(value @ serde_json::Value::Object(_)) => {
                    serde_json::from_value(value).map_err(|e| {
                        AppError::plugin(format!("Invalid permission from {hook}: {e}"))
                    })
                }
                other => Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected a Permission",
                    other.kind_name()
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;

        let added = self.permissions().register_all(permissions)?;
        info!(added, total = self.permissions().len(), "Permissions registered");
        Ok(added)
    }

    /// Decides whether `actor` may perform `action` on `resource`.
    ///
    /// The first plugin to answer decides. When every plugin abstains the
    /// permission's registered default applies; an unregistered permission
    /// is denied.
    pub async fn permission_allowed(
        &self,
        actor: Option<&Actor>,
        action: &str,
        resource: Option<&Resource>,
    ) -> AppResult<bool> {
        let context = CallContext::new()
            .with("actor", actor.cloned())
            .with("action", action)
            .with("resource", resource.cloned());

        let decision = self
            .call(HookPoint::PermissionAllowed.as_str(), context)
            .await?
            .into_decision();

        if let Some(allowed) = decision {
            return Ok(allowed);
        }

        let default = self
            .permissions()
            .get(action)
            .map(|p| p.default)
            .unwrap_or(false);
        debug!(action = %action, default, "No plugin decided, using permission default");
        Ok(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::error::ErrorKind;

    fn vt() -> Permission {
        Permission::new("view-table")
            .with_abbr("vt")
            .scoped(true, true)
            .with_default(true)
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let table = PermissionTable::new();
        assert_eq!(table.register_all(vec![vt()]).expect("first"), 1);
        assert_eq!(table.register_all(vec![vt(), vt()]).expect("again"), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_conflicting_name_is_fatal() {
        let table = PermissionTable::new();
        table.register_all(vec![vt()]).expect("first");
        let err = table
            .register_all(vec![vt().with_default(false)])
            .expect_err("conflict");
        assert_eq!(err.kind, ErrorKind::Startup);
        assert!(err.message.contains("view-table"));
    }

    #[test]
    fn test_conflicting_abbreviation_is_fatal_and_atomic() {
        let table = PermissionTable::new();
        let err = table
            .register_all(vec![
                Permission::new("new-thing").with_abbr("nt"),
                vt(),
                Permission::new("view-thing").with_abbr("vt"),
            ])
            .expect_err("abbr conflict");
        assert_eq!(err.kind, ErrorKind::Startup);
        assert!(table.is_empty());
    }
}
