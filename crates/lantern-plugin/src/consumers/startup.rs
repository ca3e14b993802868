//! Startup and connection lifecycle hooks.

use std::any::Any;
use std::sync::Arc;

use tracing::{debug, info};

use lantern_core::result::AppResult;

use crate::hooks::context::CallContext;
use crate::hooks::definitions::HookPoint;
use crate::manager::PluginManager;

impl PluginManager {
    /// Builds the permission table and then fires `startup`.
    ///
    /// Any error here must stop the process before it serves. Calling this
    /// again is harmless: identical permissions re-register as no-ops.
    pub async fn invoke_startup(&self) -> AppResult<()> {
        self.register_permissions().await?;
        self.call(HookPoint::Startup.as_str(), CallContext::new())
            .await?;
        info!(plugins = self.plugins().count(), "Startup hooks complete");
        Ok(())
    }

    /// Fires `prepare_connection` for a new database connection.
    ///
    /// The connection is handed to plugins as an opaque object; they
    /// downcast it to the concrete type they expect.
    pub async fn prepare_connection<C>(&self, conn: Arc<C>, database: &str) -> AppResult<()>
    where
        C: Any + Send + Sync,
    {
        debug!(database = %database, "Preparing connection");
        self.call(
            HookPoint::PrepareConnection.as_str(),
            CallContext::new()
                .with_object("conn", conn)
                .with("database", database),
        )
        .await?;
        Ok(())
    }
}
