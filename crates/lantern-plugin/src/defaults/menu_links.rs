//! Built-in navigation links.

use lantern_core::types::actor::actor_id;

use crate::consumers::menus::Link;
use crate::hooks::definitions::HookPoint;
use crate::registry::Plugin;

/// Name of the built-in menu links plugin.
pub const NAME: &str = "lantern.default_menu_links";

/// Builds the plugin.
pub fn plugin() -> Plugin {
    Plugin::builtin(NAME).sync_hook(HookPoint::MenuLinks.as_str(), &["actor"], |args| {
        let is_root = args.actor().as_ref().and_then(actor_id) == Some("root");
        Ok(is_root.then(|| vec![Link::new("Debug permissions", "/-/permissions")].into()))
    })
}
