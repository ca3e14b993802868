//! Convenience macros for plugin development.

/// Builds a [`CallContext`](crate::hooks::context::CallContext).
///
/// # Example
/// ```rust,ignore
/// let ctx = call_context! {
///     "database" => "fixtures",
///     "table" => None::<String>,
///     "view_name" => "database",
/// };
/// ```
#[macro_export]
macro_rules! call_context {
    () => {
        $crate::hooks::context::CallContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::hooks::context::CallContext::new();
        $(
            ctx.insert($key, $value);
        )+
        ctx
    }};
}

/// Builds a [`Plugin`](crate::registry::Plugin) from synchronous hook
/// closures.
///
/// # Example
/// ```rust,ignore
/// let plugin = plugin! {
///     name: "my-plugin",
///     hooks: {
///         "extra_js_urls" [] => |_| Ok(Some(vec!["a.js"].into())),
///         "menu_links" ["actor"] => |args| Ok(None),
///     }
/// };
/// ```
#[macro_export]
macro_rules! plugin {
    (
        name: $name:expr,
        hooks: { $($hook:literal [$($arg:literal),* $(,)?] => $handler:expr),* $(,)? }
    ) => {{
        let plugin = $crate::registry::Plugin::new($name);
        $(
            let plugin = plugin.sync_hook($hook, &[$($arg),*], $handler);
        )*
        plugin
    }};
}
