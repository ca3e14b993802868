//! Built-in magic parameters: `header`, `cookie`, `actor`, `now`, `request`.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use lantern_core::types::Request;

use crate::consumers::magic::MagicParameter;
use crate::hooks::definitions::{HookPoint, HookValue};
use crate::registry::Plugin;

/// Name of the built-in magic parameters plugin.
pub const NAME: &str = "lantern.default_magic_parameters";

fn header(key: &str, request: &Request) -> Option<Value> {
    request
        .header(&key.replace('_', "-"))
        .map(|v| Value::String(v.to_string()))
}

fn cookie(key: &str, request: &Request) -> Option<Value> {
    request.cookie(key).map(|v| Value::String(v.to_string()))
}

fn actor(key: &str, request: &Request) -> Option<Value> {
    request.actor.as_ref()?.get(key).cloned()
}

fn now(key: &str, _request: &Request) -> Option<Value> {
    let now = Utc::now();
    match key {
        "epoch" => Some(Value::from(now.timestamp())),
        "date_utc" => Some(Value::String(now.format("%Y-%m-%d").to_string())),
        "datetime_utc" => Some(Value::String(
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        )),
        _ => None,
    }
}

fn request_field(key: &str, request: &Request) -> Option<Value> {
    match key {
        "http_version" => Some(Value::String(request.http_version.clone())),
        "path" => Some(Value::String(request.path.clone())),
        "full_path" => Some(Value::String(request.full_path())),
        "method" => Some(Value::String(request.method.clone())),
        _ => None,
    }
}

/// The built-in resolvers.
pub fn builtin_parameters() -> Vec<MagicParameter> {
    let resolvers: [(&str, fn(&str, &Request) -> Option<Value>); 5] = [
        ("header", header),
        ("cookie", cookie),
        ("actor", actor),
        ("now", now),
        ("request", request_field),
    ];
    resolvers
        .into_iter()
        .map(|(prefix, resolve)| MagicParameter::new(prefix, move |key, req| Ok(resolve(key, req))))
        .collect()
}

/// Builds the plugin.
pub fn plugin() -> Plugin {
    Plugin::builtin(NAME).sync_hook(HookPoint::RegisterMagicParameters.as_str(), &[], |_| {
        let params: Vec<HookValue> = builtin_parameters().into_iter().map(Into::into).collect();
        Ok(Some(HookValue::List(params)))
    })
}
