//! Request actor.

use serde_json::{Map, Value};

/// The identity associated with a request.
///
/// An actor is an opaque mapping (for example `{"id": "bot"}`); anonymous
/// requests carry no actor at all (`Option<Actor>::None`).
pub type Actor = Map<String, Value>;

/// Returns the actor's `id` field as a string, if present.
pub fn actor_id(actor: &Actor) -> Option<&str> {
    actor.get("id").and_then(Value::as_str)
}
