//! Controlled copy of untyped server JSON onto typed entities.
//!
//! Server list endpoints return loosely shaped rows; hydration maps the
//! subset of fields an entity actually declares onto it and discards the
//! rest. Each entity enumerates its settable fields explicitly in
//! [`Hydrate::apply_field`] instead of reflecting over the payload, so a
//! rename on either side degrades to an ignored field rather than a
//! mis-bound one.

use serde_json::Value;

pub trait Hydrate {
    /// Apply a single named field from a payload.
    ///
    /// Returns `true` when the name is in the entity's allow-list and the
    /// value converted to the field's type. Unknown names and values of the
    /// wrong type return `false` and leave the entity untouched.
    fn apply_field(&mut self, name: &str, value: &Value) -> bool;

    /// Walk every entry of a JSON object payload and apply the ones the
    /// entity accepts.
    ///
    /// Fields are applied independently and keys are unique, so order does
    /// not matter and there is no partial-failure mode. Non-object payloads
    /// hydrate nothing. Returns `&mut Self` to allow the
    /// hydrate-then-use constructor pattern.
    fn hydrate(&mut self, data: &Value) -> &mut Self {
        if let Some(map) = data.as_object() {
            for (name, value) in map {
                if !self.apply_field(name, value) {
                    tracing::trace!(field = %name, "ignored field during hydration");
                }
            }
        }

        self
    }
}
