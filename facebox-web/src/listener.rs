//! Event listeners that detach themselves when dropped
//!
//! A `Closure` handed to `addEventListener` has to outlive the registration.
//! Rather than `forget()` it, [`EventListener`] owns the closure and removes
//! the listener in `Drop`, so a binding lives exactly as long as its handle.

use wasm_bindgen_x::prelude::*;
use web_sys_x::{Event, EventTarget};

pub struct EventListener {
    target: EventTarget,
    event_name: String,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    /// Attach `callback` to `target`. Works for the document and for elements.
    pub fn new(
        target: &EventTarget,
        event_name: &str,
        callback: impl FnMut(Event) + 'static,
    ) -> Self {
        let callback: Closure<dyn FnMut(Event)> = Closure::wrap(Box::new(callback));

        target
            .add_event_listener_with_callback(event_name, callback.as_ref().unchecked_ref())
            .ok();

        Self {
            target: target.clone(),
            event_name: event_name.to_string(),
            callback,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            &self.event_name,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

/// Click listeners installed on every anchor matched by
/// [`crate::Facebox::bind_anchors`]. Dropping it unbinds them all.
#[must_use = "anchors are unbound when the bindings are dropped"]
pub struct AnchorBindings {
    listeners: Vec<EventListener>,
}

impl AnchorBindings {
    pub(crate) fn new(listeners: Vec<EventListener>) -> Self {
        Self { listeners }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
