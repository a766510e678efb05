//! Re-publishes lifecycle notifications as `CustomEvent`s on the document,
//! so plain page scripts can listen for `reveal.facebox` and friends.

use facebox_common::{LifecycleEvent, Settings};
use serde_json::{json, Value};
use tracing::warn;
use wasm_bindgen_x::JsValue;
use web_sys_x::{CustomEvent, CustomEventInit, Document};

/// `detail.source` on every event this module dispatches
pub const EVENT_SOURCE: &str = "facebox";

fn settings_json(settings: &Settings) -> Value {
    json!({
        "opacity": settings.opacity,
        "fadeDuration": settings.fade_duration.as_millis() as u64,
        "loadingImage": settings.loading_image,
        "closeImage": settings.close_image,
        "cssClass": settings.css_class,
        "title": settings.title,
    })
}

pub fn event_detail(event: &LifecycleEvent<'_>) -> Value {
    let mut detail = json!({ "source": EVENT_SOURCE });
    if let Some(settings) = event.settings() {
        detail["settings"] = settings_json(settings);
    }
    if let LifecycleEvent::LoadFailed { reason, .. } = event {
        detail["reason"] = Value::String(reason.to_string());
    }
    detail
}

/// Dispatch `event` on `document` under each of its names
pub fn dispatch(document: &Document, event: &LifecycleEvent<'_>) {
    let detail = match js_sys_x::JSON::parse(&event_detail(event).to_string()) {
        Ok(detail) => detail,
        Err(e) => {
            warn!("Failed to build event detail: {:?}", e);
            JsValue::NULL
        }
    };

    for name in event.dom_names() {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(name, &init) {
            Ok(custom) => {
                let _ = document.dispatch_event(&custom);
            }
            Err(e) => warn!("Failed to create {}: {:?}", name, e),
        }
    }
}

/// True if a `close.facebox` event was dispatched by [`dispatch`] rather than
/// by page code asking the box to close
pub fn is_own_event(event: &web_sys_x::Event) -> bool {
    use wasm_bindgen_x::JsCast;

    event
        .dyn_ref::<CustomEvent>()
        .map(|custom| custom.detail())
        .filter(|detail| detail.is_object())
        .and_then(|detail| js_sys_x::Reflect::get(&detail, &JsValue::from_str("source")).ok())
        .and_then(|source| source.as_string())
        .is_some_and(|source| source == EVENT_SOURCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facebox_common::SettingsOverride;

    #[test]
    fn test_detail_carries_settings() {
        let mut settings = Settings::default();
        settings
            .apply(&SettingsOverride::new().css_class("wide").opacity(0.4))
            .unwrap();
        let detail = event_detail(&LifecycleEvent::Reveal(&settings));
        assert_eq!(detail["source"], "facebox");
        assert_eq!(detail["settings"]["cssClass"], "wide");
        assert_eq!(detail["settings"]["opacity"], 0.4);
        assert_eq!(detail["settings"]["fadeDuration"], 200);
    }

    #[test]
    fn test_detail_for_close_has_no_settings() {
        let detail = event_detail(&LifecycleEvent::Close);
        assert_eq!(detail["source"], "facebox");
        assert!(detail.get("settings").is_none());
    }

    #[test]
    fn test_detail_for_failure_has_reason() {
        let settings = Settings::default();
        let detail = event_detail(&LifecycleEvent::LoadFailed {
            settings: &settings,
            reason: "Server error: 404 Not Found",
        });
        assert_eq!(detail["reason"], "Server error: 404 Not Found");
    }
}
