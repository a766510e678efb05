//! facebox-web - Browser host for the facebox controller
//!
//! [`Facebox`] owns a [`Controller`] over the live document and does the
//! work the controller leaves to its host: fetching remote content,
//! preloading images, waiting out fades, and routing keyboard and click
//! input back in. Lifecycle notifications are re-dispatched on the document
//! as `CustomEvent`s (see [`notify`]).
//!
//! ```ignore
//! let facebox = Facebox::install()?;
//! let _anchors = facebox.bind_anchors(DEFAULT_ANCHOR_SELECTOR, ())?;
//! facebox.open(ContentRequest::ajax("/terms.html"), "wide")?;
//! ```

pub mod dom;
pub mod listener;
pub mod loader;
pub mod notify;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use facebox_common::template::{CLOSE_SELECTOR, OVERLAY_ID};
use facebox_common::{
    image_markup, CallStyle, CloseTicket, Content, ContentRequest, Controller, Dispatch, FaceboxError,
    LifecycleEvent, PageSettings, Phase, Resolution, RevealTicket, SubscriptionId,
};
use tracing::{debug, error};
use wasm_bindgen_futures_x::spawn_local;
use wasm_bindgen_x::JsCast;
use web_sys_x::{Document, Element, Event, HtmlAnchorElement, KeyboardEvent};

pub use dom::DomPage;
pub use listener::{AnchorBindings, EventListener};

/// Id of the `<script type="application/json">` block holding page settings
pub const SETTINGS_SCRIPT_ID: &str = "facebox-settings";

/// Anchors bound by default: any link whose `rel` mentions facebox
pub const DEFAULT_ANCHOR_SELECTOR: &str = "a[rel*=facebox]";

type Shared = Rc<RefCell<Controller<DomPage>>>;
type WeakShared = Weak<RefCell<Controller<DomPage>>>;

/// Handle to the page's facebox. Clones share one controller; the document
/// listeners go away when the last clone is dropped.
#[derive(Clone)]
pub struct Facebox {
    inner: Shared,
    document: Document,
    _listeners: Rc<Vec<EventListener>>,
}

impl Facebox {
    /// Set up with settings read from the page's `facebox-settings` script
    pub fn install() -> Result<Self, FaceboxError> {
        let page = DomPage::from_window()?;
        let settings = page_settings_from(page.document())?;
        Self::with_page(page, settings)
    }

    pub fn with_settings(settings: PageSettings) -> Result<Self, FaceboxError> {
        Self::with_page(DomPage::from_window()?, settings)
    }

    fn with_page(page: DomPage, settings: PageSettings) -> Result<Self, FaceboxError> {
        let document = page.document().clone();
        let mut controller = Controller::new(page, settings)?;

        let target = document.clone();
        controller.subscribe(move |event: &LifecycleEvent<'_>| notify::dispatch(&target, event));

        let inner = Rc::new(RefCell::new(controller));
        let listeners = bind_document(&Rc::downgrade(&inner), &document);

        Ok(Self {
            inner,
            document,
            _listeners: Rc::new(listeners),
        })
    }

    fn weak(&self) -> WeakShared {
        Rc::downgrade(&self.inner)
    }

    /// Current phase, or `None` while the controller is mid-notification
    pub fn phase(&self) -> Option<Phase> {
        self.inner.try_borrow().ok().map(|c| c.phase())
    }

    /// Show the box for `request`. Fetches and image loads finish in the
    /// background; a producer request is called before this returns.
    pub fn open(
        &self,
        request: ContentRequest,
        style: impl Into<CallStyle>,
    ) -> Result<(), FaceboxError> {
        let dispatch = self
            .inner
            .try_borrow_mut()
            .map_err(|_| FaceboxError::Busy)?
            .open(request, style)?;
        drive(&self.weak(), dispatch);
        Ok(())
    }

    /// Open the way a click on an anchor with this `href` and `rel` would
    pub fn open_link(
        &self,
        href: &str,
        rel: Option<&str>,
        style: impl Into<CallStyle>,
    ) -> Result<(), FaceboxError> {
        let dispatch = self
            .inner
            .try_borrow_mut()
            .map_err(|_| FaceboxError::Busy)?
            .open_link(href, rel, style)?;
        drive(&self.weak(), dispatch);
        Ok(())
    }

    /// Start closing. Safe to call from an observer; the close then happens
    /// on the next turn.
    pub fn close(&self) {
        close_with(&self.weak(), Controller::close);
    }

    /// Deliver content for a producer request
    pub fn resolve(
        &self,
        ticket: RevealTicket,
        content: Content<Element>,
    ) -> Result<Resolution, FaceboxError> {
        Ok(self
            .inner
            .try_borrow_mut()
            .map_err(|_| FaceboxError::Busy)?
            .resolve(ticket, content))
    }

    pub fn fail(&self, ticket: RevealTicket, reason: &str) -> Result<Resolution, FaceboxError> {
        Ok(self
            .inner
            .try_borrow_mut()
            .map_err(|_| FaceboxError::Busy)?
            .fail(ticket, reason))
    }

    /// Observe lifecycle events. Observers must not call back into this
    /// handle synchronously except through [`Facebox::close`].
    pub fn subscribe(
        &self,
        observer: impl FnMut(&LifecycleEvent<'_>) + 'static,
    ) -> Result<SubscriptionId, FaceboxError> {
        Ok(self
            .inner
            .try_borrow_mut()
            .map_err(|_| FaceboxError::Busy)?
            .subscribe(observer))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, FaceboxError> {
        Ok(self
            .inner
            .try_borrow_mut()
            .map_err(|_| FaceboxError::Busy)?
            .unsubscribe(id))
    }

    /// Open the facebox when any anchor matching `selector` is clicked.
    /// Anchors added to the page later are not picked up.
    pub fn bind_anchors(
        &self,
        selector: &str,
        style: impl Into<CallStyle>,
    ) -> Result<AnchorBindings, FaceboxError> {
        let style = style.into();
        let nodes = self
            .document
            .query_selector_all(selector)
            .map_err(|e| FaceboxError::dom(format!("bad selector {selector}: {e:?}")))?;

        let mut listeners = Vec::with_capacity(nodes.length() as usize);
        for i in 0..nodes.length() {
            let Some(anchor) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let weak = self.weak();
            let style = style.clone();
            let target = anchor.clone();
            listeners.push(EventListener::new(&anchor, "click", move |event: Event| {
                event.prevent_default();
                let href = target
                    .dyn_ref::<HtmlAnchorElement>()
                    .map(|a| a.href())
                    .or_else(|| target.get_attribute("href"))
                    .unwrap_or_default();
                let rel = target.get_attribute("rel");
                let style = style.clone();
                run_or_defer(weak.clone(), move |inner| {
                    let dispatch = inner.borrow_mut().open_link(&href, rel.as_deref(), style);
                    match dispatch {
                        Ok(dispatch) => drive(&Rc::downgrade(inner), dispatch),
                        Err(e) => error!("Facebox failed to open {}: {}", href, e),
                    }
                });
            }));
        }

        debug!("Bound facebox to {} anchors matching {}", listeners.len(), selector);
        Ok(AnchorBindings::new(listeners))
    }
}

fn page_settings_from(document: &Document) -> Result<PageSettings, FaceboxError> {
    let json = document
        .get_element_by_id(SETTINGS_SCRIPT_ID)
        .and_then(|script| script.text_content());
    match json {
        Some(json) if !json.trim().is_empty() => Ok(PageSettings::from_json(&json)?),
        _ => Ok(PageSettings::default()),
    }
}

/// Run `f` now if the controller is free, otherwise on the next turn
fn run_or_defer(weak: WeakShared, f: impl FnOnce(&Shared) + 'static) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    if inner.try_borrow_mut().is_ok() {
        f(&inner);
        return;
    }

    debug!("Facebox busy, deferring call");
    spawn_local(async move {
        if let Some(inner) = weak.upgrade() {
            f(&inner);
        }
    });
}

fn drive(weak: &WeakShared, dispatch: Dispatch) {
    match dispatch {
        Dispatch::Ignored | Dispatch::Revealed => {}
        Dispatch::Fetch { url, ticket } => {
            let weak = weak.clone();
            spawn_local(async move {
                let result = loader::fetch_text(&url).await.map(Content::Html);
                complete(weak, ticket, result);
            });
        }
        Dispatch::Image { url, ticket } => {
            let weak = weak.clone();
            spawn_local(async move {
                let result = loader::load_image(&url)
                    .await
                    .map(|src| Content::Html(image_markup(&src)));
                complete(weak, ticket, result);
            });
        }
        Dispatch::Deferred { producer, ticket } => producer(ticket),
    }
}

fn complete(weak: WeakShared, ticket: RevealTicket, result: Result<Content<Element>, String>) {
    run_or_defer(weak, move |inner| {
        let mut controller = inner.borrow_mut();
        let resolution = match result {
            Ok(content) => controller.resolve(ticket, content),
            Err(reason) => controller.fail(ticket, &reason),
        };
        if resolution == Resolution::Stale {
            debug!("Dropped completion for finished cycle {}", ticket.generation());
        }
    });
}

/// Wait out the fade, then let the controller settle the close
fn drive_close(weak: WeakShared, ticket: CloseTicket) {
    spawn_local(async move {
        let ms = u64::try_from(ticket.fade().as_millis()).unwrap_or(u64::MAX);
        loader::sleep_ms(ms).await;
        run_or_defer(weak, move |inner| {
            inner.borrow_mut().finish_modal_close(&ticket);
            if ticket.has_overlay() {
                inner.borrow_mut().finish_overlay_close(&ticket);
            }
        });
    });
}

fn close_with(weak: &WeakShared, f: fn(&mut Controller<DomPage>) -> Option<CloseTicket>) {
    let weak = weak.clone();
    run_or_defer(weak, move |inner| {
        let ticket = f(&mut inner.borrow_mut());
        if let Some(ticket) = ticket {
            drive_close(Rc::downgrade(inner), ticket);
        }
    });
}

/// Older browsers report `"Esc"`, and some only fill in the key code
fn is_escape_key(key: &str, key_code: u32) -> bool {
    const ESCAPE_KEY_CODE: u32 = 27;
    matches!(key, "Escape" | "Esc") || key_code == ESCAPE_KEY_CODE
}

/// Escape key, close control, overlay click and `close.facebox` from page code
fn bind_document(weak: &WeakShared, document: &Document) -> Vec<EventListener> {
    let on_key = {
        let weak = weak.clone();
        move |event: Event| {
            let is_escape = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|key| is_escape_key(&key.key(), key.key_code()));
            if is_escape {
                close_with(&weak, Controller::handle_escape);
            }
        }
    };

    let on_click = {
        let weak = weak.clone();
        move |event: Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if target.closest(CLOSE_SELECTOR).ok().flatten().is_some() {
                event.prevent_default();
                close_with(&weak, Controller::handle_close_control);
            } else if target.id() == OVERLAY_ID {
                close_with(&weak, Controller::handle_overlay_click);
            }
        }
    };

    let on_close_request = {
        let weak = weak.clone();
        move |event: Event| {
            if notify::is_own_event(&event) {
                return;
            }
            close_with(&weak, Controller::close);
        }
    };

    let target: &web_sys_x::EventTarget = document;
    vec![
        EventListener::new(target, "keydown", on_key),
        EventListener::new(target, "click", on_click),
        EventListener::new(target, "close.facebox", on_close_request),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_key_variants() {
        assert!(is_escape_key("Escape", 27));
        assert!(is_escape_key("Esc", 0));
        assert!(is_escape_key("", 27));
        assert!(!is_escape_key("Enter", 13));
        assert!(!is_escape_key("e", 69));
    }
}
