//! [`Page`] implementation over the live browser document
//!
//! Every DOM call here is best-effort: a failure is logged at `warn` and the
//! lifecycle step carries on, the same way the rest of the UI treats
//! `JsValue` errors.

use std::time::Duration;

use facebox_common::page::INITIAL_HALF_WIDTH;
use facebox_common::template::{
    self, BODY_SELECTOR, CLOSE_IMAGE_SELECTOR, CONTENT_CLASS, CONTENT_SELECTOR, DECORATION_SELECTORS,
    LOADING_SELECTOR, MODAL_ID, OVERLAY_ID, PLACEHOLDER_ID, TABLE_SELECTOR, TITLE_SELECTOR,
};
use facebox_common::{FaceboxError, Page, Placement, Viewport};
use tracing::{debug, warn};
use wasm_bindgen_x::{JsCast, JsValue};
use web_sys_x::{Document, Element, HtmlElement, HtmlImageElement, Window};

const OVERLAY_BG_CLASS: &str = "facebox_overlayBG";
const OVERLAY_HIDE_CLASS: &str = "facebox_hide";

pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn from_window() -> Result<Self, FaceboxError> {
        let window = web_sys_x::window().ok_or_else(|| FaceboxError::dom("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| FaceboxError::dom("no document"))?;
        Ok(Self { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn query(&self, selector: &str) -> Option<Element> {
        match self.document.query_selector(selector) {
            Ok(found) => found,
            Err(e) => {
                warn!("Bad selector {}: {:?}", selector, e);
                None
            }
        }
    }

    fn by_id(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn body_children(&self) -> Vec<HtmlElement> {
        let Some(body) = self.query(BODY_SELECTOR) else {
            return Vec::new();
        };
        let children = body.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
            .collect()
    }
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = el.style().set_property(property, value) {
        warn!("Failed to set {}: {:?}", property, e);
    }
}

fn clear_style(el: &HtmlElement, property: &str) {
    let _ = el.style().remove_property(property);
}

/// Start an opacity transition from `from` to `to`
fn fade(el: &HtmlElement, from: f64, to: f64, duration: Duration) {
    clear_style(el, "transition");
    set_style(el, "opacity", &from.to_string());
    // Force a reflow so the starting opacity is committed before the transition
    let _ = el.offset_width();
    set_style(el, "transition", &format!("opacity {}ms", duration.as_millis()));
    set_style(el, "opacity", &to.to_string());
}

fn px(value: f64) -> String {
    format!("{}px", value.round())
}

fn js_f64(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
}

impl Page for DomPage {
    type Node = Element;

    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_y: self.window.scroll_y().unwrap_or_default(),
            width: js_f64(self.window.inner_width()),
            height: js_f64(self.window.inner_height()),
        }
    }

    fn install_template(&mut self, html: &str) -> Result<(), FaceboxError> {
        let body = self
            .document
            .body()
            .ok_or_else(|| FaceboxError::template("document has no body"))?;
        body.insert_adjacent_html("beforeend", html)
            .map_err(|e| FaceboxError::template(format!("{:?}", e)))
    }

    fn decoration_backgrounds(&self) -> Vec<String> {
        DECORATION_SELECTORS
            .iter()
            .filter_map(|selector| self.query(selector))
            .filter_map(|el| self.window.get_computed_style(&el).ok().flatten())
            .filter_map(|style| style.get_property_value("background-image").ok())
            .collect()
    }

    fn warm_image(&mut self, url: &str) {
        match HtmlImageElement::new() {
            Ok(image) => image.set_src(url),
            Err(e) => warn!("Failed to preload {}: {:?}", url, e),
        }
    }

    fn overlay_present(&self) -> bool {
        self.document.get_element_by_id(OVERLAY_ID).is_some()
    }

    fn show_overlay(&mut self, opacity: f64, fade_duration: Duration) {
        if !self.overlay_present() {
            if let Some(body) = self.document.body() {
                let markup = format!(r#"<div id="{OVERLAY_ID}" class="{OVERLAY_HIDE_CLASS}"></div>"#);
                if let Err(e) = body.insert_adjacent_html("beforeend", &markup) {
                    warn!("Failed to create overlay: {:?}", e);
                    return;
                }
            }
        }
        let Some(overlay) = self.by_id(OVERLAY_ID) else {
            return;
        };
        let classes = overlay.class_list();
        let _ = classes.remove_1(OVERLAY_HIDE_CLASS);
        let _ = classes.add_1(OVERLAY_BG_CLASS);
        set_style(&overlay, "display", "block");
        fade(&overlay, 0.0, opacity, fade_duration);
    }

    fn fade_out_overlay(&mut self, fade_duration: Duration) {
        if let Some(overlay) = self.by_id(OVERLAY_ID) {
            let current = overlay
                .style()
                .get_property_value("opacity")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(1.0);
            fade(&overlay, current, 0.0, fade_duration);
        }
    }

    fn remove_overlay(&mut self) {
        if let Some(overlay) = self.by_id(OVERLAY_ID) {
            let classes = overlay.class_list();
            let _ = classes.remove_1(OVERLAY_BG_CLASS);
            let _ = classes.add_1(OVERLAY_HIDE_CLASS);
            overlay.remove();
        }
    }

    fn loading_present(&self) -> bool {
        self.query(LOADING_SELECTOR).is_some()
    }

    fn show_loading(&mut self, image_url: &str) {
        for child in self.body_children() {
            set_style(&child, "display", "none");
        }
        if let Some(body) = self.query(BODY_SELECTOR) {
            if let Err(e) = body.insert_adjacent_html("beforeend", &template::loading_markup(image_url)) {
                warn!("Failed to show loading indicator: {:?}", e);
            }
        }
    }

    fn remove_loading(&mut self) {
        while let Some(loading) = self.query(LOADING_SELECTOR) {
            loading.remove();
        }
    }

    fn clear_content(&mut self) {
        if let Some(content) = self.query(CONTENT_SELECTOR) {
            content.set_inner_html("");
        }
    }

    fn place_modal(&mut self, placement: Placement) {
        if let Some(modal) = self.by_id(MODAL_ID) {
            set_style(&modal, "top", &px(placement.top));
            set_style(&modal, "left", &px(placement.left));
        }
    }

    fn show_modal(&mut self) {
        if let Some(modal) = self.by_id(MODAL_ID) {
            clear_style(&modal, "transition");
            set_style(&modal, "opacity", "1");
            set_style(&modal, "display", "block");
        }
    }

    fn fade_out_modal(&mut self, fade_duration: Duration) {
        if let Some(modal) = self.by_id(MODAL_ID) {
            fade(&modal, 1.0, 0.0, fade_duration);
        }
    }

    fn hide_modal(&mut self) {
        if let Some(modal) = self.by_id(MODAL_ID) {
            set_style(&modal, "display", "none");
            clear_style(&modal, "transition");
            clear_style(&modal, "opacity");
        }
    }

    fn modal_width(&self) -> f64 {
        self.query(TABLE_SELECTOR)
            .map(|table| table.get_bounding_client_rect().width())
            .unwrap_or(INITIAL_HALF_WIDTH * 2.0)
    }

    fn fade_in_body(&mut self, fade_duration: Duration) {
        for child in self.body_children() {
            clear_style(&child, "display");
            fade(&child, 0.0, 1.0, fade_duration);
        }
    }

    fn add_content_class(&mut self, class: &str) {
        if let Some(content) = self.query(CONTENT_SELECTOR) {
            let _ = content.class_list().add_1(class);
        }
    }

    fn reset_content_class(&mut self) {
        if let Some(content) = self.query(CONTENT_SELECTOR) {
            content.set_class_name(CONTENT_CLASS);
        }
    }

    fn set_title(&mut self, html: &str) {
        if self.query(TITLE_SELECTOR).is_none() {
            // Removed by an earlier reveal without a title
            if let Some(content) = self.query(CONTENT_SELECTOR) {
                let _ = content.insert_adjacent_html("beforebegin", r#"<div class="title"></div>"#);
            }
        }
        if let Some(title) = self.query(TITLE_SELECTOR) {
            title.set_inner_html(html);
        }
    }

    fn remove_title(&mut self) {
        if let Some(title) = self.query(TITLE_SELECTOR) {
            title.remove();
        }
    }

    fn set_close_image(&mut self, url: &str) {
        if let Some(image) = self.query(CLOSE_IMAGE_SELECTOR) {
            let _ = image.set_attribute("src", url);
        }
    }

    fn append_html(&mut self, html: &str) {
        if let Some(content) = self.query(CONTENT_SELECTOR) {
            if let Err(e) = content.insert_adjacent_html("beforeend", html) {
                warn!("Failed to append content: {:?}", e);
            }
        }
    }

    fn append_node(&mut self, node: Element) {
        if let Some(content) = self.query(CONTENT_SELECTOR) {
            if let Err(e) = content.append_child(&node) {
                warn!("Failed to move element into facebox: {:?}", e);
            }
        }
    }

    fn detach_inline(&mut self, selector: &str) -> Option<Element> {
        let element = self.query(selector)?;
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            set_style(html, "display", "block");
        }

        let placeholder = match self.document.create_element("div") {
            Ok(el) => el,
            Err(e) => {
                warn!("Failed to create placeholder: {:?}", e);
                return Some(element);
            }
        };
        placeholder.set_id(PLACEHOLDER_ID);
        if let Err(e) = element.replace_with_with_node_1(&placeholder) {
            warn!("Failed to detach {}: {:?}", selector, e);
        }
        debug!("Detached {} into facebox", selector);
        Some(element)
    }

    fn placeholder_present(&self) -> bool {
        self.document.get_element_by_id(PLACEHOLDER_ID).is_some()
    }

    fn restore_inline(&mut self) {
        let Some(placeholder) = self.document.get_element_by_id(PLACEHOLDER_ID) else {
            return;
        };
        let Some(parent) = placeholder.parent_node() else {
            placeholder.remove();
            return;
        };

        if let Some(content) = self.query(CONTENT_SELECTOR) {
            let children = content.children();
            let moved: Vec<Element> = (0..children.length())
                .filter_map(|i| children.item(i))
                .collect();
            for child in moved {
                if let Some(html) = child.dyn_ref::<HtmlElement>() {
                    set_style(html, "display", "none");
                }
                if let Err(e) = parent.insert_before(&child, Some(&placeholder)) {
                    warn!("Failed to restore inline element: {:?}", e);
                }
            }
        }
        placeholder.remove();
    }
}
