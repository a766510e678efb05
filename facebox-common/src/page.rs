//! The host surface the controller drives
//!
//! A [`Page`] owns the real (or fake) document. The controller never touches
//! elements directly; it asks the page to mutate the regions named in
//! [`crate::template`]. Page operations are best-effort: implementations log
//! failures and carry on rather than aborting a lifecycle step.

use std::time::Duration;

use crate::error::FaceboxError;

/// Horizontal offset used before the box has been measured
pub const INITIAL_HALF_WIDTH: f64 = 205.0;

/// Scroll position and window size, in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Absolute position of the modal root
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
}

impl Placement {
    /// Near top-center, one tenth of the way down the visible area
    pub fn loading(viewport: &Viewport) -> Self {
        Self {
            top: viewport.scroll_y + viewport.height / 10.0,
            left: viewport.width / 2.0 - INITIAL_HALF_WIDTH,
        }
    }

    /// Same top, centered on the measured box width
    pub fn centered(self, viewport: &Viewport, modal_width: f64) -> Self {
        Self {
            top: self.top,
            left: viewport.width / 2.0 - modal_width / 2.0,
        }
    }
}

/// Resolved content ready to be appended to the content region
#[derive(Debug, Clone, PartialEq)]
pub enum Content<N> {
    Html(String),
    /// An element detached from the page
    Node(N),
    /// Nothing to show (missing inline target)
    Empty,
}

pub trait Page {
    /// Handle to a live element (detached inline content)
    type Node;

    /// Current page URL, used to turn absolute `#` links into selectors
    fn location(&self) -> String;
    fn viewport(&self) -> Viewport;

    fn install_template(&mut self, html: &str) -> Result<(), FaceboxError>;
    /// Computed `background-image` values of the decoration cells
    fn decoration_backgrounds(&self) -> Vec<String>;
    /// Start loading an image so later use hits the cache
    fn warm_image(&mut self, url: &str);

    // Overlay
    fn overlay_present(&self) -> bool;
    /// Create the overlay if missing, then fade it in at `opacity`
    fn show_overlay(&mut self, opacity: f64, fade: Duration);
    fn fade_out_overlay(&mut self, fade: Duration);
    fn remove_overlay(&mut self);

    // Modal box
    fn loading_present(&self) -> bool;
    /// Hide the body children and append the loading indicator
    fn show_loading(&mut self, image_url: &str);
    fn remove_loading(&mut self);
    fn clear_content(&mut self);
    fn place_modal(&mut self, placement: Placement);
    fn show_modal(&mut self);
    fn fade_out_modal(&mut self, fade: Duration);
    fn hide_modal(&mut self);
    fn modal_width(&self) -> f64;
    fn fade_in_body(&mut self, fade: Duration);

    // Regions
    fn add_content_class(&mut self, class: &str);
    /// Drop every class on the content region except the base one
    fn reset_content_class(&mut self);
    fn set_title(&mut self, html: &str);
    fn remove_title(&mut self);
    fn set_close_image(&mut self, url: &str);
    fn append_html(&mut self, html: &str);
    fn append_node(&mut self, node: Self::Node);

    // Inline content
    /// Show the element matching `selector`, put a placeholder where it was,
    /// and hand it back. `None` if nothing matches.
    fn detach_inline(&mut self, selector: &str) -> Option<Self::Node>;
    fn placeholder_present(&self) -> bool;
    /// Move the content children back, hidden, before the placeholder and
    /// remove the placeholder
    fn restore_inline(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_placement() {
        let vp = Viewport {
            scroll_y: 300.0,
            width: 1000.0,
            height: 800.0,
        };
        let p = Placement::loading(&vp);
        assert_eq!(p, Placement { top: 380.0, left: 295.0 });
    }

    #[test]
    fn test_centered_keeps_top() {
        let vp = Viewport {
            scroll_y: 0.0,
            width: 1000.0,
            height: 500.0,
        };
        let p = Placement::loading(&vp).centered(&vp, 600.0);
        assert_eq!(p, Placement { top: 50.0, left: 200.0 });
    }
}
