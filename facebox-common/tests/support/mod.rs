use std::collections::BTreeMap;
use std::time::Duration;

use facebox_common::{FaceboxError, Page, Placement, Viewport};

/// Initialize tracing for tests with proper test output handling
#[allow(dead_code)]
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true)
        .try_init();
}

/// One child of the content region
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Html(String),
    /// An element moved in from the page, by selector
    Node(String),
}

/// In-memory page that records what the controller asked for
#[derive(Debug)]
#[allow(dead_code)]
pub struct FakePage {
    pub url: String,
    pub viewport: Viewport,
    pub modal_width: f64,
    pub fail_install: bool,

    pub template_installs: usize,
    pub installed_template: Option<String>,
    pub backgrounds: Vec<String>,
    pub warmed: Vec<String>,

    pub overlay: Option<f64>,
    pub overlays_created: usize,
    pub overlay_fading_out: bool,

    pub loading: Option<String>,
    pub body_hidden: bool,
    pub modal_visible: bool,
    pub modal_fading_out: bool,
    pub placement: Option<Placement>,

    pub content: Vec<Fragment>,
    pub content_classes: Vec<String>,
    pub title_present: bool,
    pub title: Option<String>,
    pub close_image: Option<String>,

    /// Elements living in the page body: selector -> visible
    pub page_elements: BTreeMap<String, bool>,
    pub placeholder: Option<String>,
}

impl Default for FakePage {
    fn default() -> Self {
        let mut page_elements = BTreeMap::new();
        page_elements.insert("#terms".to_string(), false);
        Self {
            url: "http://shop.test/checkout#top".to_string(),
            viewport: Viewport {
                scroll_y: 100.0,
                width: 1200.0,
                height: 900.0,
            },
            modal_width: 500.0,
            fail_install: false,
            template_installs: 0,
            installed_template: None,
            backgrounds: vec![
                "url(\"/facebox/b.png\")".to_string(),
                "none".to_string(),
                "url(/facebox/tl.png)".to_string(),
            ],
            warmed: Vec::new(),
            overlay: None,
            overlays_created: 0,
            overlay_fading_out: false,
            loading: None,
            body_hidden: false,
            modal_visible: false,
            modal_fading_out: false,
            placement: None,
            content: Vec::new(),
            content_classes: Vec::new(),
            title_present: true,
            title: None,
            close_image: None,
            page_elements,
            placeholder: None,
        }
    }
}

#[allow(dead_code)]
impl FakePage {
    pub fn html(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|f| match f {
                Fragment::Html(h) => Some(h.as_str()),
                Fragment::Node(_) => None,
            })
            .collect()
    }
}

impl Page for FakePage {
    type Node = String;

    fn location(&self) -> String {
        self.url.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn install_template(&mut self, html: &str) -> Result<(), FaceboxError> {
        if self.fail_install {
            return Err(FaceboxError::template("no body"));
        }
        self.template_installs += 1;
        self.installed_template = Some(html.to_string());
        Ok(())
    }

    fn decoration_backgrounds(&self) -> Vec<String> {
        self.backgrounds.clone()
    }

    fn warm_image(&mut self, url: &str) {
        self.warmed.push(url.to_string());
    }

    fn overlay_present(&self) -> bool {
        self.overlay.is_some()
    }

    fn show_overlay(&mut self, opacity: f64, _fade: Duration) {
        if self.overlay.is_none() {
            self.overlays_created += 1;
        }
        self.overlay = Some(opacity);
        self.overlay_fading_out = false;
    }

    fn fade_out_overlay(&mut self, _fade: Duration) {
        self.overlay_fading_out = true;
    }

    fn remove_overlay(&mut self) {
        self.overlay = None;
        self.overlay_fading_out = false;
    }

    fn loading_present(&self) -> bool {
        self.loading.is_some()
    }

    fn show_loading(&mut self, image_url: &str) {
        self.body_hidden = true;
        self.loading = Some(image_url.to_string());
    }

    fn remove_loading(&mut self) {
        self.loading = None;
    }

    fn clear_content(&mut self) {
        self.content.clear();
    }

    fn place_modal(&mut self, placement: Placement) {
        self.placement = Some(placement);
    }

    fn show_modal(&mut self) {
        self.modal_visible = true;
        self.modal_fading_out = false;
    }

    fn fade_out_modal(&mut self, _fade: Duration) {
        self.modal_fading_out = true;
    }

    fn hide_modal(&mut self) {
        self.modal_visible = false;
        self.modal_fading_out = false;
    }

    fn modal_width(&self) -> f64 {
        self.modal_width
    }

    fn fade_in_body(&mut self, _fade: Duration) {
        self.body_hidden = false;
    }

    fn add_content_class(&mut self, class: &str) {
        self.content_classes.push(class.to_string());
    }

    fn reset_content_class(&mut self) {
        self.content_classes.clear();
    }

    fn set_title(&mut self, html: &str) {
        self.title_present = true;
        self.title = Some(html.to_string());
    }

    fn remove_title(&mut self) {
        self.title_present = false;
        self.title = None;
    }

    fn set_close_image(&mut self, url: &str) {
        self.close_image = Some(url.to_string());
    }

    fn append_html(&mut self, html: &str) {
        self.content.push(Fragment::Html(html.to_string()));
    }

    fn append_node(&mut self, node: String) {
        self.content.push(Fragment::Node(node));
    }

    fn detach_inline(&mut self, selector: &str) -> Option<String> {
        self.page_elements.remove(selector)?;
        self.placeholder = Some(selector.to_string());
        Some(selector.to_string())
    }

    fn placeholder_present(&self) -> bool {
        self.placeholder.is_some()
    }

    fn restore_inline(&mut self) {
        for fragment in self.content.drain(..) {
            if let Fragment::Node(selector) = fragment {
                self.page_elements.insert(selector, false);
            }
        }
        self.placeholder = None;
    }
}
