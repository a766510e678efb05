//! Facebox settings: defaults, overrides and the merge that builds them
//!
//! Settings are built once per invocation by layering, in order:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. the page-level override ([`PageOverride`], usually parsed from JSON)
//! 3. the call style ([`CallStyle`]): either a bare CSS class name or a
//!    full [`SettingsOverride`]
//!
//! Legacy key spellings (`loading_image`, `fadeSpeed`, `facebox_html`, ...)
//! are folded in by serde aliases at parse time, so nothing downstream has
//! to check for alternate names.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::template::DEFAULT_TEMPLATE;

pub const DEFAULT_FADE_MS: u64 = 200;
pub const DEFAULT_LOADING_IMAGE: &str = "/facebox/loading.gif";
pub const DEFAULT_CLOSE_IMAGE: &str = "/facebox/closelabel.gif";
pub const DEFAULT_IMAGE_TYPES: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Callback run once the box has fully closed
#[derive(Clone)]
pub struct AfterClose(Rc<dyn Fn()>);

impl AfterClose {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self) {
        (self.0)()
    }
}

impl fmt::Debug for AfterClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AfterClose(..)")
    }
}

impl PartialEq for AfterClose {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Resolved settings for one open/reveal/close cycle
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Backdrop opacity, 0 disables the overlay entirely
    pub opacity: f64,
    pub fade_duration: Duration,
    pub loading_image: String,
    pub close_image: String,
    pub after_close: Option<AfterClose>,
    /// Extra class applied to the content region
    pub css_class: Option<String>,
    pub title: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            fade_duration: Duration::from_millis(DEFAULT_FADE_MS),
            loading_image: DEFAULT_LOADING_IMAGE.to_string(),
            close_image: DEFAULT_CLOSE_IMAGE.to_string(),
            after_close: None,
            css_class: None,
            title: None,
        }
    }
}

impl Settings {
    pub fn overlay_enabled(&self) -> bool {
        self.opacity > 0.0
    }

    /// Layer an override on top of these settings. Keys absent from the
    /// override keep their current value.
    pub fn apply(&mut self, over: &SettingsOverride) -> Result<(), ConfigError> {
        if let Some(opacity) = over.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ConfigError::InvalidOpacity(opacity));
            }
            self.opacity = opacity;
        }
        if let Some(ms) = over.fade_duration_ms {
            self.fade_duration = Duration::from_millis(ms);
        }
        if let Some(ref url) = over.loading_image {
            self.loading_image = url.clone();
        }
        if let Some(ref url) = over.close_image {
            self.close_image = url.clone();
        }
        if let Some(ref cb) = over.after_close {
            self.after_close = Some(cb.clone());
        }
        if let Some(ref class) = over.css_class {
            self.css_class = Some(class.clone());
        }
        if let Some(ref title) = over.title {
            self.title = Some(title.clone());
        }
        Ok(())
    }
}

/// Partial settings. Every field left `None` falls through to the layer below.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverride {
    pub opacity: Option<f64>,
    #[serde(alias = "fadeSpeed", alias = "fade_speed")]
    pub fade_duration_ms: Option<u64>,
    #[serde(alias = "loading_image")]
    pub loading_image: Option<String>,
    #[serde(alias = "close_image")]
    pub close_image: Option<String>,
    #[serde(alias = "css_class")]
    pub css_class: Option<String>,
    pub title: Option<String>,
    #[serde(skip)]
    pub after_close: Option<AfterClose>,
}

impl SettingsOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn fade_duration_ms(mut self, ms: u64) -> Self {
        self.fade_duration_ms = Some(ms);
        self
    }

    pub fn loading_image(mut self, url: impl Into<String>) -> Self {
        self.loading_image = Some(url.into());
        self
    }

    pub fn close_image(mut self, url: impl Into<String>) -> Self {
        self.close_image = Some(url.into());
        self
    }

    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn after_close(mut self, f: impl Fn() + 'static) -> Self {
        self.after_close = Some(AfterClose::new(f));
        self
    }
}

/// Page-scope override: per-call defaults plus the page-only keys
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverride {
    #[serde(flatten)]
    pub settings: SettingsOverride,
    #[serde(alias = "image_types")]
    pub image_types: Option<Vec<String>>,
    #[serde(alias = "facebox_html", alias = "faceboxHtml")]
    pub template_html: Option<String>,
}

impl PageOverride {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How a single call customizes the page defaults
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CallStyle {
    #[default]
    Default,
    /// Shorthand: only sets `css_class`
    Class(String),
    Override(SettingsOverride),
}

impl From<&str> for CallStyle {
    fn from(class: &str) -> Self {
        CallStyle::Class(class.to_string())
    }
}

impl From<String> for CallStyle {
    fn from(class: String) -> Self {
        CallStyle::Class(class)
    }
}

impl From<SettingsOverride> for CallStyle {
    fn from(over: SettingsOverride) -> Self {
        CallStyle::Override(over)
    }
}

impl From<()> for CallStyle {
    fn from(_: ()) -> Self {
        CallStyle::Default
    }
}

/// Settings that live for the whole page
#[derive(Clone, Debug, PartialEq)]
pub struct PageSettings {
    /// Per-call defaults, page override already applied
    pub defaults: Settings,
    pub image_types: Vec<String>,
    pub template_html: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            defaults: Settings::default(),
            image_types: DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
            template_html: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PageSettings {
    pub fn from_override(over: &PageOverride) -> Result<Self, ConfigError> {
        let mut page = Self::default();
        page.defaults.apply(&over.settings)?;
        if let Some(ref types) = over.image_types {
            page.image_types = types.clone();
        }
        if let Some(ref html) = over.template_html {
            page.template_html = html.clone();
        }
        Ok(page)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_override(&PageOverride::from_json(json)?)
    }

    /// Merge the call style onto the page defaults
    pub fn resolve(&self, style: &CallStyle) -> Result<Settings, ConfigError> {
        let mut settings = self.defaults.clone();
        match style {
            CallStyle::Default => {}
            CallStyle::Class(class) => settings.css_class = Some(class.clone()),
            CallStyle::Override(over) => settings.apply(over)?,
        }
        Ok(settings)
    }

    /// Compile the configured image extensions into a suffix matcher
    pub fn image_matcher(&self) -> Result<ImageMatcher, ConfigError> {
        ImageMatcher::new(&self.image_types)
    }
}

/// Case-insensitive `\.(ext|ext|...)$` matcher built from the image types
#[derive(Clone, Debug)]
pub struct ImageMatcher(Option<Regex>);

impl ImageMatcher {
    pub fn new<S: AsRef<str>>(types: &[S]) -> Result<Self, ConfigError> {
        let alternatives: Vec<String> = types
            .iter()
            .map(|t| t.as_ref().trim().trim_start_matches('.'))
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(Self(None));
        }

        let pattern = format!(r"\.({})$", alternatives.join("|"));
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self(Some(regex)))
    }

    pub fn is_image(&self, href: &str) -> bool {
        self.0.as_ref().is_some_and(|re| re.is_match(href))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.opacity, 0.0);
        assert_eq!(s.fade_duration, Duration::from_millis(200));
        assert_eq!(s.loading_image, "/facebox/loading.gif");
        assert_eq!(s.close_image, "/facebox/closelabel.gif");
        assert!(s.after_close.is_none());
        assert!(s.css_class.is_none());
        assert!(s.title.is_none());
        assert!(!s.overlay_enabled());
    }

    #[test]
    fn test_override_keys_win_absent_keys_default() {
        let page = PageSettings::default();
        let over = SettingsOverride::new().opacity(0.4).title("Terms");
        let s = page.resolve(&over.into()).unwrap();
        assert_eq!(s.opacity, 0.4);
        assert_eq!(s.title.as_deref(), Some("Terms"));
        assert_eq!(s.fade_duration, Settings::default().fade_duration);
        assert_eq!(s.loading_image, DEFAULT_LOADING_IMAGE);
        assert_eq!(s.close_image, DEFAULT_CLOSE_IMAGE);
        assert!(s.css_class.is_none());
    }

    #[test]
    fn test_class_shorthand_only_sets_css_class() {
        let page = PageSettings::default();
        let s = page.resolve(&"my-groovy-style".into()).unwrap();
        let expected = Settings {
            css_class: Some("my-groovy-style".to_string()),
            ..Settings::default()
        };
        assert_eq!(s, expected);
    }

    #[test]
    fn test_call_override_layers_over_page_override() {
        let page = PageSettings::from_json(r#"{"opacity": 0.2, "fadeDurationMs": 50}"#).unwrap();
        let s = page
            .resolve(&SettingsOverride::new().opacity(0.9).into())
            .unwrap();
        assert_eq!(s.opacity, 0.9);
        assert_eq!(s.fade_duration, Duration::from_millis(50));
    }

    #[test]
    fn test_legacy_aliases() {
        let over = PageOverride::from_json(
            r#"{
                "loading_image": "/img/spin.gif",
                "close_image": "/img/x.gif",
                "fadeSpeed": 75,
                "image_types": ["webp"],
                "facebox_html": "<div id=\"facebox\"></div>"
            }"#,
        )
        .unwrap();
        let page = PageSettings::from_override(&over).unwrap();
        assert_eq!(page.defaults.loading_image, "/img/spin.gif");
        assert_eq!(page.defaults.close_image, "/img/x.gif");
        assert_eq!(page.defaults.fade_duration, Duration::from_millis(75));
        assert_eq!(page.image_types, vec!["webp"]);
        assert_eq!(page.template_html, "<div id=\"facebox\"></div>");
    }

    #[test]
    fn test_camel_case_keys() {
        let over = SettingsOverride::from_json(
            r#"{"loadingImage": "/a.gif", "closeImage": "/b.gif", "cssClass": "wide"}"#,
        )
        .unwrap();
        assert_eq!(over.loading_image.as_deref(), Some("/a.gif"));
        assert_eq!(over.close_image.as_deref(), Some("/b.gif"));
        assert_eq!(over.css_class.as_deref(), Some("wide"));
    }

    #[test]
    fn test_invalid_opacity_rejected() {
        let page = PageSettings::default();
        let err = page
            .resolve(&SettingsOverride::new().opacity(1.5).into())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOpacity(v) if v == 1.5));

        let err = page
            .resolve(&SettingsOverride::new().opacity(f64::NAN).into())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOpacity(_)));
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = PageSettings::from_json("{opacity: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_after_close_survives_merge() {
        let over = SettingsOverride::new().after_close(|| {});
        let cb = over.after_close.clone();
        let s = PageSettings::default().resolve(&over.into()).unwrap();
        assert_eq!(s.after_close, cb);
    }

    #[test]
    fn test_image_matcher_case_insensitive_suffix() {
        let m = PageSettings::default().image_matcher().unwrap();
        assert!(m.is_image("pic.jpg"));
        assert!(m.is_image("/photos/STAIRS.JPEG"));
        assert!(m.is_image("a.Gif"));
        assert!(!m.is_image("terms.html"));
        assert!(!m.is_image("jpg"));
        assert!(!m.is_image("pic.jpg?size=large"));
    }

    #[test]
    fn test_image_matcher_escapes_types() {
        let m = ImageMatcher::new(&["t+t", ".svg"]).unwrap();
        assert!(m.is_image("x.t+t"));
        assert!(!m.is_image("x.ttt"));
        assert!(m.is_image("logo.SVG"));
    }

    #[test]
    fn test_empty_image_types_match_nothing() {
        let m = ImageMatcher::new::<&str>(&[]).unwrap();
        assert!(!m.is_image("pic.png"));
    }
}
