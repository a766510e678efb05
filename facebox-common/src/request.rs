//! Content requests and href dispatch

use std::fmt;

use crate::controller::RevealTicket;
use crate::settings::ImageMatcher;

/// Callback invoked in place of content resolution. It receives the ticket
/// for the current loading cycle and resolves it later, usually after its
/// own async work.
pub type Producer = Box<dyn FnOnce(RevealTicket)>;

/// What the caller wants to show, before resolution
pub enum ContentRequest {
    /// Fetch the URL and show the returned text
    Ajax(String),
    /// Preload the image and show it once loaded
    Image(String),
    /// Detach an on-page element (`#id` reference) and show it
    Div(String),
    /// Show literal markup immediately
    Html(String),
    Producer(Producer),
}

impl ContentRequest {
    pub fn ajax(url: impl Into<String>) -> Self {
        Self::Ajax(url.into())
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::Image(url.into())
    }

    pub fn div(selector: impl Into<String>) -> Self {
        Self::Div(selector.into())
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self::Html(markup.into())
    }

    pub fn producer(f: impl FnOnce(RevealTicket) + 'static) -> Self {
        Self::Producer(Box::new(f))
    }
}

impl From<&str> for ContentRequest {
    fn from(markup: &str) -> Self {
        Self::Html(markup.to_string())
    }
}

impl From<String> for ContentRequest {
    fn from(markup: String) -> Self {
        Self::Html(markup)
    }
}

impl fmt::Debug for ContentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ajax(url) => f.debug_tuple("Ajax").field(url).finish(),
            Self::Image(url) => f.debug_tuple("Image").field(url).finish(),
            Self::Div(sel) => f.debug_tuple("Div").field(sel).finish(),
            Self::Html(html) => f.debug_tuple("Html").field(&html.len()).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// How an href resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HrefTarget {
    /// Selector of an on-page element
    Inline(String),
    Image(String),
    Remote(String),
}

/// Classify an href, in fixed priority order:
///
/// 1. contains `#` → on-page element. The current page URL (up to its own
///    `#`) is stripped once so absolute links to this page become `#id`.
/// 2. ends with a configured image extension → image
/// 3. anything else → remote fetch
pub fn classify_href(href: &str, page_url: &str, images: &ImageMatcher) -> HrefTarget {
    if href.contains('#') {
        let base = page_url.split('#').next().unwrap_or_default();
        let selector = if base.is_empty() {
            href.to_string()
        } else {
            href.replacen(base, "", 1)
        };
        HrefTarget::Inline(selector)
    } else if images.is_image(href) {
        HrefTarget::Image(href.to_string())
    } else {
        HrefTarget::Remote(href.to_string())
    }
}

/// Extract the style class from a `rel` marker.
///
/// Supports `facebox.inline_popup` and the older `facebox[.inline_popup]`.
pub fn style_from_rel(rel: &str) -> Option<String> {
    let rest = &rel[rel.find("facebox")? + "facebox".len()..];
    let rest = rest.strip_prefix('[').unwrap_or(rest);
    let rest = rest.strip_prefix('.')?;
    let class: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if class.is_empty() {
        None
    } else {
        Some(class)
    }
}

/// Markup shown for a loaded image
pub fn image_markup(src: &str) -> String {
    format!(
        r#"<div class="image"><img src="{}" /></div>"#,
        v_htmlescape::escape(src)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PageSettings;

    fn matcher() -> ImageMatcher {
        PageSettings::default().image_matcher().unwrap()
    }

    #[test]
    fn test_fragment_wins_over_image_suffix() {
        let m = matcher();
        assert_eq!(
            classify_href("#gallery.png", "http://x.test/page", &m),
            HrefTarget::Inline("#gallery.png".into())
        );
        assert_eq!(
            classify_href("pic.png#frag", "http://x.test/page", &m),
            HrefTarget::Inline("pic.png#frag".into())
        );
    }

    #[test]
    fn test_absolute_link_to_current_page_becomes_selector() {
        let m = matcher();
        assert_eq!(
            classify_href("http://x.test/page#terms", "http://x.test/page#top", &m),
            HrefTarget::Inline("#terms".into())
        );
    }

    #[test]
    fn test_image_suffix_case_insensitive() {
        let m = matcher();
        assert_eq!(
            classify_href("/img/Stairs.JPG", "http://x.test/", &m),
            HrefTarget::Image("/img/Stairs.JPG".into())
        );
    }

    #[test]
    fn test_everything_else_is_remote() {
        let m = matcher();
        for href in ["terms.html", "/remote", "pic.jpg.html", "http://x.test/a?b=c"] {
            assert_eq!(
                classify_href(href, "http://x.test/", &m),
                HrefTarget::Remote(href.into())
            );
        }
    }

    #[test]
    fn test_style_from_rel() {
        assert_eq!(style_from_rel("facebox.inline_popup").as_deref(), Some("inline_popup"));
        assert_eq!(style_from_rel("facebox[.wide]").as_deref(), Some("wide"));
        assert_eq!(style_from_rel("nofollow facebox.tall").as_deref(), Some("tall"));
        assert_eq!(style_from_rel("facebox"), None);
        assert_eq!(style_from_rel("facebox[]"), None);
        assert_eq!(style_from_rel("nofollow"), None);
    }

    #[test]
    fn test_image_markup() {
        assert_eq!(
            image_markup("pic.jpg"),
            r#"<div class="image"><img src="pic.jpg" /></div>"#
        );
    }
}
