//! Markup skeleton injected into the page body on first use
//!
//! The box is a 3x3 table: corner cells (`tl`, `tr`, `bl`, `br`) and edge
//! cells (`b`) carry the border images, and the middle cell holds the title,
//! content and footer regions.

/// Id of the modal root element
pub const MODAL_ID: &str = "facebox";
/// Id of the backdrop element
pub const OVERLAY_ID: &str = "facebox_overlay";
/// Id of the placeholder left where an inline element was detached
pub const PLACEHOLDER_ID: &str = "facebox_moved";

pub const BODY_SELECTOR: &str = "#facebox .body";
pub const TITLE_SELECTOR: &str = "#facebox .title";
pub const CONTENT_SELECTOR: &str = "#facebox .content";
pub const LOADING_SELECTOR: &str = "#facebox .loading";
pub const CLOSE_SELECTOR: &str = "#facebox .close";
pub const CLOSE_IMAGE_SELECTOR: &str = "#facebox .close_image";
pub const TABLE_SELECTOR: &str = "#facebox table";

/// Class the content region is reset to on close
pub const CONTENT_CLASS: &str = "content";

/// Decoration cells whose background images are warmed at init
pub const DECORATION_SELECTORS: [&str; 5] = [
    "#facebox .b",
    "#facebox .bl",
    "#facebox .br",
    "#facebox .tl",
    "#facebox .tr",
];

pub const DEFAULT_TEMPLATE: &str = r##"
<div id="facebox" style="display: none">
  <div class="popup">
    <table>
      <tbody>
        <tr>
          <td class="tl"></td><td class="b"></td><td class="tr"></td>
        </tr>
        <tr>
          <td class="b"></td>
          <td class="body">
            <div class="title"></div>
            <div class="content">
            </div>
            <div class="footer">
              <a href="#" class="close">
                <img src="/facebox/closelabel.gif" title="close" class="close_image" />
              </a>
            </div>
          </td>
          <td class="b"></td>
        </tr>
        <tr>
          <td class="bl"></td><td class="b"></td><td class="br"></td>
        </tr>
      </tbody>
    </table>
  </div>
</div>"##;

/// Markup for the loading indicator
pub fn loading_markup(image_url: &str) -> String {
    format!(
        r#"<div class="loading"><img src="{}" /></div>"#,
        v_htmlescape::escape(image_url)
    )
}

/// Extract the URL from a computed `background-image` value.
///
/// Returns `None` for `none`, gradients, and anything else that isn't a
/// single `url(...)`.
pub fn css_url(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix("url(")?.strip_suffix(')')?.trim();
    let unquoted = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner);
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_has_regions() {
        for needle in [
            r#"id="facebox""#,
            r#"class="title""#,
            r#"class="content""#,
            r#"class="close""#,
            r##"<a href="#" class="close">"##,
            r#"class="close_image""#,
            r#"class="tl""#,
            r#"class="br""#,
        ] {
            assert!(DEFAULT_TEMPLATE.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_css_url_variants() {
        assert_eq!(css_url("url(/facebox/tl.png)").as_deref(), Some("/facebox/tl.png"));
        assert_eq!(
            css_url(r#"url("http://x.test/b.png")"#).as_deref(),
            Some("http://x.test/b.png")
        );
        assert_eq!(css_url("url('/q.png')").as_deref(), Some("/q.png"));
        assert_eq!(css_url("none"), None);
        assert_eq!(css_url("url()"), None);
        assert_eq!(css_url("linear-gradient(red, blue)"), None);
    }

    #[test]
    fn test_loading_markup_escapes_src() {
        let html = loading_markup(r#"/a".gif"#);
        assert!(html.contains("&quot;"));
        assert!(html.starts_with(r#"<div class="loading">"#));
    }
}
