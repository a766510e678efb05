//! Network and timer helpers for the async half of a facebox cycle

use tracing::debug;
use wasm_bindgen_futures_x::JsFuture;
use web_sys_x::HtmlImageElement;

/// Resolve `url` against the current page so relative links fetch correctly
pub fn absolute_url(url: &str) -> String {
    let base = web_sys_x::window().and_then(|w| w.location().href().ok());
    match base {
        Some(base) => web_sys_x::Url::new_with_base(url, &base)
            .map(|u| u.href())
            .unwrap_or_else(|_| url.to_string()),
        None => url.to_string(),
    }
}

/// GET `url` and return the response body as text
pub async fn fetch_text(url: &str) -> Result<String, String> {
    let url = absolute_url(url);
    debug!("Fetching facebox content from {}", url);
    let resp = reqwest::get(&url)
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.status().is_success() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.text().await.map_err(|e| format!("Read error: {e}"))
}

/// Preload an image and return its resolved `src` once it has loaded
pub async fn load_image(url: &str) -> Result<String, String> {
    let image = HtmlImageElement::new().map_err(|e| format!("Image error: {e:?}"))?;
    let promise = js_sys_x::Promise::new(&mut |resolve, reject| {
        image.set_onload(Some(&resolve));
        image.set_onerror(Some(&reject));
    });
    image.set_src(url);

    let loaded = JsFuture::from(promise).await;
    image.set_onload(None);
    image.set_onerror(None);
    loaded.map_err(|_| format!("Image failed to load: {url}"))?;

    Ok(image.src())
}

/// Browser timers take a `u32`; longer waits saturate instead of wrapping
pub fn timeout_ms(ms: u64) -> u32 {
    u32::try_from(ms).unwrap_or(u32::MAX)
}

#[cfg(target_arch = "wasm32")]
pub async fn sleep_ms(ms: u64) {
    gloo_timers::future::TimeoutFuture::new(timeout_ms(ms)).await;
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_saturates() {
        assert_eq!(timeout_ms(200), 200);
        assert_eq!(timeout_ms(u64::from(u32::MAX)), u32::MAX);
        assert_eq!(timeout_ms(u64::from(u32::MAX) + 5), u32::MAX);
    }
}
