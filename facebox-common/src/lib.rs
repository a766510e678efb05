//! facebox-common - Modal lightbox logic shared by every host
//!
//! Settings merging, content request dispatch, lifecycle events and the
//! controller state machine. Nothing here touches a browser; the DOM is
//! reached through the [`Page`] trait.

pub mod controller;
pub mod error;
pub mod event;
pub mod page;
pub mod request;
pub mod settings;
pub mod template;

pub use controller::{CloseTicket, Controller, Dispatch, Phase, Resolution, RevealTicket};
pub use error::{ConfigError, FaceboxError};
pub use event::{EventBus, LifecycleEvent, SubscriptionId};
pub use page::{Content, Page, Placement, Viewport};
pub use request::{classify_href, image_markup, style_from_rel, ContentRequest, HrefTarget, Producer};
pub use settings::{AfterClose, CallStyle, ImageMatcher, PageOverride, PageSettings, Settings, SettingsOverride};
