//! The modal controller
//!
//! One controller exists per page. It owns the [`Page`] it drives and walks
//! the box through its lifecycle:
//!
//! ```text
//! Uninitialized -> Idle -> Loading -> Revealed -> Closing -> Idle
//!                             \_________________/
//!                              (close while loading)
//! ```
//!
//! The controller does no I/O of its own. Work that completes later (remote
//! fetch, image preload, fade timers) is handed back to the host as a
//! [`Dispatch`] or [`CloseTicket`], and the host reports completion through
//! [`Controller::resolve`], [`Controller::fail`],
//! [`Controller::finish_modal_close`] and [`Controller::finish_overlay_close`].
//!
//! Every accepted open bumps a generation counter. Tickets carry the
//! generation they were issued for, so a fetch that lands after the box was
//! closed (or reopened for something else) is discarded instead of popping
//! the box back open.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::FaceboxError;
use crate::event::{EventBus, LifecycleEvent, SubscriptionId};
use crate::page::{Content, Page, Placement};
use crate::request::{classify_href, style_from_rel, ContentRequest, HrefTarget, Producer};
use crate::settings::{CallStyle, ImageMatcher, PageSettings, Settings};
use crate::template::css_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Template not yet injected
    Uninitialized,
    Idle,
    /// Spinner showing, waiting for content
    Loading,
    Revealed,
    /// Fading out
    Closing,
}

/// Proof that a reveal belongs to a particular loading cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTicket {
    generation: u64,
}

impl RevealTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Pending close: the host waits `fade()` and then reports completion
#[derive(Debug, Clone)]
pub struct CloseTicket {
    generation: u64,
    fade: Duration,
    overlay: bool,
    settings: Rc<Settings>,
}

impl CloseTicket {
    pub fn fade(&self) -> Duration {
        self.fade
    }

    /// Whether an overlay fade is also in flight
    pub fn has_overlay(&self) -> bool {
        self.overlay
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the host has to do after an open
pub enum Dispatch {
    /// A loading indicator was already showing, nothing happened
    Ignored,
    /// Content was revealed synchronously
    Revealed,
    /// GET the URL, then `resolve` with the body or `fail`
    Fetch { url: String, ticket: RevealTicket },
    /// Preload the image, then `resolve` with [`crate::image_markup`]
    Image { url: String, ticket: RevealTicket },
    /// Call the producer with the ticket, outside any borrow of the controller
    Deferred {
        producer: Producer,
        ticket: RevealTicket,
    },
}

impl Dispatch {
    pub fn ticket(&self) -> Option<RevealTicket> {
        match self {
            Self::Ignored | Self::Revealed => None,
            Self::Fetch { ticket, .. } | Self::Image { ticket, .. } | Self::Deferred { ticket, .. } => {
                Some(*ticket)
            }
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => f.write_str("Ignored"),
            Self::Revealed => f.write_str("Revealed"),
            Self::Fetch { url, ticket } => f
                .debug_struct("Fetch")
                .field("url", url)
                .field("ticket", ticket)
                .finish(),
            Self::Image { url, ticket } => f
                .debug_struct("Image")
                .field("url", url)
                .field("ticket", ticket)
                .finish(),
            Self::Deferred { ticket, .. } => f
                .debug_struct("Deferred")
                .field("ticket", ticket)
                .finish_non_exhaustive(),
        }
    }
}

/// Outcome of a ticketed completion
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The ticket's cycle is over; nothing changed
    Stale,
}

/// The loading/revealed cycle currently on screen
struct Cycle {
    generation: u64,
    settings: Rc<Settings>,
    placement: Placement,
}

pub struct Controller<P: Page> {
    page: P,
    page_settings: PageSettings,
    images: ImageMatcher,
    phase: Phase,
    generation: u64,
    cycle: Option<Cycle>,
    pending_close: Option<CloseTicket>,
    escape_armed: bool,
    close_armed: bool,
    /// `Init` has gone out; a retried setup does not repeat it
    announced: bool,
    bus: EventBus,
}

impl<P: Page> Controller<P> {
    pub fn new(page: P, page_settings: PageSettings) -> Result<Self, FaceboxError> {
        let images = page_settings.image_matcher()?;
        Ok(Self {
            page,
            page_settings,
            images,
            phase: Phase::Uninitialized,
            generation: 0,
            cycle: None,
            pending_close: None,
            escape_armed: false,
            close_armed: false,
            announced: false,
            bus: EventBus::new(),
        })
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn page_settings(&self) -> &PageSettings {
        &self.page_settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Settings of the cycle on screen, if any
    pub fn active_settings(&self) -> Option<&Settings> {
        self.cycle.as_ref().map(|c| c.settings.as_ref())
    }

    pub fn escape_armed(&self) -> bool {
        self.escape_armed
    }

    pub fn close_armed(&self) -> bool {
        self.close_armed
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&LifecycleEvent<'_>) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// One-time page setup. Later calls do nothing.
    pub fn init(&mut self) -> Result<(), FaceboxError> {
        if self.phase != Phase::Uninitialized {
            return Ok(());
        }

        // Observers hear about setup before the skeleton lands in the page
        if !self.announced {
            self.announced = true;
            self.bus.publish(&LifecycleEvent::Init);
        }
        self.page.install_template(&self.page_settings.template_html)?;
        self.phase = Phase::Idle;

        let close_image = self.page_settings.defaults.close_image.clone();
        let loading_image = self.page_settings.defaults.loading_image.clone();
        self.page.warm_image(&close_image);
        self.page.warm_image(&loading_image);
        for background in self.page.decoration_backgrounds() {
            if let Some(url) = css_url(&background) {
                self.page.warm_image(&url);
            }
        }

        info!("Facebox initialized");
        Ok(())
    }

    /// Initialize if needed and merge the call style over the page defaults
    pub fn settings(&mut self, style: &CallStyle) -> Result<Settings, FaceboxError> {
        self.init()?;
        Ok(self.page_settings.resolve(style)?)
    }

    /// Show the loading state and start resolving `request`
    pub fn open(
        &mut self,
        request: ContentRequest,
        style: impl Into<CallStyle>,
    ) -> Result<Dispatch, FaceboxError> {
        let settings = self.settings(&style.into())?;
        let Some(ticket) = self.begin_loading(settings)? else {
            return Ok(Dispatch::Ignored);
        };
        debug!("Facebox open: {:?}", request);

        let dispatch = match request {
            ContentRequest::Ajax(url) => Dispatch::Fetch { url, ticket },
            ContentRequest::Image(url) => Dispatch::Image { url, ticket },
            ContentRequest::Div(selector) => self.dispatch_href(&selector, ticket),
            ContentRequest::Html(html) => {
                self.apply_reveal(Content::Html(html));
                Dispatch::Revealed
            }
            ContentRequest::Producer(producer) => Dispatch::Deferred { producer, ticket },
        };
        Ok(dispatch)
    }

    /// Open from a marked anchor: `rel` may carry a `facebox.klass` suffix
    pub fn open_link(
        &mut self,
        href: &str,
        rel: Option<&str>,
        style: impl Into<CallStyle>,
    ) -> Result<Dispatch, FaceboxError> {
        let mut settings = self.settings(&style.into())?;
        if let Some(class) = rel.and_then(style_from_rel) {
            settings.css_class = Some(class);
        }
        let Some(ticket) = self.begin_loading(settings)? else {
            return Ok(Dispatch::Ignored);
        };
        Ok(self.dispatch_href(href, ticket))
    }

    /// Enter the loading state. Returns `None` when a loading indicator is
    /// already present, which is the only guard against overlapping opens.
    pub fn begin_loading(&mut self, settings: Settings) -> Result<Option<RevealTicket>, FaceboxError> {
        self.init()?;
        // A box still fading out is finished now so its spinner can't trip the guard
        self.settle_pending_close();
        if self.page.loading_present() {
            debug!("Facebox already loading, ignoring open");
            return Ok(None);
        }

        if self.page.placeholder_present() {
            // Reopened while showing inline content
            self.page.restore_inline();
        }
        self.page.reset_content_class();

        self.generation += 1;
        if settings.overlay_enabled() {
            self.page.show_overlay(settings.opacity, settings.fade_duration);
        } else if self.page.overlay_present() {
            self.page.remove_overlay();
        }

        self.page.clear_content();
        self.page.show_loading(&settings.loading_image);
        let placement = Placement::loading(&self.page.viewport());
        self.page.place_modal(placement);
        self.page.show_modal();
        self.escape_armed = true;
        self.close_armed = false;

        let settings = Rc::new(settings);
        self.cycle = Some(Cycle {
            generation: self.generation,
            settings: settings.clone(),
            placement,
        });
        self.phase = Phase::Loading;
        debug!("Facebox loading (generation {})", self.generation);
        self.bus.publish(&LifecycleEvent::Loading(&settings));

        Ok(Some(RevealTicket {
            generation: self.generation,
        }))
    }

    /// Reveal into the current loading cycle without a ticket
    pub fn reveal(&mut self, content: Content<P::Node>) -> Result<(), FaceboxError> {
        if self.phase != Phase::Loading {
            return Err(FaceboxError::NotLoading(self.phase));
        }
        self.apply_reveal(content);
        Ok(())
    }

    /// Reveal content for `ticket`, unless its cycle has ended
    pub fn resolve(&mut self, ticket: RevealTicket, content: Content<P::Node>) -> Resolution {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale reveal (generation {}, current {})",
                ticket.generation, self.generation
            );
            return Resolution::Stale;
        }
        self.apply_reveal(content);
        Resolution::Applied
    }

    /// Report that the content for `ticket` could not be loaded. The box
    /// keeps its spinner and stays dismissible.
    pub fn fail(&mut self, ticket: RevealTicket, reason: &str) -> Resolution {
        if !self.is_current(ticket) {
            debug!("Discarding stale failure: {}", reason);
            return Resolution::Stale;
        }
        let Some(settings) = self.cycle.as_ref().map(|c| c.settings.clone()) else {
            return Resolution::Stale;
        };
        warn!("Facebox content failed to load: {}", reason);
        self.bus.publish(&LifecycleEvent::LoadFailed {
            settings: &settings,
            reason,
        });
        Resolution::Applied
    }

    /// Start closing. Returns `None` when nothing is open or a close is
    /// already fading.
    pub fn close(&mut self) -> Option<CloseTicket> {
        if !matches!(self.phase, Phase::Loading | Phase::Revealed) {
            debug!("Facebox close ignored while {:?}", self.phase);
            return None;
        }
        let settings = self.cycle.as_ref()?.settings.clone();

        self.phase = Phase::Closing;
        self.bus.publish(&LifecycleEvent::Close);

        self.escape_armed = false;
        self.close_armed = false;
        let fade = settings.fade_duration;
        self.page.fade_out_modal(fade);
        let overlay = settings.overlay_enabled();
        if overlay {
            self.page.fade_out_overlay(fade);
        }

        let ticket = CloseTicket {
            generation: self.generation,
            fade,
            overlay,
            settings,
        };
        self.pending_close = Some(ticket.clone());
        Some(ticket)
    }

    /// Escape key pressed
    pub fn handle_escape(&mut self) -> Option<CloseTicket> {
        if self.escape_armed {
            self.close()
        } else {
            None
        }
    }

    /// Close control clicked
    pub fn handle_close_control(&mut self) -> Option<CloseTicket> {
        if self.close_armed {
            self.close()
        } else {
            None
        }
    }

    /// Backdrop clicked
    pub fn handle_overlay_click(&mut self) -> Option<CloseTicket> {
        if self.page.overlay_present() {
            self.close()
        } else {
            None
        }
    }

    /// The modal fade for `ticket` finished
    pub fn finish_modal_close(&mut self, ticket: &CloseTicket) {
        let matches = self
            .pending_close
            .as_ref()
            .is_some_and(|p| p.generation == ticket.generation);
        if !matches {
            debug!("Modal close for generation {} already settled", ticket.generation);
            return;
        }
        self.settle_pending_close();
    }

    /// The overlay fade for `ticket` finished
    pub fn finish_overlay_close(&mut self, ticket: &CloseTicket) {
        if !ticket.overlay {
            return;
        }
        if ticket.generation == self.generation {
            self.page.remove_overlay();
        } else {
            debug!("Overlay reused by generation {}, keeping it", self.generation);
        }
        self.run_after_close(&ticket.settings);
    }

    fn is_current(&self, ticket: RevealTicket) -> bool {
        self.phase == Phase::Loading
            && self
                .cycle
                .as_ref()
                .is_some_and(|c| c.generation == ticket.generation)
    }

    fn dispatch_href(&mut self, href: &str, ticket: RevealTicket) -> Dispatch {
        match classify_href(href, &self.page.location(), &self.images) {
            HrefTarget::Inline(selector) => {
                let content = match self.page.detach_inline(&selector) {
                    Some(node) => Content::Node(node),
                    None => {
                        debug!("No inline element matches {}", selector);
                        Content::Empty
                    }
                };
                self.apply_reveal(content);
                Dispatch::Revealed
            }
            HrefTarget::Image(url) => Dispatch::Image { url, ticket },
            HrefTarget::Remote(url) => Dispatch::Fetch { url, ticket },
        }
    }

    fn apply_reveal(&mut self, content: Content<P::Node>) {
        let Some((settings, placement)) = self
            .cycle
            .as_ref()
            .map(|c| (c.settings.clone(), c.placement))
        else {
            return;
        };

        self.bus.publish(&LifecycleEvent::BeforeReveal(&settings));
        if let Some(ref class) = settings.css_class {
            self.page.add_content_class(class);
        }
        match settings.title {
            Some(ref title) => self.page.set_title(title),
            None => self.page.remove_title(),
        }
        self.page.set_close_image(&settings.close_image);
        self.close_armed = true;

        match content {
            Content::Html(html) => self.page.append_html(&html),
            Content::Node(node) => self.page.append_node(node),
            Content::Empty => {}
        }
        self.page.remove_loading();
        self.page.fade_in_body(settings.fade_duration);

        let centered = placement.centered(&self.page.viewport(), self.page.modal_width());
        self.page.place_modal(centered);
        if let Some(cycle) = self.cycle.as_mut() {
            cycle.placement = centered;
        }

        self.phase = Phase::Revealed;
        debug!("Facebox revealed (generation {})", self.generation);
        self.bus.publish(&LifecycleEvent::Reveal(&settings));
    }

    /// Finish the modal half of a pending close right away. After-close
    /// belongs to the overlay teardown, so a cycle without an overlay never
    /// runs it.
    fn settle_pending_close(&mut self) {
        let Some(ticket) = self.pending_close.take() else {
            return;
        };

        self.page.hide_modal();
        if self.page.placeholder_present() {
            self.page.restore_inline();
        }
        self.page.reset_content_class();
        self.page.remove_loading();
        self.cycle = None;
        self.phase = Phase::Idle;
        debug!("Facebox closed (generation {})", ticket.generation);
    }

    fn run_after_close(&mut self, settings: &Settings) {
        if let Some(ref callback) = settings.after_close {
            callback.call();
        }
        self.bus.publish(&LifecycleEvent::AfterClose(settings));
    }
}
