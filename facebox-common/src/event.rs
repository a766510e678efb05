//! Lifecycle notifications and the observer list that delivers them

use tracing::debug;

use crate::settings::Settings;

/// A lifecycle notification. Every event except `Init` and `Close` carries
/// the settings of the cycle it belongs to.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    /// First use on this page, fires once
    Init,
    Loading(&'a Settings),
    BeforeReveal(&'a Settings),
    /// Content is in place and visible (also known as after-reveal)
    Reveal(&'a Settings),
    /// A fetch or image load failed, the box is still showing its spinner
    LoadFailed {
        settings: &'a Settings,
        reason: &'a str,
    },
    Close,
    AfterClose(&'a Settings),
}

impl LifecycleEvent<'_> {
    /// Document event names this notification is published under
    pub fn dom_names(&self) -> &'static [&'static str] {
        match self {
            Self::Init => &["init.facebox"],
            Self::Loading(_) => &["loading.facebox"],
            Self::BeforeReveal(_) => &["beforeReveal.facebox"],
            Self::Reveal(_) => &["reveal.facebox", "afterReveal.facebox"],
            Self::LoadFailed { .. } => &["loadFailed.facebox"],
            Self::Close => &["close.facebox"],
            Self::AfterClose(_) => &["afterClose.facebox"],
        }
    }

    pub fn settings(&self) -> Option<&Settings> {
        match *self {
            Self::Init | Self::Close => None,
            Self::Loading(s) | Self::BeforeReveal(s) | Self::Reveal(s) | Self::AfterClose(s) => {
                Some(s)
            }
            Self::LoadFailed { settings, .. } => Some(settings),
        }
    }
}

pub type Observer = Box<dyn FnMut(&LifecycleEvent<'_>)>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of observers. Delivery is synchronous and in subscription
/// order. Observers must not call back into the controller that owns the
/// bus; hosts defer such calls to a later turn.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&LifecycleEvent<'_>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn publish(&mut self, event: &LifecycleEvent<'_>) {
        debug!("facebox event: {}", event.dom_names()[0]);
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_publish_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let l1 = log.clone();
        bus.subscribe(move |e| l1.borrow_mut().push(format!("a:{}", e.dom_names()[0])));
        let l2 = log.clone();
        bus.subscribe(move |e| l2.borrow_mut().push(format!("b:{}", e.dom_names()[0])));

        bus.publish(&LifecycleEvent::Init);
        assert_eq!(*log.borrow(), vec!["a:init.facebox", "b:init.facebox"]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);
        bus.publish(&LifecycleEvent::Close);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&LifecycleEvent::Close);
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_reveal_has_dual_name() {
        let s = Settings::default();
        assert_eq!(
            LifecycleEvent::Reveal(&s).dom_names(),
            &["reveal.facebox", "afterReveal.facebox"]
        );
        assert!(LifecycleEvent::Reveal(&s).settings().is_some());
        assert!(LifecycleEvent::Close.settings().is_none());
    }
}
