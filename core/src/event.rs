//! Ordered, weakly held listener lists for events raised by the store.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
};
use crossbeam_skiplist::SkipSet;

type Callback<E> = dyn Fn(&E) -> <E as Event>::HandlerReturnType + Send + Sync;

/// An event that can be dispatched to listeners.
pub trait Event: fmt::Debug + Send + Sync {
    /// What each listener returns.
    type HandlerReturnType: fmt::Debug;

    /// Folds a listener's return value into the event before the next listener
    /// sees it. Does nothing by default.
    fn update(&mut self, _handler_result: Self::HandlerReturnType) {}
}

struct ListenerEntry<E: Event> {
    callback: Weak<Callback<E>>,
    // Registration sequence number; the set is ordered by it.
    order: usize,
}

impl<E: Event> Eq for ListenerEntry<E> {}

impl<E: Event> PartialEq for ListenerEntry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl<E: Event> Ord for ListenerEntry<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order.cmp(&other.order)
    }
}

impl<E: Event> PartialOrd for ListenerEntry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

static NEXT_LISTENER: AtomicUsize = AtomicUsize::new(0);

/// Listeners for one event type, called in registration order.
///
/// Only weak references are held: a listener stays registered for as long as
/// its [`Listener`] handle is alive.
pub struct ListenerList<E: Event> {
    inner: SkipSet<ListenerEntry<E>>,
}

impl<E: Event + 'static> ListenerList<E> {
    pub fn new() -> Self {
        ListenerList { inner: SkipSet::new() }
    }

    /// Number of entries, including dropped listeners not yet cleaned up.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Calls every live listener in order, folding results into `event`.
    ///
    /// Entries whose handle has been dropped are removed. Only this crate can
    /// raise events.
    pub(crate) fn dispatch(&self, event: &mut E) {
        let mut stale = Vec::new();
        for entry in self.inner.iter() {
            match entry.callback.upgrade() {
                Some(callback) => {
                    let result = callback(event);
                    event.update(result);
                }
                None => stale.push(entry.order),
            }
        }

        for order in stale {
            // Entries compare by order only; the callback of the key is never used.
            let key = ListenerEntry::<E> { callback: Weak::<fn(&E) -> E::HandlerReturnType>::new(), order };
            self.inner.remove(&key);
        }
    }
}

impl<E: Event + 'static> Default for ListenerList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("listener_count", &self.inner.len())
            .finish()
    }
}

/// Registration handle. Dropping it deregisters the listener; its entry is
/// cleaned up on the next dispatch.
pub struct Listener<E: Event> {
    #[allow(dead_code)] // keeps the callback alive
    callback: Arc<Callback<E>>,
    order: usize,
}

impl<E: Event + 'static> Listener<E> {
    /// Registers `callback` with `listeners`. Keep the returned handle alive for
    /// as long as the callback should run.
    pub fn new<F>(listeners: &ListenerList<E>, callback: F) -> Self
    where
        F: Fn(&E) -> E::HandlerReturnType + Send + Sync + 'static,
    {
        let order = NEXT_LISTENER.fetch_add(1, Ordering::SeqCst);
        let callback: Arc<Callback<E>> = Arc::new(callback);
        listeners.inner.insert(ListenerEntry { callback: Arc::downgrade(&callback), order });
        Listener { callback, order }
    }
}

impl<E: Event> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("order", &self.order).finish()
    }
}

/// Defines a struct with one public [`ListenerList`] field per event type.
macro_rules! define_event_listeners {
    ($struct_name:ident { $($field_name:ident: $event_type:ty),* $(,)? }) => {
        /// Listener lists for the events raised by the owner.
        #[derive(Debug, Default)]
        pub struct $struct_name {
            $(
                pub $field_name: $crate::event::ListenerList<$event_type>,
            )*
        }

        impl $struct_name {
            pub fn new() -> Self {
                Self {
                    $(
                        $field_name: $crate::event::ListenerList::new(),
                    )*
                }
            }
        }
    };
}

pub(crate) use define_event_listeners;
