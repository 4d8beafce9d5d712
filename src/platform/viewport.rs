use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::geometry::{ContainerSize, Real};

struct ViewportInner {
    size: Mutex<ContainerSize>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ContainerSize>>>,
}

/// Size of the element hosting the session, with resize notifications.
///
/// The host calls [`ViewportHandle::resize`] whenever the element changes
/// size; every subscriber receives every notification.
#[derive(Clone)]
pub struct ViewportHandle {
    inner: Arc<ViewportInner>,
}

impl ViewportHandle {
    pub fn new(width: Real, height: Real) -> Self {
        Self {
            inner: Arc::new(ViewportInner {
                size: Mutex::new(ContainerSize::new(width, height)),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn size(&self) -> ContainerSize {
        *self.inner.size.lock()
    }

    pub fn width(&self) -> Real {
        self.size().width
    }

    pub fn height(&self) -> Real {
        self.size().height
    }

    /// Record the new size and notify subscribers. Closed subscriptions are dropped.
    pub fn resize(&self, width: Real, height: Real) {
        let size = ContainerSize::new(width, height);
        *self.inner.size.lock() = size;
        self.inner
            .subscribers
            .lock()
            .retain(|tx| tx.send(size).is_ok());
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ContainerSize> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl std::fmt::Debug for ViewportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportHandle")
            .field("size", &self.size())
            .finish()
    }
}
