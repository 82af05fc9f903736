//! In-flight request counter shared by the stores.

use tokio::sync::watch;

/// Counts operations in flight; observers see the count through a watch
/// channel and treat any non-zero value as "loading".
#[derive(Debug)]
pub(crate) struct InFlight {
    count: watch::Sender<usize>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// Mark one operation as started. The count drops again when the
    /// returned guard goes out of scope, whichever way the operation ends.
    pub(crate) fn begin(&self) -> InFlightGuard<'_> {
        self.count.send_modify(|count| *count += 1);
        InFlightGuard { owner: self }
    }

    pub(crate) fn is_active(&self) -> bool {
        *self.count.borrow() > 0
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}

/// Decrements the owning counter on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    owner: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .count
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}
