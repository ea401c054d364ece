//! Last known contents of the store

use crate::record::RecordList;
use tokio::sync::watch;

/// Holds the most recent successful read. `None` until the first one.
///
/// Consumers read or subscribe; only the store client writes. Each write
/// replaces the previous value wholesale and the last writer wins.
#[derive(Debug)]
pub struct RecordListCache {
    sender: watch::Sender<Option<RecordList>>,
}

impl Default for RecordListCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordListCache {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn snapshot(&self) -> Option<RecordList> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every replacement
    pub fn subscribe(&self) -> watch::Receiver<Option<RecordList>> {
        self.sender.subscribe()
    }

    pub(crate) fn replace(&self, list: RecordList) {
        self.sender.send_replace(Some(list));
    }
}
