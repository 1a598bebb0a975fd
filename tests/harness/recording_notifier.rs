use std::sync::{Arc, Mutex};

use tonrally::port::outbound::notifier::{BuyAlertNotice, Notice, Notifier};

/// Thread-safe notice collector for notification assertions in tests.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("lock notices").clone()
    }

    pub fn buy_alerts(&self) -> Vec<BuyAlertNotice> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::BuyAlert(alert) => Some(alert),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().expect("lock notices").len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("lock notices").push(notice);
    }
}
