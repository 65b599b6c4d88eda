use std::fmt;

/// Where a single upload stands, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadProgress {
    Idle,
    Uploading { percent: u8 },
    Done,
    Failed { reason: String },
}

impl UploadProgress {
    /// Percentage to display. A failed upload shows 0.
    pub fn percent(&self) -> u8 {
        match self {
            UploadProgress::Idle | UploadProgress::Failed { .. } => 0,
            UploadProgress::Uploading { percent } => *percent,
            UploadProgress::Done => 100,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadProgress::Done | UploadProgress::Failed { .. })
    }
}

impl fmt::Display for UploadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadProgress::Idle => write!(f, "idle"),
            UploadProgress::Uploading { percent } => write!(f, "uploading {}%", percent),
            UploadProgress::Done => write!(f, "done"),
            UploadProgress::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// `round(sent * 100 / total)`, clamped to 100. An empty body is complete.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    ((sent * 100 + total / 2) / total) as u8
}

type Listener = Box<dyn FnMut(&UploadProgress) + Send>;

/// Drives [`UploadProgress`] for one upload and notifies a listener on every
/// state change. The reported percentage never goes backwards.
pub struct ProgressTracker {
    state: UploadProgress,
    total: u64,
    sent: u64,
    listener: Option<Listener>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            state: UploadProgress::Idle,
            total: 0,
            sent: 0,
            listener: None,
        }
    }

    pub fn with_listener(listener: impl FnMut(&UploadProgress) + Send + 'static) -> Self {
        Self {
            listener: Some(Box::new(listener)),
            ..Self::new()
        }
    }

    pub fn state(&self) -> &UploadProgress {
        &self.state
    }

    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    /// Resets to `Uploading { percent: 0 }` for a body of `total` bytes.
    pub fn start(&mut self, total: u64) {
        self.total = total;
        self.sent = 0;
        self.transition(UploadProgress::Uploading { percent: 0 });
    }

    /// Records `bytes` more confirmed sent.
    pub fn advance(&mut self, bytes: u64) {
        let UploadProgress::Uploading { percent: current } = self.state else {
            return;
        };

        self.sent = self.sent.saturating_add(bytes);
        let percent = percent_of(self.sent, self.total);
        tracing::debug!(sent = self.sent, total = self.total, percent, "upload progress");

        if percent > current {
            self.transition(UploadProgress::Uploading { percent });
        }
    }

    pub fn finish(&mut self) {
        if matches!(self.state, UploadProgress::Uploading { percent } if percent < 100) {
            self.transition(UploadProgress::Uploading { percent: 100 });
        }
        self.transition(UploadProgress::Done);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.transition(UploadProgress::Failed {
            reason: reason.into(),
        });
    }

    fn transition(&mut self, next: UploadProgress) {
        self.state = next;
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.state);
        }
    }
}
