use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::MediaProfile;

/// Opaque identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintJobId(u64);

impl PrintJobId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PrintJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrintJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "print-job-{}", self.0)
    }
}

/// Printer the host should route the job to; `None` means the host default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintTarget {
    pub name: String,
}

/// Options supplied when handing a letter to the host print facility.
#[derive(Debug, Clone)]
pub struct PrintJobOptions {
    pub job_id: PrintJobId,
    pub title: String,
    pub target: Option<PrintTarget>,
    pub media: MediaProfile,
    /// Scale the host applies when rendering print media; a hint only, it never
    /// feeds back into pagination.
    pub zoom_percent: u32,
    pub copies: u32,
}

impl PrintJobOptions {
    pub fn new(title: impl Into<String>, media: MediaProfile) -> Self {
        Self {
            job_id: PrintJobId::new(),
            title: title.into(),
            target: None,
            media,
            zoom_percent: 100,
            copies: 1,
        }
    }

    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target = Some(PrintTarget { name: name.into() });
        self
    }

    pub fn with_zoom(mut self, zoom_percent: u32) -> Self {
        self.zoom_percent = zoom_percent.max(1);
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies.max(1);
        self
    }
}

/// Final state of a print job run, for analytics/UI markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintJobControllerState {
    Completed,
    /// The letter had no content, so nothing was sent to the printer.
    Skipped,
    Cancelled,
    Failed,
}
