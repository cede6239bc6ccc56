//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgress>`] via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive events as
//! the pipeline works through the book.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, a database record, or a terminal
//! progress bar — without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so a config holding
//! one can be shared freely across threads.
//!
//! # Example
//!
//! ```rust
//! use naskh::{ConversionProgress, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingProgress {
//!     done: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgress for CountingProgress {
//!     fn on_page_done(&self, page: usize, paragraphs: usize) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page} appended ({paragraphs} paragraphs)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingProgress {
//!     done: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress(counter as Arc<dyn ConversionProgress>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageError;

/// Called by the conversion pipeline as it processes each page.
///
/// Pages are processed strictly in order, one at a time, so events arrive
/// sequentially. All methods have default no-op implementations so callers
/// only override what they care about.
pub trait ConversionProgress: Send + Sync {
    /// Called once after range normalisation, before any page is rendered.
    ///
    /// `total` is the number of pages that will be processed.
    fn on_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a page's remote call is sent.
    ///
    /// `page` is the 1-indexed source page number, `ordinal` its 1-indexed
    /// position within this run.
    fn on_page_start(&self, page: usize, ordinal: usize, total: usize) {
        let _ = (page, ordinal, total);
    }

    /// Called when a page's paragraphs have been appended to the document.
    fn on_page_done(&self, page: usize, paragraphs: usize) {
        let _ = (page, paragraphs);
    }

    /// Called when a page is skipped because one of its stages failed.
    fn on_page_failed(&self, page: usize, error: &PageError) {
        let _ = (page, error);
    }

    /// Called once after all pages have been attempted.
    fn on_finish(&self, processed: usize, failed: usize) {
        let _ = (processed, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ConversionProgress for NoopProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TrackingProgress {
        starts: AtomicUsize,
        dones: AtomicUsize,
        fails: AtomicUsize,
        announced: AtomicUsize,
    }

    impl ConversionProgress for TrackingProgress {
        fn on_start(&self, total: usize) {
            self.announced.store(total, Ordering::SeqCst);
        }

        fn on_page_start(&self, _page: usize, _ordinal: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_done(&self, _page: usize, _paragraphs: usize) {
            self.dones.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_failed(&self, _page: usize, _error: &PageError) {
            self.fails.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_progress_does_not_panic() {
        let cb = NoopProgress;
        cb.on_start(5);
        cb.on_page_start(1, 1, 5);
        cb.on_page_done(1, 12);
        cb.on_page_failed(
            2,
            &PageError::GenerationFailed {
                page: 2,
                detail: "timeout".into(),
            },
        );
        cb.on_finish(4, 1);
    }

    #[test]
    fn tracking_progress_receives_events() {
        let tracker = TrackingProgress {
            starts: AtomicUsize::new(0),
            dones: AtomicUsize::new(0),
            fails: AtomicUsize::new(0),
            announced: AtomicUsize::new(0),
        };

        tracker.on_start(3);
        assert_eq!(tracker.announced.load(Ordering::SeqCst), 3);

        tracker.on_page_start(4, 1, 3);
        tracker.on_page_done(4, 20);
        tracker.on_page_start(5, 2, 3);
        tracker.on_page_failed(
            5,
            &PageError::UploadFailed {
                page: 5,
                detail: "HTTP 500".into(),
            },
        );
        tracker.on_page_start(6, 3, 3);
        tracker.on_page_done(6, 9);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.dones.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.fails.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_progress_works() {
        let cb: Arc<dyn ConversionProgress> = Arc::new(NoopProgress);
        cb.on_start(10);
        cb.on_page_start(1, 1, 10);
        cb.on_page_done(1, 3);
    }
}
