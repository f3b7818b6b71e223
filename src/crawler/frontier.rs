//! Per-page crawl phases
//!
//! Every page of results walks the same ladder: it is untouched, then its
//! listings are being discovered, then its pending listings are being
//! drained sweep by sweep, and finally every listing is visited and the
//! page is complete. Completion is monotonic; the orchestrator never
//! returns to a completed page.

use std::fmt;

/// Phase of one results page within a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagePhase {
    /// Page has not been fetched yet
    NotStarted,

    /// Page is being fetched and its listings merged into the store
    Discovering,

    /// Pending listings are being visited, sweep by sweep
    Draining,

    /// Every listing on the page has been visited
    Complete,
}

impl PagePhase {
    /// Returns true if `next` is a legal transition from this phase
    ///
    /// The ladder only moves forward: NotStarted → Discovering → Draining
    /// → Complete. Repeated drain sweeps stay in Draining and are counted
    /// separately, not modeled as transitions.
    pub fn can_advance_to(self, next: PagePhase) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Discovering)
                | (Self::Discovering, Self::Draining)
                | (Self::Draining, Self::Complete)
        )
    }

    /// Returns true once the page needs no further work
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Discovering => "discovering",
            Self::Draining => "draining",
            Self::Complete => "complete",
        }
    }

    /// Returns all phases in ladder order
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::NotStarted,
            Self::Discovering,
            Self::Draining,
            Self::Complete,
        ]
    }
}

impl fmt::Display for PagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one page's phase and drain-sweep count
#[derive(Debug)]
pub struct PageProgress {
    page: u32,
    phase: PagePhase,
    sweeps: u32,
}

impl PageProgress {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            phase: PagePhase::NotStarted,
            sweeps: 0,
        }
    }

    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    /// Moves to the next phase; returns false (and stays put) on an
    /// illegal transition.
    pub fn advance(&mut self, next: PagePhase) -> bool {
        if !self.phase.can_advance_to(next) {
            tracing::warn!(
                "Page {}: refusing phase change {} -> {}",
                self.page,
                self.phase,
                next
            );
            return false;
        }
        tracing::debug!("Page {}: {} -> {}", self.page, self.phase, next);
        self.phase = next;
        true
    }

    /// Counts one drain sweep; returns the total so far
    pub fn record_sweep(&mut self) -> u32 {
        self.sweeps += 1;
        self.sweeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_moves_forward_only() {
        assert!(PagePhase::NotStarted.can_advance_to(PagePhase::Discovering));
        assert!(PagePhase::Discovering.can_advance_to(PagePhase::Draining));
        assert!(PagePhase::Draining.can_advance_to(PagePhase::Complete));
    }

    #[test]
    fn test_no_backward_or_skipping_transitions() {
        for from in PagePhase::all_phases() {
            for to in PagePhase::all_phases() {
                let legal = matches!(
                    (from, to),
                    (PagePhase::NotStarted, PagePhase::Discovering)
                        | (PagePhase::Discovering, PagePhase::Draining)
                        | (PagePhase::Draining, PagePhase::Complete)
                );
                assert_eq!(
                    from.can_advance_to(to),
                    legal,
                    "transition {:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_complete_is_terminal() {
        for to in PagePhase::all_phases() {
            assert!(!PagePhase::Complete.can_advance_to(to));
        }
        assert!(PagePhase::Complete.is_complete());
        assert!(!PagePhase::Draining.is_complete());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PagePhase::NotStarted), "not_started");
        assert_eq!(format!("{}", PagePhase::Discovering), "discovering");
        assert_eq!(format!("{}", PagePhase::Draining), "draining");
        assert_eq!(format!("{}", PagePhase::Complete), "complete");
    }

    #[test]
    fn test_progress_walks_the_ladder() {
        let mut progress = PageProgress::new(3);
        assert_eq!(progress.phase(), PagePhase::NotStarted);

        assert!(progress.advance(PagePhase::Discovering));
        assert!(progress.advance(PagePhase::Draining));
        assert!(progress.advance(PagePhase::Complete));
        assert!(progress.phase().is_complete());
    }

    #[test]
    fn test_progress_refuses_illegal_jump() {
        let mut progress = PageProgress::new(1);
        assert!(!progress.advance(PagePhase::Complete));
        assert_eq!(progress.phase(), PagePhase::NotStarted);
    }

    #[test]
    fn test_sweep_counter() {
        let mut progress = PageProgress::new(1);
        progress.advance(PagePhase::Discovering);
        progress.advance(PagePhase::Draining);

        assert_eq!(progress.sweeps(), 0);
        assert_eq!(progress.record_sweep(), 1);
        assert_eq!(progress.record_sweep(), 2);
    }
}
