/// Page state definitions for tracking extraction progress
///
/// Each discovered page moves through a small state machine during
/// `fetch_all`; only the transitions listed in `can_transition_to` are legal.
use crate::DigestError;
use std::fmt;

/// Represents the current state of a page in the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Discovered, not yet fetched
    Pending,

    /// A plain HTTP response was received
    HttpFetched,

    /// Plain HTML was insufficient; waiting for a browser render
    NeedsRender,

    /// The browser produced HTML for the page
    Rendered,

    // ===== Terminal States =====
    /// Usable content was extracted
    Accepted,

    /// No usable content; the page carries an error
    Rejected,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use PageState::*;
        matches!(
            (self, next),
            (Pending, HttpFetched)
                | (Pending, Rejected)
                | (HttpFetched, Accepted)
                | (HttpFetched, NeedsRender)
                | (HttpFetched, Rejected)
                | (NeedsRender, Rendered)
                | (NeedsRender, Rejected)
                | (Rendered, Accepted)
                | (Rendered, Rejected)
        )
    }

    /// Returns a short lowercase name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::HttpFetched => "http_fetched",
            Self::NeedsRender => "needs_render",
            Self::Rendered => "rendered",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> &'static [PageState] {
        &[
            Self::Pending,
            Self::HttpFetched,
            Self::NeedsRender,
            Self::Rendered,
            Self::Accepted,
            Self::Rejected,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the state of a single page through the pipeline
#[derive(Debug, Clone)]
pub struct PageSlot {
    url: String,
    state: PageState,
}

impl PageSlot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: PageState::Pending,
        }
    }

    /// Creates a slot already waiting for a render
    pub fn awaiting_render(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: PageState::NeedsRender,
        }
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Moves the slot to `next`
    ///
    /// # Errors
    ///
    /// Returns `DigestError::InvalidTransition` if the step is not legal;
    /// the slot keeps its current state.
    pub fn advance(&mut self, next: PageState) -> Result<(), DigestError> {
        if !self.state.can_transition_to(next) {
            return Err(DigestError::InvalidTransition {
                url: self.url.clone(),
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PageState::Accepted.is_terminal());
        assert!(PageState::Rejected.is_terminal());
        assert!(!PageState::Pending.is_terminal());
        assert!(!PageState::NeedsRender.is_terminal());
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [PageState::Accepted, PageState::Rejected] {
            for to in PageState::all_states() {
                assert!(!from.can_transition_to(*to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_render_path() {
        let mut slot = PageSlot::new("https://a.com/app");
        slot.advance(PageState::HttpFetched).unwrap();
        slot.advance(PageState::NeedsRender).unwrap();
        slot.advance(PageState::Rendered).unwrap();
        slot.advance(PageState::Accepted).unwrap();
        assert_eq!(slot.state(), PageState::Accepted);
    }

    #[test]
    fn test_invalid_transition_keeps_state() {
        let mut slot = PageSlot::new("https://a.com/");
        let err = slot.advance(PageState::Rendered).unwrap_err();
        assert!(matches!(
            err,
            DigestError::InvalidTransition {
                from: PageState::Pending,
                to: PageState::Rendered,
                ..
            }
        ));
        assert_eq!(slot.state(), PageState::Pending);
    }

    #[test]
    fn test_transport_failure_rejects_directly() {
        let mut slot = PageSlot::new("https://a.com/");
        assert!(slot.advance(PageState::Rejected).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(PageState::NeedsRender.to_string(), "needs_render");
        assert_eq!(PageState::all_states().len(), 6);
    }
}
