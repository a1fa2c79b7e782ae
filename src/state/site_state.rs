/// Site state definitions for the per-website crawl
///
/// A site moves `Start -> HomepageFetched -> (EmailsFound | NeedsRelevantPageScan) -> Done`.
/// Skips and failures jump straight to `Done`.
use crate::HarvestError;
use std::fmt;

/// Represents where a single website is in its crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteState {
    /// Site record received, nothing fetched yet
    Start,

    /// Homepage content is available (or its fetch failed and counts as empty)
    HomepageFetched,

    /// At least one email was found
    EmailsFound,

    /// The homepage had no email; relevant subpages are being scanned
    NeedsRelevantPageScan,

    /// Terminal
    Done,
}

impl SiteState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: SiteState) -> bool {
        use SiteState::*;
        matches!(
            (self, next),
            (Start, HomepageFetched)
                | (Start, Done)
                | (HomepageFetched, EmailsFound)
                | (HomepageFetched, NeedsRelevantPageScan)
                | (HomepageFetched, Done)
                | (NeedsRelevantPageScan, EmailsFound)
                | (NeedsRelevantPageScan, Done)
                | (EmailsFound, Done)
        )
    }

    /// Moves to `next`, rejecting illegal steps
    pub fn transition(self, next: SiteState) -> Result<SiteState, HarvestError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::HomepageFetched => "homepage_fetched",
            Self::EmailsFound => "emails_found",
            Self::NeedsRelevantPageScan => "needs_relevant_page_scan",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_homepage() {
        let state = SiteState::Start
            .transition(SiteState::HomepageFetched)
            .and_then(|s| s.transition(SiteState::EmailsFound))
            .and_then(|s| s.transition(SiteState::Done))
            .unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_happy_path_relevant_scan() {
        let state = SiteState::Start
            .transition(SiteState::HomepageFetched)
            .and_then(|s| s.transition(SiteState::NeedsRelevantPageScan))
            .and_then(|s| s.transition(SiteState::EmailsFound))
            .and_then(|s| s.transition(SiteState::Done))
            .unwrap();
        assert_eq!(state, SiteState::Done);
    }

    #[test]
    fn test_skip_goes_straight_to_done() {
        assert!(SiteState::Start.can_transition_to(SiteState::Done));
    }

    #[test]
    fn test_done_is_final() {
        for next in [
            SiteState::Start,
            SiteState::HomepageFetched,
            SiteState::EmailsFound,
            SiteState::NeedsRelevantPageScan,
            SiteState::Done,
        ] {
            assert!(!SiteState::Done.can_transition_to(next));
        }
    }

    #[test]
    fn test_cannot_scan_before_homepage() {
        let err = SiteState::Start
            .transition(SiteState::NeedsRelevantPageScan)
            .unwrap_err();
        assert!(matches!(
            err,
            HarvestError::InvalidTransition {
                from: SiteState::Start,
                to: SiteState::NeedsRelevantPageScan
            }
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SiteState::HomepageFetched), "homepage_fetched");
        assert_eq!(format!("{}", SiteState::Done), "done");
    }
}
