use std::fmt;

/// How the crawl of one website ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteOutcome {
    /// The tracking redirect could not be resolved; the site is unknown
    SkippedUnresolved,

    /// The canonical website URL was already tracked (or already in flight)
    SkippedDuplicate,

    /// Emails were found on the homepage
    EmailsFoundHomepage,

    /// Emails were found on a relevant subpage
    EmailsFoundRelevant,

    /// Homepage and all relevant pages were scanned without result
    NoEmails,

    /// The run was cancelled before the site finished; nothing was committed
    Cancelled,
}

impl SiteOutcome {
    /// Returns true if the site yielded at least one email
    pub fn is_success(&self) -> bool {
        matches!(self, Self::EmailsFoundHomepage | Self::EmailsFoundRelevant)
    }

    /// Returns true if the site was skipped without fetching any page
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedUnresolved | Self::SkippedDuplicate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkippedUnresolved => "skipped-unresolved",
            Self::SkippedDuplicate => "skipped-duplicate",
            Self::EmailsFoundHomepage => "emails-found-homepage",
            Self::EmailsFoundRelevant => "emails-found-relevant",
            Self::NoEmails => "no-emails",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns all possible outcomes
    pub fn all_outcomes() -> Vec<Self> {
        vec![
            Self::SkippedUnresolved,
            Self::SkippedDuplicate,
            Self::EmailsFoundHomepage,
            Self::EmailsFoundRelevant,
            Self::NoEmails,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for SiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(SiteOutcome::EmailsFoundHomepage.is_success());
        assert!(SiteOutcome::EmailsFoundRelevant.is_success());

        assert!(!SiteOutcome::NoEmails.is_success());
        assert!(!SiteOutcome::SkippedDuplicate.is_success());
        assert!(!SiteOutcome::Cancelled.is_success());
    }

    #[test]
    fn test_is_skipped() {
        assert!(SiteOutcome::SkippedUnresolved.is_skipped());
        assert!(SiteOutcome::SkippedDuplicate.is_skipped());

        assert!(!SiteOutcome::NoEmails.is_skipped());
        assert!(!SiteOutcome::EmailsFoundHomepage.is_skipped());
    }

    #[test]
    fn test_labels_are_distinct() {
        let all = SiteOutcome::all_outcomes();
        assert_eq!(all.len(), 6);
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i].as_str(), all[j].as_str());
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SiteOutcome::SkippedDuplicate), "skipped-duplicate");
        assert_eq!(format!("{}", SiteOutcome::NoEmails), "no-emails");
    }
}
