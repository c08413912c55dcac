//! Version numbering for article submissions
//!
//! Labels are "major.minor" strings ("1.0", "1.1", ...). The initial
//! submission is always "1.0" and each correction bumps the minor part.
//!
//! The legacy system silently restarted at "1.0" when it met a label it
//! could not parse; here an unparseable stored label is a data-integrity
//! error surfaced to the caller instead of being papered over.

use std::fmt;

/// A parsed "major.minor" version label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionLabel {
    pub major: u32,
    pub minor: u32,
}

impl VersionLabel {
    /// The label of every article's first version
    pub const INITIAL: VersionLabel = VersionLabel { major: 1, minor: 0 };

    /// Parse a label of exactly two numeric dot-separated parts
    pub fn parse(label: &str) -> Option<Self> {
        let mut parts = label.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor })
    }

    /// The next correction label: minor bumped, major unchanged
    pub fn next_minor(self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_label() {
        assert_eq!(VersionLabel::INITIAL.to_string(), "1.0");
    }

    #[test]
    fn test_minor_bump() {
        let v = VersionLabel::parse("1.0").unwrap();
        assert_eq!(v.next_minor().to_string(), "1.1");

        let v = VersionLabel::parse("2.7").unwrap();
        assert_eq!(v.next_minor().to_string(), "2.8");

        let v = VersionLabel::parse("1.9").unwrap();
        assert_eq!(v.next_minor().to_string(), "1.10");
    }

    #[test]
    fn test_malformed_labels_do_not_parse() {
        for label in ["", "1", "1.0.0", "one.zero", "1.", ".1", "1,0", "v1.0"] {
            assert_eq!(VersionLabel::parse(label), None, "label {:?}", label);
        }
    }

    #[test]
    fn test_whitespace_is_rejected() {
        assert_eq!(VersionLabel::parse(" 1.0"), None);
        assert_eq!(VersionLabel::parse("1. 0"), None);
    }
}
