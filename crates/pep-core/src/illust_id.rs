//! Illustration identifiers: parsing user input and extracting ids from page addresses.

use std::fmt;
use std::str::FromStr;

/// A pixiv illustration id. Zero is not a valid id; it means "no illustration in context".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IllustId(u64);

/// Returned when user input is not a usable illustration id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid illustration id: {input:?}")]
pub struct InvalidIllustId {
    pub input: String,
}

impl IllustId {
    pub fn new(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parses a numeric id typed by the user. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, InvalidIllustId> {
        let invalid = || InvalidIllustId {
            input: input.to_string(),
        };
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        trimmed
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(invalid)
    }

    /// Extracts the id from a page address such as `https://www.pixiv.net/en/artworks/123`.
    pub fn from_page_url(page_url: &str) -> Option<Self> {
        let parsed = url::Url::parse(page_url).ok()?;
        let mut segments = parsed.path_segments()?;
        segments.find(|s| *s == "artworks")?;
        let digits = segments.next()?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok().and_then(Self::new)
    }

    /// Accepts either a bare numeric id or an artworks page address.
    pub fn from_target(target: &str) -> Result<Self, InvalidIllustId> {
        Self::parse(target).or_else(|err| Self::from_page_url(target.trim()).ok_or(err))
    }
}

impl FromStr for IllustId {
    type Err = InvalidIllustId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IllustId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
