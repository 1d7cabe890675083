//! Resource model: byte ranges, resource identity, and metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A byte interval of a resource. The bounds are taken literally from the
/// HTTP header that produced them (`bytes=10-20` gives start 10, end 20);
/// a synthesized full range is `0..size`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The full range of a resource with a known size.
    pub fn full(size: u64) -> Self {
        Self {
            start: 0,
            end: size,
        }
    }

    /// Parse a single-range `bytes=start-end` header value. Open-ended
    /// (`bytes=0-`), suffix (`bytes=-500`), and multi-range forms are not
    /// supported and yield None.
    pub fn parse_http(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("bytes=")?;
        let (a, b) = rest.split_once('-')?;
        let start: u64 = a.trim().parse().ok()?;
        let end: u64 = b.trim().parse().ok()?;
        if end < start {
            return None;
        }
        Some(Self { start, end })
    }

    /// Render a Content-Range value: `bytes start-end/total`, with `*`
    /// when the total size is unknown.
    pub fn content_range(&self, total: Option<u64>) -> String {
        match total {
            Some(t) => format!("bytes {}/{}", self, t),
            None => format!("bytes {}/*", self),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A named byte span: URL plus optional range. Identity is the pair, so
/// the same URL with two different ranges is two distinct resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Resource {
    pub url: String,
    pub range: Option<Range>,
}

impl Resource {
    pub fn new(url: impl Into<String>, range: Option<Range>) -> Self {
        Self {
            url: url.into(),
            range,
        }
    }
}

/// Metadata for a URL: size, MIME type, chunking granularity.
///
/// A size of 0 is the wire sentinel for "nothing known". Lookup APIs model
/// absence as `Option<ResourceInfo>`; call sites must branch on presence
/// before reading any field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceInfo {
    pub url: String,
    pub size: u64,
    pub mime_type: String,
    pub chunk_size: u64,
}

impl ResourceInfo {
    /// Whether this info carries real metadata (nonzero size).
    pub fn is_informative(&self) -> bool {
        self.size != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_range() {
        let r = Range::parse_http("bytes=10-20").unwrap();
        assert_eq!(r, Range::new(10, 20));
        assert_eq!(r.to_string(), "10-20");
    }

    #[test]
    fn parse_rejects_open_ended_and_suffix() {
        assert!(Range::parse_http("bytes=10-").is_none());
        assert!(Range::parse_http("bytes=-500").is_none());
        assert!(Range::parse_http("bytes=0-99,200-299").is_none());
    }

    #[test]
    fn parse_rejects_inverted() {
        assert!(Range::parse_http("bytes=20-10").is_none());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Range::parse_http("chunks=1-2").is_none());
        assert!(Range::parse_http("bytes=a-b").is_none());
        assert!(Range::parse_http("").is_none());
    }

    #[test]
    fn parse_tolerates_whitespace() {
        let r = Range::parse_http("  bytes=5- 9 ").unwrap();
        assert_eq!(r, Range::new(5, 9));
    }

    #[test]
    fn content_range_known_and_unknown_total() {
        let r = Range::new(10, 20);
        assert_eq!(r.content_range(Some(100)), "bytes 10-20/100");
        assert_eq!(r.content_range(None), "bytes 10-20/*");
    }

    #[test]
    fn full_range_covers_size() {
        assert_eq!(Range::full(100), Range::new(0, 100));
    }

    #[test]
    fn resource_identity_includes_range() {
        let a = Resource::new("pdtp://host/f", Some(Range::new(0, 10)));
        let b = Resource::new("pdtp://host/f", Some(Range::new(10, 20)));
        let c = Resource::new("pdtp://host/f", None);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn zero_size_info_is_uninformative() {
        let info = ResourceInfo {
            url: "pdtp://host/f".into(),
            size: 0,
            mime_type: String::new(),
            chunk_size: 0,
        };
        assert!(!info.is_informative());
    }
}
