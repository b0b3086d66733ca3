//! Property path parsing.
//!
//! A path is a sequence of segments joined by `.`. Each segment is a name,
//! optionally followed by a bracketed index or key:
//!
//! ```text
//! path    := segment ("." segment)*
//! segment := name ["[" index "]"]
//! ```
//!
//! Parsing is lazy: [`PathSegment::parse`] splits off the first segment and
//! keeps the rest as [`children`](PathSegment::children), borrowing from the
//! input throughout.

use core::iter::FusedIterator;

use crate::ReflectionError;

/// The first segment of a property path.
///
/// # Examples
///
/// ```
/// use mo_reflect::PathSegment;
///
/// let seg = PathSegment::parse("orders[0].customer.name").unwrap();
/// assert_eq!(seg.name(), "orders");
/// assert_eq!(seg.indexed_name(), "orders[0]");
/// assert_eq!(seg.index(), Some("0"));
/// assert_eq!(seg.children(), Some("customer.name"));
///
/// let next = seg.next().unwrap().unwrap();
/// assert_eq!(next.name(), "customer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment<'a> {
    name: &'a str,
    indexed_name: &'a str,
    index: Option<&'a str>,
    children: Option<&'a str>,
}

impl<'a> PathSegment<'a> {
    /// Parses the first segment of `raw`.
    ///
    /// A `.` inside brackets does not end the segment, so map keys may
    /// contain dots. Unbalanced or nested brackets, and text after a closing
    /// bracket, are rejected.
    pub fn parse(raw: &'a str) -> Result<Self, ReflectionError> {
        let mut open = None;
        let mut close = None;
        let mut split = None;

        for (i, byte) in raw.bytes().enumerate() {
            match byte {
                b'[' if open.is_none() && close.is_none() => open = Some(i),
                b'[' => return Err(ReflectionError::invalid_path(raw, "unexpected `[`")),
                b']' if open.is_some() && close.is_none() => close = Some(i),
                b']' => return Err(ReflectionError::invalid_path(raw, "unexpected `]`")),
                b'.' if open.is_none() || close.is_some() => {
                    split = Some(i);
                    break;
                }
                _ if close.is_some() && byte != b'.' => {
                    return Err(ReflectionError::invalid_path(
                        raw,
                        "unexpected text after `]`",
                    ));
                }
                _ => {}
            }
        }

        let (indexed_name, children) = match split {
            Some(at) => (&raw[..at], Some(&raw[at + 1..])),
            None => (raw, None),
        };

        let (name, index) = match (open, close) {
            (None, _) => (indexed_name, None),
            (Some(o), Some(c)) => (&indexed_name[..o], Some(&indexed_name[o + 1..c])),
            (Some(_), None) => {
                return Err(ReflectionError::invalid_path(raw, "unclosed `[`"));
            }
        };

        Ok(Self {
            name,
            indexed_name,
            index,
            children,
        })
    }

    /// Iterates over every segment of `raw`, stopping after the first error.
    ///
    /// ```
    /// use mo_reflect::PathSegment;
    ///
    /// let names: Vec<_> = PathSegment::iter("a.b[k].c")
    ///     .map(|seg| seg.unwrap().indexed_name())
    ///     .collect();
    /// assert_eq!(names, ["a", "b[k]", "c"]);
    /// ```
    #[inline]
    pub fn iter(raw: &'a str) -> Segments<'a> {
        Segments { rest: Some(raw) }
    }

    /// The property name without any index.
    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The name including its bracket suffix, if any.
    #[inline]
    pub fn indexed_name(&self) -> &'a str {
        self.indexed_name
    }

    #[inline]
    pub fn index(&self) -> Option<&'a str> {
        self.index
    }

    /// The path after the first `.`, possibly empty.
    #[inline]
    pub fn children(&self) -> Option<&'a str> {
        self.children
    }

    /// `true` whenever a `.` followed the segment, even with nothing after it.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.children.is_some()
    }

    /// Parses the following segment.
    pub fn next(&self) -> Option<Result<PathSegment<'a>, ReflectionError>> {
        self.children.map(PathSegment::parse)
    }
}

/// Iterator returned by [`PathSegment::iter`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<PathSegment<'a>, ReflectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.rest.take()?;
        let parsed = PathSegment::parse(raw);
        if let Ok(seg) = &parsed {
            self.rest = seg.children;
        }
        Some(parsed)
    }
}

impl FusedIterator for Segments<'_> {}
