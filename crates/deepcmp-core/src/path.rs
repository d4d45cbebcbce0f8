//! Field paths identifying a node's position from the comparison root.
//!
//! A path is an ordered list of typed [`Segment`]s: field names, map keys and
//! element positions. Paths are persistent: a child shares its parent's
//! segments through a reference-counted link, so deriving a child is constant
//! time however deep the traversal goes.
//!
//! Two textual forms exist:
//!
//! - [`Path::render`] is the full form used for reporting,
//!   `orders[2].tags{"a.b"}.sku`. Element positions are bracketed, map keys are
//!   braced literals, so a key never reads as a field or an element.
//! - [`Path::rule_path`] drops element segments and writes keys as their
//!   plain text, as in `orders.tags.a.b.sku`. Ignore rules and per-field comparators
//!   match against this form so that one rule covers every element of a
//!   collection.

use crate::model::MapKey;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// One step from a container to a contained value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Declared attribute of a record
    Field(String),
    /// Entry of a map
    Key(MapKey),
    /// Position inside an array, collection or atomic array
    Element(usize),
}

impl Segment {
    pub fn is_element(&self) -> bool {
        matches!(self, Segment::Element(_))
    }

    /// Text contributed to the rule path; elements contribute nothing
    pub fn rule_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Segment::Field(name) => Some(Cow::Borrowed(name)),
            Segment::Key(key) => Some(key.text()),
            Segment::Element(_) => None,
        }
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Segment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Key(key) => {
                out.push('{');
                out.push_str(&key.literal());
                out.push('}');
            }
            Segment::Element(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Segment::Field(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Segment::Field(name)
    }
}

impl From<MapKey> for Segment {
    fn from(key: MapKey) -> Self {
        Segment::Key(key)
    }
}

struct Link {
    parent: Option<Rc<Link>>,
    segment: Segment,
    depth: usize,
}

// Unlinks the parent chain in a loop; a recursive drop of a long chain would
// exhaust the stack.
impl Drop for Link {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(link) = parent {
            parent = match Rc::try_unwrap(link) {
                Ok(mut owned) => owned.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// Immutable ordered sequence of segments. The root path has no segments.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Path {
    last: Option<Rc<Link>>,
}

impl Path {
    /// The empty path of the comparison root
    pub fn root() -> Self {
        Self { last: None }
    }

    /// Build a path from field names or other segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        segments
            .into_iter()
            .fold(Path::root(), |path, segment| path.push(segment.into()))
    }

    /// Derive a child path one field below this one
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        self.push(segment.into())
    }

    /// Derive the path of the map entry stored under `key`
    pub fn key(&self, key: MapKey) -> Self {
        self.push(Segment::Key(key))
    }

    /// Derive the path of the element at `index`
    pub fn element(&self, index: usize) -> Self {
        self.push(Segment::Element(index))
    }

    fn push(&self, segment: Segment) -> Self {
        Self {
            last: Some(Rc::new(Link {
                parent: self.last.clone(),
                segment,
                depth: self.depth() + 1,
            })),
        }
    }

    /// Segments from the root down, materialised on demand
    pub fn segments(&self) -> Vec<Segment> {
        let mut out: Vec<Segment> = self.links().map(|link| link.segment.clone()).collect();
        out.reverse();
        out
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.last.as_deref().map(|link| &link.segment)
    }

    pub fn is_root(&self) -> bool {
        self.last.is_none()
    }

    pub fn depth(&self) -> usize {
        self.last.as_deref().map_or(0, |link| link.depth)
    }

    /// Name of the last segment, or the empty string for the root. Elements
    /// are named `[i]`.
    pub fn field_name(&self) -> Cow<'_, str> {
        match self.last_segment() {
            None => Cow::Borrowed(""),
            Some(Segment::Element(index)) => Cow::Owned(format!("[{}]", index)),
            Some(segment) => segment.rule_text().unwrap_or_default(),
        }
    }

    /// Human-readable form: fields joined by `.`, element positions and map
    /// keys attached directly to their container (`lines[0].sku`,
    /// `tags{"x"}`).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in self.segments() {
            segment.render_into(&mut out);
        }
        out
    }

    /// Dotted form without element segments, matched by ignore rules and
    /// field comparators.
    pub fn rule_path(&self) -> String {
        let segments = self.segments();
        let mut out = String::new();
        for text in segments.iter().filter_map(Segment::rule_text) {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&text);
        }
        out
    }

    fn links(&self) -> impl Iterator<Item = &Link> {
        let mut next = self.last.as_deref();
        std::iter::from_fn(move || {
            let link = next?;
            next = link.parent.as_deref();
            Some(link)
        })
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        if self.depth() != other.depth() {
            return false;
        }
        for (a, b) in self.links().zip(other.links()) {
            if std::ptr::eq(a, b) {
                return true;
            }
            if a.segment != b.segment {
                return false;
            }
        }
        true
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.depth().hash(state);
        for link in self.links() {
            link.segment.hash(state);
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.render()).finish()
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path::from_segments(segments)
    }
}

impl From<Path> for Vec<Segment> {
    fn from(path: Path) -> Self {
        path.segments()
    }
}
