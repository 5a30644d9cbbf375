use core::fmt;

use treebind_value::ValueShape;

// -----------------------------------------------------------------------------
// ValidationError

/// One data problem, tagged with the position it was found at.
///
/// Positions are dotted member paths with bracketed indices, e.g.
/// `users[2].address.city`; the root position is empty and renders as
/// `<root>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    position: String,
    kind: ValidationKind,
}

/// What went wrong with the data at one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    /// The input had the wrong coarse shape, e.g. a collection where an
    /// object was required.
    Shape {
        expected: String,
        actual: ValueShape,
    },
    /// The shape was right but the content was not parseable as required.
    Format { detail: String },
    /// Domain validation in user code rejected the value.
    Domain {
        cause_type: &'static str,
        detail: String,
    },
}

impl ValidationError {
    pub fn new(position: impl Into<String>, kind: ValidationKind) -> Self {
        Self {
            position: position.into(),
            kind,
        }
    }

    #[inline]
    pub fn position(&self) -> &str {
        &self.position
    }

    #[inline]
    pub fn kind(&self) -> &ValidationKind {
        &self.kind
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = if self.position.is_empty() {
            "<root>"
        } else {
            &self.position
        };
        match &self.kind {
            ValidationKind::Shape { expected, actual } => {
                write!(f, "{position}: expected {expected}, found {actual}")
            }
            ValidationKind::Format { detail } => write!(f, "{position}: {detail}"),
            ValidationKind::Domain { cause_type, detail } => {
                write!(f, "{position}: {detail} ({cause_type})")
            }
        }
    }
}

impl core::error::Error for ValidationError {}

// -----------------------------------------------------------------------------
// Report

/// Every validation error one deserialize call found, in document order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    errors: Vec<ValidationError>,
}

impl Report {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    #[inline]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl core::error::Error for Report {}

// -----------------------------------------------------------------------------
// Tracker

/// One step down into the input tree.
#[derive(Clone, Copy, Debug)]
pub enum Step<'a> {
    Field(&'a str),
    Index(usize),
}

/// A node in the tracker's traversal tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

struct Node {
    position: String,
    errors: Vec<ValidationError>,
    children: Vec<usize>,
}

/// The error arena of one deserialize call.
///
/// Every visited input position gets a node; errors are recorded against the
/// node they were found at and collected pre-order at the end, so the report
/// reads in document order.
pub struct Tracker {
    nodes: Vec<Node>,
}

impl Tracker {
    /// A tracker with just the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                position: String::new(),
                errors: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Adds a child node one step below `parent`.
    pub fn child(&mut self, parent: NodeId, step: Step<'_>) -> NodeId {
        let base = &self.nodes[parent.0].position;
        let position = match step {
            Step::Field(name) if base.is_empty() => name.to_string(),
            Step::Field(name) => format!("{base}.{name}"),
            Step::Index(index) => format!("{base}[{index}]"),
        };
        let id = self.nodes.len();
        self.nodes.push(Node {
            position,
            errors: Vec::new(),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        NodeId(id)
    }

    /// The position string of a node.
    #[inline]
    pub fn position(&self, node: NodeId) -> &str {
        &self.nodes[node.0].position
    }

    /// Records a data error at `node`.
    pub fn record(&mut self, node: NodeId, kind: ValidationKind) {
        let position = self.nodes[node.0].position.clone();
        self.nodes[node.0]
            .errors
            .push(ValidationError::new(position, kind));
    }

    /// Records an already positioned error at `node`.
    pub fn push(&mut self, node: NodeId, error: ValidationError) {
        self.nodes[node.0].errors.push(error);
    }

    /// Collects every recorded error, pre-order from the root.
    pub fn into_report(self) -> Report {
        let mut errors = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            errors.extend(node.errors.iter().cloned());
            // Children pushed in reverse so they pop in document order.
            stack.extend(node.children.iter().rev());
        }
        Report::new(errors)
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Step, Tracker, ValidationKind};

    #[test]
    fn positions_compose() {
        let mut tracker = Tracker::new();
        let root = tracker.root();
        let users = tracker.child(root, Step::Field("users"));
        let second = tracker.child(users, Step::Index(2));
        let city = tracker.child(second, Step::Field("city"));
        assert_eq!(tracker.position(city), "users[2].city");
    }

    #[test]
    fn report_reads_in_document_order() {
        let mut tracker = Tracker::new();
        let root = tracker.root();
        let a = tracker.child(root, Step::Field("a"));
        let b = tracker.child(root, Step::Field("b"));
        tracker.record(
            b,
            ValidationKind::Format {
                detail: "second".into(),
            },
        );
        tracker.record(
            a,
            ValidationKind::Format {
                detail: "first".into(),
            },
        );

        let report = tracker.into_report();
        let positions: Vec<_> = report.iter().map(|e| e.position().to_string()).collect();
        assert_eq!(positions, vec!["a", "b"]);
    }

    #[test]
    fn root_renders_as_a_marker() {
        let mut tracker = Tracker::new();
        let root = tracker.root();
        tracker.record(
            root,
            ValidationKind::Format {
                detail: "bad".into(),
            },
        );
        let report = tracker.into_report();
        assert_eq!(report.errors()[0].to_string(), "<root>: bad");
    }
}
