//! Trace entries and trace normalization.

use crate::common::{Error, PageId, Result};

/// One entry of a reference trace: a page access.
///
/// References are immutable and consumed strictly in input order. The
/// optional `at` timestamp is for traces that carry their own clock;
/// references without one are timed by their position during
/// [`normalize`].
///
/// # Example
/// ```
/// use pagesim::{PageId, Reference};
///
/// let r = Reference::read(PageId::new(3));
/// assert!(!r.write);
///
/// let w = Reference::write(PageId::new(3)).at(17);
/// assert_eq!(w.at, Some(17));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// The page being accessed.
    pub page: PageId,

    /// True for a write access (dirties the page), false for a read.
    pub write: bool,

    /// Optional timestamp. `None` means "use the position index".
    pub at: Option<u64>,
}

impl Reference {
    /// A read access to `page`, timed by position.
    #[inline]
    pub fn read(page: PageId) -> Self {
        Self {
            page,
            write: false,
            at: None,
        }
    }

    /// A write access to `page`, timed by position.
    #[inline]
    pub fn write(page: PageId) -> Self {
        Self {
            page,
            write: true,
            at: None,
        }
    }

    /// Attach an explicit timestamp.
    #[inline]
    pub fn at(mut self, time: u64) -> Self {
        self.at = Some(time);
        self
    }
}

/// A reference with its time resolved. Internal currency of the policy
/// state machines: after [`resolve`], every step has a concrete clock
/// value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved {
    pub page: PageId,
    pub write: bool,
    pub at: u64,
}

/// Resolve every reference to a concrete time, validating the trace.
///
/// Rules:
/// - References without timestamps are timed by their position index.
/// - Explicit timestamps must be non-decreasing in trace order.
/// - A trace must be uniformly timed or uniformly untimed; mixing the two
///   leaves the clock ambiguous and is rejected.
///
/// Violations are [`Error::MalformedTrace`], raised before any reference
/// is processed.
pub(crate) fn resolve(trace: &[Reference]) -> Result<Vec<Resolved>> {
    let timed = match trace.first() {
        Some(first) => first.at.is_some(),
        None => return Ok(Vec::new()),
    };

    let mut steps = Vec::with_capacity(trace.len());
    let mut previous: Option<u64> = None;

    for (index, reference) in trace.iter().enumerate() {
        let at = match (timed, reference.at) {
            (true, Some(at)) => {
                if previous.is_some_and(|p| at < p) {
                    return Err(Error::MalformedTrace(format!(
                        "timestamp {} at position {} goes backwards",
                        at, index
                    )));
                }
                previous = Some(at);
                at
            }
            (false, None) => index as u64,
            _ => {
                return Err(Error::MalformedTrace(format!(
                    "trace mixes timed and untimed references (position {})",
                    index
                )));
            }
        };

        steps.push(Resolved {
            page: reference.page,
            write: reference.write,
            at,
        });
    }

    Ok(steps)
}

/// Normalize a trace: validate it and return a copy with every timestamp
/// made explicit.
///
/// Normalization is idempotent, so the benchmark driver can normalize once
/// and hand the same slice to every run.
pub fn normalize(trace: &[Reference]) -> Result<Vec<Reference>> {
    let steps = resolve(trace)?;
    Ok(steps
        .into_iter()
        .map(|s| Reference {
            page: s.page,
            write: s.write,
            at: Some(s.at),
        })
        .collect())
}
