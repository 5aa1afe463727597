//! Search list expansion.

use crate::base::name::{count_dots, Name};

//------------ SearchIter ----------------------------------------------------

/// The candidate names to try for a query name.
///
/// If the query name has at least `ndots` dots, it is tried as is first,
/// followed by the name with each search domain appended. Otherwise the
/// search domains are tried first and the bare name last. A name with a
/// trailing dot is absolute and is the only candidate.
///
/// Candidates are produced lazily, in presentation format and without a
/// trailing dot. The iterator can be restarted with
/// [`reset`][Self::reset].
#[derive(Clone, Debug)]
pub struct SearchIter {
    /// The query name without a trailing dot.
    qname: String,

    /// The search domains without trailing dots.
    search: Vec<String>,

    /// Whether the bare name goes first.
    bare_first: bool,

    /// The index of the next candidate.
    pos: usize,
}

impl SearchIter {
    /// Creates the expansion for `qname`.
    #[must_use]
    pub fn new(qname: &str, search: &[Name], ndots: usize) -> Self {
        let absolute = qname.is_empty()
            || (qname.ends_with('.') && !qname.ends_with("\\."));
        let search = if absolute {
            Vec::new()
        } else {
            search
                .iter()
                .filter(|name| !name.is_root())
                .map(Name::to_relative_string)
                .collect()
        };
        SearchIter {
            qname: qname.strip_suffix('.').unwrap_or(qname).into(),
            bare_first: absolute || count_dots(qname) >= ndots,
            search,
            pos: 0,
        }
    }

    /// Restarts the iteration with the first candidate.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Returns the number of candidates.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.search.len() + 1
    }

    fn candidate(&self, pos: usize) -> Option<String> {
        let suffix = if self.bare_first {
            match pos {
                0 => return Some(self.qname.clone()),
                pos => self.search.get(pos - 1)?,
            }
        } else if pos == self.search.len() {
            return Some(self.qname.clone());
        } else {
            self.search.get(pos)?
        };
        Some(format!("{}.{}", self.qname, suffix))
    }
}

impl Iterator for SearchIter {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.candidate(self.pos)?;
        self.pos += 1;
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.candidates().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for SearchIter {}

//============ Testing =======================================================
