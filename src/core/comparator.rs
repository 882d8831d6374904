//! Ordering of records and chromosome names.
//!
//! A [`RecordComparator`] is built once per sort run and shared read-only by
//! every chunk worker and the merge, so all spill files agree on one order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::record::{LineRecord, SortKey};

/// Caller-supplied rank function; `None` means "unranked".
pub type RankFn = dyn Fn(&[u8]) -> Option<u32> + Send + Sync;

/// Chromosome name to rank table, e.g. loaded from a sequence dictionary.
///
/// Names are raw bytes, matching the keys extracted from data lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromosomeRanks {
    ranks: HashMap<Vec<u8>, u32>,
}

impl ChromosomeRanks {
    /// Build a table from names in rank order. Repeated names keep their first rank.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let mut ranks = HashMap::new();
        for name in names {
            let next = u32::try_from(ranks.len()).unwrap_or(u32::MAX);
            ranks.entry(name.into()).or_insert(next);
        }
        Self { ranks }
    }

    #[must_use]
    pub fn rank(&self, name: impl AsRef<[u8]>) -> Option<u32> {
        self.ranks.get(name.as_ref()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// How chromosome names compare in positional mode
#[derive(Clone, Default)]
pub enum ChromosomeOrder {
    /// Case-sensitive byte-wise order
    #[default]
    Lexical,
    /// Alphanumeric order: `chr2` before `chr10`
    Natural,
    /// Table order; names missing from the table sort last, lexically
    Ranked(Arc<ChromosomeRanks>),
    /// Arbitrary rank function; unranked names sort last, lexically
    Custom(Arc<RankFn>),
}

impl fmt::Debug for ChromosomeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "Lexical"),
            Self::Natural => write!(f, "Natural"),
            Self::Ranked(ranks) => write!(f, "Ranked({} names)", ranks.len()),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl ChromosomeOrder {
    /// Wrap a rank table.
    #[must_use]
    pub fn ranked(ranks: ChromosomeRanks) -> Self {
        Self::Ranked(Arc::new(ranks))
    }

    /// Wrap a rank function.
    pub fn custom<F>(rank: F) -> Self
    where
        F: Fn(&[u8]) -> Option<u32> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(rank))
    }

    /// Compare two chromosome names under this order.
    ///
    /// Always total: names that rank equally fall back to lexical order.
    #[must_use]
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            Self::Lexical => a.cmp(b),
            Self::Natural => natural_cmp(a, b),
            Self::Ranked(ranks) => compare_ranks(ranks.rank(a), ranks.rank(b), a, b),
            Self::Custom(rank) => compare_ranks(rank(a), rank(b), a, b),
        }
    }
}

fn compare_ranks(ra: Option<u32>, rb: Option<u32>, a: &[u8], b: &[u8]) -> Ordering {
    match (ra, rb) {
        (Some(ra), Some(rb)) => ra.cmp(&rb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Alphanumeric comparison of chromosome names.
///
/// A leading `chr` (any case) is ignored, then the names are compared run by
/// run: digit runs numerically, other runs byte-wise, and a digit run sorts
/// before a non-digit run. Names that are still equal (`chr01` vs `chr1`)
/// fall back to plain lexical order.
#[must_use]
pub fn natural_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let mut left = Runs::new(strip_chr(a));
    let mut right = Runs::new(strip_chr(b));

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => compare_digit_runs(x, y),
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn strip_chr(name: &[u8]) -> &[u8] {
    match name.split_at_checked(3) {
        Some((prefix, rest)) if prefix.eq_ignore_ascii_case(b"chr") => rest,
        _ => name,
    }
}

fn is_digits(run: &[u8]) -> bool {
    run.first().is_some_and(u8::is_ascii_digit)
}

fn compare_digit_runs(x: &[u8], y: &[u8]) -> Ordering {
    let x = trim_leading_zeros(x);
    let y = trim_leading_zeros(y);
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

fn trim_leading_zeros(run: &[u8]) -> &[u8] {
    let zeros = run.iter().take_while(|&&c| c == b'0').count();
    &run[zeros..]
}

/// Iterator over maximal digit / non-digit runs of a byte string.
struct Runs<'a> {
    rest: &'a [u8],
}

impl<'a> Runs<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let first = *self.rest.first()?;
        let digit = first.is_ascii_digit();
        let len = self
            .rest
            .iter()
            .take_while(|c| c.is_ascii_digit() == digit)
            .count();
        let (run, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(run)
    }
}

/// Total order over [`LineRecord`]s for one sort run.
#[derive(Debug, Clone, Default)]
pub struct RecordComparator {
    chromosome_order: ChromosomeOrder,
}

impl RecordComparator {
    #[must_use]
    pub fn new(chromosome_order: ChromosomeOrder) -> Self {
        Self { chromosome_order }
    }

    /// Compare two keys, ignoring input position.
    #[must_use]
    pub fn compare_keys(&self, a: &SortKey, b: &SortKey) -> Ordering {
        match (a, b) {
            (
                SortKey::Position {
                    chromosome: ca,
                    start: sa,
                },
                SortKey::Position {
                    chromosome: cb,
                    start: sb,
                },
            ) => self.chromosome_order.compare(ca, cb).then_with(|| sa.cmp(sb)),
            (SortKey::Name(na), SortKey::Name(nb)) => na.cmp(nb),
            // A run only ever produces one key kind; this keeps the order total.
            (SortKey::Position { .. }, SortKey::Name(_)) => Ordering::Less,
            (SortKey::Name(_), SortKey::Position { .. }) => Ordering::Greater,
        }
    }

    /// Compare two records; equal keys keep input order.
    #[must_use]
    pub fn compare(&self, a: &LineRecord, b: &LineRecord) -> Ordering {
        self.compare_keys(&a.key, &b.key)
            .then_with(|| a.line_number.cmp(&b.line_number))
    }
}
