//! K-way merge of sorted spill files.
//!
//! A binary min-heap holds the current head record of every open source;
//! the smallest head is written and replaced by the next record from the
//! same source. Memory use is one record per source regardless of chunk size.
//!
//! At most `fan_in` spill files are open at once. When a run produces more,
//! [`MergeEngine::reduce`] first merges them in groups into intermediate
//! spill files until few enough remain for the final merge.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::core::comparator::RecordComparator;
use crate::core::record::LineRecord;
use crate::sort::error::{IoResultExt, SortError};
use crate::sort::output::RecordWriter;
use crate::sort::progress::CancellationToken;
use crate::sort::spill::{SpillFile, SpillReader, SpillWriter};

/// Heap entry: a source's head record, ordered by the run's comparator.
struct HeapEntry<'c> {
    record: LineRecord,
    source: usize,
    comparator: &'c RecordComparator,
}

impl PartialEq for HeapEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry<'_> {}

impl PartialOrd for HeapEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparator
            .compare(&self.record, &other.record)
            .then_with(|| self.source.cmp(&other.source))
    }
}

pub struct MergeEngine<'a> {
    comparator: &'a RecordComparator,
    cancel: &'a CancellationToken,
}

impl<'a> MergeEngine<'a> {
    #[must_use]
    pub fn new(comparator: &'a RecordComparator, cancel: &'a CancellationToken) -> Self {
        Self { comparator, cancel }
    }

    /// Write a single already-sorted batch; the k = 1 case needs no heap.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Cancelled` or an output write error.
    pub fn write_resident<W: Write>(
        &self,
        records: Vec<LineRecord>,
        writer: &mut RecordWriter<W>,
        mut on_record: impl FnMut(u64),
    ) -> Result<(), SortError> {
        for (i, record) in records.into_iter().enumerate() {
            self.cancel.check()?;
            writer.write_record(&record)?;
            on_record(i as u64 + 1);
        }
        Ok(())
    }

    /// Merge spill files into `writer` in comparator order.
    ///
    /// Opens every file in `spills`; call [`MergeEngine::reduce`] first to
    /// bound the number of open files. `on_record` receives the running
    /// count of merged records.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Cancelled` if cancellation is requested between
    /// merge steps, or an error reading a spill file or writing output.
    pub fn merge<W: Write>(
        &self,
        spills: &[SpillFile],
        writer: &mut RecordWriter<W>,
        mut on_record: impl FnMut(u64),
    ) -> Result<(), SortError> {
        let mut merged = 0u64;
        self.merge_into(spills, |record| {
            writer.write_record(record)?;
            merged += 1;
            on_record(merged);
            Ok(())
        })
    }

    /// Merge spill files in groups of `fan_in` until at most `fan_in` remain.
    ///
    /// Intermediate files are written to `dir` and the inputs of each group
    /// are deleted once its merged file is complete. A trailing group of one
    /// file is carried over unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SortError::Cancelled`, or an error reading, writing or
    /// removing a spill file.
    pub fn reduce(
        &self,
        mut spills: Vec<SpillFile>,
        fan_in: usize,
        dir: &Path,
        compressed: bool,
    ) -> Result<Vec<SpillFile>, SortError> {
        let fan_in = fan_in.max(2);
        let mut pass = 0usize;

        while spills.len() > fan_in {
            pass += 1;
            info!(pass, files = spills.len(), fan_in, "Intermediate merge pass");

            let mut next = Vec::with_capacity(spills.len().div_ceil(fan_in));
            for (i, group) in spills.chunks(fan_in).enumerate() {
                if let [single] = group {
                    next.push(single.clone());
                    continue;
                }

                let path = dir.join(format!("merge_{pass:02}_{i:05}.spill"));
                let mut writer = SpillWriter::create(&path, compressed)?;
                self.merge_into(group, |record| writer.push(record))?;
                next.push(writer.finish()?);

                for spill in group {
                    std::fs::remove_file(&spill.path).at(&spill.path)?;
                }
            }
            spills = next;
        }

        Ok(spills)
    }

    fn merge_into(
        &self,
        spills: &[SpillFile],
        mut sink: impl FnMut(&LineRecord) -> Result<(), SortError>,
    ) -> Result<(), SortError> {
        debug!(sources = spills.len(), "Merging spill files");

        let mut readers = spills
            .iter()
            .map(SpillReader::open)
            .collect::<Result<Vec<_>, _>>()?;

        let mut heap: BinaryHeap<Reverse<HeapEntry<'_>>> = BinaryHeap::with_capacity(readers.len());
        for (source, reader) in readers.iter_mut().enumerate() {
            if let Some(record) = reader.next_record()? {
                heap.push(Reverse(HeapEntry {
                    record,
                    source,
                    comparator: self.comparator,
                }));
            }
        }

        while let Some(Reverse(entry)) = heap.pop() {
            self.cancel.check()?;
            sink(&entry.record)?;

            let reader = &mut readers[entry.source];
            match reader.next_record()? {
                Some(record) => heap.push(Reverse(HeapEntry {
                    record,
                    source: entry.source,
                    comparator: self.comparator,
                })),
                None => debug!(path = %reader.path().display(), "Spill file exhausted"),
            }
        }

        Ok(())
    }
}
