//! End-to-end sorting tests
//!
//! These drive the library the way a caller would: write an input file,
//! sort it into a fresh output path, and check the ordering, permutation,
//! header and cleanup properties on the result.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use interval_sort::core::comparator::ChromosomeOrder;
use interval_sort::core::types::{LineEndingPolicy, SortMode};
use interval_sort::parsing::format::Format;
use interval_sort::sort::{
    check_sorted, sort_file, CancellationToken, ErrorKind, SortConfig, SortError, SortEvent,
    Sorter,
};

/// Scratch space: an input/output directory and a private temp root
struct Workspace {
    dir: tempfile::TempDir,
    temp_root: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            temp_root: tempfile::tempdir().unwrap(),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> SortConfig {
        SortConfig::default().temp_directory(self.temp_root.path())
    }

    fn temp_entries(&self) -> usize {
        fs::read_dir(self.temp_root.path()).unwrap().count()
    }

    /// Files in the working directory other than `keep`
    fn stray_files(&self, keep: &[&PathBuf]) -> Vec<PathBuf> {
        fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| keep.iter().all(|k| *k != p))
            .collect()
    }
}

/// Deterministic pseudo-random BED records spread over twelve chromosomes
fn random_bed(records: usize, seed: u64) -> String {
    let mut state = seed;
    let mut text = String::from("track name=test\n#comment\n");
    for i in 0..records {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let chromosome = (state >> 33) % 12 + 1;
        let start = (state >> 20) % 5_000;
        text.push_str(&format!("chr{chromosome}\t{start}\t{}\tfeature{i}\n", start + 100));
    }
    text
}

/// Rank `chrN` by N; anything else is unranked
fn chromosome_number(name: &[u8]) -> Option<u32> {
    let digits = name.strip_prefix(b"chr")?;
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn data_lines(text: &str, header_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().skip(header_lines).map(str::to_string).collect();
    lines.sort();
    lines
}

#[test]
fn test_sam_scenario() {
    let ws = Workspace::new();
    let input = ws.write(
        "reads.sam",
        "@HD\tVN:1.0\nr1\t0\tchr2\t500\t60\nr2\t0\tchr1\t100\t60\nr3\t0\tchr1\t50\t60\n",
    );
    let output = ws.path("sorted.sam");

    let result = sort_file(&input, &output, ws.config()).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "@HD\tVN:1.0\nr3\t0\tchr1\t50\t60\nr2\t0\tchr1\t100\t60\nr1\t0\tchr2\t500\t60\n"
    );
    assert_eq!(result.records_written, 3);
    assert_eq!(result.header_lines, 1);
    assert_eq!(result.skipped_count, 0);
    assert_eq!(result.chunks_spilled, 0);
}

#[test]
fn test_malformed_line_is_skipped_and_reported() {
    let ws = Workspace::new();
    let mut text = String::new();
    for i in 0..10 {
        if i == 4 {
            text.push_str("chr1\tnot_a_number\t10\n");
        } else {
            text.push_str(&format!("chr1\t{}\t10\n", 100 - i));
        }
    }
    let input = ws.write("input.bed", &text);
    let output = ws.path("sorted.bed");

    let result = sort_file(&input, &output, ws.config().chunk_size_limit(3)).unwrap();

    assert_eq!(result.records_written, 9);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].line_number, 5);
    assert!(result.skipped[0].reason.contains("not_a_number"));

    let sorted = fs::read_to_string(&output).unwrap();
    assert_eq!(sorted.lines().count(), 9);
    assert!(!sorted.contains("not_a_number"));
    assert!(check_sorted(&output, &ws.config()).unwrap().is_sorted());
}

#[test]
fn test_permutation_order_and_header() {
    let ws = Workspace::new();
    let text = random_bed(1_000, 7);
    let input = ws.write("input.bed", &text);
    let output = ws.path("sorted.bed");

    let result = sort_file(&input, &output, ws.config().chunk_size_limit(37)).unwrap();
    assert_eq!(result.records_written, 1_000);
    assert_eq!(result.header_lines, 2);
    assert!(result.chunks_spilled > 1);

    let sorted = fs::read_to_string(&output).unwrap();
    let header: Vec<&str> = sorted.lines().take(2).collect();
    assert_eq!(header, vec!["track name=test", "#comment"]);
    assert_eq!(data_lines(&sorted, 2), data_lines(&text, 2));

    let check = check_sorted(&output, &ws.config()).unwrap();
    assert!(check.is_sorted());
    assert_eq!(check.records, 1_000);
}

#[test]
fn test_chunk_size_independence() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(500, 11));
    let small = ws.path("small.bed");
    let large = ws.path("large.bed");

    let spilled = sort_file(&input, &small, ws.config().chunk_size_limit(10)).unwrap();
    let resident = sort_file(&input, &large, ws.config().chunk_size_limit(10_000_000)).unwrap();

    assert_eq!(spilled.chunks_spilled, 50);
    assert_eq!(resident.chunks_spilled, 0);
    assert_eq!(fs::read(&small).unwrap(), fs::read(&large).unwrap());
}

#[test]
fn test_bounded_fan_in_matches_single_merge() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(60, 12));
    let staged = ws.path("staged.bed");
    let resident = ws.path("resident.bed");

    // 60 spill files merged three at a time: 60 -> 20 -> 7 -> 3
    let result = sort_file(
        &input,
        &staged,
        ws.config().chunk_size_limit(1).merge_fan_in(3),
    )
    .unwrap();
    sort_file(&input, &resident, ws.config()).unwrap();

    assert_eq!(result.chunks_spilled, 60);
    assert_eq!(result.records_written, 60);
    assert_eq!(fs::read(&staged).unwrap(), fs::read(&resident).unwrap());
    assert_eq!(ws.temp_entries(), 0);
}

#[test]
fn test_fan_in_with_compressed_spills() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(250, 13));
    let staged = ws.path("staged.bed");
    let resident = ws.path("resident.bed");

    sort_file(
        &input,
        &staged,
        ws.config()
            .chunk_size_limit(7)
            .merge_fan_in(2)
            .threads(3)
            .compress_spills(true),
    )
    .unwrap();
    sort_file(&input, &resident, ws.config()).unwrap();

    assert_eq!(fs::read(&staged).unwrap(), fs::read(&resident).unwrap());
    assert_eq!(ws.temp_entries(), 0);
}

#[test]
fn test_non_utf8_keys_sort_bytewise() {
    let ws = Workspace::new();
    let input = ws.path("input.bed");
    fs::write(&input, b"#h\nchr2\t5\nchr\xe9\t1\nchr1\t3\nr\xffx\t2\n").unwrap();
    let output = ws.path("sorted.bed");

    let result = sort_file(&input, &output, ws.config().chunk_size_limit(2)).unwrap();

    assert_eq!(result.records_written, 4);
    assert_eq!(result.skipped_count, 0);
    assert_eq!(
        fs::read(&output).unwrap(),
        b"#h\nchr1\t3\nchr2\t5\nchr\xe9\t1\nr\xffx\t2\n"
    );
    assert!(check_sorted(&output, &ws.config()).unwrap().is_sorted());
}

#[test]
fn test_equal_keys_keep_input_order() {
    let ws = Workspace::new();
    let mut text = String::new();
    for i in 0..50 {
        text.push_str(&format!("chr1\t{}\tid{i}\n", i % 3));
    }
    let input = ws.write("input.bed", &text);
    let output = ws.path("sorted.bed");

    sort_file(&input, &output, ws.config().chunk_size_limit(4)).unwrap();

    let sorted = fs::read_to_string(&output).unwrap();
    for start in 0..3 {
        let start = start.to_string();
        let ids: Vec<u32> = sorted
            .lines()
            .filter(|l| l.split('\t').nth(1) == Some(start.as_str()))
            .map(|l| l.split('\t').nth(2).unwrap()[2..].parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ties reordered: {ids:?}");
    }
}

#[test]
fn test_idempotence() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(300, 3));
    let once = ws.path("once.bed");
    let twice = ws.path("twice.bed");

    sort_file(&input, &once, ws.config().chunk_size_limit(16)).unwrap();
    sort_file(&once, &twice, ws.config().chunk_size_limit(16)).unwrap();

    assert_eq!(fs::read(&once).unwrap(), fs::read(&twice).unwrap());
}

#[test]
fn test_parallel_matches_serial() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(800, 5));
    let serial = ws.path("serial.bed");
    let parallel = ws.path("parallel.bed");

    sort_file(&input, &serial, ws.config().chunk_size_limit(25)).unwrap();
    let result = sort_file(
        &input,
        &parallel,
        ws.config().chunk_size_limit(25).threads(4).compress_spills(true),
    )
    .unwrap();

    assert_eq!(result.chunks_spilled, 32);
    assert_eq!(fs::read(&serial).unwrap(), fs::read(&parallel).unwrap());
    assert_eq!(ws.temp_entries(), 0);
}

#[test]
fn test_temp_directory_empty_after_success() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(200, 9));
    let output = ws.path("sorted.bed");

    sort_file(&input, &output, ws.config().chunk_size_limit(7)).unwrap();

    assert_eq!(ws.temp_entries(), 0);
    assert!(ws.stray_files(&[&input, &output]).is_empty());
}

#[test]
fn test_cancel_before_start() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(100, 1));
    let output = ws.path("sorted.bed");

    let sorter = Sorter::new(ws.config().chunk_size_limit(10));
    sorter.cancellation_token().cancel();
    let err = sorter.sort(&input, &output).unwrap_err();

    assert!(matches!(err, SortError::Cancelled));
    assert!(!output.exists());
    assert_eq!(ws.temp_entries(), 0);
    assert!(ws.stray_files(&[&input]).is_empty());
}

#[test]
fn test_cancel_during_run() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(400, 2));
    let output = ws.path("sorted.bed");

    // Cancel from inside the run, on the first chromosome comparison
    let token = CancellationToken::new();
    let trigger = token.clone();
    let order = ChromosomeOrder::custom(move |name| {
        trigger.cancel();
        chromosome_number(name)
    });

    let sorter = Sorter::new(ws.config().chunk_size_limit(10).chromosome_order(order))
        .with_cancellation(token);
    let err = sorter.sort(&input, &output).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(!output.exists());
    assert_eq!(ws.temp_entries(), 0);
    assert!(ws.stray_files(&[&input]).is_empty());
}

#[test]
fn test_io_failure_cleans_up() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(400, 4));
    let out_dir = ws.path("out");
    fs::create_dir(&out_dir).unwrap();
    let output = out_dir.join("sorted.bed");

    // Remove the output directory mid-run so the final rename fails
    let doomed = out_dir.clone();
    let removed = Arc::new(AtomicBool::new(false));
    let order = ChromosomeOrder::custom(move |name| {
        if !removed.swap(true, Ordering::SeqCst) {
            let _ = fs::remove_dir_all(&doomed);
        }
        chromosome_number(name)
    });

    let err = sort_file(
        &input,
        &output,
        ws.config().chunk_size_limit(10).chromosome_order(order),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert!(!output.exists());
    assert_eq!(ws.temp_entries(), 0);
}

#[test]
fn test_spill_truncated_during_merge() {
    let ws = Workspace::new();
    // Every chunk's spill file is larger than the reader buffer, so damage
    // done after the merge has opened the files is still seen mid-stream
    let filler = "x".repeat(10_000);
    let mut text = String::new();
    for i in 0..400 {
        text.push_str(&format!("chr{}	{}	{filler}
", i % 7 + 1, (i * 37) % 1_000));
    }
    let input = ws.write("input.bed", &text);
    let output = ws.path("sorted.bed");

    // All 40 chunk files exist only once the chunk phase is over; the next
    // comparison comes from the merge, which then finds them emptied
    let temp_root = ws.temp_root.path().to_path_buf();
    let truncated = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&truncated);
    let order = ChromosomeOrder::custom(move |name| {
        if !flag.load(Ordering::SeqCst) {
            let spills = chunk_spills(&temp_root);
            if spills.len() == 40 {
                flag.store(true, Ordering::SeqCst);
                for path in spills {
                    fs::File::create(path).unwrap();
                }
            }
        }
        chromosome_number(name)
    });

    let err = sort_file(
        &input,
        &output,
        ws.config().chunk_size_limit(10).chromosome_order(order),
    )
    .unwrap_err();

    assert!(truncated.load(Ordering::SeqCst));
    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert!(!output.exists());
    assert_eq!(ws.temp_entries(), 0);
    assert!(ws.stray_files(&[&input]).is_empty());
}

/// `chunk_*.spill` files inside the run's spill directory under `temp_root`
fn chunk_spills(temp_root: &std::path::Path) -> Vec<PathBuf> {
    let mut spills = Vec::new();
    for dir in fs::read_dir(temp_root).unwrap() {
        let dir = dir.unwrap().path();
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if name.starts_with("chunk_") && name.ends_with(".spill") {
                spills.push(path);
            }
        }
    }
    spills
}

#[test]
fn test_events_are_delivered() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(100, 6));
    let output = ws.path("sorted.bed");

    let (sender, receiver) = crossbeam_channel::unbounded();
    let sorter = Sorter::new(ws.config().chunk_size_limit(10)).with_events(sender);
    sorter.sort(&input, &output).unwrap();
    drop(sorter);

    let events: Vec<SortEvent> = receiver.iter().collect();
    assert!(matches!(events.first(), Some(SortEvent::Started { .. })));
    assert!(matches!(events.last(), Some(SortEvent::Completed(r)) if r.records_written == 100));

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            SortEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] < w[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100));
}

#[test]
fn test_failure_event_on_config_error() {
    let ws = Workspace::new();
    let input = ws.write("input.unknown", "chr1\t1\n");
    let output = ws.path("sorted.unknown");

    let (sender, receiver) = crossbeam_channel::unbounded();
    let err = Sorter::new(ws.config())
        .with_events(sender)
        .sort(&input, &output)
        .unwrap_err();

    assert!(matches!(err, SortError::Config(_)));
    assert!(!output.exists());
    let events: Vec<SortEvent> = receiver.iter().collect();
    assert!(matches!(
        events.last(),
        Some(SortEvent::Failed {
            kind: ErrorKind::ConfigurationError,
            ..
        })
    ));
}

#[test]
fn test_cancelled_event() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", &random_bed(50, 14));
    let output = ws.path("sorted.bed");

    let (sender, receiver) = crossbeam_channel::unbounded();
    let sorter = Sorter::new(ws.config()).with_events(sender);
    sorter.cancellation_token().cancel();
    let err = sorter.sort(&input, &output).unwrap_err();
    drop(sorter);

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    let events: Vec<SortEvent> = receiver.iter().collect();
    assert!(matches!(events.first(), Some(SortEvent::Started { .. })));
    assert!(matches!(events.last(), Some(SortEvent::Cancelled)));
    assert!(!events.iter().any(|e| matches!(e, SortEvent::Failed { .. })));
}

#[test]
fn test_same_input_and_output_rejected() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", "chr2\t1\nchr1\t1\n");

    let err = sort_file(&input, &input, ws.config()).unwrap_err();

    assert!(matches!(err, SortError::Config(_)));
    assert_eq!(fs::read_to_string(&input).unwrap(), "chr2\t1\nchr1\t1\n");
}

#[test]
fn test_header_only_and_empty_inputs() {
    let ws = Workspace::new();
    let header_only = ws.write("header.vcf", "##fileformat=VCFv4.2\n#CHROM\tPOS\n");
    let empty = ws.write("empty.vcf", "");
    let out_header = ws.path("header.sorted.vcf");
    let out_empty = ws.path("empty.sorted.vcf");

    let result = sort_file(&header_only, &out_header, ws.config()).unwrap();
    assert_eq!(result.records_written, 0);
    assert_eq!(result.header_lines, 2);
    assert_eq!(
        fs::read_to_string(&out_header).unwrap(),
        "##fileformat=VCFv4.2\n#CHROM\tPOS\n"
    );

    let result = sort_file(&empty, &out_empty, ws.config()).unwrap();
    assert_eq!(result.records_written, 0);
    assert_eq!(fs::read(&out_empty).unwrap(), b"");
}

#[test]
fn test_sort_by_name() {
    let ws = Workspace::new();
    let input = ws.write(
        "reads.sam",
        "@HD\tVN:1.6\nreadC\t0\tchr1\t5\nreadA\t0\tchr2\t9\nreadB\t0\tchr1\t1\n",
    );
    let output = ws.path("sorted.sam");

    sort_file(
        &input,
        &output,
        ws.config().sort_mode(SortMode::ByName).chunk_size_limit(1),
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "@HD\tVN:1.6\nreadA\t0\tchr2\t9\nreadB\t0\tchr1\t1\nreadC\t0\tchr1\t5\n"
    );
}

#[test]
fn test_natural_and_ranked_orders() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", "chr10\t1\nchrX\t1\nchr2\t1\nchr1\t1\n");
    let natural = ws.path("natural.bed");
    let ranked = ws.path("ranked.bed");

    sort_file(
        &input,
        &natural,
        ws.config().chromosome_order(ChromosomeOrder::Natural),
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(&natural).unwrap(),
        "chr1\t1\nchr2\t1\nchr10\t1\nchrX\t1\n"
    );

    let table = interval_sort::ChromosomeRanks::from_names(["chrX", "chr2"]);
    sort_file(
        &input,
        &ranked,
        ws.config().chromosome_order(ChromosomeOrder::ranked(table)),
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(&ranked).unwrap(),
        "chrX\t1\nchr2\t1\nchr1\t1\nchr10\t1\n"
    );
}

#[test]
fn test_gzip_input_and_output() {
    let ws = Workspace::new();
    let input = ws.path("input.bed.gz");
    let mut encoder = flate2::write::GzEncoder::new(
        fs::File::create(&input).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(b"#h\nchr2\t5\nchr1\t7\nchr1\t3\n").unwrap();
    encoder.finish().unwrap();
    let output = ws.path("sorted.bed.gz");

    sort_file(&input, &output, ws.config().chunk_size_limit(2)).unwrap();

    let mut decoded = String::new();
    std::io::Read::read_to_string(
        &mut flate2::read::MultiGzDecoder::new(fs::File::open(&output).unwrap()),
        &mut decoded,
    )
    .unwrap();
    assert_eq!(decoded, "#h\nchr1\t3\nchr1\t7\nchr2\t5\n");
}

#[test]
fn test_line_endings() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", "#h\r\nchr2\t5\r\nchr1\t7");
    let preserved = ws.path("preserved.bed");
    let normalised = ws.path("normalised.bed");

    sort_file(&input, &preserved, ws.config()).unwrap();
    assert_eq!(
        fs::read_to_string(&preserved).unwrap(),
        "#h\r\nchr1\t7\r\nchr2\t5\r\n"
    );

    sort_file(
        &input,
        &normalised,
        ws.config().line_endings(LineEndingPolicy::Lf),
    )
    .unwrap();
    assert_eq!(fs::read_to_string(&normalised).unwrap(), "#h\nchr1\t7\nchr2\t5\n");
}

#[test]
fn test_title_row_formats() {
    let ws = Workspace::new();
    let input = ws.write(
        "sample.cn",
        "#track\nSNP\tChromosome\tPhysicalPosition\tS1\nrs2\tchr2\t10\t1.0\nrs1\tchr1\t99\t2.0\n",
    );
    let output = ws.path("sorted.cn");

    let result = sort_file(&input, &output, ws.config()).unwrap();

    assert_eq!(result.header_lines, 2);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "#track\nSNP\tChromosome\tPhysicalPosition\tS1\nrs1\tchr1\t99\t2.0\nrs2\tchr2\t10\t1.0\n"
    );
}

#[test]
fn test_custom_format() {
    let ws = Workspace::new();
    let input = ws.write("data.txt", "//meta\nx\t30\tchrB\ny\t10\tchrA\nz\t20\tchrA\n");
    let output = ws.path("sorted.txt");

    let format = Format::Custom(interval_sort::CustomFormat {
        chromosome_column: 2,
        start_column: 1,
        header_prefixes: vec!["//".to_string()],
    });
    sort_file(&input, &output, ws.config().format(format)).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "//meta\ny\t10\tchrA\nz\t20\tchrA\nx\t30\tchrB\n"
    );
}

#[test]
fn test_invalid_temp_directory_fails_before_io() {
    let ws = Workspace::new();
    let input = ws.write("input.bed", "chr1\t1\n");
    let output = ws.path("sorted.bed");

    let config = SortConfig::default().temp_directory(ws.path("missing"));
    let err = sort_file(&input, &output, config).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(!output.exists());
}
