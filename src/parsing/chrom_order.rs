//! Loaders for chromosome order tables.
//!
//! An order can come from:
//!
//! - **Sequence dictionaries / SAM headers** (`.dict`, `.sam`): `@SQ` `SN` tags in order
//! - **FASTA indexes** (`.fai`): the name column in order
//! - **Plain lists** (anything else): the first token of each non-comment line
//! - **An input's own header block**: `@SQ` lines of a SAM file being sorted

use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tracing::debug;

use crate::core::comparator::ChromosomeRanks;
use crate::parsing::format::Format;
use crate::parsing::header::split_header;
use crate::parsing::lines::LineReader;
use crate::sort::error::ConfigError;
use crate::utils::io::open_input;
use crate::utils::validation::check_chromosome_limit;

/// Load a chromosome order table, choosing the parser by file extension.
///
/// # Errors
///
/// Returns `ConfigError::ChromosomeOrder` if the file cannot be read or
/// parsed, holds no names, or holds more names than allowed.
pub fn load_chromosome_order(path: &Path) -> Result<ChromosomeRanks, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let names = match extension.as_deref() {
        Some("fai") => parse_fai_file(path)?,
        Some("dict" | "sam") => parse_dict_file(path)?,
        _ => {
            let text = std::fs::read_to_string(path).map_err(|e| read_error(path, &e))?;
            parse_name_list(&text)?
        }
    };

    debug!(
        path = %path.display(),
        names = names.len(),
        "Loaded chromosome order"
    );
    Ok(ChromosomeRanks::from_names(names))
}

/// Order chromosomes as the `@SQ` lines in `input`'s own header block.
///
/// Works on compressed inputs too; only the header block is read.
///
/// # Errors
///
/// Returns `ConfigError::ChromosomeOrder` if the input cannot be read or its
/// header holds no `@SQ` names.
pub fn order_from_input_header(input: &Path, format: &Format) -> Result<ChromosomeRanks, ConfigError> {
    let reader = open_input(input, Arc::new(AtomicU64::new(0))).map_err(|e| read_error(input, &e))?;
    let mut lines = LineReader::new(reader);
    let (header, _) = split_header(&mut lines, &format.header_rule()).map_err(|e| read_error(input, &e))?;

    let names = parse_header_text(&header.to_text())?;
    debug!(
        path = %input.display(),
        names = names.len(),
        "Using chromosome order from input header"
    );
    Ok(ChromosomeRanks::from_names(names))
}

fn read_error(path: &Path, e: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::ChromosomeOrder(format!("cannot read {}: {e}", path.display()))
}

/// Names from a sequence dictionary or SAM file header, via noodles.
fn parse_dict_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    use noodles::sam;

    let mut reader = std::fs::File::open(path)
        .map(BufReader::new)
        .map(sam::io::Reader::new)
        .map_err(|e| read_error(path, &e))?;

    let header = reader.read_header().map_err(|e| read_error(path, &e))?;

    let mut names = Vec::new();
    for (name, _) in header.reference_sequences() {
        push_name(&mut names, name.to_string())?;
    }
    non_empty(names, "no @SQ lines found in header")
}

/// Names from a FASTA index, via noodles.
fn parse_fai_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    use noodles::fasta;

    let reader = std::fs::File::open(path)
        .map(BufReader::new)
        .map_err(|e| read_error(path, &e))?;

    let index = fasta::fai::io::Reader::new(reader)
        .read_index()
        .map_err(|e| read_error(path, &e))?;

    let mut names = Vec::new();
    for record in index.as_ref() {
        push_name(&mut names, String::from_utf8_lossy(record.name()).to_string())?;
    }
    non_empty(names, "no sequences found in FASTA index")
}

/// Names from `@SQ` lines of SAM header text (stdin, pasted, or an input's header block).
///
/// # Errors
///
/// Returns `ConfigError::ChromosomeOrder` if no `@SQ` line carries an `SN`
/// tag, or the name limit is exceeded.
pub fn parse_header_text(text: &str) -> Result<Vec<String>, ConfigError> {
    let mut names = Vec::new();

    for line in text.lines() {
        if !line.starts_with("@SQ") {
            continue;
        }

        let name = line
            .split('\t')
            .skip(1)
            .filter_map(|field| field.split_once(':'))
            .find_map(|(tag, value)| (tag == "SN").then(|| value.to_string()));

        if let Some(name) = name {
            push_name(&mut names, name)?;
        }
    }

    non_empty(names, "no @SQ lines found in header")
}

/// Names from a plain list: first whitespace-delimited token per line.
///
/// Blank lines and `#` comments are ignored.
///
/// # Errors
///
/// Returns `ConfigError::ChromosomeOrder` if the list is empty or too long.
pub fn parse_name_list(text: &str) -> Result<Vec<String>, ConfigError> {
    let mut names = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.split_whitespace().next() {
            push_name(&mut names, name.to_string())?;
        }
    }

    non_empty(names, "no chromosome names found")
}

fn push_name(names: &mut Vec<String>, name: String) -> Result<(), ConfigError> {
    // Check name limit for DOS protection
    if let Some(message) = check_chromosome_limit(names.len()) {
        return Err(ConfigError::ChromosomeOrder(message));
    }
    names.push(name);
    Ok(())
}

fn non_empty(names: Vec<String>, message: &str) -> Result<Vec<String>, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::ChromosomeOrder(message.to_string()));
    }
    Ok(names)
}
