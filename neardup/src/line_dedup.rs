//! Exact line deduplication across a set of files.
//!
//! A line survives only if its content occurs exactly once in the whole
//! corpus. Every copy of a repeated line is removed, the first included.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::error::{DedupError, Result};
use crate::io::{create_dir, output_path, read_text, write_atomic};

/// Digest used as a line's identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineHasher {
    #[default]
    Sha1,
    /// 64-bit SeaHash; faster, with a small chance of collisions on huge corpora.
    Sea,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum LineDigest {
    Sha1([u8; 20]),
    Sea(u64),
}

impl LineHasher {
    fn digest(&self, line: &str) -> LineDigest {
        match self {
            LineHasher::Sha1 => {
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(&Sha1::digest(line.as_bytes()));
                LineDigest::Sha1(bytes)
            }
            LineHasher::Sea => LineDigest::Sea(seahash::hash(line.as_bytes())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDedupConfig {
    pub hasher: LineHasher,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineDedupReport {
    pub files_written: usize,
    pub lines_kept: usize,
    pub lines_removed: usize,
    /// Inputs that could not be read or written, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

/// Line content without its terminator, so the last line of a file matches
/// the same text elsewhere whether or not it ends in a newline.
fn line_identity(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn add_line_counts(text: &str, hasher: LineHasher, counts: &mut AHashMap<LineDigest, u64>) {
    for line in text.split_inclusive('\n') {
        *counts.entry(hasher.digest(line_identity(line))).or_insert(0) += 1;
    }
}

fn merge_counts(a: AHashMap<LineDigest, u64>, b: AHashMap<LineDigest, u64>) -> AHashMap<LineDigest, u64> {
    let (mut larger, smaller) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (digest, count) in smaller {
        *larger.entry(digest).or_insert(0) += count;
    }
    larger
}

/// Removes every line that appears more than once across `files` and writes
/// the remaining lines, in order and with their original terminators, to
/// `out_dir` under each input's file name. Uses [`LineHasher::Sha1`].
pub fn exact_line_dedup<P>(files: &[P], out_dir: impl AsRef<Path>) -> Result<LineDedupReport>
where
    P: AsRef<Path> + Sync,
{
    exact_line_dedup_with_config(files, out_dir, &LineDedupConfig::default())
}

/// Like [`exact_line_dedup`], with an explicit line hasher.
///
/// Files are read twice, once to count and once to filter. The counting pass
/// keeps one count map per worker thread and merges them, so no file text
/// is held beyond its own read. A file that fails to read in either pass,
/// or whose file name was already written by an earlier input, is left out
/// of the output and listed in [`LineDedupReport::failures`].
pub fn exact_line_dedup_with_config<P>(
    files: &[P],
    out_dir: impl AsRef<Path>,
    config: &LineDedupConfig,
) -> Result<LineDedupReport>
where
    P: AsRef<Path> + Sync,
{
    let out_dir = out_dir.as_ref();
    create_dir(out_dir)?;
    let hasher = config.hasher;

    let (counts, mut read_errors): (AHashMap<LineDigest, u64>, Vec<(usize, DedupError)>) = files
        .par_iter()
        .enumerate()
        .fold(
            || (AHashMap::new(), Vec::new()),
            |(mut counts, mut errors), (index, path)| {
                match read_text(path.as_ref()) {
                    Ok(text) => add_line_counts(&text, hasher, &mut counts),
                    Err(e) => errors.push((index, e)),
                }
                (counts, errors)
            },
        )
        .reduce(
            || (AHashMap::new(), Vec::new()),
            |(counts, mut errors), (other_counts, other_errors)| {
                errors.extend(other_errors);
                (merge_counts(counts, other_counts), errors)
            },
        );
    read_errors.sort_by_key(|(index, _)| *index);

    let mut report = LineDedupReport::default();
    let mut unreadable = AHashSet::with_capacity(read_errors.len());
    for (index, e) in read_errors {
        let path = files[index].as_ref();
        warn!(path = %path.display(), error = %e, "skipping unreadable file");
        report.failures.push((path.to_path_buf(), e.to_string()));
        unreadable.insert(index);
    }
    let readable: Vec<&Path> = files
        .iter()
        .enumerate()
        .filter(|(index, _)| !unreadable.contains(index))
        .map(|(_, path)| path.as_ref())
        .collect();
    debug!(distinct_lines = counts.len(), files = readable.len(), "counted lines");

    let mut names: AHashSet<OsString> = AHashSet::new();
    for path in readable {
        let text = match read_text(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file became unreadable");
                report.failures.push((path.to_path_buf(), e.to_string()));
                continue;
            }
        };
        let target = match output_path(out_dir, path) {
            Some(target) => target,
            None => {
                report.failures.push((path.to_path_buf(), "input path has no file name".to_string()));
                continue;
            }
        };
        let name = target.file_name().map(OsStr::to_os_string).unwrap_or_default();
        if names.contains(&name) {
            warn!(path = %path.display(), "output file name already written by another input");
            report.failures.push((path.to_path_buf(), format!("output name {:?} is already taken", name)));
            continue;
        }

        let mut output = String::with_capacity(text.len());
        let (mut kept, mut removed) = (0, 0);
        for line in text.split_inclusive('\n') {
            let digest = hasher.digest(line_identity(line));
            if counts.get(&digest).copied() == Some(1) {
                output.push_str(line);
                kept += 1;
            } else {
                removed += 1;
            }
        }

        match write_atomic(&target, output.as_bytes()) {
            Ok(()) => {
                names.insert(name);
                report.files_written += 1;
                report.lines_kept += kept;
                report.lines_removed += removed;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write file");
                report.failures.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    info!(
        files_written = report.files_written,
        lines_kept = report.lines_kept,
        lines_removed = report.lines_removed,
        failures = report.failures.len(),
        "exact line dedup finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_line_identity() {
        assert_eq!(line_identity("abc\n"), "abc");
        assert_eq!(line_identity("abc\r\n"), "abc");
        assert_eq!(line_identity("abc"), "abc");
        assert_eq!(line_identity("\n"), "");
    }

    #[test]
    fn test_hashers_distinguish_lines() {
        for hasher in [LineHasher::Sha1, LineHasher::Sea] {
            assert_eq!(hasher.digest("same"), hasher.digest("same"));
            assert_ne!(hasher.digest("same"), hasher.digest("Same"));
        }
    }

    #[test]
    fn test_repeated_lines_removed_everywhere() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let f1 = input.path().join("f1.txt");
        let f2 = input.path().join("f2.txt");
        fs::write(&f1, "hello\nunique1\n").unwrap();
        fs::write(&f2, "hello\nunique2\n").unwrap();

        let report = exact_line_dedup(&[&f1, &f2], output.path()).unwrap();
        assert_eq!(fs::read_to_string(output.path().join("f1.txt")).unwrap(), "unique1\n");
        assert_eq!(fs::read_to_string(output.path().join("f2.txt")).unwrap(), "unique2\n");
        assert_eq!(report.files_written, 2);
        assert_eq!(report.lines_kept, 2);
        assert_eq!(report.lines_removed, 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_repeats_within_one_file() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let f1 = input.path().join("doc.txt");
        fs::write(&f1, "a\nb\na\r\nc\na").unwrap();

        let config = LineDedupConfig { hasher: LineHasher::Sea };
        let report = exact_line_dedup_with_config(&[&f1], output.path(), &config).unwrap();
        assert_eq!(fs::read_to_string(output.path().join("doc.txt")).unwrap(), "b\nc\n");
        assert_eq!(report.lines_removed, 3);
    }

    #[test]
    fn test_blank_lines_count_as_lines() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let f1 = input.path().join("doc.txt");
        fs::write(&f1, "title\n\nbody\n\nend").unwrap();

        exact_line_dedup(&[&f1], output.path()).unwrap();
        assert_eq!(fs::read_to_string(output.path().join("doc.txt")).unwrap(), "title\nbody\nend");
    }

    #[test]
    fn test_missing_file_reported() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let present = input.path().join("present.txt");
        let missing = input.path().join("missing.txt");
        fs::write(&present, "only line\n").unwrap();

        let report = exact_line_dedup(&[&present, &missing], output.path()).unwrap();
        assert_eq!(report.files_written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, missing);
        assert!(!output.path().join("missing.txt").exists());
    }

    #[test]
    fn test_same_file_name_from_two_directories() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::create_dir(input.path().join("d1")).unwrap();
        fs::create_dir(input.path().join("d2")).unwrap();
        let first = input.path().join("d1").join("a.txt");
        let second = input.path().join("d2").join("a.txt");
        fs::write(&first, "only in first\n").unwrap();
        fs::write(&second, "only in second\n").unwrap();

        let report = exact_line_dedup(&[&first, &second], output.path()).unwrap();
        assert_eq!(report.files_written, 1);
        assert_eq!(report.lines_kept, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, second);
        assert_eq!(fs::read_to_string(output.path().join("a.txt")).unwrap(), "only in first\n");
    }

    #[test]
    fn test_counts_merge_across_many_files() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..32)
            .map(|i| {
                let path = input.path().join(format!("f{}.txt", i));
                fs::write(&path, format!("shared header\nbody {}\n", i)).unwrap();
                path
            })
            .collect();

        let report = exact_line_dedup(&files, output.path()).unwrap();
        assert_eq!(report.files_written, 32);
        assert_eq!(report.lines_removed, 32);
        assert_eq!(fs::read_to_string(output.path().join("f7.txt")).unwrap(), "body 7\n");
    }

    #[test]
    fn test_empty_input() {
        let output = tempdir().unwrap();
        let files: [PathBuf; 0] = [];
        let report = exact_line_dedup(&files, output.path()).unwrap();
        assert_eq!(report, LineDedupReport::default());
    }
}
