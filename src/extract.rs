use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{
    count::{READ_BUFFER_CAPACITY, count_lines},
    error::{CutError, Result},
    window::{Infeasible, SegmentSpec, WindowPlan},
};

const OUTPUT_SUFFIX: &str = "_cutted.out";

/// Result of cutting a single trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Written(ExtractReport),
    /// Trace shorter than the feasibility gate, nothing was written.
    Skipped(Infeasible),
}

impl ExtractOutcome {
    pub fn output(&self) -> Option<&Path> {
        match self {
            Self::Written(report) => Some(&report.output),
            Self::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub output: PathBuf,
    pub total_lines: u64,
    pub plan: WindowPlan,
    /// Lines actually copied for the begin, middle and end windows.
    pub copied: [u64; 3],
}

/// `<output_dir>/<stem>_cutted.out` for `input`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| CutError::NoFileName {
        path: input.to_path_buf(),
    })?;
    let mut name = OsString::from(stem);
    name.push(OUTPUT_SUFFIX);
    Ok(output_dir.join(name))
}

/// Cuts the begin, middle and end segments of `input` into one file under
/// `output_dir`.
///
/// The trace is read twice, once to count and once to copy. Output goes to a
/// temporary file in `output_dir` that replaces the final path only after
/// the copy succeeded.
pub fn extract_segments(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    spec: SegmentSpec,
) -> Result<ExtractOutcome> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let total_lines = count_lines(input)?;
    info!("Total lines in {}: {total_lines}", input.display());

    let plan = match WindowPlan::new(total_lines, spec) {
        Ok(plan) => plan,
        Err(infeasible) => {
            info!(
                "File too small for segments of size {}.",
                spec.segment_size()
            );
            return Ok(ExtractOutcome::Skipped(infeasible));
        }
    };

    let output = output_path_for(input, output_dir)?;
    fs::create_dir_all(output_dir).map_err(|e| CutError::io(output_dir, e))?;

    let reader = File::open(input)
        .map(|f| BufReader::with_capacity(READ_BUFFER_CAPACITY, f))
        .map_err(|e| CutError::io(input, e))?;
    let copied = write_cut(reader, input, &output, &plan)?;

    for (window, (name, lines)) in plan
        .windows()
        .iter()
        .zip(["beginning", "middle", "end"].into_iter().zip(copied))
    {
        if lines < window.len() {
            warn!(
                "Short {name} segment: expected {} lines, copied {lines}",
                window.len()
            );
        }
    }
    info!("Merged trace file written to {}", output.display());

    Ok(ExtractOutcome::Written(ExtractReport {
        output,
        total_lines,
        plan,
        copied,
    }))
}

/// Cuts `reader` into a staging file next to `output` and renames it over
/// `output` once everything is flushed. On error the staging file is removed
/// and whatever was at `output` before is left untouched.
pub(crate) fn write_cut<R: BufRead>(
    reader: R,
    input: &Path,
    output: &Path,
    plan: &WindowPlan,
) -> Result<[u64; 3]> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let staging = staging_file(dir).map_err(|e| CutError::io(dir, e))?;
    let staging_path = staging.path().to_path_buf();
    let mut writer = BufWriter::with_capacity(READ_BUFFER_CAPACITY, staging);

    let copied = cut_segments(reader, &mut writer, plan).map_err(|e| CutError::io(input, e))?;
    let staging = writer
        .into_inner()
        .map_err(|e| CutError::io(&staging_path, e.into_error()))?;

    // Rewriting an existing cut keeps its mode, like File::create.
    if let Ok(existing) = fs::metadata(output) {
        staging
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| CutError::io(&staging_path, e))?;
    }
    staging
        .persist(output)
        .map_err(|e| CutError::io(output, e.error))?;
    Ok(copied)
}

/// Temporary file in `dir` created with the mode File::create would use.
fn staging_file(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".trace-cut");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Streams `input` once, writing the three windows of `plan` to `output` in
/// order. Returns the number of lines copied for each window; a window comes
/// up short only if `input` ends early.
pub fn cut_segments<R: BufRead, W: Write>(
    input: R,
    output: W,
    plan: &WindowPlan,
) -> io::Result<[u64; 3]> {
    let mut cutter = Cutter::new(input, output);
    let size = plan.segment_size();

    info!("Processing beginning segment...");
    let begin = cutter.copy(size)?;

    info!("Skipping to middle segment...");
    cutter.skip(plan.skip_to_middle())?;

    info!("Processing middle segment...");
    let middle = cutter.copy(size)?;

    info!("Skipping to end segment...");
    cutter.skip(plan.skip_to_end())?;

    info!("Processing end segment...");
    let end = cutter.copy(size)?;

    cutter.output.flush()?;
    Ok([begin, middle, end])
}

/// Forward-only line cursor over a buffered reader.
struct Cutter<R: BufRead, W: Write> {
    input: R,
    output: W,
    /// Bytes of the current record have been consumed but not its newline.
    mid_record: bool,
}

impl<R: BufRead, W: Write> Cutter<R, W> {
    fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            mid_record: false,
        }
    }

    fn copy(&mut self, lines: u64) -> io::Result<u64> {
        self.advance(lines, true)
    }

    fn skip(&mut self, lines: u64) -> io::Result<u64> {
        self.advance(lines, false)
    }

    /// Moves past `lines` records, writing them out when `emit` is set.
    /// Works on whole buffer chunks so no record is ever held in memory.
    fn advance(&mut self, lines: u64, emit: bool) -> io::Result<u64> {
        let mut done = 0_u64;
        while done < lines {
            let chunk = match self.input.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if chunk.is_empty() {
                // A final record without a newline still counts.
                if self.mid_record {
                    self.mid_record = false;
                    done += 1;
                }
                break;
            }

            let wanted = lines - done;
            let mut taken = chunk.len();
            let mut found = 0_u64;
            for (i, _) in chunk.iter().enumerate().filter(|(_, b)| **b == b'\n') {
                found += 1;
                if found == wanted {
                    taken = i + 1;
                    break;
                }
            }

            if emit {
                self.output.write_all(&chunk[..taken])?;
            }
            self.mid_record = chunk[taken - 1] != b'\n';
            self.input.consume(taken);
            done += found;
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::SegmentSpec;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};

    fn numbered(lines: u64) -> String {
        (0..lines).map(|i| format!("line_{i}\n")).collect()
    }

    fn plan(total: u64, size: u64) -> WindowPlan {
        WindowPlan::new(total, SegmentSpec::new(size).unwrap()).unwrap()
    }

    fn cut(text: &str, plan: &WindowPlan, capacity: usize) -> (String, [u64; 3]) {
        let mut out = Vec::new();
        let reader = BufReader::with_capacity(capacity, Cursor::new(text.as_bytes()));
        let copied = cut_segments(reader, &mut out, plan).unwrap();
        (String::from_utf8(out).unwrap(), copied)
    }

    fn expected(ranges: &[std::ops::Range<u64>]) -> String {
        ranges
            .iter()
            .flat_map(|r| r.clone())
            .map(|i| format!("line_{i}\n"))
            .collect()
    }

    #[test]
    fn copies_three_windows_in_order() {
        let (out, copied) = cut(&numbered(50), &plan(50, 10), 4096);
        assert_eq!(out, expected(&[0..10, 20..30, 40..50]));
        assert_eq!(copied, [10, 10, 10]);
    }

    #[test]
    fn tiny_buffers_split_lines_across_chunks() {
        let text = numbered(103);
        let plan = plan(103, 7);
        let (reference, _) = cut(&text, &plan, 4096);
        for capacity in [1, 2, 3, 5, 8, 13] {
            let (out, copied) = cut(&text, &plan, capacity);
            assert_eq!(out, reference, "capacity {capacity}");
            assert_eq!(copied, [7, 7, 7]);
        }
        // middle = 51 - 3 = 48
        assert_eq!(reference, expected(&[0..7, 48..55, 96..103]));
    }

    #[test]
    fn abutting_middle_and_end_windows() {
        let (out, _) = cut(&numbered(4), &plan(4, 1), 16);
        assert_eq!(out, expected(&[0..1, 2..3, 3..4]));
    }

    #[test]
    fn unterminated_last_line_is_copied_verbatim() {
        let mut text = numbered(39);
        text.push_str("line_39");
        let (out, copied) = cut(&text, &plan(40, 10), 6);
        let mut want = expected(&[0..10, 15..25, 30..39]);
        want.push_str("line_39");
        assert_eq!(out, want);
        assert_eq!(copied, [10, 10, 10]);
    }

    #[test]
    fn early_end_of_input_gives_short_end_window() {
        // Plan for 40 lines, but only 35 arrive.
        let (out, copied) = cut(&numbered(35), &plan(40, 10), 4096);
        assert_eq!(out, expected(&[0..10, 15..25, 30..35]));
        assert_eq!(copied, [10, 10, 5]);
    }

    #[test]
    fn empty_input_copies_nothing() {
        let (out, copied) = cut("", &plan(40, 10), 4096);
        assert_eq!(out, "");
        assert_eq!(copied, [0, 0, 0]);
    }

    /// Hands out `limit` bytes of `inner`, then fails.
    struct BrokenPipe {
        inner: Cursor<Vec<u8>>,
        limit: usize,
    }

    impl io::Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::Error::other("device went away"));
            }
            let n = buf.len().min(self.limit);
            let read = self.inner.read(&mut buf[..n])?;
            self.limit -= read;
            Ok(read)
        }
    }

    fn broken_reader(lines: u64, limit: usize) -> BufReader<BrokenPipe> {
        BufReader::with_capacity(
            16,
            BrokenPipe {
                inner: Cursor::new(numbered(lines).into_bytes()),
                limit,
            },
        )
    }

    fn staged_entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[test]
    fn failed_read_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gcc_cutted.out");

        let result = write_cut(
            broken_reader(50, 120),
            Path::new("gcc.out"),
            &output,
            &plan(50, 10),
        );

        match result {
            Err(CutError::Io { path, .. }) => assert_eq!(path, PathBuf::from("gcc.out")),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(!output.exists());
        assert_eq!(staged_entries(dir.path()), Vec::<PathBuf>::new());
    }

    #[test]
    fn failed_rerun_keeps_the_previous_cut() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gcc_cutted.out");
        let plan = plan(50, 10);

        let reader = BufReader::new(Cursor::new(numbered(50)));
        write_cut(reader, Path::new("gcc.out"), &output, &plan).unwrap();
        let previous = fs::read(&output).unwrap();

        let result = write_cut(broken_reader(50, 200), Path::new("gcc.out"), &output, &plan);

        assert!(result.is_err());
        assert_eq!(fs::read(&output).unwrap(), previous);
        assert_eq!(staged_entries(dir.path()), vec![output]);
    }

    #[cfg(unix)]
    #[test]
    fn cut_gets_the_same_mode_as_a_created_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gcc_cutted.out");
        let reference = dir.path().join("reference");
        File::create(&reference).unwrap();

        let reader = BufReader::new(Cursor::new(numbered(40)));
        write_cut(reader, Path::new("gcc.out"), &output, &plan(40, 10)).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&output), mode(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn rerun_keeps_the_mode_of_an_existing_cut() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gcc_cutted.out");
        fs::write(&output, "old\n").unwrap();
        fs::set_permissions(&output, fs::Permissions::from_mode(0o640)).unwrap();

        let reader = BufReader::new(Cursor::new(numbered(40)));
        write_cut(reader, Path::new("gcc.out"), &output, &plan(40, 10)).unwrap();

        let mode = fs::metadata(&output).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn output_name_uses_stem() {
        let out = output_path_for(Path::new("../trace/gcc.out"), Path::new("trace")).unwrap();
        assert_eq!(out, PathBuf::from("trace/gcc_cutted.out"));
        let out = output_path_for(Path::new("traces/leela"), Path::new("o")).unwrap();
        assert_eq!(out, PathBuf::from("o/leela_cutted.out"));
        let out = output_path_for(Path::new("a/wrf.trace.txt"), Path::new("o")).unwrap();
        assert_eq!(out, PathBuf::from("o/wrf.trace_cutted.out"));
    }

    #[test]
    fn output_name_needs_a_file_name() {
        assert!(matches!(
            output_path_for(Path::new("/"), Path::new("o")),
            Err(CutError::NoFileName { .. })
        ));
    }
}
