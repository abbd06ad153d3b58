use crate::error::OrthoError;
use flate2::read::MultiGzDecoder;
use tempfile::NamedTempFile;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn is_gz(path: &Path) -> bool {
    path.extension().map(|e| e.eq_ignore_ascii_case("gz")).unwrap_or(false)
}

/// Open a text input that may be gzipped.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, OrthoError> {
    let f = File::open(path).map_err(|e| OrthoError::unreadable(path, e))?;
    if is_gz(path) {
        let gz = MultiGzDecoder::new(f);
        Ok(Box::new(BufReader::new(gz)))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Output written to a temporary file beside its target and moved into place
/// by [`StagedOutput::persist`]. Dropping it unpersisted removes the temp file.
pub struct StagedOutput {
    inner: BufWriter<NamedTempFile>,
    target: PathBuf,
}

impl StagedOutput {
    pub fn create(target: &Path) -> Result<Self, OrthoError> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".orthokit-")
            .tempfile_in(dir)
            .map_err(|e| OrthoError::write_failure(target, e))?;
        Ok(StagedOutput { inner: BufWriter::new(tmp), target: target.to_path_buf() })
    }

    /// Stage an already rendered output.
    pub fn rendered(target: &Path, bytes: &[u8]) -> Result<Self, OrthoError> {
        let mut staged = Self::create(target)?;
        staged.write_all(bytes).map_err(|e| OrthoError::write_failure(target, e))?;
        Ok(staged)
    }

    /// Flush and rename onto the target path.
    pub fn persist(self) -> Result<PathBuf, OrthoError> {
        let StagedOutput { inner, target } = self;
        let tmp = inner
            .into_inner()
            .map_err(|e| OrthoError::write_failure(&target, e.into_error()))?;
        tmp.persist(&target).map_err(|e| OrthoError::write_failure(&target, e.error))?;
        Ok(target)
    }
}

impl Write for StagedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Persist every staged output or none: on failure the ones already moved
/// into place are removed again and the rest are discarded.
pub fn persist_all(staged: Vec<StagedOutput>) -> Result<Vec<PathBuf>, OrthoError> {
    let mut done: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for s in staged {
        match s.persist() {
            Ok(p) => done.push(p),
            Err(e) => {
                for p in &done {
                    if let Err(rm) = fs::remove_file(p) {
                        log::warn!("could not remove {}: {}", p.display(), rm);
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(done)
}

/// Header text of a FASTA header line, or `None` for a sequence line.
/// Every '>' is dropped and the result trimmed.
pub fn fasta_header(line: &str) -> Option<String> {
    if line.starts_with('>') {
        Some(line.trim().replace('>', "").trim().to_string())
    } else {
        None
    }
}

/// File name without its last extension: `data/x.fa.gz` -> `x.fa`.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sibling of `input` named after its stem plus `suffix`:
/// `data/x.faa` + `_edit.fasta` -> `data/x_edit.fasta`.
pub fn sibling_output(input: &Path, suffix: &str) -> PathBuf {
    input.with_file_name(format!("{}{}", file_stem_string(input), suffix))
}

/// `<prefix><dd-mm-YYYY--HHMMSS>.txt` in local time.
pub fn timestamped_name(prefix: &str) -> PathBuf {
    let now = chrono::Local::now().format("%d-%m-%Y--%H%M%S");
    PathBuf::from(format!("{}{}.txt", prefix, now))
}
