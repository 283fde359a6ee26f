use farsi_norm::{detect_numbers, NormalizationConfig, Normalizer};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Serialize, Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Serialize, Debug, Default)]
pub struct BatchReport {
    pub files: usize,
    pub normalized: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub numbers: usize,
    pub failures: Vec<FileFailure>,
}

struct FileOutcome {
    bytes_in: u64,
    bytes_out: u64,
    numbers: usize,
}

/// Normalize every file under `input_dir` into the same relative path under
/// `out_dir`. Files that are not valid UTF-8 are reported, not fatal.
pub fn normalize_tree(
    input_dir: &Path,
    out_dir: &Path,
    config: &NormalizationConfig,
    limit: Option<usize>,
) -> anyhow::Result<BatchReport> {
    let entries: Vec<_> = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .collect();

    println!("Found {} files", entries.len());
    let max_files = limit.unwrap_or(entries.len());
    let selected = &entries[..entries.len().min(max_files)];

    std::fs::create_dir_all(out_dir)?;
    let normalizer = Normalizer::new(config.clone());

    let outcomes: Vec<(PathBuf, anyhow::Result<FileOutcome>)> = selected
        .par_iter()
        .map(|entry| {
            let src = entry.path();
            let dest = output_path(input_dir, out_dir, src);
            (src.to_path_buf(), normalize_file(&normalizer, src, &dest))
        })
        .collect();

    let mut report = BatchReport {
        files: outcomes.len(),
        ..Default::default()
    };
    for (path, outcome) in outcomes {
        match outcome {
            Ok(o) => {
                report.normalized += 1;
                report.bytes_in += o.bytes_in;
                report.bytes_out += o.bytes_out;
                report.numbers += o.numbers;
            }
            Err(e) => {
                warn!(path = %path.display(), "skipping file: {:#}", e);
                report.failures.push(FileFailure {
                    path,
                    error: format!("{:#}", e),
                });
            }
        }
    }
    Ok(report)
}

fn output_path(input_dir: &Path, out_dir: &Path, src: &Path) -> PathBuf {
    match src.strip_prefix(input_dir) {
        Ok(rel) if !rel.as_os_str().is_empty() => out_dir.join(rel),
        _ => out_dir.join(src.file_name().unwrap_or(src.as_os_str())),
    }
}

fn normalize_file(normalizer: &Normalizer, src: &Path, dest: &Path) -> anyhow::Result<FileOutcome> {
    let raw = std::fs::read(src)?;
    let text = normalizer.normalize_bytes(&raw)?;
    let numbers = detect_numbers(&text).len();

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, &text)?;
    debug!(src = %src.display(), dest = %dest.display(), "normalized file");

    Ok(FileOutcome {
        bytes_in: raw.len() as u64,
        bytes_out: text.len() as u64,
        numbers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_tree_mirrors_layout() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        fs::create_dir_all(input.path().join("nested")).unwrap();
        fs::write(input.path().join("a.txt"), "  سلام   دنیا ۱۲ ").unwrap();
        fs::write(input.path().join("nested/b.txt"), "see http://example.com now").unwrap();
        fs::write(input.path().join("broken.txt"), [0x61, 0xff, 0x62]).unwrap();

        let config = NormalizationConfig::full();
        let report = normalize_tree(input.path(), output.path(), &config, None).unwrap();

        assert_eq!(report.files, 3);
        assert_eq!(report.normalized, 2);
        assert_eq!(report.numbers, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("broken.txt"));

        let a = fs::read_to_string(output.path().join("a.txt")).unwrap();
        assert_eq!(a, "سلام دنیا ۱۲");
        let b = fs::read_to_string(output.path().join("nested/b.txt")).unwrap();
        assert_eq!(b, "see now");
        assert!(!output.path().join("broken.txt").exists());
    }

    #[test]
    fn test_limit() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for i in 0..4 {
            fs::write(input.path().join(format!("{i}.txt")), "متن").unwrap();
        }
        let report =
            normalize_tree(input.path(), output.path(), &NormalizationConfig::default(), Some(2))
                .unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.normalized, 2);
    }
}
