//! Evolution proposal artifacts
//!
//! Proposals are markdown documents named `evo-YYYYMMDD-NN-<slug>.md` with a
//! per-day sequence number. Allocation is behind a trait so the directory-scan
//! strategy can be swapped out; the scan itself is only safe for a single
//! writer, which the run lock in `Librarians` guarantees.

use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("proposal io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProposalResult<T> = Result<T, ProposalError>;

/// Destination for evolution proposal documents.
pub trait ProposalStore: Send + Sync {
    /// Filenames of proposals already written for `date` (YYYYMMDD).
    fn list_for_date(&self, date: &str) -> ProposalResult<Vec<String>>;

    /// Write a document, returning where it landed.
    fn write(&self, filename: &str, content: &str) -> ProposalResult<String>;

    /// Next free sequence number for `date`, starting at 1.
    fn next_sequence(&self, date: &str) -> ProposalResult<u32> {
        let max = self
            .list_for_date(date)?
            .iter()
            .filter_map(|name| name.split('-').nth(2))
            .filter_map(|seq| seq.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }
}

/// Proposal store writing into a flat directory.
pub struct DirProposalStore {
    dir: PathBuf,
}

impl DirProposalStore {
    pub fn new(dir: impl Into<PathBuf>) -> ProposalResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl ProposalStore for DirProposalStore {
    fn list_for_date(&self, date: &str) -> ProposalResult<Vec<String>> {
        let prefix = format!("evo-{}-", date);
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn write(&self, filename: &str, content: &str) -> ProposalResult<String> {
        let path = self.dir.join(filename);
        fs::write(&path, content)?;
        Ok(path.display().to_string())
    }
}
