//! Rendered output files and their atomic persistence

use crate::core::error::Result;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// One output file, fully rendered in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
    /// Rules in the file, jump rule included
    pub rule_count: usize,
}

impl Artifact {
    /// Joins rendered lines, newline-terminating each.
    pub fn from_lines(file_name: String, lines: &[String], rule_count: usize) -> Self {
        let mut contents = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        Self {
            file_name,
            contents,
            rule_count,
        }
    }

    /// Hex-encoded SHA-256 of the contents.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.contents.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Writes the artifact into `dir` and optionally a `<file>.sha256`
    /// sidecar. The target is never left half-written: contents go to a
    /// temporary file in `dir` that is renamed into place.
    pub fn write_to(&self, dir: &Path, sidecar: bool) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        write_atomic(dir, &path, self.contents.as_bytes())?;

        let checksum = self.checksum();
        if sidecar {
            let sidecar_path = dir.join(format!("{}.sha256", self.file_name));
            let line = format!("{checksum}  {}\n", self.file_name);
            write_atomic(dir, &sidecar_path, line.as_bytes())?;
        }

        info!(
            "Dumped {} rules to file: {} (sha256 {})",
            self.rule_count,
            path.display(),
            checksum
        );
        Ok(path)
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_terminates_each_line() {
        let artifact = Artifact::from_lines(
            "a.dpdk".to_string(),
            &["one".to_string(), "two".to_string()],
            2,
        );
        assert_eq!(artifact.contents, "one\ntwo\n");
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let artifact = Artifact::from_lines("a".to_string(), &[], 0);
        // SHA-256 of the empty string
        assert_eq!(
            artifact.checksum(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_write_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::from_lines("rules.ovs".to_string(), &["x".to_string()], 1);
        let path = artifact.write_to(dir.path(), true).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
        let sidecar = std::fs::read_to_string(dir.path().join("rules.ovs.sha256")).unwrap();
        assert!(sidecar.starts_with(&artifact.checksum()));
        assert!(sidecar.trim_end().ends_with("rules.ovs"));

        // no temp files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        Artifact::from_lines("r".to_string(), &["old".to_string()], 1)
            .write_to(dir.path(), false)
            .unwrap();
        let path = Artifact::from_lines("r".to_string(), &["new".to_string()], 1)
            .write_to(dir.path(), false)
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new\n");
    }
}
