use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use osod_payload::{Payload, PayloadKind};

use crate::output::csv_line;

/// Appends one CSV line per payload to `<dir>/<snake_case_kind>.log`.
///
/// Files are opened lazily in append mode, so restarting the monitor keeps
/// earlier records.
pub struct PayloadLog {
    dir: PathBuf,
    files: HashMap<PayloadKind, File>,
}

impl PayloadLog {
    pub fn create(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: HashMap::new(),
        })
    }

    pub fn path_for(&self, kind: PayloadKind) -> PathBuf {
        self.dir.join(format!("{}.log", kind.snake_name()))
    }

    pub fn record(&mut self, payload: &Payload) -> io::Result<()> {
        let kind = payload.kind();
        let file = match self.files.get_mut(&kind) {
            Some(file) => file,
            None => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.path_for(kind))?;
                self.files.entry(kind).or_insert(file)
            }
        };
        writeln!(file, "{}", csv_line(payload))
    }
}
