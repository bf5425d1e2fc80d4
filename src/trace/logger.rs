use std::{cell::RefCell, fs::OpenOptions, io::Write, path::Path};

use tracing::warn;

use crate::trace::trace::RewriteTrace;

/// Appends trace events as JSON lines. A logger whose file could not be
/// opened silently drops events.
pub struct TraceLogger {
    file: Option<RefCell<std::fs::File>>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("could not create trace directory '{}': {}", parent.display(), e);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(RefCell::new(f)),
            },
            Err(e) => {
                warn!("could not open trace file '{}': {}", path.display(), e);
                Self { file: None }
            }
        }
    }

    pub fn log(&self, event: &RewriteTrace) {
        let Some(file) = &self.file else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!("failed to serialize trace event: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file.borrow_mut(), "{}", json) {
            warn!("failed to write trace event: {}", e);
        }
    }
}
