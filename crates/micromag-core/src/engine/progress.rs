use std::path::Path;
use tracing::info;

/// How much a runner reports while the external process executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No output.
    Quiet,
    /// A one-line summary per run.
    #[default]
    Summary,
    /// Snapshot-counting progress reports. The count only reflects output
    /// files already on disk, so it is a rough indication, not an exact
    /// progress signal.
    Progress,
}

impl Verbosity {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Quiet,
            1 => Verbosity::Summary,
            _ => Verbosity::Progress,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Verbosity::Quiet => 0,
            Verbosity::Summary => 1,
            Verbosity::Progress => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Progress {
    RunStart { package: String },
    Snapshots { written: usize, expected: usize },
    RunFinish { package: String, elapsed_secs: u64 },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

/// A reporter that routes every event to the `tracing` log.
pub fn tracing_reporter() -> ProgressReporter<'static> {
    ProgressReporter::with_callback(Box::new(|event| match event {
        Progress::RunStart { package } => info!(package = %package, "running external package"),
        Progress::Snapshots { written, expected } => {
            info!(written, expected, "snapshots on disk")
        }
        Progress::RunFinish {
            package,
            elapsed_secs,
        } => info!(package = %package, elapsed_secs, "run finished"),
        Progress::Message(message) => info!("{message}"),
    }))
}

/// Counts files in `dir` with the given extension; the best-effort snapshot
/// heuristic behind [`Verbosity::Progress`].
pub(crate) fn count_snapshots(dir: &Path, extension: &str) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn verbosity_levels_round_trip() {
        for level in 0..=2 {
            assert_eq!(Verbosity::from_level(level).level(), level);
        }
        assert_eq!(Verbosity::from_level(7), Verbosity::Progress);
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::Message("ignored".into()));
    }

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Snapshots { written, .. } = event {
                seen.lock().unwrap().push(written);
            }
        }));
        reporter.report(Progress::Snapshots {
            written: 3,
            expected: 10,
        });
        drop(reporter);
        assert_eq!(*seen.lock().unwrap(), [3]);
    }

    #[test]
    fn count_snapshots_matches_extension_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m0.omf"), b"").unwrap();
        std::fs::write(dir.path().join("m1.omf"), b"").unwrap();
        std::fs::write(dir.path().join("table.txt"), b"").unwrap();
        assert_eq!(count_snapshots(dir.path(), "omf"), 2);
        assert_eq!(count_snapshots(&dir.path().join("absent"), "omf"), 0);
    }
}
