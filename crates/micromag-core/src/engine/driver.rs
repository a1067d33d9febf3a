use super::error::DriveError;
use super::progress::Verbosity;
use super::provenance::DriveRecord;
use super::runner::run_captured;
use crate::core::io::ovf::OvfFormat;
use crate::core::models::system::System;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Kind of a working directory: one per drive or derived-quantity
/// computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Drive,
    Compute,
}

impl Mode {
    pub fn prefix(&self) -> &'static str {
        match self {
            Mode::Drive => "drive",
            Mode::Compute => "compute",
        }
    }
}

/// Options of [`ExternalDriver::drive`].
#[derive(Debug, Clone)]
pub struct DriveOptions {
    /// Base directory under which the system directory is created.
    pub dirname: PathBuf,
    /// Whether an existing system directory may be appended to; when false,
    /// an existing directory fails the drive before any filesystem effect.
    pub append: bool,
    /// Output precision of magnetization snapshots.
    pub ovf_format: OvfFormat,
    pub verbosity: Verbosity,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            dirname: PathBuf::from("."),
            append: true,
            ovf_format: OvfFormat::default(),
            verbosity: Verbosity::default(),
        }
    }
}

impl DriveOptions {
    /// Option echoes recorded in the provenance file.
    pub(crate) fn echo(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("dirname".to_string(), json!(self.dirname.display().to_string()));
        map.insert("append".to_string(), json!(self.append));
        map.insert("ovf_format".to_string(), json!(self.ovf_format.as_str()));
        map.insert("verbose".to_string(), json!(self.verbosity.level()));
        map
    }
}

/// Header of a scheduler submission script: verbatim text, or the contents
/// of a header file.
#[derive(Debug, Clone)]
pub enum ScheduleHeader {
    Inline(String),
    File(PathBuf),
}

impl ScheduleHeader {
    /// Resolves the header to its text. A header file is resolved to an
    /// absolute path first, so it stays valid regardless of later directory
    /// changes.
    fn resolve(&self) -> Result<String, DriveError> {
        match self {
            ScheduleHeader::Inline(text) => Ok(text.clone()),
            ScheduleHeader::File(path) => {
                let absolute = fs::canonicalize(path)?;
                Ok(fs::read_to_string(absolute)?)
            }
        }
    }
}

impl From<&str> for ScheduleHeader {
    fn from(text: &str) -> Self {
        ScheduleHeader::Inline(text.to_string())
    }
}

/// Options of [`ExternalDriver::schedule`].
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    pub dirname: PathBuf,
    pub append: bool,
    pub ovf_format: OvfFormat,
    /// File name of the generated submission script.
    pub script_name: String,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            dirname: PathBuf::from("."),
            append: true,
            ovf_format: OvfFormat::default(),
            script_name: "job.sh".to_string(),
        }
    }
}

impl ScheduleOptions {
    pub(crate) fn echo(&self, cmd: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("dirname".to_string(), json!(self.dirname.display().to_string()));
        map.insert("append".to_string(), json!(self.append));
        map.insert("ovf_format".to_string(), json!(self.ovf_format.as_str()));
        map.insert("script_name".to_string(), json!(self.script_name));
        map.insert("cmd".to_string(), json!(cmd));
        map
    }
}

/// Allocates the next unused working directory
/// `{base}/{system_name}/{mode}-{n}`.
///
/// `n` is found by scanning existing `{mode}-{k}` siblings and taking
/// `max + 1` (0 when none exist), so successive calls never reuse a
/// directory. When the system directory exists and `append` is false, the
/// call fails before creating anything.
///
/// # Errors
///
/// Returns [`DriveError::SystemDirectoryExists`] when appending is
/// disallowed, or an I/O error from scanning or creating directories.
pub fn allocate_working_directory(
    base: &Path,
    system_name: &str,
    mode: Mode,
    append: bool,
) -> Result<PathBuf, DriveError> {
    let system_dir = base.join(system_name);
    if system_dir.exists() && !append {
        return Err(DriveError::SystemDirectoryExists(system_dir));
    }
    let prefix = mode.prefix();
    let mut next = 0;
    if system_dir.is_dir() {
        for entry in fs::read_dir(&system_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(number) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('-'))
                .and_then(|rest| rest.parse::<usize>().ok())
            {
                next = next.max(number + 1);
            }
        }
    }
    let workdir = system_dir.join(format!("{prefix}-{next}"));
    fs::create_dir_all(&workdir)?;
    Ok(workdir)
}

/// Allocates the working directory of a derived-quantity computation and
/// advances the system's compute counter.
///
/// # Errors
///
/// Fails like [`allocate_working_directory`].
pub fn allocate_compute_directory(
    base: &Path,
    system: &mut System,
    append: bool,
) -> Result<PathBuf, DriveError> {
    let workdir = allocate_working_directory(base, system.name(), Mode::Compute, append)?;
    system.register_compute();
    Ok(workdir)
}

/// Orchestrates drives of a [`System`] against an external simulation
/// package.
///
/// Implementors supply the solver-specific pieces: input-file serialization,
/// the synchronous invocation and reading results back. The provided
/// [`drive`](ExternalDriver::drive) and [`schedule`](ExternalDriver::schedule)
/// methods implement the shared lifecycle: validate, allocate a fresh
/// working directory, write inputs and the provenance record, run (or
/// submit), amend the record, and advance the system's drive counter.
///
/// The drive counter advances exactly once per call, success or failure: the
/// working directory and its provenance record already exist on disk, so a
/// failed drive keeps its version slot instead of letting a later drive
/// collide with its artifacts.
pub trait ExternalDriver {
    /// Driver kind name recorded in the provenance file.
    fn name(&self) -> &'static str;

    /// Pre-drive validation of the system.
    ///
    /// # Errors
    ///
    /// Returns an error if the system cannot be driven, before any
    /// filesystem effect.
    fn check_system(&self, system: &System) -> Result<(), DriveError>;

    /// Serializes the system into the external package's native input files
    /// inside `workdir`.
    fn write_input_files(
        &self,
        system: &System,
        options: &DriveOptions,
        workdir: &Path,
    ) -> Result<(), DriveError>;

    /// Runs the external package synchronously in `workdir`.
    fn invoke(
        &self,
        system: &System,
        workdir: &Path,
        options: &DriveOptions,
    ) -> Result<(), DriveError>;

    /// Run command lines for a scheduled drive; never executed directly,
    /// only embedded into the submission script.
    fn schedule_commands(&self, system: &System, workdir: &Path) -> Vec<String>;

    /// Parses solver output in `workdir` back into the system.
    fn read_results(&self, system: &mut System, workdir: &Path) -> Result<(), DriveError>;

    /// Drives `system` once: runs the external package to completion and
    /// reads the resulting magnetization back into the system.
    ///
    /// # Errors
    ///
    /// Any validation, I/O or process failure is surfaced to the caller;
    /// a process failure is recorded in the provenance file first.
    fn drive(&self, system: &mut System, options: DriveOptions) -> Result<(), DriveError> {
        self.check_system(system)?;
        let workdir =
            allocate_working_directory(&options.dirname, system.name(), Mode::Drive, options.append)?;
        info!(
            system = system.name(),
            driver = self.name(),
            workdir = %workdir.display(),
            "starting drive"
        );
        let mut record = DriveRecord::begin(system.drive_number(), self.name(), options.echo());
        self.write_input_files(system, &options, &workdir)?;
        record.write(&workdir)?;

        let outcome = self.invoke(system, &workdir, &options);
        record.finish(outcome.is_ok());
        record.write(&workdir)?;
        system.register_drive();
        outcome?;

        self.read_results(system, &workdir)?;
        debug!(system = system.name(), "drive finished");
        Ok(())
    }

    /// Schedules `system` for execution through a batch scheduler: writes
    /// the input files and a submission script (header, one blank line, then
    /// the run commands), and submits it as `{cmd} {script_name}`.
    ///
    /// Completion is asynchronous and not observed, so the provenance record
    /// keeps only its start fields on success and the drive counter advances
    /// immediately after submission.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::SubmissionFailed`] when the submission command
    /// exits non-zero, embedding the command line and any captured output.
    fn schedule(
        &self,
        system: &mut System,
        cmd: &str,
        header: ScheduleHeader,
        options: ScheduleOptions,
    ) -> Result<(), DriveError> {
        self.check_system(system)?;
        let header_text = header.resolve()?;
        let workdir =
            allocate_working_directory(&options.dirname, system.name(), Mode::Drive, options.append)?;
        info!(
            system = system.name(),
            driver = self.name(),
            workdir = %workdir.display(),
            "scheduling drive"
        );
        let drive_options = DriveOptions {
            dirname: options.dirname.clone(),
            append: options.append,
            ovf_format: options.ovf_format,
            verbosity: Verbosity::Quiet,
        };
        let mut record = DriveRecord::begin(system.drive_number(), self.name(), options.echo(cmd));
        self.write_input_files(system, &drive_options, &workdir)?;
        record.write(&workdir)?;

        let mut script = header_text.trim_end_matches('\n').to_string();
        script.push_str("\n\n");
        for command in self.schedule_commands(system, &workdir) {
            script.push_str(&command);
            script.push('\n');
        }
        fs::write(workdir.join(&options.script_name), script)?;

        let submission = vec![cmd.to_string(), options.script_name.clone()];
        let outcome = run_captured(&submission, &workdir);
        let failed = match &outcome {
            Ok(output) => !output.success(),
            Err(_) => true,
        };
        if failed {
            record.finish(false);
            record.write(&workdir)?;
        }
        system.register_drive();
        let output = outcome?;
        if !output.success() {
            return Err(DriveError::SubmissionFailed { output });
        }
        debug!(system = system.name(), "submission accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::ovf::{FieldFile, OvfFile};
    use crate::core::models::system::System;
    use crate::engine::provenance::{DriveRecord, INFO_FILE};
    use crate::examples::macrospin;
    use std::io::Write;

    /// Reference driver: its "solver" reads a factor from the input file,
    /// scales the magnetization by it and writes the result as `output.omf`,
    /// mirroring an external package's observable behaviour.
    struct ScaleDriver;

    impl ExternalDriver for ScaleDriver {
        fn name(&self) -> &'static str {
            "ScaleDriver"
        }

        fn check_system(&self, system: &System) -> Result<(), DriveError> {
            system
                .m()
                .map(|_| ())
                .ok_or(DriveError::Model(crate::core::error::ModelError::MissingParameter("m")))
        }

        fn write_input_files(
            &self,
            system: &System,
            _options: &DriveOptions,
            workdir: &Path,
        ) -> Result<(), DriveError> {
            let mut file = fs::File::create(workdir.join(format!("{}.input", system.name())))?;
            write!(file, "-1")?;
            Ok(())
        }

        fn invoke(
            &self,
            system: &System,
            workdir: &Path,
            options: &DriveOptions,
        ) -> Result<(), DriveError> {
            let input = fs::read_to_string(workdir.join(format!("{}.input", system.name())))?;
            let factor: f64 = input.trim().parse().expect("input file holds a factor");
            let m = system.m().expect("checked before invocation");
            OvfFile::write_to_path(
                &m.scaled(factor),
                options.ovf_format,
                workdir.join("output.omf"),
            )?;
            Ok(())
        }

        fn schedule_commands(&self, _system: &System, _workdir: &Path) -> Vec<String> {
            // Comment lines keep the generated script inert under any shell.
            vec!["# run command line".to_string()]
        }

        fn read_results(&self, system: &mut System, workdir: &Path) -> Result<(), DriveError> {
            let m = OvfFile::read_from_path(workdir.join("output.omf"))?;
            system.set_m(m);
            Ok(())
        }
    }

    /// A driver whose external process always fails.
    struct FailingDriver;

    impl ExternalDriver for FailingDriver {
        fn name(&self) -> &'static str {
            "FailingDriver"
        }

        fn check_system(&self, _system: &System) -> Result<(), DriveError> {
            Ok(())
        }

        fn write_input_files(
            &self,
            _system: &System,
            _options: &DriveOptions,
            _workdir: &Path,
        ) -> Result<(), DriveError> {
            Ok(())
        }

        fn invoke(
            &self,
            _system: &System,
            workdir: &Path,
            _options: &DriveOptions,
        ) -> Result<(), DriveError> {
            use crate::engine::runner::{CallOptions, CommandRunner, ExternalRunner};
            let runner = CommandRunner::new("false");
            runner.call("", workdir, &CallOptions::default())?;
            Ok(())
        }

        fn schedule_commands(&self, _system: &System, _workdir: &Path) -> Vec<String> {
            vec!["# never run".to_string()]
        }

        fn read_results(&self, _system: &mut System, _workdir: &Path) -> Result<(), DriveError> {
            Ok(())
        }
    }

    #[test]
    fn mode_prefixes_name_directories() {
        assert_eq!(Mode::Drive.prefix(), "drive");
        assert_eq!(Mode::Compute.prefix(), "compute");
    }

    #[test]
    fn allocation_numbers_directories_from_zero() {
        let base = tempfile::tempdir().unwrap();
        let first = allocate_working_directory(base.path(), "sys", Mode::Drive, true).unwrap();
        assert_eq!(first, base.path().join("sys").join("drive-0"));
        let second = allocate_working_directory(base.path(), "sys", Mode::Drive, true).unwrap();
        assert_eq!(second, base.path().join("sys").join("drive-1"));
    }

    #[test]
    fn allocation_takes_max_plus_one_over_gaps() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir_all(base.path().join("sys").join("drive-4")).unwrap();
        let next = allocate_working_directory(base.path(), "sys", Mode::Drive, true).unwrap();
        assert_eq!(next, base.path().join("sys").join("drive-5"));
    }

    #[test]
    fn drive_and_compute_directories_are_numbered_independently() {
        let base = tempfile::tempdir().unwrap();
        allocate_working_directory(base.path(), "sys", Mode::Drive, true).unwrap();
        let compute = allocate_working_directory(base.path(), "sys", Mode::Compute, true).unwrap();
        assert_eq!(compute, base.path().join("sys").join("compute-0"));
    }

    #[test]
    fn compute_allocation_advances_the_compute_counter() {
        let base = tempfile::tempdir().unwrap();
        let mut system = macrospin();
        let first = allocate_compute_directory(base.path(), &mut system, true).unwrap();
        assert_eq!(first, base.path().join("macrospin").join("compute-0"));
        assert_eq!(system.compute_number(), 1);
        assert_eq!(system.drive_number(), 0);
    }

    #[test]
    fn drive_runs_the_full_lifecycle() {
        let base = tempfile::tempdir().unwrap();
        let mut system = macrospin();
        let original_m = system.m().unwrap().clone();
        let options = DriveOptions {
            dirname: base.path().to_path_buf(),
            verbosity: Verbosity::Quiet,
            ..DriveOptions::default()
        };
        ScaleDriver.drive(&mut system, options.clone()).unwrap();

        let workdir = base.path().join("macrospin").join("drive-0");
        assert!(workdir.join("macrospin.input").exists());
        assert!(workdir.join("output.omf").exists());
        assert!(workdir.join(INFO_FILE).exists());
        assert_eq!(system.drive_number(), 1);
        assert!(system.m().unwrap().allclose(&original_m.scaled(-1.0), 1e-9));

        let record = DriveRecord::read(&workdir).unwrap();
        assert_eq!(record.drive_number, 0);
        assert_eq!(record.adapter, "micromag");
        assert_eq!(record.driver, "ScaleDriver");
        assert_eq!(record.success, Some(true));
        assert!(record.elapsed_time.is_some());

        ScaleDriver.drive(&mut system, options).unwrap();
        assert!(base.path().join("macrospin").join("drive-1").exists());
        assert_eq!(system.drive_number(), 2);
    }

    #[test]
    fn drive_without_append_fails_on_existing_directory() {
        let base = tempfile::tempdir().unwrap();
        let mut system = macrospin();
        let options = DriveOptions {
            dirname: base.path().to_path_buf(),
            verbosity: Verbosity::Quiet,
            ..DriveOptions::default()
        };
        ScaleDriver.drive(&mut system, options.clone()).unwrap();

        let err = ScaleDriver
            .drive(
                &mut system,
                DriveOptions {
                    append: false,
                    ..options
                },
            )
            .unwrap_err();
        assert!(matches!(err, DriveError::SystemDirectoryExists(_)));
        // The failed call must not leave a new directory behind.
        let drives = fs::read_dir(base.path().join("macrospin")).unwrap().count();
        assert_eq!(drives, 1);
        assert_eq!(system.drive_number(), 1);
    }

    #[test]
    fn failed_drive_marks_provenance_and_consumes_a_slot() {
        let base = tempfile::tempdir().unwrap();
        let mut system = macrospin();
        let options = DriveOptions {
            dirname: base.path().to_path_buf(),
            verbosity: Verbosity::Quiet,
            ..DriveOptions::default()
        };
        let err = FailingDriver.drive(&mut system, options).unwrap_err();
        assert!(matches!(err, DriveError::Runner(_)));

        let workdir = base.path().join("macrospin").join("drive-0");
        let record = DriveRecord::read(&workdir).unwrap();
        assert_eq!(record.success, Some(false));
        assert_eq!(system.drive_number(), 1);
    }

    #[test]
    fn schedule_writes_script_and_submits() {
        let base = tempfile::tempdir().unwrap();
        let mut system = macrospin();
        let options = ScheduleOptions {
            dirname: base.path().to_path_buf(),
            ..ScheduleOptions::default()
        };
        // `sh` runs the generated script; it contains only comments, so the
        // submission succeeds without a real scheduler.
        ScaleDriver
            .schedule(&mut system, "sh", "# Schedule header".into(), options)
            .unwrap();

        let workdir = base.path().join("macrospin").join("drive-0");
        assert!(workdir.join("macrospin.input").exists());
        assert!(workdir.join(INFO_FILE).exists());
        let script = fs::read_to_string(workdir.join("job.sh")).unwrap();
        assert_eq!(script, "# Schedule header\n\n# run command line\n");
        assert_eq!(system.drive_number(), 1);

        // Submission succeeded but completion is unobserved.
        let record = DriveRecord::read(&workdir).unwrap();
        assert_eq!(record.success, None);
        assert_eq!(record.options["cmd"], serde_json::json!("sh"));
    }

    #[test]
    fn schedule_header_can_come_from_a_file() {
        let base = tempfile::tempdir().unwrap();
        let header_path = base.path().join("header.sh");
        fs::write(&header_path, "# from file\n").unwrap();
        let mut system = macrospin();
        let options = ScheduleOptions {
            dirname: base.path().to_path_buf(),
            ..ScheduleOptions::default()
        };
        ScaleDriver
            .schedule(&mut system, "sh", ScheduleHeader::File(header_path), options)
            .unwrap();
        let script = fs::read_to_string(
            base.path().join("macrospin").join("drive-0").join("job.sh"),
        )
        .unwrap();
        assert!(script.starts_with("# from file\n\n"));
    }

    #[test]
    fn failing_submission_embeds_the_command_line() {
        let base = tempfile::tempdir().unwrap();
        let mut system = macrospin();
        let options = ScheduleOptions {
            dirname: base.path().to_path_buf(),
            ..ScheduleOptions::default()
        };
        let err = ScaleDriver
            .schedule(&mut system, "false", "# header".into(), options)
            .unwrap_err();
        assert!(matches!(err, DriveError::SubmissionFailed { .. }));
        assert!(err.to_string().contains("false job.sh"));

        let workdir = base.path().join("macrospin").join("drive-0");
        let record = DriveRecord::read(&workdir).unwrap();
        assert_eq!(record.success, Some(false));
        assert_eq!(system.drive_number(), 1);
    }
}
