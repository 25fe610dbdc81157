//! Blaming files through `lscm annotate`.
//!
//! For every file: run the command, decide from the exit code whether the
//! file is tracked, parse what it printed, patch up the missing last line,
//! and hand the result to a [`BlameOutput`]. A file that fails is reported
//! and the batch moves on.

use std::path::Path;

use tracing::{debug, error, warn};

use crate::config::BlameConfig;
use crate::error::{BlameError, Result};
use crate::models::{BlameLine, BlameResponse};
use crate::scm::command::{needs_new_shell, CommandExecutor, CommandLine, InvocationOutcome, ProcessExecutor};
use crate::scm::consumer::{AnnotateFormat, BlameConsumer};
use crate::scm::exit_code::ExitClass;
use crate::scm::input::{BlameInput, InputFile};

const NOT_LOGGED_IN_HINT: &str = ". Please check if you are logged in or provide username and password";

/// Receives finished blame results, one call per file.
pub trait BlameOutput {
    fn blame_result(&mut self, file: &InputFile, lines: Vec<BlameLine>);
}

impl BlameOutput for Vec<BlameResponse> {
    fn blame_result(&mut self, file: &InputFile, lines: Vec<BlameLine>) {
        self.push(BlameResponse {
            path: file.path.clone(),
            lines,
        });
    }
}

/// What annotate had to say about a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBlame {
    Blamed(Vec<BlameLine>),
    Untracked { exit_code: i32 },
}

#[derive(Debug)]
pub enum FileOutcome {
    Blamed { lines: usize },
    Skipped { exit_code: i32 },
    Failed(BlameError),
}

/// Per-file outcomes of one batch, in input order.
#[derive(Debug, Default)]
pub struct BlameReport {
    pub files: Vec<(String, FileOutcome)>,
}

impl BlameReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &BlameError)> {
        self.files.iter().filter_map(|(path, outcome)| match outcome {
            FileOutcome::Failed(e) => Some((path.as_str(), e)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

pub struct BlameCommand<E = ProcessExecutor> {
    executor: E,
    config: BlameConfig,
    format: AnnotateFormat,
    new_shell: bool,
}

impl BlameCommand<ProcessExecutor> {
    pub fn new(config: BlameConfig) -> Self {
        Self::with_executor(ProcessExecutor, config)
    }
}

impl<E: CommandExecutor> BlameCommand<E> {
    pub fn with_executor(executor: E, config: BlameConfig) -> Self {
        Self {
            executor,
            config,
            format: AnnotateFormat::default(),
            new_shell: needs_new_shell(),
        }
    }

    pub fn with_format(mut self, format: AnnotateFormat) -> Self {
        self.format = format;
        self
    }

    /// Override the platform default for launching through `cmd /C`.
    pub fn with_new_shell(mut self, new_shell: bool) -> Self {
        self.new_shell = new_shell;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Blames every file in `input`, sending each result to `output`.
    pub async fn blame(&self, input: &BlameInput, output: &mut impl BlameOutput) -> BlameReport {
        debug!(base_dir = %input.base_dir.display(), files = input.files.len(), "Working directory");

        let mut report = BlameReport::default();
        for file in &input.files {
            let outcome = match self.blame_file(&input.base_dir, file).await {
                Ok(FileBlame::Blamed(lines)) => {
                    let count = lines.len();
                    output.blame_result(file, lines);
                    FileOutcome::Blamed { lines: count }
                }
                Ok(FileBlame::Untracked { exit_code }) => FileOutcome::Skipped { exit_code },
                Err(e) => {
                    error!(file = %file.path, error = %e, "Blame failed");
                    FileOutcome::Failed(e)
                }
            };
            report.files.push((file.path.clone(), outcome));
        }
        report
    }

    pub async fn blame_file(&self, base_dir: &Path, file: &InputFile) -> Result<FileBlame> {
        let cl = CommandLine::annotate(&self.config, base_dir, &file.path, self.new_shell);
        let mut consumer = BlameConsumer::new(&file.path, &self.format);
        let mut parse_error: Option<BlameError> = None;

        // Keep reading after a parse error so the exit code still decides
        // whether the file was tracked at all.
        let outcome = self
            .executor
            .execute(
                &cl,
                &mut |line: &str| {
                    if parse_error.is_none() {
                        if let Err(e) = consumer.consume_line(line) {
                            parse_error = Some(e);
                        }
                    }
                },
                self.config.command_timeout,
            )
            .await?;

        let (exit_code, stderr) = match outcome {
            InvocationOutcome::Exited { code, stderr } => (code, stderr),
            InvocationOutcome::TimedOut => {
                let hint = if self.config.has_credentials() { "" } else { NOT_LOGGED_IN_HINT };
                return Err(BlameError::TimedOut {
                    command: cl.to_string(),
                    hint,
                });
            }
        };

        match ExitClass::classify(exit_code) {
            ExitClass::Success => {}
            ExitClass::SkipUntracked => {
                debug!(file = %file.path, exit_code, "Skipping untracked file");
                return Ok(FileBlame::Untracked { exit_code });
            }
            ExitClass::Failure => {
                return Err(BlameError::CommandFailed {
                    command: cl.to_string(),
                    stderr,
                });
            }
        }

        if let Some(e) = parse_error {
            return Err(e);
        }

        let lines = add_missing_last_line(&file.path, consumer.into_lines(), file.lines);
        Ok(FileBlame::Blamed(lines))
    }
}

/// `lscm` prints nothing for a file's trailing empty line. When exactly one
/// line is missing, the last record is repeated for it.
pub fn add_missing_last_line(file: &str, mut lines: Vec<BlameLine>, declared: usize) -> Vec<BlameLine> {
    let reported = lines.len();
    if reported + 1 == declared {
        if let Some(last) = lines.last() {
            let extra = last.at_line(declared as u32);
            lines.push(extra);
        }
    } else if reported != declared {
        warn!(
            file,
            declared,
            reported,
            "Line count mismatch, annotate output passed through uncorrected"
        );
    }
    lines
}
