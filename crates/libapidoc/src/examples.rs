//! Execution of code examples embedded in docstrings.
//!
//! A docstring is split into prose and fenced code segments. All code
//! segments of one docstring run, in order, inside a single fresh interpreter
//! process, so later examples see names defined by earlier ones. Whatever a
//! segment prints is inserted after it as a plain fenced block.

use std::{
    io::{Read, Write},
    process::{Command, Stdio},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::{
    config::ExampleConfig,
    docstring::dedent,
    error::{ApiDocError, Result},
};

/// Line printed between segments to split interpreter output.
const SEGMENT_MARKER: &str = "__apidoc_example_boundary__";
/// Fence delimiting a code block.
const FENCE: &str = "```";
/// How often a running interpreter is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A piece of a docstring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text outside of executable code blocks, kept as written.
    Prose(String),
    /// The dedented body of an executable code block.
    Code(String),
}

/// Split `text` into prose and code segments.
///
/// A code block opens with three backticks followed by `language` and closes
/// at the next three backticks. An unterminated block is kept as prose.
pub fn split_segments(text: &str, language: &str) -> Vec<Segment> {
    let open = format!("{FENCE}{language}");
    let mut parts = text.split(open.as_str());
    let mut segments = vec![Segment::Prose(parts.next().unwrap_or_default().to_string())];

    for part in parts {
        match part.find(FENCE) {
            Some(end) => {
                let lines: Vec<&str> = part[..end].split('\n').collect();
                segments.push(Segment::Code(dedent(&lines)));
                segments.push(Segment::Prose(part[end + FENCE.len()..].to_string()));
            }
            None => segments.push(Segment::Prose(format!("{open}{part}"))),
        }
    }
    segments
}

/// Runs a docstring's code segments in one shared execution context.
pub trait ExampleRunner: Send + Sync {
    /// Execute `segments` in order, returning the captured output of each.
    fn run(&self, segments: &[String]) -> Result<Vec<String>>;
}

/// Runs examples in an interpreter subprocess.
///
/// Segments are written to a single script, each followed by a statement that
/// prints a marker line; the interpreter's output is split on those markers.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Interpreter command and settings.
    config: ExampleConfig,
}

impl ProcessRunner {
    /// Create a runner from the example settings.
    pub fn new(config: ExampleConfig) -> Self {
        Self { config }
    }

    /// Assemble the script executed by the interpreter.
    fn script(&self, segments: &[String]) -> String {
        let marker = self.config.marker_statement.replace("{marker}", SEGMENT_MARKER);
        let mut script = String::new();
        for segment in segments {
            script.push_str(segment);
            script.push('\n');
            script.push_str(&marker);
            script.push('\n');
        }
        script
    }
}

impl ExampleRunner for ProcessRunner {
    fn run(&self, segments: &[String]) -> Result<Vec<String>> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| ApiDocError::ExampleExecution {
                message: "no interpreter command configured".to_string(),
            })?;

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(self.script(segments).as_bytes())?;
        file.flush()?;

        debug!(program = %program, segments = segments.len(), "running examples");
        let mut child = Command::new(program)
            .args(args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ApiDocError::ExampleExecution {
                message: format!("failed to start {program}: {e}"),
            })?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= timeout {
                child.kill()?;
                child.wait()?;
                return Err(ApiDocError::ExampleTimeout {
                    seconds: self.config.timeout_secs,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = join_reader(stdout)?;
        let stderr = join_reader(stderr)?;
        if !status.success() {
            let detail = stderr.trim();
            return Err(ApiDocError::ExampleExecution {
                message: if detail.is_empty() {
                    format!("{program} exited with {status}")
                } else {
                    detail.to_string()
                },
            });
        }

        let outputs = split_on_marker(&stdout);
        if outputs.len() != segments.len() {
            return Err(ApiDocError::ExampleExecution {
                message: format!(
                    "expected output for {} examples, found {}",
                    segments.len(),
                    outputs.len()
                ),
            });
        }
        Ok(outputs)
    }
}

/// Reads a child pipe to completion on a background thread.
type Reader = thread::JoinHandle<std::io::Result<String>>;

/// Start draining `pipe` so the child never blocks on a full buffer.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut buffer)?;
        }
        Ok(buffer)
    })
}

/// Wait for a reader thread and return what it collected.
fn join_reader(reader: Reader) -> Result<String> {
    reader
        .join()
        .map_err(|_| ApiDocError::ExampleExecution {
            message: "output reader panicked".to_string(),
        })?
        .map_err(ApiDocError::from)
}

/// Split interpreter output into per-segment chunks at marker lines.
///
/// Output without a trailing newline leaves the marker at the end of its last
/// line, so anything before the marker on that line belongs to the segment.
fn split_on_marker(stdout: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in stdout.split_inclusive('\n') {
        match line.trim_end().strip_suffix(SEGMENT_MARKER) {
            Some(head) => {
                current.push_str(head);
                chunks.push(std::mem::take(&mut current));
            }
            None => current.push_str(line),
        }
    }
    chunks
}

/// Expands docstrings by executing their code examples.
#[derive(Clone)]
pub struct ExampleExecutor {
    /// Fence language tag of executable blocks.
    language: String,
    /// Executes the collected segments.
    runner: Arc<dyn ExampleRunner>,
}

impl std::fmt::Debug for ExampleExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExampleExecutor")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl ExampleExecutor {
    /// An executor running examples in the configured interpreter.
    pub fn new(config: &ExampleConfig) -> Self {
        Self {
            language: config.language.clone(),
            runner: Arc::new(ProcessRunner::new(config.clone())),
        }
    }

    /// An executor using a custom runner.
    pub fn with_runner(language: impl Into<String>, runner: Arc<dyn ExampleRunner>) -> Self {
        Self {
            language: language.into(),
            runner,
        }
    }

    /// Execute every example in `docstring` and splice in its output.
    ///
    /// Any failing example fails the whole expansion.
    pub fn expand(&self, docstring: &str) -> Result<String> {
        let segments = split_segments(docstring, &self.language);
        let code: Vec<String> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Code(code) => Some(code.clone()),
                Segment::Prose(_) => None,
            })
            .collect();
        if code.is_empty() {
            return Ok(docstring.to_string());
        }

        let mut outputs = self.runner.run(&code)?.into_iter();
        let mut expanded = String::new();
        for segment in segments {
            match segment {
                Segment::Prose(text) => expanded.push_str(&text),
                Segment::Code(code) => {
                    expanded.push_str(FENCE);
                    expanded.push_str(&self.language);
                    expanded.push_str(&code);
                    expanded.push_str(FENCE);
                    expanded.push('\n');
                    let output = outputs.next().unwrap_or_default();
                    if !output.is_empty() {
                        expanded.push_str(FENCE);
                        expanded.push('\n');
                        expanded.push_str(&output);
                        if !output.ends_with('\n') {
                            expanded.push('\n');
                        }
                        expanded.push_str(FENCE);
                    }
                }
            }
        }
        Ok(expanded)
    }
}
