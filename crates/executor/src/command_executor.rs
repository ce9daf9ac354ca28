use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, ChildStdout, Command};

const READ_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("empty command")]
    EmptyCommand,

    #[error("command must start with '{expected}', got '{found}'")]
    InvalidCommandPrefix { expected: String, found: String },

    #[error("failed to start '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture output of '{program}': {source}")]
    CaptureFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{program}' failed: {status}\nOutput: {output}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        output: String,
    },

    #[error("command '{program}' timed out after {after:?}")]
    Timeout { program: String, after: Duration },
}

impl ExecutorError {
    /// Output captured before the failure, if the process got that far.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            ExecutorError::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// A command line split into program and verbatim arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Split `raw` on whitespace. The first token is the program.
    pub fn parse(raw: &str) -> Result<Self, ExecutorError> {
        let mut tokens = raw.split_whitespace().map(str::to_string);
        let program = tokens.next().ok_or(ExecutorError::EmptyCommand)?;

        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external programs and captures stdout and stderr as one blob.
///
/// Without a timeout a command may run forever and the caller waits for it.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    required_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept command lines whose first token equals `prefix`.
    pub fn with_required_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.required_prefix = Some(prefix.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn required_prefix(&self) -> Option<&str> {
        self.required_prefix.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Parse and validate `raw` without running anything.
    pub fn prepare(&self, raw: &str) -> Result<CommandLine, ExecutorError> {
        let line = CommandLine::parse(raw)?;

        if let Some(expected) = &self.required_prefix {
            if &line.program != expected {
                return Err(ExecutorError::InvalidCommandPrefix {
                    expected: expected.clone(),
                    found: line.program,
                });
            }
        }

        Ok(line)
    }

    /// Run `raw` and return the combined output on a zero exit status.
    pub async fn execute(&self, raw: &str) -> Result<String, ExecutorError> {
        let line = self.prepare(raw)?;
        tracing::info!("Executing command: {}", line);

        let mut child = Command::new(&line.program)
            .args(&line.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::SpawnFailed {
                program: line.program.clone(),
                source,
            })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                return Err(ExecutorError::CaptureFailed {
                    program: line.program,
                    source: std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "child output pipes unavailable",
                    ),
                })
            }
        };

        let run = async {
            let output = collect_combined(stdout, stderr).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, output))
        };

        let outcome = match self.timeout {
            Some(after) => match tokio::time::timeout(after, run).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!("Command timed out after {:?}: {}", after, line);
                    // The child is killed when dropped.
                    return Err(ExecutorError::Timeout {
                        program: line.program,
                        after,
                    });
                }
            },
            None => run.await,
        };

        let (status, output) = outcome.map_err(|source| ExecutorError::CaptureFailed {
            program: line.program.clone(),
            source,
        })?;

        let output = String::from_utf8_lossy(&output).into_owned();

        if status.success() {
            Ok(output)
        } else {
            tracing::debug!("Command exited with {}: {}", status, line);
            Err(ExecutorError::CommandFailed {
                program: line.program,
                status,
                output,
            })
        }
    }
}

/// Drain both pipes, appending chunks in the order they arrive.
async fn collect_combined(
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
) -> std::io::Result<Vec<u8>> {
    let mut combined = Vec::new();
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                let n = read?;
                if n == 0 {
                    out_open = false;
                } else {
                    combined.extend_from_slice(&out_buf[..n]);
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                let n = read?;
                if n == 0 {
                    err_open = false;
                } else {
                    combined.extend_from_slice(&err_buf[..n]);
                }
            }
        }
    }

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_splits_on_whitespace() {
        let line = CommandLine::parse("  gcloud   compute\tinstances list ").unwrap();
        assert_eq!(line.program, "gcloud");
        assert_eq!(line.args, vec!["compute", "instances", "list"]);
        assert_eq!(line.to_string(), "gcloud compute instances list");
    }

    #[test]
    fn test_parse_does_not_honour_quotes() {
        let line = CommandLine::parse("echo 'hello world'").unwrap();
        assert_eq!(line.args, vec!["'hello", "world'"]);
    }

    #[tokio::test]
    async fn test_empty_command() {
        let executor = CommandExecutor::new();
        let result = executor.execute("").await;
        assert!(matches!(result, Err(ExecutorError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_empty_command_with_prefix() {
        let executor = CommandExecutor::new().with_required_prefix("gcloud");
        let result = executor.execute("   ").await;
        assert!(matches!(result, Err(ExecutorError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_invalid_prefix() {
        let executor = CommandExecutor::new().with_required_prefix("gcloud");
        match executor.execute("notgcloud foo").await {
            Err(ExecutorError::InvalidCommandPrefix { expected, found }) => {
                assert_eq!(expected, "gcloud");
                assert_eq!(found, "notgcloud");
            }
            other => panic!("Expected InvalidCommandPrefix, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconstrained_runs_first_token_as_program() {
        let executor = CommandExecutor::new();
        match executor.execute("notgcloud foo").await {
            Err(ExecutorError::SpawnFailed { program, source }) => {
                assert_eq!(program, "notgcloud");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Expected SpawnFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_output() {
        let executor = CommandExecutor::new();
        let output = executor.execute("echo hello").await.unwrap();
        assert_eq!(output, "hello\n");
    }

    #[tokio::test]
    async fn test_quotes_are_passed_verbatim() {
        let executor = CommandExecutor::new();
        let output = executor.execute("echo 'a   b'").await.unwrap();
        assert_eq!(output, "'a b'\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_output() {
        let executor = CommandExecutor::new();
        let err = executor
            .execute("ls /definitely/not/a/real/path")
            .await
            .unwrap_err();

        match &err {
            ExecutorError::CommandFailed { program, status, output } => {
                assert_eq!(program, "ls");
                assert!(!status.success());
                assert!(output.contains("/definitely/not/a/real/path"));
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
        assert!(err.captured_output().is_some());
        assert!(err.to_string().contains("Output:"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let executor = CommandExecutor::new().with_timeout(Some(Duration::from_millis(100)));
        let result = executor.execute("sleep 5").await;
        assert!(matches!(result, Err(ExecutorError::Timeout { .. })));
    }

    proptest! {
        #[test]
        fn prop_whitespace_only_is_empty(raw in "[ \t\n\r]*") {
            prop_assert!(matches!(CommandLine::parse(&raw), Err(ExecutorError::EmptyCommand)));
        }

        #[test]
        fn prop_tokens_survive_parsing(tokens in prop::collection::vec("[a-zA-Z0-9_./=-]{1,12}", 1..6)) {
            let raw = tokens.join("  ");
            let line = CommandLine::parse(&raw).unwrap();
            prop_assert_eq!(&line.program, &tokens[0]);
            prop_assert_eq!(&line.args[..], &tokens[1..]);
        }
    }
}
