//! Worker invocation channel.
//!
//! Every call starts one worker process, collects its stdout and stderr, and
//! turns the outcome into either the stdout text or a [`WorkerError`]. There
//! is no pool and no retry. Timeouts and concurrency caps are opt-in
//! decorators ([`TimeoutWorker`], [`LimitedWorker`]) assembled by
//! [`WorkerPolicy`].

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use uuid::Uuid;

use pensionbot_core::config::{DirectWorkerConfig, WorkerConfig};

use crate::error::WorkerError;

// =============================================================================
// Trait
// =============================================================================

/// Capability to run the external worker once with positional arguments.
#[async_trait]
pub trait WorkerInvoker: Send + Sync {
    /// Run the worker with `arguments` and return its standard output.
    async fn invoke(&self, arguments: &[String]) -> Result<String, WorkerError>;
}

// =============================================================================
// Invocation record
// =============================================================================

/// Everything collected from one finished worker process.
#[derive(Debug, Clone)]
pub struct WorkerInvocation {
    pub arguments: Vec<String>,
    pub collected_output: Vec<u8>,
    pub collected_error: Vec<u8>,
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_status: Option<i32>,
}

impl WorkerInvocation {
    /// Whether the process exited cleanly and stayed silent on stderr.
    pub fn succeeded(&self) -> bool {
        self.exit_status == Some(0) && self.collected_error.is_empty()
    }

    /// Apply the success rule and hand back stdout, or the failure detail.
    pub fn into_result(self) -> Result<String, WorkerError> {
        if self.succeeded() {
            return Ok(String::from_utf8_lossy(&self.collected_output).into_owned());
        }

        let mut detail = String::from_utf8_lossy(&self.collected_error).into_owned();
        if detail.is_empty() {
            detail = match self.exit_status {
                Some(code) => format!("worker exited with status {}", code),
                None => "worker terminated by signal".to_string(),
            };
        }
        Err(WorkerError::Failed {
            status: self.exit_status,
            detail,
        })
    }
}

// =============================================================================
// Process-backed worker
// =============================================================================

/// Command line used to launch the worker: `program args... <call arguments>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl From<&WorkerConfig> for WorkerCommand {
    fn from(config: &WorkerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl From<&DirectWorkerConfig> for WorkerCommand {
    fn from(config: &DirectWorkerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

/// Spawns one OS process per invocation.
pub struct ProcessWorker {
    command: WorkerCommand,
}

impl ProcessWorker {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Run the process to completion and collect both output streams.
    pub async fn run(&self, arguments: &[String]) -> Result<WorkerInvocation, WorkerError> {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .args(arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // An abandoned call (e.g. a timeout) must not leave the child running.
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| WorkerError::Spawn(format!("{}: {}", self.command.program, e)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| WorkerError::Io(e.to_string()))?;

        Ok(WorkerInvocation {
            arguments: arguments.to_vec(),
            collected_output: output.stdout,
            collected_error: output.stderr,
            exit_status: output.status.code(),
        })
    }
}

#[async_trait]
impl WorkerInvoker for ProcessWorker {
    async fn invoke(&self, arguments: &[String]) -> Result<String, WorkerError> {
        let invocation_id = Uuid::new_v4();
        let started = Instant::now();
        debug!(%invocation_id, args = arguments.len(), program = %self.command.program, "Starting worker");

        let invocation = match self.run(arguments).await {
            Ok(inv) => inv,
            Err(e) => {
                warn!(%invocation_id, error = %e, "Worker could not be run");
                return Err(e);
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !invocation.collected_error.is_empty() {
            warn!(
                %invocation_id,
                stderr = %String::from_utf8_lossy(&invocation.collected_error),
                "Worker wrote to stderr"
            );
        }
        debug!(
            %invocation_id,
            exit_status = ?invocation.exit_status,
            stdout_bytes = invocation.collected_output.len(),
            elapsed_ms,
            "Worker finished"
        );

        invocation.into_result()
    }
}

// =============================================================================
// Optional policies
// =============================================================================

/// Fails an invocation that runs longer than `limit`.
///
/// Dropping the inner future kills a [`ProcessWorker`] child.
pub struct TimeoutWorker {
    inner: Arc<dyn WorkerInvoker>,
    limit: Duration,
}

impl TimeoutWorker {
    pub fn new(inner: Arc<dyn WorkerInvoker>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl WorkerInvoker for TimeoutWorker {
    async fn invoke(&self, arguments: &[String]) -> Result<String, WorkerError> {
        match tokio::time::timeout(self.limit, self.inner.invoke(arguments)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(limit_ms = self.limit.as_millis() as u64, "Worker invocation timed out");
                Err(WorkerError::Timeout(self.limit))
            }
        }
    }
}

/// Caps how many invocations run at once. Callers beyond the cap wait.
pub struct LimitedWorker {
    inner: Arc<dyn WorkerInvoker>,
    permits: Semaphore,
}

impl LimitedWorker {
    /// A cap of zero is raised to one.
    pub fn new(inner: Arc<dyn WorkerInvoker>, max_concurrent: usize) -> Self {
        if max_concurrent == 0 {
            warn!("Worker concurrency cap of 0 raised to 1");
        }
        Self {
            inner,
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }
}

#[async_trait]
impl WorkerInvoker for LimitedWorker {
    async fn invoke(&self, arguments: &[String]) -> Result<String, WorkerError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| WorkerError::Io("worker limiter closed".to_string()))?;
        self.inner.invoke(arguments).await
    }
}

/// Which optional policies wrap the base worker. Both are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPolicy {
    pub timeout: Option<Duration>,
    pub max_concurrent: Option<usize>,
}

impl WorkerPolicy {
    /// Wrap `worker` in the configured policies.
    ///
    /// The limiter sits outside the timeout so that time spent queueing for a
    /// permit does not count against the invocation.
    pub fn apply(self, worker: Arc<dyn WorkerInvoker>) -> Arc<dyn WorkerInvoker> {
        let mut worker = worker;
        if let Some(limit) = self.timeout {
            worker = Arc::new(TimeoutWorker::new(worker, limit));
        }
        if let Some(max) = self.max_concurrent {
            worker = Arc::new(LimitedWorker::new(worker, max));
        }
        worker
    }
}

impl From<&WorkerConfig> for WorkerPolicy {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
            max_concurrent: config.max_concurrent,
        }
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

type Responder = dyn Fn(&[String]) -> Result<String, WorkerError> + Send + Sync;

/// In-memory worker that answers from a closure and records every call.
///
/// Used by tests and local development without a worker script installed.
pub struct MockWorker {
    responder: Box<Responder>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockWorker {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[String]) -> Result<String, WorkerError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A worker that prints `output` for every call.
    pub fn replying(output: &str) -> Self {
        let output = output.to_string();
        Self::new(move |_| Ok(output.clone()))
    }

    /// A worker that fails every call with `detail` on stderr.
    pub fn failing(detail: &str) -> Self {
        let detail = detail.to_string();
        Self::new(move |_| {
            Err(WorkerError::Failed {
                status: Some(1),
                detail: detail.clone(),
            })
        })
    }

    /// Arguments of every call so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl WorkerInvoker for MockWorker {
    async fn invoke(&self, arguments: &[String]) -> Result<String, WorkerError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(arguments.to_vec());
        }
        (self.responder)(arguments)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn invocation(status: Option<i32>, stdout: &str, stderr: &str) -> WorkerInvocation {
        WorkerInvocation {
            arguments: vec![],
            collected_output: stdout.as_bytes().to_vec(),
            collected_error: stderr.as_bytes().to_vec(),
            exit_status: status,
        }
    }

    // ---- Success rule ----

    #[test]
    fn test_clean_exit_returns_stdout() {
        let result = invocation(Some(0), "{\"ok\":true}\n", "").into_result();
        assert_eq!(result.unwrap(), "{\"ok\":true}\n");
    }

    #[test]
    fn test_nonzero_exit_returns_stderr() {
        let err = invocation(Some(1), "", "Traceback...").into_result().unwrap_err();
        match err {
            WorkerError::Failed { status, detail } => {
                assert_eq!(status, Some(1));
                assert_eq!(detail, "Traceback...");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_stderr_output_fails_even_on_clean_exit() {
        let err = invocation(Some(0), "[]", "DeprecationWarning").into_result().unwrap_err();
        assert_eq!(err.to_string(), "DeprecationWarning");
    }

    #[test]
    fn test_silent_failure_reports_exit_code() {
        let err = invocation(Some(3), "partial", "").into_result().unwrap_err();
        assert_eq!(err.to_string(), "worker exited with status 3");
    }

    #[test]
    fn test_signal_termination_is_failure() {
        let inv = invocation(None, "", "");
        assert!(!inv.succeeded());
        let err = inv.into_result().unwrap_err();
        assert_eq!(err.to_string(), "worker terminated by signal");
    }

    #[test]
    fn test_invalid_utf8_output_is_lossy() {
        let inv = WorkerInvocation {
            arguments: vec![],
            collected_output: vec![b'o', b'k', 0xff],
            collected_error: vec![],
            exit_status: Some(0),
        };
        let out = inv.into_result().unwrap();
        assert!(out.starts_with("ok"));
    }

    // ---- Command construction ----

    #[test]
    fn test_command_from_worker_config() {
        let config = WorkerConfig::default();
        let cmd = WorkerCommand::from(&config);
        assert_eq!(cmd.program, "python");
        assert_eq!(cmd.args, vec!["python/groq_chatbot.py"]);
    }

    #[test]
    fn test_policy_from_worker_config() {
        let config = WorkerConfig {
            timeout_secs: Some(12),
            max_concurrent: Some(3),
            ..WorkerConfig::default()
        };
        let policy = WorkerPolicy::from(&config);
        assert_eq!(policy.timeout, Some(Duration::from_secs(12)));
        assert_eq!(policy.max_concurrent, Some(3));
        assert_eq!(WorkerPolicy::from(&WorkerConfig::default()), WorkerPolicy::default());
    }

    // ---- Real processes ----

    #[cfg(unix)]
    fn sh(script: &str) -> ProcessWorker {
        // `sh -c SCRIPT worker ARGS...` exposes ARGS as $1, $2, ...
        ProcessWorker::new(WorkerCommand::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "worker".to_string()],
        ))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_worker_passes_arguments_in_order() {
        let worker = sh(r#"printf '%s|%s' "$1" "$2""#);
        let out = worker.invoke(&args(&["How do I check my status?", "hi"])).await.unwrap();
        assert_eq!(out, "How do I check my status?|hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_worker_nonzero_exit() {
        let worker = sh("echo 'Traceback...' >&2; exit 1");
        let err = worker.invoke(&args(&["q"])).await.unwrap_err();
        match err {
            WorkerError::Failed { status, detail } => {
                assert_eq!(status, Some(1));
                assert_eq!(detail.trim(), "Traceback...");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_worker_stderr_with_clean_exit() {
        let worker = sh("echo '{}'; echo 'warning' >&2");
        assert!(worker.invoke(&[]).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_worker_records_invocation() {
        let worker = sh("echo out; exit 0");
        let inv = worker.run(&args(&["a", "b"])).await.unwrap();
        assert_eq!(inv.arguments, args(&["a", "b"]));
        assert_eq!(inv.collected_output, b"out\n");
        assert!(inv.collected_error.is_empty());
        assert_eq!(inv.exit_status, Some(0));
    }

    #[tokio::test]
    async fn test_process_worker_spawn_failure() {
        let worker = ProcessWorker::new(WorkerCommand::new(
            "/definitely/not/a/real/worker-binary",
            vec![],
        ));
        let err = worker.invoke(&args(&["q"])).await.unwrap_err();
        assert!(matches!(err, WorkerError::Spawn(_)));
        assert!(err.to_string().contains("worker-binary"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_policy_aborts_slow_worker() {
        let slow: Arc<dyn WorkerInvoker> = Arc::new(sh("sleep 5; echo late"));
        let worker = WorkerPolicy {
            timeout: Some(Duration::from_millis(100)),
            max_concurrent: None,
        }
        .apply(slow);

        let started = Instant::now();
        let err = worker.invoke(&[]).await.unwrap_err();
        assert!(matches!(err, WorkerError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    // ---- Policies with in-memory workers ----

    struct SlowCounter {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl WorkerInvoker for SlowCounter {
        async fn invoke(&self, _arguments: &[String]) -> Result<String, WorkerError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn test_limited_worker_caps_concurrency() {
        let counter = Arc::new(SlowCounter {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let worker: Arc<dyn WorkerInvoker> = Arc::new(LimitedWorker::new(counter.clone(), 2));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let w = Arc::clone(&worker);
            handles.push(tokio::spawn(async move { w.invoke(&[]).await }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), "done");
        }
        assert_eq!(counter.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_cap_still_serves_one_at_a_time() {
        let counter = Arc::new(SlowCounter {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let worker: Arc<dyn WorkerInvoker> = Arc::new(LimitedWorker::new(counter.clone(), 0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let w = Arc::clone(&worker);
            handles.push(tokio::spawn(async move { w.invoke(&[]).await }));
        }
        for h in handles {
            let result = tokio::time::timeout(Duration::from_secs(2), h)
                .await
                .expect("a zero cap must not block forever")
                .unwrap();
            assert_eq!(result.unwrap(), "done");
        }
        assert_eq!(counter.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_policy_leaves_concurrency_unbounded() {
        let counter = Arc::new(SlowCounter {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let worker = WorkerPolicy::default().apply(counter.clone());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let w = Arc::clone(&worker);
            handles.push(tokio::spawn(async move { w.invoke(&[]).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(counter.peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_mock_worker_records_calls() {
        let worker = MockWorker::replying("[]");
        worker.invoke(&args(&["--get-suggested-questions", "en"])).await.unwrap();
        worker.invoke(&args(&["hello"])).await.unwrap();
        assert_eq!(worker.call_count(), 2);
        assert_eq!(worker.calls()[0], args(&["--get-suggested-questions", "en"]));
    }

    #[tokio::test]
    async fn test_mock_worker_failing() {
        let worker = MockWorker::failing("boom");
        let err = worker.invoke(&[]).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
