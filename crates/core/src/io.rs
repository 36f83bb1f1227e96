//! IO management
//!
//! Commands never touch the process streams directly. They go through an
//! [`IoManager`], which owns stdout, stderr, stdin and the debug sink, and
//! which carries the subprocess primitive picked at startup. Tests swap the
//! streams for in-memory buffers.

use std::io::{self, Read, Write};
use std::process::{Output, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;
type SharedReader = Arc<Mutex<Box<dyn Read + Send>>>;

/// Who is emitting a diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitScope {
    /// The front controller and its collaborators
    Controller,
    /// The dispatched command
    Command,
}

/// How subprocesses are run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawner {
    /// Through the async runtime
    Cooperative,
    /// Through a plain blocking call
    Blocking,
}

impl Spawner {
    /// Run `command_line`, feeding it `input` and collecting its stdout
    ///
    /// The command line is split with shell quoting rules but is not run
    /// through a shell.
    pub async fn pipe(self, command_line: &str, input: Vec<u8>) -> Result<Output> {
        let argv = shlex::split(command_line)
            .filter(|argv| !argv.is_empty())
            .ok_or_else(|| Error::command(format!("Invalid pipe command: {command_line:?}")))?;
        tracing::debug!(?argv, spawner = ?self, "spawning subprocess");

        match self {
            Spawner::Cooperative => {
                use tokio::io::AsyncWriteExt;

                let mut child = tokio::process::Command::new(&argv[0])
                    .args(&argv[1..])
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()?;
                let mut stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| Error::General("subprocess stdin unavailable".into()))?;
                let feed = async move {
                    let fed = match stdin.write_all(&input).await {
                        Ok(()) => stdin.shutdown().await,
                        Err(e) => Err(e),
                    };
                    ignore_broken_pipe(fed)
                };
                let ((), output) = tokio::try_join!(feed, child.wait_with_output())?;
                Ok(output)
            }
            Spawner::Blocking => {
                let mut child = std::process::Command::new(&argv[0])
                    .args(&argv[1..])
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()?;
                let mut stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| Error::General("subprocess stdin unavailable".into()))?;
                let feeder =
                    std::thread::spawn(move || ignore_broken_pipe(stdin.write_all(&input)));
                let output = child.wait_with_output()?;
                feeder
                    .join()
                    .map_err(|_| Error::General("subprocess feeder panicked".into()))??;
                Ok(output)
            }
        }
    }
}

/// A child may exit without reading all of its input
fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Owner of the streams a command may use
#[derive(Clone)]
pub struct IoManager {
    stdout: SharedWriter,
    stderr: SharedWriter,
    stdin: SharedReader,
    command_debug: Option<SharedWriter>,
    spawner: Spawner,
}

impl IoManager {
    /// IO manager bound to the process streams
    pub fn standard() -> Self {
        Self {
            stdout: shared_writer(io::stdout()),
            stderr: shared_writer(io::stderr()),
            stdin: Arc::new(Mutex::new(Box::new(io::stdin()))),
            command_debug: None,
            spawner: Spawner::Blocking,
        }
    }

    /// IO manager writing into in-memory buffers, with empty stdin
    pub fn captured() -> (Self, Captured) {
        let captured = Captured::default();
        let io = Self {
            stdout: shared_writer(captured.stdout.clone()),
            stderr: shared_writer(captured.stderr.clone()),
            stdin: Arc::new(Mutex::new(Box::new(io::empty()))),
            command_debug: None,
            spawner: Spawner::Blocking,
        };
        (io, captured)
    }

    /// Replace stdin with fixed bytes
    pub fn with_stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Arc::new(Mutex::new(Box::new(io::Cursor::new(data.into()))));
        self
    }

    /// Route command-scope debug lines to `writer` instead of stderr
    pub fn with_command_debug(mut self, writer: impl Write + Send + 'static) -> Self {
        self.command_debug = Some(shared_writer(writer));
        self
    }

    pub fn with_spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn spawner(&self) -> Spawner {
        self.spawner
    }

    /// Run `f` against stdout and flush afterwards
    pub fn with_stdout<R>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<R>) -> io::Result<R> {
        with_writer(&self.stdout, f)
    }

    /// Run `f` against stderr and flush afterwards
    pub fn with_stderr<R>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<R>) -> io::Result<R> {
        with_writer(&self.stderr, f)
    }

    /// Run `f` against the debug sink for `scope` and flush afterwards
    pub fn with_debug<R>(
        &self,
        scope: EmitScope,
        f: impl FnOnce(&mut dyn Write) -> io::Result<R>,
    ) -> io::Result<R> {
        match (scope, &self.command_debug) {
            (EmitScope::Command, Some(sink)) => with_writer(sink, f),
            _ => with_writer(&self.stderr, f),
        }
    }

    /// Read all of stdin
    pub fn read_stdin(&self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        lock(&self.stdin).read_to_end(&mut data)?;
        Ok(data)
    }
}

fn shared_writer(writer: impl Write + Send + 'static) -> SharedWriter {
    Arc::new(Mutex::new(Box::new(writer)))
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_writer<R>(
    writer: &SharedWriter,
    f: impl FnOnce(&mut dyn Write) -> io::Result<R>,
) -> io::Result<R> {
    let mut guard = lock(writer);
    let result = f(&mut **guard)?;
    guard.flush()?;
    Ok(result)
}

/// In-memory buffer that can be shared between an [`IoManager`] and a test
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn bytes(&self) -> Vec<u8> {
        lock(&self.0).clone()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Buffers behind an [`IoManager::captured`] manager
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub stdout: SharedBuffer,
    pub stderr: SharedBuffer,
}

impl Captured {
    pub fn stdout(&self) -> String {
        self.stdout.contents()
    }

    pub fn stderr(&self) -> String {
        self.stderr.contents()
    }
}
