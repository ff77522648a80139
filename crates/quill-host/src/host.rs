//! [`Host`] over standard streams.

use std::io::{self, BufRead, BufReader, Write};
use std::thread::{self, JoinHandle};

use quill_bridge::{EntryPoint, Host, HostError, KeeperHandle};
use tracing::{error, info};

use crate::protocol;

/// Serves the entry point on a single reader thread: requests come from
/// `input`, responses go to `output`, the readiness line goes to
/// `announce`. When `input` is exhausted the keeper is shut down.
pub struct StdioHost<R, W, A> {
    streams: Option<(R, W)>,
    announce: A,
    keeper: KeeperHandle,
    worker: Option<JoinHandle<()>>,
}

impl StdioHost<BufReader<io::Stdin>, io::Stdout, io::Stderr> {
    /// The process's real stdin, stdout and stderr.
    pub fn stdio(keeper: KeeperHandle) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout(), io::stderr(), keeper)
    }
}

impl<R, W, A> StdioHost<R, W, A>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    A: Write,
{
    pub fn new(input: R, output: W, announce: A, keeper: KeeperHandle) -> Self {
        Self {
            streams: Some((input, output)),
            announce,
            keeper,
            worker: None,
        }
    }

    /// Wait for the reader thread to finish.
    pub fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("reader thread panicked");
            }
        }
    }
}

impl<R, W, A> Host for StdioHost<R, W, A>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    A: Write,
{
    fn publish(&mut self, name: &str, entry: EntryPoint) -> Result<(), HostError> {
        let (input, output) = self
            .streams
            .take()
            .ok_or_else(|| HostError::new("stdio is already serving an entry point"))?;
        let keeper = self.keeper.clone();
        let worker = thread::Builder::new()
            .name(format!("{name}-reader"))
            .spawn(move || {
                match protocol::serve_lines(input, output, &entry) {
                    Ok(answered) => info!(answered, "input closed"),
                    Err(e) => error!(error = %e, "stdio failure"),
                }
                keeper.shutdown();
            })
            .map_err(|e| HostError::new(format!("cannot start reader thread: {e}")))?;
        self.worker = Some(worker);
        Ok(())
    }

    fn announce(&mut self, line: &str) {
        if let Err(e) = writeln!(self.announce, "{line}").and_then(|()| self.announce.flush()) {
            error!(error = %e, "cannot write readiness line");
        }
    }
}
