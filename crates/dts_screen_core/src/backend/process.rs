//! Subprocess execution with line-by-line output forwarding

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{Sender, channel};
use std::thread::{self, JoinHandle};

/// One line of driver output, tagged with the stream it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

/// Spawn `command`, forward every output line to `sink` as it arrives and
/// block until the process exits.
///
/// Each pipe gets a reader thread; lines from both meet in one channel and are
/// handed to `sink` on the calling thread in arrival order.
pub fn run_streaming(
    mut command: Command,
    sink: &mut dyn FnMut(OutputLine),
) -> io::Result<ExitStatus> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;

    let (tx, rx) = channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, tx.clone(), OutputLine::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, tx.clone(), OutputLine::Stderr));
    }
    drop(tx);

    for line in rx {
        sink(line);
    }

    for reader in readers {
        if reader.join().is_err() {
            tracing::warn!("output reader thread panicked");
        }
    }

    child.wait()
}

fn spawn_reader<R>(
    pipe: R,
    tx: Sender<OutputLine>,
    tag: fn(String) -> OutputLine,
) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(tag(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to read driver output: {e}");
                    break;
                }
            }
        }
    })
}
