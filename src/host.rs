use std::io::{self, Write};
use std::process::Command;

/// Interface between the VM and the outside world.
///
/// The PRINTLN, PRINT and RUN operations go through this trait, so
/// embedders and tests can capture their effects instead of touching the
/// real stdout or shell.
pub trait Host {
    /// Writes `text` to the host output.
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Writes `text` followed by a line break to the host output.
    fn println(&mut self, text: &str) -> io::Result<()>;

    /// Runs `command` in the host shell, blocking until it finishes.
    fn run(&mut self, command: &str) -> io::Result<()>;
}

/// The standard host: text goes to stdout (flushed after every call, so
/// output appears in program order), commands run in the platform shell
/// with inherited stdio.
pub struct StdHost;

impl Host for StdHost {
    fn print(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn println(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()
    }

    fn run(&mut self, command: &str) -> io::Result<()> {
        #[cfg(windows)]
        let shell = ("cmd", "/C");
        #[cfg(not(windows))]
        let shell = ("sh", "-c");

        // The child's exit status is not reported back to the program.
        Command::new(shell.0).arg(shell.1).arg(command).status()?;
        Ok(())
    }
}
