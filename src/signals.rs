use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

/// Cooperative abort request for the running command.
///
/// The flag is raised from outside the command (a signal handler, another
/// thread); handlers poll it and answer with `Outcome::Abort`.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Raises the flag on SIGINT instead of terminating the process.
    #[cfg(feature = "shell")]
    pub fn install_sigint(&self) -> std::io::Result<()> {
        signal_hook::flag::register(signal_hook::consts::signal::SIGINT, Arc::clone(&self.0))?;
        debug!("signal event=install signal=SIGINT mode=flag");
        Ok(())
    }
}

/// Whether standard input is a terminal.
pub fn stdin_is_tty() -> bool {
    // SAFETY: isatty only inspects the descriptor.
    let tty = unsafe { libc::isatty(libc::STDIN_FILENO) == 1 };
    debug!("signal event=isatty stdin_tty={}", tty);
    tty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        assert!(!interrupt.is_raised());
        handle.raise();
        assert!(interrupt.is_raised());
        interrupt.clear();
        assert!(!handle.is_raised());
    }

    #[test]
    fn raised_from_another_thread() {
        let interrupt = Interrupt::new();
        let remote = interrupt.clone();
        std::thread::spawn(move || remote.raise()).join().unwrap();
        assert!(interrupt.is_raised());
    }
}
