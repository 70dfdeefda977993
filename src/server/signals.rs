//! Signal-driven shutdown.
//!
//! SIGTERM and SIGINT end the agent. SIGHUP is logged and ignored: there is
//! no reloadable state, the device main config is re-read on every identity
//! query anyway.

use tracing::{debug, error, info};

/// Termination signal delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Terminate signal (SIGTERM).
    Terminate,
    /// Interrupt signal (SIGINT).
    Interrupt,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Terminate => write!(f, "SIGTERM"),
            Signal::Interrupt => write!(f, "SIGINT"),
        }
    }
}

impl Signal {
    #[cfg(unix)]
    fn from_raw(signal: i32) -> Option<Self> {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};

        match signal {
            SIGTERM => Some(Self::Terminate),
            SIGINT => Some(Self::Interrupt),
            _ => None,
        }
    }
}

/// Block until the process receives a termination signal (Unix).
#[cfg(unix)]
pub async fn wait_for_shutdown() -> Signal {
    use futures::StreamExt;
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook_tokio::Signals;

    let signals = match Signals::new([SIGTERM, SIGINT, SIGHUP]) {
        Ok(s) => s,
        Err(e) => {
            // Without handlers the process could only be killed, not
            // stopped; shut down instead.
            error!("Failed to register signal handlers: {}", e);
            return Signal::Terminate;
        }
    };

    let mut signals = signals.fuse();

    debug!("Signal handler started");

    while let Some(raw) = signals.next().await {
        match Signal::from_raw(raw) {
            Some(signal) => {
                info!("Received {}, shutting down", signal);
                return signal;
            }
            None => debug!("SIGHUP ignored, no reloadable state"),
        }
    }

    Signal::Terminate
}

/// Block until the process receives a termination signal (non-Unix
/// fallback: Ctrl+C only).
#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> Signal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    Signal::Interrupt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(format!("{}", Signal::Terminate), "SIGTERM");
        assert_eq!(format!("{}", Signal::Interrupt), "SIGINT");
    }

    #[cfg(unix)]
    #[test]
    fn test_only_termination_signals_map() {
        use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1};

        assert_eq!(Signal::from_raw(SIGTERM), Some(Signal::Terminate));
        assert_eq!(Signal::from_raw(SIGINT), Some(Signal::Interrupt));
        assert_eq!(Signal::from_raw(SIGHUP), None);
        assert_eq!(Signal::from_raw(SIGUSR1), None);
    }
}
