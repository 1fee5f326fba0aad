//! Ctrl+C handling
//!
//! SIGINT only raises a flag. The handler is installed without `SA_RESTART`
//! so a console read blocked in the kernel returns `EINTR` and the caller can
//! look at the flag. Pauses sleep in short slices and check it in between.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Granularity of interruptible pauses
const PAUSE_SLICE: Duration = Duration::from_millis(10);

static SIGINT_RAISED: AtomicBool = AtomicBool::new(false);

/// Handle on an interrupt flag
#[derive(Debug, Clone, Copy)]
pub struct Interrupt {
    flag: &'static AtomicBool,
}

/// A pause or read was cut short by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl Interrupt {
    /// Watch an arbitrary flag (no signal handler involved)
    pub fn new(flag: &'static AtomicBool) -> Self {
        Self { flag }
    }

    /// Install the SIGINT handler and watch its flag
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = handle_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            if libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut()) != 0 {
                return Err(std::io::Error::last_os_error());
            }
        }

        log::debug!("SIGINT handler installed");
        Ok(Self::new(&SIGINT_RAISED))
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Sleep for `duration`, returning early if the flag goes up
    pub fn pause(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_raised() {
                return Err(Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }
}

#[cfg(unix)]
extern "C" fn handle_sigint(_: libc::c_int) {
    SIGINT_RAISED.store(true, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Interrupt {
        Interrupt::new(Box::leak(Box::new(AtomicBool::new(false))))
    }

    #[test]
    fn test_pause_completes() {
        let interrupt = fresh();
        let start = Instant::now();
        assert_eq!(interrupt.pause(Duration::from_millis(30)), Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pause_returns_early_when_raised() {
        let interrupt = fresh();
        interrupt.raise();
        let start = Instant::now();
        assert_eq!(interrupt.pause(Duration::from_secs(5)), Err(Interrupted));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_zero_pause() {
        assert_eq!(fresh().pause(Duration::ZERO), Ok(()));
    }
}
