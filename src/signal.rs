//! Interrupt routing from the interpreter to its foreground child.
//!
//! The interpreter never dies on SIGINT. A dedicated thread receives every
//! interrupt and forwards it to whatever process the [`ForegroundSlot`] names
//! at that moment, or drops it when the interpreter is idle at the prompt.

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;
use std::io;
use std::os::raw::c_int;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// The single process eligible to receive a forwarded interrupt.
///
/// The lock is held for the whole read-and-send, so once [`clear`] or
/// [`clear_if`] returns no forward to the old identifier is still in flight.
/// Callers clear the slot after the child exits but before reaping it, which
/// keeps the identifier from being recycled under the router.
///
/// [`clear`]: ForegroundSlot::clear
/// [`clear_if`]: ForegroundSlot::clear_if
#[derive(Debug, Default)]
pub struct ForegroundSlot {
    pid: Mutex<Option<Pid>>,
}

impl ForegroundSlot {
    pub fn set(&self, pid: Pid) {
        *self.lock() = Some(pid);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Clear the slot only if it still names `pid`.
    pub fn clear_if(&self, pid: Pid) {
        let mut slot = self.lock();
        if *slot == Some(pid) {
            *slot = None;
        }
    }

    pub fn get(&self) -> Option<Pid> {
        *self.lock()
    }

    /// Send `signal` to the tracked process, if any.
    ///
    /// Returns the identifier the signal went to, or `None` when idle.
    pub fn forward(&self, signal: Signal) -> nix::Result<Option<Pid>> {
        let slot = self.lock();
        match *slot {
            Some(pid) => kill(pid, signal).map(|()| Some(pid)),
            None => Ok(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Pid>> {
        self.pid.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Intercept SIGINT for the rest of the process lifetime and forward each
/// delivery to `foreground`.
///
/// The handler is registered before this returns; the returned thread runs
/// until the process exits.
pub fn install_router(foreground: Arc<ForegroundSlot>) -> io::Result<JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT])?;
    thread::Builder::new()
        .name("signal-router".into())
        .spawn(move || {
            for raw in signals.forever() {
                route(&foreground, raw);
            }
        })
}

fn route(foreground: &ForegroundSlot, raw: c_int) {
    let Ok(signal) = Signal::try_from(raw) else {
        return;
    };
    if let Err(e) = foreground.forward(signal) {
        // Typically ESRCH: the child is already gone.
        eprintln!("pipeline_shell: failed to forward {signal} to child: {e}");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    fn pid_of(child: &std::process::Child) -> Pid {
        Pid::from_raw(i32::try_from(child.id()).expect("pid fits in i32"))
    }

    #[test]
    fn test_set_get_clear() {
        let slot = ForegroundSlot::default();
        assert_eq!(slot.get(), None);

        slot.set(Pid::from_raw(4242));
        assert_eq!(slot.get(), Some(Pid::from_raw(4242)));

        slot.clear();
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn test_clear_if_ignores_other_pids() {
        let slot = ForegroundSlot::default();
        slot.set(Pid::from_raw(100));

        slot.clear_if(Pid::from_raw(200));
        assert_eq!(slot.get(), Some(Pid::from_raw(100)));

        slot.clear_if(Pid::from_raw(100));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn test_forward_when_idle_is_noop() {
        let slot = ForegroundSlot::default();
        assert_eq!(slot.forward(Signal::SIGINT).unwrap(), None);
    }

    #[test]
    fn test_forward_to_vanished_child_is_reported_not_fatal() {
        use nix::errno::Errno;

        // Above any pid_max the kernel allows, so nothing can own it.
        let slot = ForegroundSlot::default();
        slot.set(Pid::from_raw(i32::MAX));

        assert!(matches!(slot.forward(Signal::SIGINT), Err(Errno::ESRCH)));
        route(&slot, Signal::SIGINT as c_int);
        assert_eq!(slot.get(), Some(Pid::from_raw(i32::MAX)));
    }

    #[test]
    fn test_forward_interrupts_tracked_child() {
        let mut child = Command::new("sleep").arg("5").spawn().expect("spawn sleep");
        let slot = ForegroundSlot::default();
        slot.set(pid_of(&child));

        assert_eq!(slot.forward(Signal::SIGINT).unwrap(), Some(pid_of(&child)));

        let status = child.wait().expect("wait");
        assert_eq!(status.signal(), Some(Signal::SIGINT as i32));
    }

    #[test]
    fn test_router_forwards_and_interpreter_survives() {
        let foreground = Arc::new(ForegroundSlot::default());
        install_router(Arc::clone(&foreground)).expect("install router");

        let mut child = Command::new("sleep").arg("5").spawn().expect("spawn sleep");
        foreground.set(pid_of(&child));

        nix::sys::signal::raise(Signal::SIGINT).expect("raise");

        let status = child.wait().expect("wait");
        assert_eq!(status.signal(), Some(Signal::SIGINT as i32));
        foreground.clear();
    }
}
