//! Cooperative runtime detection
//!
//! Whether subprocesses are driven through the async runtime or through a
//! plain blocking call is decided once at startup. Detection lives behind
//! [`CooperativeRuntime`] so the rest of the controller only sees a flag.

use crate::io::Spawner;

/// A scheduling runtime that subprocess IO can cooperate with
pub trait CooperativeRuntime: Send + Sync {
    /// Short name used in verbose output
    fn name(&self) -> &'static str;

    /// Whether the runtime can be used by this process
    fn is_available(&self) -> bool;
}

/// The tokio runtime driving the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRuntime;

impl CooperativeRuntime for TokioRuntime {
    fn name(&self) -> &'static str {
        "tokio"
    }

    fn is_available(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }
}

/// No cooperative runtime; subprocesses block the caller
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRuntime;

impl CooperativeRuntime for NoRuntime {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Detect a usable runtime
pub fn detect() -> Box<dyn CooperativeRuntime> {
    if TokioRuntime.is_available() {
        Box::new(TokioRuntime)
    } else {
        Box::new(NoRuntime)
    }
}

/// Decide the cooperative flag from the `eventlet`/`no_eventlet` pair
///
/// An explicit disable wins, an explicit enable is honored even when the
/// runtime is missing, and otherwise detection decides.
pub fn cooperative_mode(
    enabled: bool,
    disabled: bool,
    runtime: &dyn CooperativeRuntime,
) -> bool {
    if disabled {
        return false;
    }
    enabled || runtime.is_available()
}

/// Pick the subprocess primitive for the IO manager
pub fn spawner_for(cooperative: bool, runtime: &dyn CooperativeRuntime) -> Spawner {
    if cooperative && runtime.is_available() {
        Spawner::Cooperative
    } else {
        Spawner::Blocking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_runtime() {
        let runtime = NoRuntime;
        assert!(!runtime.is_available());
        assert!(!cooperative_mode(false, false, &runtime));
        assert!(cooperative_mode(true, false, &runtime));
        assert_eq!(spawner_for(true, &runtime), Spawner::Blocking);
    }

    #[test]
    fn test_tokio_runtime_outside_runtime() {
        assert!(!TokioRuntime.is_available());
        assert_eq!(detect().name(), "none");
    }

    #[tokio::test]
    async fn test_tokio_runtime_inside_runtime() {
        let runtime = detect();
        assert_eq!(runtime.name(), "tokio");
        assert!(cooperative_mode(false, false, runtime.as_ref()));
        assert!(!cooperative_mode(true, true, runtime.as_ref()));
        assert_eq!(spawner_for(true, runtime.as_ref()), Spawner::Cooperative);
        assert_eq!(spawner_for(false, runtime.as_ref()), Spawner::Blocking);
    }
}
