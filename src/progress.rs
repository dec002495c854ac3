//! Line-oriented progress reporting.
//!
//! The sync pipeline and its providers narrate a run through a
//! [`ProgressSink`]: the CLI prints the lines to stdout, tests collect
//! them into a buffer. Diagnostics (stage transitions, cleanup warnings)
//! go through `tracing` instead; the sink carries only the user-facing
//! transfer log.

/// Receives human-readable progress lines during a sync run.
///
/// Implementations must be safe to call from any thread. Any
/// `Fn(&str) + Send + Sync` closure qualifies.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, line: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, line: &str) {
        self(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_sinks() {
        let lines: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let sink = |line: &str| lines.lock().unwrap().push(line.to_string());
        sink.emit("first");
        sink.emit("second");
        assert_eq!(*lines.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn sinks_are_object_safe() {
        let count = std::sync::atomic::AtomicUsize::new(0);
        let closure = |_: &str| {
            count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        };
        let dyn_sink: &dyn ProgressSink = &closure;
        dyn_sink.emit("x");
        dyn_sink.emit("y");
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
