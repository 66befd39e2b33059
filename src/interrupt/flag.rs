use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared "stop speaking now" signal.
///
/// Clones share one flag.  The interrupt monitor raises it; the speaker
/// clears it before every new speech session and polls it while speaking.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        assert!(!other.is_raised());

        flag.raise();
        flag.raise();
        assert!(other.is_raised());

        other.clear();
        assert!(!flag.is_raised());
    }

    #[test]
    fn visible_across_threads() {
        let flag = CancellationFlag::new();
        let remote = flag.clone();
        std::thread::spawn(move || remote.raise()).join().unwrap();
        assert!(flag.is_raised());
    }
}
