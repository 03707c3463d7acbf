use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one in-flight request against a changing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Generation counter for "latest request wins" loading
///
/// Each `begin` supersedes every earlier token. A response is applied only if
/// its token is still current when it arrives; otherwise it is discarded.
#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestToken {
        RequestToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }

    /// Invalidates any outstanding token without starting a new request.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
