use std::sync::Arc;

use tokio::sync::watch;

/// Connection readiness, set once the broker accepted the connection.
///
/// Cloning yields another handle to the same flag, so tasks that want to
/// publish or subscribe can wait on it while the read loop owns the packet
/// handler. The flag only ever goes from unset to set.
#[derive(Clone, Debug)]
pub struct ConnectionReady {
    state: Arc<watch::Sender<bool>>,
}

impl Default for ConnectionReady {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionReady {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);

        ConnectionReady {
            state: Arc::new(state),
        }
    }

    /// Marks the connection ready and wakes every waiter.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn set(&self) -> bool {
        self.state.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub fn is_set(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the flag is set; immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();

        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}
