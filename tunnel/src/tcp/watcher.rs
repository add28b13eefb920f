use std::sync::{Arc, Weak};

use tunnel_core::CancellationToken;

use super::SourceInner;

/// Spawn the task that tears the source down once `scope` ends.
///
/// The task holds only a weak reference, so dropping the source does not keep the
/// connection alive. It exits without acting if teardown already happened through
/// another path.
pub fn spawn_watcher(inner: &Arc<SourceInner>, scope: CancellationToken) {
    let weak: Weak<SourceInner> = Arc::downgrade(inner);
    let interrupt = inner.interrupt.clone();
    tokio::spawn(async move {
        tokio::select! {
            biased;
            () = interrupt.cancelled() => {}
            () = scope.cancelled() => {
                if let Some(inner) = weak.upgrade() {
                    inner.close().await;
                }
            }
        }
    });
}
