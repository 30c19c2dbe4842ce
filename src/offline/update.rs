//! Periodic shell update checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::controller::OfflineController;

/// Spawn the recurring update checker.
///
/// Housekeeping only: the task asks the controller to re-probe the shell on
/// a fixed interval, independent of any request, and nothing consumes its
/// result. Abort the handle to stop it.
pub fn spawn_update_checker(
  controller: Arc<OfflineController>,
  every: Duration,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    // The first tick fires immediately; install already probed the shell.
    ticker.tick().await;

    loop {
      ticker.tick().await;
      controller.check_for_update().await;
    }
  })
}
