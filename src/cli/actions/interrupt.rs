//! Ctrl-C for the whole process. One signal handler is installed; presses are
//! counted on a `watch` channel and each command decides what a press means.

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Interrupts {
    presses: watch::Receiver<u64>,
}

impl From<watch::Receiver<u64>> for Interrupts {
    fn from(presses: watch::Receiver<u64>) -> Self {
        Self { presses }
    }
}

impl Interrupts {
    /// Installs the Ctrl-C handler. Once installed, Ctrl-C no longer
    /// terminates the process; callers must react to [`Interrupts::next`].
    #[must_use]
    pub fn listen() -> Self {
        let (sender, presses) = watch::channel(0);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received");
                sender.send_modify(|count| *count += 1);
            }
        });
        Self::from(presses)
    }

    /// Forgets presses seen so far.
    pub fn clear(&mut self) {
        let _ = self.presses.borrow_and_update();
    }

    /// Resolves on the next press. Pending forever once the handler is gone.
    pub async fn next(&mut self) {
        if self.presses.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Token cancelled by the next press from now on. Abort the handle once
    /// the guarded work is done.
    #[must_use]
    pub fn cancel_on_next(&self) -> (CancellationToken, JoinHandle<()>) {
        let token = CancellationToken::new();
        let mut presses = self.clone();
        presses.clear();

        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                presses.next().await;
                token.cancel();
            })
        };
        (token, watcher)
    }
}
