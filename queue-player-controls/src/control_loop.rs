use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::{select, sync::watch, task::JoinHandle};
use tracing::{debug, error, instrument, trace};

use crate::{Result, coordinator::QueueCoordinator};

/// Handle to the background worker that starts queued tracks.
///
/// The worker waits for an advance, dequeues the next track and hands it to
/// the engine, forever, until [`ControlLoop::stop`] is called. Dropping the
/// handle also shuts the worker down. Either way the coordinator can be
/// started again once the worker has exited.
#[derive(Debug)]
pub struct ControlLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
    coordinator: Arc<QueueCoordinator>,
}

impl ControlLoop {
    pub(crate) fn spawn(coordinator: Arc<QueueCoordinator>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(control_loop(coordinator.clone(), shutdown_rx));

        Self {
            shutdown,
            handle,
            coordinator,
        }
    }

    /// Cancels the wait for the next advance and joins the worker. A track
    /// being dispatched when this is called is handed to the engine first.
    #[instrument(skip(self))]
    pub async fn stop(self) -> Result<()> {
        if self.shutdown.send(true).is_err() {
            debug!("control loop already gone");
        }

        if let Err(error) = self.handle.await {
            // The worker died before it could reset the running flag.
            self.coordinator.stopped();
            return Err(error.into());
        }

        Ok(())
    }
}

async fn control_loop(coordinator: Arc<QueueCoordinator>, mut shutdown: watch::Receiver<bool>) {
    let poll_interval = coordinator.config().advance_poll_interval;
    debug!(?poll_interval, "starting control loop");

    loop {
        select! {
            _ = shutdown.changed() => {
                debug!("stopping control loop");
                break;
            }

            woken = coordinator.advance().wait(poll_interval) => {
                if !woken {
                    trace!("no advance requested, still waiting");
                    continue;
                }

                let dispatch = AssertUnwindSafe(coordinator.dispatch_next()).catch_unwind();
                if let Err(panic) = dispatch.await {
                    error!(panic = panic_message(panic.as_ref()), "dispatch panicked, control loop keeps running");
                }
            }
        }
    }

    coordinator.stopped();
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
