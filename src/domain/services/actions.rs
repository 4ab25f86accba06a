#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::SharedTransport;

pub struct ActionsService {}

impl ActionsService {
    /// Runs requests against the transport, one at a time. A new request or an
    /// abort cancels whatever worker is still streaming.
    pub async fn start(
        transport: SharedTransport,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        // Lazy default.
        let mut worker: JoinHandle<Result<()>> = tokio::spawn(async {
            return Ok(());
        });

        while let Some(action) = rx.recv().await {
            match action {
                Action::Abort() => {
                    tracing::debug!("Aborting in-flight request");
                    worker.abort();
                }
                Action::SendRequest(generation, request) => {
                    worker.abort();

                    let worker_tx = tx.clone();
                    let worker_transport = transport.clone();
                    worker = tokio::spawn(async move {
                        let res = worker_transport
                            .send(generation, request, &worker_tx)
                            .await;

                        if let Err(err) = res {
                            tracing::error!(error = ?err, generation, "Chat stream failed");
                            worker_tx.send(Event::StreamFailed(generation, err.to_string()))?;
                        }

                        return Ok(());
                    });
                }
            }
        }

        worker.abort();
        return Ok(());
    }
}
