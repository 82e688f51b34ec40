//! Simple stateless pub-sub event plumbing.
//!
//! Components subscribe to engine events (bid placed, bid accepted) and react to them after the fact. Handlers are
//! stateless: they receive the event and nothing else, and they run outside the settlement transaction, so a slow or
//! failing handler can never hold a database lock or roll back a settlement.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs the dispatch loop until every producer has been dropped. Each event is handled on its own task so a
    /// slow subscriber does not hold up the queue; outstanding tasks are drained before the loop returns.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Dropping our own sender lets the loop end once the last external producer goes away.
        drop(self.sender);
        let mut jobs = Vec::new();
        while let Some(ev) = self.listener.recv().await {
            let handler = Arc::clone(&self.handler);
            jobs.push(tokio::spawn(async move {
                (handler)(ev).await;
                trace!("📬️ Event handled");
            }));
            jobs.retain(|job| !job.is_finished());
        }
        for job in jobs {
            if let Err(e) = job.await {
                error!("📬️ An event handler task panicked: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
