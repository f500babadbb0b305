//! Bounded event queue with a fixed pool of workers
//!
//! Producers push events into a bounded queue. A fixed number of workers pull events off the queue, and each worker
//! runs the handler for one event to completion before it takes the next one. So at most `workers` handlers run at the
//! same time, no matter how many events are queued up. When the queue is full, producers wait.
//!
//! The handler is stateless, i.e. it has no access to the internal state of the pool. All that is received is the
//! event itself. The handlers can be async.
use std::{future::Future, pin::Pin, sync::Arc};

use futures_util::future::join_all;
use log::*;
use tokio::sync::{mpsc, Mutex};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
    workers: usize,
}

impl<E: Send + 'static> EventHandler<E> {
    /// Creates a new handler with a queue holding up to `buffer_size` events, serviced by `workers` workers.
    pub fn new(buffer_size: usize, workers: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler, workers: workers.max(1) }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs the workers until every producer has been dropped and the queue has been drained.
    pub async fn start_handler(self) {
        debug!("📬️ Starting event handler with {} workers", self.workers);
        // drop the internal sender so that when the last subscriber is dropped, we can automatically shut down the
        // handler
        drop(self.sender);
        let queue = Arc::new(Mutex::new(self.listener));
        let workers = (0..self.workers)
            .map(|worker| {
                let queue = Arc::clone(&queue);
                let handler = Arc::clone(&self.handler);
                tokio::spawn(async move {
                    loop {
                        let next = queue.lock().await.recv().await;
                        let Some(ev) = next else {
                            break;
                        };
                        trace!("📬️ Worker {worker} handling event");
                        // Run the handler in its own task, so that a panicking handler does not take the worker down
                        if let Err(e) = tokio::spawn((handler)(ev)).await {
                            error!("📬️ Worker {worker}: event handler failed. {e}");
                        }
                        trace!("📬️ Event handled");
                    }
                    trace!("📬️ Worker {worker} has stopped");
                })
            })
            .collect::<Vec<_>>();
        for result in join_all(workers).await {
            if let Err(e) = result {
                warn!("📬️ Event worker shutdown process failed: {e}.");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send> {
    sender: mpsc::Sender<E>,
}

impl<E: Send> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event, waiting for space if the queue is full.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
