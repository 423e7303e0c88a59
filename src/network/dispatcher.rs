use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::codec::FillCommand;
use crate::constants::window::WORKER_POLL_MS;
use crate::error::StreamResult;

use super::FillSink;

/// Fixed pool of workers draining one shared, unbounded queue of fill
/// commands to the remote consumer.
///
/// Producers never block: the queue is unbounded, and production is bounded
/// by the much slower generation rate. Shutdown is graceful: workers drain
/// the queue to empty before honoring the stop flag, so no enqueued command
/// is ever dropped.
pub struct FillDispatcher {
    sender: Sender<FillCommand>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl FillDispatcher {
    /// Spawn `worker_count` workers, opening one sink per worker through
    /// `connect`.
    pub fn spawn<S, F>(worker_count: usize, mut connect: F) -> StreamResult<Self>
    where
        S: FillSink + 'static,
        F: FnMut(usize) -> StreamResult<S>,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let sink = connect(id)?;
            let receiver = receiver.clone();
            let stop = Arc::clone(&stop);
            let handle = thread::Builder::new()
                .name(format!("fill-worker-{}", id))
                .spawn(move || worker_loop(id, sink, receiver, stop))?;
            workers.push(handle);
        }

        log::info!("[FillDispatcher::spawn] {} workers started", worker_count);
        Ok(FillDispatcher {
            sender,
            stop,
            workers,
        })
    }

    /// Handle for producers to enqueue fill commands.
    pub fn sender(&self) -> Sender<FillCommand> {
        self.sender.clone()
    }

    /// Commands currently waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    /// Signal stop, let every worker drain the queue and close its
    /// connection, then join them all.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        // Dropping the producer side wakes workers blocked on the queue.
        drop(self.sender);
        for handle in self.workers {
            let name = handle.thread().name().unwrap_or("fill-worker").to_owned();
            if handle.join().is_err() {
                log::error!("[FillDispatcher::shutdown] {} panicked", name);
            } else {
                log::debug!("[FillDispatcher::shutdown] {} stopped", name);
            }
        }
    }
}

fn worker_loop(
    id: usize,
    mut sink: impl FillSink,
    receiver: Receiver<FillCommand>,
    stop: Arc<AtomicBool>,
) {
    loop {
        match receiver.try_recv() {
            Ok(command) => deliver(id, &mut sink, &command),
            Err(TryRecvError::Empty) => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                match receiver.recv_timeout(Duration::from_millis(WORKER_POLL_MS)) {
                    Ok(command) => deliver(id, &mut sink, &command),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            // All senders gone and the queue is drained.
            Err(TryRecvError::Disconnected) => break,
        }
    }
    sink.close();
}

fn deliver(id: usize, sink: &mut impl FillSink, command: &FillCommand) {
    // Per-command, fire-and-forget: a failed fill is logged and dropped.
    if let Err(e) = sink.fill(command) {
        log::warn!(
            "[FillDispatcher] worker {} failed to deliver fill at {}: {}",
            id,
            command.min,
            e
        );
    }
}
