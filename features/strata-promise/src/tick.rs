//! The "next tick" every promise reaction runs on.
//!
//! Each thread owns one job queue. Settling a promise never runs listeners inline,
//! it defers them here, and whoever drives the thread drains the queue with
//! [run_pending] or [run_until].

use std::{
    cell::RefCell,
    future::Future,
    pin::pin,
    task::{Context, Poll},
};

use futures::task::noop_waker_ref;
use futures_channel::mpsc;

/// A unit of deferred work
pub type Job = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: (mpsc::UnboundedSender<Job>, RefCell<mpsc::UnboundedReceiver<Job>>) = {
        let (tx, rx) = mpsc::unbounded();
        (tx, RefCell::new(rx))
    };
}

/// Schedules a job for the next tick of the current thread
pub fn defer(job: impl FnOnce() + 'static) {
    QUEUE.with(|(tx, _)| {
        // The receiver lives as long as the thread - the send can't fail while we are running
        let _ = tx.unbounded_send(Box::new(job));
    });
}

/// Runs queued jobs until the queue is empty, including jobs queued by the jobs themselves.
///
/// Returns how many jobs ran
pub fn run_pending() -> usize {
    let mut ran = 0;
    while let Some(job) = next_job() {
        job();
        ran += 1;
    }
    ran
}

/// Drives `future` by alternating polls with [run_pending]
///
/// Returns `None` if the future is still pending once no queued work is left,
/// on a single thread nothing else could complete it.
pub fn run_until<F: Future>(future: F) -> Option<F::Output> {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(noop_waker_ref());

    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return Some(output);
        }

        if run_pending() == 0 {
            tracing::trace!("Future stalled with an empty job queue");
            return None;
        }
    }
}

fn next_job() -> Option<Job> {
    // Borrow only while popping, jobs may defer more work
    QUEUE.with(|(_, rx)| rx.borrow_mut().try_recv().ok())
}
