//! This module contains a description of [`Session`], the per-traversal suspend/resume
//! state machine. A session owns one producer routine and exposes the pull protocol to
//! the consumer: [`advance`](Session::advance), [`current`](Session::current),
//! [`send`](Session::send), [`throw`](Session::throw) and [`dispose`](Session::dispose).
//!
//! A session is single-threaded and exclusively owned: the producer only runs while the
//! consumer is inside [`advance`](Session::advance) (or [`dispose`](Session::dispose)),
//! and the consumer only runs while the producer is suspended. Control strictly
//! alternates, so no synchronization is involved anywhere.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Error, Result};
use log::trace;

use crate::coroutine::channel::{Abandoned, Channel, Resume, SharedChannel};
use crate::coroutine::driver::{self, Step};
use crate::coroutine::yielder::Yielder;

/// The stored continuation: the producer's future, resumed one poll at a time by the
/// driver. Present iff the producer is suspended (or not yet started) and not currently
/// being resumed.
pub(crate) type ResumePoint = Pin<Box<dyn Future<Output = Result<()>>>>;

/// One traversal of a producer routine.
///
/// Created directly with [`Session::new`] (lazy: the producer does not run until the
/// first [`advance`](Session::advance)) or through
/// [`Sequence::traverse`](crate::coroutine::Sequence::traverse) (eager: the producer has
/// already run to its first suspension point).
///
/// # Example
///
/// ```
/// use relay::{Session, Yielder};
///
/// let mut session = Session::new(|y: Yielder<u32, u32>| async move {
///     let mut total = 0;
///     for i in 1..=3 {
///         total += y.yield_out(i).await?;
///     }
///     y.yield_out(total).await?;
///     Ok(())
/// });
/// while session.advance()? {
///     let doubled = session.current().unwrap() * 2;
///     session.send(doubled);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Session<T, R = ()> {
    pub(crate) channel: SharedChannel<T, R>,
    pub(crate) resume_point: Option<ResumePoint>,
    /// The last value delivered to the consumer.
    pub(crate) current: Option<T>,
    /// A failure raised by the producer before the consumer's first `advance`
    /// (eager start), held until that call can re-raise it.
    pub(crate) terminal: Option<Error>,
    /// Whether the producer has been resumed at least once.
    pub(crate) started: bool,
    /// Whether the producer routine has returned.
    pub(crate) completed: bool,
    /// Guard against re-entrant stepping from inside the producer.
    pub(crate) stepping: bool,
}

impl<T, R> Session<T, R> {
    /// Create a session for one traversal of `producer`. The producer routine does not
    /// run until the first call to [`advance`](Session::advance).
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(Yielder<T, R>) -> Fut,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let channel = Channel::new();
        let yielder = Yielder::new(channel.clone());
        Self {
            channel,
            resume_point: Some(Box::pin(producer(yielder))),
            current: None,
            terminal: None,
            started: false,
            completed: false,
            stepping: false,
        }
    }

    /// Advance the traversal by one step.
    ///
    /// If no value is buffered, the driver resumes the producer and lets it run to its
    /// next suspension point, to completion, or to a failure. Returns `Ok(true)` with
    /// [`current`](Session::current) set when a value became available, `Ok(false)` when
    /// the producer completed without producing one, and `Err` with the producer's own
    /// failure (never a wrapper) when it failed.
    pub fn advance(&mut self) -> Result<bool> {
        if let Some(fault) = self.terminal.take() {
            return Err(fault);
        }

        driver::step(self)?;

        match self.channel.borrow_mut().outgoing.take() {
            Some(value) => {
                self.current = Some(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The value delivered by the last successful [`advance`](Session::advance).
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Store `value` as the payload the producer observes at its next suspension point.
    /// A later `send` or [`throw`](Session::throw) before that point overwrites it.
    pub fn send(&mut self, value: R) {
        self.channel.borrow_mut().incoming = Some(Resume::Value(value));
    }

    /// Store a failure to re-raise inside the producer at its next suspension point.
    /// The producer may handle it like any other failure; unhandled, it unwinds the
    /// producer and surfaces at the consumer's next [`advance`](Session::advance).
    pub fn throw(&mut self, fault: Error) {
        self.channel.borrow_mut().incoming = Some(Resume::Fault(fault));
    }

    /// Whether the producer routine has returned.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Terminate the traversal early.
    ///
    /// If the producer is suspended, an internal abandonment failure is injected and the
    /// driver is invoked once, so the producer's cleanup logic runs synchronously before
    /// this returns. A clean unwind re-raising that failure is absorbed; a different
    /// failure raised by cleanup propagates. Disposing a completed or never-started
    /// session is a no-op.
    ///
    /// # Panics
    ///
    /// If the producer swallows the abandonment failure and keeps running, or if
    /// `dispose` is called re-entrantly from inside the producer.
    pub fn dispose(&mut self) -> Result<()> {
        if self.stepping {
            panic!("Tried to dispose a session from inside its own producer!");
        }
        if self.resume_point.is_none() {
            return Ok(());
        }
        if !self.started {
            // Nothing has run yet, so there is nothing to unwind.
            self.resume_point = None;
            trace!("session disposed before the producer ever ran");
            return Ok(());
        }

        match self.unwind_producer() {
            Err(fault) if fault.is::<Abandoned>() => {
                trace!("producer unwound cleanly on abandonment");
                Ok(())
            }
            Err(fault) => Err(fault),
            Ok(step) => panic!(
                "Producer swallowed the abandonment failure during dispose \
                (stepped to {:?})!",
                step
            ),
        }
    }

    /// Inject the abandonment failure and force one resumption so the producer's
    /// cleanup logic runs. Any buffered value is discarded so the driver actually
    /// resumes the producer instead of short-circuiting.
    fn unwind_producer(&mut self) -> Result<Step> {
        {
            let mut channel = self.channel.borrow_mut();
            channel.outgoing = None;
            channel.incoming = Some(Resume::Fault(Error::new(Abandoned)));
        }
        driver::step(self)
    }
}

impl<T, R> Drop for Session<T, R> {
    fn drop(&mut self) {
        // Never run producer code while unwinding from another panic.
        if std::thread::panicking() {
            return;
        }
        if self.resume_point.is_none() || !self.started {
            return;
        }

        match self.unwind_producer() {
            Err(fault) if fault.is::<Abandoned>() => {}
            Err(fault) => log::error!("producer cleanup failed during drop: {fault:#}"),
            Ok(_) => log::error!("producer swallowed the abandonment failure during drop"),
        }
    }
}

/// The read-only consumer loop: each item is the next produced value, or the failure
/// that ended the traversal.
impl<T, R> Iterator for Session<T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => self.current.take().map(Ok),
            Ok(false) => None,
            Err(fault) => Some(Err(fault)),
        }
    }
}
