//! This module contains the trampoline that advances a [`Session`] by exactly one
//! suspension-to-suspension interval. The whole cycle runs on the caller's thread:
//! "suspension" means returning control to the caller of [`step`], never blocking.

use std::task::{Context, Poll};

use anyhow::Result;
use futures::task::noop_waker_ref;
use log::trace;

use crate::coroutine::session::Session;

/// What a single [`step`] did.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// A value is already buffered and unread; nothing was run.
    Buffered,
    /// There is no pending continuation: the producer has not been handed to the
    /// session or has already finished.
    Idle,
    /// The producer was resumed and ran to its next suspension point.
    Suspended,
    /// The producer was resumed and ran to completion.
    Complete,
}

/// Resume `session`'s producer exactly once.
///
/// The pending continuation is taken out of its slot before it is polled, so the same
/// suspension point can never be resumed twice; it is put back only if the producer
/// suspended again. A failure raised by the producer propagates to the caller as-is and
/// marks the session complete.
///
/// # Panics
///
/// If called re-entrantly while the producer is already running.
pub(crate) fn step<T, R>(session: &mut Session<T, R>) -> Result<Step> {
    if session.channel.borrow().outgoing.is_some() {
        // The consumer has not read the previous value yet.
        return Ok(Step::Buffered);
    }
    if session.stepping {
        panic!("Tried to step a session re-entrantly from inside its own producer!");
    }
    let Some(mut resume_point) = session.resume_point.take() else {
        return Ok(Step::Idle);
    };

    session.started = true;
    session.stepping = true;
    let mut context = Context::from_waker(noop_waker_ref());
    let polled = resume_point.as_mut().poll(&mut context);
    session.stepping = false;

    match polled {
        Poll::Pending => {
            trace!("producer suspended");
            session.resume_point = Some(resume_point);
            Ok(Step::Suspended)
        }
        Poll::Ready(Ok(())) => {
            trace!("producer completed");
            session.completed = true;
            Ok(Step::Complete)
        }
        Poll::Ready(Err(fault)) => {
            trace!("producer failed: {fault:#}");
            session.completed = true;
            Err(fault)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::coroutine::Yielder;

    use super::*;

    fn counting_session(segments: Rc<Cell<u32>>) -> Session<u32> {
        Session::new(move |y: Yielder<u32>| async move {
            for i in 0..2 {
                segments.set(segments.get() + 1);
                y.yield_out(i).await?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_step_is_a_noop_while_a_value_is_buffered() {
        let segments = Rc::new(Cell::new(0));
        let mut session = counting_session(segments.clone());

        assert_eq!(step(&mut session).unwrap(), Step::Suspended);
        assert_eq!(segments.get(), 1);

        // The buffered value has not been read; stepping again runs nothing.
        assert_eq!(step(&mut session).unwrap(), Step::Buffered);
        assert_eq!(step(&mut session).unwrap(), Step::Buffered);
        assert_eq!(segments.get(), 1);
    }

    #[test]
    fn test_step_reports_idle_once_the_producer_finished() {
        let segments = Rc::new(Cell::new(0));
        let mut session = counting_session(segments.clone());

        while session.advance().unwrap() {}
        assert_eq!(segments.get(), 2);

        assert_eq!(step(&mut session).unwrap(), Step::Idle);
        assert_eq!(segments.get(), 2);
    }

    #[test]
    fn test_step_consumes_the_continuation_before_resuming() {
        let mut session = Session::new(|y: Yielder<u32>| async move {
            y.yield_out(1).await?;
            Ok(())
        });
        assert_eq!(step(&mut session).unwrap(), Step::Suspended);
        assert!(session.resume_point.is_some());

        session.channel.borrow_mut().outgoing = None;
        assert_eq!(step(&mut session).unwrap(), Step::Complete);
        assert!(session.resume_point.is_none());
    }
}
