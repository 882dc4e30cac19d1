//! This module contains the [`Channel`] shared between the two halves of a session.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Error;

/// The payload delivered to the producer when it is resumed.
#[derive(Debug)]
pub(crate) enum Resume<R> {
    /// A normal result sent back by the consumer.
    Value(R),
    /// A failure to re-raise inside the producer at its suspension point.
    Fault(Error),
}

/// The internal failure injected by disposal to force producer cleanup to run.
/// It is crate-private on purpose: nothing outside the engine can observe or
/// fabricate it.
#[derive(Debug, thiserror::Error)]
#[error("traversal abandoned before the producer completed")]
pub(crate) struct Abandoned;

/// The one cell both halves of a session touch: the producer buffers its
/// outgoing value here, the consumer stores the payload for the next
/// resumption here. Held behind [`Rc`]/[`RefCell`] because control strictly
/// alternates on a single thread; there is never concurrent access.
pub(crate) struct Channel<T, R> {
    /// The value the producer most recently handed out, unread by the consumer.
    pub(crate) outgoing: Option<T>,
    /// The payload to inject into the producer on its next resumption.
    pub(crate) incoming: Option<Resume<R>>,
}

impl<T, R> Channel<T, R> {
    pub(crate) fn new() -> SharedChannel<T, R> {
        Rc::new(RefCell::new(Self {
            outgoing: None,
            incoming: None,
        }))
    }
}

pub(crate) type SharedChannel<T, R> = Rc<RefCell<Channel<T, R>>>;
