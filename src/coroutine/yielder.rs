//! This module contains a description of [`Yielder`] and [`YieldOut`], the producer-side
//! half of a session. A producer routine receives a [`Yielder`] and hands values out with
//! [`yield_out`](Yielder::yield_out); awaiting the returned [`YieldOut`] is the suspension point.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use anyhow::Error;

use crate::coroutine::channel::{Resume, SharedChannel};

/// The handle a producer routine yields values through.
///
/// Awaiting [`yield_out`](Yielder::yield_out) suspends the producer and hands the value to
/// the consumer driving the session. The await resolves once the consumer advances again:
/// to `Ok` with the value the consumer [`sent`](crate::coroutine::Session::send) back
/// (or `R::default()` if it sent nothing), or to `Err` with the failure it
/// [`threw`](crate::coroutine::Session::throw) in.
///
/// # Example
///
/// ```
/// use relay::{Session, Yielder};
///
/// let mut session = Session::new(|y: Yielder<u32>| async move {
///     y.yield_out(1).await?;
///     y.yield_out(2).await?;
///     Ok(())
/// });
/// assert!(session.advance()?);
/// assert_eq!(session.current(), Some(&1));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Yielder<T, R = ()> {
    channel: SharedChannel<T, R>,
}

impl<T, R> Yielder<T, R> {
    pub(crate) fn new(channel: SharedChannel<T, R>) -> Self {
        Self { channel }
    }
}

impl<T, R: Default> Yielder<T, R> {
    /// Hand `value` out to the consumer. The returned [`YieldOut`] must be awaited:
    /// its first poll buffers the value and suspends the producer, and the poll after
    /// resumption reads the injected payload exactly once.
    ///
    /// # Panics
    ///
    /// Polling the returned future while a previous value is still unread is a
    /// contract violation and panics. Producers must suspend on each yield before
    /// producing the next value.
    pub fn yield_out(&self, value: T) -> YieldOut<T, R> {
        YieldOut {
            channel: self.channel.clone(),
            value: Some(value),
            consumed: false,
        }
    }
}

impl<T, R> Clone for Yielder<T, R> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

/// The awaitable returned by [`Yielder::yield_out`]. One suspension point of the producer.
pub struct YieldOut<T, R = ()> {
    channel: SharedChannel<T, R>,
    /// `Some` until the value has been buffered; `None` means the next poll is the
    /// post-resumption read of the injected payload.
    value: Option<T>,
    consumed: bool,
}

// No field is ever pinned through the wrapper, so the future can move freely.
impl<T, R> Unpin for YieldOut<T, R> {}

impl<T, R: Default> Future for YieldOut<T, R> {
    type Output = Result<R, Error>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.consumed {
            panic!("Tried to read the resumption payload twice at the same suspension point!");
        }

        let mut channel = this.channel.borrow_mut();
        match this.value.take() {
            Some(value) => {
                if channel.outgoing.is_some() {
                    panic!(
                        "Tried to yield a value while the previous one is still unread! \
                        Await each yield_out before producing the next value."
                    );
                }
                channel.outgoing = Some(value);
                Poll::Pending
            }
            None => {
                this.consumed = true;
                match channel.incoming.take() {
                    Some(Resume::Value(result)) => Poll::Ready(Ok(result)),
                    Some(Resume::Fault(fault)) => Poll::Ready(Err(fault)),
                    None => Poll::Ready(Ok(R::default())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::coroutine::Session;

    use super::*;

    #[test]
    #[should_panic(expected = "still unread")]
    fn test_second_yield_before_suspension_panics() {
        let mut session = Session::new(|y: Yielder<u32>| async move {
            let first = y.yield_out(1);
            let second = y.yield_out(2);
            let (a, b) = futures::future::join(first, second).await;
            a?;
            b?;
            Ok(())
        });
        let _ = session.advance();
    }

    #[test]
    fn test_resume_without_injection_observes_default() {
        let observed = Rc::new(Cell::new(u32::MAX));
        let mut session = {
            let observed = observed.clone();
            Session::new(move |y: Yielder<u32, u32>| async move {
                observed.set(y.yield_out(1).await?);
                Ok(())
            })
        };
        assert!(session.advance().unwrap());
        assert!(!session.advance().unwrap());
        assert_eq!(observed.get(), 0);
    }

    #[test]
    fn test_yielder_can_be_shared_with_helpers() {
        async fn emit_twice(y: Yielder<u32>, base: u32) -> anyhow::Result<()> {
            y.yield_out(base).await?;
            y.yield_out(base + 1).await?;
            Ok(())
        }

        let session = Session::new(|y: Yielder<u32>| async move {
            emit_twice(y.clone(), 10).await?;
            emit_twice(y, 20).await?;
            Ok(())
        });
        let items: Vec<u32> = session.collect::<anyhow::Result<Vec<_>>>().unwrap();
        assert_eq!(items, vec![10, 11, 20, 21]);
    }
}
