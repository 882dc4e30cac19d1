//! This module contains a description of [`Sequence`], the factory that turns one
//! producer definition into any number of independent [`Session`]s.

use std::future::Future;

use anyhow::Result;
use log::trace;

use crate::coroutine::driver;
use crate::coroutine::session::Session;
use crate::coroutine::yielder::Yielder;

/// A reusable producer definition.
///
/// Every call to [`traverse`](Sequence::traverse) allocates a fresh [`Session`] with
/// fully isolated state, so the same sequence can be traversed many times, including
/// interleaved.
///
/// # Example
///
/// ```
/// use relay::{Sequence, Yielder};
///
/// let naturals = Sequence::new(|y: Yielder<u32>| async move {
///     for i in 0.. {
///         y.yield_out(i).await?;
///     }
///     Ok(())
/// });
///
/// let first: Vec<u32> = naturals.traverse().take(3).collect::<anyhow::Result<_>>()?;
/// let second: Vec<u32> = naturals.traverse().take(3).collect::<anyhow::Result<_>>()?;
/// assert_eq!(first, second);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Sequence<F> {
    producer: F,
}

impl<F> Sequence<F> {
    /// Wrap a producer routine so it can be traversed repeatedly.
    pub fn new(producer: F) -> Self {
        Self { producer }
    }

    /// Start one traversal. The producer runs up to its first suspension point, or to
    /// completion, before this returns; a failure raised before the first suspension is
    /// held and re-raised by the first [`advance`](Session::advance).
    pub fn traverse<T, R, Fut>(&self) -> Session<T, R>
    where
        F: Fn(Yielder<T, R>) -> Fut,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let mut session = Session::new(|yielder| (self.producer)(yielder));
        if let Err(fault) = driver::step(&mut session) {
            trace!("producer failed before its first suspension");
            session.terminal = Some(fault);
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use anyhow::bail;

    use super::*;

    #[test]
    fn test_traverse_starts_the_producer_eagerly() {
        let started = Rc::new(Cell::new(0));
        let sequence = {
            let started = started.clone();
            Sequence::new(move |y: Yielder<u32>| {
                let started = started.clone();
                async move {
                    started.set(started.get() + 1);
                    y.yield_out(1).await?;
                    Ok(())
                }
            })
        };

        let mut session = sequence.traverse();
        assert_eq!(started.get(), 1);
        assert!(session.advance().unwrap());
        assert_eq!(session.current(), Some(&1));
    }

    #[test]
    fn test_traversals_are_isolated() {
        let sequence = Sequence::new(|y: Yielder<u32>| async move {
            for i in 0..3 {
                y.yield_out(i).await?;
            }
            Ok(())
        });

        let mut first = sequence.traverse();
        let mut second = sequence.traverse();

        assert!(first.advance().unwrap());
        assert!(first.advance().unwrap());
        assert_eq!(first.current(), Some(&1));

        // The second traversal is untouched by the first one's progress.
        assert!(second.advance().unwrap());
        assert_eq!(second.current(), Some(&0));
    }

    #[test]
    fn test_failure_before_first_suspension_is_held_for_advance() {
        let sequence = Sequence::new(|_y: Yielder<u32>| async move { bail!("eager failure") });
        let mut session = sequence.traverse();
        let fault = session.advance().unwrap_err();
        assert_eq!(fault.to_string(), "eager failure");
    }

    #[test]
    fn test_two_way_traversal_drives_the_producer() {
        let sequence = Sequence::new(|y: Yielder<u32, u32>| async move {
            let mut health = 100u32;
            while health > 0 {
                let damage = y.yield_out(health).await?;
                health = health.saturating_sub(damage);
            }
            Ok(())
        });

        let mut session = sequence.traverse();
        let mut seen = Vec::new();
        while session.advance().unwrap() {
            seen.push(*session.current().unwrap());
            session.send(30);
        }
        assert_eq!(seen, vec![100, 70, 40, 10]);
    }
}
