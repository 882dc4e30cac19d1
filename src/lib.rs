//! A synchronous, two-way coroutine primitive.
//!
//! A producer routine is ordinary sequential code written as an `async` function. It
//! hands values out through a [`Yielder`] and suspends at each
//! [`yield_out`](Yielder::yield_out); the consumer drives it one suspension point at a
//! time through a [`Session`], optionally sending a result or a failure back in before
//! the producer continues. There is no runtime and no second thread: the producer only
//! ever runs inside the consumer's [`advance`](Session::advance) call, on the consumer's
//! thread.
//!
//! Pull-only traversal:
//!
//! ```
//! use relay::{Sequence, Yielder};
//!
//! let squares = Sequence::new(|y: Yielder<u64>| async move {
//!     for i in 1..=4 {
//!         y.yield_out(i * i).await?;
//!     }
//!     Ok(())
//! });
//!
//! let items: Vec<u64> = squares.traverse().collect::<anyhow::Result<_>>()?;
//! assert_eq!(items, vec![1, 4, 9, 16]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Two-way traversal, where every yielded value is answered:
//!
//! ```
//! use relay::{Session, Yielder};
//!
//! let mut session = Session::new(|y: Yielder<u32, bool>| async move {
//!     for i in 0..10 {
//!         let keep_going = y.yield_out(i).await?;
//!         if !keep_going {
//!             break;
//!         }
//!     }
//!     Ok(())
//! });
//!
//! let mut seen = Vec::new();
//! while session.advance()? {
//!     let value = *session.current().unwrap();
//!     seen.push(value);
//!     session.send(value < 2);
//! }
//! assert_eq!(seen, vec![0, 1, 2]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Abandoning a traversal early (dropping the [`Session`], or calling
//! [`dispose`](Session::dispose)) unwinds the producer so its cleanup logic runs before
//! control returns:
//!
//! ```
//! use relay::{Session, Yielder};
//!
//! struct Resource;
//! impl Drop for Resource {
//!     fn drop(&mut self) {
//!         // release whatever the producer was holding
//!     }
//! }
//!
//! let mut session = Session::new(|y: Yielder<u32>| async move {
//!     let _resource = Resource;
//!     for i in 0.. {
//!         y.yield_out(i).await?;
//!     }
//!     Ok(())
//! });
//! session.advance()?;
//! session.dispose()?; // Resource is dropped here, synchronously
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod coroutine;

pub use coroutine::{Sequence, Session, YieldOut, Yielder};
