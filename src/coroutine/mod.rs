pub mod session;
pub mod sequence;
pub mod yielder;
pub(crate) mod channel;
pub(crate) mod driver;

pub use sequence::*;
pub use session::*;
pub use yielder::*;
