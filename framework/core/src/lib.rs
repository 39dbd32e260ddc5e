mod discard;
mod session;
mod shutdown;

pub mod prelude {
    pub use crate::discard::CycleDiscarded;
    pub use crate::session::{SessionEpoch, SessionToken};
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener};
}
