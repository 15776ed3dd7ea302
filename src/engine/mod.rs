// Clone engine: handshake state machines, block transfer, sessions.

pub mod error;
pub mod handshake;
pub mod progress;
pub mod session;
pub mod transfer;

pub use error::{CloneError, CloneResult, Phase};
pub use progress::{progress_channel, CancelFlag, ProgressEvent, ProgressReceiver, ProgressSender};
pub use session::CloneSession;
