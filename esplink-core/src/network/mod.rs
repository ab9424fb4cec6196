//! Serial link session: transport ownership, inbound reader task and
//! serialized, paced writes.

pub mod session;
pub mod upload;

pub use session::LinkSession;
pub use upload::ProgressTracker;
