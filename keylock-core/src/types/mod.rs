mod primitives;
mod session;

pub use primitives::{KeyStatus, ResourceKey};
pub use session::{ReleaseCause, SessionOutcome, SessionState};
