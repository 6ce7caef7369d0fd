pub mod session;
pub mod token;
pub mod user;

pub use session::{PersistedSession, Session};
pub use token::{Claims, Clock, FixedClock, SystemClock};
pub use user::{Identity, Role};
