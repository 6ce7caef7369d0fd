pub mod decide;
pub mod policy;

pub use decide::{decide, Verdict};
pub use policy::RouteClass;
