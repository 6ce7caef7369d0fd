pub mod refresh;
pub mod transport;

pub use refresh::RefreshCoordinator;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
