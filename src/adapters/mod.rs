// Adapters layer: concrete implementations of the domain ports.

pub mod clock;
pub mod http;
pub mod session;

pub use clock::{FixedClock, SystemClock};
pub use http::RestGateway;
pub use session::{AnonymousSession, StaticTokenSession};
