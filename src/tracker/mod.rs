mod dispatcher;
pub mod identity;
mod sender;
mod significance;
pub mod source;

pub use dispatcher::{DispatchStats, Dispatcher, DispatcherHandle};
pub use sender::{HttpLocationSender, LocationSender, SendError};
pub use significance::{DEFAULT_THRESHOLD_DEG, SignificanceFilter};
