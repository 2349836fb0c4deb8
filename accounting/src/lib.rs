pub mod accumulator;
pub mod clock;
pub mod error;
pub mod source;

pub use accumulator::{DEFAULT_WINDOW_DAYS, UsageAccumulator, UsageSnapshot};
pub use clock::{Clock, SystemClock};
pub use error::{AccountingError, Result};
pub use source::{ProcTrafficSource, TrafficSource};
