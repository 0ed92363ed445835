pub mod clock;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{TokenSource, TokenStore};
