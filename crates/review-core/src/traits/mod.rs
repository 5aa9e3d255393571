//! Port traits - interfaces implemented by the infrastructure crates

mod cache;
mod clock;
mod remote;

pub use cache::{CacheResult, LocalReviewCache, ReplyFilter, ReviewFilter, ReviewSort};
pub use clock::{Clock, ManualClock, SystemClock};
pub use remote::{RemoteResult, RemoteReviewStore};
