mod entry;
mod store;

pub use self::entry::PinnedHandle;
pub use self::store::{LruStore, Merge};
