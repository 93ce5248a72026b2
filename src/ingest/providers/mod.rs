pub mod feed;
pub mod nws;

pub use feed::FeedProvider;
pub use nws::AlertProvider;
