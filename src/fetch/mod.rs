mod fetcher;
mod http;

pub use self::fetcher::{FetchedPage, PageFetcher};
pub use self::http::HttpPageFetcher;
