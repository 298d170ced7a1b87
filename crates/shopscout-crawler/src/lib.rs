pub mod browser;
pub mod cascade;
pub mod crawl;
pub mod error;
pub mod normalize;
pub mod observer;
pub mod parse;
pub mod recommend;
pub mod schema;
pub mod types;

pub use browser::BrowserPool;
pub use cascade::{Cascade, CascadeAttempt, CascadeOutcome};
pub use crawl::SiteCrawler;
pub use error::CrawlerError;
pub use observer::{HtmlDumpObserver, NoopObserver, PageObserver};
pub use recommend::Recommender;
pub use types::RawProduct;
