pub mod http_client;
pub mod rate_source;
pub mod translator;

pub use http_client::ReqwestFetcher;
pub use rate_source::HttpRateSource;
pub use translator::LibreTranslateClient;
