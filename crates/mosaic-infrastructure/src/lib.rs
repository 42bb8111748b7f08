pub mod config;
pub mod http_client;
pub mod paths;
pub mod ws_transport;

pub use crate::config::MosaicConfig;
pub use crate::http_client::HttpMosaicClient;
pub use crate::paths::MosaicPaths;
pub use crate::ws_transport::WsLiveTransport;
