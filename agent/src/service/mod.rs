//! サービス層
//!
//! RPCから受け取ったアクションを名前でエンドポイントに振り分ける。
//! 未登録の名前は `EndpointNotFound` を返し、エンドポイントには届かない。

pub mod command;
pub mod http_client;
pub mod http_server;

pub use command::CommandService;
pub use http_client::HttpClientService;
pub use http_server::HttpServerService;
