pub mod gateway;
pub mod metered_client;

pub use gateway::RpcChainGateway;
pub use metered_client::MeteredRpcClient;
