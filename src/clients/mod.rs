pub mod asset_client;
pub mod gateway_client;
pub mod llm_client;

pub use asset_client::{AssetProbe, HttpAssetProbe};
pub use gateway_client::{AnalyzeBackend, GatewayClient};
pub use llm_client::{ChatModel, OpenAiChatModel};
