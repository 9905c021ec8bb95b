mod settings;

pub use settings::{CliConfig, GatewayConfig, StoreConfig};
