// Node configuration: resolves the on-disk chain directory.
//
// CLIQUECHAIN_NODE names the node and is substituted into the data
// directory, the way a running daemon would pick distinct directories for
// mainnet/testnet/multi-node-on-one-host setups (spec §6: "a single
// environment variable names the node").

/// Default node name when `CLIQUECHAIN_NODE` is unset.
pub const DEFAULT_NODE_NAME: &str = "mainnet";

/// Directory (relative to `$HOME`) holding all node data.
pub const DATA_DIR_ROOT: &str = ".cliquechain";

pub struct NodeConfig {
    pub node_name: String,
    pub data_dir: std::path::PathBuf,
}

impl NodeConfig {
    pub fn from_env() -> Self {
        let node_name = std::env::var("CLIQUECHAIN_NODE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string());
        let data_dir = resolve_home_dir().join(DATA_DIR_ROOT).join(&node_name);
        NodeConfig { node_name, data_dir }
    }

    pub fn chain_store_path(&self) -> std::path::PathBuf {
        self.data_dir.join("chaindata")
    }
}

fn resolve_home_dir() -> std::path::PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        if !home.trim().is_empty() {
            return std::path::PathBuf::from(home);
        }
    }
    #[cfg(windows)]
    {
        if let Ok(home) = std::env::var("USERPROFILE") {
            if !home.trim().is_empty() {
                return std::path::PathBuf::from(home);
            }
        }
    }
    std::path::PathBuf::from(".")
}
