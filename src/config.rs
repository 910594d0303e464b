use std::sync::LazyLock;

use derive_from_env::FromEnv;

#[derive(FromEnv)]
#[from_env(prefix = "CFGLOG")]
#[allow(non_snake_case)]
pub struct CfgLogConfig {
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
}

pub static CFGLOG_CONFIG: LazyLock<CfgLogConfig> =
    LazyLock::new(|| CfgLogConfig::from_env().unwrap());
