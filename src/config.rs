/// Runtime knobs a hosting binary would otherwise hardcode.
///
/// These are capacity hints only — nothing here changes observable
/// behavior, just the initial allocation size of the internal concurrent
/// maps.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub initial_symbol_capacity: usize,
    pub initial_account_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_symbol_capacity: 16,
            initial_account_capacity: 256,
        }
    }
}

impl Config {
    /// Reads `EXCHANGE_SYMBOL_CAPACITY_HINT` / `EXCHANGE_ACCOUNT_CAPACITY_HINT`,
    /// falling back to [`Config::default`] values on a missing or
    /// unparsable var.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let initial_symbol_capacity = std::env::var("EXCHANGE_SYMBOL_CAPACITY_HINT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.initial_symbol_capacity);
        let initial_account_capacity = std::env::var("EXCHANGE_ACCOUNT_CAPACITY_HINT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.initial_account_capacity);
        Self {
            initial_symbol_capacity,
            initial_account_capacity,
        }
    }
}
