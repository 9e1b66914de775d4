//! Compile-time tuning knobs.

/// Configuration for decoders and packet-number spaces.
pub trait CodecConfig {
    /// Destination connection ID length assumed when decoding short headers.
    ///
    /// Short headers carry no length prefix; the receiver has to know the
    /// length of the connection IDs it issued.
    const SHORT_HEADER_DCID_LEN: usize;
    /// How long acknowledged sent entries and received entries are kept
    /// before `cleanup` evicts them, in microseconds.
    const LEDGER_RETENTION_US: u64;
    /// Default reordering threshold for `detect_loss`.
    const LOSS_THRESHOLD: u64;
}

/// Default configuration: 8-byte short-header DCIDs, 60 s retention.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl CodecConfig for DefaultConfig {
    const SHORT_HEADER_DCID_LEN: usize = 8;
    const LEDGER_RETENTION_US: u64 = 60_000_000;
    const LOSS_THRESHOLD: u64 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        assert_eq!(DefaultConfig::SHORT_HEADER_DCID_LEN, 8);
        assert_eq!(DefaultConfig::LEDGER_RETENTION_US, 60_000_000);
        assert_eq!(DefaultConfig::LOSS_THRESHOLD, 3);
    }
}
