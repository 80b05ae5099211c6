//! Lowering configuration.

/// Knobs for one [`lower_crate`](crate::lower_crate) run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowerOptions {
    /// Name given to the produced module.
    pub module_name: String,
    /// Aggregates larger than this many bytes are copied with a call to
    /// [`memcpy_symbol`](Self::memcpy_symbol) instead of a load/store pair.
    pub inline_copy_threshold: u64,
    /// External bulk-copy routine: `void (ptr mut u8, ptr u8, usize)`.
    pub memcpy_symbol: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            module_name: "main".to_owned(),
            inline_copy_threshold: 16,
            memcpy_symbol: "memcpy".to_owned(),
        }
    }
}
