//! Top-level configuration for a [`FootprintBuilder`](crate::footprint::FootprintBuilder): a plain
//! settings struct plus a consuming builder.

/// Settings controlling how a footprint is built and how its liveness is computed.
#[derive(Debug, Clone)]
pub struct FootprintBuilderConfig {
    /// Treat host-visible, host-coherent memory ranges mapped for the duration of a command
    /// buffer's recording as written at submission time, not just at explicit map/unmap
    /// boundaries.
    pub track_coherent_memory: bool,
    /// Treat commands this crate does not recognize as conservatively alive rather than eligible
    /// for dead-code elimination.
    pub conservative_unknowns: bool,
    /// Initial seed for the label counter. Set to a value greater than any label minted by a
    /// previous builder when stitching multiple analysis runs together deterministically.
    pub label_seed: u64,
}

impl Default for FootprintBuilderConfig {
    fn default() -> Self {
        Self {
            track_coherent_memory: true,
            conservative_unknowns: true,
            label_seed: 1,
        }
    }
}

/// Consuming builder for [`FootprintBuilderConfig`] using `self -> Self` method chaining.
#[derive(Debug, Clone, Default)]
pub struct FootprintBuilderConfigBuilder {
    inner: FootprintBuilderConfig,
}

impl FootprintBuilderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_coherent_memory(mut self, value: bool) -> Self {
        self.inner.track_coherent_memory = value;
        self
    }

    pub fn conservative_unknowns(mut self, value: bool) -> Self {
        self.inner.conservative_unknowns = value;
        self
    }

    pub fn label_seed(mut self, value: u64) -> Self {
        self.inner.label_seed = value;
        self
    }

    pub fn build(self) -> FootprintBuilderConfig {
        self.inner
    }
}
