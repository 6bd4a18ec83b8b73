//! The [`Variable`] tagged union and the [`Behavior`] triple the dependency machine operates on.

use crate::resource_model::{
    BoundDataId, BoundDescriptorSetId, CommandId, DescriptorId, ForwardPairedLabelId, Handle,
    Label, MemorySpan, SubpassId,
};

/// A sub-command path: `[submit, submission-index, cb-index, cmd-index, (secondary-cb, sub-cmd)?]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SubCmdIdx {
    pub submit: u64,
    pub submission_index: u32,
    pub cb_index: u32,
    pub cmd_index: u32,
    pub secondary: Option<(u32, u32)>,
}

impl std::fmt::Display for SubCmdIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}:{}:{}",
            self.submit, self.submission_index, self.cb_index, self.cmd_index
        )?;
        if let Some((cb, cmd)) = self.secondary {
            write!(f, ":({cb}:{cmd})")?;
        }
        write!(f, "]")
    }
}

/// Closed tagged union over the abstract resource variables the footprint builder reads, writes
/// and modifies. Each of the arena-indexed variants carries identity-only equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Handle(Handle),
    Label(Label),
    Memory(MemorySpan),
    Command(CommandId),
    Subpass(SubpassId),
    BoundData(BoundDataId),
    Descriptor(DescriptorId),
    DescriptorSet(BoundDescriptorSetId),
    ForwardPairedLabel(ForwardPairedLabelId),
}

impl Variable {
    /// Null-handle reads/writes are silently ignored per the data model invariants; everything
    /// else is always significant.
    pub fn is_significant(&self) -> bool {
        !matches!(self, Variable::Handle(h) if h.is_null())
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Handle(h) => write!(f, "handle({:#x})", h.0),
            Variable::Label(_) => write!(f, "label"),
            Variable::Memory(m) => write!(f, "memory({:#x})[{}, {})", m.memory.0, m.span.start, m.span.end),
            Variable::Command(c) => write!(f, "command(#{})", c.index()),
            Variable::Subpass(s) => write!(f, "subpass(#{})", s.index()),
            Variable::BoundData(b) => write!(f, "bound_data(#{})", b.index()),
            Variable::Descriptor(d) => write!(f, "descriptor(#{})", d.index()),
            Variable::DescriptorSet(s) => write!(f, "descriptor_set(#{})", s.index()),
            Variable::ForwardPairedLabel(l) => write!(f, "forward_paired_label(#{})", l.index()),
        }
    }
}

/// A triple `(reads, writes, modifies)` over abstract resource variables, tagged with its source
/// sub-command index. `modifies` behaves as both a read and a write for liveness purposes: it
/// depends on the prior value (a read) and produces a new one (a write).
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub reads: Vec<Variable>,
    pub writes: Vec<Variable>,
    pub modifies: Vec<Variable>,
    pub source: SubCmdIdx,
    /// Set by the footprint builder for behaviors that must be treated as alive unconditionally
    /// (unknown commands, coherent-memory write-back, destroy/present pairs, ...).
    pub forced_alive: bool,
    /// Set when a mutation determined this command was malformed (`Error::Aborted`); emission
    /// continues but the behavior carries the taint.
    pub aborted: bool,
}

impl Behavior {
    pub fn new(source: SubCmdIdx) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    pub fn reading(mut self, vars: impl IntoIterator<Item = Variable>) -> Self {
        self.reads.extend(vars.into_iter().filter(Variable::is_significant));
        self
    }

    pub fn writing(mut self, vars: impl IntoIterator<Item = Variable>) -> Self {
        self.writes.extend(vars.into_iter().filter(Variable::is_significant));
        self
    }

    pub fn modifying(mut self, vars: impl IntoIterator<Item = Variable>) -> Self {
        self.modifies.extend(vars.into_iter().filter(Variable::is_significant));
        self
    }

    pub fn force_alive(mut self) -> Self {
        self.forced_alive = true;
        self
    }

    /// All variables this behavior writes or modifies — the "def" set for liveness purposes.
    pub fn defs(&self) -> impl Iterator<Item = &Variable> {
        self.writes.iter().chain(self.modifies.iter())
    }

    /// All variables this behavior reads or modifies — the "use" set for liveness purposes.
    pub fn uses(&self) -> impl Iterator<Item = &Variable> {
        self.reads.iter().chain(self.modifies.iter())
    }
}
