//! The back-propagation engine: holds the live-set, answers liveness queries, and records the
//! effects of each emitted [`Behavior`] as the footprint is walked in reverse.
//!
//! Dead-code elimination over an emitted footprint is a classic backward liveness problem: a
//! write is alive iff some later, still-alive behavior reads (uses) the value it produced. This
//! module walks the emitted behavior list from the last sub-command to the first, maintaining a
//! live-set per resource variant (one `HashSet`/map per variant), and answers `is_alive` before
//! applying each behavior's effects.

pub mod behavior;
pub mod graphviz;

use std::collections::{HashMap, HashSet};

use crate::interval::{self, Span};
use crate::resource_model::{ForwardPairedLabelId, Handle};

pub use behavior::{Behavior, SubCmdIdx, Variable};

/// One liveness set per resource variant, as described in component 4.D.
#[derive(Debug, Default)]
struct LiveSets {
    handles: HashSet<Handle>,
    labels: HashSet<crate::resource_model::Label>,
    memory: HashMap<Handle, Vec<Span>>,
    commands: HashSet<crate::resource_model::CommandId>,
    subpasses: HashSet<crate::resource_model::SubpassId>,
    bound_data: HashSet<crate::resource_model::BoundDataId>,
    descriptors: HashSet<crate::resource_model::DescriptorId>,
    descriptor_sets: HashSet<crate::resource_model::BoundDescriptorSetId>,
    forward_paired_labels: HashSet<ForwardPairedLabelId>,
    /// Device-memory handles touched by any memory def, tracked separately since defining a span
    /// also marks the *owning* memory handle as used.
    used_memories: HashSet<Handle>,
}

impl LiveSets {
    fn contains(&self, var: &Variable) -> bool {
        match var {
            Variable::Handle(h) => self.handles.contains(h),
            Variable::Label(l) => self.labels.contains(l),
            Variable::Memory(m) => {
                let Some(list) = self.memory.get(&m.memory) else { return false };
                interval::intersect(list, m.span).1 > 0
            }
            Variable::Command(c) => self.commands.contains(c),
            Variable::Subpass(s) => self.subpasses.contains(s),
            Variable::BoundData(b) => self.bound_data.contains(b),
            Variable::Descriptor(d) => self.descriptors.contains(d),
            Variable::DescriptorSet(s) => self.descriptor_sets.contains(s),
            Variable::ForwardPairedLabel(l) => self.forward_paired_labels.contains(l),
        }
    }

    /// Apply a *use* (read): add the variable back into the live set.
    fn apply_use(&mut self, var: &Variable) {
        match var {
            Variable::Handle(h) => {
                self.handles.insert(*h);
            }
            Variable::Label(l) => {
                self.labels.insert(*l);
            }
            Variable::Memory(m) => {
                let list = self.memory.entry(m.memory).or_default();
                interval::merge(list, m.span, true);
            }
            Variable::Command(c) => {
                self.commands.insert(*c);
            }
            Variable::Subpass(s) => {
                self.subpasses.insert(*s);
            }
            Variable::BoundData(b) => {
                self.bound_data.insert(*b);
            }
            Variable::Descriptor(d) => {
                self.descriptors.insert(*d);
            }
            Variable::DescriptorSet(s) => {
                self.descriptor_sets.insert(*s);
            }
            Variable::ForwardPairedLabel(l) => {
                self.forward_paired_labels.insert(*l);
            }
        }
    }

    /// Apply a *def* (write): remove the variable from the live set.
    fn apply_def(&mut self, var: &Variable) {
        match var {
            Variable::Handle(h) => {
                self.handles.remove(h);
            }
            Variable::Label(l) => {
                self.labels.remove(l);
            }
            Variable::Memory(m) => {
                let list = self.memory.entry(m.memory).or_default();
                interval::remove(list, m.span);
                self.used_memories.insert(m.memory);
            }
            Variable::Command(c) => {
                self.commands.remove(c);
            }
            Variable::Subpass(s) => {
                self.subpasses.remove(s);
            }
            Variable::BoundData(b) => {
                self.bound_data.remove(b);
            }
            Variable::Descriptor(d) => {
                self.descriptors.remove(d);
            }
            Variable::DescriptorSet(s) => {
                self.descriptor_sets.remove(s);
            }
            Variable::ForwardPairedLabel(l) => {
                self.forward_paired_labels.remove(l);
            }
        }
    }
}

/// Holds the live-set and answers liveness queries for a footprint's behaviors, one behavior at a
/// time, in emission-reverse order.
pub struct DependencyMachine {
    live: LiveSets,
    /// For each forward-paired label, the indices (into the behavior list passed to
    /// [`DependencyMachine::compute_liveness`]) of every behavior that reads it.
    forward_pair_readers: HashMap<ForwardPairedLabelId, Vec<usize>>,
}

impl DependencyMachine {
    pub fn new() -> Self {
        Self {
            live: LiveSets::default(),
            forward_pair_readers: HashMap::new(),
        }
    }

    /// True iff any write of `behavior` is currently defined (i.e. something processed so far in
    /// the reverse walk still needs it).
    pub fn is_alive(&self, behavior: &Behavior) -> bool {
        behavior.forced_alive || behavior.defs().any(|v| self.live.contains(v))
    }

    /// Force-use all of the given variables, typically the framebuffer image backings recorded
    /// by `behavior`. Used to seed interactive liveness queries (e.g. "keep whatever was drawn to
    /// this attachment alive even with no further reads").
    pub fn framebuffer_request(&mut self, vars: &[Variable]) {
        for v in vars {
            self.live.apply_use(v);
        }
    }

    /// Record the effects of `behavior`: def each write/modify, use each read/modify. Returns the
    /// indices of any behaviors transitively kept alive because a forward-paired label they read
    /// was defined here while still alive.
    pub fn record_behavior_effects(&mut self, behavior: &Behavior) -> Vec<usize> {
        let mut extra_alive = Vec::new();
        for def in behavior.defs() {
            if let Variable::ForwardPairedLabel(label) = def {
                if self.live.contains(def) {
                    if let Some(readers) = self.forward_pair_readers.get(label) {
                        extra_alive.extend(readers.iter().copied());
                    }
                }
            }
            self.live.apply_def(def);
        }
        for u in behavior.uses() {
            self.live.apply_use(u);
        }
        extra_alive
    }

    /// Compute the alive/dead tag for every behavior in `behaviors`, given in original emission
    /// order. Runs the backward pass described in 4.D and resolves forward-paired label cascades
    /// so that every reader of a kept-alive label is reported exactly once.
    pub fn compute_liveness(behaviors: &[Behavior]) -> Vec<bool> {
        let mut machine = Self::new();

        // First pass (forward): register every reader of a forward-paired label so the backward
        // pass can cascade aliveness to them when the label is defined.
        for (idx, behavior) in behaviors.iter().enumerate() {
            for read in behavior.uses() {
                if let Variable::ForwardPairedLabel(label) = read {
                    machine.forward_pair_readers.entry(*label).or_default().push(idx);
                }
            }
        }

        let mut alive = vec![false; behaviors.len()];
        for (idx, behavior) in behaviors.iter().enumerate().rev() {
            let this_alive = machine.is_alive(behavior);
            alive[idx] = this_alive;
            let extra = machine.record_behavior_effects(behavior);
            for reader_idx in extra {
                alive[reader_idx] = true;
            }
        }
        alive
    }
}

impl Default for DependencyMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_model::{ArenaId, Handle};

    fn h(v: u64) -> Variable {
        Variable::Handle(Handle::from(v))
    }

    #[test]
    fn unread_write_is_dead() {
        let behaviors = vec![Behavior::new(SubCmdIdx::default()).writing([h(1)])];
        let alive = DependencyMachine::compute_liveness(&behaviors);
        assert_eq!(alive, vec![false]);
    }

    #[test]
    fn write_then_read_is_alive() {
        let behaviors = vec![
            Behavior::new(SubCmdIdx::default()).writing([h(1)]),
            Behavior::new(SubCmdIdx::default()).reading([h(1)]),
        ];
        let alive = DependencyMachine::compute_liveness(&behaviors);
        assert_eq!(alive, vec![true, false]);
    }

    #[test]
    fn forced_alive_behavior_stays_alive_with_no_readers() {
        let behaviors = vec![Behavior::new(SubCmdIdx::default()).writing([h(1)]).force_alive()];
        let alive = DependencyMachine::compute_liveness(&behaviors);
        assert_eq!(alive, vec![true]);
    }

    #[test]
    fn forward_paired_label_keeps_all_readers_alive() {
        let label: ForwardPairedLabelId = ArenaId::new(0);
        let behaviors = vec![
            // def of the forward-paired label, force-alive (e.g. an acquire/present pair root)
            Behavior::new(SubCmdIdx::default())
                .writing([Variable::ForwardPairedLabel(label)])
                .force_alive(),
            // two readers, neither otherwise kept alive
            Behavior::new(SubCmdIdx::default()).reading([Variable::ForwardPairedLabel(label)]),
            Behavior::new(SubCmdIdx::default()).reading([Variable::ForwardPairedLabel(label)]),
        ];
        let alive = DependencyMachine::compute_liveness(&behaviors);
        assert_eq!(alive, vec![true, true, true]);
    }

    #[test]
    fn null_handle_never_produces_a_behavior_effect() {
        let behaviors = vec![Behavior::new(SubCmdIdx::default()).writing([Variable::Handle(Handle::NULL)])];
        assert!(behaviors[0].writes.is_empty());
        let alive = DependencyMachine::compute_liveness(&behaviors);
        assert_eq!(alive, vec![false]);
    }

    #[test]
    fn memory_span_def_is_interval_subtraction() {
        let mem = Handle::from(7);
        let full = Variable::Memory(crate::resource_model::MemorySpan {
            memory: mem,
            span: Span::new(0, 100),
        });
        let partial_read = Variable::Memory(crate::resource_model::MemorySpan {
            memory: mem,
            span: Span::new(40, 60),
        });
        let behaviors = vec![
            Behavior::new(SubCmdIdx::default()).writing([full]),
            Behavior::new(SubCmdIdx::default()).reading([partial_read]),
        ];
        let alive = DependencyMachine::compute_liveness(&behaviors);
        assert_eq!(alive, vec![true, false]);
    }
}
