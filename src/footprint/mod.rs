//! The Footprint Builder: dispatches on command kind, producing either an immediate behavior, a
//! deferred command-buffer record, or a queued submission — and drains submissions into concrete
//! behaviors once a replay callback reports which sub-commands actually executed.

pub mod barrier;
pub mod coherent;
pub mod command;

use std::collections::{HashMap, VecDeque};

use crate::config::FootprintBuilderConfig;
use crate::dependency::{Behavior, SubCmdIdx, Variable};
use crate::queue_exec::{CbLevel, QueueExecutor};
use crate::resource_model::{BoundDescriptorSetId, CommandId, Descriptor, Handle, Label};

pub use command::{CommandKind, CommandRecord};
pub use coherent::CoherentMemoryTracker;

/// One pending (recorded but not yet rolled out) sub-command, FIFO-ordered per submit.
#[derive(Debug, Clone)]
struct PendingCommand {
    cb: Handle,
    cmd: CommandId,
    level: CbLevel,
    index: SubCmdIdx,
}

/// Per-submit bookkeeping: execution-begin/end labels, wait/signal semaphores, signal fence, and
/// the FIFO of commands this submit will roll out once the replay callback confirms execution.
#[derive(Debug, Clone)]
pub struct QueueSubmitInfo {
    pub queue: Handle,
    pub execution_begin_label: Label,
    pub execution_end_label: Label,
    pub wait_semaphores: Vec<Handle>,
    pub signal_semaphores: Vec<Handle>,
    pub signal_fence: Option<Handle>,
    pending: VecDeque<PendingCommand>,
}

/// Walks a command stream and builds the footprint: the full list of emitted [`Behavior`]s plus
/// the arena of recorded command-buffer commands they reference.
#[derive(Debug)]
pub struct FootprintBuilder {
    pub config: FootprintBuilderConfig,
    pub behaviors: Vec<Behavior>,
    commands: Vec<CommandRecord>,
    cb_records: HashMap<Handle, Vec<CommandId>>,
    coherent: CoherentMemoryTracker,
    /// This builder's own label counter, seeded from `config.label_seed`. Every label minted
    /// during this builder's command emission comes from here, so two independently-constructed
    /// builders never interleave ranges by accident of call order, and `label_seed` lets a caller
    /// stitch multiple builders' ranges together deterministically.
    next_label: u64,
}

impl Default for FootprintBuilder {
    fn default() -> Self {
        Self::new(FootprintBuilderConfig::default())
    }
}

impl FootprintBuilder {
    pub fn new(config: FootprintBuilderConfig) -> Self {
        let next_label = config.label_seed;
        Self {
            config,
            behaviors: Vec::new(),
            commands: Vec::new(),
            cb_records: HashMap::new(),
            coherent: CoherentMemoryTracker::default(),
            next_label,
        }
    }

    /// Mint the next label from this builder's own counter, seeded from `config.label_seed`.
    pub fn mint_label(&mut self) -> Label {
        let value = self.next_label;
        self.next_label += 1;
        Label::from_raw(value)
    }

    /// Immediate command: produces exactly one behavior at this position in the stream.
    pub fn record_immediate(&mut self, behavior: Behavior) {
        self.behaviors.push(behavior);
    }

    /// Recording command: append to the owning buffer's record list, reading the buffer's begin
    /// label and writing the freshly-allocated command id.
    pub fn record_into_command_buffer(&mut self, cb: Handle, begin_label: Label, kind: CommandKind, source: SubCmdIdx) -> CommandId {
        let id = CommandId::new(self.commands.len());
        self.commands.push(CommandRecord::new(kind));
        self.cb_records.entry(cb).or_default().push(id);

        self.behaviors.push(
            Behavior::new(source)
                .reading([Variable::Label(begin_label)])
                .writing([Variable::Command(id)]),
        );
        id
    }

    /// A pipeline-barrier or any immediate command whose read observations may overlap currently
    /// host-mapped coherent memory: additionally write the intersected ranges and force the
    /// behavior alive, per the coherent-memory write-back rule.
    pub fn apply_coherent_observations(&self, behavior: Behavior, reads: &[(Handle, crate::interval::Span)]) -> Behavior {
        if !self.config.track_coherent_memory {
            return behavior;
        }
        let mut extra_writes = Vec::new();
        for &(memory, span) in reads {
            for hit in self.coherent.intersect_mapped(memory, span) {
                extra_writes.push(Variable::Memory(crate::resource_model::MemorySpan { memory, span: hit }));
            }
        }
        if extra_writes.is_empty() {
            behavior
        } else {
            behavior.writing(extra_writes).force_alive()
        }
    }

    pub fn map_coherent(&mut self, memory: Handle, offset: u64, size: u64) {
        self.coherent.map(memory, offset, size);
    }

    pub fn unmap_coherent(&mut self, memory: Handle, offset: u64, size: u64) {
        self.coherent.unmap(memory, offset, size);
    }

    /// Build a `QueueSubmitInfo` by enumerating submission → command-buffer → primary-cmd →
    /// (secondary-cb → secondary-cmd), pushing every command into the pending FIFO in exact
    /// traversal order, and emit the submit's begin behavior.
    pub fn submit(
        &mut self,
        queue: Handle,
        submit_id: u64,
        submissions: &[Vec<Handle>],
        wait_semaphores: Vec<Handle>,
        signal_semaphores: Vec<Handle>,
        signal_fence: Option<Handle>,
        source: SubCmdIdx,
    ) -> QueueSubmitInfo {
        let mut pending = VecDeque::new();

        for (submission_index, cbs) in submissions.iter().enumerate() {
            for (cb_index, &cb) in cbs.iter().enumerate() {
                let Some(cmds) = self.cb_records.get(&cb) else { continue };
                for (cmd_index, &cmd_id) in cmds.iter().enumerate() {
                    let record = &self.commands[cmd_id.index()];
                    let idx = SubCmdIdx {
                        submit: submit_id,
                        submission_index: submission_index as u32,
                        cb_index: cb_index as u32,
                        cmd_index: cmd_index as u32,
                        secondary: None,
                    };
                    if record.is_execute_commands {
                        for (sec_cb_idx, &sec_cb) in record.secondary_cbs.iter().enumerate() {
                            let Some(sec_cmds) = self.cb_records.get(&sec_cb) else { continue };
                            for (sec_cmd_idx, &sec_cmd_id) in sec_cmds.iter().enumerate() {
                                pending.push_back(PendingCommand {
                                    cb: sec_cb,
                                    cmd: sec_cmd_id,
                                    level: CbLevel::Secondary,
                                    index: SubCmdIdx {
                                        secondary: Some((sec_cb_idx as u32, sec_cmd_idx as u32)),
                                        ..idx.clone()
                                    },
                                });
                            }
                        }
                    } else {
                        pending.push_back(PendingCommand {
                            cb,
                            cmd: cmd_id,
                            level: CbLevel::Primary,
                            index: idx,
                        });
                    }
                }
            }
        }

        let begin_label = self.mint_label();
        let end_label = self.mint_label();

        let mut reads = wait_semaphores.iter().map(|&s| Variable::Handle(s)).collect::<Vec<_>>();
        if let Some(fence) = signal_fence {
            reads.push(Variable::Handle(fence));
        }
        self.behaviors
            .push(Behavior::new(source).reading(reads).writing([Variable::Label(begin_label)]));

        QueueSubmitInfo {
            queue,
            execution_begin_label: begin_label,
            execution_end_label: end_label,
            wait_semaphores,
            signal_semaphores,
            signal_fence,
            pending,
        }
    }

    /// Drain `submit`'s pending FIFO in the order `executed` reports, validating each popped
    /// command's index matches, invoking its closure against `exec`. Returns
    /// [`crate::Error::OrderingViolation`] (logged, submit abandoned) on mismatch.
    pub fn roll_out_submit(
        &mut self,
        submit: &mut QueueSubmitInfo,
        executed: &[SubCmdIdx],
        exec: &mut QueueExecutor,
        descriptor_lookup: &impl Fn(BoundDescriptorSetId) -> Vec<(u32, u32, Descriptor)>,
    ) -> Vec<Behavior> {
        let mut out = Vec::new();
        let conservative_unknowns = self.config.conservative_unknowns;
        for expected in executed {
            let Some(front) = submit.pending.pop_front() else {
                error!("queue execution info has no more pending commands but replay reported another executed sub-command");
                break;
            };
            if &front.index != expected {
                error!(
                    "ordering violation: expected sub-command `{}`, got `{}`",
                    front.index, expected
                );
                break;
            }
            trace!("rolling out sub-command {}", front.index);
            let record = self.commands[front.cmd.index()].clone();
            let mut mint_label = || {
                let value = self.next_label;
                self.next_label += 1;
                Label::from_raw(value)
            };
            out.extend(record.roll_out(
                exec,
                front.level,
                front.index.clone(),
                descriptor_lookup,
                &mut mint_label,
                conservative_unknowns,
            ));
        }

        if submit.pending.is_empty() {
            let mut writes: Vec<Variable> = submit.signal_semaphores.iter().map(|&s| Variable::Handle(s)).collect();
            if let Some(fence) = submit.signal_fence {
                writes.push(Variable::Handle(fence));
            }
            writes.push(Variable::Label(submit.execution_end_label));
            out.push(Behavior::new(executed.last().cloned().unwrap_or_default()).writing(writes));
        }
        out
    }

    /// Build a pipeline-barrier command kind, computing its touched-data set from `targets`
    /// against `state`: a whole-memory barrier (`targets` empty) touches every known buffer and
    /// image, otherwise each target contributes exactly its own named buffer range or image.
    /// Ready to record via [`Self::record_into_command_buffer`].
    pub fn pipeline_barrier_kind(&self, state: &crate::state::GlobalState, targets: &[barrier::BarrierTarget], attached_reads: Vec<Variable>) -> CommandKind {
        CommandKind::PipelineBarrier {
            touched: barrier::compute_barrier_touched(state, targets),
            attached_reads,
        }
    }

    /// For a presented swapchain image: emit the forced-alive behavior that reads the image's
    /// acquire label and writes its present label, keeping the acquire→present cycle alive in the
    /// dependency graph regardless of downstream image reads. Unlike a recorded `vkCmd*`, a
    /// present happens directly on the queue, so this builds and rolls the command out in one
    /// step rather than deferring it to a submit's pending FIFO.
    pub fn record_present(&mut self, acquire_label: Label, present_label: Label, source: SubCmdIdx) {
        let record = CommandRecord::new(CommandKind::Present { acquire_label, present_label });
        let mut exec = QueueExecutor::new();
        let mut unused_mint = Label::new;
        let behaviors = record.roll_out(&mut exec, CbLevel::Primary, source, |_| vec![], &mut unused_mint, self.config.conservative_unknowns);
        self.behaviors.extend(behaviors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FootprintBuilderConfigBuilder;
    use crate::resource_model::Handle;

    #[test]
    fn label_seed_determines_first_minted_label() {
        let mut builder = FootprintBuilder::new(FootprintBuilderConfigBuilder::new().label_seed(100).build());
        let first = builder.mint_label();
        let second = builder.mint_label();
        assert_eq!(first, Label::from_raw(100));
        assert_eq!(second, Label::from_raw(101));
    }

    #[test]
    fn two_builders_with_the_same_seed_mint_the_same_sequence() {
        let mut a = FootprintBuilder::new(FootprintBuilderConfigBuilder::new().label_seed(5).build());
        let mut b = FootprintBuilder::new(FootprintBuilderConfigBuilder::new().label_seed(5).build());
        assert_eq!(a.mint_label(), b.mint_label());
        assert_eq!(a.mint_label(), b.mint_label());
    }

    #[test]
    fn present_emits_forced_alive_behavior_reading_acquire_and_writing_present() {
        let mut builder = FootprintBuilder::new(FootprintBuilderConfig::default());
        let acquire = builder.mint_label();
        let present = builder.mint_label();
        builder.record_present(acquire, present, SubCmdIdx::default());
        assert_eq!(builder.behaviors.len(), 1);
        let behavior = &builder.behaviors[0];
        assert!(behavior.forced_alive);
        assert_eq!(behavior.reads, vec![Variable::Label(acquire)]);
        assert_eq!(behavior.writes, vec![Variable::Label(present)]);
    }

    #[test]
    fn unknown_command_is_force_alive_only_when_conservative() {
        let mut builder = FootprintBuilder::new(FootprintBuilderConfigBuilder::new().conservative_unknowns(false).build());
        let cb = Handle::from(1);
        let begin = builder.mint_label();
        builder.record_into_command_buffer(cb, begin, CommandKind::Unknown, SubCmdIdx::default());
        let mut submit = builder.submit(Handle::from(9), 0, &[vec![cb]], vec![], vec![], None, SubCmdIdx::default());
        let executed = vec![SubCmdIdx::default()];
        let mut exec = QueueExecutor::new();
        let no_descriptors = |_: BoundDescriptorSetId| vec![];
        let rolled_out = builder.roll_out_submit(&mut submit, &executed, &mut exec, &no_descriptors);
        assert!(!rolled_out[0].forced_alive);
    }

    #[test]
    fn immediate_command_produces_one_behavior() {
        let mut builder = FootprintBuilder::new(FootprintBuilderConfig::default());
        builder.record_immediate(Behavior::new(SubCmdIdx::default()).writing([Variable::Handle(Handle::from(1))]));
        assert_eq!(builder.behaviors.len(), 1);
    }

    #[test]
    fn recording_command_reads_begin_label_and_writes_command_id() {
        let mut builder = FootprintBuilder::new(FootprintBuilderConfig::default());
        let cb = Handle::from(1);
        let begin = Label::new();
        builder.record_into_command_buffer(cb, begin, CommandKind::Draw, SubCmdIdx::default());
        assert_eq!(builder.behaviors.len(), 1);
        assert_eq!(builder.behaviors[0].reads, vec![Variable::Label(begin)]);
        assert_eq!(builder.behaviors[0].writes.len(), 1);
    }

    #[test]
    fn submit_enumerates_commands_in_traversal_order() {
        let mut builder = FootprintBuilder::new(FootprintBuilderConfig::default());
        let cb = Handle::from(1);
        let begin = Label::new();
        builder.record_into_command_buffer(cb, begin, CommandKind::Draw, SubCmdIdx::default());
        builder.record_into_command_buffer(cb, begin, CommandKind::EndRenderPass, SubCmdIdx::default());

        let submit = builder.submit(Handle::from(99), 0, &[vec![cb]], vec![], vec![], None, SubCmdIdx::default());
        let indices: Vec<_> = submit.pending.iter().map(|p| p.index.cmd_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
