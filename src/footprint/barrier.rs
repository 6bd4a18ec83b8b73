//! Pipeline-barrier touched-set derivation and fan-out: computing which data a barrier affects
//! from its raw description and `GlobalState`, then emitting one behavior per touched datum.

use crate::dependency::{Behavior, SubCmdIdx, Variable};
use crate::resource_model::{Handle, MemorySpan};
use crate::state::GlobalState;

/// What one pipeline-barrier entry specifically names, if anything.
#[derive(Debug, Clone, Copy)]
pub enum BarrierTarget {
    Buffer(MemorySpan),
    Image(Handle),
}

/// Compute the touched-data set for a pipeline barrier. A whole-memory barrier — `targets` empty
/// — touches every buffer and image currently known to `state`; otherwise each target contributes
/// exactly its own named buffer range or image.
pub fn compute_barrier_touched(state: &GlobalState, targets: &[BarrierTarget]) -> Vec<Variable> {
    if targets.is_empty() {
        let mut touched: Vec<Variable> = state.buffers.handles().map(Variable::Handle).collect();
        touched.extend(state.images.handles().map(Variable::Handle));
        touched
    } else {
        targets
            .iter()
            .map(|target| match target {
                BarrierTarget::Buffer(span) => Variable::Memory(*span),
                BarrierTarget::Image(handle) => Variable::Handle(*handle),
            })
            .collect()
    }
}

/// Emit one behavior per entry of `touched`, each reading every `attached_reads` variable and
/// modifying its own datum. A whole-memory barrier with `touched` containing every known image
/// and buffer thus fans out into one behavior per object, matching the "barrier touching three
/// buffers and two images emits exactly five behaviors" testable property.
pub fn emit_barrier_behaviors(touched: &[Variable], attached_reads: &[Variable], source: SubCmdIdx) -> Vec<Behavior> {
    touched
        .iter()
        .map(|&datum| {
            Behavior::new(source.clone())
                .reading(attached_reads.iter().copied())
                .modifying([datum])
        })
        .collect()
}
