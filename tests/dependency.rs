//! Integration-level liveness scenarios spanning several behaviors, as opposed to the
//! single-behavior unit tests colocated with `dependency::mod`.

use footgraph::prelude::*;

fn h(v: u64) -> Variable {
    Variable::Handle(Handle::from(v))
}

#[test]
fn a_chain_of_writes_and_reads_keeps_only_the_reachable_prefix_alive() {
    // write(1) -> write(2) reading(1) -> read(2). Write(1) is alive because write(2) reads it;
    // write(2) is alive because the final read reads it.
    let behaviors = vec![
        Behavior::new(SubCmdIdx::default()).writing([h(1)]),
        Behavior::new(SubCmdIdx::default()).reading([h(1)]).writing([h(2)]),
        Behavior::new(SubCmdIdx::default()).reading([h(2)]),
    ];
    let alive = DependencyMachine::compute_liveness(&behaviors);
    assert_eq!(alive, vec![true, true, true]);
}

#[test]
fn an_orphaned_side_branch_is_pruned() {
    // write(1) and write(2) both happen, but only (2) is ever read.
    let behaviors = vec![
        Behavior::new(SubCmdIdx::default()).writing([h(1)]),
        Behavior::new(SubCmdIdx::default()).writing([h(2)]),
        Behavior::new(SubCmdIdx::default()).reading([h(2)]),
    ];
    let alive = DependencyMachine::compute_liveness(&behaviors);
    assert_eq!(alive, vec![false, true, true]);
}

#[test]
fn modify_both_reads_and_redefines_so_earlier_writer_stays_alive() {
    let behaviors = vec![
        Behavior::new(SubCmdIdx::default()).writing([h(1)]),
        Behavior::new(SubCmdIdx::default()).modifying([h(1)]),
        Behavior::new(SubCmdIdx::default()).reading([h(1)]),
    ];
    let alive = DependencyMachine::compute_liveness(&behaviors);
    assert_eq!(alive, vec![true, true, true]);
}

#[test]
fn framebuffer_request_seeds_a_use_without_a_real_reader() {
    let mut machine = DependencyMachine::new();
    machine.framebuffer_request(&[h(1)]);
    let behavior = Behavior::new(SubCmdIdx::default()).writing([h(1)]);
    assert!(machine.is_alive(&behavior));
}
