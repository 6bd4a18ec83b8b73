//! Splices a cut point into a two-subpass render pass and confirms the rewritten stream ends the
//! render pass, emits the insertion sentinel, and resumes with a patched variant.

mod support;

use footgraph::dependency::SubCmdIdx;
use footgraph::footprint::CommandKind;
use footgraph::resource_model::{CommandId, Handle};
use footgraph::splitter::{CommandSplitter, SplicedCommand};

use support::{trivial_attachment, trivial_subpass_descriptor};

fn idx(cmd_index: u32) -> SubCmdIdx {
    SubCmdIdx {
        submit: 0,
        submission_index: 0,
        cb_index: 0,
        cmd_index,
        secondary: None,
    }
}

#[test]
fn cut_mid_subpass_ends_and_reopens_the_render_pass() {
    let render_pass = Handle::from(1);
    let begin_label = footgraph::resource_model::ForwardPairedLabelId::new(0);

    let begin_cmd = CommandKind::BeginRenderPass {
        render_pass,
        descriptors: vec![trivial_subpass_descriptor()],
        views: vec![Handle::from(10)],
        full_image_data: vec![true],
        descriptions: vec![trivial_attachment()],
        initial_backings: vec![],
        begin_label,
    };
    let draw_cmd = CommandKind::Draw;
    let end_cmd = CommandKind::EndRenderPass;

    let commands = vec![
        (CommandId::new(0), idx(0)),
        (CommandId::new(1), idx(1)),
        (CommandId::new(2), idx(2)),
    ];

    let kinds = vec![begin_cmd, draw_cmd, end_cmd];
    let kind_of = |id: CommandId| kinds[id.index()].clone();
    let no_secondary = |_: Handle| Vec::new();

    // Cut right after the draw call, mid-subpass.
    let mut splitter = CommandSplitter::new(vec![idx(1)]);
    let spliced = splitter.rewrite_command_buffer(&commands, &kind_of, &no_secondary);

    assert!(matches!(spliced[0], SplicedCommand::Original(_))); // BeginRenderPass
    assert!(matches!(spliced[1], SplicedCommand::Original(_))); // Draw
    assert!(matches!(spliced[2], SplicedCommand::EndRenderPass));
    assert!(matches!(spliced[3], SplicedCommand::Insertion(_)));
    assert!(matches!(spliced[4], SplicedCommand::BeginRenderPass { .. }));
    assert!(matches!(spliced[5], SplicedCommand::Original(_))); // EndRenderPass
}

#[test]
fn no_cut_points_passes_commands_through_unchanged() {
    let commands = vec![(CommandId::new(0), idx(0)), (CommandId::new(1), idx(1))];
    let kinds = vec![CommandKind::Draw, CommandKind::Draw];
    let kind_of = |id: CommandId| kinds[id.index()].clone();
    let no_secondary = |_: Handle| Vec::new();

    let mut splitter = CommandSplitter::new(vec![]);
    let spliced = splitter.rewrite_command_buffer(&commands, &kind_of, &no_secondary);
    assert_eq!(spliced.len(), 2);
    assert!(spliced.iter().all(|c| matches!(c, SplicedCommand::Original(_))));
}

#[test]
fn rewrite_submission_interleaves_an_insert_buffer_before_cut_command_buffers() {
    let mut splitter = CommandSplitter::new(vec![]);
    let cb_a = Handle::from(1);
    let cb_b = Handle::from(2);
    let has_cut = |cb: Handle| cb == cb_a;

    let rewritten = splitter.rewrite_submission(&[cb_a, cb_b], has_cut);
    assert_eq!(rewritten.len(), 3);
    assert_eq!(rewritten[1], cb_a);
    assert_eq!(rewritten[2], cb_b);
}
