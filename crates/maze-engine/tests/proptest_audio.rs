//! Property tests for pause/resume against the host audio mixer.

use maze_engine::prelude::*;
use proptest::prelude::*;

fn cue_strategy() -> impl Strategy<Value = AudioCue> {
    prop::sample::select(AudioCue::ALL.to_vec())
}

fn audio_op_strategy() -> impl Strategy<Value = HostCommand> {
    prop_oneof![
        cue_strategy().prop_map(HostCommand::PlayAudio),
        cue_strategy().prop_map(HostCommand::StopAudio),
    ]
}

fn apply(host: &mut Host, cmds: &mut CommandBuffer) {
    host.apply_all(&cmds.take());
}

proptest! {
    // -- 1. Round trip ---------------------------------------------------------

    #[test]
    fn pause_then_resume_restores_playing_set(
        ops in prop::collection::vec(audio_op_strategy(), 0..40),
    ) {
        let mut host = Host::new(0);
        let mut cmds = CommandBuffer::new();
        for op in ops {
            cmds.push(op, SystemId::SESSION, Cause::GameRule("setup".to_owned()));
        }
        apply(&mut host, &mut cmds);
        let before = host.audio().playing();

        let mut clock = ClockMultiplier::NORMAL;
        let mut menu = PauseMenu::new("MainMenu");
        menu.pause(&mut clock, &mut cmds);
        apply(&mut host, &mut cmds);
        prop_assert!(clock.is_frozen());
        prop_assert!(host.audio().playing().is_empty());
        for cue in &before {
            prop_assert_eq!(host.audio().state(*cue), SourceState::Paused);
        }

        menu.resume(&mut clock, &mut cmds);
        apply(&mut host, &mut cmds);
        prop_assert_eq!(clock, ClockMultiplier::NORMAL);
        prop_assert_eq!(host.audio().playing(), before);
    }

    // -- 2. Toggle parity ------------------------------------------------------

    #[test]
    fn toggle_parity_decides_pause_state(toggles in 0usize..12) {
        let mut host = Host::new(0);
        let mut cmds = CommandBuffer::new();
        cmds.push(HostCommand::PlayAudio(AudioCue::Ambience), SystemId::SESSION, Cause::GameRule("setup".to_owned()));
        apply(&mut host, &mut cmds);

        let mut clock = ClockMultiplier::NORMAL;
        let mut menu = PauseMenu::new("MainMenu");
        for _ in 0..toggles {
            menu.toggle(&mut clock, &mut cmds);
            apply(&mut host, &mut cmds);
        }

        let paused = toggles % 2 == 1;
        prop_assert_eq!(menu.is_paused(), paused);
        prop_assert_eq!(clock.is_frozen(), paused);
        prop_assert_eq!(host.audio().is_playing(AudioCue::Ambience), !paused);
        prop_assert_eq!(host.audio().play_count(AudioCue::Ambience), 1);
    }
}
