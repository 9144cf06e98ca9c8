//! Property tests for the countdown, checkpoint and end-of-level rules.

use maze_core::prelude::*;
use proptest::prelude::*;

fn dt_strategy() -> impl Strategy<Value = f32> {
    prop_oneof![Just(0.0f32), 0.0f32..2.0]
}

proptest! {
    // -- 1. Countdown formula ------------------------------------------------

    #[test]
    fn remaining_is_initial_minus_elapsed(
        initial in 1.0f32..300.0,
        dts in prop::collection::vec(dt_strategy(), 0..200),
    ) {
        let mut timer = CountdownTimer::new(TimerConfig { total_time: initial, ..TimerConfig::default() });
        let mut cmds = CommandBuffer::new();
        timer.begin(&mut cmds);

        let mut elapsed = 0.0f64;
        let mut expired_ticks = 0;
        for dt in dts {
            let was_running = timer.is_running();
            let signals = timer.tick(dt, &mut cmds);
            if was_running {
                elapsed += dt as f64;
            }
            let expected = (initial as f64 - elapsed).max(0.0);
            prop_assert!((timer.remaining() as f64 - expected).abs() < 1e-2);

            if signals.expired {
                expired_ticks += 1;
                prop_assert_eq!(timer.remaining(), 0.0);
            }
            // Running exactly until remaining first reaches zero.
            prop_assert_eq!(timer.is_running(), timer.remaining() > 0.0);
            cmds.clear();
        }
        prop_assert!(expired_ticks <= 1);
    }

    // -- 2. Warning idempotence ----------------------------------------------

    #[test]
    fn warning_plays_at_most_once_per_run(
        initial in 10.5f32..40.0,
        dts in prop::collection::vec(0.01f32..1.0, 1..300),
    ) {
        let mut timer = CountdownTimer::new(TimerConfig { total_time: initial, ..TimerConfig::default() });
        let mut cmds = CommandBuffer::new();
        timer.begin(&mut cmds);
        for dt in dts {
            timer.tick(dt, &mut cmds);
        }
        let warnings = cmds
            .kinds()
            .filter(|k| **k == HostCommand::PlayAudio(AudioCue::Warning))
            .count();
        let crossed = timer.remaining() <= 10.0;
        prop_assert_eq!(warnings, usize::from(crossed));
    }

    // -- 3. Display ----------------------------------------------------------

    #[test]
    fn clock_text_floors_whole_seconds(whole in 0u32..6000, frac in 0.0f32..0.9) {
        let text = format_clock(whole as f32 + frac);
        let (m, s) = text.split_once(':').unwrap();
        prop_assert!(m.len() >= 2);
        prop_assert_eq!(s.len(), 2);
        let total = m.parse::<u32>().unwrap() * 60 + s.parse::<u32>().unwrap();
        prop_assert_eq!(total, whole);
    }

    #[test]
    fn color_policy_is_pure(remaining in 0.0f32..400.0) {
        let color = TimerColor::for_remaining(remaining);
        let expected = if remaining > 180.0 {
            TimerColor::Green
        } else if remaining <= 30.0 {
            TimerColor::Red
        } else {
            TimerColor::White
        };
        prop_assert_eq!(color, expected);
    }

    // -- 4. Checkpoint round trip --------------------------------------------

    #[test]
    fn save_then_restore_is_exact(
        x in -100.0f32..100.0,
        z in -100.0f32..100.0,
        saved_time in 0.0f32..190.0,
        timer_before in 0.0f32..500.0,
        stopped in any::<bool>(),
    ) {
        let mut store = CheckpointStore::new();
        store.save(Position::new(x, 0.0, z), saved_time);

        let mut timer = CountdownTimer::new(TimerConfig { total_time: timer_before, ..TimerConfig::default() });
        if stopped {
            timer.stop();
        }
        let mut target = Position::new(-1.0, -1.0, -1.0);
        store.restore(&mut target, &mut timer).unwrap();

        prop_assert_eq!(target, Position::new(x, 0.0, z));
        prop_assert_eq!(timer.remaining(), saved_time);
    }

    // -- 5. End-of-level -----------------------------------------------------

    #[test]
    fn one_cue_then_deferred_scene_load(
        exit_first in any::<bool>(),
        dts in prop::collection::vec(0.0f32..0.5, 1..100),
    ) {
        let player = EntityId::new(0, 0);
        let mut end = EndOfLevel::new(EndingConfig::default(), player, 1, "MainMenu");
        if exit_first {
            end.on_zone_enter(player);
            end.caught();
        } else {
            end.caught();
            end.on_zone_enter(player);
        }

        let mut cmds = CommandBuffer::new();
        let mut load_at = None;
        for dt in dts {
            if let Some(request) = end.tick(dt, &mut cmds) {
                prop_assert!(load_at.is_none());
                prop_assert_eq!(request, SceneRequest::Named("MainMenu".to_owned()));
                load_at = Some(end.elapsed());
            }
        }

        let commands: Vec<_> = cmds.kinds().cloned().collect();
        let cues: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, k)| matches!(k, HostCommand::PlayAudio(_)))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(cues.len(), 1);
        prop_assert_eq!(&commands[cues[0]], &HostCommand::PlayAudio(AudioCue::Exit));

        if let Some(elapsed) = load_at {
            prop_assert!(elapsed > 2.0);
            let load_index = commands
                .iter()
                .position(|k| matches!(k, HostCommand::LoadScene(_)))
                .unwrap();
            prop_assert!(cues[0] < load_index);
        } else {
            prop_assert!(end.elapsed() <= 2.0);
        }
    }
}
