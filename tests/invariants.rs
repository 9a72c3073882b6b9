//! Property tests over whole rounds driven by arbitrary input

use glam::Vec2;
use proptest::prelude::*;
use token_rush::replay::{Replay, ReplayFrame, ReplayPlayer, ReplayRecorder};
use token_rush::sim::{HazardBehavior, SimulationState, TickInput, initialize_round, tick};
use token_rush::{DeviceProfile, SimulationConfig};

const EPSILON: f32 = 1e-3;

fn tick_input() -> impl Strategy<Value = TickInput> {
    (
        prop::option::of((-200.0f32..1000.0, -200.0f32..800.0)),
        any::<bool>(),
        prop::bool::weighted(0.05),
    )
        .prop_map(|(target, drag, release)| TickInput {
            target: target.map(|(x, y)| Vec2::new(x, y)),
            drag,
            release,
        })
}

fn device() -> impl Strategy<Value = DeviceProfile> {
    prop_oneof![Just(DeviceProfile::Desktop), Just(DeviceProfile::Mobile)]
}

fn in_bounds(pos: Vec2, radius: f32, size: Vec2) -> bool {
    pos.x >= radius - EPSILON
        && pos.x <= size.x - radius + EPSILON
        && pos.y >= radius - EPSILON
        && pos.y <= size.y - radius + EPSILON
}

fn check_bounds(state: &SimulationState) -> Result<(), TestCaseError> {
    let size = state.arena.size();
    prop_assert!(in_bounds(state.player.pos, state.player.radius, size), "player at {:?}", state.player.pos);
    for (i, reward) in state.rewards.iter().enumerate() {
        prop_assert!(in_bounds(reward.pos, reward.radius, size), "reward {} at {:?}", i, reward.pos);
    }
    for (i, hazard) in state.hazards.iter().enumerate() {
        prop_assert!(in_bounds(hazard.pos, hazard.radius, size), "hazard {} at {:?}", i, hazard.pos);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_entities_stay_inside_arena(
        seed in any::<u64>(),
        profile in device(),
        width in 400.0f32..1400.0,
        height in 400.0f32..1000.0,
        inputs in prop::collection::vec(tick_input(), 1..400),
    ) {
        let mut state = initialize_round(SimulationConfig::for_device(profile, width, height, seed)).unwrap();
        check_bounds(&state)?;
        for input in &inputs {
            let outcome = tick(&mut state, input);
            check_bounds(&state)?;
            if outcome.is_some() {
                break;
            }
        }
    }

    #[test]
    fn test_collection_is_monotonic(
        seed in any::<u64>(),
        inputs in prop::collection::vec(tick_input(), 1..400),
    ) {
        let mut state = initialize_round(SimulationConfig::for_device(DeviceProfile::Desktop, 800.0, 600.0, seed)).unwrap();
        let mut collected = vec![false; state.rewards.len()];
        for input in &inputs {
            let outcome = tick(&mut state, input);
            for (i, reward) in state.rewards.iter().enumerate() {
                prop_assert!(!collected[i] || reward.collected, "reward {} was un-collected", i);
                collected[i] = reward.collected;
            }
            prop_assert_eq!(state.collected_count(), collected.iter().filter(|c| **c).count());
            if outcome.is_some() {
                break;
            }
        }
    }

    #[test]
    fn test_hazard_behavior_is_exclusive(
        seed in any::<u64>(),
        chase_probability in 0.0f64..=1.0,
        inputs in prop::collection::vec(tick_input(), 1..400),
    ) {
        let config = SimulationConfig {
            chase_probability,
            chase_proximity: 400.0,
            ..SimulationConfig::for_device(DeviceProfile::Desktop, 800.0, 600.0, seed)
        };
        let mut state = initialize_round(config).unwrap();
        for input in &inputs {
            let outcome = tick(&mut state, input);
            for (i, hazard) in state.hazards.iter().enumerate() {
                match hazard.behavior() {
                    HazardBehavior::Chasing => {
                        prop_assert_eq!(hazard.cooldown_ticks, 0, "hazard {} chasing during cooldown", i);
                        prop_assert!(hazard.chase_ticks > 0, "hazard {} chasing with no budget", i);
                    }
                    HazardBehavior::Cooldown => prop_assert!(!hazard.chasing),
                    HazardBehavior::Wandering => {
                        prop_assert!(!hazard.chasing);
                        prop_assert_eq!(hazard.cooldown_ticks, 0);
                    }
                }
            }
            if outcome.is_some() {
                break;
            }
        }
    }

    #[test]
    fn test_same_seed_and_input_replays_identically(
        seed in any::<u64>(),
        inputs in prop::collection::vec(tick_input(), 1..200),
    ) {
        let run = || -> Replay {
            let mut state = initialize_round(SimulationConfig::for_device(DeviceProfile::Mobile, 600.0, 800.0, seed)).unwrap();
            let mut recorder = ReplayRecorder::new();
            recorder.begin();
            for input in &inputs {
                let outcome = tick(&mut state, input);
                recorder.record(&state);
                if outcome.is_some() {
                    break;
                }
            }
            recorder.finish()
        };
        let first = run();
        let second = run();
        prop_assert_eq!(first.digest(), second.digest());
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn test_playback_restores_every_recorded_frame(
        seed in any::<u64>(),
        inputs in prop::collection::vec(tick_input(), 1..120),
    ) {
        let config = SimulationConfig::for_device(DeviceProfile::Desktop, 800.0, 600.0, seed);
        let mut state = initialize_round(config.clone()).unwrap();
        let mut recorder = ReplayRecorder::new();
        recorder.begin();
        for input in &inputs {
            let outcome = tick(&mut state, input);
            recorder.record(&state);
            if outcome.is_some() {
                break;
            }
        }
        let replay = recorder.finish();

        let mut target = initialize_round(config).unwrap();
        let mut player = ReplayPlayer::new(replay.clone());
        while let Some(index) = player.step(&mut target) {
            prop_assert_eq!(&ReplayFrame::capture(&target), &replay.frames()[index]);
        }
        prop_assert!(player.is_finished());
        prop_assert_eq!(player.position(), Some(replay.len() - 1));
    }
}
