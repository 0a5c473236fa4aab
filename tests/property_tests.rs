#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use plutus::market::{Action, State, TradingEnv};
    use plutus::replay::{ReplayMemory, Transition};
    use plutus::schedule::EpsilonSchedule;

    fn transition(reward: f32) -> Transition {
        let state = State {
            price: 2.0,
            next_price: 1.0,
            last_buy_price: None,
            assets: 0.0,
            currency: 50.0,
        };
        Transition {
            state,
            action: Action::Hold,
            reward,
            done: false,
            next_state: Some(state),
            goal: None,
        }
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Hold),
            Just(Action::Buy),
            Just(Action::Sell),
        ]
    }

    proptest! {
        #[test]
        fn test_replay_capacity_invariant(
            capacity in 1usize..50,
            rewards in prop::collection::vec(-100.0f32..100.0, 0..200)
        ) {
            let mut memory = ReplayMemory::new(capacity).unwrap();

            for (i, &reward) in rewards.iter().enumerate() {
                memory.append(transition(reward));
                prop_assert!(memory.len() <= capacity);
                prop_assert_eq!(memory.len(), (i + 1).min(capacity));
            }

            // Contents are the most recent `capacity` appends, in order.
            let expected: Vec<f32> = rewards
                .iter()
                .copied()
                .skip(rewards.len().saturating_sub(capacity))
                .collect();
            let stored: Vec<f32> = memory.iter().map(|t| t.reward).collect();
            prop_assert_eq!(stored, expected);
        }

        #[test]
        fn test_sampled_batches_have_requested_size(
            capacity in 1usize..40,
            appends in 1usize..120,
            seed in any::<u64>()
        ) {
            let mut memory = ReplayMemory::new(capacity).unwrap();
            for i in 0..appends {
                memory.append(transition(i as f32));
            }

            let mut rng = StdRng::seed_from_u64(seed);
            let batch_size = memory.len();
            prop_assert_eq!(memory.sample(batch_size, &mut rng).len(), batch_size);
        }

        #[test]
        fn test_epsilon_is_linear_and_clamped(
            init in 0.0f32..=1.0,
            final_value in 0.0f32..=1.0,
            decay_frames in 1usize..10_000,
            probe in 0usize..20_000
        ) {
            let schedule = EpsilonSchedule::new(init, final_value, decay_frames).unwrap();

            let value = schedule.value(probe);
            if probe >= decay_frames {
                prop_assert_eq!(value, final_value);
            } else {
                let expected = init + (final_value - init) / decay_frames as f32 * probe as f32;
                prop_assert!((value - expected).abs() <= 1e-5);
                let lo = init.min(final_value) - 1e-5;
                let hi = init.max(final_value) + 1e-5;
                prop_assert!(value >= lo && value <= hi);
            }
        }

        #[test]
        fn test_epsilon_is_monotone_between_endpoints(
            init in 0.0f32..=1.0,
            final_value in 0.0f32..=1.0,
            decay_frames in 1usize..500
        ) {
            let schedule = EpsilonSchedule::new(init, final_value, decay_frames).unwrap();
            let descending = init >= final_value;

            let mut previous = schedule.value(0);
            for frame in 1..decay_frames + 10 {
                let current = schedule.value(frame);
                if descending {
                    prop_assert!(current <= previous + 1e-6);
                } else {
                    prop_assert!(current >= previous - 1e-6);
                }
                previous = current;
            }
        }

        #[test]
        fn test_portfolio_accounting_under_arbitrary_actions(
            actions in prop::collection::vec(action_strategy(), 1..60)
        ) {
            let mut env = TradingEnv::default();
            let mut previous = env.state();

            for &action in &actions {
                let outcome = env.step(action);
                let state = match outcome.state {
                    Some(state) => state,
                    None => break,
                };

                // No position or balance can go negative.
                prop_assert!(state.assets >= 0.0);
                prop_assert!(state.currency >= 0.0);

                match action {
                    Action::Buy if previous.currency > 0.0 => {
                        prop_assert_eq!(state.currency, 0.0);
                        prop_assert_eq!(state.assets,
                            previous.assets + previous.currency / previous.price);
                    }
                    Action::Sell if previous.assets > 0.0 => {
                        prop_assert_eq!(state.assets, 0.0);
                        prop_assert_eq!(state.currency,
                            previous.currency + previous.assets * previous.price);
                    }
                    _ => {
                        prop_assert_eq!(state.assets, previous.assets);
                        prop_assert_eq!(state.currency, previous.currency);
                    }
                }
                previous = state;
            }
        }

        #[test]
        fn test_environment_is_deterministic(
            actions in prop::collection::vec(action_strategy(), 1..80),
        ) {
            let mut first = TradingEnv::default();
            let mut second = TradingEnv::default();

            for &action in &actions {
                let a = first.step(action);
                let b = second.step(action);
                prop_assert_eq!(a, b);
                if a.done {
                    break;
                }
            }
        }
    }
}
