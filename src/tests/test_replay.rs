use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::market::{Action, State};
use crate::replay::{ReplayMemory, Transition};

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

#[test]
fn test_zero_capacity_rejected() {
    assert!(ReplayMemory::new(0).is_err());
}

#[test]
fn test_append_and_len() {
    let mut memory = ReplayMemory::new(10).unwrap();
    assert!(memory.is_empty());

    memory.append(transition(1.0));
    assert_eq!(memory.len(), 1);
    assert_eq!(memory.capacity(), 10);
}

#[test]
fn test_capacity_invariant_and_fifo_overwrite() {
    let mut memory = ReplayMemory::new(3).unwrap();

    for i in 0..5 {
        memory.append(transition(i as f32));
        assert!(memory.len() <= 3);
    }

    // Only the most recent 3 remain, oldest first.
    let rewards: Vec<f32> = memory.iter().map(|t| t.reward).collect();
    assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_sample_returns_requested_count() {
    let mut memory = ReplayMemory::new(10).unwrap();
    for i in 0..4 {
        memory.append(transition(i as f32));
    }

    let mut rng = StdRng::seed_from_u64(7);
    assert_eq!(memory.sample(1, &mut rng).len(), 1);
    assert_eq!(memory.sample(4, &mut rng).len(), 4);
}

#[test]
fn test_sampling_is_with_replacement() {
    let mut memory = ReplayMemory::new(2).unwrap();
    memory.append(transition(1.0));
    memory.append(transition(2.0));

    // Positions are drawn independently, so a batch can repeat one.
    let mut rng = StdRng::seed_from_u64(7);
    let saw_duplicate = (0..100).any(|_| {
        let batch = memory.sample(2, &mut rng);
        batch[0].reward == batch[1].reward
    });
    assert!(saw_duplicate);
}

#[test]
fn test_sample_draws_fresh_each_call() {
    let mut memory = ReplayMemory::new(64).unwrap();
    for i in 0..64 {
        memory.append(transition(i as f32));
    }

    let mut rng = StdRng::seed_from_u64(7);
    let first: Vec<f32> = memory.sample(16, &mut rng).iter().map(|t| t.reward).collect();
    let second: Vec<f32> = memory.sample(16, &mut rng).iter().map(|t| t.reward).collect();
    assert_ne!(first, second);
}

#[test]
#[should_panic(expected = "sampled")]
fn test_oversampling_is_fatal() {
    let mut memory = ReplayMemory::new(10).unwrap();
    memory.append(transition(1.0));

    let mut rng = StdRng::seed_from_u64(7);
    memory.sample(2, &mut rng);
}
