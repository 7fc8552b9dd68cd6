//! ELO rating calculation.
//!
//! Each player's change is `trunc(k * (actual - expected))`, computed on its
//! own from its own expected score. The two expected scores are separate
//! floating-point results, so the deltas are not guaranteed to be exact
//! negatives of each other when a product lands next to an integer.

/// New ratings and the change applied to each player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EloOutcome {
    pub new_a: i32,
    pub new_b: i32,
    pub delta_a: i32,
    pub delta_b: i32,
}

/// Probability that a player rated `rating` beats one rated `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
}

fn rating_delta(rating: i32, opponent: i32, won: bool, k_factor: i32) -> i32 {
    let actual = if won { 1.0 } else { 0.0 };
    (f64::from(k_factor) * (actual - expected_score(rating, opponent))) as i32
}

pub fn compute(rating_a: i32, rating_b: i32, a_won: bool, k_factor: i32) -> EloOutcome {
    let delta_a = rating_delta(rating_a, rating_b, a_won, k_factor);
    let delta_b = rating_delta(rating_b, rating_a, !a_won, k_factor);

    EloOutcome {
        new_a: rating_a + delta_a,
        new_b: rating_b + delta_b,
        delta_a,
        delta_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_move_by_half_k() {
        let outcome = compute(1000, 1000, true, 32);
        assert_eq!(
            outcome,
            EloOutcome {
                new_a: 1016,
                new_b: 984,
                delta_a: 16,
                delta_b: -16,
            }
        );
        assert_eq!(outcome.delta_a + outcome.delta_b, 0);
    }

    #[test]
    fn deterministic() {
        let first = compute(1234, 987, false, 24);
        for _ in 0..10 {
            assert_eq!(compute(1234, 987, false, 24), first);
        }
    }

    #[test]
    fn swapping_players_mirrors_the_result() {
        for (a, b) in [(1000, 1000), (1500, 1100), (800, 2400), (1203, 1197)] {
            for a_won in [true, false] {
                let forward = compute(a, b, a_won, 32);
                let mirrored = compute(b, a, !a_won, 32);
                assert_eq!(forward.new_a, mirrored.new_b);
                assert_eq!(forward.new_b, mirrored.new_a);
                assert_eq!(forward.delta_a, mirrored.delta_b);
                assert_eq!(forward.delta_b, mirrored.delta_a);
            }
        }
    }

    #[test]
    fn new_rating_is_old_plus_delta() {
        for (a, b, a_won) in [(1000, 1400, true), (1400, 1000, true), (1650, 1320, false)] {
            let outcome = compute(a, b, a_won, 40);
            assert_eq!(outcome.new_a, a + outcome.delta_a);
            assert_eq!(outcome.new_b, b + outcome.delta_b);
        }
    }

    #[test]
    fn larger_k_moves_ratings_further() {
        let mut previous = 0;
        for k in [8, 16, 32, 64, 128] {
            let outcome = compute(1200, 1000, false, k);
            assert!(
                outcome.delta_a.abs() > previous,
                "k={k} gave {}",
                outcome.delta_a
            );
            previous = outcome.delta_a.abs();
        }
    }

    #[test]
    fn underdog_gains_more_than_favourite() {
        let upset = compute(1000, 1400, true, 32);
        let expected = compute(1400, 1000, true, 32);
        assert!(upset.delta_a > 16);
        assert!(expected.delta_a < 16);
        assert!(upset.delta_a > expected.delta_a);
    }

    #[test]
    fn deltas_truncate_toward_zero() {
        // favourite: +0.32 truncates to 0
        let outcome = compute(1800, 1000, true, 32);
        assert_eq!(outcome.delta_a, 0);
        assert_eq!(outcome.delta_b, 0);

        let upset = compute(1000, 1800, true, 32);
        assert_eq!(upset.delta_a, 31);
        assert_eq!(upset.delta_b, -31);

        let uneven = compute(1000, 1100, true, 32);
        assert_eq!(uneven.delta_a, 20);
        assert_eq!(uneven.delta_b, -20);
    }
}
