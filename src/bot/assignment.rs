//! Random team draws and first-round pairings.

use rand::{Rng, seq::SliceRandom};

use crate::{
    dao::models::{TeamEntity, TeamId},
    locale::{PhraseBundle, render},
};

/// Player counts for which a first round is generated.
const PAIRING_RANGE: std::ops::RangeInclusive<u32> = 2..=10;

/// Whether a pool is large enough to offer per-player substitutions.
///
/// Substitution needs strictly more than two candidates per player.
pub fn substitution_available(pool_size: usize, players: u32) -> bool {
    players > 0 && pool_size > 2 * players as usize
}

/// Draw `count` distinct teams, removing each one from `pool`.
///
/// Draws at most `pool.len()` teams.
pub fn draw_teams<R: Rng + ?Sized>(pool: &mut Vec<TeamId>, count: usize, rng: &mut R) -> Vec<TeamId> {
    let count = count.min(pool.len());
    let mut drawn = Vec::with_capacity(count);
    for _ in 0..count {
        let index = rng.random_range(0..pool.len());
        drawn.push(pool.swap_remove(index));
    }
    drawn
}

/// Every unordered pair of player numbers in random order, or `None` when the
/// player count is outside `2..=10`.
pub fn first_round_pairs<R: Rng + ?Sized>(players: u32, rng: &mut R) -> Option<Vec<(u32, u32)>> {
    if !PAIRING_RANGE.contains(&players) {
        return None;
    }
    let mut pairs: Vec<(u32, u32)> = (1..=players)
        .flat_map(|first| (first + 1..=players).map(move |second| (first, second)))
        .collect();
    pairs.shuffle(rng);
    Some(pairs)
}

/// Text describing the team drawn for `player`.
pub fn describe_team(phrases: &PhraseBundle, player: u32, team: &TeamEntity) -> String {
    render(
        &phrases.team_description,
        &[
            ("player_number", &player.to_string()),
            ("team_name", &team.name),
            ("league", &team.league),
            ("general", &team.general.to_string()),
            ("attack", &team.attack.to_string()),
            ("midfield", &team.midfield.to_string()),
            ("defense", &team.defense.to_string()),
        ],
    )
}

/// Pair list message: a header line followed by one line per pair.
pub fn describe_pairs(phrases: &PhraseBundle, pairs: &[(u32, u32)]) -> String {
    let mut text = phrases.tc_first_round_pairs.clone();
    for (first, second) in pairs {
        text.push('\n');
        text.push_str(&render(
            &phrases.tc_pair,
            &[("first", &first.to_string()), ("second", &second.to_string())],
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    use super::*;
    use crate::locale::LocaleRegistry;

    #[test]
    fn draws_are_distinct_and_come_from_the_pool() {
        let original: Vec<TeamId> = (0..12).map(|_| Uuid::new_v4()).collect();
        let mut rng = StdRng::seed_from_u64(7);

        for count in 0..=12 {
            let mut pool = original.clone();
            let drawn = draw_teams(&mut pool, count, &mut rng);

            let unique: HashSet<_> = drawn.iter().collect();
            assert_eq!(unique.len(), count);
            assert!(drawn.iter().all(|id| original.contains(id)));
            assert!(drawn.iter().all(|id| !pool.contains(id)));
            assert_eq!(pool.len(), original.len() - count);
        }
    }

    #[test]
    fn draw_is_capped_by_pool_size() {
        let mut pool = vec![Uuid::new_v4(), Uuid::new_v4()];
        let drawn = draw_teams(&mut pool, 5, &mut StdRng::seed_from_u64(1));
        assert_eq!(drawn.len(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn substitution_needs_more_than_two_teams_per_player() {
        assert!(!substitution_available(8, 4));
        assert!(substitution_available(9, 4));
        assert!(!substitution_available(5, 0));
    }

    #[test]
    fn four_players_get_all_six_pairs() {
        let pairs = first_round_pairs(4, &mut StdRng::seed_from_u64(3)).unwrap();
        let set: HashSet<_> = pairs.iter().copied().collect();
        let expected: HashSet<_> = [(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)]
            .into_iter()
            .collect();
        assert_eq!(pairs.len(), 6);
        assert_eq!(set, expected);
    }

    #[test]
    fn pairs_only_for_two_to_ten_players() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(first_round_pairs(1, &mut rng).is_none());
        assert!(first_round_pairs(11, &mut rng).is_none());
        assert_eq!(first_round_pairs(10, &mut rng).map(|pairs| pairs.len()), Some(45));
    }

    #[test]
    fn pair_list_renders_one_line_per_pair() {
        let registry = LocaleRegistry::builtin("en");
        let text = describe_pairs(registry.default_bundle(), &[(2, 1), (1, 3)]);
        assert_eq!(
            text,
            "First round:\nPlayer 2 vs Player 1\nPlayer 1 vs Player 3"
        );
    }
}
