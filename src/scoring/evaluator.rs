use serde::{Deserialize, Serialize};

use super::types::{Point, Score, SetData, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEvaluation {
    pub score: Score,
    pub winner: Option<Team>,
}

/// Sums point values by beneficiary, saturating at `u32::MAX`.
pub fn score_points(points: &[Point]) -> Score {
    points.iter().fold(Score::default(), |mut score, point| {
        let total = score.get_mut(point.beneficiary());
        *total = total.saturating_add(point.value());
        score
    })
}

/// Like [`score_points`], but `None` once a team's total no longer fits.
pub fn checked_score_points(points: &[Point]) -> Option<Score> {
    points.iter().try_fold(Score::default(), |mut score, point| {
        let total = score.get_mut(point.beneficiary());
        *total = total.checked_add(point.value())?;
        Some(score)
    })
}

/// Sets won by each team. Drawn sets count for nobody.
pub fn sets_won(sets: &[SetData]) -> Score {
    sets.iter()
        .filter_map(|set| set.winner)
        .fold(Score::default(), |mut score, winner| {
            *score.get_mut(winner) += 1;
            score
        })
}

/// A team takes the set once it reaches `target_points` with a lead of at
/// least `win_by`. There is no cap.
pub fn decide_winner(score: &Score, target_points: u32, win_by: u32) -> Option<Team> {
    let leader = score.leader()?;
    let reached_target = *score.get(leader) >= target_points;
    let clear_lead = score.lead() >= win_by.max(1);
    (reached_target && clear_lead).then_some(leader)
}

pub fn evaluate(points: &[Point], target_points: u32, win_by: u32) -> SetEvaluation {
    let score = score_points(points);
    SetEvaluation {
        winner: decide_winner(&score, target_points, win_by),
        score,
    }
}

/// Seconds between two clock readings, never negative.
pub fn set_duration(started_at: u64, ended_at: u64) -> u64 {
    ended_at.saturating_sub(started_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::{ActionType, PointType};
    use rstest::rstest;

    fn ledger(a: u32, b: u32) -> Vec<Point> {
        let mut points = Vec::new();
        let teams = std::iter::repeat(Team::A)
            .take(a as usize)
            .chain(std::iter::repeat(Team::B).take(b as usize));
        for (i, team) in teams.enumerate() {
            points.push(Point {
                id: format!("p{i}"),
                team,
                point_type: if i % 3 == 0 {
                    PointType::Fault
                } else {
                    PointType::Scored
                },
                action: ActionType::Other,
                position: None,
                timestamp: i as i64,
                player_id: None,
                point_value: None,
            });
        }
        points
    }

    #[rstest]
    #[case(25, 23, Some(Team::A))]
    #[case(25, 24, None)]
    #[case(27, 25, Some(Team::A))]
    #[case(23, 25, Some(Team::B))]
    #[case(24, 22, None)]
    #[case(30, 29, None)]
    #[case(0, 0, None)]
    fn win_condition_at_twenty_five(
        #[case] a: u32,
        #[case] b: u32,
        #[case] expected: Option<Team>,
    ) {
        let evaluation = evaluate(&ledger(a, b), 25, 2);
        assert_eq!(evaluation.score, Score::new(a, b));
        assert_eq!(evaluation.winner, expected);
    }

    #[test]
    fn deciding_set_uses_its_own_target() {
        assert_eq!(decide_winner(&Score::new(15, 13), 15, 2), Some(Team::A));
        assert_eq!(decide_winner(&Score::new(15, 13), 25, 2), None);
    }

    #[test]
    fn faults_count_for_the_recorded_team() {
        let points = ledger(0, 3);
        assert!(points.iter().any(|p| p.point_type == PointType::Fault));
        assert_eq!(score_points(&points), Score::new(0, 3));
    }

    #[test]
    fn point_value_is_summed() {
        let mut points = ledger(2, 0);
        points[0].point_value = Some(3);
        assert_eq!(score_points(&points), Score::new(4, 0));
    }

    #[test]
    fn huge_point_values_do_not_wrap() {
        let mut points = ledger(2, 0);
        points[0].point_value = Some(u32::MAX);
        points[1].point_value = Some(u32::MAX);

        assert_eq!(checked_score_points(&points), None);
        assert_eq!(score_points(&points), Score::new(u32::MAX, 0));
        assert_eq!(checked_score_points(&ledger(1, 2)), Some(Score::new(1, 2)));
    }

    #[test]
    fn sets_won_skips_drawn_sets() {
        let set = |number: u32, winner: Option<Team>| SetData {
            id: format!("s{number}"),
            number,
            points: Vec::new(),
            score: Score::default(),
            winner,
            duration: 0,
        };
        let sets = [
            set(1, Some(Team::A)),
            set(2, None),
            set(3, Some(Team::B)),
            set(4, Some(Team::A)),
        ];
        assert_eq!(sets_won(&sets), Score::new(2, 1));
    }

    #[test]
    fn zero_margin_still_requires_a_leader() {
        assert_eq!(decide_winner(&Score::new(25, 25), 25, 0), None);
        assert_eq!(decide_winner(&Score::new(25, 24), 25, 0), Some(Team::A));
    }

    #[test]
    fn duration_saturates() {
        assert_eq!(set_duration(10, 70), 60);
        assert_eq!(set_duration(70, 10), 0);
    }
}
