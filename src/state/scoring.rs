//! Pure scoring of predictions against an official result.
//!
//! Nothing in here touches storage or the clock: the same prediction and
//! official result always produce the same [`PredictionScore`].

use std::{cmp::Ordering, collections::HashSet};

use serde::Deserialize;
use uuid::Uuid;

use crate::state::{official::OfficialResult, prediction::Prediction};

/// Tunable bonus policy applied on top of the one-point-per-player base.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Awarded when the predicted formation equals the official one.
    pub formation_bonus: u32,
    /// Awarded per slider within `tight_tolerance_width` of the official value.
    pub tight_tolerance_bonus: u32,
    /// Awarded per slider within `loose_tolerance_width` (but outside the tight band).
    pub loose_tolerance_bonus: u32,
    /// Largest slider distance earning the tight bonus.
    pub tight_tolerance_width: u32,
    /// Largest slider distance earning the loose bonus.
    pub loose_tolerance_width: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            formation_bonus: 20,
            tight_tolerance_bonus: 30,
            loose_tolerance_bonus: 15,
            tight_tolerance_width: 10,
            loose_tolerance_width: 25,
        }
    }
}

impl ScoringRules {
    /// Bonus for a slider whose prediction is `diff` away from the official value.
    pub fn proximity_bonus(&self, diff: u32) -> u32 {
        if diff <= self.tight_tolerance_width {
            self.tight_tolerance_bonus
        } else if diff <= self.loose_tolerance_width {
            self.loose_tolerance_bonus
        } else {
            0
        }
    }
}

/// Outcome of comparing one prediction to its match's official result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionScore {
    /// Scored prediction.
    pub prediction_id: Uuid,
    /// Owner of the prediction.
    pub user_id: String,
    /// Match being scored.
    pub match_id: u32,
    /// Size of the intersection between predicted and official rosters.
    pub correct_players: usize,
    /// Size of the official roster (may be below a full squad).
    pub total_players: usize,
    /// Awarded when the formation matches.
    pub formation_bonus: u32,
    /// Sum of slider proximity bonuses.
    pub tactics_bonus: u32,
    /// Correct players plus both bonuses.
    pub total_score: u32,
}

impl PredictionScore {
    /// Formation plus slider bonuses.
    pub fn tactical_bonus(&self) -> u32 {
        self.formation_bonus + self.tactics_bonus
    }
}

/// Aggregate view over every prediction for a match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    /// Summarized match.
    pub match_id: u32,
    /// Predictions stored for the match.
    pub total_predictions: usize,
    /// Distinct user ids among them.
    pub unique_users: usize,
    /// Highest total score, zero when empty.
    pub best_score: u32,
    /// Mean total score, zero when empty.
    pub average_score: f64,
}

/// Canonical form used for every player-name and formation comparison.
pub fn normalize_token(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Score `prediction` against `official` under `rules`.
pub fn score(
    prediction: &Prediction,
    official: &OfficialResult,
    rules: &ScoringRules,
) -> PredictionScore {
    let official_roster = official
        .players
        .iter()
        .map(|name| normalize_token(name))
        .filter(|name| !name.is_empty())
        .collect::<HashSet<_>>();
    let predicted_roster = prediction
        .player_names()
        .map(normalize_token)
        .collect::<HashSet<_>>();
    let correct_players = official_roster.intersection(&predicted_roster).count();

    let formation_bonus = match official.formation.as_deref() {
        Some(formation) if normalize_token(formation) == normalize_token(&prediction.formation) => {
            rules.formation_bonus
        }
        _ => 0,
    };

    let tactics_bonus = official
        .tactics
        .iter()
        .filter_map(|(slider, actual)| {
            prediction
                .tactics
                .get(slider)
                .map(|predicted| rules.proximity_bonus(predicted.abs_diff(*actual)))
        })
        .sum::<u32>();

    let base = u32::try_from(correct_players).unwrap_or(u32::MAX);

    PredictionScore {
        prediction_id: prediction.id,
        user_id: prediction.user_id.clone(),
        match_id: prediction.match_id,
        correct_players,
        total_players: official_roster.len(),
        formation_bonus,
        tactics_bonus,
        total_score: base.saturating_add(formation_bonus).saturating_add(tactics_bonus),
    }
}

/// Leaderboard order: higher total first, then user identifier ascending.
fn leaderboard_order(a: &PredictionScore, b: &PredictionScore) -> Ordering {
    b.total_score
        .cmp(&a.total_score)
        .then_with(|| a.user_id.to_lowercase().cmp(&b.user_id.to_lowercase()))
        .then_with(|| a.prediction_id.cmp(&b.prediction_id))
}

/// Score every prediction and rank them.
pub fn leaderboard(
    predictions: &[Prediction],
    official: &OfficialResult,
    rules: &ScoringRules,
) -> Vec<PredictionScore> {
    let mut scores = predictions
        .iter()
        .map(|prediction| score(prediction, official, rules))
        .collect::<Vec<_>>();
    scores.sort_by(leaderboard_order);
    scores
}

/// Aggregate already-computed scores for `match_id`.
pub fn summarize(match_id: u32, scores: &[PredictionScore]) -> MatchSummary {
    if scores.is_empty() {
        return MatchSummary {
            match_id,
            total_predictions: 0,
            unique_users: 0,
            best_score: 0,
            average_score: 0.0,
        };
    }

    let unique_users = scores
        .iter()
        .map(|entry| entry.user_id.to_lowercase())
        .collect::<HashSet<_>>()
        .len();
    let best_score = scores
        .iter()
        .map(|entry| entry.total_score)
        .max()
        .unwrap_or(0);
    let total = scores
        .iter()
        .map(|entry| f64::from(entry.total_score))
        .sum::<f64>();

    MatchSummary {
        match_id,
        total_predictions: scores.len(),
        unique_users,
        best_score,
        average_score: total / scores.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use indexmap::IndexMap;

    use super::*;
    use crate::state::prediction::PlayerSlot;

    const OFFICIAL_XI: [&str; 11] = [
        "Szczesny",
        "Kounde",
        "Araujo",
        "Christensen",
        "Balde",
        "De Jong",
        "Pedri",
        "Gavi",
        "Raphinha",
        "Lewandowski",
        "Yamal",
    ];

    fn prediction<S: AsRef<str>>(user_id: &str, names: &[S]) -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            match_id: 1,
            team_id: 1,
            formation: "4-3-3".into(),
            players: names
                .iter()
                .map(|name| PlayerSlot {
                    position: None,
                    name: name.as_ref().into(),
                })
                .collect(),
            tactics: IndexMap::new(),
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn official(names: &[&str]) -> OfficialResult {
        OfficialResult {
            match_id: 1,
            players: names.iter().map(|name| (*name).into()).collect(),
            formation: None,
            tactics: IndexMap::new(),
        }
    }

    #[test]
    fn exact_lineup_in_any_order_and_casing_scores_full() {
        let reversed = OFFICIAL_XI
            .iter()
            .rev()
            .map(|name| format!("  {}  ", name.to_uppercase()))
            .collect::<Vec<_>>();
        let result = score(
            &prediction("amy", &reversed[..]),
            &official(&OFFICIAL_XI),
            &ScoringRules::default(),
        );

        assert_eq!(result.correct_players, 11);
        assert_eq!(result.total_players, 11);
        assert_eq!(result.total_score, 11);
    }

    #[test]
    fn permutations_score_identically() {
        let rules = ScoringRules::default();
        let official = official(&OFFICIAL_XI);
        let mut rotated = OFFICIAL_XI.to_vec();
        rotated.rotate_left(4);

        let straight = score(&prediction("amy", &OFFICIAL_XI), &official, &rules);
        let shuffled = score(&prediction("amy", &rotated), &official, &rules);
        assert_eq!(straight.correct_players, shuffled.correct_players);
    }

    #[test]
    fn whitespace_and_case_do_not_matter() {
        let mut names = OFFICIAL_XI.to_vec();
        names[9] = " lewandowski ";
        let result = score(
            &prediction("amy", &names),
            &official(&["Lewandowski"]),
            &ScoringRules::default(),
        );
        assert_eq!(result.correct_players, 1);
        assert_eq!(result.total_players, 1);
    }

    #[test]
    fn partial_overlap_counts_shared_names() {
        let mut names = OFFICIAL_XI[..6].to_vec();
        names.extend(["Sub 1", "Sub 2", "Sub 3", "Sub 4", "Sub 5"]);
        let result = score(
            &prediction("bob", &names),
            &official(&OFFICIAL_XI),
            &ScoringRules::default(),
        );
        assert_eq!(result.correct_players, 6);
        assert_eq!(result.total_score, 6);
    }

    #[test]
    fn total_players_reflects_incomplete_official_roster() {
        let result = score(
            &prediction("amy", &OFFICIAL_XI),
            &official(&OFFICIAL_XI[..9]),
            &ScoringRules::default(),
        );
        assert_eq!(result.correct_players, 9);
        assert_eq!(result.total_players, 9);
    }

    #[test]
    fn formation_bonus_requires_official_formation() {
        let rules = ScoringRules::default();
        let pick = prediction("amy", &OFFICIAL_XI);

        let no_formation = score(&pick, &official(&OFFICIAL_XI), &rules);
        assert_eq!(no_formation.formation_bonus, 0);

        let mut reference = official(&OFFICIAL_XI);
        reference.formation = Some(" 4-3-3".into());
        let matched = score(&pick, &reference, &rules);
        assert_eq!(matched.formation_bonus, 20);
        assert_eq!(matched.total_score, 31);

        reference.formation = Some("4-4-2".into());
        assert_eq!(score(&pick, &reference, &rules).formation_bonus, 0);
    }

    #[test]
    fn slider_bonus_tiers_follow_configured_widths() {
        let rules = ScoringRules::default();
        let mut reference = official(&[]);
        reference.tactics.insert("pressing".into(), 50);

        let bonus_at = |value: i32| {
            let mut pick = prediction("amy", &OFFICIAL_XI);
            pick.tactics.insert("pressing".into(), value);
            score(&pick, &reference, &rules).tactics_bonus
        };

        assert_eq!(bonus_at(50), 30);
        assert_eq!(bonus_at(60), 30);
        assert_eq!(bonus_at(39), 15);
        assert_eq!(bonus_at(75), 15);
        assert_eq!(bonus_at(24), 0);
        assert_eq!(bonus_at(100), 0);
    }

    #[test]
    fn sliders_missing_on_either_side_are_ignored() {
        let rules = ScoringRules::default();
        let mut reference = official(&[]);
        reference.tactics.insert("pressing".into(), 50);
        reference.tactics.insert("tempo".into(), 70);

        let mut pick = prediction("amy", &OFFICIAL_XI);
        pick.tactics.insert("pressing".into(), 55);
        pick.tactics.insert("width".into(), 10);

        let result = score(&pick, &reference, &rules);
        assert_eq!(result.tactics_bonus, 30);
        assert_eq!(result.tactical_bonus(), 30);
        assert_eq!(result.total_players, 0);
    }

    #[test]
    fn custom_rules_change_the_tiers() {
        let rules = ScoringRules {
            formation_bonus: 5,
            tight_tolerance_bonus: 3,
            loose_tolerance_bonus: 1,
            tight_tolerance_width: 2,
            loose_tolerance_width: 4,
        };
        assert_eq!(rules.proximity_bonus(2), 3);
        assert_eq!(rules.proximity_bonus(3), 1);
        assert_eq!(rules.proximity_bonus(5), 0);
    }

    #[test]
    fn leaderboard_breaks_ties_alphabetically() {
        let official = official(&OFFICIAL_XI);
        let nine = &OFFICIAL_XI[..9];
        let seven = &OFFICIAL_XI[..7];
        let predictions = vec![
            prediction("zack", seven),
            prediction("bob", nine),
            prediction("amy", nine),
        ];

        let board = leaderboard(&predictions, &official, &ScoringRules::default());
        let order = board
            .iter()
            .map(|entry| (entry.user_id.as_str(), entry.total_score))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![("amy", 9), ("bob", 9), ("zack", 7)]);
    }

    #[test]
    fn summary_of_no_predictions_is_all_zero() {
        let summary = summarize(4, &[]);
        assert_eq!(
            summary,
            MatchSummary {
                match_id: 4,
                total_predictions: 0,
                unique_users: 0,
                best_score: 0,
                average_score: 0.0,
            }
        );
    }

    #[test]
    fn summary_averages_total_scores() {
        let official = official(&OFFICIAL_XI);
        let predictions = vec![
            prediction("amy", &OFFICIAL_XI[..9]),
            prediction("bob", &OFFICIAL_XI[..9]),
            prediction("zack", &OFFICIAL_XI[..7]),
        ];
        let board = leaderboard(&predictions, &official, &ScoringRules::default());
        let summary = summarize(1, &board);

        assert_eq!(summary.total_predictions, 3);
        assert_eq!(summary.unique_users, 3);
        assert_eq!(summary.best_score, 9);
        assert!((summary.average_score - 25.0 / 3.0).abs() < f64::EPSILON);
    }
}
