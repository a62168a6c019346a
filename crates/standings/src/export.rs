//! Standings rows as handed to file exporters and the text report.

use serde::{Deserialize, Serialize};

use crate::error::StandingsError;
use crate::model::PlayerId;
use crate::ranking::score_at;
use crate::tiebreak::Tiebreaker;
use crate::tournament::Tournament;

/// Widest rating the fixed-width formats can hold
pub const MAX_RATING: u16 = 9999;
/// Widest point total the fixed-width formats can hold
pub const MAX_POINTS: f64 = 99.9;

/// One line of the final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub rank: usize,
    pub starting_number: usize,
    pub id: PlayerId,
    pub name: String,
    pub title: Option<String>,
    pub federation: Option<String>,
    pub rating: u16,
    pub points: f64,
    /// Configured scalar tiebreakers, in priority order
    pub tiebreakers: Vec<(Tiebreaker, f64)>,
}

pub fn clamp_rating(rating: u16) -> u16 {
    rating.min(MAX_RATING)
}

pub fn clamp_points(points: f64) -> f64 {
    points.clamp(0.0, MAX_POINTS)
}

/// Points with one decimal, clamped to the exported width.
pub fn format_points(points: f64) -> String {
    format!("{:.1}", clamp_points(points))
}

/// Rating-valued tiebreakers print as whole numbers, the rest with two
/// decimals.
pub fn format_tiebreak(tiebreaker: Tiebreaker, value: f64) -> String {
    match tiebreaker {
        Tiebreaker::AverageRatingOfOpponents
        | Tiebreaker::AverageRatingOfOpponentsCut1
        | Tiebreaker::OppositionPerformance => format!("{value:.0}"),
        _ => format!("{value:.2}"),
    }
}

/// Rows in rank order after `for_round`.
pub fn standings_rows(tournament: &Tournament, for_round: u32) -> Result<Vec<StandingsRow>, StandingsError> {
    let ranking = tournament.standings(for_round)?;
    let configured: Vec<Tiebreaker> = tournament.config().scalar_tiebreakers().collect();

    ranking
        .order
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let player = tournament
                .player(*id)
                .ok_or(StandingsError::UnknownPlayer(*id))?;
            let score = score_at(player, for_round);
            let tiebreakers = configured
                .iter()
                .map(|tb| {
                    let value = score
                        .and_then(|s| s.tiebreakers.get(tb))
                        .copied()
                        .unwrap_or(0.0);
                    (*tb, value)
                })
                .collect();
            Ok(StandingsRow {
                rank: i + 1,
                starting_number: tournament.starting_number(*id).unwrap_or(0),
                id: *id,
                name: player.name.clone(),
                title: player.title.clone(),
                federation: player.federation.clone(),
                rating: clamp_rating(player.rating),
                points: clamp_points(player.points_at(for_round)),
                tiebreakers,
            })
        })
        .collect()
}

/// Plain-text standings table.
pub fn render_table(title: &str, rows: &[StandingsRow]) -> String {
    let mut report = String::new();
    report.push_str(&format!("=== {} ===\n\n", title));

    let mut header = format!("{:>4} {:>4}  {:<28} {:>4} {:>5}", "Rk", "SNo", "Name", "Rtg", "Pts");
    if let Some(first) = rows.first() {
        for (tb, _) in &first.tiebreakers {
            header.push_str(&format!(" {:>7}", tb.abbreviation()));
        }
    }
    report.push_str(&header);
    report.push('\n');
    report.push_str(&"-".repeat(header.len()));
    report.push('\n');

    for row in rows {
        let name = match &row.title {
            Some(title) => format!("{} {}", title, row.name),
            None => row.name.clone(),
        };
        report.push_str(&format!(
            "{:>4} {:>4}  {:<28} {:>4} {:>5}",
            row.rank,
            row.starting_number,
            name,
            row.rating,
            format_points(row.points)
        ));
        for (tb, value) in &row.tiebreakers {
            report.push_str(&format!(" {:>7}", format_tiebreak(*tb, *value)));
        }
        report.push('\n');
    }

    report
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod export_tests;
