use crate::palette::{Season, Swatch};
use serde::{Deserialize, Serialize};

/// A confirmed swatch pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub color: String,
    pub season: Season,
}

impl Selection {
    pub fn new(color: impl Into<String>, season: Season) -> Self {
        Self {
            color: color.into(),
            season,
        }
    }
}

impl From<&Swatch> for Selection {
    fn from(swatch: &Swatch) -> Self {
        Self::new(swatch.hex.clone(), swatch.season)
    }
}

/// Per-season pick counts, indexed in table order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonCounts([usize; 4]);

impl SeasonCounts {
    pub fn get(&self, season: Season) -> usize {
        self.0[season.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(self) -> impl Iterator<Item = (Season, usize)> {
        Season::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

pub fn season_counts(selections: &[Selection]) -> SeasonCounts {
    let mut counts = [0usize; 4];
    for selection in selections {
        counts[selection.season.index()] += 1;
    }
    SeasonCounts(counts)
}

/// The most-picked season. Ties go to the earliest season in table order
/// (spring, summer, autumn, winter).
pub fn dominant_season(selections: &[Selection]) -> Option<Season> {
    let counts = season_counts(selections);
    let max = counts.iter().map(|(_, n)| n).max().unwrap_or(0);
    if max == 0 {
        return None;
    }
    counts.iter().find(|&(_, n)| n == max).map(|(s, _)| s)
}

/// Human-readable result sentence, or `None` when nothing has been picked.
pub fn personal_color(selections: &[Selection]) -> Option<String> {
    dominant_season(selections)
        .map(|season| format!("당신의 퍼스널 컬러는 {}입니다.", season.label()))
}
