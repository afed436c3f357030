//! Bar chart scaling and the cutoff line of the approval contests.

use crate::model::*;
use crate::store::Contest;
use crate::totals::Selector;

#[derive(PartialEq, Debug, Clone)]
pub struct ChoiceBar {
    pub choice: ChoiceId,
    pub votes: Count,
    /// Width of the bar, in percent of the scale.
    pub width_percent: f64,
    /// The number of votes marking the threshold, 0 without a cutoff line.
    pub cutoff: f64,
    /// Position of the cutoff line, in percent of the scale.
    pub cutoff_percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BarScale {
    /// The number of votes drawn as a full bar.
    pub max_display_vote: Count,
    /// The selected choices, by descending votes.
    pub bars: Vec<ChoiceBar>,
}

fn scaled(value: f64, max: Count) -> f64 {
    if max == 0 {
        0.0
    } else {
        value * 100.0 / max as f64
    }
}

impl Contest {
    /// The full bar is the total votes for an approval contest (the choices are measured
    /// against an absolute threshold), and the leading choice otherwise.
    pub fn max_display_vote(&self, selector: &Selector) -> Result<Count, TabulationError> {
        match self.approval {
            Some(_) => self.total_votes(),
            None => self.get_max_total(selector),
        }
    }

    /// `threshold × total votes` for the approval choice, 0 for the other choices and
    /// in contests without a threshold.
    pub fn approval_cutoff(&self, choice: &ChoiceId) -> Result<f64, TabulationError> {
        if self.choice(choice).is_none() {
            return Err(TabulationError::UnknownChoice {
                contest: self.id.clone(),
                choice: choice.clone(),
            });
        }
        match &self.approval {
            Some(a) if a.choice == *choice => Ok(a.threshold.cutoff(self.total_votes()?)),
            _ => Ok(0.0),
        }
    }

    pub fn bar_scale(&self, selector: &Selector) -> Result<BarScale, TabulationError> {
        let max_display_vote = self.max_display_vote(selector)?;
        let mut bars = Vec::new();
        for (choice, votes) in self.sorted_totals(selector)?.into_iter() {
            let cutoff = self.approval_cutoff(&choice.id)?;
            bars.push(ChoiceBar {
                choice: choice.id.clone(),
                votes,
                width_percent: scaled(votes as f64, max_display_vote),
                cutoff,
                cutoff_percent: scaled(cutoff, max_display_vote),
            });
        }
        Ok(BarScale {
            max_display_vote,
            bars,
        })
    }
}
