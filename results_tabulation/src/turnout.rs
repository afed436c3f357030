//! The turnout pseudo-contest.
//!
//! Its rows are contest-level stats (registered voters, ballots cast, ...) possibly
//! broken down by voting group or tagged with a party. It has no choices.

use log::debug;

use crate::format::percent;
use crate::model::*;
use crate::store::{Contest, RowFilter};
use crate::totals::TotalsView;

/// A count that is an estimate and not an official figure.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Estimate {
    pub value: Count,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TurnoutSummary {
    pub registered: Count,
    pub eligible: Option<Estimate>,
    pub ballots_cast: Count,
    pub percent_of_registered: Option<f64>,
    pub percent_of_eligible: Option<f64>,
    /// Ballots cast per voting group.
    pub by_voting_group: TotalsView,
    /// Registered voters per party.
    pub registered_by_party: TotalsView,
    /// Ballots cast per party.
    pub cast_by_party: TotalsView,
}

pub struct Turnout<'a> {
    contest: &'a Contest,
}

impl<'a> Turnout<'a> {
    /// Fails if the contest does not track both the registered voters and the ballots cast.
    pub fn new(contest: &'a Contest) -> Result<Turnout<'a>, TabulationError> {
        contest.check_stat(&StatCode::from(stats::REGISTERED))?;
        contest.check_stat(&StatCode::from(stats::CAST))?;
        Ok(Turnout { contest })
    }

    pub fn contest(&self) -> &'a Contest {
        self.contest
    }

    pub fn registered(&self) -> Result<Count, TabulationError> {
        self.contest
            .get_total(&StatCode::from(stats::REGISTERED), &RowFilter::default())
    }

    pub fn ballots_cast(&self) -> Result<Count, TabulationError> {
        self.contest
            .get_total(&StatCode::from(stats::CAST), &RowFilter::default())
    }

    /// The estimated number of eligible voters, if the contest provides it.
    pub fn eligible(&self) -> Result<Option<Estimate>, TabulationError> {
        let stat = StatCode::from(stats::ELIGIBLE);
        if !self.contest.tracks_stat(&stat) {
            return Ok(None);
        }
        let value = self.contest.get_total(&stat, &RowFilter::default())?;
        Ok(Some(Estimate { value }))
    }

    /// A stat for each voting group, by default all the declared groups.
    pub fn by_voting_group(
        &self,
        stat: &StatCode,
        groups: Option<&[GroupCode]>,
    ) -> Result<TotalsView, TabulationError> {
        match groups {
            Some(gs) => self.contest.totals_by_voting_group(stat, gs),
            None => {
                let gs: Vec<GroupCode> = self
                    .contest
                    .voting_groups()
                    .iter()
                    .map(|g| g.code.clone())
                    .collect();
                self.contest.totals_by_voting_group(stat, &gs)
            }
        }
    }

    pub fn by_party(&self, stat: &StatCode) -> Result<TotalsView, TabulationError> {
        self.contest.totals_by_party(stat)
    }

    /// Ballots cast over registered voters.
    pub fn percent_of_registered(&self) -> Result<Option<f64>, TabulationError> {
        Ok(percent(self.ballots_cast()?, self.registered()?))
    }

    /// Ballots cast over the estimated eligible voters. None without an estimate.
    pub fn percent_of_eligible(&self) -> Result<Option<f64>, TabulationError> {
        match self.eligible()? {
            Some(e) => Ok(percent(self.ballots_cast()?, e.value)),
            None => Ok(None),
        }
    }

    pub fn summary(&self) -> Result<TurnoutSummary, TabulationError> {
        let registered = StatCode::from(stats::REGISTERED);
        let cast = StatCode::from(stats::CAST);
        let res = TurnoutSummary {
            registered: self.registered()?,
            eligible: self.eligible()?,
            ballots_cast: self.ballots_cast()?,
            percent_of_registered: self.percent_of_registered()?,
            percent_of_eligible: self.percent_of_eligible()?,
            by_voting_group: self.by_voting_group(&cast, None)?,
            registered_by_party: self.by_party(&registered)?,
            cast_by_party: self.by_party(&cast)?,
        };
        debug!("turnout summary: {:?}", res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContestBuilder;
    use crate::format::{format_percent, Precision};
    use crate::totals::TotalKey;

    fn turnout_contest(with_eligible: bool) -> Contest {
        let mut stat_types = vec![
            StatType::new(stats::REGISTERED, "Registered Voters"),
            StatType::new(stats::CAST, "Ballots Cast"),
        ];
        let mut rows = vec![
            ResultRow::new(stats::REGISTERED, 1000),
            ResultRow::new(stats::REGISTERED, 600).party("DEM"),
            ResultRow::new(stats::REGISTERED, 400).party("REP"),
            ResultRow::new(stats::CAST, 650),
            ResultRow::new(stats::CAST, 250).group("ED"),
            ResultRow::new(stats::CAST, 400).group("MV"),
            ResultRow::new(stats::CAST, 390).party("DEM"),
            ResultRow::new(stats::CAST, 260).party("REP"),
        ];
        if with_eligible {
            stat_types.push(StatType::new(stats::ELIGIBLE, "Eligible Voters (estimated)"));
            rows.push(ResultRow::new(stats::ELIGIBLE, 800));
        }
        ContestBuilder::new("TURNOUT", "Voter Turnout")
            .stat_types(&stat_types)
            .voting_groups(&[
                VotingGroup::new(groups::ELECTION_DAY, "Election Day"),
                VotingGroup::new(groups::VOTE_BY_MAIL, "Vote by Mail"),
            ])
            .rows(rows)
            .build()
            .unwrap()
    }

    #[test]
    fn turnout_percentages() {
        let c = turnout_contest(true);
        let t = Turnout::new(&c).unwrap();
        assert_eq!(t.registered(), Ok(1000));
        assert_eq!(t.ballots_cast(), Ok(650));
        assert_eq!(t.percent_of_registered(), Ok(Some(65.0)));
        assert_eq!(format_percent(650, 1000, Precision::Two), "65.00%");
        assert_eq!(t.eligible(), Ok(Some(Estimate { value: 800 })));
        assert_eq!(t.percent_of_eligible(), Ok(Some(81.25)));
    }

    #[test]
    fn eligible_is_optional() {
        let c = turnout_contest(false);
        let t = Turnout::new(&c).unwrap();
        assert_eq!(t.eligible(), Ok(None));
        assert_eq!(t.percent_of_eligible(), Ok(None));
        assert_eq!(t.summary().unwrap().eligible, None);
    }

    #[test]
    fn breakdowns() {
        let c = turnout_contest(true);
        let s = Turnout::new(&c).unwrap().summary().unwrap();
        let groups: Vec<(&str, Count)> = s
            .by_voting_group
            .entries()
            .iter()
            .map(|e| (e.key.id(), e.total))
            .collect();
        assert_eq!(groups, vec![("ED", 250), ("MV", 400)]);
        assert_eq!(s.by_voting_group.grand_total(), s.ballots_cast);
        assert_eq!(
            s.registered_by_party.get(&TotalKey::Party(PartyId::from("DEM"))),
            Some(600)
        );
        assert_eq!(s.cast_by_party.grand_total(), 650);
    }

    #[test]
    fn requires_registration_and_cast() {
        let c = ContestBuilder::new("TURNOUT", "Voter Turnout")
            .stat_types(&[StatType::new(stats::CAST, "Ballots Cast")])
            .build()
            .unwrap();
        assert_eq!(
            Turnout::new(&c).err(),
            Some(TabulationError::UnknownStat {
                contest: "TURNOUT".to_string(),
                stat: StatCode::from(stats::REGISTERED)
            })
        );
    }

    #[test]
    fn zero_registration() {
        let c = ContestBuilder::new("TURNOUT", "Voter Turnout")
            .stat_types(&[
                StatType::new(stats::REGISTERED, "Registered Voters"),
                StatType::new(stats::CAST, "Ballots Cast"),
            ])
            .row(ResultRow::new(stats::REGISTERED, 0))
            .build()
            .unwrap();
        let t = Turnout::new(&c).unwrap();
        assert_eq!(t.percent_of_registered(), Ok(None));
    }
}
