use log::debug;

use std::collections::BTreeMap;

use crate::model::*;

/// A contest and its immutable set of result rows.
///
/// Built with [`crate::builder::ContestBuilder`], which validates the data against
/// what the contest declares.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Contest {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) choices: Vec<Choice>,
    pub(crate) stat_types: Vec<StatType>,
    pub(crate) voting_groups: Vec<VotingGroup>,
    pub(crate) precincts: Vec<PrecinctId>,
    pub(crate) precincts_reporting: u32,
    pub(crate) total_precincts: u32,
    pub(crate) rows: Vec<ResultRow>,
    pub(crate) can_vote_for_multiple: bool,
    pub(crate) is_rcv: bool,
    pub(crate) rcv_rounds: u32,
    pub(crate) rcv_totals: Vec<RcvRoundTotals>,
    pub(crate) approval: Option<Approval>,
}

/// Which voting groups a lookup covers.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub enum GroupFilter {
    /// All the groups combined. For every cell, the untagged row is used when present,
    /// otherwise the tagged rows are summed.
    #[default]
    Combined,
    Group(GroupCode),
}

/// Which rows of the choice dimension a lookup covers.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub enum ChoiceFilter {
    /// Contest-level rows only (no choice).
    #[default]
    Contest,
    Choice(ChoiceId),
    AnyChoice,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RowFilter {
    pub voting_group: GroupFilter,
    pub party: Option<PartyId>,
    pub precinct: Option<PrecinctId>,
    pub choice: ChoiceFilter,
}

impl RowFilter {
    pub fn group(mut self, group: &GroupCode) -> RowFilter {
        self.voting_group = GroupFilter::Group(group.clone());
        self
    }

    pub fn party(mut self, party: &PartyId) -> RowFilter {
        self.party = Some(party.clone());
        self
    }

    pub fn precinct(mut self, precinct: &PrecinctId) -> RowFilter {
        self.precinct = Some(precinct.clone());
        self
    }

    pub fn choice(mut self, choice: &ChoiceId) -> RowFilter {
        self.choice = ChoiceFilter::Choice(choice.clone());
        self
    }

    pub fn any_choice(mut self) -> RowFilter {
        self.choice = ChoiceFilter::AnyChoice;
        self
    }
}

// Sums the values of one dimension within each cell. An untagged value, when present,
// already stands for all the tagged ones of its cell.
fn roll_up<K: Ord>(entries: impl Iterator<Item = (K, bool, Count)>) -> BTreeMap<K, Count> {
    let mut untagged: BTreeMap<K, Count> = BTreeMap::new();
    let mut tagged: BTreeMap<K, Count> = BTreeMap::new();
    for (key, is_tagged, count) in entries {
        let target = if is_tagged { &mut tagged } else { &mut untagged };
        *target.entry(key).or_insert(0) += count;
    }
    for (key, count) in tagged.into_iter() {
        untagged.entry(key).or_insert(count);
    }
    untagged
}

// Where a voting group sits in the hierarchy of subtotals.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) enum GroupLevel {
    /// No group, or the total of all the subtotals.
    Combined,
    /// The in-county subtotal, the sum of its parts.
    InCounty,
    InCountyPart,
    Other,
}

pub(crate) fn group_level(group: Option<&GroupCode>) -> GroupLevel {
    match group.map(|g| g.as_str()) {
        None | Some(groups::TOTAL) => GroupLevel::Combined,
        Some(groups::IN_COUNTY) => GroupLevel::InCounty,
        Some(groups::ELECTION_DAY) | Some(groups::VOTE_BY_MAIL) | Some(groups::EARLY_VOTING) => {
            GroupLevel::InCountyPart
        }
        Some(_) => GroupLevel::Other,
    }
}

/// The rows of one cell, by level of voting group.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub(crate) struct GroupCell {
    pub(crate) combined: Option<Count>,
    pub(crate) combined_rows: usize,
    pub(crate) in_county: Option<Count>,
    pub(crate) parts: Count,
    pub(crate) others: Count,
}

impl GroupCell {
    pub(crate) fn add(&mut self, group: Option<&GroupCode>, count: Count) {
        match group_level(group) {
            GroupLevel::Combined => {
                *self.combined.get_or_insert(0) += count;
                self.combined_rows += 1;
            }
            GroupLevel::InCounty => *self.in_county.get_or_insert(0) += count,
            GroupLevel::InCountyPart => self.parts += count,
            GroupLevel::Other => self.others += count,
        }
    }

    /// The sum of the groups, with the in-county subtotal standing for its parts.
    pub(crate) fn groups_total(&self) -> Count {
        self.in_county.unwrap_or(self.parts) + self.others
    }

    pub(crate) fn total(&self) -> Count {
        self.combined.unwrap_or_else(|| self.groups_total())
    }
}

type CellKey<'a> = (
    Option<&'a ChoiceId>,
    Option<&'a PartyId>,
    Option<&'a PrecinctId>,
);

type PrecinctKey<'a> = (Option<&'a ChoiceId>, Option<&'a PrecinctId>);

#[derive(Default)]
struct PartyShare {
    untagged: Option<Count>,
    tagged: Count,
    own: Option<Count>,
}

impl Contest {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The choices, in ballot order.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn choice(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == *id)
    }

    pub fn stat_types(&self) -> &[StatType] {
        &self.stat_types
    }

    pub fn voting_groups(&self) -> &[VotingGroup] {
        &self.voting_groups
    }

    pub fn precincts(&self) -> &[PrecinctId] {
        &self.precincts
    }

    pub fn precincts_reporting(&self) -> u32 {
        self.precincts_reporting
    }

    pub fn total_precincts(&self) -> u32 {
        self.total_precincts
    }

    pub fn can_vote_for_multiple(&self) -> bool {
        self.can_vote_for_multiple
    }

    /// Flagged as ranked-choice. The contest may still have no round yet: see [`Contest::rcv_rounds`].
    pub fn is_rcv(&self) -> bool {
        self.is_rcv
    }

    pub fn rcv_rounds(&self) -> u32 {
        self.rcv_rounds
    }

    pub fn has_rcv_rounds(&self) -> bool {
        self.is_rcv && self.rcv_rounds > 0
    }

    pub fn rcv_totals(&self) -> &[RcvRoundTotals] {
        &self.rcv_totals
    }

    pub fn approval(&self) -> Option<&Approval> {
        self.approval.as_ref()
    }

    pub fn tracks_stat(&self, stat: &StatCode) -> bool {
        self.stat_types.iter().any(|s| s.code == *stat)
    }

    pub fn stat_type(&self, stat: &StatCode) -> Option<&StatType> {
        self.stat_types.iter().find(|s| s.code == *stat)
    }

    pub fn has_voting_group(&self, group: &GroupCode) -> bool {
        self.voting_groups.iter().any(|g| g.code == *group)
    }

    /// The party a row counts for: its own tag, or else the party of its choice.
    pub(crate) fn effective_party<'a>(&'a self, row: &'a ResultRow) -> Option<&'a PartyId> {
        row.party.as_ref().or_else(|| {
            row.choice
                .as_ref()
                .and_then(|cid| self.choice(cid))
                .and_then(|c| c.party.as_ref())
        })
    }

    /// All the parties of the contest: first the parties of the choices in ballot order,
    /// then the parties only found on row tags, in row order.
    pub fn parties(&self) -> Vec<PartyId> {
        let mut res: Vec<PartyId> = Vec::new();
        let from_choices = self.choices.iter().filter_map(|c| c.party.as_ref());
        let from_rows = self.rows.iter().filter_map(|r| r.party.as_ref());
        for p in from_choices.chain(from_rows) {
            if !res.contains(p) {
                res.push(p.clone());
            }
        }
        res
    }

    pub(crate) fn check_stat(&self, stat: &StatCode) -> Result<(), TabulationError> {
        if self.tracks_stat(stat) {
            Ok(())
        } else {
            Err(TabulationError::UnknownStat {
                contest: self.id.clone(),
                stat: stat.clone(),
            })
        }
    }

    fn check_filter(&self, filter: &RowFilter) -> Result<(), TabulationError> {
        if let GroupFilter::Group(group) = &filter.voting_group {
            if !self.has_voting_group(group) {
                return Err(TabulationError::UnknownVotingGroup {
                    contest: self.id.clone(),
                    group: group.clone(),
                });
            }
        }
        if let Some(party) = &filter.party {
            if !self.parties().contains(party) {
                return Err(TabulationError::UnknownParty {
                    contest: self.id.clone(),
                    party: party.clone(),
                });
            }
        }
        if let Some(precinct) = &filter.precinct {
            if !self.precincts.is_empty() && !self.precincts.contains(precinct) {
                return Err(TabulationError::UnknownPrecinct {
                    contest: self.id.clone(),
                    precinct: precinct.clone(),
                });
            }
        }
        if let ChoiceFilter::Choice(cid) = &filter.choice {
            if self.choice(cid).is_none() {
                return Err(TabulationError::UnknownChoice {
                    contest: self.id.clone(),
                    choice: cid.clone(),
                });
            }
        }
        Ok(())
    }

    // Everything but the party: in totals, the party is resolved after the groups.
    fn matches_cell(&self, row: &ResultRow, filter: &RowFilter) -> bool {
        let group_ok = match &filter.voting_group {
            GroupFilter::Combined => true,
            GroupFilter::Group(g) => match group_level(Some(g)) {
                GroupLevel::Combined => true,
                GroupLevel::InCounty => matches!(
                    group_level(row.voting_group.as_ref()),
                    GroupLevel::InCounty | GroupLevel::InCountyPart
                ),
                _ => row.voting_group.as_ref() == Some(g),
            },
        };
        let choice_ok = match &filter.choice {
            ChoiceFilter::Contest => row.choice.is_none(),
            ChoiceFilter::Choice(cid) => row.choice.as_ref() == Some(cid),
            ChoiceFilter::AnyChoice => row.choice.is_some(),
        };
        let precinct_ok = match &filter.precinct {
            None => true,
            Some(p) => row.precinct.as_ref() == Some(p),
        };
        group_ok && choice_ok && precinct_ok
    }

    fn matches_row(&self, row: &ResultRow, filter: &RowFilter) -> bool {
        let party_ok = match &filter.party {
            None => true,
            Some(p) => self.effective_party(row) == Some(p),
        };
        party_ok && self.matches_cell(row, filter)
    }

    // The share of a party in every (choice, precinct) cell. The untagged row of a cell
    // already holds its party-tagged rows: only the rest of it counts for the party of
    // the choice.
    fn attribute_party<'a>(
        &'a self,
        party: &PartyId,
        cells: impl Iterator<Item = (CellKey<'a>, Count)>,
    ) -> BTreeMap<PrecinctKey<'a>, Count> {
        let mut shares: BTreeMap<PrecinctKey, PartyShare> = BTreeMap::new();
        for ((choice, p, precinct), n) in cells {
            let share = shares.entry((choice, precinct)).or_default();
            match p {
                None => share.untagged = Some(n),
                Some(p) => {
                    share.tagged += n;
                    if p == party {
                        share.own = Some(n);
                    }
                }
            }
        }
        shares
            .into_iter()
            .filter_map(|((choice, precinct), share)| {
                let choice_party = choice
                    .and_then(|cid| self.choice(cid))
                    .and_then(|c| c.party.as_ref());
                let rest = match share.untagged {
                    Some(n) if choice_party == Some(party) => Some(n.saturating_sub(share.tagged)),
                    _ => None,
                };
                if share.own.is_none() && rest.is_none() {
                    return None;
                }
                let n = share.own.unwrap_or(0) + rest.unwrap_or(0);
                Some(((choice, precinct), n))
            })
            .collect()
    }

    /// The raw rows of a stat matching the filter, in input order.
    ///
    /// With [`GroupFilter::Combined`], both the untagged and the tagged rows are returned.
    pub fn iter_rows<'a>(
        &'a self,
        stat: &'a StatCode,
        filter: &'a RowFilter,
    ) -> Result<impl Iterator<Item = &'a ResultRow> + 'a, TabulationError> {
        self.check_stat(stat)?;
        self.check_filter(filter)?;
        Ok(self
            .rows
            .iter()
            .filter(move |r| r.stat == *stat && self.matches_row(r, filter)))
    }

    /// The total of a stat.
    ///
    /// A row without a voting group, a party tag or a precinct is the combined count for
    /// that dimension: it is never added to the tagged rows of the same cell. The dimensions
    /// are rolled up in that order.
    ///
    /// Voting groups nest: a `TO` row is the combined row of its cell, and an `IA` row
    /// stands for its `ED`, `MV` and `EV` rows. With a party filter, the untagged row of
    /// a choice counts for the party of the choice, less the rows tagged with a party.
    ///
    /// Fails if the stat is not tracked by this contest: a zero total is valid data, a
    /// missing stat is not.
    pub fn get_total(&self, stat: &StatCode, filter: &RowFilter) -> Result<Count, TabulationError> {
        self.check_stat(stat)?;
        self.check_filter(filter)?;
        let rows = self
            .rows
            .iter()
            .filter(|r| r.stat == *stat && self.matches_cell(r, filter));
        let mut cells: BTreeMap<CellKey, GroupCell> = BTreeMap::new();
        for r in rows {
            cells
                .entry((r.choice.as_ref(), r.party.as_ref(), r.precinct.as_ref()))
                .or_default()
                .add(r.voting_group.as_ref(), r.count);
        }
        let by_cell = cells.into_iter().map(|(key, cell)| (key, cell.total()));
        let by_precinct = match &filter.party {
            None => roll_up(
                by_cell.map(|((choice, party, precinct), n)| ((choice, precinct), party.is_some(), n)),
            ),
            Some(party) => self.attribute_party(party, by_cell),
        };
        let by_choice = roll_up(
            by_precinct
                .into_iter()
                .map(|((choice, precinct), n)| (choice, precinct.is_some(), n)),
        );
        let total = by_choice.values().sum::<Count>();
        debug!(
            "get_total: contest {} stat {} filter {:?}: {}",
            self.id, stat, filter, total
        );
        Ok(total)
    }

    /// The votes of a choice.
    pub fn choice_total(&self, choice: &ChoiceId, filter: &RowFilter) -> Result<Count, TabulationError> {
        let f = RowFilter {
            choice: ChoiceFilter::Choice(choice.clone()),
            ..filter.clone()
        };
        self.get_total(&StatCode::from(stats::TOTAL), &f)
    }

    /// Total votes of the contest (contest-level ballots counted).
    pub fn total_votes(&self) -> Result<Count, TabulationError> {
        self.get_total(&StatCode::from(stats::TOTAL), &RowFilter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContestBuilder;

    fn mayor() -> Contest {
        ContestBuilder::new("mayor", "Mayor")
            .stat_types(&[
                StatType::new(stats::TOTAL, "Ballots Counted"),
                StatType::new(stats::UNDERVOTES, "Undervotes"),
                StatType::new(stats::OVERVOTES, "Overvotes"),
            ])
            .voting_groups(&[
                VotingGroup::new(groups::ELECTION_DAY, "Election Day"),
                VotingGroup::new(groups::VOTE_BY_MAIL, "Vote by Mail"),
            ])
            .choice(Choice::new("A", "Alice").party("DEM"))
            .choice(Choice::new("B", "Bob").party("REP"))
            .precincts(&["P1", "P2"], 2, 2)
            .rows(vec![
                // P1 only reports by group.
                ResultRow::votes("A", 30).group("ED").precinct("P1"),
                ResultRow::votes("A", 20).group("MV").precinct("P1"),
                ResultRow::votes("B", 10).group("ED").precinct("P1"),
                // P2 reports a combined row as well as the groups.
                ResultRow::votes("A", 15).precinct("P2"),
                ResultRow::votes("A", 5).group("ED").precinct("P2"),
                ResultRow::votes("A", 10).group("MV").precinct("P2"),
                ResultRow::votes("B", 40).precinct("P2"),
                ResultRow::new(stats::TOTAL, 115),
                ResultRow::new(stats::UNDERVOTES, 0),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn combined_groups_are_not_double_counted() {
        let c = mayor();
        let a = ChoiceId::from("A");
        let b = ChoiceId::from("B");
        // P1: 30 + 20, P2: the combined 15 and not 15 + 5 + 10.
        assert_eq!(c.choice_total(&a, &RowFilter::default()), Ok(65));
        assert_eq!(c.choice_total(&b, &RowFilter::default()), Ok(50));
    }

    #[test]
    fn totals_by_group_and_precinct() {
        let c = mayor();
        let a = ChoiceId::from("A");
        let ed = GroupCode::from("ED");
        let p2 = PrecinctId::from("P2");
        assert_eq!(c.choice_total(&a, &RowFilter::default().group(&ed)), Ok(35));
        assert_eq!(c.choice_total(&a, &RowFilter::default().precinct(&p2)), Ok(15));
        assert_eq!(
            c.choice_total(&a, &RowFilter::default().precinct(&p2).group(&ed)),
            Ok(5)
        );
    }

    #[test]
    fn zero_total_is_not_missing() {
        let c = mayor();
        assert_eq!(
            c.get_total(&StatCode::from(stats::UNDERVOTES), &RowFilter::default()),
            Ok(0)
        );
        assert_eq!(
            c.get_total(&StatCode::from(stats::OVERVOTES), &RowFilter::default()),
            Ok(0)
        );
        assert_eq!(
            c.get_total(&StatCode::from(stats::WRITE_IN), &RowFilter::default()),
            Err(TabulationError::UnknownStat {
                contest: "mayor".to_string(),
                stat: StatCode::from(stats::WRITE_IN)
            })
        );
    }

    #[test]
    fn unknown_filter_values() {
        let c = mayor();
        let stat = StatCode::from(stats::TOTAL);
        let res = c.get_total(&stat, &RowFilter::default().group(&GroupCode::from("EV")));
        assert!(matches!(res, Err(TabulationError::UnknownVotingGroup { .. })));
        let res = c.get_total(&stat, &RowFilter::default().party(&PartyId::from("GRN")));
        assert!(matches!(res, Err(TabulationError::UnknownParty { .. })));
        let res = c.get_total(&stat, &RowFilter::default().precinct(&PrecinctId::from("P9")));
        assert!(matches!(res, Err(TabulationError::UnknownPrecinct { .. })));
    }

    #[test]
    fn party_follows_choice() {
        let c = mayor();
        let stat = StatCode::from(stats::TOTAL);
        let dem = RowFilter::default().any_choice().party(&PartyId::from("DEM"));
        assert_eq!(c.get_total(&stat, &dem), Ok(65));
        assert_eq!(
            c.parties(),
            vec![PartyId::from("DEM"), PartyId::from("REP")]
        );
    }

    #[test]
    fn untagged_rows_cover_parties_and_precincts() {
        let c = ContestBuilder::new("t", "Turnout")
            .stat_types(&[StatType::new(stats::REGISTERED, "Registered Voters")])
            .precincts(&["P1", "P2"], 2, 2)
            .rows(vec![
                ResultRow::new(stats::REGISTERED, 1000),
                ResultRow::new(stats::REGISTERED, 600).party("DEM"),
                ResultRow::new(stats::REGISTERED, 400).party("REP"),
                ResultRow::new(stats::REGISTERED, 700).precinct("P1"),
                ResultRow::new(stats::REGISTERED, 300).precinct("P2"),
            ])
            .build()
            .unwrap();
        let reg = StatCode::from(stats::REGISTERED);
        assert_eq!(c.get_total(&reg, &RowFilter::default()), Ok(1000));
        assert_eq!(
            c.get_total(&reg, &RowFilter::default().party(&PartyId::from("DEM"))),
            Ok(600)
        );
        assert_eq!(
            c.get_total(&reg, &RowFilter::default().precinct(&PrecinctId::from("P1"))),
            Ok(700)
        );
    }

    #[test]
    fn total_group_is_the_combined_row() {
        let c = ContestBuilder::new("prop", "Measure A")
            .stat_types(&[StatType::new(stats::TOTAL, "Ballots Counted")])
            .voting_groups(&[
                VotingGroup::new(groups::TOTAL, "Total"),
                VotingGroup::new(groups::ELECTION_DAY, "Election Day"),
                VotingGroup::new(groups::VOTE_BY_MAIL, "Vote by Mail"),
            ])
            .choice(Choice::new("Y", "Yes"))
            .rows(vec![
                ResultRow::votes("Y", 100).group("TO"),
                ResultRow::votes("Y", 60).group("ED"),
                ResultRow::votes("Y", 40).group("MV"),
            ])
            .build()
            .unwrap();
        let y = ChoiceId::from("Y");
        assert_eq!(c.choice_total(&y, &RowFilter::default()), Ok(100));
        let to = RowFilter::default().group(&GroupCode::from("TO"));
        assert_eq!(c.choice_total(&y, &to), Ok(100));
        let mv = RowFilter::default().group(&GroupCode::from("MV"));
        assert_eq!(c.choice_total(&y, &mv), Ok(40));
    }

    #[test]
    fn in_county_subtotal_stands_for_its_parts() {
        let c = ContestBuilder::new("prop", "Measure B")
            .stat_types(&[StatType::new(stats::TOTAL, "Ballots Counted")])
            .voting_groups(&[
                VotingGroup::new(groups::IN_COUNTY, "In County"),
                VotingGroup::new(groups::ELECTION_DAY, "Election Day"),
                VotingGroup::new(groups::VOTE_BY_MAIL, "Vote by Mail"),
                VotingGroup::new(groups::OTHER_COUNTIES, "Other Counties"),
            ])
            .choice(Choice::new("Y", "Yes"))
            .choice(Choice::new("N", "No"))
            .rows(vec![
                ResultRow::votes("Y", 70).group("IA"),
                ResultRow::votes("Y", 40).group("ED"),
                ResultRow::votes("Y", 30).group("MV"),
                ResultRow::votes("Y", 10).group("XA"),
                ResultRow::votes("N", 5).group("ED"),
                ResultRow::votes("N", 6).group("MV"),
            ])
            .build()
            .unwrap();
        let y = ChoiceId::from("Y");
        let n = ChoiceId::from("N");
        let ia = RowFilter::default().group(&GroupCode::from("IA"));
        assert_eq!(c.choice_total(&y, &RowFilter::default()), Ok(80));
        assert_eq!(c.choice_total(&y, &ia), Ok(70));
        assert_eq!(
            c.choice_total(&y, &RowFilter::default().group(&GroupCode::from("ED"))),
            Ok(40)
        );
        assert_eq!(c.choice_total(&n, &RowFilter::default()), Ok(11));
        assert_eq!(c.choice_total(&n, &ia), Ok(11));
    }

    #[test]
    fn cross_endorsed_votes_are_split_between_parties() {
        let c = ContestBuilder::new("gov", "Governor")
            .stat_types(&[StatType::new(stats::TOTAL, "Ballots Counted")])
            .choice(Choice::new("A", "Alice").party("DEM"))
            .choice(Choice::new("B", "Bob").party("REP"))
            .rows(vec![
                ResultRow::votes("A", 80),
                ResultRow::votes("A", 4).party("WFP"),
                ResultRow::votes("B", 50),
            ])
            .build()
            .unwrap();
        let stat = StatCode::from(stats::TOTAL);
        let by_party = |p: &str| {
            c.get_total(&stat, &RowFilter::default().any_choice().party(&PartyId::from(p)))
        };
        assert_eq!(by_party("DEM"), Ok(76));
        assert_eq!(by_party("WFP"), Ok(4));
        assert_eq!(by_party("REP"), Ok(50));
        assert_eq!(c.choice_total(&ChoiceId::from("A"), &RowFilter::default()), Ok(80));
        assert_eq!(
            c.parties(),
            vec![PartyId::from("DEM"), PartyId::from("REP"), PartyId::from("WFP")]
        );
    }

    #[test]
    fn iter_rows_returns_raw_rows() {
        let c = mayor();
        let stat = StatCode::from(stats::TOTAL);
        let f = RowFilter::default().choice(&ChoiceId::from("A"));
        let counts: Vec<Count> = c.iter_rows(&stat, &f).unwrap().map(|r| r.count).collect();
        assert_eq!(counts, vec![30, 20, 15, 5, 10]);
        let f = f.group(&GroupCode::from("MV"));
        let counts: Vec<Count> = c.iter_rows(&stat, &f).unwrap().map(|r| r.count).collect();
        assert_eq!(counts, vec![20, 10]);
    }
}
