use log::debug;

use std::collections::{BTreeMap, BTreeSet};

pub use crate::model::*;
use crate::store::{group_level, Contest, GroupCell, GroupLevel};

/// A builder for contests.
///
/// All the consistency checks on the data happen in [`ContestBuilder::build`], so
/// that a [`Contest`] is always valid once constructed.
///
/// ```
/// use results_tabulation::builder::ContestBuilder;
/// use results_tabulation::*;
///
/// let contest = ContestBuilder::new("measure-a", "Measure A")
///     .stat_types(&[StatType::new(stats::TOTAL, "Ballots Counted")])
///     .choice(Choice::new("yes", "Yes"))
///     .choice(Choice::new("no", "No"))
///     .row(ResultRow::votes("yes", 70))
///     .row(ResultRow::votes("no", 30))
///     .row(ResultRow::new(stats::TOTAL, 100))
///     .build()?;
///
/// assert_eq!(contest.total_votes()?, 100);
/// # Ok::<(), TabulationError>(())
/// ```
pub struct Builder {
    pub(crate) _contest: Contest,
    pub(crate) _declared_rcv_rounds: Option<u32>,
}

pub type ContestBuilder = Builder;

impl Builder {
    pub fn new(id: &str, title: &str) -> Builder {
        Builder {
            _contest: Contest {
                id: id.to_string(),
                title: title.to_string(),
                choices: Vec::new(),
                stat_types: Vec::new(),
                voting_groups: Vec::new(),
                precincts: Vec::new(),
                precincts_reporting: 0,
                total_precincts: 0,
                rows: Vec::new(),
                can_vote_for_multiple: false,
                is_rcv: false,
                rcv_rounds: 0,
                rcv_totals: Vec::new(),
                approval: None,
            },
            _declared_rcv_rounds: None,
        }
    }

    pub fn stat_types(mut self, stat_types: &[StatType]) -> Builder {
        self._contest.stat_types.extend(stat_types.iter().cloned());
        self
    }

    pub fn voting_groups(mut self, groups: &[VotingGroup]) -> Builder {
        self._contest.voting_groups.extend(groups.iter().cloned());
        self
    }

    /// Adds a choice. Choices keep the order in which they are added (ballot order).
    pub fn choice(mut self, choice: Choice) -> Builder {
        self._contest.choices.push(choice);
        self
    }

    /// Declares the reporting precincts and the precinct counts.
    pub fn precincts(mut self, precincts: &[&str], reporting: u32, total: u32) -> Builder {
        self._contest.precincts = precincts.iter().map(|p| PrecinctId::from(*p)).collect();
        self._contest.precincts_reporting = reporting;
        self._contest.total_precincts = total;
        self
    }

    pub fn precinct_ids(mut self, precincts: Vec<PrecinctId>) -> Builder {
        self._contest.precincts = precincts;
        self
    }

    pub fn precinct_counts(mut self, reporting: u32, total: u32) -> Builder {
        self._contest.precincts_reporting = reporting;
        self._contest.total_precincts = total;
        self
    }

    pub fn row(mut self, row: ResultRow) -> Builder {
        self._contest.rows.push(row);
        self
    }

    pub fn rows(mut self, rows: Vec<ResultRow>) -> Builder {
        self._contest.rows.extend(rows);
        self
    }

    pub fn can_vote_for_multiple(mut self, flag: bool) -> Builder {
        self._contest.can_vote_for_multiple = flag;
        self
    }

    /// Flags the contest as ranked-choice, with the round totals reported so far.
    pub fn rcv(mut self, rounds: Vec<RcvRoundTotals>) -> Builder {
        self._contest.is_rcv = true;
        self._contest.rcv_totals = rounds;
        self
    }

    /// The number of rounds announced by the feed. Defaults to the number of round totals.
    pub fn rcv_rounds(mut self, rounds: u32) -> Builder {
        self._contest.is_rcv = true;
        self._declared_rcv_rounds = Some(rounds);
        self
    }

    pub fn approval(mut self, approval: Approval) -> Builder {
        self._contest.approval = Some(approval);
        self
    }

    pub fn build(self) -> Result<Contest, TabulationError> {
        let mut contest = self._contest;
        for (idx, choice) in contest.choices.iter_mut().enumerate() {
            choice.index = idx;
        }
        contest.rcv_rounds = self
            ._declared_rcv_rounds
            .unwrap_or(contest.rcv_totals.len() as u32);
        check_ids(&contest)?;
        check_precincts(&contest)?;
        check_rows(&contest)?;
        check_double_counting(&contest)?;
        check_rcv(&contest)?;
        if let Some(approval) = &contest.approval {
            if contest.choice(&approval.choice).is_none() {
                return Err(TabulationError::UnknownChoice {
                    contest: contest.id.clone(),
                    choice: approval.choice.clone(),
                });
            }
        }
        debug!(
            "build: contest {}: {} choices, {} rows, {} rcv rounds",
            contest.id,
            contest.choices.len(),
            contest.rows.len(),
            contest.rcv_rounds
        );
        Ok(contest)
    }
}

fn check_ids(contest: &Contest) -> Result<(), TabulationError> {
    let duplicate = |id: &str| TabulationError::DuplicateId {
        contest: contest.id.clone(),
        id: id.to_string(),
    };
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for c in contest.choices.iter() {
        if !seen.insert(c.id.as_str()) {
            return Err(duplicate(c.id.as_str()));
        }
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for s in contest.stat_types.iter() {
        if !seen.insert(s.code.as_str()) {
            return Err(duplicate(s.code.as_str()));
        }
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for g in contest.voting_groups.iter() {
        if !seen.insert(g.code.as_str()) {
            return Err(duplicate(g.code.as_str()));
        }
    }
    Ok(())
}

fn check_precincts(contest: &Contest) -> Result<(), TabulationError> {
    let listed = contest.precincts.len() as u32;
    if contest.precincts_reporting > contest.total_precincts || listed > contest.total_precincts {
        return Err(TabulationError::PrecinctsReporting {
            contest: contest.id.clone(),
            reporting: contest.precincts_reporting.max(listed),
            total: contest.total_precincts,
        });
    }
    Ok(())
}

fn check_rows(contest: &Contest) -> Result<(), TabulationError> {
    let mut seen: BTreeSet<(
        &StatCode,
        Option<&GroupCode>,
        Option<&PartyId>,
        Option<&ChoiceId>,
        Option<&PrecinctId>,
    )> = BTreeSet::new();
    for r in contest.rows.iter() {
        contest.check_stat(&r.stat)?;
        if let Some(g) = &r.voting_group {
            if !contest.has_voting_group(g) {
                return Err(TabulationError::UnknownVotingGroup {
                    contest: contest.id.clone(),
                    group: g.clone(),
                });
            }
        }
        if let Some(cid) = &r.choice {
            if contest.choice(cid).is_none() {
                return Err(TabulationError::UnknownChoice {
                    contest: contest.id.clone(),
                    choice: cid.clone(),
                });
            }
        }
        if let Some(p) = &r.precinct {
            if !contest.precincts.is_empty() && !contest.precincts.contains(p) {
                return Err(TabulationError::UnknownPrecinct {
                    contest: contest.id.clone(),
                    precinct: p.clone(),
                });
            }
        }
        let key = (
            &r.stat,
            r.voting_group.as_ref(),
            r.party.as_ref(),
            r.choice.as_ref(),
            r.precinct.as_ref(),
        );
        if !seen.insert(key) {
            return Err(TabulationError::DuplicateRow {
                contest: contest.id.clone(),
                row: format!("{:?}", r),
            });
        }
    }
    Ok(())
}

// A combined row may only be larger than its subtotals (some groups may not be reported
// separately), never smaller. The same holds for the in-county subtotal against its parts
// and for a row without a party tag against the rows of its cell tagged with a party.
fn check_double_counting(contest: &Contest) -> Result<(), TabulationError> {
    type Key<'a> = (
        &'a StatCode,
        Option<&'a ChoiceId>,
        Option<&'a PartyId>,
        Option<&'a PrecinctId>,
    );
    type PartyKey<'a> = (
        &'a StatCode,
        Option<&'a GroupCode>,
        Option<&'a ChoiceId>,
        Option<&'a PrecinctId>,
    );
    let mut cells: BTreeMap<Key, GroupCell> = BTreeMap::new();
    let mut untagged: BTreeMap<PartyKey, Count> = BTreeMap::new();
    let mut tagged: BTreeMap<PartyKey, Count> = BTreeMap::new();
    for r in contest.rows.iter() {
        let key = (
            &r.stat,
            r.choice.as_ref(),
            r.party.as_ref(),
            r.precinct.as_ref(),
        );
        cells
            .entry(key)
            .or_default()
            .add(r.voting_group.as_ref(), r.count);
        let group = match group_level(r.voting_group.as_ref()) {
            GroupLevel::Combined => None,
            _ => r.voting_group.as_ref(),
        };
        let key = (&r.stat, group, r.choice.as_ref(), r.precinct.as_ref());
        let target = if r.party.is_none() {
            &mut untagged
        } else {
            &mut tagged
        };
        *target.entry(key).or_insert(0) += r.count;
    }
    let double_counted = |stat: &StatCode, combined: Count, groups: Count| {
        TabulationError::DoubleCounted {
            contest: contest.id.clone(),
            stat: stat.clone(),
            combined,
            groups,
        }
    };
    for (key, cell) in cells.iter() {
        if cell.combined_rows > 1 {
            return Err(TabulationError::DuplicateRow {
                contest: contest.id.clone(),
                row: format!("{:?}", key),
            });
        }
        if let Some(ia) = cell.in_county {
            if ia < cell.parts {
                return Err(double_counted(key.0, ia, cell.parts));
            }
        }
        if let Some(c) = cell.combined {
            if c < cell.groups_total() {
                return Err(double_counted(key.0, c, cell.groups_total()));
            }
        }
    }
    for (key, parties) in tagged.iter() {
        if let Some(c) = untagged.get(key) {
            if c < parties {
                return Err(double_counted(key.0, *c, *parties));
            }
        }
    }
    Ok(())
}

fn check_rcv(contest: &Contest) -> Result<(), TabulationError> {
    let found = contest.rcv_totals.len();
    if contest.is_rcv && found != contest.rcv_rounds as usize {
        return Err(TabulationError::MissingRcvRounds {
            contest: contest.id.clone(),
            expected: contest.rcv_rounds,
            found,
        });
    }
    Ok(())
}
