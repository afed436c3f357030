use log::{debug, info};

use std::collections::{BTreeMap, BTreeSet};

use crate::format::percent;
use crate::model::*;
use crate::store::Contest;

/// The majority line of the RCV bar charts, in percent.
pub const MAJORITY_PERCENT: f64 = 50.0;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RoundStatus {
    Continuing,
    Elected,
    /// The choice is not in the next round.
    Eliminated,
}

/// One choice in one round.
#[derive(PartialEq, Debug, Clone)]
pub struct RoundChoice {
    pub choice: ChoiceId,
    pub votes: Count,
    /// Votes gained (or lost) since the previous round. 0 in the first round.
    pub transfer: i64,
    /// Percentage of the continuing ballots of the round.
    pub percent: Option<f64>,
    pub is_successful: bool,
    pub status: RoundStatus,
    /// Placeholder in the round after the elimination: no votes, and the votes of the
    /// previous round transferred away.
    pub after_eliminated: bool,
}

/// Statistics for one round.
#[derive(PartialEq, Debug, Clone)]
pub struct RcvRound {
    pub round: u32,
    pub continuing: Count,
    pub exhausted: Option<Count>,
    /// The choices still in the round and the ones eliminated in the previous round, in
    /// ballot order.
    pub choices: Vec<RoundChoice>,
}

impl RcvRound {
    pub fn get(&self, choice: &ChoiceId) -> Option<&RoundChoice> {
        self.choices.iter().find(|rc| rc.choice == *choice)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RcvResults {
    pub rounds: Vec<RcvRound>,
    /// The highest percentage of any choice in any round, placeholders excluded: the 100%
    /// width of the bars.
    pub scale_percent: f64,
    /// 50 when the majority line fits in the scale, 0 (no line) otherwise.
    pub cutoff_percent: f64,
    /// The last round reached by each choice (not counting its placeholder), in ballot order.
    pub max_rounds: Vec<(ChoiceId, u32)>,
    /// The choices by last round reached, then by votes in that round, then by id.
    pub order: Vec<ChoiceId>,
}

impl RcvResults {
    /// The width of a bar, in percent of the scale.
    pub fn bar_width(&self, percent: Option<f64>) -> f64 {
        match percent {
            Some(p) if self.scale_percent > 0.0 => p * 100.0 / self.scale_percent,
            _ => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn final_round(&self) -> Option<&RcvRound> {
        self.rounds.last()
    }

    /// The rounds in which a choice appears, with its results. The last one is a
    /// placeholder when the choice was eliminated.
    pub fn candidate_rounds(&self, choice: &ChoiceId) -> Vec<(u32, &RoundChoice)> {
        self.rounds
            .iter()
            .filter_map(|r| r.get(choice).map(|rc| (r.round, rc)))
            .collect()
    }
}

/// Derives the displayable sequence of rounds from the round totals of the feed.
///
/// The elimination decisions are taken upstream: this only checks the consistency of
/// the rounds and derives the percentages and the bar scaling.
pub struct RcvTabulator<'a> {
    contest: &'a Contest,
    continuing_stat: StatCode,
}

impl<'a> RcvTabulator<'a> {
    pub fn new(contest: &'a Contest) -> RcvTabulator<'a> {
        RcvTabulator {
            contest,
            continuing_stat: StatCode::from(stats::TOTAL),
        }
    }

    /// The stat holding the continuing ballots of each round (`RSTot` by default).
    pub fn with_continuing_stat(mut self, stat: &StatCode) -> RcvTabulator<'a> {
        self.continuing_stat = stat.clone();
        self
    }

    pub fn tabulate(&self) -> Result<RcvResults, TabulationError> {
        let contest = self.contest;
        if !contest.is_rcv() {
            return Err(TabulationError::NotRcv {
                contest: contest.id().to_string(),
            });
        }
        info!(
            "tabulate: contest {}: {} rounds, continuing stat {}",
            contest.id(),
            contest.rcv_rounds(),
            self.continuing_stat
        );
        let totals = contest.rcv_totals();
        let active = checks(contest, totals, &self.continuing_stat)?;
        let last_round = totals.len();

        let mut rounds: Vec<RcvRound> = Vec::with_capacity(totals.len());
        for (idx, rt) in totals.iter().enumerate() {
            // Already checked.
            let continuing = rt.stat_count(&self.continuing_stat).unwrap_or(0);
            let mut choices: Vec<RoundChoice> = Vec::new();
            for c in contest.choices().iter() {
                let prev = if idx == 0 {
                    None
                } else {
                    active[idx - 1].get(&c.id).copied()
                };
                let votes = match (active[idx].get(&c.id), prev) {
                    (Some(v), _) => *v,
                    (None, Some(p)) => {
                        choices.push(RoundChoice {
                            choice: c.id.clone(),
                            votes: 0,
                            transfer: vote_transfer(contest, rt.round, 0, p)?,
                            percent: percent(0, continuing),
                            is_successful: false,
                            status: RoundStatus::Eliminated,
                            after_eliminated: true,
                        });
                        continue;
                    }
                    (None, None) => continue,
                };
                let transfer = if idx == 0 {
                    0
                } else {
                    vote_transfer(contest, rt.round, votes, prev.unwrap_or(0))?
                };
                let is_successful =
                    rt.elected.contains(&c.id) || (c.is_successful && idx + 1 == last_round);
                let status = if is_successful {
                    RoundStatus::Elected
                } else if idx + 1 < last_round && !active[idx + 1].contains_key(&c.id) {
                    RoundStatus::Eliminated
                } else {
                    RoundStatus::Continuing
                };
                choices.push(RoundChoice {
                    choice: c.id.clone(),
                    votes,
                    transfer,
                    percent: percent(votes, continuing),
                    is_successful,
                    status,
                    after_eliminated: false,
                });
            }
            let round = RcvRound {
                round: rt.round,
                continuing,
                exhausted: rt.stat_count(&StatCode::from(stats::EXHAUSTED)),
                choices,
            };
            debug!("tabulate: round {:?}", round);
            rounds.push(round);
        }

        // Running maximum over every round and choice.
        let mut scale_percent: f64 = 0.0;
        let entries = rounds
            .iter()
            .flat_map(|r| r.choices.iter())
            .filter(|rc| !rc.after_eliminated);
        for rc in entries {
            if let Some(p) = rc.percent {
                if p > scale_percent {
                    scale_percent = p;
                }
            }
        }
        let cutoff_percent = if scale_percent >= MAJORITY_PERCENT {
            MAJORITY_PERCENT
        } else {
            0.0
        };

        let mut max_rounds: Vec<(ChoiceId, u32)> = Vec::new();
        for c in contest.choices().iter() {
            let reached = |r: &&RcvRound| r.get(&c.id).map_or(false, |rc| !rc.after_eliminated);
            if let Some(r) = rounds.iter().rev().find(reached) {
                max_rounds.push((c.id.clone(), r.round));
            }
        }
        let order = final_order(&rounds, &max_rounds);
        debug!(
            "tabulate: contest {}: scale {} cutoff {} order {:?}",
            contest.id(),
            scale_percent,
            cutoff_percent,
            order
        );
        Ok(RcvResults {
            rounds,
            scale_percent,
            cutoff_percent,
            max_rounds,
            order,
        })
    }
}

fn vote_transfer(
    contest: &Contest,
    round: u32,
    votes: Count,
    prev: Count,
) -> Result<i64, TabulationError> {
    i64::try_from(i128::from(votes) - i128::from(prev)).map_err(|_| {
        TabulationError::InconsistentRound {
            contest: contest.id().to_string(),
            round,
            reason: format!("transfer from {} to {} votes is out of range", prev, votes),
        }
    })
}

fn final_order(rounds: &[RcvRound], max_rounds: &[(ChoiceId, u32)]) -> Vec<ChoiceId> {
    let mut keyed: Vec<(u32, Count, ChoiceId)> = Vec::with_capacity(max_rounds.len());
    for (cid, max_round) in max_rounds.iter() {
        let votes = rounds
            .iter()
            .find(|r| r.round == *max_round)
            .and_then(|r| r.get(cid))
            .map(|rc| rc.votes)
            .unwrap_or(0);
        keyed.push((*max_round, votes, cid.clone()));
    }
    keyed.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));
    keyed.into_iter().map(|(_, _, cid)| cid).collect()
}

/// Checks the round totals and returns, for each round, the votes of the choices
/// still running.
fn checks(
    contest: &Contest,
    totals: &[RcvRoundTotals],
    continuing_stat: &StatCode,
) -> Result<Vec<BTreeMap<ChoiceId, Count>>, TabulationError> {
    let inconsistent = |round: u32, reason: String| TabulationError::InconsistentRound {
        contest: contest.id().to_string(),
        round,
        reason,
    };
    let mut res: Vec<BTreeMap<ChoiceId, Count>> = Vec::with_capacity(totals.len());
    // Choices that were out in a previous round.
    let mut dropped: BTreeSet<ChoiceId> = BTreeSet::new();
    for (idx, rt) in totals.iter().enumerate() {
        let expected = idx as u32 + 1;
        if rt.round != expected {
            return Err(inconsistent(
                rt.round,
                format!("expected round number {}", expected),
            ));
        }
        let mut active: BTreeMap<ChoiceId, Count> = BTreeMap::new();
        let mut seen: BTreeSet<&ChoiceId> = BTreeSet::new();
        for (cid, votes) in rt.votes.iter() {
            if contest.choice(cid).is_none() {
                return Err(TabulationError::UnknownChoice {
                    contest: contest.id().to_string(),
                    choice: cid.clone(),
                });
            }
            if !seen.insert(cid) {
                return Err(inconsistent(rt.round, format!("choice {} listed twice", cid)));
            }
            if let Some(v) = votes {
                if dropped.contains(cid) {
                    return Err(inconsistent(
                        rt.round,
                        format!("choice {} is back after its elimination", cid),
                    ));
                }
                active.insert(cid.clone(), *v);
            }
        }
        let continuing = match rt.stat_count(continuing_stat) {
            Some(c) => c,
            None => {
                return Err(inconsistent(
                    rt.round,
                    format!("missing continuing ballots ({})", continuing_stat),
                ))
            }
        };
        let sum: Count = active.values().sum();
        if sum > continuing {
            return Err(inconsistent(
                rt.round,
                format!("{} votes for {} continuing ballots", sum, continuing),
            ));
        }
        for cid in rt.elected.iter() {
            if !active.contains_key(cid) {
                return Err(inconsistent(
                    rt.round,
                    format!("elected choice {} is not in the round", cid),
                ));
            }
        }
        for c in contest.choices().iter() {
            if !active.contains_key(&c.id) {
                dropped.insert(c.id.clone());
            }
        }
        res.push(active);
    }
    debug!("checks: contest {}: {} rounds", contest.id(), res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContestBuilder;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rcv_contest(rounds: Vec<RcvRoundTotals>) -> Result<Contest, TabulationError> {
        ContestBuilder::new("mayor", "Mayor")
            .stat_types(&[StatType::new(stats::TOTAL, "Continuing Ballots")])
            .choice(Choice::new("A", "Ann").successful())
            .choice(Choice::new("B", "Ben"))
            .choice(Choice::new("C", "Cid"))
            .rcv(rounds)
            .build()
    }

    fn two_rounds() -> Vec<RcvRoundTotals> {
        vec![
            RcvRoundTotals::new(1)
                .votes("A", Some(45))
                .votes("B", Some(35))
                .votes("C", Some(20))
                .stat(stats::TOTAL, 100),
            RcvRoundTotals::new(2)
                .votes("A", Some(55))
                .votes("B", Some(45))
                .votes("C", None)
                .stat(stats::TOTAL, 100)
                .stat(stats::EXHAUSTED, 0)
                .elected("A"),
        ]
    }

    fn percents(round: &RcvRound) -> Vec<Option<f64>> {
        round.choices.iter().map(|rc| rc.percent).collect()
    }

    #[test]
    fn two_round_contest() {
        init_logs();
        let c = rcv_contest(two_rounds()).unwrap();
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        assert_eq!(res.rounds.len(), 2);
        assert_eq!(
            percents(&res.rounds[0]),
            vec![Some(45.0), Some(35.0), Some(20.0)]
        );
        // C only appears as a placeholder in round 2.
        assert_eq!(
            percents(&res.rounds[1]),
            vec![Some(55.0), Some(45.0), Some(0.0)]
        );
        assert_eq!(res.scale_percent, 55.0);
        assert_eq!(res.cutoff_percent, 50.0);
        assert_eq!(res.bar_width(Some(55.0)), 100.0);
        assert_eq!(
            res.order,
            vec![ChoiceId::from("A"), ChoiceId::from("B"), ChoiceId::from("C")]
        );
        assert_eq!(
            res.max_rounds,
            vec![
                (ChoiceId::from("A"), 2),
                (ChoiceId::from("B"), 2),
                (ChoiceId::from("C"), 1)
            ]
        );
    }

    #[test]
    fn transfers_and_statuses() {
        let c = rcv_contest(two_rounds()).unwrap();
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        let a = ChoiceId::from("A");
        let c_id = ChoiceId::from("C");
        let r1 = &res.rounds[0];
        let r2 = &res.rounds[1];
        assert_eq!(r1.get(&a).map(|rc| rc.transfer), Some(0));
        assert_eq!(r2.get(&a).map(|rc| rc.transfer), Some(10));
        assert_eq!(r1.get(&c_id).map(|rc| rc.status), Some(RoundStatus::Eliminated));
        assert_eq!(r1.get(&a).map(|rc| rc.status), Some(RoundStatus::Continuing));
        assert_eq!(r2.get(&a).map(|rc| rc.status), Some(RoundStatus::Elected));
        assert_eq!(r2.get(&a).map(|rc| rc.is_successful), Some(true));
        assert_eq!(r1.exhausted, None);
        assert_eq!(r2.exhausted, Some(0));
    }

    #[test]
    fn eliminated_choice_leaves_a_placeholder() {
        let c = rcv_contest(two_rounds()).unwrap();
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        let c_id = ChoiceId::from("C");
        let placeholder = res.rounds[1].get(&c_id).unwrap();
        assert!(placeholder.after_eliminated);
        assert_eq!(placeholder.votes, 0);
        assert_eq!(placeholder.transfer, -20);
        assert_eq!(placeholder.status, RoundStatus::Eliminated);
        assert!(!res.rounds[0].get(&c_id).unwrap().after_eliminated);
        let rounds: Vec<u32> = res.candidate_rounds(&c_id).iter().map(|(r, _)| *r).collect();
        assert_eq!(rounds, vec![1, 2]);
        assert!(res.max_rounds.contains(&(c_id, 1)));
    }

    #[test]
    fn placeholders_are_not_in_the_scale() {
        let c = rcv_contest(vec![
            RcvRoundTotals::new(1)
                .votes("A", Some(40))
                .votes("B", Some(30))
                .stat(stats::TOTAL, 100),
            // Every ballot is exhausted.
            RcvRoundTotals::new(2)
                .votes("A", Some(0))
                .votes("B", None)
                .stat(stats::TOTAL, 0),
        ])
        .unwrap();
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        let b = res.rounds[1].get(&ChoiceId::from("B")).unwrap();
        assert!(b.after_eliminated);
        assert_eq!(b.transfer, -30);
        assert_eq!(b.percent, None);
        assert_eq!(res.scale_percent, 40.0);
        assert_eq!(res.cutoff_percent, 0.0);
    }

    #[test]
    fn ties_are_ordered_by_choice_id() {
        let c = ContestBuilder::new("council", "Council")
            .stat_types(&[StatType::new(stats::TOTAL, "Continuing Ballots")])
            .choice(Choice::new("W", "Wes"))
            .choice(Choice::new("Z", "Zia"))
            .choice(Choice::new("B", "Bea"))
            .rcv(vec![RcvRoundTotals::new(1)
                .votes("W", Some(50))
                .votes("Z", Some(20))
                .votes("B", Some(20))
                .stat(stats::TOTAL, 90)])
            .build()
            .unwrap();
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        assert_eq!(
            res.order,
            vec![ChoiceId::from("W"), ChoiceId::from("B"), ChoiceId::from("Z")]
        );
    }

    #[test]
    fn transfer_out_of_range() {
        let c = rcv_contest(vec![
            RcvRoundTotals::new(1)
                .votes("A", Some(Count::MAX))
                .stat(stats::TOTAL, Count::MAX),
            RcvRoundTotals::new(2)
                .votes("A", Some(0))
                .stat(stats::TOTAL, 0),
        ])
        .unwrap();
        assert!(matches!(
            RcvTabulator::new(&c).tabulate(),
            Err(TabulationError::InconsistentRound { round: 2, .. })
        ));
    }

    #[test]
    fn no_cutoff_below_majority() {
        let c = rcv_contest(vec![RcvRoundTotals::new(1)
            .votes("A", Some(40))
            .votes("B", Some(35))
            .votes("C", Some(25))
            .stat(stats::TOTAL, 100)])
        .unwrap();
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        assert_eq!(res.scale_percent, 40.0);
        assert_eq!(res.cutoff_percent, 0.0);
        assert_eq!(res.bar_width(Some(20.0)), 50.0);
        // A is flagged successful by the feed and this is the last round.
        assert_eq!(
            res.rounds[0].get(&ChoiceId::from("A")).map(|rc| rc.is_successful),
            Some(true)
        );
    }

    #[test]
    fn zero_rounds_are_valid() {
        let c = rcv_contest(vec![]).unwrap();
        assert!(c.is_rcv());
        assert!(!c.has_rcv_rounds());
        let res = RcvTabulator::new(&c).tabulate().unwrap();
        assert!(res.is_empty());
        assert_eq!(res.scale_percent, 0.0);
        assert_eq!(res.cutoff_percent, 0.0);
        assert_eq!(res.bar_width(Some(10.0)), 0.0);
    }

    #[test]
    fn not_rcv() {
        let c = ContestBuilder::new("m", "Measure")
            .stat_types(&[StatType::new(stats::TOTAL, "Ballots Counted")])
            .build()
            .unwrap();
        assert_eq!(
            RcvTabulator::new(&c).tabulate(),
            Err(TabulationError::NotRcv {
                contest: "m".to_string()
            })
        );
    }

    #[test]
    fn custom_continuing_stat() {
        let rounds = vec![RcvRoundTotals::new(1)
            .votes("A", Some(30))
            .votes("B", Some(10))
            .stat("RSCon", 80)];
        let c = rcv_contest(rounds).unwrap();
        let res = RcvTabulator::new(&c).tabulate();
        assert!(matches!(res, Err(TabulationError::InconsistentRound { round: 1, .. })));
        let res = RcvTabulator::new(&c)
            .with_continuing_stat(&StatCode::from("RSCon"))
            .tabulate()
            .unwrap();
        assert_eq!(res.rounds[0].continuing, 80);
        assert_eq!(percents(&res.rounds[0]), vec![Some(37.5), Some(12.5)]);
    }

    #[test]
    fn inconsistent_rounds() {
        let mut rounds = two_rounds();
        rounds[1].round = 3;
        let c = rcv_contest(rounds).unwrap();
        assert!(matches!(
            RcvTabulator::new(&c).tabulate(),
            Err(TabulationError::InconsistentRound { round: 3, .. })
        ));

        let mut rounds = two_rounds();
        rounds.push(
            RcvRoundTotals::new(3)
                .votes("A", Some(55))
                .votes("C", Some(1))
                .stat(stats::TOTAL, 100),
        );
        let c = rcv_contest(rounds).unwrap();
        assert!(matches!(
            RcvTabulator::new(&c).tabulate(),
            Err(TabulationError::InconsistentRound { round: 3, .. })
        ));

        let rounds = vec![RcvRoundTotals::new(1)
            .votes("A", Some(60))
            .votes("B", Some(50))
            .stat(stats::TOTAL, 100)];
        let c = rcv_contest(rounds).unwrap();
        assert!(matches!(
            RcvTabulator::new(&c).tabulate(),
            Err(TabulationError::InconsistentRound { round: 1, .. })
        ));

        let rounds = vec![RcvRoundTotals::new(1)
            .votes("Z", Some(10))
            .stat(stats::TOTAL, 100)];
        let c = rcv_contest(rounds).unwrap();
        assert!(matches!(
            RcvTabulator::new(&c).tabulate(),
            Err(TabulationError::UnknownChoice { .. })
        ));
    }
}
