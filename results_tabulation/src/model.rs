// ********* Identifiers ***********

use std::error::Error;
use std::fmt::Display;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> $name {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> $name {
                $name(s)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// The short stable code of a statistic type (`RSTot`, `RSCst`, ...).
    StatCode
);
string_id!(
    /// The code of a voting group (`ED`, `MV`, ...).
    GroupCode
);
string_id!(PartyId);
string_id!(ChoiceId);
string_id!(PrecinctId);

pub type Count = u64;

/// Codes of the statistic types that carry a meaning for the tabulation.
///
/// Per-choice vote counts are recorded under [`stats::TOTAL`] with the choice set.
pub mod stats {
    /// Ballots counted: sum of the valid votes. Also the continuing ballots of an RCV round.
    pub const TOTAL: &str = "RSTot";
    pub const CAST: &str = "RSCst";
    pub const REGISTERED: &str = "RSReg";
    /// Estimated number of eligible voters.
    pub const ELIGIBLE: &str = "RSEli";
    pub const TURNOUT: &str = "RSTrn";
    pub const REJECTED: &str = "RSRej";
    pub const UNCOUNTED: &str = "RSUnc";
    pub const WRITE_IN: &str = "RSWri";
    pub const UNDERVOTES: &str = "RSUnd";
    pub const OVERVOTES: &str = "RSOvr";
    /// All the ranked choices were eliminated (RCV only).
    pub const EXHAUSTED: &str = "RSExh";
}

/// Codes of the usual voting groups.
///
/// A row without a group is the combined count for all the groups.
pub mod groups {
    pub const TOTAL: &str = "TO";
    pub const ELECTION_DAY: &str = "ED";
    pub const VOTE_BY_MAIL: &str = "MV";
    pub const EARLY_VOTING: &str = "EV";
    pub const IN_COUNTY: &str = "IA";
    pub const OTHER_COUNTIES: &str = "XA";
}

// ********* Input data structures ***********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StatType {
    pub code: StatCode,
    pub label: String,
}

impl StatType {
    pub fn new(code: &str, label: &str) -> StatType {
        StatType {
            code: StatCode::from(code),
            label: label.to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingGroup {
    pub code: GroupCode,
    pub label: String,
}

impl VotingGroup {
    pub fn new(code: &str, label: &str) -> VotingGroup {
        VotingGroup {
            code: GroupCode::from(code),
            label: label.to_string(),
        }
    }
}

/// A candidate or a ballot option.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Choice {
    pub id: ChoiceId,
    pub label: String,
    pub party: Option<PartyId>,
    /// Elected or passed, as reported by the results feed.
    pub is_successful: bool,
    pub is_writein: bool,
    /// Position on the ballot. Assigned when the contest is built.
    pub index: usize,
}

impl Choice {
    pub fn new(id: &str, label: &str) -> Choice {
        Choice {
            id: ChoiceId::from(id),
            label: label.to_string(),
            party: None,
            is_successful: false,
            is_writein: false,
            index: 0,
        }
    }

    pub fn party(mut self, party: &str) -> Choice {
        self.party = Some(PartyId::from(party));
        self
    }

    pub fn successful(mut self) -> Choice {
        self.is_successful = true;
        self
    }

    pub fn writein(mut self) -> Choice {
        self.is_writein = true;
        self
    }
}

/// The atomic fact of a results feed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultRow {
    pub stat: StatCode,
    pub voting_group: Option<GroupCode>,
    pub party: Option<PartyId>,
    pub choice: Option<ChoiceId>,
    pub precinct: Option<PrecinctId>,
    pub count: Count,
}

impl ResultRow {
    pub fn new(stat: &str, count: Count) -> ResultRow {
        ResultRow {
            stat: StatCode::from(stat),
            voting_group: None,
            party: None,
            choice: None,
            precinct: None,
            count,
        }
    }

    /// A vote count for a choice.
    pub fn votes(choice: &str, count: Count) -> ResultRow {
        ResultRow::new(stats::TOTAL, count).choice(choice)
    }

    pub fn group(mut self, group: &str) -> ResultRow {
        self.voting_group = Some(GroupCode::from(group));
        self
    }

    pub fn party(mut self, party: &str) -> ResultRow {
        self.party = Some(PartyId::from(party));
        self
    }

    pub fn choice(mut self, choice: &str) -> ResultRow {
        self.choice = Some(ChoiceId::from(choice));
        self
    }

    pub fn precinct(mut self, precinct: &str) -> ResultRow {
        self.precinct = Some(PrecinctId::from(precinct));
        self
    }
}

/// The fraction of affirmative votes required by a measure.
///
/// Kept as an exact fraction so that `2/3` does not suffer from rounding.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ApprovalThreshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl ApprovalThreshold {
    pub fn new(numerator: u64, denominator: u64) -> Result<ApprovalThreshold, TabulationError> {
        if denominator == 0 || numerator == 0 || numerator > denominator {
            return Err(TabulationError::InvalidThreshold {
                value: format!("{}/{}", numerator, denominator),
            });
        }
        Ok(ApprovalThreshold {
            numerator,
            denominator,
        })
    }

    /// Parses `"2/3"`, `"0.55"` or `"55%"`.
    pub fn parse(s: &str) -> Result<ApprovalThreshold, TabulationError> {
        let invalid = || TabulationError::InvalidThreshold {
            value: s.to_string(),
        };
        let trimmed = s.trim();
        if let Some((n, d)) = trimmed.split_once('/') {
            let n = n.trim().parse::<u64>().map_err(|_| invalid())?;
            let d = d.trim().parse::<u64>().map_err(|_| invalid())?;
            return ApprovalThreshold::new(n, d).map_err(|_| invalid());
        }
        let (digits, scale) = match trimmed.strip_suffix('%') {
            Some(p) => (p.trim(), 100),
            None => (trimmed, 1),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) || frac_part.len() > 9 {
            return Err(invalid());
        }
        let denominator = 10u64.pow(frac_part.len() as u32) * scale;
        let numerator = format!("{}{}", int_part, frac_part)
            .parse::<u64>()
            .map_err(|_| invalid())?;
        ApprovalThreshold::new(numerator, denominator).map_err(|_| invalid())
    }

    pub fn fraction(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// The number of votes marking the threshold.
    pub fn cutoff(&self, total_votes: Count) -> f64 {
        (self.numerator as f64 * total_votes as f64) / self.denominator as f64
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Approval {
    pub threshold: ApprovalThreshold,
    /// The choice compared against the threshold (usually "yes").
    pub choice: ChoiceId,
    /// Outcome reported by the results feed.
    pub passed: Option<bool>,
}

/// The counts of one ranked-choice round, as supplied by the results feed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RcvRoundTotals {
    pub round: u32,
    /// None when the choice has been eliminated.
    pub votes: Vec<(ChoiceId, Option<Count>)>,
    pub stats: Vec<(StatCode, Count)>,
    pub elected: Vec<ChoiceId>,
}

impl RcvRoundTotals {
    pub fn new(round: u32) -> RcvRoundTotals {
        RcvRoundTotals {
            round,
            votes: Vec::new(),
            stats: Vec::new(),
            elected: Vec::new(),
        }
    }

    pub fn votes(mut self, choice: &str, count: Option<Count>) -> RcvRoundTotals {
        self.votes.push((ChoiceId::from(choice), count));
        self
    }

    pub fn stat(mut self, stat: &str, count: Count) -> RcvRoundTotals {
        self.stats.push((StatCode::from(stat), count));
        self
    }

    pub fn elected(mut self, choice: &str) -> RcvRoundTotals {
        self.elected.push(ChoiceId::from(choice));
        self
    }

    pub fn stat_count(&self, stat: &StatCode) -> Option<Count> {
        self.stats.iter().find(|(s, _)| s == stat).map(|(_, c)| *c)
    }

    pub fn choice_votes(&self, choice: &ChoiceId) -> Option<Count> {
        self.votes
            .iter()
            .find(|(cid, _)| cid == choice)
            .and_then(|(_, c)| *c)
    }
}

// ********* Errors **********

/// Configuration errors: the data or the request does not match what the contest declares.
///
/// Silently using zero in these cases would corrupt an official report, so they are
/// all fatal for the contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TabulationError {
    UnknownStat { contest: String, stat: StatCode },
    UnknownVotingGroup { contest: String, group: GroupCode },
    UnknownParty { contest: String, party: PartyId },
    UnknownChoice { contest: String, choice: ChoiceId },
    UnknownPrecinct { contest: String, precinct: PrecinctId },
    UnknownSelector { contest: String, item: String },
    DuplicateId { contest: String, id: String },
    DuplicateRow { contest: String, row: String },
    DoubleCounted {
        contest: String,
        stat: StatCode,
        combined: Count,
        groups: Count,
    },
    PrecinctsReporting {
        contest: String,
        reporting: u32,
        total: u32,
    },
    MissingRcvRounds {
        contest: String,
        expected: u32,
        found: usize,
    },
    InconsistentRound {
        contest: String,
        round: u32,
        reason: String,
    },
    NotRcv { contest: String },
    InvalidThreshold { value: String },
}

impl Error for TabulationError {}

impl Display for TabulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabulationError::UnknownStat { contest, stat } => {
                write!(f, "contest {}: stat {} is not tracked", contest, stat)
            }
            TabulationError::UnknownVotingGroup { contest, group } => {
                write!(f, "contest {}: voting group {} is not declared", contest, group)
            }
            TabulationError::UnknownParty { contest, party } => {
                write!(f, "contest {}: no choice or row with party {}", contest, party)
            }
            TabulationError::UnknownChoice { contest, choice } => {
                write!(f, "contest {}: unknown choice {}", contest, choice)
            }
            TabulationError::UnknownPrecinct { contest, precinct } => {
                write!(f, "contest {}: precinct {} is not declared", contest, precinct)
            }
            TabulationError::UnknownSelector { contest, item } => {
                write!(f, "contest {}: cannot resolve selector item {:?}", contest, item)
            }
            TabulationError::DuplicateId { contest, id } => {
                write!(f, "contest {}: duplicate id {}", contest, id)
            }
            TabulationError::DuplicateRow { contest, row } => {
                write!(f, "contest {}: duplicate result row {}", contest, row)
            }
            TabulationError::DoubleCounted {
                contest,
                stat,
                combined,
                groups,
            } => write!(
                f,
                "contest {}: stat {}: combined count {} is lower than the sum of its subtotals {}",
                contest, stat, combined, groups
            ),
            TabulationError::PrecinctsReporting {
                contest,
                reporting,
                total,
            } => write!(
                f,
                "contest {}: {} precincts reporting out of {}",
                contest, reporting, total
            ),
            TabulationError::MissingRcvRounds {
                contest,
                expected,
                found,
            } => write!(
                f,
                "contest {}: expected {} RCV rounds, found {}",
                contest, expected, found
            ),
            TabulationError::InconsistentRound {
                contest,
                round,
                reason,
            } => write!(f, "contest {}: round {}: {}", contest, round, reason),
            TabulationError::NotRcv { contest } => {
                write!(f, "contest {} is not a ranked-choice contest", contest)
            }
            TabulationError::InvalidThreshold { value } => {
                write!(f, "invalid approval threshold {:?}", value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_parsing() {
        assert_eq!(
            ApprovalThreshold::parse("2/3"),
            Ok(ApprovalThreshold {
                numerator: 2,
                denominator: 3
            })
        );
        assert_eq!(
            ApprovalThreshold::parse("0.55"),
            Ok(ApprovalThreshold {
                numerator: 55,
                denominator: 100
            })
        );
        assert_eq!(
            ApprovalThreshold::parse("55%"),
            Ok(ApprovalThreshold {
                numerator: 55,
                denominator: 100
            })
        );
        assert_eq!(ApprovalThreshold::parse("1").map(|t| t.fraction()), Ok(1.0));
    }

    #[test]
    fn threshold_out_of_range() {
        for s in ["0", "0/3", "4/3", "1.5", "", "abc", "-0.5", "1/0"] {
            assert!(
                matches!(
                    ApprovalThreshold::parse(s),
                    Err(TabulationError::InvalidThreshold { .. })
                ),
                "{:?} should be rejected",
                s
            );
        }
    }

    #[test]
    fn threshold_cutoff() {
        let t = ApprovalThreshold::parse("2/3").unwrap();
        assert_eq!(t.cutoff(300), 200.0);
        assert_eq!(t.cutoff(0), 0.0);
    }
}
