// The election description and its conversion into contests.

use std::collections::BTreeMap;

use results_tabulation::builder::ContestBuilder;

use crate::report::*;

pub const ENGLISH: &str = "en";

/// A label, either a single string or one string per language.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum I18nText {
    Plain(String),
    Translated(BTreeMap<String, String>),
}

impl I18nText {
    pub fn get(&self, lang: &str) -> Option<&str> {
        match self {
            I18nText::Plain(s) => Some(s.as_str()),
            I18nText::Translated(m) => m.get(lang).map(|s| s.as_str()),
        }
    }

    /// The English text, or any text if there is no English one.
    pub fn english(&self) -> &str {
        match self {
            I18nText::Plain(s) => s.as_str(),
            I18nText::Translated(m) => m
                .get(ENGLISH)
                .or_else(|| m.values().next())
                .map(|s| s.as_str())
                .unwrap_or(""),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CodeLabel {
    pub code: String,
    pub label: I18nText,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyDef {
    pub id: String,
    pub label: I18nText,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDef {
    pub id: String,
    pub label: I18nText,
    pub party: Option<String>,
    #[serde(rename = "isSuccessful", default)]
    pub is_successful: bool,
    #[serde(rename = "isWritein", default)]
    pub is_writein: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RowDef {
    pub stat: String,
    pub group: Option<String>,
    pub party: Option<String>,
    pub choice: Option<String>,
    pub precinct: Option<String>,
    pub count: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvRoundDef {
    pub round: u32,
    /// null once the choice is eliminated.
    pub votes: BTreeMap<String, Option<u64>>,
    #[serde(default)]
    pub stats: BTreeMap<String, u64>,
    #[serde(default)]
    pub elected: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvDef {
    /// Number of rounds announced. Defaults to the number of rounds in `results`.
    pub rounds: Option<u32>,
    #[serde(rename = "continuingStat")]
    pub continuing_stat: Option<String>,
    #[serde(default)]
    pub results: Vec<RcvRoundDef>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDef {
    pub threshold: String,
    pub choice: String,
    pub passed: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestDef {
    pub id: String,
    pub title: I18nText,
    /// Codes of the stats tracked by the contest. All the stats of the election by default.
    #[serde(rename = "statTypes")]
    pub stat_types: Option<Vec<String>>,
    /// Codes of the voting groups of the contest. All the groups of the election by default.
    #[serde(rename = "votingGroups")]
    pub voting_groups: Option<Vec<String>>,
    #[serde(default)]
    pub choices: Vec<ChoiceDef>,
    #[serde(default)]
    pub precincts: Vec<String>,
    #[serde(rename = "precinctsReporting", default)]
    pub precincts_reporting: u32,
    #[serde(rename = "totalPrecincts", default)]
    pub total_precincts: u32,
    #[serde(rename = "canVoteForMultiple", default)]
    pub can_vote_for_multiple: bool,
    pub rcv: Option<RcvDef>,
    pub approval: Option<ApprovalDef>,
    #[serde(default)]
    pub rows: Vec<RowDef>,
    #[serde(rename = "detailSelector")]
    pub detail_selector: Option<String>,
}

/// An entry of the ballot: a header grouping other entries, or a contest id.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum BallotItem {
    #[serde(rename = "header")]
    Header {
        title: I18nText,
        #[serde(default)]
        children: Vec<BallotItem>,
    },
    #[serde(rename = "contest")]
    Contest(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionBundle {
    #[serde(rename = "ballotTitle")]
    pub ballot_title: I18nText,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Phrases of the report, per language then per key.
    #[serde(default)]
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(rename = "statTypes")]
    pub stat_types: Vec<CodeLabel>,
    #[serde(rename = "votingGroups", default)]
    pub voting_groups: Vec<CodeLabel>,
    #[serde(default)]
    pub parties: Vec<PartyDef>,
    #[serde(default)]
    pub ballot: Vec<BallotItem>,
    pub contests: Vec<ContestDef>,
    pub turnout: Option<ContestDef>,
}

fn default_languages() -> Vec<String> {
    vec![ENGLISH.to_string()]
}

impl ElectionBundle {
    pub fn contest(&self, id: &str) -> Option<&ContestDef> {
        self.contests.iter().find(|c| c.id == id)
    }

    pub fn stat_label(&self, code: &str) -> Option<&I18nText> {
        self.stat_types
            .iter()
            .find(|s| s.code == code)
            .map(|s| &s.label)
    }

    pub fn group_label(&self, code: &str) -> Option<&I18nText> {
        self.voting_groups
            .iter()
            .find(|g| g.code == code)
            .map(|g| &g.label)
    }

    pub fn party_label(&self, id: &str) -> Option<&I18nText> {
        self.parties.iter().find(|p| p.id == id).map(|p| &p.label)
    }
}

pub fn read_election(path: &str) -> ReportResult<ElectionBundle> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let bundle: ElectionBundle =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    info!(
        "read_election: {}: {} contests, languages {:?}",
        path,
        bundle.contests.len(),
        bundle.languages
    );
    Ok(bundle)
}

fn row_from_def(def: &RowDef) -> ResultRow {
    ResultRow {
        stat: StatCode::from(def.stat.as_str()),
        voting_group: def.group.as_deref().map(GroupCode::from),
        party: def.party.as_deref().map(PartyId::from),
        choice: def.choice.as_deref().map(ChoiceId::from),
        precinct: def.precinct.as_deref().map(PrecinctId::from),
        count: def.count,
    }
}

// The votes are listed in ballot order. Unknown ids come last so that the
// tabulator reports them.
fn round_from_def(def: &RcvRoundDef, choices: &[ChoiceDef]) -> RcvRoundTotals {
    let mut res = RcvRoundTotals::new(def.round);
    for c in choices.iter() {
        if let Some(votes) = def.votes.get(&c.id) {
            res = res.votes(&c.id, *votes);
        }
    }
    for (cid, votes) in def.votes.iter() {
        if !choices.iter().any(|c| c.id == *cid) {
            res = res.votes(cid, *votes);
        }
    }
    for (stat, count) in def.stats.iter() {
        res = res.stat(stat, *count);
    }
    for cid in def.elected.iter() {
        res = res.elected(cid);
    }
    res
}

/// Builds a contest from its description and the rows read from the result files.
pub fn build_contest(
    bundle: &ElectionBundle,
    def: &ContestDef,
    extra_rows: &[ResultRow],
) -> ReportResult<Contest> {
    let stat_codes: Vec<String> = match &def.stat_types {
        Some(codes) => codes.clone(),
        None => bundle.stat_types.iter().map(|s| s.code.clone()).collect(),
    };
    let mut stat_types: Vec<StatType> = Vec::new();
    for code in stat_codes.iter() {
        let label = bundle.stat_label(code).context(UnknownCodeSnafu {
            contest: def.id.clone(),
            kind: "stat type",
            code: code.clone(),
        })?;
        stat_types.push(StatType::new(code, label.english()));
    }

    let group_codes: Vec<String> = match &def.voting_groups {
        Some(codes) => codes.clone(),
        None => bundle.voting_groups.iter().map(|g| g.code.clone()).collect(),
    };
    let mut voting_groups: Vec<VotingGroup> = Vec::new();
    for code in group_codes.iter() {
        let label = bundle.group_label(code).context(UnknownCodeSnafu {
            contest: def.id.clone(),
            kind: "voting group",
            code: code.clone(),
        })?;
        voting_groups.push(VotingGroup::new(code, label.english()));
    }

    let mut builder = ContestBuilder::new(&def.id, def.title.english())
        .stat_types(&stat_types)
        .voting_groups(&voting_groups)
        .precinct_ids(
            def.precincts
                .iter()
                .map(|p| PrecinctId::from(p.as_str()))
                .collect(),
        )
        .precinct_counts(def.precincts_reporting, def.total_precincts)
        .can_vote_for_multiple(def.can_vote_for_multiple);
    for c in def.choices.iter() {
        let mut choice = Choice::new(&c.id, c.label.english());
        if let Some(p) = &c.party {
            choice = choice.party(p);
        }
        if c.is_successful {
            choice = choice.successful();
        }
        if c.is_writein {
            choice = choice.writein();
        }
        builder = builder.choice(choice);
    }
    builder = builder
        .rows(def.rows.iter().map(row_from_def).collect())
        .rows(extra_rows.to_vec());
    if let Some(rcv) = &def.rcv {
        let rounds: Vec<RcvRoundTotals> = rcv
            .results
            .iter()
            .map(|r| round_from_def(r, &def.choices))
            .collect();
        builder = builder.rcv(rounds);
        if let Some(n) = rcv.rounds {
            builder = builder.rcv_rounds(n);
        }
    }
    if let Some(a) = &def.approval {
        let threshold = ApprovalThreshold::parse(&a.threshold).context(TabulationSnafu {})?;
        builder = builder.approval(Approval {
            threshold,
            choice: ChoiceId::from(a.choice.as_str()),
            passed: a.passed,
        });
    }
    let contest = builder.build().context(TabulationSnafu {})?;
    debug!(
        "build_contest: {}: {} rows ({} from result files)",
        def.id,
        def.rows.len() + extra_rows.len(),
        extra_rows.len()
    );
    Ok(contest)
}
