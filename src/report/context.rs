// Assembles the data consumed by the rendering layer, for one language.

use std::collections::BTreeMap;

use results_tabulation::rcv::{RcvResults, RcvTabulator, RoundStatus};
use results_tabulation::turnout::Turnout;

use crate::report::{io_json::*, *};

// Phrases used when the election does not translate them.
const DEFAULT_PHRASES: &[(&str, &str)] = &[
    ("precinct", "Precinct"),
    ("total", "Total"),
    ("round", "Round"),
    ("continuingBallots", "Continuing Ballots"),
    ("exhaustedBallots", "Exhausted Ballots"),
    ("registeredVoters", "Registered Voters"),
    ("eligibleVoters", "Eligible Voters (estimated)"),
    ("ballotsCast", "Ballots Cast"),
];

/// Resolves the labels of the report in one language, falling back to English.
pub struct Labels<'a> {
    lang: String,
    translations: &'a BTreeMap<String, BTreeMap<String, String>>,
}

impl<'a> Labels<'a> {
    pub fn new(lang: &str, translations: &'a BTreeMap<String, BTreeMap<String, String>>) -> Labels<'a> {
        Labels {
            lang: lang.to_string(),
            translations,
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn text(&self, text: &I18nText) -> String {
        match text.get(&self.lang) {
            Some(s) => s.to_string(),
            None => {
                warn!(
                    "No {} translation for {:?}, using English",
                    self.lang,
                    text.english()
                );
                text.english().to_string()
            }
        }
    }

    pub fn phrase(&self, key: &str) -> String {
        let lookup = |lang: &str| {
            self.translations
                .get(lang)
                .and_then(|m| m.get(key))
                .map(|s| s.to_string())
        };
        if let Some(s) = lookup(&self.lang) {
            return s;
        }
        if self.lang != ENGLISH {
            warn!("No {} translation for phrase {}, using English", self.lang, key);
        }
        lookup(ENGLISH)
            .or_else(|| {
                DEFAULT_PHRASES
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
            })
            .unwrap_or_else(|| key.to_string())
    }
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum NavNode {
    #[serde(rename = "header")]
    Header { title: String, children: Vec<NavNode> },
    #[serde(rename = "contest")]
    Contest { id: String, title: String },
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct TotalLine {
    pub id: String,
    pub label: String,
    pub count: Count,
    #[serde(rename = "formattedCount")]
    pub formatted_count: String,
    pub percent: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ChoiceLine {
    pub id: String,
    pub label: String,
    pub party: Option<String>,
    pub votes: Count,
    #[serde(rename = "formattedVotes")]
    pub formatted_votes: String,
    pub percent: String,
    #[serde(rename = "barWidth")]
    pub bar_width: f64,
    pub cutoff: f64,
    #[serde(rename = "cutoffPercent")]
    pub cutoff_percent: f64,
    #[serde(rename = "isSuccessful")]
    pub is_successful: bool,
    #[serde(rename = "isWritein")]
    pub is_writein: bool,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct RcvChoiceLine {
    pub id: String,
    pub label: String,
    pub votes: Count,
    pub transfer: i64,
    pub percent: String,
    #[serde(rename = "barWidth")]
    pub bar_width: f64,
    pub status: String,
    #[serde(rename = "isSuccessful")]
    pub is_successful: bool,
    #[serde(rename = "afterEliminated")]
    pub after_eliminated: bool,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct RcvRoundReport {
    pub round: u32,
    pub continuing: Count,
    pub exhausted: Option<Count>,
    pub choices: Vec<RcvChoiceLine>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct RcvReport {
    pub rounds: u32,
    #[serde(rename = "scalePercent")]
    pub scale_percent: f64,
    #[serde(rename = "cutoffPercent")]
    pub cutoff_percent: f64,
    #[serde(rename = "roundTables")]
    pub round_tables: Vec<RcvRoundReport>,
    /// Choice ids, the winners first.
    pub order: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ApprovalReport {
    pub threshold: String,
    pub choice: String,
    pub passed: Option<bool>,
    pub cutoff: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ContestReport {
    pub id: String,
    pub title: String,
    #[serde(rename = "precinctsReporting")]
    pub precincts_reporting: u32,
    #[serde(rename = "totalPrecincts")]
    pub total_precincts: u32,
    #[serde(rename = "percentReporting")]
    pub percent_reporting: String,
    #[serde(rename = "canVoteForMultiple")]
    pub can_vote_for_multiple: bool,
    /// None when the contest does not count ballots (`RSTot`).
    #[serde(rename = "totalVotes")]
    pub total_votes: Option<Count>,
    pub stats: Vec<TotalLine>,
    pub choices: Vec<ChoiceLine>,
    #[serde(rename = "maxDisplayVote")]
    pub max_display_vote: Count,
    pub rcv: Option<RcvReport>,
    pub approval: Option<ApprovalReport>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct TurnoutReport {
    pub title: String,
    pub registered: TotalLine,
    /// Always an estimate.
    pub eligible: Option<TotalLine>,
    #[serde(rename = "ballotsCast")]
    pub ballots_cast: TotalLine,
    #[serde(rename = "percentOfRegistered")]
    pub percent_of_registered: String,
    #[serde(rename = "percentOfEligible")]
    pub percent_of_eligible: Option<String>,
    #[serde(rename = "byVotingGroup")]
    pub by_voting_group: Vec<TotalLine>,
    #[serde(rename = "byParty")]
    pub by_party: Vec<TotalLine>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ReportContext {
    pub lang: String,
    #[serde(rename = "ballotTitle")]
    pub ballot_title: String,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
    #[serde(rename = "buildTime")]
    pub build_time: Option<String>,
    pub navigation: Vec<NavNode>,
    pub contests: Vec<ContestReport>,
    pub turnout: Option<TurnoutReport>,
}

/// What the report shows, shared by all the languages.
#[derive(PartialEq, Debug, Clone)]
pub struct ContextSettings {
    pub summary_selector: Selector,
    pub stats_selector: Selector,
    pub precision: Precision,
    pub build_time: Option<String>,
}

/// A contest with its description.
pub struct LoadedContest<'a> {
    pub def: &'a ContestDef,
    pub contest: Contest,
}

fn choice_label(labels: &Labels, def: &ContestDef, choice: &ChoiceId) -> String {
    def.choices
        .iter()
        .find(|c| c.id == choice.as_str())
        .map(|c| labels.text(&c.label))
        .unwrap_or_else(|| choice.to_string())
}

pub fn key_label(labels: &Labels, bundle: &ElectionBundle, def: &ContestDef, key: &TotalKey) -> String {
    let text = match key {
        TotalKey::Stat(s) => bundle.stat_label(s.as_str()),
        TotalKey::Group(g) => bundle.group_label(g.as_str()),
        TotalKey::Party(p) => bundle.party_label(p.as_str()),
        TotalKey::Choice(c) => return choice_label(labels, def, c),
    };
    text.map(|t| labels.text(t))
        .unwrap_or_else(|| key.id().to_string())
}

fn total_line(id: &str, label: String, count: Count, percent: Option<String>) -> TotalLine {
    TotalLine {
        id: id.to_string(),
        label,
        count,
        formatted_count: format_count(count),
        percent,
    }
}

fn status_name(status: RoundStatus) -> String {
    match status {
        RoundStatus::Continuing => "continuing",
        RoundStatus::Elected => "elected",
        RoundStatus::Eliminated => "eliminated",
    }
    .to_string()
}

fn rcv_report(
    labels: &Labels,
    lc: &LoadedContest,
    results: &RcvResults,
    precision: Precision,
) -> RcvReport {
    let round_tables = results
        .rounds
        .iter()
        .map(|r| RcvRoundReport {
            round: r.round,
            continuing: r.continuing,
            exhausted: r.exhausted,
            choices: r
                .choices
                .iter()
                .map(|rc| RcvChoiceLine {
                    id: rc.choice.to_string(),
                    label: choice_label(labels, lc.def, &rc.choice),
                    votes: rc.votes,
                    transfer: rc.transfer,
                    percent: format_percent(rc.votes, r.continuing, precision),
                    bar_width: results.bar_width(rc.percent),
                    status: status_name(rc.status),
                    is_successful: rc.is_successful,
                    after_eliminated: rc.after_eliminated,
                })
                .collect(),
        })
        .collect();
    RcvReport {
        rounds: lc.contest.rcv_rounds(),
        scale_percent: results.scale_percent,
        cutoff_percent: results.cutoff_percent,
        round_tables,
        order: results.order.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn contest_report(
    labels: &Labels,
    bundle: &ElectionBundle,
    lc: &LoadedContest,
    settings: &ContextSettings,
) -> ReportResult<ContestReport> {
    let contest = &lc.contest;
    let precision = settings.precision;
    let total_votes = if contest.tracks_stat(&StatCode::from(stats::TOTAL)) {
        Some(contest.total_votes().context(TabulationSnafu {})?)
    } else {
        None
    };

    let stats_view = contest
        .totals_for(&settings.stats_selector, &RowFilter::default())
        .context(TabulationSnafu {})?;
    let stats: Vec<TotalLine> = stats_view
        .entries()
        .iter()
        .map(|e| {
            total_line(
                e.key.id(),
                key_label(labels, bundle, lc.def, &e.key),
                e.total,
                None,
            )
        })
        .collect();

    let mut choices: Vec<ChoiceLine> = Vec::new();
    let mut max_display_vote = 0;
    if !contest.choices().is_empty() {
        let scale = contest
            .bar_scale(&settings.summary_selector)
            .context(TabulationSnafu {})?;
        max_display_vote = scale.max_display_vote;
        for bar in scale.bars.iter() {
            let choice = contest.choice(&bar.choice);
            choices.push(ChoiceLine {
                id: bar.choice.to_string(),
                label: choice_label(labels, lc.def, &bar.choice),
                party: choice
                    .and_then(|c| c.party.as_ref())
                    .map(|p| p.to_string()),
                votes: bar.votes,
                formatted_votes: format_count(bar.votes),
                percent: format_percent(bar.votes, total_votes.unwrap_or(0), precision),
                bar_width: bar.width_percent,
                cutoff: bar.cutoff,
                cutoff_percent: bar.cutoff_percent,
                is_successful: choice.map(|c| c.is_successful).unwrap_or(false),
                is_writein: choice.map(|c| c.is_writein).unwrap_or(false),
            });
        }
    }

    // Round tables only when the contest has rounds, not merely the RCV flag.
    let rcv = if contest.has_rcv_rounds() {
        let continuing_stat = lc
            .def
            .rcv
            .as_ref()
            .and_then(|r| r.continuing_stat.as_deref())
            .unwrap_or(stats::TOTAL);
        let results = RcvTabulator::new(contest)
            .with_continuing_stat(&StatCode::from(continuing_stat))
            .tabulate()
            .context(TabulationSnafu {})?;
        Some(rcv_report(labels, lc, &results, precision))
    } else {
        None
    };

    let approval = match contest.approval() {
        Some(a) => Some(ApprovalReport {
            threshold: format!("{}/{}", a.threshold.numerator, a.threshold.denominator),
            choice: a.choice.to_string(),
            passed: a.passed,
            cutoff: contest.approval_cutoff(&a.choice).context(TabulationSnafu {})?,
        }),
        None => None,
    };

    Ok(ContestReport {
        id: contest.id().to_string(),
        title: labels.text(&lc.def.title),
        precincts_reporting: contest.precincts_reporting(),
        total_precincts: contest.total_precincts(),
        percent_reporting: format_percent(
            contest.precincts_reporting() as Count,
            contest.total_precincts() as Count,
            Precision::Whole,
        ),
        can_vote_for_multiple: contest.can_vote_for_multiple(),
        total_votes,
        stats,
        choices,
        max_display_vote,
        rcv,
        approval,
    })
}

pub fn turnout_report(
    labels: &Labels,
    bundle: &ElectionBundle,
    lc: &LoadedContest,
    precision: Precision,
) -> ReportResult<TurnoutReport> {
    let turnout = Turnout::new(&lc.contest).context(TabulationSnafu {})?;
    let summary = turnout.summary().context(TabulationSnafu {})?;
    let cast = summary.ballots_cast;
    let percent_of_cast = |count: Count| Some(format_percent(count, cast, precision));
    let lines = |view: &TotalsView| -> Vec<TotalLine> {
        view.entries()
            .iter()
            .map(|e| {
                total_line(
                    e.key.id(),
                    key_label(labels, bundle, lc.def, &e.key),
                    e.total,
                    percent_of_cast(e.total),
                )
            })
            .collect()
    };
    Ok(TurnoutReport {
        title: labels.text(&lc.def.title),
        registered: total_line(
            stats::REGISTERED,
            labels.phrase("registeredVoters"),
            summary.registered,
            None,
        ),
        eligible: summary.eligible.map(|e| {
            total_line(stats::ELIGIBLE, labels.phrase("eligibleVoters"), e.value, None)
        }),
        ballots_cast: total_line(stats::CAST, labels.phrase("ballotsCast"), cast, None),
        percent_of_registered: format_percent(cast, summary.registered, precision),
        percent_of_eligible: summary
            .eligible
            .map(|e| format_percent(cast, e.value, precision)),
        by_voting_group: lines(&summary.by_voting_group),
        by_party: lines(&summary.cast_by_party),
    })
}

fn navigation(
    labels: &Labels,
    bundle: &ElectionBundle,
    items: &[BallotItem],
) -> ReportResult<Vec<NavNode>> {
    let mut res = Vec::with_capacity(items.len());
    for item in items.iter() {
        let node = match item {
            BallotItem::Header { title, children } => NavNode::Header {
                title: labels.text(title),
                children: navigation(labels, bundle, children)?,
            },
            BallotItem::Contest(id) => {
                let def = bundle.contest(id).context(UnknownContestSnafu {
                    contest: id.clone(),
                    path: "ballot",
                })?;
                NavNode::Contest {
                    id: id.clone(),
                    title: labels.text(&def.title),
                }
            }
        };
        res.push(node);
    }
    Ok(res)
}

/// The whole report in one language.
pub fn build_context(
    labels: &Labels,
    bundle: &ElectionBundle,
    contests: &[LoadedContest],
    turnout: Option<&LoadedContest>,
    settings: &ContextSettings,
) -> ReportResult<ReportContext> {
    info!("build_context: language {}", labels.lang());
    let nav = if bundle.ballot.is_empty() {
        contests
            .iter()
            .map(|lc| NavNode::Contest {
                id: lc.def.id.clone(),
                title: labels.text(&lc.def.title),
            })
            .collect()
    } else {
        navigation(labels, bundle, &bundle.ballot)?
    };
    let mut reports = Vec::with_capacity(contests.len());
    for lc in contests.iter() {
        reports.push(contest_report(labels, bundle, lc, settings)?);
    }
    let turnout = match turnout {
        Some(lc) => Some(turnout_report(labels, bundle, lc, settings.precision)?),
        None => None,
    };
    Ok(ReportContext {
        lang: labels.lang().to_string(),
        ballot_title: labels.text(&bundle.ballot_title),
        election_date: bundle.election_date.clone(),
        build_time: settings.build_time.clone(),
        navigation: nav,
        contests: reports,
        turnout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translations() -> BTreeMap<String, BTreeMap<String, String>> {
        let mut res = BTreeMap::new();
        let mut es = BTreeMap::new();
        es.insert("total".to_string(), "Total".to_string());
        es.insert("round".to_string(), "Ronda".to_string());
        res.insert("es".to_string(), es);
        res
    }

    #[test]
    fn labels_fall_back_to_english() {
        let tr = translations();
        let es = Labels::new("es", &tr);
        assert_eq!(es.phrase("round"), "Ronda");
        assert_eq!(es.phrase("ballotsCast"), "Ballots Cast");
        assert_eq!(es.phrase("no-such-phrase"), "no-such-phrase");
        let mut m = BTreeMap::new();
        m.insert("en".to_string(), "Mayor".to_string());
        m.insert("es".to_string(), "Alcalde".to_string());
        assert_eq!(es.text(&I18nText::Translated(m.clone())), "Alcalde");
        let zh = Labels::new("zh", &tr);
        assert_eq!(zh.text(&I18nText::Translated(m)), "Mayor");
        assert_eq!(zh.text(&I18nText::Plain("Measure A".to_string())), "Measure A");
    }

    #[test]
    fn nav_nodes_are_tagged() {
        let node = NavNode::Header {
            title: "City".to_string(),
            children: vec![NavNode::Contest {
                id: "mayor".to_string(),
                title: "Mayor".to_string(),
            }],
        };
        let js = serde_json::to_value(&node).unwrap();
        assert_eq!(js["type"], "header");
        assert_eq!(js["children"][0]["type"], "contest");
        assert_eq!(js["children"][0]["id"], "mayor");
    }

    const BUNDLE: &str = r#"{
        "ballotTitle": "General Election",
        "languages": ["en", "es"],
        "statTypes": [
            {"code": "RSTot", "label": "Ballots Counted"},
            {"code": "RSReg", "label": "Registered Voters"},
            {"code": "RSCst", "label": "Ballots Cast"}
        ],
        "votingGroups": [{"code": "ED", "label": {"en": "Election Day", "es": "Día de la Elección"}}],
        "ballot": [{"header": {"title": "Measures", "children": [{"contest": "measure-a"}]}}],
        "contests": [{
            "id": "measure-a",
            "title": {"en": "Measure A", "es": "Medida A"},
            "statTypes": ["RSTot"],
            "choices": [{"id": "yes", "label": {"en": "Yes", "es": "Sí"}}, {"id": "no", "label": "No"}],
            "precincts": ["P1"],
            "precinctsReporting": 1,
            "totalPrecincts": 1,
            "approval": {"threshold": "2/3", "choice": "yes", "passed": true},
            "rows": [
                {"stat": "RSTot", "choice": "yes", "count": 210},
                {"stat": "RSTot", "choice": "no", "count": 90},
                {"stat": "RSTot", "count": 300}
            ]
        }],
        "turnout": {
            "id": "TURNOUT",
            "title": "Voter Turnout",
            "statTypes": ["RSReg", "RSCst"],
            "rows": [
                {"stat": "RSReg", "count": 1000},
                {"stat": "RSCst", "count": 650},
                {"stat": "RSCst", "group": "ED", "count": 650}
            ]
        }
    }"#;

    fn settings() -> ContextSettings {
        ContextSettings {
            summary_selector: Selector::choices(),
            stats_selector: Selector::parse("STATS"),
            precision: Precision::Two,
            build_time: None,
        }
    }

    #[test]
    fn approval_contest_context() {
        let bundle: ElectionBundle = serde_json::from_str(BUNDLE).unwrap();
        let def = &bundle.contests[0];
        let lc = LoadedContest {
            def,
            contest: build_contest(&bundle, def, &[]).unwrap(),
        };
        let tr = bundle.translations.clone();
        let es = Labels::new("es", &tr);
        let report = contest_report(&es, &bundle, &lc, &settings()).unwrap();
        assert_eq!(report.title, "Medida A");
        assert_eq!(report.percent_reporting, "100%");
        assert_eq!(report.max_display_vote, 300);
        assert_eq!(report.choices[0].label, "Sí");
        assert_eq!(report.choices[0].percent, "70.00%");
        assert_eq!(report.choices[0].cutoff, 200.0);
        assert_eq!(report.choices[1].cutoff, 0.0);
        assert_eq!(report.rcv, None);
        let approval = report.approval.unwrap();
        assert_eq!(approval.threshold, "2/3");
        assert_eq!(approval.passed, Some(true));
    }

    #[test]
    fn full_context() {
        let bundle: ElectionBundle = serde_json::from_str(BUNDLE).unwrap();
        let contests: Vec<LoadedContest> = bundle
            .contests
            .iter()
            .map(|def| LoadedContest {
                def,
                contest: build_contest(&bundle, def, &[]).unwrap(),
            })
            .collect();
        let tdef = bundle.turnout.as_ref().unwrap();
        let turnout = LoadedContest {
            def: tdef,
            contest: build_contest(&bundle, tdef, &[]).unwrap(),
        };
        let labels = Labels::new("en", &bundle.translations);
        let ctx = build_context(&labels, &bundle, &contests, Some(&turnout), &settings()).unwrap();
        assert_eq!(
            ctx.navigation,
            vec![NavNode::Header {
                title: "Measures".to_string(),
                children: vec![NavNode::Contest {
                    id: "measure-a".to_string(),
                    title: "Measure A".to_string()
                }]
            }]
        );
        let t = ctx.turnout.unwrap();
        assert_eq!(t.percent_of_registered, "65.00%");
        assert_eq!(t.eligible, None);
        assert_eq!(t.by_voting_group[0].label, "Election Day");
        assert_eq!(t.by_voting_group[0].percent, Some("100.00%".to_string()));
    }
}
