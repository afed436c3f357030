use log::debug;

use crate::model::*;
use crate::store::{ChoiceFilter, Contest, RowFilter};

/// One item of a [`Selector`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SelectorItem {
    /// `CHOICES`: every choice, in ballot order.
    AllChoices,
    /// `PARTIES`: every party, see [`Contest::parties`] for the order.
    AllParties,
    /// `STATS`: every declared stat, in declared order.
    AllStats,
    /// A choice id, a stat code or a party id.
    Word(String),
}

/// The rows requested by a report section, e.g. `"CHOICES RSWri RSUnd"`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Selector {
    pub items: Vec<SelectorItem>,
}

impl Selector {
    pub fn parse(s: &str) -> Selector {
        let items = s
            .split_whitespace()
            .map(|w| match w {
                "CHOICES" => SelectorItem::AllChoices,
                "PARTIES" => SelectorItem::AllParties,
                "STATS" => SelectorItem::AllStats,
                _ => SelectorItem::Word(w.to_string()),
            })
            .collect();
        Selector { items }
    }

    pub fn choices() -> Selector {
        Selector {
            items: vec![SelectorItem::AllChoices],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The dimension value a total was computed for.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum TotalKey {
    Stat(StatCode),
    Group(GroupCode),
    Party(PartyId),
    Choice(ChoiceId),
}

impl TotalKey {
    pub fn id(&self) -> &str {
        match self {
            TotalKey::Stat(s) => s.as_str(),
            TotalKey::Group(g) => g.as_str(),
            TotalKey::Party(p) => p.as_str(),
            TotalKey::Choice(c) => c.as_str(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TotalEntry {
    pub key: TotalKey,
    pub total: Count,
}

/// An ordered mapping from keys to totals, with the grand total of the entries.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TotalsView {
    entries: Vec<TotalEntry>,
    grand_total: Count,
}

impl TotalsView {
    pub fn new(entries: Vec<TotalEntry>) -> TotalsView {
        let grand_total = entries.iter().map(|e| e.total).sum();
        TotalsView {
            entries,
            grand_total,
        }
    }

    /// The entries, in the requested order.
    pub fn entries(&self) -> &[TotalEntry] {
        &self.entries
    }

    pub fn grand_total(&self) -> Count {
        self.grand_total
    }

    pub fn get(&self, key: &TotalKey) -> Option<Count> {
        self.entries.iter().find(|e| e.key == *key).map(|e| e.total)
    }

    /// The largest entry, or 0 when the view is empty.
    pub fn max_total(&self) -> Count {
        self.entries.iter().map(|e| e.total).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Contest {
    /// Expands a selector into keys. Words are matched against the choice ids, then the
    /// stat codes, then the parties. A key is only returned once.
    pub fn resolve_selector(&self, selector: &Selector) -> Result<Vec<TotalKey>, TabulationError> {
        let mut res: Vec<TotalKey> = Vec::new();
        let mut push = |k: TotalKey| {
            if !res.contains(&k) {
                res.push(k);
            }
        };
        for item in selector.items.iter() {
            match item {
                SelectorItem::AllChoices => {
                    for c in self.choices.iter() {
                        push(TotalKey::Choice(c.id.clone()));
                    }
                }
                SelectorItem::AllParties => {
                    for p in self.parties() {
                        push(TotalKey::Party(p));
                    }
                }
                SelectorItem::AllStats => {
                    for s in self.stat_types.iter() {
                        push(TotalKey::Stat(s.code.clone()));
                    }
                }
                SelectorItem::Word(w) => {
                    let cid = ChoiceId::from(w.as_str());
                    let stat = StatCode::from(w.as_str());
                    let party = PartyId::from(w.as_str());
                    if self.choice(&cid).is_some() {
                        push(TotalKey::Choice(cid));
                    } else if self.tracks_stat(&stat) {
                        push(TotalKey::Stat(stat));
                    } else if self.parties().contains(&party) {
                        push(TotalKey::Party(party));
                    } else {
                        return Err(TabulationError::UnknownSelector {
                            contest: self.id.clone(),
                            item: w.clone(),
                        });
                    }
                }
            }
        }
        Ok(res)
    }

    /// The totals of the given stats, in the given order.
    pub fn totals_by_stat(&self, stats: &[StatCode]) -> Result<TotalsView, TabulationError> {
        self.totals_by_stat_in(stats, &RowFilter::default())
    }

    /// Same as [`Contest::totals_by_stat`], restricted by a filter (a precinct, a party...).
    pub fn totals_by_stat_in(
        &self,
        stats: &[StatCode],
        filter: &RowFilter,
    ) -> Result<TotalsView, TabulationError> {
        let mut entries = Vec::with_capacity(stats.len());
        for s in stats.iter() {
            entries.push(TotalEntry {
                key: TotalKey::Stat(s.clone()),
                total: self.get_total(s, filter)?,
            });
        }
        Ok(TotalsView::new(entries))
    }

    /// The totals of one stat for each of the given voting groups.
    pub fn totals_by_voting_group(
        &self,
        stat: &StatCode,
        groups: &[GroupCode],
    ) -> Result<TotalsView, TabulationError> {
        let mut entries = Vec::with_capacity(groups.len());
        for g in groups.iter() {
            entries.push(TotalEntry {
                key: TotalKey::Group(g.clone()),
                total: self.get_total(stat, &RowFilter::default().group(g))?,
            });
        }
        Ok(TotalsView::new(entries))
    }

    /// The totals of one stat for every party of the contest.
    ///
    /// When the contest has choices, the votes of the choices are grouped by party.
    /// Otherwise (the turnout contest), the contest-level rows tagged with a party are used.
    pub fn totals_by_party(&self, stat: &StatCode) -> Result<TotalsView, TabulationError> {
        let mut entries = Vec::new();
        for p in self.parties() {
            let total = self.party_total(stat, &p, &RowFilter::default())?;
            entries.push(TotalEntry {
                key: TotalKey::Party(p),
                total,
            });
        }
        Ok(TotalsView::new(entries))
    }

    fn party_total(
        &self,
        stat: &StatCode,
        party: &PartyId,
        filter: &RowFilter,
    ) -> Result<Count, TabulationError> {
        let mut f = filter.clone().party(party);
        f.choice = if self.choices.is_empty() {
            ChoiceFilter::Contest
        } else {
            ChoiceFilter::AnyChoice
        };
        self.get_total(stat, &f)
    }

    /// A single total. Choices and parties count votes (`RSTot`), groups count the
    /// contest-level `RSTot` rows of the group.
    pub fn total_for_key(&self, key: &TotalKey, filter: &RowFilter) -> Result<Count, TabulationError> {
        let votes = StatCode::from(stats::TOTAL);
        match key {
            TotalKey::Stat(s) => self.get_total(s, filter),
            TotalKey::Choice(c) => self.choice_total(c, filter),
            TotalKey::Party(p) => self.party_total(&votes, p, filter),
            TotalKey::Group(g) => self.get_total(&votes, &filter.clone().group(g)),
        }
    }

    /// The totals of everything a selector names, in selector order.
    pub fn totals_for(&self, selector: &Selector, filter: &RowFilter) -> Result<TotalsView, TabulationError> {
        let keys = self.resolve_selector(selector)?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys.into_iter() {
            let total = self.total_for_key(&key, filter)?;
            entries.push(TotalEntry { key, total });
        }
        Ok(TotalsView::new(entries))
    }

    /// The selected choices, by descending votes. Ties keep the ballot order.
    ///
    /// Keys that are not choices are ignored.
    pub fn sorted_totals(&self, selector: &Selector) -> Result<Vec<(&Choice, Count)>, TabulationError> {
        let mut res: Vec<(&Choice, Count)> = Vec::new();
        for key in self.resolve_selector(selector)?.iter() {
            if let TotalKey::Choice(cid) = key {
                if let Some(choice) = self.choice(cid) {
                    res.push((choice, self.choice_total(cid, &RowFilter::default())?));
                }
            }
        }
        res.sort_by(|(c1, v1), (c2, v2)| v2.cmp(v1).then(c1.index.cmp(&c2.index)));
        debug!(
            "sorted_totals: contest {}: {:?}",
            self.id,
            res.iter()
                .map(|(c, v)| (c.id.as_str(), *v))
                .collect::<Vec<(&str, Count)>>()
        );
        Ok(res)
    }

    /// The largest total of the selection: the 100% reference of the bar charts.
    /// An empty selection gives 0.
    pub fn get_max_total(&self, selector: &Selector) -> Result<Count, TabulationError> {
        Ok(self.totals_for(selector, &RowFilter::default())?.max_total())
    }
}
