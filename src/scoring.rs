// src/scoring.rs
//! Additive keyword scoring. All weights and keywords come from the rules file.

use serde::Deserialize;

use crate::ingest::types::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    /// `weight` for every distinct keyword found
    PerMatch,
    /// `weight` once if any keyword is found
    Flat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signal {
    pub name: String,
    pub weight: i32,
    pub mode: SignalMode,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringRules {
    #[serde(default)]
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone)]
pub struct PriorityScorer {
    signals: Vec<Signal>,
}

impl PriorityScorer {
    /// Keywords are lower-cased and de-duplicated per signal.
    pub fn new(rules: &ScoringRules) -> Self {
        let signals = rules
            .signals
            .iter()
            .map(|s| {
                let mut keywords: Vec<String> = Vec::with_capacity(s.keywords.len());
                for kw in &s.keywords {
                    let kw = kw.trim().to_lowercase();
                    if !kw.is_empty() && !keywords.contains(&kw) {
                        keywords.push(kw);
                    }
                }
                Signal {
                    name: s.name.clone(),
                    weight: s.weight,
                    mode: s.mode,
                    keywords,
                }
            })
            .collect();
        Self { signals }
    }

    pub fn score(&self, title: &str, summary: &str) -> i32 {
        let haystack = format!("{title} {summary}").to_lowercase();
        self.score_haystack(&haystack)
    }

    pub fn score_item(&self, item: &Item) -> i32 {
        self.score_haystack(&item.haystack())
    }

    fn score_haystack(&self, haystack: &str) -> i32 {
        self.signals
            .iter()
            .map(|s| {
                let hits = s
                    .keywords
                    .iter()
                    .filter(|kw| haystack.contains(kw.as_str()))
                    .count() as i32;
                match s.mode {
                    SignalMode::PerMatch => s.weight.saturating_mul(hits),
                    SignalMode::Flat if hits > 0 => s.weight,
                    SignalMode::Flat => 0,
                }
            })
            .fold(0i32, i32::saturating_add)
    }
}
