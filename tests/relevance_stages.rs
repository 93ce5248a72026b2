// tests/relevance_stages.rs
// Built-in rules against hand-picked items.

use chrono::{DateTime, Duration, TimeZone, Utc};

use alert_wire::config::Rules;
use alert_wire::ingest::types::{Item, SourceKind};
use alert_wire::relevance::{FilterReason, RelevanceFilter, Staleness};
use alert_wire::scoring::PriorityScorer;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
}

fn item(title: &str, link: &str, published: DateTime<Utc>) -> Item {
    Item {
        id: Some(link.to_string()),
        label: "Test".into(),
        kind: SourceKind::Feed,
        title: title.into(),
        link: Some(link.into()),
        published_at: Some(published.to_rfc3339()),
        summary: String::new(),
        score: 0,
    }
}

/// Stages 0–3, score, then the noise stage, in the order a run applies them.
fn admit(f: &RelevanceFilter, s: &PriorityScorer, it: &Item) -> Result<i32, FilterReason> {
    f.screen(it, now())?;
    let score = s.score_item(it);
    f.check_noise(it, score)?;
    Ok(score)
}

fn setup() -> (RelevanceFilter, PriorityScorer) {
    let rules = Rules::builtin().unwrap();
    (
        RelevanceFilter::new(&rules.filter, Duration::minutes(30)),
        PriorityScorer::new(&rules.scoring),
    )
}

#[test]
fn paywalled_link_is_rejected_first() {
    let (filter, scorer) = setup();
    let it = item(
        "Breaking: ransomware attack on hospital",
        "https://www.nytimes.com/2025/09/06/tech/ransomware.html",
        now() - Duration::minutes(1),
    );
    assert_eq!(
        admit(&filter, &scorer, &it),
        Err(FilterReason::Paywall("nytimes.com".into()))
    );
}

#[test]
fn sports_are_off_topic() {
    let (filter, _) = setup();
    let it = item(
        "NBA playoffs: late touchdown",
        "https://news.example.org/nba",
        now(),
    );
    assert!(matches!(
        filter.screen(&it, now()),
        Err(FilterReason::OffTopic(_))
    ));
}

#[test]
fn recency_boundary_is_inclusive() {
    let (filter, _) = setup();
    let edge = item("x", "https://a.example/1", now() - Duration::minutes(30));
    assert_eq!(filter.screen(&edge, now()), Ok(()));

    let past = item(
        "x",
        "https://a.example/2",
        now() - Duration::minutes(30) - Duration::seconds(1),
    );
    assert_eq!(
        filter.screen(&past, now()),
        Err(FilterReason::Stale(Staleness::TooOld))
    );

    // clock skew: future items count as recent
    let future = item("x", "https://a.example/3", now() + Duration::minutes(5));
    assert_eq!(filter.screen(&future, now()), Ok(()));
}

#[test]
fn override_keyword_beats_suppress_keyword() {
    let (filter, _) = setup();
    let boring = item("Routine meeting notes", "https://a.example/1", now());
    assert!(matches!(
        filter.check_noise(&boring, 0),
        Err(FilterReason::Noise(_))
    ));

    let saved = item(
        "Routine meeting ends in fraud charges",
        "https://a.example/2",
        now(),
    );
    assert_eq!(filter.check_noise(&saved, 0), Ok(()));
}

#[test]
fn high_score_exempts_from_noise() {
    let (filter, scorer) = setup();
    let it = item(
        "Trade deal signed as Elon Musk attends",
        "https://a.example/1",
        now() - Duration::minutes(2),
    );
    assert_eq!(admit(&filter, &scorer, &it), Ok(30));
}

#[test]
fn critical_vulnerability_passes_with_high_score() {
    let (filter, scorer) = setup();
    let it = item(
        "Critical vulnerability disclosed, CVE exploited in the wild",
        "https://news.example.org/cve",
        now() - Duration::minutes(2),
    );
    match admit(&filter, &scorer, &it) {
        Ok(score) => assert!(score >= 30, "score {score}"),
        Err(reason) => panic!("rejected: {reason}"),
    }
}
