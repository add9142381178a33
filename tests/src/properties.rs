#![cfg(test)]
use std::collections::BTreeSet;
use std::time::Duration;

use cdnmap_common::catalog::Catalog;
use cdnmap_common::config::CheckKind;
use cdnmap_common::record::{DomainRecord, EvidenceKind};
use cdnmap_core::{BatchHooks, BatchOutcome};

use crate::stubs::{self, Behavior, StubAnalyzer, StubSet};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn run(set: StubSet, names: &[String], double: bool) -> BatchOutcome {
    let (service, _) = set.into_service();
    let config = stubs::config(3, TIMEOUT).with_double(double);
    service.analyze_batch(names, &config, BatchHooks::default()).await
}

fn cdn_set(record: &DomainRecord) -> BTreeSet<String> {
    record.cdns().iter().cloned().collect()
}

/*************************************************************
                  No false positives (P1)
**************************************************************/

#[tokio::test]
async fn unrelated_evidence_never_yields_a_cdn() {
    let noise = [
        "mail.example.net",
        "nginx/1.25.3",
        "EXAMPLE-NET-ORG",
        "ns1.registrar-servers.com",
        "cloud-front.example",
        "fronting.example.org",
    ];
    let names: Vec<String> = (0..noise.len()).map(|i| format!("n{i}.example")).collect();

    let mut set = StubSet::default();
    for (name, value) in names.iter().zip(noise) {
        set.cname = set.cname.on(name, Behavior::evidence(&[value]));
        set.http = set.http.on(name, Behavior::evidence(&[value]));
        set.whois = set.whois.on(name, Behavior::evidence(&[value]));
        set.nameserver = set.nameserver.on(name, Behavior::evidence(&[value]));
    }
    let outcome = run(set, &names, false).await;

    assert_eq!(outcome.records.len(), noise.len());
    for record in &outcome.records {
        assert!(record.cdns().is_empty(), "{} matched {:?}", record.name(), record.cdns());
        assert!(!record.is_frontable());
    }
}

#[tokio::test]
async fn empty_evidence_never_yields_a_cdn() {
    let names: Vec<String> = (0..20).map(|i| format!("e{i}.example")).collect();

    let outcome = run(StubSet::default(), &names, true).await;

    assert_eq!(outcome.frontable().count(), 0);
    assert_eq!(outcome.tally.completed, 40);
}

/*************************************************************
                 Matcher deduplication (P2)
**************************************************************/

#[test]
fn repeated_evidence_matches_once() {
    let catalog = stubs::stub_catalog();
    let found = catalog.match_all(["a.cloudfront.net", "a.cloudfront.net", "b.cloudfront.net"]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "Cloudfront");
}

#[tokio::test]
async fn two_sources_for_one_cdn_do_not_duplicate() {
    let builtin = Catalog::builtin();
    assert!(!builtin.match_evidence("d1.cloudfront.net").is_empty());

    let mut set = StubSet::default();
    set.cname = set
        .cname
        .otherwise(Behavior::evidence(&["x.cloudfront.net", "y.cloudfront.net"]));
    let names = stubs::domains(&["dup.example"]);

    // the second pass re-matches everything the first one stored
    let outcome = run(set, &names, true).await;

    let record = &outcome.records[0];
    assert_eq!(record.cdns(), ["Cloudfront".to_string()]);
    assert_eq!(record.cdn_names().len(), 1);
    assert_eq!(record.cnames().len(), 2);
}

/*************************************************************
             Early exit and fatal short-circuit (P3, P4)
**************************************************************/

#[tokio::test]
async fn first_match_skips_lower_priority_analyzers() {
    let mut set = StubSet::default();
    set.cname = set.cname.otherwise(Behavior::evidence(&["edge.cloudfront.net"]));
    set.http = set.http.otherwise(Behavior::Panic);
    set.whois = set.whois.otherwise(Behavior::Panic);
    let (service, calls) = set.into_service();
    let names = stubs::domains(&["p3a.example", "p3b.example", "p3c.example"]);

    let outcome = service
        .analyze_batch(&names, &stubs::config(2, TIMEOUT), BatchHooks::default())
        .await;

    assert_eq!(outcome.tally.completed, 3);
    assert_eq!(outcome.frontable().count(), 3);
    assert_eq!(calls.cname.total(), 3);
    assert_eq!(calls.http.total(), 0);
    assert_eq!(calls.whois.total(), 0);
    assert_eq!(calls.nameserver.total(), 0);
}

#[tokio::test]
async fn nonexistent_domains_skip_every_other_analyzer() {
    let mut set = StubSet::default();
    set.ip = StubAnalyzer::new(CheckKind::Ip).otherwise(Behavior::Fail(
        cdnmap_common::error::ProbeError::DomainNotFound("gone".into()),
    ));
    let (service, calls) = set.into_service();
    let names = stubs::domains(&["gone1.example", "gone2.example"]);

    let outcome = service
        .analyze_batch(&names, &stubs::config(2, TIMEOUT), BatchHooks::default())
        .await;

    assert_eq!(outcome.tally.completed, 2);
    assert_eq!(calls.ip.total(), 2);
    assert_eq!(calls.cname.total() + calls.http.total() + calls.whois.total(), 0);
    assert_eq!(calls.nameserver.total(), 0);
}

/*************************************************************
                       Fault isolation (P5)
**************************************************************/

#[tokio::test]
async fn a_panicking_analyzer_only_fails_its_own_domain() {
    let names: Vec<String> = (0..10).map(|i| format!("f{i}.example")).collect();
    let mut set = StubSet::default();
    set.cname = set
        .cname
        .otherwise(Behavior::evidence(&["edge.cloudfront.net"]))
        .on("f4.example", Behavior::Panic);

    let outcome = run(set, &names, false).await;

    assert_eq!(outcome.records.len(), 10);
    assert_eq!(outcome.tally.failed, 1);
    assert_eq!(outcome.tally.completed, 9);
    for record in &outcome.records {
        assert_eq!(record.is_frontable(), record.name() != "f4.example");
    }
}

/*************************************************************
                   Double-pass monotonicity (P6)
**************************************************************/

fn flaky_set() -> StubSet {
    let mut set = StubSet::default();
    set.cname = set
        .cname
        .on("late.example", Behavior::empty())
        .on("late.example", Behavior::evidence(&["late.cloudfront.net"]))
        .on("steady.example", Behavior::evidence(&["steady.cloudfront.net"]))
        .on("flap.example", Behavior::evidence(&["flap.cloudfront.net"]))
        .on("flap.example", Behavior::empty());
    set.http = set.http.on(
        "timeout.example",
        Behavior::Fail(cdnmap_common::error::ProbeError::Timeout),
    );
    set
}

#[tokio::test]
async fn double_pass_never_loses_a_cdn() {
    let names = stubs::domains(&[
        "late.example",
        "steady.example",
        "flap.example",
        "timeout.example",
        "none.example",
    ]);

    let single = run(flaky_set(), &names, false).await;
    let double = run(flaky_set(), &names, true).await;

    for (one, two) in single.records.iter().zip(&double.records) {
        assert_eq!(one.name(), two.name());
        assert!(
            cdn_set(two).is_superset(&cdn_set(one)),
            "{}: {:?} lost entries of {:?}",
            one.name(),
            two.cdns(),
            one.cdns()
        );
    }
    assert!(double.records[0].is_frontable());
    assert!(!single.records[0].is_frontable());
}

/*************************************************************
                      Record isolation (P7)
**************************************************************/

#[test]
fn records_never_share_evidence() {
    let mut records: Vec<DomainRecord> = (0..8)
        .map(|i| DomainRecord::new(format!("r{i}.example")))
        .collect();

    records[3].add_evidence(EvidenceKind::Cname, "r3.cloudfront.net");
    records[3].add_evidence(EvidenceKind::Header, "cloudfront");
    records[3].add_ip("192.0.2.3".parse().unwrap());

    for (i, record) in records.iter().enumerate().filter(|(i, _)| *i != 3) {
        for kind in EvidenceKind::ALL {
            assert!(record.evidence(kind).is_empty(), "record {i} saw {kind:?} evidence");
        }
        assert!(record.ips().is_empty());
    }
}

#[tokio::test]
async fn evidence_stays_with_its_domain_in_a_batch() {
    let names: Vec<String> = (0..12).map(|i| format!("iso{i}.example")).collect();
    let mut set = StubSet::default();
    set.cname = set.cname.on("iso5.example", Behavior::evidence(&["iso5.cloudfront.net"]));

    let outcome = run(set, &names, false).await;

    for record in &outcome.records {
        if record.name() == "iso5.example" {
            assert_eq!(record.cnames(), ["iso5.cloudfront.net".to_string()]);
        } else {
            assert!(record.cnames().is_empty());
            assert!(record.cdns().is_empty());
        }
    }
}
