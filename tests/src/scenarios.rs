#![cfg(test)]
use std::time::Duration;

use cdnmap_common::error::ProbeError;
use cdnmap_common::record::DomainRecord;
use cdnmap_core::{BatchHooks, BatchOutcome};

use crate::stubs::{self, Behavior, StubSet};

const TIMEOUT: Duration = Duration::from_secs(5);

fn only(outcome: &BatchOutcome) -> &DomainRecord {
    assert_eq!(outcome.records.len(), 1, "expected a single record");
    &outcome.records[0]
}

/*************************************************************
              Single domains through the pipeline
**************************************************************/

#[tokio::test]
async fn cname_evidence_identifies_cloudfront() {
    let mut set = StubSet::default();
    set.cname = set
        .cname
        .on("a.example", Behavior::evidence(&["edge.cloudfront.net"]));
    let (service, calls) = set.into_service();

    let outcome = service
        .analyze_batch(
            &stubs::domains(&["a.example"]),
            &stubs::config(1, TIMEOUT),
            BatchHooks::default(),
        )
        .await;

    let record = only(&outcome);
    assert_eq!(record.cdns(), ["Cloudfront".to_string()]);
    assert!(record.is_frontable());
    assert_eq!(calls.cname.count("a.example"), 1);
}

#[tokio::test]
async fn no_evidence_means_no_cdn() {
    let (service, calls) = StubSet::default().into_service();

    let outcome = service
        .analyze_batch(
            &stubs::domains(&["b.example"]),
            &stubs::config(1, TIMEOUT),
            BatchHooks::default(),
        )
        .await;

    let record = only(&outcome);
    assert!(record.cdns().is_empty());
    assert!(!record.is_frontable());
    assert_eq!(outcome.tally.completed, 1);
    // nothing matched, so every analyzer had its turn
    for log in [&calls.cname, &calls.http, &calls.whois, &calls.nameserver] {
        assert_eq!(log.count("b.example"), 1);
    }
}

#[tokio::test]
async fn nonexistent_domain_stops_after_resolution() {
    let mut set = StubSet::default();
    set.ip = set.ip.on(
        "c.example",
        Behavior::Fail(ProbeError::DomainNotFound("c.example".into())),
    );
    let (service, calls) = set.into_service();

    let outcome = service
        .analyze_batch(
            &stubs::domains(&["c.example"]),
            &stubs::config(1, TIMEOUT),
            BatchHooks::default(),
        )
        .await;

    let record = only(&outcome);
    assert!(!record.is_frontable());
    assert_eq!(calls.ip.count("c.example"), 1);
    assert_eq!(calls.cname.count("c.example"), 0);
    assert_eq!(calls.http.count("c.example"), 0);
    assert_eq!(calls.whois.count("c.example"), 0);
    assert_eq!(record.errors()[0].code, -1);
}

/*************************************************************
                      Batches and passes
**************************************************************/

#[tokio::test]
async fn slow_domain_is_dropped_while_the_rest_complete() {
    let names: Vec<String> = (0..50).map(|i| format!("site{i}.example")).collect();
    let slow = "site17.example";

    let mut set = StubSet::default();
    set.http = set
        .http
        .otherwise(Behavior::evidence(&["1.1 abc123.cloudfront.net (CloudFront)"]))
        .on(slow, Behavior::Sleep(Duration::from_secs(30)));
    let (service, calls) = set.into_service();

    let outcome = service
        .analyze_batch(
            &names,
            &stubs::config(4, Duration::from_millis(500)),
            BatchHooks::default(),
        )
        .await;

    assert_eq!(outcome.records.len(), 50);
    assert_eq!(outcome.tally.submitted, 50);
    assert_eq!(outcome.tally.dropped, 1);
    assert_eq!(outcome.tally.completed, 49);

    for (record, name) in outcome.records.iter().zip(&names) {
        assert_eq!(record.name(), name, "records keep input order");
        if record.name() == slow {
            assert!(record.cdns().is_empty());
            assert!(!record.is_frontable());
        } else {
            assert_eq!(record.cdns(), ["Cloudfront".to_string()]);
            assert!(record.is_frontable());
        }
    }
    assert_eq!(calls.http.total(), 50);
}

#[tokio::test]
async fn second_pass_catches_late_evidence() {
    let mut set = StubSet::default();
    set.cname = set
        .cname
        .on("d.example", Behavior::empty())
        .on("d.example", Behavior::evidence(&["d.cloudfront.net"]));
    let (service, calls) = set.into_service();

    let config = stubs::config(2, TIMEOUT).with_double(true);
    let outcome = service
        .analyze_batch(&stubs::domains(&["d.example"]), &config, BatchHooks::default())
        .await;

    let record = only(&outcome);
    assert_eq!(record.cdns(), ["Cloudfront".to_string()]);
    assert!(record.is_frontable());
    assert_eq!(calls.cname.count("d.example"), 2);
    assert_eq!(outcome.tally.submitted, 2);
    assert_eq!(outcome.tally.completed, 2);
}
