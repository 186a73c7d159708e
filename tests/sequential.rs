//! End-to-end runs of the sequential CSM controller.

use csm::helpers::{BernoulliSource, CycleSource};
use csm::{run, BoundaryStrategy, CsmConfig, CsmError, Decision};

fn unwarmed() -> CsmConfig {
    CsmConfig::default().warmup(0)
}

#[test]
fn always_exceeding_fails_to_reject() {
    // Every resampled statistic meets the observed one: the p-value estimate
    // is pinned at 1 and the test should stop almost immediately.
    let mut source = || 1u8;
    let outcome = run(&mut source, &unwarmed()).unwrap();

    assert_eq!(outcome.decision, Decision::FailToRejectNull);
    assert_eq!(outcome.p_hat, 1.0);
    assert_eq!(outcome.s_count, outcome.n_used);
    assert!(
        outcome.n_used < 50,
        "expected an early stop, ran {} iterations",
        outcome.n_used
    );
    let (lower, upper) = outcome.interval.expect("classified stop carries an interval");
    assert!(lower < upper);
    assert!(outcome.s_count as i64 >= upper);
}

#[test]
fn never_exceeding_rejects() {
    // No resampled statistic ever reaches the observed one: the p-value
    // estimate is pinned at 0 and the null should be rejected early.
    let mut source = || 0u8;
    let outcome = run(&mut source, &unwarmed()).unwrap();

    assert_eq!(outcome.decision, Decision::RejectNull);
    assert_eq!(outcome.p_hat, 0.0);
    assert_eq!(outcome.s_count, 0);
    assert!(
        outcome.n_used < 1000,
        "expected an early stop, ran {} iterations",
        outcome.n_used
    );
    let (lower, _) = outcome.interval.expect("classified stop carries an interval");
    assert!(outcome.s_count as i64 <= lower);
}

#[test]
fn null_matched_stream_runs_long() {
    // Observations drawn at exactly the null rate: the test should consume
    // the whole budget (or escape very late), never before the warm-up.
    let mut source = BernoulliSource::new(0.05, 7);
    let config = CsmConfig::default(); // alpha = 0.05, warmup = 499, max_n = 10_000
    let outcome = run(&mut source, &config).unwrap();

    assert!(outcome.n_used >= 499, "stopped during warm-up");
    if outcome.n_used == 10_000 {
        assert_eq!(outcome.decision, Decision::Inconclusive);
        assert!(
            (outcome.p_hat - 0.05).abs() <= 0.02,
            "p_hat {} far from the null rate",
            outcome.p_hat
        );
    } else {
        assert!(
            outcome.n_used > 2000,
            "escaped suspiciously early at n = {}",
            outcome.n_used
        );
    }
}

#[test]
fn deterministic_under_seeded_source() {
    let config = CsmConfig::default().warmup(99);
    let first = run(&mut BernoulliSource::new(0.2, 1234), &config).unwrap();
    let second = run(&mut BernoulliSource::new(0.2, 1234), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn warmup_blocks_early_decisions() {
    // Unconstrained, an all-ones stream stops within a handful of
    // iterations; the warm-up must hold the decision back to 499.
    let unconstrained = run(&mut || 1u8, &unwarmed()).unwrap();
    assert!(unconstrained.n_used < 10);

    let config = CsmConfig::default().warmup(499);
    let warmed = run(&mut || 1u8, &config).unwrap();
    assert!(warmed.n_used >= 499, "decision produced at n = {}", warmed.n_used);
    assert_eq!(warmed.decision, Decision::FailToRejectNull);
    assert_eq!(warmed.p_hat, 1.0);
}

#[test]
fn late_escape_is_inconclusive_without_interval() {
    // A warm-up past the exhaustive boundary range forces the first
    // criterion check (and hence the escape) to land at n = 2500, where the
    // exact scan is off the table: the stop must come back inconclusive
    // with no interval, leaving interpretation to the caller.
    let config = CsmConfig::default().warmup(2500).max_n(5000);
    let outcome = run(&mut || 1u8, &config).unwrap();

    assert_eq!(outcome.n_used, 2500);
    assert_eq!(outcome.decision, Decision::Inconclusive);
    assert!(outcome.interval.is_none());
    assert_eq!(outcome.p_hat, 1.0);
    assert_eq!(outcome.s_count, 2500);
}

#[test]
fn optimized_strategy_classifies_like_exhaustive() {
    let exhaustive = run(
        &mut BernoulliSource::new(0.3, 99),
        &CsmConfig::default().strategy(BoundaryStrategy::Exhaustive),
    )
    .unwrap();
    let optimized = run(
        &mut BernoulliSource::new(0.3, 99),
        &CsmConfig::default().strategy(BoundaryStrategy::Optimized),
    )
    .unwrap();

    assert_eq!(exhaustive.decision, optimized.decision);
    assert_eq!(exhaustive.n_used, optimized.n_used);
}

#[test]
fn patterned_source_is_deterministic() {
    // One success in ten: p_hat = 0.1 sits above alpha = 0.05, so a
    // conclusive stop must be a non-rejection.
    let config = unwarmed().max_n(5000);
    let outcome = run(
        &mut CycleSource::new(vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
        &config,
    )
    .unwrap();
    if outcome.decision.is_conclusive() {
        assert_eq!(outcome.decision, Decision::FailToRejectNull);
    }

    let again = run(
        &mut CycleSource::new(vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
        &config,
    )
    .unwrap();
    assert_eq!(outcome, again);
}

#[test]
fn diagnostics_route_through_tracing() {
    // The core never prints; escape and classification events only surface
    // through an installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter("csm=debug")
        .with_test_writer()
        .try_init();
    let outcome = run(&mut || 0u8, &unwarmed()).unwrap();
    assert_eq!(outcome.decision, Decision::RejectNull);
}

#[test]
fn generator_violations_abort_without_result() {
    let mut bad = || 3u8;
    assert!(matches!(
        run(&mut bad, &unwarmed()),
        Err(CsmError::Generator { .. })
    ));
}

#[test]
fn parameters_are_checked_before_the_source_is_touched() {
    let mut source = || -> u8 { panic!("source must not be drawn") };
    for config in [
        CsmConfig::default().alpha(0.0),
        CsmConfig::default().epsilon(0.0),
        CsmConfig::default().max_n(0),
        CsmConfig::default().max_n(10).warmup(11),
    ] {
        assert!(matches!(
            run(&mut source, &config),
            Err(CsmError::InvalidParameter { .. })
        ));
    }
}
