use super::*;
use crate::{config::SecondsRange, sim::random::VariateSource};

use tracing_test::traced_test;

fn cfg_always(p_io_fail: f64, p_slow_read: f64) -> SimulationConfig {
    SimulationConfig {
        p_io_fail,
        p_slow_read,
        ..Default::default()
    }
}

#[test]
fn predetermined_time_bypasses_classification() {
    let cfg = SimulationConfig::default();
    let mut stream = VariateSource::new(1).stream(0);

    let plan = plan_read(Some(1234), &mut stream, &cfg);
    assert_eq!(plan.class, None);
    assert_eq!(plan.result.status, ReadStatus::Success);
    assert_eq!(plan.result.elapsed_ms, 1234);
    assert!(plan.result.bytes_read < cfg.max_read_bytes);
}

#[test]
fn predetermined_time_ignores_failure_probability() {
    // every classified read would fail with this config
    let cfg = cfg_always(1.0, 1.0);
    let mut stream = VariateSource::new(1).stream(0);

    let plan = plan_read(Some(10), &mut stream, &cfg);
    assert_eq!(plan.result.status, ReadStatus::Success);
}

#[test]
fn normal_read_within_normal_range() {
    let cfg = cfg_always(0.0, 0.0);
    let source = VariateSource::new(3);

    for d in 0..1000 {
        let plan = plan_read(None, &mut source.stream(d), &cfg);
        assert_eq!(plan.class, Some(OutcomeClass::NormalRead));
        assert_eq!(plan.result.status, ReadStatus::Success);
        assert!((75..400).contains(&plan.result.elapsed_ms), "{plan:?}");
        assert!(plan.result.bytes_read < cfg.max_read_bytes);
    }
}

#[test]
fn io_failure_reads_nothing() {
    let cfg = cfg_always(1.0, 1.0);
    let source = VariateSource::new(3);

    for d in 0..100 {
        let plan = plan_read(None, &mut source.stream(d), &cfg);
        assert_eq!(plan.class, Some(OutcomeClass::IoFailure));
        assert_eq!(plan.result.status, ReadStatus::IoFailure);
        assert_eq!(plan.result.bytes_read, 0);
        assert!((300..3000).contains(&plan.result.elapsed_ms), "{plan:?}");
    }
}

#[test]
fn slow_read_is_not_assigned_a_timeout_up_front() {
    let cfg = cfg_always(0.0, 1.0);
    let mut stream = VariateSource::new(3).stream(0);

    let plan = plan_read(None, &mut stream, &cfg);
    assert_eq!(plan.class, Some(OutcomeClass::SlowRead));
    assert_eq!(plan.result.status, ReadStatus::Success);
    assert!((6000..20000).contains(&plan.result.elapsed_ms), "{plan:?}");
}

#[test]
fn normal_read_over_timeout_is_assigned_a_timeout() {
    let cfg = SimulationConfig {
        normal_read_range: SecondsRange::new(5.0, 10.0),
        ..cfg_always(0.0, 0.0)
    };
    let source = VariateSource::new(3);

    for d in 0..100 {
        let plan = plan_read(None, &mut source.stream(d), &cfg);
        assert_eq!(plan.class, Some(OutcomeClass::NormalRead));
        assert_eq!(plan.result.status, ReadStatus::ReadTimeout);
        assert_eq!(plan.result.bytes_read, 0);
        assert!(
            (4000..=20000).contains(&plan.result.elapsed_ms),
            "{plan:?}"
        );
    }
}

#[test]
fn io_failure_over_timeout_stays_io_failure() {
    let cfg = SimulationConfig {
        io_fail_range: SecondsRange::new(5.0, 10.0),
        ..cfg_always(1.0, 1.0)
    };
    let mut stream = VariateSource::new(3).stream(0);

    let plan = plan_read(None, &mut stream, &cfg);
    assert_eq!(plan.result.status, ReadStatus::IoFailure);
    assert!(plan.result.elapsed_ms >= 5000);
}

#[test]
fn plans_replay_for_same_stream() {
    let cfg = SimulationConfig::default();
    let source = VariateSource::new(cfg.seed);

    for d in 0..100 {
        assert_eq!(
            plan_read(None, &mut source.stream(d), &cfg),
            plan_read(None, &mut source.stream(d), &cfg),
        );
    }
}

#[test]
fn reclassify_only_touches_successful_reads() {
    let cfg = SimulationConfig::default();

    let mut ok = ReadResult {
        status: ReadStatus::Success,
        bytes_read: 10,
        elapsed_ms: 4000,
    };
    assert!(!reclassify_after_service(&mut ok, 4000, &cfg));
    assert_eq!(ok.status, ReadStatus::Success);

    assert!(reclassify_after_service(&mut ok, 4001, &cfg));
    assert_eq!(ok.status, ReadStatus::ReadTimeout);
    assert_eq!(ok.bytes_read, 0);
    assert_eq!(ok.elapsed_ms, 4001);

    let mut failed = ReadResult {
        status: ReadStatus::IoFailure,
        bytes_read: 0,
        elapsed_ms: 9000,
    };
    assert!(!reclassify_after_service(&mut failed, 9000, &cfg));
    assert_eq!(failed.status, ReadStatus::IoFailure);
}

#[tokio::test(start_paused = true)]
async fn simulate_sleeps_for_planned_time() {
    let cfg = SimulationConfig::default();
    let mut stream = VariateSource::new(1).stream(0);
    let plan = plan_read(Some(250), &mut stream, &cfg);

    let start = Instant::now();
    let result = simulate_read(plan, "f", &cfg).await;

    let slept = start.elapsed();
    assert!(slept >= Duration::from_millis(250), "{slept:?}");
    assert!(slept < Duration::from_millis(252), "{slept:?}");
    assert_eq!(result, plan.result);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn slow_read_times_out_after_service() {
    let cfg = cfg_always(0.0, 1.0);
    let mut stream = VariateSource::new(3).stream(0);
    let plan = plan_read(None, &mut stream, &cfg);

    let result = simulate_read(plan, "slow.txt", &cfg).await;
    assert_eq!(result.status, ReadStatus::ReadTimeout);
    assert_eq!(result.bytes_read, 0);
    assert!(
        (plan.result.elapsed_ms..=plan.result.elapsed_ms + 1).contains(&result.elapsed_ms),
        "{result:?} vs {plan:?}"
    );
    assert!(logs_contain("timeout (service)"));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn predetermined_time_over_timeout_times_out_after_service() {
    let cfg = SimulationConfig::default();
    let mut stream = VariateSource::new(3).stream(0);
    let plan = plan_read(Some(5000), &mut stream, &cfg);

    let result = simulate_read(plan, "big.bin", &cfg).await;
    assert_eq!(result.status, ReadStatus::ReadTimeout);
    assert_eq!(result.bytes_read, 0);
    assert!((5000..=5001).contains(&result.elapsed_ms), "{result:?}");
    assert!(logs_contain("timeout (service)"));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn io_failure_is_logged_and_kept() {
    let cfg = cfg_always(1.0, 1.0);
    let mut stream = VariateSource::new(3).stream(0);
    let plan = plan_read(None, &mut stream, &cfg);

    let result = simulate_read(plan, "broken.txt", &cfg).await;
    assert_eq!(result, plan.result);
    assert!(logs_contain("io fail"));
}

#[tokio::test(start_paused = true)]
async fn zero_time_read_does_not_sleep() {
    let cfg = SimulationConfig::default();
    let mut stream = VariateSource::new(1).stream(0);
    let plan = plan_read(Some(0), &mut stream, &cfg);

    let start = Instant::now();
    let result = simulate_read(plan, "readme.txt", &cfg).await;

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(result.status, ReadStatus::Success);
    assert_eq!(result.elapsed_ms, 0);
}
