use countsim::{Dip, ExperimentConfig, ExperimentModel, SampleSummary, TrialRunner};
use rand::SeedableRng;
use rand::rngs::StdRng;

mod common;

use common::assert_close;

#[test]
fn summary_uses_bessel_correction() {
    let summary = SampleSummary::from_samples(&[1.0, 2.0, 3.0, 4.0]).unwrap();

    assert_eq!(summary.n, 4);
    assert_close(summary.mean, 2.5);
    assert_close(summary.std_dev, (5.0_f64 / 3.0).sqrt());
}

#[test]
fn summary_needs_two_samples() {
    assert!(SampleSummary::from_samples(&[]).is_none());
    assert!(SampleSummary::from_samples(&[3.0]).is_none());

    let constant = SampleSummary::from_samples(&[3.0, 3.0]).unwrap();
    assert_eq!(constant.std_dev, 0.0);
}

#[test]
fn runner_reports_every_batch() {
    let mut config = ExperimentConfig::new(vec![Dip::new(5.0, 30.0, 1.0)], 2000.0, 600.0);
    config.background_rate = 5.0;
    let mut model = ExperimentModel::new(&config, StdRng::seed_from_u64(99)).unwrap();

    let report = TrialRunner::new(50, 4).run(&mut model);

    assert_eq!(report.batches.len(), 4);
    for batch in &report.batches {
        assert_eq!(batch.dropped, 0);
        let shift = batch.shift.unwrap();
        assert_eq!(shift.n, 50);
        assert!(shift.mean > 0.0);
    }
    let grand = report.grand.unwrap();
    assert_eq!(grand.n, 4);
    assert!(grand.std_dev.is_finite());
}

#[test]
fn runner_drops_trials_without_events() {
    let mut config = ExperimentConfig::new(vec![Dip::new(5.0, 20.0, 1.0)], 1e-9, 0.0);
    config.background_rate = 0.0;
    let mut model = ExperimentModel::new(&config, StdRng::seed_from_u64(1)).unwrap();

    let report = TrialRunner::new(10, 2).run(&mut model);

    assert!(report.batches.iter().all(|batch| batch.dropped == 10));
    assert!(report.batches.iter().all(|batch| batch.shift.is_none()));
    assert!(report.grand.is_none());
}
