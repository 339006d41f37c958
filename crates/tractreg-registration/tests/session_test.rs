//! End-to-end tests of registration sessions.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use nalgebra::{Point3, Vector3};
use tractreg_core::Bundle;
use tractreg_registration::{
    BundleRenderer, EntropyMetric, ProgressObserver, RegistrationError, RegistrationSession,
    SessionOptions, TransformModel,
};

fn synthetic_bundle(shift: Vector3<f64>) -> Bundle {
    let mut fibers = Vec::new();
    for f in 0..5 {
        let offset = f as f64 * 10.0 - 20.0;
        let fiber: Vec<Point3<f64>> = (0..5)
            .map(|i| Point3::new(i as f64 * 8.0 - 16.0, offset, 0.5 * offset) + shift)
            .collect();
        fibers.push(fiber);
    }
    Bundle::from_fibers(fibers).unwrap()
}

fn steps(initial: f64, final_: f64) -> SessionOptions {
    SessionOptions {
        initial_step: Some(initial),
        final_step: Some(final_),
        ..SessionOptions::default()
    }
}

#[test]
fn test_compute_requires_bundles_and_steps() {
    let model = TransformModel::landmark(3).unwrap();
    let mut session = RegistrationSession::new(model, steps(1.0, 0.1));
    assert_eq!(
        session.compute().err(),
        Some(RegistrationError::MissingInput("fixed bundle"))
    );

    session.set_fixed(synthetic_bundle(Vector3::zeros())).unwrap();
    assert_eq!(
        session.compute().err(),
        Some(RegistrationError::MissingInput("moving bundle"))
    );

    session.set_moving(synthetic_bundle(Vector3::zeros())).unwrap();
    session.options_mut().initial_step = None;
    assert_eq!(
        session.compute().err(),
        Some(RegistrationError::MissingInput("initial_step"))
    );

    session.options_mut().initial_step = Some(1.0);
    session.options_mut().final_step = None;
    assert_eq!(
        session.compute().err(),
        Some(RegistrationError::MissingInput("final_step"))
    );
}

#[test]
fn test_mismatched_point_counts_rejected_at_attachment() {
    let model = TransformModel::landmark(3).unwrap();
    let mut session = RegistrationSession::new(model, steps(1.0, 0.1));

    let five_points = synthetic_bundle(Vector3::zeros());
    let three_points = Bundle::from_fibers(vec![vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ]])
    .unwrap();

    session.set_fixed(five_points).unwrap();
    assert_eq!(
        session.set_moving(three_points).err(),
        Some(RegistrationError::ShapeMismatch {
            fixed: 5,
            moving: 3
        })
    );
}

#[test]
fn test_set_parameters_checks_length() {
    let model = TransformModel::landmark(3).unwrap();
    let mut session = RegistrationSession::new(model, SessionOptions::default());
    assert_eq!(
        session.set_parameters(vec![0.0; 10]).err(),
        Some(RegistrationError::ParameterLength {
            expected: 81,
            actual: 10
        })
    );
    assert_eq!(session.parameters().len(), 81);
}

#[test]
fn test_identity_registration_stays_near_identity() {
    let model = TransformModel::landmark(3).unwrap();
    let identity = model.identity_parameters();

    let mut options = steps(1e-6, 1e-8);
    options.max_evaluations = 30;
    let mut session = RegistrationSession::new(model, options);
    session.set_fixed(synthetic_bundle(Vector3::zeros())).unwrap();
    session.set_moving(synthetic_bundle(Vector3::zeros())).unwrap();

    let solution = session.compute().unwrap();

    assert!(solution.evaluations > 0);
    assert!(solution.evaluations <= 30 + 1);

    // Best-seen is the minimum of everything evaluated this pass.
    let trace = session.objective_trace();
    assert_eq!(trace.len(), solution.evaluations);
    let minimum = trace.iter().cloned().fold(f64::INFINITY, f64::min);
    assert!((solution.objective - minimum).abs() < 1e-12);

    // Steps this small cannot carry the parameters anywhere.
    let max_drift = solution
        .parameters
        .iter()
        .zip(&identity)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);
    assert!(max_drift < 1e-4, "parameters drifted by {}", max_drift);

    // The best vector becomes the session's current vector.
    assert_eq!(session.parameters(), solution.parameters.as_slice());
}

#[test]
fn test_translated_bundle_moves_closer() {
    let fixed = synthetic_bundle(Vector3::zeros());
    let moving = synthetic_bundle(Vector3::new(5.0, 0.0, 0.0));

    let model = TransformModel::displacement_field(3).unwrap();
    let mut options = steps(3.0, 0.05);
    options.max_evaluations = 500;
    let mut session = RegistrationSession::new(model, options);
    session.set_fixed(fixed.clone()).unwrap();
    session.set_moving(moving.clone()).unwrap();

    let solution = session.compute().unwrap();

    let metric = EntropyMetric::new(5.0);
    let before = metric.evaluate(&fixed, &moving);
    assert!(
        solution.objective < before,
        "objective did not improve: {} vs {}",
        solution.objective,
        before
    );

    let transform = session.model().build(&solution.parameters).unwrap();
    let moved = moving.map(transform.as_ref());
    assert!(metric.evaluate(&fixed, &moved) < before);
}

#[test]
fn test_trace_accumulates_across_compute_calls() {
    let model = TransformModel::displacement_field(3).unwrap();
    let mut options = steps(2.0, 0.5);
    options.max_evaluations = 40;
    let mut session = RegistrationSession::new(model, options);
    session.set_fixed(synthetic_bundle(Vector3::zeros())).unwrap();
    session
        .set_moving(synthetic_bundle(Vector3::new(3.0, 0.0, 0.0)))
        .unwrap();

    let first = session.compute().unwrap();
    let after_first = session.objective_trace().len();
    assert_eq!(after_first, first.evaluations);

    let second = session.compute().unwrap();
    assert_eq!(
        session.objective_trace().len(),
        first.evaluations + second.evaluations
    );
    assert_eq!(session.invocations(), 2);

    // The second pass starts from the first pass's best vector.
    assert!(second.objective <= first.objective + 1e-9);
}

struct Recorder(Rc<RefCell<Vec<usize>>>);

impl ProgressObserver for Recorder {
    fn on_evaluation(&self, evaluation: usize, _budget: usize, _value: f64) {
        self.0.borrow_mut().push(evaluation);
    }
}

#[test]
fn test_observers_see_every_evaluation() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let model = TransformModel::displacement_field(3).unwrap();
    let mut options = steps(1.0, 0.5);
    options.max_evaluations = 20;
    let mut session = RegistrationSession::new(model, options);
    session.set_fixed(synthetic_bundle(Vector3::zeros())).unwrap();
    session.set_moving(synthetic_bundle(Vector3::zeros())).unwrap();
    session.add_observer(Box::new(Recorder(Rc::clone(&seen))));

    let solution = session.compute().unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), solution.evaluations);
    let expected: Vec<usize> = (1..=solution.evaluations).collect();
    assert_eq!(*seen, expected);
}

struct RecordingRenderer(Rc<RefCell<Vec<(PathBuf, String)>>>);

impl BundleRenderer for RecordingRenderer {
    fn render(&self, _bundle: &Bundle, output_directory: &Path, prefix: &str) {
        self.0
            .borrow_mut()
            .push((output_directory.to_path_buf(), prefix.to_string()));
    }
}

#[test]
fn test_renderer_invoked_before_optimization() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let model = TransformModel::displacement_field(3).unwrap();
    let mut options = steps(1.0, 0.5);
    options.max_evaluations = 10;
    options.render = true;
    let mut session = RegistrationSession::new(model, options);
    session.set_fixed(synthetic_bundle(Vector3::zeros())).unwrap();
    session.set_moving(synthetic_bundle(Vector3::zeros())).unwrap();
    session.set_renderer(Box::new(RecordingRenderer(Rc::clone(&calls))));
    session.set_output_directory("/tmp/tractreg-out");
    session.set_process_id("00042");

    session.compute().unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, PathBuf::from("/tmp/tractreg-out"));
    assert_eq!(calls[0].1, "fixed_brain_00042");
}
