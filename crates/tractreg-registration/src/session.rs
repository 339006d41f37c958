//! Registration session driving the constrained derivative-free solver.

use std::path::PathBuf;

use cobyla::{fmin_cobyla, CstrFn};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tractreg_core::Bundle;

use crate::diagnostics::BundleRenderer;
use crate::error::{RegistrationError, Result};
use crate::metric::EntropyMetric;
use crate::model::TransformModel;
use crate::progress::ProgressObserver;

/// Objective assigned to candidates whose transform cannot be built.
const DEGENERATE_PENALTY: f64 = 1e10;

/// Tunable settings of a registration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Gaussian kernel width of the fiber probability, in mm.
    pub sigma: f64,
    /// Evaluation budget handed to the solver per `compute` call.
    pub max_evaluations: usize,
    /// Initial trust-region radius. Must be set before computing.
    pub initial_step: Option<f64>,
    /// Final trust-region radius. Must be set before computing.
    pub final_step: Option<f64>,
    /// Log every objective evaluation at debug level.
    pub verbose: bool,
    /// Render the fixed bundle before optimizing.
    pub render: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            sigma: 5.0,
            max_evaluations: 300,
            initial_step: None,
            final_step: None,
            verbose: false,
            render: false,
        }
    }
}

/// Outcome of one `compute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationSolution {
    /// Parameters of the best candidate seen during the pass.
    pub parameters: Vec<f64>,
    /// Objective value of that candidate.
    pub objective: f64,
    /// Number of objective evaluations spent.
    pub evaluations: usize,
}

/// Pairwise registration of a moving fiber bundle onto a fixed one.
///
/// The session owns both bundles, the transform model and its current
/// parameter vector. Each [`compute`](Self::compute) call runs one solver
/// pass and leaves the best parameters as the starting point of the next,
/// so a caller refines coarse-to-fine by lowering the step sizes between
/// calls. The moving bundle itself is never modified; every candidate is
/// applied to the original geometry.
pub struct RegistrationSession {
    options: SessionOptions,
    model: TransformModel,
    fixed: Option<Bundle>,
    moving: Option<Bundle>,
    parameters: Vec<f64>,
    objective_trace: Vec<f64>,
    invocations: usize,
    observers: Vec<Box<dyn ProgressObserver>>,
    renderer: Option<Box<dyn BundleRenderer>>,
    output_directory: PathBuf,
    process_id: String,
}

impl RegistrationSession {
    /// Session over the given model, starting at its identity parameters.
    pub fn new(model: TransformModel, options: SessionOptions) -> Self {
        let parameters = model.identity_parameters();
        Self {
            options,
            model,
            fixed: None,
            moving: None,
            parameters,
            objective_trace: Vec::new(),
            invocations: 0,
            observers: Vec::new(),
            renderer: None,
            output_directory: PathBuf::from("."),
            process_id: String::new(),
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut SessionOptions {
        &mut self.options
    }

    pub fn model(&self) -> &TransformModel {
        &self.model
    }

    /// Attach the fixed bundle.
    pub fn set_fixed(&mut self, bundle: Bundle) -> Result<()> {
        if let Some(moving) = &self.moving {
            check_shapes(&bundle, moving)?;
        }
        self.fixed = Some(bundle);
        Ok(())
    }

    /// Attach the moving bundle.
    pub fn set_moving(&mut self, bundle: Bundle) -> Result<()> {
        if let Some(fixed) = &self.fixed {
            check_shapes(fixed, &bundle)?;
        }
        self.moving = Some(bundle);
        Ok(())
    }

    /// Register a progress observer.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Install the diagnostic renderer used when `render` is enabled.
    pub fn set_renderer(&mut self, renderer: Box<dyn BundleRenderer>) {
        self.renderer = Some(renderer);
    }

    /// Directory diagnostic output is written into.
    pub fn set_output_directory(&mut self, directory: impl Into<PathBuf>) {
        self.output_directory = directory.into();
    }

    /// Identifier woven into diagnostic file names.
    pub fn set_process_id(&mut self, id: impl Into<String>) {
        self.process_id = id.into();
    }

    /// Current parameter vector.
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Replace the current parameter vector, e.g. to resume from an
    /// earlier result.
    pub fn set_parameters(&mut self, parameters: Vec<f64>) -> Result<()> {
        let expected = self.model.parameter_count();
        if parameters.len() != expected {
            return Err(RegistrationError::ParameterLength {
                expected,
                actual: parameters.len(),
            });
        }
        self.parameters = parameters;
        Ok(())
    }

    /// Every objective value evaluated so far, across all `compute` calls.
    pub fn objective_trace(&self) -> &[f64] {
        &self.objective_trace
    }

    /// Number of `compute` calls made on this session.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Run one solver pass from the current parameters.
    ///
    /// Returns the best candidate evaluated during the pass, which also
    /// becomes the session's current parameter vector. Exhausting the
    /// evaluation budget without solver convergence is a normal outcome,
    /// not an error.
    pub fn compute(&mut self) -> Result<RegistrationSolution> {
        let fixed = self
            .fixed
            .as_ref()
            .ok_or(RegistrationError::MissingInput("fixed bundle"))?;
        let moving = self
            .moving
            .as_ref()
            .ok_or(RegistrationError::MissingInput("moving bundle"))?;
        let initial_step = self
            .options
            .initial_step
            .ok_or(RegistrationError::MissingInput("initial_step"))?;
        let final_step = self
            .options
            .final_step
            .ok_or(RegistrationError::MissingInput("final_step"))?;

        if self.options.render {
            if let Some(renderer) = &self.renderer {
                let prefix = format!("fixed_brain_{}", self.process_id);
                renderer.render(fixed, &self.output_directory, &prefix);
            }
        }

        self.invocations += 1;
        let budget = self.options.max_evaluations;
        info!(
            invocation = self.invocations,
            budget,
            sigma = self.options.sigma,
            initial_step,
            final_step,
            "starting registration pass"
        );

        let (status, best_parameters, best_objective, evaluations) = {
            let model = &self.model;
            let mut context = EvalContext {
                model,
                metric: EntropyMetric::new(self.options.sigma),
                fixed,
                moving,
                trace: &mut self.objective_trace,
                observers: &self.observers,
                budget,
                verbose: self.options.verbose,
                evaluations: 0,
                best_objective: f64::INFINITY,
                best_parameters: self.parameters.clone(),
            };

            let plausibility = |candidate: &[f64]| model.plausibility(candidate);
            let constraints: Vec<&dyn CstrFn> = vec![&plausibility];

            let mut x = self.parameters.clone();
            let (status, _) = fmin_cobyla(
                evaluate_candidate,
                &mut x,
                &constraints,
                &mut context,
                initial_step,
                final_step,
                budget as i32,
                0,
            );
            (
                status,
                context.best_parameters,
                context.best_objective,
                context.evaluations,
            )
        };

        info!(
            status,
            evaluations, best_objective, "registration pass finished"
        );

        self.parameters = best_parameters.clone();
        Ok(RegistrationSolution {
            parameters: best_parameters,
            objective: best_objective,
            evaluations,
        })
    }
}

fn check_shapes(fixed: &Bundle, moving: &Bundle) -> Result<()> {
    if fixed.points_per_fiber() != moving.points_per_fiber() {
        return Err(RegistrationError::ShapeMismatch {
            fixed: fixed.points_per_fiber(),
            moving: moving.points_per_fiber(),
        });
    }
    Ok(())
}

struct EvalContext<'a> {
    model: &'a TransformModel,
    metric: EntropyMetric,
    fixed: &'a Bundle,
    moving: &'a Bundle,
    trace: &'a mut Vec<f64>,
    observers: &'a [Box<dyn ProgressObserver>],
    budget: usize,
    verbose: bool,
    evaluations: usize,
    best_objective: f64,
    best_parameters: Vec<f64>,
}

/// Objective handed to the solver: entropy of the transformed moving
/// bundle, always applied to the original moving geometry.
fn evaluate_candidate(x: &[f64], context: &mut &mut EvalContext<'_>) -> f64 {
    let context = &mut **context;
    let objective = match context.model.build(x) {
        Ok(transform) => {
            let moved = context.moving.map(transform.as_ref());
            context.metric.evaluate(context.fixed, &moved)
        }
        Err(err) => {
            warn!(%err, "transform build failed during search");
            DEGENERATE_PENALTY
        }
    };

    context.evaluations += 1;
    context.trace.push(objective);
    for observer in context.observers {
        observer.on_evaluation(context.evaluations, context.budget, objective);
    }
    if context.verbose {
        debug!(
            evaluation = context.evaluations,
            objective, "objective evaluated"
        );
    }
    if objective < context.best_objective {
        context.best_objective = objective;
        // The solver reuses its candidate buffer between calls.
        context.best_parameters.clear();
        context.best_parameters.extend_from_slice(x);
    }
    objective
}
