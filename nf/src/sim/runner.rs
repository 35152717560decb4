//! Scenario simulator
//!
//! Builds a [`MemoryHost`] with an [`AppCoordinator`] at the root and plays a
//! [`Scenario`] against it. Commands go to the current flow: the most recently
//! started child that has not finished yet, or the root.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::memory_host::{MemoryHost, TransitionRecord};
use super::scenario::{APP_FLOW, Expectation, Scenario, ScenarioError, ScreenSpec, ScriptStep};
use crate::app::{AppCoordinator, AppMeta};
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::flow::{Flow, FlowHandle};
use crate::host::{Screen, ScreenHandle, ScreenKind, ScreenStackHost, SharedHost, Transition, pump_limited, titles};
use crate::navigation::{NavOptions, NavigationAction, NavigationCoordinator, Step};

/// Startup configuration of a scripted flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMeta {
    pub name: String,
}

/// Screen created from a scenario step
#[derive(Debug, Clone)]
pub struct ScriptedScreen {
    name: String,
    kind: String,
}

impl ScriptedScreen {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    pub fn from_spec(spec: &ScreenSpec) -> Self {
        Self::new(spec.name(), spec.kind())
    }
}

impl Screen for ScriptedScreen {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> ScreenKind {
        ScreenKind::named(&self.kind)
    }
}

/// Child flow whose commands come from a scenario
pub struct ScriptedFlow {
    navigation: NavigationCoordinator<ScriptMeta>,
}

impl ScriptedFlow {
    pub fn new(host: SharedHost) -> Self {
        Self {
            navigation: NavigationCoordinator::new(host),
        }
    }

    /// Name given at start
    pub fn name(&self) -> Option<&str> {
        self.navigation.coordinator().try_meta().map(|meta| meta.name.as_str())
    }
}

impl Flow for ScriptedFlow {
    type Meta = ScriptMeta;

    fn coordinator(&self) -> &Coordinator<ScriptMeta> {
        self.navigation.coordinator()
    }

    fn coordinator_mut(&mut self) -> &mut Coordinator<ScriptMeta> {
        self.navigation.coordinator_mut()
    }

    fn navigation(&mut self) -> Option<&mut NavigationCoordinator<ScriptMeta>> {
        Some(&mut self.navigation)
    }
}

// What the simulator needs from a flow, whatever its concrete type
trait Driven {
    fn navigate(&self, action: NavigationAction, options: NavOptions) -> Step;
    fn finish(&self);
    fn is_finished(&self) -> bool;
    fn stack(&self) -> Vec<String>;
    fn modals(&self) -> Vec<String>;
    fn child_count(&self) -> usize;
    fn adopt(&self, child: &FlowHandle<ScriptedFlow>);
}

impl<F: Flow> Driven for FlowHandle<F> {
    fn navigate(&self, action: NavigationAction, options: NavOptions) -> Step {
        self.borrow_mut().navigate(action, options)
    }

    fn finish(&self) {
        self.borrow_mut().finish();
    }

    fn is_finished(&self) -> bool {
        self.borrow().is_finished()
    }

    fn stack(&self) -> Vec<String> {
        self.borrow_mut()
            .navigation()
            .map(|navigation| titles(navigation.stack()))
            .unwrap_or_default()
    }

    fn modals(&self) -> Vec<String> {
        self.borrow_mut()
            .navigation()
            .map(|navigation| titles(navigation.modals()))
            .unwrap_or_default()
    }

    fn child_count(&self) -> usize {
        self.borrow().coordinator().child_count()
    }

    fn adopt(&self, child: &FlowHandle<ScriptedFlow>) {
        self.borrow_mut().coordinator_mut().add(child);
    }
}

struct TrackedFlow {
    name: String,
    driven: Box<dyn Driven>,
    finishes: Rc<Cell<usize>>,
}

/// State after one step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// 1-based step number
    pub number: usize,
    pub op: String,
    /// Flow that is current after the step
    pub flow: String,
    /// Host reports and completions delivered after the step
    pub delivered: usize,
    pub stack: Vec<String>,
    pub modals: Vec<String>,
    pub host_stack: Vec<String>,
    pub host_modals: Vec<String>,
}

/// A failed expectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub step: usize,
    pub message: String,
}

impl From<&Failure> for ScenarioError {
    fn from(failure: &Failure) -> Self {
        ScenarioError::Expectation {
            step: failure.step,
            message: failure.message.clone(),
        }
    }
}

/// Outcome of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub expectations: usize,
    pub failures: Vec<Failure>,
    /// Whether the run stopped at the first failure
    pub stopped_early: bool,
    /// How many times each flow's finish callback fired
    pub finish_counts: BTreeMap<String, usize>,
    pub transitions: Vec<TransitionRecord>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// The first failure as an error
    pub fn first_error(&self) -> Option<ScenarioError> {
        self.failures.first().map(ScenarioError::from)
    }
}

/// Plays scenarios against a memory host
pub struct Simulator {
    config: Config,
    host: Rc<RefCell<MemoryHost>>,
    shared: SharedHost,
    app: FlowHandle<AppCoordinator>,
    flows: Vec<TrackedFlow>,
    active: Vec<usize>,
}

impl Simulator {
    pub fn new(config: &Config) -> Self {
        let host = MemoryHost::shared();
        let shared: SharedHost = host.clone();

        let app = AppCoordinator::new(shared.clone()).into_handle();
        let finishes = count_finishes(app.borrow_mut().coordinator_mut());
        app.borrow_mut().start(AppMeta);

        let root = TrackedFlow {
            name: APP_FLOW.to_string(),
            driven: Box::new(app.clone()),
            finishes,
        };

        Self {
            config: config.clone(),
            host,
            shared,
            app,
            flows: vec![root],
            active: vec![0],
        }
    }

    pub fn host(&self) -> &Rc<RefCell<MemoryHost>> {
        &self.host
    }

    pub fn app(&self) -> &FlowHandle<AppCoordinator> {
        &self.app
    }

    /// Name of the flow commands currently go to
    pub fn current(&self) -> &str {
        &self.current_flow().name
    }

    /// Validate and play `scenario`
    ///
    /// Invalid scenarios are rejected before anything runs. Failed
    /// expectations do not make this an error; they are listed in the report.
    pub fn run(&mut self, scenario: &Scenario) -> Result<RunReport, ScenarioError> {
        scenario.validate()?;
        info!(name = %scenario.name, steps = scenario.steps.len(), "Simulator::run: starting");

        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut failures = Vec::new();
        let mut expectations = 0;
        let mut stopped_early = false;

        for (index, step) in scenario.steps.iter().enumerate() {
            let number = index + 1;
            debug!(number, op = step.op(), flow = %self.current(), "Simulator::run: step");

            if let ScriptStep::Expect(expectation) = step {
                expectations += 1;
                for message in self.check(expectation) {
                    warn!(number, %message, "Simulator::run: expectation failed");
                    failures.push(Failure { step: number, message });
                }
            } else {
                self.apply(step);
            }

            let delivered = match step {
                ScriptStep::Pump => self.pump(),
                ScriptStep::Expect(_) => 0,
                _ if self.config.simulator.pump_after_each_step => self.pump(),
                _ => 0,
            };
            self.settle();
            steps.push(self.snapshot(number, step.op(), delivered));

            if self.config.simulator.stop_on_failure && !failures.is_empty() {
                stopped_early = number < scenario.steps.len();
                break;
            }
        }

        let report = RunReport {
            scenario: scenario.name.clone(),
            description: scenario.description.clone(),
            started_at,
            completed_at: Utc::now(),
            steps,
            expectations,
            failures,
            stopped_early,
            finish_counts: self
                .flows
                .iter()
                .map(|flow| (flow.name.clone(), flow.finishes.get()))
                .collect(),
            transitions: self.host.borrow().transitions().to_vec(),
        };
        info!(name = %report.scenario, passed = report.passed(), "Simulator::run: done");
        Ok(report)
    }

    fn apply(&mut self, step: &ScriptStep) {
        match step {
            ScriptStep::Push {
                screen,
                animated,
                transition,
            } => self.navigate(NavigationAction::Push(screen_handle(screen)), *animated, transition),
            ScriptStep::Present { screen, animated } => {
                self.navigate(NavigationAction::Present(screen_handle(screen)), *animated, &None)
            }
            ScriptStep::Pop { animated, transition } => self.navigate(NavigationAction::Pop, *animated, transition),
            ScriptStep::PopTo {
                kind,
                animated,
                transition,
            } => self.navigate(NavigationAction::PopTo(ScreenKind::named(kind)), *animated, transition),
            ScriptStep::Set { screens, animated } => {
                let screens = screens.iter().map(screen_handle).collect();
                self.navigate(NavigationAction::Set(screens), *animated, &None)
            }
            ScriptStep::Root { animated, transition } => self.navigate(NavigationAction::Root, *animated, transition),
            ScriptStep::DismissTop { animated } => self.navigate(NavigationAction::DismissTop, *animated, &None),
            ScriptStep::DismissAll { animated } => self.navigate(NavigationAction::DismissAll, *animated, &None),
            ScriptStep::SwipeBack => {
                if !self.host.borrow_mut().swipe_back() {
                    debug!("Simulator::apply: swipe-back had nothing to go back to");
                }
            }
            ScriptStep::PullToDismiss => {
                if !self.host.borrow_mut().pull_to_dismiss() {
                    debug!("Simulator::apply: pull-to-dismiss found nothing presented");
                }
            }
            ScriptStep::StartChild { name } => self.start_child(name),
            ScriptStep::Finish => self.current_flow().driven.finish(),
            ScriptStep::Pump | ScriptStep::Expect(_) => {}
        }
    }

    fn navigate(&self, action: NavigationAction, animated: Option<bool>, transition: &Option<Transition>) {
        let mut options = NavOptions::default().with_animated(animated.unwrap_or(self.config.navigation.animated));
        if let Some(transition) = transition {
            options = options.with_transition(transition.clone());
        }
        let step = self.current_flow().driven.navigate(action, options);
        debug!(?step, "Simulator::navigate: done");
    }

    fn start_child(&mut self, name: &str) {
        let child = ScriptedFlow::new(self.shared.clone()).into_handle();
        let finishes = count_finishes(child.borrow_mut().coordinator_mut());

        self.current_flow().driven.adopt(&child);
        child.borrow_mut().start(ScriptMeta { name: name.to_string() });
        info!(%name, parent = %self.current(), "Simulator::start_child: started");

        self.flows.push(TrackedFlow {
            name: name.to_string(),
            driven: Box::new(child),
            finishes,
        });
        self.active.push(self.flows.len() - 1);
    }

    fn pump(&self) -> usize {
        pump_limited(&self.shared, self.config.simulator.max_dispatches)
    }

    // Finished flows stop being current; the root always stays.
    fn settle(&mut self) {
        let flows = &self.flows;
        self.active
            .retain(|&index| index == 0 || !flows[index].driven.is_finished());
    }

    fn current_flow(&self) -> &TrackedFlow {
        let index = self.active.last().copied().unwrap_or(0);
        &self.flows[index]
    }

    fn check(&self, expectation: &Expectation) -> Vec<String> {
        let name = expectation.flow.as_deref().unwrap_or_else(|| self.current());
        let Some(flow) = self.flows.iter().find(|flow| flow.name == name) else {
            return vec![format!("unknown flow '{}'", name)];
        };

        let host = self.host.borrow();
        let mut failures = Vec::new();
        compare(&mut failures, name, "stack", &expectation.stack, flow.driven.stack());
        compare(&mut failures, name, "modals", &expectation.modals, flow.driven.modals());
        compare(&mut failures, name, "host-stack", &expectation.host_stack, titles(host.screens()));
        compare(&mut failures, name, "host-modals", &expectation.host_modals, titles(host.presented()));
        compare(&mut failures, name, "finished", &expectation.finished, flow.driven.is_finished());
        compare(&mut failures, name, "finish-count", &expectation.finish_count, flow.finishes.get());
        compare(&mut failures, name, "children", &expectation.children, flow.driven.child_count());
        failures
    }

    fn snapshot(&self, number: usize, op: &str, delivered: usize) -> StepReport {
        let flow = self.current_flow();
        let host = self.host.borrow();
        StepReport {
            number,
            op: op.to_string(),
            flow: flow.name.clone(),
            delivered,
            stack: flow.driven.stack(),
            modals: flow.driven.modals(),
            host_stack: titles(host.screens()),
            host_modals: titles(host.presented()),
        }
    }
}

/// Play `scenario` on a fresh simulator
pub fn run_scenario(scenario: &Scenario, config: &Config) -> Result<RunReport, ScenarioError> {
    Simulator::new(config).run(scenario)
}

fn screen_handle(spec: &ScreenSpec) -> ScreenHandle {
    ScreenHandle::new(ScriptedScreen::from_spec(spec))
}

fn count_finishes<M: 'static>(coordinator: &mut Coordinator<M>) -> Rc<Cell<usize>> {
    let finishes = Rc::new(Cell::new(0));
    let counter = finishes.clone();
    coordinator.set_on_finish(move |_| counter.set(counter.get() + 1));
    finishes
}

fn compare<T: PartialEq + Debug>(failures: &mut Vec<String>, flow: &str, what: &str, expected: &Option<T>, actual: T) {
    if let Some(expected) = expected
        && *expected != actual
    {
        failures.push(format!("{} {}: expected {:?}, got {:?}", flow, what, expected, actual));
    }
}
