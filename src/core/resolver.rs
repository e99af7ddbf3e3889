//! Cascading enable/disable over the declared dependency graph.
//!
//! Plans are computed in full before any archive moves, so a cycle or a
//! missing dependency leaves disk and store untouched.

use crate::core::prompt::Prompt;
use crate::core::registry::ModRegistry;
use crate::models::error::SError;
use crate::models::mod_dto::ModLocation;
use crate::models::report::ToggleOutcome;
use std::collections::HashSet;
use tracing::{info, warn};

/// Ordered toggles for one request. The requested mod is always last.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    pub steps: Vec<String>,
    /// Dependents that could not be touched because their archive is gone.
    pub skipped: Vec<String>,
}

impl CascadePlan {
    /// Everything the plan toggles besides the requested mod.
    pub fn cascaded(&self) -> &[String] {
        self.steps.split_last().map(|(_, rest)| rest).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    /// Follow `depends_on` edges.
    Dependencies,
    /// Follow reverse edges.
    Dependents,
}

struct Walk<'a> {
    registry: &'a ModRegistry,
    direction: Direction,
    path: Vec<String>,
    visited: HashSet<String>,
    plan: CascadePlan,
}

impl Walk<'_> {
    fn visit(&mut self, name: &str, root: bool) -> Result<(), SError> {
        if let Some(pos) = self.path.iter().position(|n| n == name) {
            let mut chain = self.path[pos..].to_vec();
            chain.push(name.to_string());
            return Err(SError::CyclicDependency(chain));
        }
        if !self.visited.insert(name.to_string()) {
            return Ok(());
        }

        let location = self.registry.find_mod_file(name);
        let include = match (self.direction, &location) {
            (_, ModLocation::Missing) if root => return Err(SError::NotFound(name.to_string())),
            (Direction::Dependencies, ModLocation::Missing) => {
                return Err(SError::NotFound(name.to_string()))
            }
            // Already enabled dependencies stay as they are.
            (Direction::Dependencies, ModLocation::Active(_)) if !root => return Ok(()),
            (Direction::Dependencies, _) => true,
            (Direction::Dependents, ModLocation::Missing) => {
                warn!("Dependent {name} has no archive on disk; skipping");
                self.plan.skipped.push(name.to_string());
                false
            }
            (Direction::Dependents, ModLocation::Active(_)) => true,
            (Direction::Dependents, ModLocation::Disabled(_)) => root,
        };

        self.path.push(name.to_string());
        let next = match self.direction {
            Direction::Dependencies => self.registry.dependencies_of(name)?,
            Direction::Dependents => self.registry.dependents_of(name)?,
        };
        for other in next {
            self.visit(&other, false)?;
        }
        self.path.pop();

        if include {
            self.plan.steps.push(name.to_string());
        }
        Ok(())
    }
}

fn plan(registry: &ModRegistry, name: &str, direction: Direction) -> Result<CascadePlan, SError> {
    let mut walk = Walk {
        registry,
        direction,
        path: Vec::new(),
        visited: HashSet::new(),
        plan: CascadePlan::default(),
    };
    walk.visit(name, true)?;
    Ok(walk.plan)
}

/// Dependencies that are not enabled yet, deepest first, then `name`.
pub fn plan_enable(registry: &ModRegistry, name: &str) -> Result<CascadePlan, SError> {
    plan(registry, name, Direction::Dependencies)
}

/// Enabled transitive dependents, outermost first, then `name`.
pub fn plan_disable(registry: &ModRegistry, name: &str) -> Result<CascadePlan, SError> {
    plan(registry, name, Direction::Dependents)
}

/// Enables `name` after every dependency it needs. Returns the plan and the
/// outcome for the requested mod.
pub fn enable(registry: &ModRegistry, name: &str) -> Result<(CascadePlan, ToggleOutcome), SError> {
    let plan = plan_enable(registry, name)?;
    let outcome = execute(registry, &plan, true)?;
    if !plan.cascaded().is_empty() {
        info!("Enabled dependencies of {name}: {}", plan.cascaded().join(", "));
    }
    Ok((plan, outcome))
}

/// Disables `name` after its dependents. Asks once before cascading.
pub fn disable(
    registry: &ModRegistry,
    name: &str,
    prompt: &dyn Prompt,
) -> Result<(CascadePlan, ToggleOutcome), SError> {
    let plan = plan_disable(registry, name)?;

    let cascaded = plan.cascaded();
    if !cascaded.is_empty() {
        let message = format!(
            "The following mods depend on '{name}' and will also be disabled:\n\n{}",
            cascaded.join("\n")
        );
        if !prompt.confirm("Disable dependents?", &message) {
            return Err(SError::ConfirmationDeclined(name.to_string()));
        }
    }

    let outcome = execute(registry, &plan, false)?;
    if !cascaded.is_empty() {
        info!("Disabled dependents of {name}: {}", cascaded.join(", "));
    }
    Ok((plan, outcome))
}

fn execute(registry: &ModRegistry, plan: &CascadePlan, enabled: bool) -> Result<ToggleOutcome, SError> {
    let mut last = ToggleOutcome::AlreadySatisfied;
    for step in &plan.steps {
        last = registry.set_location(step, enabled)?;
    }
    Ok(last)
}
