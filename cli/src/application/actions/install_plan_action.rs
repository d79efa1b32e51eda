//! Pipeline head: hands an `InstallPlan` to the next stage.
//!
//! Placed first it injects a plan built before the run. Placed after another
//! plan-producing stage it passes the received plan through unchanged.

use slotup_common::{ErrorCode, InstallPlan};

use crate::application::pipeline::{AbstractAction, Action, ActionCompleter, ActionPorts};

/// Carries a plan built before the run into the pipeline.
#[derive(Default)]
pub struct InstallPlanAction {
    install_plan: InstallPlan,
    ports: ActionPorts<InstallPlan, InstallPlan>,
}

impl InstallPlanAction {
    #[must_use]
    pub fn new(install_plan: InstallPlan) -> Self {
        Self {
            install_plan,
            ports: ActionPorts::default(),
        }
    }

    #[must_use]
    pub fn install_plan(&self) -> &InstallPlan {
        &self.install_plan
    }

    pub fn install_plan_mut(&mut self) -> &mut InstallPlan {
        &mut self.install_plan
    }
}

impl AbstractAction for InstallPlanAction {
    fn perform_action(&mut self, completer: ActionCompleter) {
        if let Some(plan) = self.take_input_object() {
            self.install_plan = plan;
        }
        if self.has_output_pipe() {
            let plan = self.install_plan.clone();
            if let Err(e) = self.set_output_object(plan) {
                tracing::error!(error = %e, "cannot hand install plan to next stage");
                completer.complete(ErrorCode::Error);
                return;
            }
        }
        completer.complete(ErrorCode::Success);
    }

    fn type_name(&self) -> &'static str {
        "InstallPlanAction"
    }
}

impl Action for InstallPlanAction {
    type Input = InstallPlan;
    type Output = InstallPlan;

    fn ports(&self) -> &ActionPorts<InstallPlan, InstallPlan> {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut ActionPorts<InstallPlan, InstallPlan> {
        &mut self.ports
    }
}
