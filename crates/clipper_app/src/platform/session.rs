use clipper_core::{update, AppViewModel, Msg, OrchestratorState};

use super::effects::EffectRunner;

/// Owns the orchestrator state for one consumer. Every message goes through
/// `update`; dropping the session tears the job down.
pub struct Session {
    state: OrchestratorState,
    runner: EffectRunner,
}

impl Session {
    pub fn new(state: OrchestratorState, runner: EffectRunner) -> Self {
        Self { state, runner }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Applies `msg` and returns a fresh view when something visible changed.
    pub fn dispatch(&mut self, msg: Msg) -> Option<AppViewModel> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.consume_dirty().then(|| state.view());
        self.state = state;
        self.runner.enqueue(effects);
        view
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispatch(Msg::Teardown);
    }
}
