//! Step log — the per-run record of everything the controller did.
//!
//! Steps are only ever appended. When a sender is attached each recorded step
//! is also pushed to it, so a caller can render the run while it proceeds.

use threadloop_core::step::AgentStep;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

#[derive(Debug, Default)]
pub struct StepLog {
    steps: Vec<AgentStep>,
    sender: Option<UnboundedSender<AgentStep>>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every recorded step to `sender`.
    pub fn with_sender(sender: UnboundedSender<AgentStep>) -> Self {
        Self {
            steps: Vec::new(),
            sender: Some(sender),
        }
    }

    pub fn record(&mut self, step: AgentStep) {
        trace!(kind = %step.kind, content = %step.content, "Step recorded");
        if let Some(sender) = &self.sender {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(step.clone());
        }
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<AgentStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadloop_core::step::StepKind;

    #[test]
    fn records_in_order_without_dedup() {
        let mut log = StepLog::new();
        log.record(AgentStep::thinking("a"));
        log.record(AgentStep::thinking("a"));
        log.record(AgentStep::response("done"));
        let kinds: Vec<StepKind> = log.steps().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StepKind::Thinking, StepKind::Thinking, StepKind::Response]);
    }

    #[tokio::test]
    async fn forwards_to_sender() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut log = StepLog::with_sender(tx);
        log.record(AgentStep::thinking("hello"));
        assert_eq!(rx.recv().await.unwrap().content, "hello");
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let mut log = StepLog::with_sender(tx);
        log.record(AgentStep::thinking("nobody listens"));
        assert_eq!(log.len(), 1);
    }
}
