//! Sequential workflow runner.
//!
//! Steps run in order against a shared context. When a step fails, every step
//! that already completed is compensated in reverse order and the original
//! error is returned.
use async_trait::async_trait;
use leptos::logging::{error, log};

use crate::error::StoreError;

pub mod order_shipped;

#[async_trait]
pub trait WorkflowStep<C: Send + Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(&self, ctx: &mut C) -> Result<(), StoreError>;

    async fn compensate(&self, _ctx: &mut C) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct Workflow<C: Send + Sync> {
    name: &'static str,
    steps: Vec<Box<dyn WorkflowStep<C>>>,
}

impl<C: Send + Sync> Workflow<C> {
    pub fn new(name: &'static str) -> Self {
        Workflow {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl WorkflowStep<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, ctx: &mut C) -> Result<(), StoreError> {
        log!("[WORKFLOW] {} started", self.name);
        for (index, step) in self.steps.iter().enumerate() {
            log!("[WORKFLOW] {} -> {}", self.name, step.name());
            if let Err(err) = step.invoke(ctx).await {
                error!(
                    "[WORKFLOW] {} failed at {}: {}",
                    self.name,
                    step.name(),
                    err
                );
                for done in self.steps[..index].iter().rev() {
                    if let Err(comp_err) = done.compensate(ctx).await {
                        error!(
                            "[WORKFLOW] {} compensation of {} failed: {}",
                            self.name,
                            done.name(),
                            comp_err
                        );
                    }
                }
                return Err(err);
            }
        }
        log!("[WORKFLOW] {} completed", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
    }

    struct Recording {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl WorkflowStep<Trace> for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn invoke(&self, ctx: &mut Trace) -> Result<(), StoreError> {
            ctx.events.push(format!("invoke:{}", self.name));
            if self.fail {
                return Err(StoreError::Invalid(format!("{} failed", self.name)));
            }
            Ok(())
        }

        async fn compensate(&self, ctx: &mut Trace) -> Result<(), StoreError> {
            ctx.events.push(format!("compensate:{}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_steps_in_order() {
        let workflow = Workflow::new("demo")
            .step(Recording { name: "a", fail: false })
            .step(Recording { name: "b", fail: false });
        let mut trace = Trace::default();
        workflow.run(&mut trace).await.unwrap();
        assert_eq!(trace.events, vec!["invoke:a", "invoke:b"]);
        assert_eq!(workflow.step_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_compensates_completed_steps_in_reverse() {
        let workflow = Workflow::new("demo")
            .step(Recording { name: "a", fail: false })
            .step(Recording { name: "b", fail: false })
            .step(Recording { name: "c", fail: true })
            .step(Recording { name: "d", fail: false });
        let mut trace = Trace::default();
        assert!(workflow.run(&mut trace).await.is_err());
        assert_eq!(
            trace.events,
            vec![
                "invoke:a",
                "invoke:b",
                "invoke:c",
                "compensate:b",
                "compensate:a"
            ]
        );
    }
}
