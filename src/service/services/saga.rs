use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

/// A side effect that has already happened and how to take it back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Compensation {
    TerminatePod(String),
    DeleteVolume(String),
    DeleteAuthUser(Uuid),
    DeleteOrganization(Uuid),
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compensation::TerminatePod(pod_id) => write!(f, "terminate pod {pod_id}"),
            Compensation::DeleteVolume(volume_id) => write!(f, "delete volume {volume_id}"),
            Compensation::DeleteAuthUser(user_id) => write!(f, "delete auth user {user_id}"),
            Compensation::DeleteOrganization(organization_id) => {
                write!(f, "delete organization {organization_id}")
            }
        }
    }
}

#[async_trait]
pub trait Compensator: Send + Sync {
    async fn compensate(&self, step: &Compensation) -> anyhow::Result<()>;
}

/// Undo list for a multi-step workflow. Steps are recorded as they succeed and
/// unwound newest first. Unwinding is best-effort: failures are logged and the
/// remaining steps still run.
#[derive(Debug)]
pub struct Saga {
    name: &'static str,
    completed: Vec<Compensation>,
}

impl Saga {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            completed: Vec::new(),
        }
    }

    pub fn record(&mut self, step: Compensation) {
        self.completed.push(step);
    }

    /// Drops all recorded steps once the workflow has committed.
    pub fn commit(mut self) {
        self.completed.clear();
    }

    /// Runs the compensations in reverse order and returns the ones that failed.
    pub async fn unwind(mut self, compensator: &dyn Compensator) -> Vec<Compensation> {
        let mut failed = Vec::new();

        while let Some(step) = self.completed.pop() {
            match compensator.compensate(&step).await {
                Ok(()) => tracing::info!(saga = self.name, "compensated: {}", step),
                Err(err) => {
                    tracing::error!(saga = self.name, "compensation '{}' failed: {:?}", step, err);
                    failed.push(step);
                }
            }
        }

        failed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingCompensator {
        seen: Mutex<Vec<Compensation>>,
        fail_on: Option<Compensation>,
    }

    #[async_trait]
    impl Compensator for RecordingCompensator {
        async fn compensate(&self, step: &Compensation) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(step.clone());

            if self.fail_on.as_ref() == Some(step) {
                anyhow::bail!("nope");
            }

            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unwind_runs_in_reverse_and_continues_after_failure() {
        let compensator = RecordingCompensator {
            fail_on: Some(Compensation::TerminatePod("pod-1".into())),
            ..Default::default()
        };

        let mut saga = Saga::new("test");
        saga.record(Compensation::DeleteVolume("vol-1".into()));
        saga.record(Compensation::TerminatePod("pod-1".into()));

        let failed = saga.unwind(&compensator).await;

        assert_eq!(failed, vec![Compensation::TerminatePod("pod-1".into())]);
        assert_eq!(
            *compensator.seen.lock().unwrap(),
            vec![
                Compensation::TerminatePod("pod-1".into()),
                Compensation::DeleteVolume("vol-1".into()),
            ]
        );
    }
}
