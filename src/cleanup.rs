use crate::error::Result;
use std::future::Future;
use tracing::warn;

/// Runs a sequence of independent fallible cleanup steps without
/// short-circuiting: a failing motor command must never prevent the LED
/// reset that follows it. Failures are logged and collected.
pub struct IsolatedSteps {
    context: &'static str,
    failures: Vec<(&'static str, String)>,
}

impl IsolatedSteps {
    pub fn new(context: &'static str) -> Self {
        Self {
            context,
            failures: Vec::new(),
        }
    }

    /// Run one step, swallowing and recording its error.
    pub async fn run<F>(&mut self, step: &'static str, fut: F)
    where
        F: Future<Output = Result<()>>,
    {
        if let Err(e) = fut.await {
            warn!("{}: step '{}' failed: {}", self.context, step, e);
            self.failures.push((step, e.to_string()));
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[(&'static str, String)] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RobomuxError;

    #[tokio::test]
    async fn all_steps_run_despite_failures() {
        let mut steps = IsolatedSteps::new("test");
        let mut ran = Vec::new();

        steps
            .run("first", async {
                ran.push("first");
                Err(RobomuxError::hardware("boom"))
            })
            .await;
        steps
            .run("second", async {
                ran.push("second");
                Ok(())
            })
            .await;
        steps
            .run("third", async {
                ran.push("third");
                Err(RobomuxError::hardware("bang"))
            })
            .await;

        assert_eq!(ran, vec!["first", "second", "third"]);
        assert!(!steps.is_clean());
        assert_eq!(steps.failures().len(), 2);
        assert_eq!(steps.failures()[0].0, "first");
    }

    #[tokio::test]
    async fn clean_run_reports_clean() {
        let mut steps = IsolatedSteps::new("test");
        steps.run("only", async { Ok(()) }).await;
        assert!(steps.is_clean());
    }
}
