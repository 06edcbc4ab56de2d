use std::sync::Arc;

use async_trait::async_trait;

use crate::command::{Output, Result, Runner};

/// How privileged commands gain elevated rights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Escalation {
    /// Prefix every privileged command with `sudo`.
    #[default]
    Sudo,
    /// Run privileged commands as-is, e.g. when already running as root.
    None,
}

/// Runs the system commands needed to configure traffic control.
///
/// Implementations must fail with [`crate::command::Error::NonZero`] when the command exits with
/// a non-zero status: callers rely on that to detect rejected kernel operations without parsing
/// their output.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs a single command with elevated privileges.
    async fn privileged(&self, argv: &[&str]) -> Result<Output>;

    /// Runs a shell pipeline and returns its captured output.
    async fn shell(&self, pipeline: &str) -> Result<Output>;
}

#[async_trait]
impl<T: Executor + ?Sized> Executor for Arc<T> {
    async fn privileged(&self, argv: &[&str]) -> Result<Output> {
        (**self).privileged(argv).await
    }

    async fn shell(&self, pipeline: &str) -> Result<Output> {
        (**self).shell(pipeline).await
    }
}

/// [`Executor`] backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor {
    escalation: Escalation,
}

impl SystemExecutor {
    /// Creates an executor escalating privileged commands with `escalation`.
    pub const fn new(escalation: Escalation) -> Self {
        Self { escalation }
    }

    /// How privileged commands are escalated.
    pub const fn escalation(&self) -> Escalation {
        self.escalation
    }

    fn privileged_argv<'a>(&self, argv: &[&'a str]) -> Vec<&'a str> {
        match self.escalation {
            Escalation::Sudo => std::iter::once("sudo").chain(argv.iter().copied()).collect(),
            Escalation::None => argv.to_vec(),
        }
    }
}

#[async_trait]
impl Executor for SystemExecutor {
    async fn privileged(&self, argv: &[&str]) -> Result<Output> {
        Runner::run(&self.privileged_argv(argv)).await
    }

    async fn shell(&self, pipeline: &str) -> Result<Output> {
        Runner::shell(pipeline).await
    }
}
