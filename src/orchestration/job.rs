use crate::error::{BatchError, Result};
use crate::orchestration::{JobExecutionListener, Step};
use std::sync::Arc;

/// Named, ordered list of steps plus job-level listeners
pub struct Job {
    name: String,
    steps: Vec<Box<dyn Step>>,
    listeners: Vec<Arc<dyn JobExecutionListener>>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Job {
    pub fn builder(name: impl Into<String>) -> JobBuilder {
        JobBuilder {
            name: name.into(),
            steps: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub(crate) fn listeners(&self) -> &[Arc<dyn JobExecutionListener>] {
        &self.listeners
    }

    pub(crate) fn steps_mut(&mut self) -> &mut [Box<dyn Step>] {
        &mut self.steps
    }
}

pub struct JobBuilder {
    name: String,
    steps: Vec<Box<dyn Step>>,
    listeners: Vec<Arc<dyn JobExecutionListener>>,
}

impl JobBuilder {
    /// First step of the job
    pub fn start(mut self, step: impl Step + 'static) -> Self {
        self.steps.insert(0, Box::new(step));
        self
    }

    /// Step run after every previously added one has completed
    pub fn next(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn listener(mut self, listener: Arc<dyn JobExecutionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn build(self) -> Result<Job> {
        if self.steps.is_empty() {
            return Err(BatchError::Configuration(format!(
                "job '{}' has no steps",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name()) {
                return Err(BatchError::Configuration(format!(
                    "job '{}' declares step '{}' more than once",
                    self.name,
                    step.name()
                )));
            }
        }

        Ok(Job {
            name: self.name,
            steps: self.steps,
            listeners: self.listeners,
        })
    }
}
