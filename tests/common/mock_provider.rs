//! Mock compute provider
//!
//! In-memory `ComputeProvider` that records every call and can be scripted to return
//! capacity errors, lose instances, fail terminations or panic mid-creation.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use cloudburst_core::models::HardwareProfile;
use cloudburst_core::provider::{
    Availability, ComputeProvider, InstanceState, InstanceStatus, LaunchSpec, ProviderError,
};

/// Everything the provider has been asked to do
#[derive(Debug, Default, Clone)]
pub struct MockProviderState {
    /// Instance classes passed to `describe_availability`, in call order
    pub availability_checks: Vec<String>,
    /// Instance classes passed to `create`, in call order
    pub create_attempts: Vec<String>,
    /// Successfully created instances as `(instance_id, instance_class)`
    pub created: Vec<(String, String)>,
    /// Launch specs passed to successful creations
    pub launches: Vec<LaunchSpec>,
    pub terminated: Vec<String>,
    pub force_terminated: Vec<String>,
    describe_polls: HashMap<String, u32>,
}

#[derive(Debug, Clone)]
pub struct MockComputeProvider {
    state: Arc<Mutex<MockProviderState>>,
    unavailable: HashSet<String>,
    availability_error: bool,
    create_errors: Arc<Mutex<VecDeque<ProviderError>>>,
    panic_on_create: Option<usize>,
    pending_polls: u32,
    lose_instances: bool,
    withhold_address: bool,
    terminate_error: Option<ProviderError>,
    force_terminate_error: Option<ProviderError>,
}

impl Default for MockComputeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockComputeProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockProviderState::default())),
            unavailable: HashSet::new(),
            availability_error: false,
            create_errors: Arc::new(Mutex::new(VecDeque::new())),
            panic_on_create: None,
            pending_polls: 0,
            lose_instances: false,
            withhold_address: false,
            terminate_error: None,
            force_terminate_error: None,
        }
    }

    /// Report these instance classes as not offered in the region
    pub fn with_unavailable(mut self, classes: &[&str]) -> Self {
        self.unavailable = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Make every availability check fail
    pub fn with_failing_availability(mut self) -> Self {
        self.availability_error = true;
        self
    }

    /// Errors returned by successive `create` calls before creations start succeeding
    pub fn with_create_errors(self, errors: Vec<ProviderError>) -> Self {
        *self.create_errors.lock().unwrap() = errors.into();
        self
    }

    /// Panic on the `n`th `create` call (1-based)
    pub fn panicking_on_create(mut self, n: usize) -> Self {
        self.panic_on_create = Some(n);
        self
    }

    /// Report `pending` for this many polls before `running`
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Instances report `terminated` as soon as they are described
    pub fn losing_instances(mut self) -> Self {
        self.lose_instances = true;
        self
    }

    /// Instances run but never get a public address
    pub fn without_address(mut self) -> Self {
        self.withhold_address = true;
        self
    }

    pub fn with_terminate_error(mut self, error: ProviderError) -> Self {
        self.terminate_error = Some(error);
        self
    }

    pub fn with_force_terminate_error(mut self, error: ProviderError) -> Self {
        self.force_terminate_error = Some(error);
        self
    }

    pub fn state(&self) -> MockProviderState {
        self.state.lock().unwrap().clone()
    }

    pub fn created_ids(&self) -> Vec<String> {
        self.state().created.into_iter().map(|(id, _)| id).collect()
    }

    pub fn terminated_ids(&self) -> Vec<String> {
        self.state().terminated
    }
}

#[async_trait]
impl ComputeProvider for MockComputeProvider {
    async fn describe_availability(
        &self,
        instance_class: &str,
    ) -> Result<Availability, ProviderError> {
        self.state
            .lock()
            .unwrap()
            .availability_checks
            .push(instance_class.to_string());
        if self.availability_error {
            return Err(ProviderError::new("availability API unreachable"));
        }
        let available = !self.unavailable.contains(instance_class);
        Ok(Availability {
            instance_class: instance_class.to_string(),
            available,
            zones: if available {
                vec!["us-east-1a".to_string(), "us-east-1b".to_string()]
            } else {
                Vec::new()
            },
        })
    }

    async fn create(
        &self,
        profile: &HardwareProfile,
        launch: &LaunchSpec,
    ) -> Result<String, ProviderError> {
        let call = {
            let mut state = self.state.lock().unwrap();
            state.create_attempts.push(profile.instance_class.clone());
            state.create_attempts.len()
        };
        if self.panic_on_create == Some(call) {
            panic!("simulated provider crash on create #{call}");
        }
        if let Some(error) = self.create_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let mut state = self.state.lock().unwrap();
        let instance_id = format!("i-{:04}", state.created.len() + 1);
        state
            .created
            .push((instance_id.clone(), profile.instance_class.clone()));
        state.launches.push(launch.clone());
        Ok(instance_id)
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceStatus, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.terminated.iter().any(|id| id == instance_id) || self.lose_instances {
            return Ok(InstanceStatus {
                state: InstanceState::Terminated,
                public_address: None,
            });
        }
        let polls = state
            .describe_polls
            .entry(instance_id.to_string())
            .or_insert(0);
        *polls += 1;
        if *polls <= self.pending_polls {
            return Ok(InstanceStatus {
                state: InstanceState::Pending,
                public_address: None,
            });
        }
        let index = state
            .created
            .iter()
            .position(|(id, _)| id == instance_id)
            .unwrap_or(0);
        Ok(InstanceStatus {
            state: InstanceState::Running,
            public_address: (!self.withhold_address).then(|| format!("10.0.0.{}", index + 1)),
        })
    }

    async fn terminate(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.state
            .lock()
            .unwrap()
            .terminated
            .push(instance_id.to_string());
        match &self.terminate_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn force_terminate(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.state
            .lock()
            .unwrap()
            .force_terminated
            .push(instance_id.to_string());
        match &self.force_terminate_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
