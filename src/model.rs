use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub const STATUS_COMPLETED: &str = "Refresh completed";
pub const STATUS_FAILED: &str = "Refresh failed";
pub const STATUS_NOT_STARTED: &str = "Not started";

/// One service row as returned by `GET /clusters`.
///
/// Snapshots are replaced wholesale on every fetch. The pair
/// `(cluster_name, service_name)` is not guaranteed unique, so callers that
/// need a key fall back to the list index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterService {
    #[serde(default)]
    pub account_alias: String,
    pub cluster_name: String,
    pub service_name: String,
    #[serde(default)]
    pub running_tasks: u32,
    #[serde(default)]
    pub pending_tasks: u32,
    #[serde(default)]
    pub current_cpu: f64,
    #[serde(default)]
    pub current_memory: f64,
    #[serde(default)]
    pub historical_cpu: Vec<f64>,
    #[serde(default)]
    pub historical_memory: Vec<f64>,
    #[serde(default)]
    pub last_updated: String,
}

impl ClusterService {
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }

        let query_lower = query.to_lowercase();
        self.cluster_name.to_lowercase().contains(&query_lower)
            || self.service_name.to_lowercase().contains(&query_lower)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub in_progress: bool,
    #[serde(default)]
    pub status: String,
}

impl RefreshStatus {
    pub fn new(in_progress: bool, status: impl Into<String>) -> Self {
        Self {
            in_progress,
            status: status.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DetailTab {
    Overview,
    Tasks,
    Config,
    Events,
    Deployment,
}

impl DetailTab {
    pub const ALL: [Self; 5] = [
        Self::Overview,
        Self::Tasks,
        Self::Config,
        Self::Events,
        Self::Deployment,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Tasks => "Tasks",
            Self::Config => "Config",
            Self::Events => "Events",
            Self::Deployment => "Deployment",
        }
    }

    pub fn offset(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let current = Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        Self::ALL[next]
    }
}

impl Display for DetailTab {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Payload of `GET /service-details`. Free-form blocks stay as JSON values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceDetails {
    #[serde(default)]
    pub service_overview: ServiceOverview,
    #[serde(default)]
    pub deployment_info: DeploymentInfo,
    #[serde(default)]
    pub current_tasks: CurrentTasks,
    #[serde(default)]
    pub events: ServiceEvents,
    #[serde(default)]
    pub configuration: ServiceConfiguration,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceOverview {
    #[serde(default)]
    pub service_arn: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub task_definition: String,
    #[serde(default)]
    pub desired_count: u32,
    #[serde(default)]
    pub launch_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeploymentInfo {
    #[serde(default)]
    pub current_deployment: CurrentDeployment,
    #[serde(default)]
    pub deployment_history: Vec<DeploymentRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentDeployment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub task_definition: String,
    #[serde(default)]
    pub rollout_progress: f64,
    #[serde(default)]
    pub running_count: u32,
    #[serde(default)]
    pub desired_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeploymentRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub task_definition: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentTasks {
    #[serde(default)]
    pub running_count: u32,
    #[serde(default)]
    pub desired_count: u32,
    #[serde(default)]
    pub tasks: Vec<TaskInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub health_status: String,
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub container_instance: String,
    #[serde(default)]
    pub availability_zone: String,
    #[serde(default)]
    pub task_definition: Value,
}

impl TaskInfo {
    pub fn healthy(&self) -> bool {
        self.health_status.eq_ignore_ascii_case("HEALTHY")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceEvents {
    #[serde(default)]
    pub service_events: Vec<ServiceEvent>,
    #[serde(default)]
    pub scaling_events: Vec<ScalingEvent>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceEvent {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalingEvent {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub from_count: u32,
    #[serde(default)]
    pub to_count: u32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    #[serde(default)]
    pub service_definition: Value,
    #[serde(default)]
    pub load_balancer: Option<LoadBalancer>,
    #[serde(default)]
    pub auto_scaling: Option<AutoScaling>,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadBalancer {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub target_group_arn: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoScaling {
    #[serde(default)]
    pub min_capacity: u32,
    #[serde(default)]
    pub max_capacity: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub policies: Vec<ScalingPolicy>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalingPolicy {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub target_value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub network_mode: String,
    #[serde(default)]
    pub assign_public_ip: bool,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
}
