use crate::model::{
    AutoScaling, ClusterService, CurrentDeployment, CurrentTasks, DeploymentInfo,
    DeploymentRecord, LoadBalancer, NetworkConfig, ScalingEvent, ScalingPolicy, ServiceConfiguration,
    ServiceDetails, ServiceEvent, ServiceEvents, ServiceOverview, TaskInfo,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::hash::{DefaultHasher, Hash, Hasher};

const MOCK_CLUSTERS: [&str; 3] = ["main-cluster", "api-cluster", "worker-cluster"];
const MOCK_SERVICES: [&str; 9] = [
    "web-service",
    "api-service",
    "auth-service",
    "worker-service",
    "queue-service",
    "cache-service",
    "database-service",
    "logging-service",
    "monitoring-service",
];
const MOCK_ROWS: usize = 15;
const HISTORY_POINTS: usize = 12;

/// Same key, same placeholder fleet.
fn seeded_rng(key: &str) -> StdRng {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

fn percent(rng: &mut StdRng) -> f64 {
    rng.random_range(10.0..90.0)
}

pub fn mock_clusters(alias: &str, now: DateTime<Utc>) -> Vec<ClusterService> {
    let mut rng = seeded_rng(alias);
    let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    (0..MOCK_ROWS)
        .map(|index| {
            let cluster = MOCK_CLUSTERS[rng.random_range(0..MOCK_CLUSTERS.len())];
            let service = MOCK_SERVICES[rng.random_range(0..MOCK_SERVICES.len())];
            ClusterService {
                account_alias: alias.to_string(),
                cluster_name: format!("{alias}-{cluster}"),
                service_name: format!("{service}-{index}"),
                running_tasks: rng.random_range(1..=5),
                pending_tasks: rng.random_range(0..3),
                current_cpu: percent(&mut rng),
                current_memory: percent(&mut rng),
                historical_cpu: (0..HISTORY_POINTS).map(|_| percent(&mut rng)).collect(),
                historical_memory: (0..HISTORY_POINTS).map(|_| percent(&mut rng)).collect(),
                last_updated: stamp.clone(),
            }
        })
        .collect()
}

pub fn mock_service_details(service_name: &str, now: DateTime<Utc>) -> ServiceDetails {
    let iso = |at: DateTime<Utc>| at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let hour_ago = now - Duration::hours(1);
    let task_family = format!("{service_name}-task");
    let task_definition = json!({
        "family": task_family,
        "revision": 3,
        "containers": [{
            "name": "app",
            "image": "nginx:latest",
            "cpu": 256,
            "memory": 512,
            "essential": true,
            "portMappings": [{"containerPort": 80, "hostPort": 80, "protocol": "tcp"}],
        }],
    });
    let target_group =
        "arn:aws:elasticloadbalancing:us-west-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067";

    ServiceDetails {
        service_overview: ServiceOverview {
            service_arn: format!("arn:aws:ecs:us-west-2:123456789012:service/{service_name}"),
            creation_date: iso(now - Duration::days(2)),
            task_definition: format!("{task_family}:3"),
            desired_count: 2,
            launch_type: "FARGATE".to_string(),
        },
        deployment_info: DeploymentInfo {
            current_deployment: CurrentDeployment {
                id: "ecs-svc/9223370536841983742".to_string(),
                status: "PRIMARY".to_string(),
                created_at: iso(hour_ago),
                updated_at: iso(now),
                task_definition: format!("{task_family}:3"),
                rollout_progress: 100.0,
                running_count: 2,
                desired_count: 2,
            },
            deployment_history: vec![
                DeploymentRecord {
                    id: "ecs-svc/9223370536841983742".to_string(),
                    status: "PRIMARY".to_string(),
                    task_definition: format!("{task_family}:3"),
                    created_at: iso(hour_ago),
                    completed_at: Some(iso(now)),
                },
                DeploymentRecord {
                    id: "ecs-svc/9223370536841983741".to_string(),
                    status: "COMPLETED".to_string(),
                    task_definition: format!("{task_family}:2"),
                    created_at: iso(now - Duration::hours(2)),
                    completed_at: Some(iso(hour_ago)),
                },
                DeploymentRecord {
                    id: "ecs-svc/9223370536841983740".to_string(),
                    status: "COMPLETED".to_string(),
                    task_definition: format!("{task_family}:1"),
                    created_at: iso(now - Duration::hours(24)),
                    completed_at: Some(iso(now - Duration::hours(23))),
                },
            ],
        },
        current_tasks: CurrentTasks {
            running_count: 2,
            desired_count: 2,
            tasks: ["a", "b"]
                .iter()
                .enumerate()
                .map(|(index, zone)| TaskInfo {
                    task_id: format!("ecs-task/922337053684198374{}", 2 + index),
                    health_status: "HEALTHY".to_string(),
                    started_at: iso(hour_ago),
                    container_instance: format!("i-0123456789abcdef{index}"),
                    availability_zone: format!("us-west-2{zone}"),
                    task_definition: task_definition.clone(),
                })
                .collect(),
        },
        events: ServiceEvents {
            service_events: vec![
                ServiceEvent {
                    kind: "INFO".to_string(),
                    message: "service became stable.".to_string(),
                    timestamp: iso(now),
                },
                ServiceEvent {
                    kind: "INFO".to_string(),
                    message: "taskSet deployment completed.".to_string(),
                    timestamp: iso(hour_ago),
                },
                ServiceEvent {
                    kind: "WARNING".to_string(),
                    message: "task failed to start.".to_string(),
                    timestamp: iso(now - Duration::minutes(90)),
                },
            ],
            scaling_events: vec![
                ScalingEvent {
                    timestamp: iso(now - Duration::hours(12)),
                    event_type: "SCALE_OUT".to_string(),
                    from_count: 1,
                    to_count: 2,
                    reason: "CPU utilization above target".to_string(),
                },
                ScalingEvent {
                    timestamp: iso(now - Duration::hours(24)),
                    event_type: "SCALE_IN".to_string(),
                    from_count: 2,
                    to_count: 1,
                    reason: "CPU utilization below target".to_string(),
                },
            ],
        },
        configuration: ServiceConfiguration {
            service_definition: json!({
                "serviceName": service_name,
                "taskDefinition": format!("{task_family}:3"),
                "desiredCount": 2,
                "launchType": "FARGATE",
                "platformVersion": "LATEST",
                "deploymentConfiguration": {"maximumPercent": 200, "minimumHealthyPercent": 100},
            }),
            load_balancer: Some(LoadBalancer {
                kind: "APPLICATION".to_string(),
                target_group_arn: target_group.to_string(),
                config: json!({
                    "containerName": "app",
                    "containerPort": 80,
                    "targetGroupArn": target_group,
                }),
            }),
            auto_scaling: Some(AutoScaling {
                min_capacity: 1,
                max_capacity: 4,
                status: "ENABLED".to_string(),
                policies: vec![
                    ScalingPolicy {
                        name: "cpu-tracking".to_string(),
                        kind: "TargetTrackingScaling".to_string(),
                        metric: "ECSServiceAverageCPUUtilization".to_string(),
                        target_value: 70.0,
                    },
                    ScalingPolicy {
                        name: "memory-tracking".to_string(),
                        kind: "TargetTrackingScaling".to_string(),
                        metric: "ECSServiceAverageMemoryUtilization".to_string(),
                        target_value: 80.0,
                    },
                ],
            }),
            network: NetworkConfig {
                network_mode: "awsvpc".to_string(),
                assign_public_ip: true,
                subnets: vec!["subnet-12345678".to_string(), "subnet-23456789".to_string()],
                security_groups: vec!["sg-12345678".to_string()],
            },
        },
    }
}
