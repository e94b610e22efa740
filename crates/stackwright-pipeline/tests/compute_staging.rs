//! Structural gate for the staging compute stack.
//!
//! Rolling update with circuit-breaker rollback, tasks in private subnets.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use stackwright_common::types::{EnvironmentName, ResourceId};
use stackwright_topology::resource::{
    DeploymentController, Protocol, Relation, ResourceKind, SubnetTier,
};

#[test]
fn staging_service_rolls_back_on_failure() {
    let graph = support::service_stack(EnvironmentName::Staging);
    let (_, service) = graph.specs(ResourceKind::as_service)[0];
    assert_eq!(
        service.deployment_controller,
        DeploymentController::Rolling {
            circuit_breaker_rollback: true
        }
    );
    assert_eq!(service.desired_count, 2);
    assert_eq!(service.placement, SubnetTier::Application);
    assert!(!service.assign_public_ip);
}

#[test]
fn staging_has_single_production_listener() {
    let graph = support::service_stack(EnvironmentName::Staging);
    let listeners = graph.specs(ResourceKind::as_listener);
    assert_eq!(listeners.len(), 1);
    let (_, listener) = listeners[0];
    assert_eq!(listener.port, 443);
    assert_eq!(listener.protocol, Protocol::Http);
    assert!(listener.certificate_arn.is_none());
    assert_eq!(graph.count("TargetGroup"), 1);
}

#[test]
fn staging_target_group_checks_health_path() {
    let graph = support::service_stack(EnvironmentName::Staging);
    let (id, group) = graph.specs(ResourceKind::as_target_group)[0];
    assert_eq!(group.health_check.path, "/health");
    assert_eq!(group.health_check.healthy_http_codes, "200");
    assert_eq!(group.port, 80);
    assert!(graph.has_edge(id, &ResourceId::new("Service"), Relation::RoutesTo));
}

#[test]
fn staging_container_logs_to_its_own_group() {
    let graph = support::service_stack(EnvironmentName::Staging);
    let task = ResourceId::new("TaskDef");
    assert!(graph.has_edge(&task, &ResourceId::new("EcsLogGroup"), Relation::LogsTo));
    assert!(graph.has_edge(&task, &ResourceId::new("Repository"), Relation::PullsFrom));
    assert!(graph.creation_order().is_ok());
}
