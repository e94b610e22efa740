//! Structural gate for the prod compute stack.
//!
//! Blue-green release with a TLS production listener and a plain-HTTP test
//! listener.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use stackwright_common::types::EnvironmentName;
use stackwright_topology::resource::{
    DeploymentController, ExternalController, ListenerRole, Protocol, ResourceKind, SslPolicy,
};

#[test]
fn prod_service_is_driven_externally() {
    let graph = support::service_stack(EnvironmentName::Prod);
    let (_, service) = graph.specs(ResourceKind::as_service)[0];
    assert_eq!(
        service.deployment_controller,
        DeploymentController::External(ExternalController::CodeDeploy)
    );
}

#[test]
fn prod_has_production_and_test_listeners() {
    let graph = support::service_stack(EnvironmentName::Prod);
    let listeners = graph.specs(ResourceKind::as_listener);
    let ports: Vec<u16> = listeners.iter().map(|(_, l)| l.port).collect();
    assert_eq!(ports, vec![443, 8080]);
    assert_eq!(graph.count("TargetGroup"), 2);
    assert_eq!(graph.count("ListenerRule"), 2);
}

#[test]
fn prod_certificate_binds_production_listener_only() {
    let graph = support::service_stack(EnvironmentName::Prod);
    for (_, listener) in graph.specs(ResourceKind::as_listener) {
        match listener.role {
            ListenerRole::Production => {
                assert_eq!(listener.protocol, Protocol::Https);
                assert_eq!(listener.ssl_policy, Some(SslPolicy::Recommended));
                assert!(
                    listener
                        .certificate_arn
                        .as_deref()
                        .is_some_and(|arn| arn.starts_with("arn:aws:acm:"))
                );
            }
            ListenerRole::Test => {
                assert_eq!(listener.protocol, Protocol::Http);
                assert!(listener.certificate_arn.is_none());
            }
        }
    }
}

#[test]
fn prod_target_groups_share_health_check() {
    let graph = support::service_stack(EnvironmentName::Prod);
    for (_, group) in graph.specs(ResourceKind::as_target_group) {
        assert_eq!(group.health_check.path, "/health");
        assert_eq!(group.health_check.interval_seconds, 15);
        assert_eq!(group.health_check.healthy_http_codes, "200");
        assert_eq!(group.deregistration_delay_seconds, 10);
    }
}
