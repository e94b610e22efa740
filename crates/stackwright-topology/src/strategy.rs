//! Deployment Strategy Resolver.
//!
//! Wires listeners and target groups on the shared load balancer according
//! to the release strategy: one production pair for rolling updates, a
//! production pair plus a test pair for blue-green releases.

use stackwright_common::constants::{
    HEALTHY_HTTP_CODES, STATUS_CONTENT_TYPE, STATUS_PATH, STATUS_RESPONSE_CODE,
    STATUS_RULE_PRIORITY, TARGET_GROUP_PORT,
};
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::ResourceId;
use stackwright_config::{DeploymentStrategy, HealthCheckConfig, LoadBalancerConfig};

use crate::graph::{TopologyBuilder, TopologyGraph};
use crate::network::LoadBalancerRef;
use crate::resource::{
    FixedResponse, ImportedKind, ListenerRole, ListenerRuleSpec, ListenerSpec, Protocol, Relation,
    ResourceKind, SslPolicy, TargetGroupSpec, TargetHealthCheck,
};
use crate::service::{ServiceTopology, controller_for};

/// Listener/target-group wiring of one environment.
#[derive(Debug, Clone)]
pub struct TrafficTopology {
    graph: TopologyGraph,
    roles: Vec<ListenerRole>,
}

impl TrafficTopology {
    /// The frozen resource graph.
    #[must_use]
    pub const fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Consumes the topology, returning its graph.
    #[must_use]
    pub fn into_graph(self) -> TopologyGraph {
        self.graph
    }

    /// Roles wired, production first.
    #[must_use]
    pub fn roles(&self) -> &[ListenerRole] {
        &self.roles
    }

    /// Listeners, in wiring order.
    #[must_use]
    pub fn listeners(&self) -> Vec<(&ResourceId, &ListenerSpec)> {
        self.graph.specs(ResourceKind::as_listener)
    }

    /// Target groups, in wiring order.
    #[must_use]
    pub fn target_groups(&self) -> Vec<(&ResourceId, &TargetGroupSpec)> {
        self.graph.specs(ResourceKind::as_target_group)
    }
}

/// Roles a strategy needs.
#[must_use]
pub fn roles_for(strategy: &DeploymentStrategy) -> Vec<ListenerRole> {
    match strategy {
        DeploymentStrategy::RollingUpdate { .. } => vec![ListenerRole::Production],
        DeploymentStrategy::BlueGreen => vec![ListenerRole::Production, ListenerRole::Test],
    }
}

/// Logical ID of a role's listener.
#[must_use]
pub fn listener_id(role: ListenerRole) -> ResourceId {
    ResourceId::new(format!("Alb{}Listener", role.prefix()))
}

/// Logical ID of a role's target group.
#[must_use]
pub fn target_group_id(role: ListenerRole) -> ResourceId {
    ResourceId::new(format!("EcsFor{}", role.prefix()))
}

/// Resolves the traffic wiring for `service` on `load_balancer`.
///
/// # Errors
///
/// Returns a configuration error if `service` was built for a different
/// strategy.
pub fn resolve(
    strategy: &DeploymentStrategy,
    service: &ServiceTopology,
    load_balancer: &LoadBalancerRef,
    config: &LoadBalancerConfig,
) -> Result<TrafficTopology> {
    if controller_for(strategy) != service.controller() {
        return Err(StackwrightError::config(
            "deployment.strategy",
            format!(
                "the strategy the service was built with ({:?})",
                service.controller()
            ),
        ));
    }

    let certificate = config
        .certificate_arn
        .as_deref()
        .map(str::trim)
        .filter(|arn| !arn.is_empty());

    let mut builder = TopologyBuilder::new();
    let alb = builder.import(
        load_balancer.id.clone(),
        ImportedKind::LoadBalancer,
        load_balancer.reference(),
    );
    let target = builder.import(
        service.service_id().clone(),
        ImportedKind::Service,
        service.service_id().as_str(),
    );

    let roles = roles_for(strategy);
    for &role in &roles {
        let (port, certificate) = match role {
            ListenerRole::Production => (config.listener_ports.production, certificate),
            ListenerRole::Test => (config.listener_ports.test, None),
        };

        let listener = builder.add(
            listener_id(role),
            ResourceKind::Listener(ListenerSpec {
                role,
                port,
                protocol: if certificate.is_some() {
                    Protocol::Https
                } else {
                    Protocol::Http
                },
                certificate_arn: certificate.map(str::to_string),
                ssl_policy: certificate.map(|_| SslPolicy::Recommended),
            }),
        )?;
        builder.link(&listener, &alb, Relation::AttachesTo)?;

        let rule = builder.add(
            format!("{listener}Rule"),
            ResourceKind::ListenerRule(ListenerRuleSpec {
                priority: STATUS_RULE_PRIORITY,
                path_patterns: vec![STATUS_PATH.to_string()],
                action: FixedResponse {
                    status_code: STATUS_RESPONSE_CODE,
                    content_type: STATUS_CONTENT_TYPE.to_string(),
                    message_body: String::new(),
                },
            }),
        )?;
        builder.link(&rule, &listener, Relation::AttachesTo)?;

        let group = builder.add(
            target_group_id(role),
            ResourceKind::TargetGroup(TargetGroupSpec {
                role,
                port: TARGET_GROUP_PORT,
                health_check: target_health_check(&config.health_check),
                deregistration_delay_seconds: config.deregistration_delay_seconds,
            }),
        )?;
        builder.link(&listener, &group, Relation::RoutesTo)?;
        builder.link(&group, &target, Relation::RoutesTo)?;
    }

    tracing::info!(
        strategy = strategy.name(),
        listeners = roles.len(),
        tls = certificate.is_some(),
        "traffic topology resolved"
    );

    Ok(TrafficTopology {
        graph: builder.finish(),
        roles,
    })
}

fn target_health_check(config: &HealthCheckConfig) -> TargetHealthCheck {
    TargetHealthCheck {
        enabled: config.enabled,
        interval_seconds: config.interval_seconds,
        path: config.path.clone(),
        timeout_seconds: config.timeout_seconds,
        healthy_threshold: config.healthy_threshold,
        unhealthy_threshold: config.unhealthy_threshold,
        healthy_http_codes: HEALTHY_HTTP_CODES.to_string(),
    }
}
