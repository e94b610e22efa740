//! Validation of raw documents into the typed configuration model.
//!
//! Checks field constraints and folds strategy-specific fields into the
//! tagged [`DeploymentStrategy`] before any topology is built.

use std::collections::{BTreeMap, HashSet};

use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::{EnvironmentName, ServiceDomain};

use crate::document::{
    ComputeDocument, EnvironmentDocument, GlobalDocument, HealthCheckDocument,
    LoadBalancerDocument,
};
use crate::model::{
    ComputeConfig, ContainerConfig, DeploymentStrategy, EnvironmentConfig, GateCommands,
    GlobalConfig, HealthCheckConfig, ListenerPorts, LoadBalancerConfig, NetworkConfig,
    NetworkRef, NetworkSelector, ServiceConfig, SourceConfig,
};

const THRESHOLD_RANGE: std::ops::RangeInclusive<u32> = 2..=10;

/// Validates an environment document and converts it into a typed config.
///
/// # Checks performed
///
/// 1. `deployment.strategy` is present and names a known strategy.
/// 2. Task memory and CPU are non-zero, the container is named.
/// 3. `minHealthyPercent` does not exceed `maxHealthyPercent`.
/// 4. The health check requests an absolute path, times out before its
///    interval, and uses thresholds within `2..=10`.
/// 5. Listener ports are non-zero and distinct.
///
/// Subnet-tier and placement constraints depend on the whole topology and
/// are enforced by the builders.
///
/// # Errors
///
/// Returns a configuration error naming the first offending field.
pub fn validate_environment(
    name: EnvironmentName,
    doc: EnvironmentDocument,
) -> Result<EnvironmentConfig> {
    tracing::info!(environment = %name, "validating environment config");

    let deployment = DeploymentStrategy::from_name(
        doc.deployment.strategy.as_deref(),
        doc.compute.service.circuit_breaker_rollback,
    )?;
    let compute = validate_compute(doc.compute)?;
    let load_balancer = validate_load_balancer(doc.network_ref.load_balancer)?;

    let addressing = doc.network.addressing;
    let network = NetworkConfig {
        max_availability_zones: addressing.max_availability_zones,
        nat_gateway_count: addressing.nat_gateway_count,
        ipv6_enabled: addressing.ipv6_enabled,
    };

    let selector = NetworkSelector::from_vpc_id(doc.network_ref.vpc_id.as_deref());
    tracing::debug!(
        environment = %name,
        strategy = deployment.name(),
        ?selector,
        "environment config validated"
    );

    Ok(EnvironmentConfig {
        name,
        network,
        compute,
        deployment,
        network_ref: NetworkRef {
            network: selector,
            load_balancer,
        },
    })
}

fn validate_compute(doc: ComputeDocument) -> Result<ComputeConfig> {
    if doc.memory_mib == 0 {
        return Err(StackwrightError::config("compute.memoryMiB", "a value greater than 0"));
    }
    if doc.cpu_units == 0 {
        return Err(StackwrightError::config("compute.cpuUnits", "a value greater than 0"));
    }
    if doc.container.name.trim().is_empty() {
        return Err(StackwrightError::config("compute.container.name", "a non-empty name"));
    }
    let service = doc.service;
    if service.min_healthy_percent > service.max_healthy_percent {
        return Err(StackwrightError::config(
            "compute.service.minHealthyPercent",
            format!(
                "at most maxHealthyPercent ({} > {})",
                service.min_healthy_percent, service.max_healthy_percent
            ),
        ));
    }

    Ok(ComputeConfig {
        memory_mib: doc.memory_mib,
        cpu_units: doc.cpu_units,
        family_name: doc.family_name,
        execution_role_arn: doc.execution_role_arn,
        task_role_policies: doc.task_role_policies,
        container: ContainerConfig {
            name: doc.container.name,
            environment_variables: doc.container.environment_variables,
        },
        service: ServiceConfig {
            desired_count: service.desired_count,
            min_healthy_percent: service.min_healthy_percent,
            max_healthy_percent: service.max_healthy_percent,
            assign_public_ip: service.assign_public_ip,
        },
    })
}

fn validate_load_balancer(doc: LoadBalancerDocument) -> Result<LoadBalancerConfig> {
    if doc.arn.trim().is_empty() {
        return Err(StackwrightError::config(
            "networkRef.loadBalancer.arn",
            "the ARN of an existing load balancer",
        ));
    }
    let health_check = validate_health_check(doc.health_check)?;

    let defaults = ListenerPorts::default();
    let ports = doc.listener_ports.unwrap_or_default();
    let listener_ports = ListenerPorts {
        production: ports.production.unwrap_or(defaults.production),
        test: ports.test.unwrap_or(defaults.test),
    };
    check_listener_ports(listener_ports)?;

    let certificate_arn = doc
        .certificate_arn
        .map(|arn| arn.trim().to_string())
        .filter(|arn| !arn.is_empty());

    Ok(LoadBalancerConfig {
        arn: doc.arn,
        certificate_arn,
        health_check,
        deregistration_delay_seconds: doc.deregistration_delay_seconds,
        listener_ports,
    })
}

fn validate_health_check(doc: HealthCheckDocument) -> Result<HealthCheckConfig> {
    const PREFIX: &str = "networkRef.loadBalancer.healthCheck";

    if !doc.path.starts_with('/') {
        return Err(StackwrightError::config(
            format!("{PREFIX}.path"),
            format!("an absolute path starting with '/' (got \"{}\")", doc.path),
        ));
    }
    if doc.timeout_seconds >= doc.interval_seconds {
        return Err(StackwrightError::config(
            format!("{PREFIX}.timeoutSeconds"),
            format!("less than intervalSeconds ({})", doc.interval_seconds),
        ));
    }
    for (field, value) in [
        ("healthyThreshold", doc.healthy_threshold),
        ("unhealthyThreshold", doc.unhealthy_threshold),
    ] {
        if !THRESHOLD_RANGE.contains(&value) {
            return Err(StackwrightError::config(
                format!("{PREFIX}.{field}"),
                format!("a value between 2 and 10 (got {value})"),
            ));
        }
    }

    Ok(HealthCheckConfig {
        enabled: doc.enabled,
        interval_seconds: doc.interval_seconds,
        path: doc.path,
        timeout_seconds: doc.timeout_seconds,
        healthy_threshold: doc.healthy_threshold,
        unhealthy_threshold: doc.unhealthy_threshold,
    })
}

fn check_listener_ports(ports: ListenerPorts) -> Result<()> {
    const PREFIX: &str = "networkRef.loadBalancer.listenerPorts";

    if ports.production == 0 {
        return Err(StackwrightError::config(format!("{PREFIX}.production"), "a non-zero port"));
    }
    if ports.test == 0 {
        return Err(StackwrightError::config(format!("{PREFIX}.test"), "a non-zero port"));
    }
    if ports.production == ports.test {
        return Err(StackwrightError::config(
            format!("{PREFIX}.test"),
            format!("a port different from the production port {}", ports.production),
        ));
    }
    Ok(())
}

/// Validates the global document and fills in defaults.
///
/// # Checks performed
///
/// 1. Toolchain version, region, and source fields are non-empty.
/// 2. Enabled pipelines are unique and currently promotable.
/// 3. Every promotion order is non-empty, free of duplicates, and every
///    environment in it has an account.
/// 4. The gate test command contains the `{target}` placeholder.
///
/// # Errors
///
/// Returns a configuration error naming the first offending field.
pub fn validate_global(doc: GlobalDocument) -> Result<GlobalConfig> {
    tracing::info!("validating global config");

    for (field, value) in [
        ("toolchainVersion", &doc.toolchain_version),
        ("region", &doc.region),
        ("source.repository", &doc.source.repository),
        ("source.branch", &doc.source.branch),
        ("source.connectionArn", &doc.source.connection_arn),
    ] {
        if value.trim().is_empty() {
            return Err(StackwrightError::config(field, "a non-empty value"));
        }
    }

    let pipelines = doc.pipelines.unwrap_or_else(|| vec![ServiceDomain::Network]);
    check_pipelines(&pipelines)?;

    let mut accounts = BTreeMap::new();
    for (name, account) in doc.accounts {
        let environment = parse_environment(&format!("accounts.{name}"), &name)?;
        let _ = accounts.insert(environment, account);
    }

    let mut promotion = default_promotion();
    for (domain, order) in doc.promotion {
        let field = format!("promotion.{domain}");
        let order = order
            .iter()
            .map(|name| parse_environment(&field, name))
            .collect::<Result<Vec<_>>>()?;
        let _ = promotion.insert(domain, order);
    }
    check_promotion(&promotion, &accounts, &pipelines)?;

    let defaults = GateCommands::default();
    let gate = GateCommands {
        install: doc.gate.install_command.unwrap_or(defaults.install),
        test_template: doc.gate.test_command.unwrap_or(defaults.test_template),
    };
    if !gate.test_template.contains(GateCommands::TARGET_PLACEHOLDER) {
        return Err(StackwrightError::config(
            "gate.testCommand",
            "a command containing the {target} placeholder",
        ));
    }

    Ok(GlobalConfig {
        toolchain_version: doc.toolchain_version,
        region: doc.region,
        accounts,
        source: SourceConfig {
            repository: doc.source.repository,
            branch: doc.source.branch,
            connection_arn: doc.source.connection_arn,
        },
        pipelines,
        promotion,
        gate,
    })
}

fn parse_environment(field: &str, name: &str) -> Result<EnvironmentName> {
    name.parse().map_err(|_| {
        StackwrightError::config(
            field,
            format!("an environment named dev, staging, or prod (got \"{name}\")"),
        )
    })
}

fn default_promotion() -> BTreeMap<ServiceDomain, Vec<EnvironmentName>> {
    BTreeMap::from([
        (
            ServiceDomain::Network,
            vec![EnvironmentName::Dev, EnvironmentName::Prod],
        ),
        (
            ServiceDomain::Compute,
            vec![EnvironmentName::Staging, EnvironmentName::Prod],
        ),
    ])
}

fn check_pipelines(pipelines: &[ServiceDomain]) -> Result<()> {
    let mut seen = HashSet::new();
    for domain in pipelines {
        if !domain.is_enabled() {
            return Err(StackwrightError::config(
                "pipelines",
                format!("only enabled domains (network, compute); \"{domain}\" is disabled"),
            ));
        }
        if !seen.insert(domain) {
            return Err(StackwrightError::config(
                "pipelines",
                format!("each domain at most once (\"{domain}\" repeated)"),
            ));
        }
    }
    Ok(())
}

fn check_promotion(
    promotion: &BTreeMap<ServiceDomain, Vec<EnvironmentName>>,
    accounts: &BTreeMap<EnvironmentName, String>,
    pipelines: &[ServiceDomain],
) -> Result<()> {
    for domain in pipelines {
        let Some(order) = promotion.get(domain) else {
            return Err(StackwrightError::config(
                format!("promotion.{domain}"),
                "a list of environments to promote through",
            ));
        };
        if order.is_empty() {
            return Err(StackwrightError::config(
                format!("promotion.{domain}"),
                "at least one environment",
            ));
        }
        let mut seen = HashSet::new();
        for environment in order {
            if !seen.insert(environment) {
                return Err(StackwrightError::config(
                    format!("promotion.{domain}"),
                    format!("each environment at most once (\"{environment}\" repeated)"),
                ));
            }
            if !accounts.contains_key(environment) {
                return Err(StackwrightError::config(
                    format!("accounts.{environment}"),
                    format!("an account ID, since {domain} promotes through {environment}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        AddressingDocument, ContainerDocument, DeploymentDocument, GateDocument,
        ListenerPortsDocument, NetworkDocument, NetworkRefDocument, ServiceDocument,
        SourceDocument,
    };

    fn make_document(strategy: Option<&str>) -> EnvironmentDocument {
        EnvironmentDocument {
            network: NetworkDocument {
                addressing: AddressingDocument {
                    max_availability_zones: 2,
                    nat_gateway_count: 1,
                    ipv6_enabled: true,
                },
            },
            compute: ComputeDocument {
                memory_mib: 512,
                cpu_units: 256,
                family_name: "api".into(),
                execution_role_arn: "arn:aws:iam::111111111111:role/exec".into(),
                task_role_policies: vec!["arn:aws:iam::aws:policy/ReadOnlyAccess".into()],
                container: ContainerDocument {
                    name: "web".into(),
                    environment_variables: BTreeMap::new(),
                },
                service: ServiceDocument {
                    desired_count: 2,
                    min_healthy_percent: 50,
                    max_healthy_percent: 200,
                    circuit_breaker_rollback: true,
                    assign_public_ip: false,
                },
            },
            deployment: DeploymentDocument {
                strategy: strategy.map(Into::into),
            },
            network_ref: NetworkRefDocument {
                vpc_id: Some(String::new()),
                load_balancer: LoadBalancerDocument {
                    arn: "arn:aws:elasticloadbalancing:region:1:loadbalancer/app/x/1".into(),
                    certificate_arn: Some("   ".into()),
                    health_check: HealthCheckDocument {
                        enabled: true,
                        interval_seconds: 30,
                        path: "/health".into(),
                        timeout_seconds: 5,
                        healthy_threshold: 2,
                        unhealthy_threshold: 3,
                    },
                    deregistration_delay_seconds: 30,
                    listener_ports: None,
                },
            },
        }
    }

    fn make_global() -> GlobalDocument {
        GlobalDocument {
            toolchain_version: "1.86.0".into(),
            region: "ap-northeast-1".into(),
            accounts: BTreeMap::from([
                ("dev".into(), "111111111111".into()),
                ("staging".into(), "222222222222".into()),
                ("prod".into(), "333333333333".into()),
            ]),
            source: SourceDocument {
                repository: "acme/infrastructure".into(),
                branch: "main".into(),
                connection_arn: "arn:connection".into(),
            },
            pipelines: None,
            promotion: BTreeMap::new(),
            gate: GateDocument::default(),
        }
    }

    #[test]
    fn rolling_update_folds_circuit_breaker_flag() {
        let config =
            validate_environment(EnvironmentName::Dev, make_document(Some("RollingUpdate")))
                .unwrap();
        assert_eq!(
            config.deployment,
            DeploymentStrategy::RollingUpdate {
                circuit_breaker_rollback: true
            }
        );
        assert_eq!(config.name, EnvironmentName::Dev);
        assert_eq!(config.network.max_availability_zones, 2);
    }

    #[test]
    fn unknown_strategy_fails() {
        let err = validate_environment(EnvironmentName::Dev, make_document(Some("Canary")))
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Canary"));
    }

    #[test]
    fn missing_strategy_fails() {
        let err = validate_environment(EnvironmentName::Dev, make_document(None)).unwrap_err();
        assert!(err.to_string().contains("deployment.strategy"));
    }

    #[test]
    fn empty_vpc_id_selects_default_network() {
        let config =
            validate_environment(EnvironmentName::Dev, make_document(Some("BlueGreen"))).unwrap();
        assert_eq!(config.network_ref.network, NetworkSelector::Default);
    }

    #[test]
    fn blank_certificate_is_treated_as_absent() {
        let config =
            validate_environment(EnvironmentName::Dev, make_document(Some("BlueGreen"))).unwrap();
        assert!(config.network_ref.load_balancer.certificate_arn.is_none());
    }

    #[test]
    fn default_listener_ports() {
        let config =
            validate_environment(EnvironmentName::Dev, make_document(Some("BlueGreen"))).unwrap();
        let ports = config.network_ref.load_balancer.listener_ports;
        assert_eq!(ports.production, 443);
        assert_eq!(ports.test, 8080);
    }

    #[test]
    fn identical_listener_ports_fail() {
        let mut doc = make_document(Some("BlueGreen"));
        doc.network_ref.load_balancer.listener_ports = Some(ListenerPortsDocument {
            production: Some(8443),
            test: Some(8443),
        });
        let err = validate_environment(EnvironmentName::Dev, doc).unwrap_err();
        assert!(err.to_string().contains("listenerPorts.test"), "got: {err}");
    }

    #[test]
    fn zero_memory_fails() {
        let mut doc = make_document(Some("BlueGreen"));
        doc.compute.memory_mib = 0;
        let err = validate_environment(EnvironmentName::Dev, doc).unwrap_err();
        assert!(err.to_string().contains("compute.memoryMiB"));
    }

    #[test]
    fn inverted_healthy_percent_fails() {
        let mut doc = make_document(Some("BlueGreen"));
        doc.compute.service.min_healthy_percent = 300;
        let err = validate_environment(EnvironmentName::Dev, doc).unwrap_err();
        assert!(err.to_string().contains("minHealthyPercent"));
    }

    #[test]
    fn relative_health_check_path_fails() {
        let mut doc = make_document(Some("BlueGreen"));
        doc.network_ref.load_balancer.health_check.path = "health".into();
        let err = validate_environment(EnvironmentName::Dev, doc).unwrap_err();
        assert!(err.to_string().contains("healthCheck.path"));
    }

    #[test]
    fn health_check_timeout_must_be_below_interval() {
        let mut doc = make_document(Some("BlueGreen"));
        doc.network_ref.load_balancer.health_check.timeout_seconds = 30;
        let err = validate_environment(EnvironmentName::Dev, doc).unwrap_err();
        assert!(err.to_string().contains("timeoutSeconds"));
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let mut doc = make_document(Some("BlueGreen"));
        doc.network_ref.load_balancer.health_check.unhealthy_threshold = 11;
        let err = validate_environment(EnvironmentName::Dev, doc).unwrap_err();
        assert!(err.to_string().contains("unhealthyThreshold"));
    }

    #[test]
    fn global_defaults_are_applied() {
        let global = validate_global(make_global()).unwrap();
        assert_eq!(global.pipelines, vec![ServiceDomain::Network]);
        assert_eq!(
            global.promotion_order(ServiceDomain::Network).unwrap(),
            &[EnvironmentName::Dev, EnvironmentName::Prod]
        );
        assert_eq!(
            global.promotion_order(ServiceDomain::Compute).unwrap(),
            &[EnvironmentName::Staging, EnvironmentName::Prod]
        );
        assert_eq!(global.gate, GateCommands::default());
    }

    #[test]
    fn disabled_pipeline_domain_fails() {
        let mut doc = make_global();
        doc.pipelines = Some(vec![ServiceDomain::Api]);
        let err = validate_global(doc).unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn promotion_through_environment_without_account_fails() {
        let mut doc = make_global();
        let _ = doc.accounts.remove("prod");
        let err = validate_global(doc).unwrap_err();
        assert!(err.to_string().contains("accounts.prod"), "got: {err}");
    }

    #[test]
    fn duplicate_environment_in_order_fails() {
        let mut doc = make_global();
        let _ = doc.promotion.insert(
            ServiceDomain::Network,
            vec!["dev".into(), "dev".into()],
        );
        let err = validate_global(doc).unwrap_err();
        assert!(err.to_string().contains("repeated"));
    }

    #[test]
    fn unknown_account_environment_is_config_error() {
        let mut doc = make_global();
        let _ = doc.accounts.insert("qa".into(), "444444444444".into());
        let err = validate_global(doc).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("accounts.qa"), "got: {err}");
    }

    #[test]
    fn unknown_promotion_environment_is_config_error() {
        let mut doc = make_global();
        let _ = doc
            .promotion
            .insert(ServiceDomain::Network, vec!["dev".into(), "uat".into()]);
        let err = validate_global(doc).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("promotion.network"), "got: {err}");
        assert!(err.to_string().contains("uat"), "got: {err}");
    }

    #[test]
    fn gate_test_command_requires_placeholder() {
        let mut doc = make_global();
        doc.gate.test_command = Some("cargo test".into());
        let err = validate_global(doc).unwrap_err();
        assert!(err.to_string().contains("gate.testCommand"));
    }
}
