//! Release Pipeline Composer.
//!
//! Turns the global settings and the per-environment configs of one service
//! domain into a [`PromotionPipeline`]: one wave whose stages follow the
//! promotion order strictly, each guarded by a validation gate.

use std::collections::BTreeMap;

use stackwright_common::constants::BIN_NAME;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::{EnvironmentName, ServiceDomain};
use stackwright_config::{EnvironmentConfig, GlobalConfig};

use crate::fingerprint::fingerprint;
use crate::model::{
    PipelineDefinition, PromotionPipeline, SelfMutationStep, SourceReference, Stage, SynthStep,
    TestSelector, ValidationGate, Wave,
};

/// Composes the pipeline of `domain`.
///
/// Stages follow `order`. Configs for environments outside `order` are
/// skipped.
///
/// # Errors
///
/// Returns a configuration error if the domain is disabled, `order` is empty
/// or repeats an environment, an environment in `order` has no config or no
/// account, or two configs share a name.
pub fn compose(
    domain: ServiceDomain,
    global: &GlobalConfig,
    environments: &[EnvironmentConfig],
    order: &[EnvironmentName],
) -> Result<PromotionPipeline> {
    let field = format!("promotion.{domain}");
    if !domain.is_enabled() {
        return Err(StackwrightError::config(
            "pipelines",
            format!("an enabled service domain ({domain} is not supported yet)"),
        ));
    }
    if order.is_empty() {
        return Err(StackwrightError::config(field, "at least one environment"));
    }

    let mut by_name: BTreeMap<EnvironmentName, &EnvironmentConfig> = BTreeMap::new();
    for config in environments {
        if by_name.insert(config.name, config).is_some() {
            return Err(StackwrightError::config(
                "environments",
                format!("one configuration per environment ({} given twice)", config.name),
            ));
        }
    }

    let mut seen = Vec::with_capacity(order.len());
    for &name in order {
        if seen.contains(&name) {
            return Err(StackwrightError::config(
                field,
                format!("unique environment names ({name} appears twice)"),
            ));
        }
        seen.push(name);
    }
    for name in by_name.keys().filter(|name| !order.contains(*name)) {
        tracing::debug!(
            domain = %domain,
            environment = %name,
            "environment not in promotion order, skipping"
        );
    }

    let stages = order
        .iter()
        .map(|&name| {
            let config = by_name.get(&name).ok_or_else(|| {
                StackwrightError::config(
                    field.clone(),
                    format!("a configuration for every listed environment ({name} has none)"),
                )
            })?;
            Ok(Stage {
                name: name.stage_name().to_string(),
                account: global.account(name)?.to_string(),
                region: global.region.clone(),
                environment: (*config).clone(),
                gates: vec![validation_gate(domain, name, global)],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let synth = SynthStep {
        commands: synth_commands(global),
    };
    let definition = PipelineDefinition {
        name: format!("{}Pipeline", domain.title()),
        domain,
        source: SourceReference {
            repository: global.source.repository.clone(),
            branch: global.source.branch.clone(),
            connection_arn: global.source.connection_arn.clone(),
        },
        self_mutation: SelfMutationStep {
            pre_build: vec![toolchain_install(global)],
            commands: synth.commands.clone(),
        },
        synth,
        wave: Wave {
            name: domain.title().to_string(),
            stages,
        },
    };

    let fingerprint = fingerprint(&definition)?;
    tracing::info!(
        pipeline = %definition.name,
        stages = definition.wave.stages.len(),
        fingerprint = %fingerprint,
        "pipeline composed"
    );
    Ok(PromotionPipeline::new(definition, fingerprint))
}

/// Composes the pipeline of `domain` in its configured promotion order.
///
/// # Errors
///
/// Same as [`compose`], plus a configuration error if the domain has no
/// promotion order.
pub fn compose_configured(
    domain: ServiceDomain,
    global: &GlobalConfig,
    environments: &[EnvironmentConfig],
) -> Result<PromotionPipeline> {
    compose(domain, global, environments, global.promotion_order(domain)?)
}

fn validation_gate(
    domain: ServiceDomain,
    environment: EnvironmentName,
    global: &GlobalConfig,
) -> ValidationGate {
    let selector = TestSelector::new(domain, environment);
    ValidationGate {
        name: format!("Validate {environment} synth"),
        commands: vec![
            global.gate.install.clone(),
            global.gate.test_command(selector.as_str()),
        ],
        selector,
    }
}

fn toolchain_install(global: &GlobalConfig) -> String {
    format!("rustup toolchain install {}", global.toolchain_version)
}

fn synth_commands(global: &GlobalConfig) -> Vec<String> {
    vec![
        toolchain_install(global),
        global.gate.install.clone(),
        format!("{BIN_NAME} synth --all"),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use stackwright_config::{
        ComputeConfig, ContainerConfig, DeploymentStrategy, GateCommands, HealthCheckConfig,
        ListenerPorts, LoadBalancerConfig, NetworkConfig, NetworkRef, NetworkSelector,
        ServiceConfig, SourceConfig,
    };

    use super::*;

    fn global() -> GlobalConfig {
        GlobalConfig {
            toolchain_version: "1.86.0".into(),
            region: "ap-northeast-1".into(),
            accounts: EnvironmentName::ALL
                .iter()
                .map(|&env| (env, format!("{:012}", env as u8 + 1)))
                .collect(),
            source: SourceConfig {
                repository: "acme/infra".into(),
                branch: "main".into(),
                connection_arn: "arn:connection".into(),
            },
            pipelines: vec![ServiceDomain::Network, ServiceDomain::Compute],
            promotion: BTreeMap::new(),
            gate: GateCommands::default(),
        }
    }

    fn environment(name: EnvironmentName) -> EnvironmentConfig {
        EnvironmentConfig {
            name,
            network: NetworkConfig {
                max_availability_zones: 2,
                nat_gateway_count: 0,
                ipv6_enabled: false,
            },
            compute: ComputeConfig {
                memory_mib: 512,
                cpu_units: 256,
                family_name: "api".into(),
                execution_role_arn: "arn:exec".into(),
                task_role_policies: Vec::new(),
                container: ContainerConfig {
                    name: "web".into(),
                    environment_variables: BTreeMap::new(),
                },
                service: ServiceConfig {
                    desired_count: 1,
                    min_healthy_percent: 50,
                    max_healthy_percent: 200,
                    assign_public_ip: true,
                },
            },
            deployment: DeploymentStrategy::BlueGreen,
            network_ref: NetworkRef {
                network: NetworkSelector::Default,
                load_balancer: LoadBalancerConfig {
                    arn: format!("arn:lb:{name}"),
                    certificate_arn: None,
                    health_check: HealthCheckConfig {
                        enabled: true,
                        interval_seconds: 30,
                        path: "/".into(),
                        timeout_seconds: 5,
                        healthy_threshold: 2,
                        unhealthy_threshold: 2,
                    },
                    deregistration_delay_seconds: 30,
                    listener_ports: ListenerPorts::default(),
                },
            },
        }
    }

    fn all_environments() -> Vec<EnvironmentConfig> {
        EnvironmentName::ALL.iter().map(|&env| environment(env)).collect()
    }

    #[test]
    fn stages_follow_order_and_skip_others() {
        use EnvironmentName::{Dev, Prod};
        let pipeline = compose(
            ServiceDomain::Network,
            &global(),
            &all_environments(),
            &[Prod, Dev],
        )
        .unwrap();

        assert_eq!(pipeline.name(), "NetworkPipeline");
        assert_eq!(pipeline.wave().name, "Network");
        let names: Vec<&str> = pipeline.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Production", "Dev"]);
        assert_eq!(pipeline.stages()[0].account, "000000000003");
    }

    #[test]
    fn every_stage_has_a_gate_for_its_structural_test() {
        let pipeline = compose(
            ServiceDomain::Compute,
            &global(),
            &all_environments(),
            &[EnvironmentName::Staging, EnvironmentName::Prod],
        )
        .unwrap();
        assert_eq!(pipeline.name(), "ComputePipeline");

        let gate = &pipeline.stages()[0].gates[0];
        assert_eq!(gate.name, "Validate staging synth");
        assert_eq!(gate.selector.as_str(), "compute_staging");
        assert_eq!(
            gate.commands,
            vec![
                "cargo fetch --locked".to_string(),
                "cargo test --locked -p stackwright-pipeline --test compute_staging".to_string(),
            ]
        );
    }

    #[test]
    fn self_mutation_reuses_synth_commands() {
        let pipeline = compose(
            ServiceDomain::Network,
            &global(),
            &all_environments(),
            &[EnvironmentName::Dev],
        )
        .unwrap();
        let synth = &pipeline.synth().commands;
        assert_eq!(synth[0], "rustup toolchain install 1.86.0");
        assert_eq!(synth.last().map(String::as_str), Some("swt synth --all"));
        assert_eq!(&pipeline.self_mutation().commands, synth);
        assert_eq!(
            pipeline.self_mutation().pre_build,
            vec!["rustup toolchain install 1.86.0".to_string()]
        );
    }

    #[test]
    fn api_domain_is_rejected() {
        let err = compose(
            ServiceDomain::Api,
            &global(),
            &all_environments(),
            &[EnvironmentName::Dev],
        )
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn missing_config_is_rejected() {
        let err = compose(
            ServiceDomain::Network,
            &global(),
            &[environment(EnvironmentName::Dev)],
            &[EnvironmentName::Dev, EnvironmentName::Prod],
        )
        .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("prod"), "got: {err}");
    }

    #[test]
    fn duplicate_order_entry_is_rejected() {
        let err = compose(
            ServiceDomain::Network,
            &global(),
            &all_environments(),
            &[EnvironmentName::Dev, EnvironmentName::Dev],
        )
        .unwrap_err();
        assert!(err.to_string().contains("twice"), "got: {err}");
    }

    #[test]
    fn duplicate_config_is_rejected() {
        let err = compose(
            ServiceDomain::Network,
            &global(),
            &[environment(EnvironmentName::Dev), environment(EnvironmentName::Dev)],
            &[EnvironmentName::Dev],
        )
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn empty_order_is_rejected() {
        let err = compose(ServiceDomain::Network, &global(), &all_environments(), &[]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn missing_account_is_rejected() {
        let mut global = global();
        let _ = global.accounts.remove(&EnvironmentName::Prod);
        let err = compose(
            ServiceDomain::Network,
            &global,
            &all_environments(),
            &[EnvironmentName::Prod],
        )
        .unwrap_err();
        assert!(err.to_string().contains("accounts.prod"), "got: {err}");
    }

    #[test]
    fn fingerprint_tracks_definition() {
        let envs = all_environments();
        let order = [EnvironmentName::Dev, EnvironmentName::Prod];
        let a = compose(ServiceDomain::Network, &global(), &envs, &order).unwrap();
        let b = compose(ServiceDomain::Network, &global(), &envs, &order).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut changed = global();
        changed.toolchain_version = "1.87.0".into();
        let c = compose(ServiceDomain::Network, &changed, &envs, &order).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn configured_order_is_used() {
        let mut global = global();
        let _ = global
            .promotion
            .insert(ServiceDomain::Network, vec![EnvironmentName::Dev]);
        let pipeline =
            compose_configured(ServiceDomain::Network, &global, &all_environments()).unwrap();
        assert_eq!(pipeline.stages().len(), 1);
        assert!(compose_configured(ServiceDomain::Compute, &global, &all_environments()).is_err());
    }
}
