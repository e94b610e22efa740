//! Fixed values of the generated topologies.

/// IPv4 block assigned to every generated network.
pub const NETWORK_CIDR: &str = "10.0.0.0/16";

/// Name of the public subnet tier.
pub const INGRESS_TIER: &str = "ingress";
/// Name of the isolated subnet tier.
pub const DATA_TIER: &str = "data";
/// Name of the private subnet tier, present only with NAT gateways.
pub const APPLICATION_TIER: &str = "application";

/// Prefix length of public and private subnets.
pub const INGRESS_CIDR_MASK: u8 = 24;
/// Prefix length of isolated subnets.
pub const DATA_CIDR_MASK: u8 = 28;
/// Prefix length of private subnets.
pub const APPLICATION_CIDR_MASK: u8 = 24;
/// Prefix length of each per-subnet IPv6 block.
pub const SUBNET_IPV6_PREFIX: u8 = 64;

/// Container port of the single task container.
pub const CONTAINER_PORT: u16 = 80;
/// Host port mapped to the container port.
pub const HOST_PORT: u16 = 80;
/// Port every target group forwards to.
pub const TARGET_GROUP_PORT: u16 = 80;

/// Default port of the production listener.
pub const DEFAULT_PRODUCTION_PORT: u16 = 443;
/// Default port of the blue-green test listener.
pub const DEFAULT_TEST_PORT: u16 = 8080;

/// Path of the synthetic status route on every listener.
pub const STATUS_PATH: &str = "/status";
/// Priority of the synthetic status rule.
pub const STATUS_RULE_PRIORITY: u32 = 10;
/// Status code returned by the synthetic status rule.
pub const STATUS_RESPONSE_CODE: u16 = 200;
/// Content type of the synthetic status response.
pub const STATUS_CONTENT_TYPE: &str = "application/json";

/// Healthy HTTP codes for every target group, regardless of input.
pub const HEALTHY_HTTP_CODES: &str = "200";

/// Log stream prefix for container logs.
pub const LOG_STREAM_PREFIX: &str = "ecs";

/// Application name used in CLI output.
pub const APP_NAME: &str = "stackwright";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "swt";
