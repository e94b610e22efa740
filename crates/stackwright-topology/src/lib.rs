//! # stackwright-topology
//!
//! Deployment-topology composer for Stackwright.
//!
//! Handles:
//! - **Graph**: Immutable resource graphs built with `petgraph`.
//! - **Network**: VPC, subnet tiers, dual-stack addressing, shared load balancer.
//! - **Service**: Image repository, task definition, cluster, and service.
//! - **Strategy**: Rolling-update or blue-green listener/target-group wiring.
//! - **Lookup**: Injected network resolution against an account directory.
//! - **Stack**: Per-environment composition of the above into one graph.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cidr;
pub mod graph;
pub mod lookup;
pub mod network;
pub mod resource;
pub mod service;
pub mod stack;
pub mod strategy;

pub use graph::{TopologyBuilder, TopologyDocument, TopologyGraph};
pub use network::{LoadBalancerRef, NetworkTopology};
pub use service::ServiceTopology;
pub use strategy::TrafficTopology;
