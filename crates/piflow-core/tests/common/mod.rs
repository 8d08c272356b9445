// crates/piflow-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared pipeline schema and rule fixtures for piflow tests.
// Purpose: Provide one SAI-style schema and the router-interface scenario.
// Dependencies: piflow-core
// ============================================================================

//! ## Overview
//! The fixture schema mirrors a SAI-style pipeline: router interface and port
//! identifiers are runtime-translated strings, MAC addresses are 48-bit values.
//! The scenario rule binds `Ethernet/32` to port `Ethernet32` with source MAC
//! `0x90fb760098` on `device:leaf1` at priority 777.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use piflow_core::ActionBuilder;
use piflow_core::ActionDefinition;
use piflow_core::ActionDescriptor;
use piflow_core::ActionParamSpec;
use piflow_core::ActionSpec;
use piflow_core::AppConfig;
use piflow_core::AppId;
use piflow_core::FieldValue;
use piflow_core::FieldWidth;
use piflow_core::MatchCriterion;
use piflow_core::MatchFieldSpec;
use piflow_core::PipelineSchema;
use piflow_core::PipelineSchemaDocument;
use piflow_core::Rule;
use piflow_core::RuleDefinition;
use piflow_core::Selector;
use piflow_core::TableSpec;
use piflow_core::Treatment;
use piflow_core::ValueLiteral;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

pub const ROUTER_INTERFACE_TABLE: &str = "ingress.routing.router_interface_table";
pub const IPV4_TABLE: &str = "ingress.routing.ipv4_table";
pub const ROUTER_INTERFACE_ID: &str = "router_interface_id";
pub const VRF_ID: &str = "vrf_id";
pub const IPV4_DST: &str = "ipv4_dst";
pub const SET_PORT_AND_SRC_MAC: &str = "ingress.routing.set_port_and_src_mac";
pub const SET_IP_NEXTHOP: &str = "ingress.routing.set_ip_nexthop";
pub const DROP: &str = "ingress.routing.drop";
pub const PORT: &str = "port";
pub const SRC_MAC: &str = "src_mac";
pub const SCENARIO_MAC: u64 = 0x0090_fb76_0098;
pub const SCENARIO_DEVICE: &str = "device:leaf1";
pub const SCENARIO_APP: &str = "org.foo.app";
pub const SCENARIO_PRIORITY: i64 = 777;

/// 48-bit width used for MAC addresses.
pub const MAC_WIDTH: FieldWidth = FieldWidth::Bits {
    bits: 48,
};

// ============================================================================
// SECTION: Schema
// ============================================================================

fn param(id: &str, width: FieldWidth) -> ActionParamSpec {
    ActionParamSpec {
        id: id.into(),
        width,
    }
}

/// Returns the document form of the SAI-style fixture schema.
pub fn sai_schema_document() -> PipelineSchemaDocument {
    PipelineSchemaDocument {
        id: "sai".to_string(),
        match_fields: vec![
            MatchFieldSpec {
                id: ROUTER_INTERFACE_ID.into(),
                width: FieldWidth::String,
            },
            MatchFieldSpec {
                id: VRF_ID.into(),
                width: FieldWidth::String,
            },
            MatchFieldSpec {
                id: IPV4_DST.into(),
                width: FieldWidth::Bits {
                    bits: 32,
                },
            },
        ],
        actions: vec![
            ActionSpec {
                id: SET_PORT_AND_SRC_MAC.into(),
                params: vec![param(PORT, FieldWidth::String), param(SRC_MAC, MAC_WIDTH)],
            },
            ActionSpec {
                id: SET_IP_NEXTHOP.into(),
                params: vec![
                    param("router_interface_id", FieldWidth::String),
                    param("neighbor_id", MAC_WIDTH),
                    param("vlan_id", FieldWidth::Bits {
                        bits: 12,
                    }),
                    param("ttl", FieldWidth::Bits {
                        bits: 8,
                    }),
                ],
            },
            ActionSpec {
                id: DROP.into(),
                params: Vec::new(),
            },
        ],
        tables: vec![
            TableSpec {
                id: ROUTER_INTERFACE_TABLE.into(),
                match_fields: vec![ROUTER_INTERFACE_ID.into()],
                actions: vec![SET_PORT_AND_SRC_MAC.into()],
            },
            TableSpec {
                id: IPV4_TABLE.into(),
                match_fields: vec![VRF_ID.into(), IPV4_DST.into()],
                actions: vec![SET_IP_NEXTHOP.into(), DROP.into()],
            },
        ],
    }
}

/// Returns the validated SAI-style fixture schema.
pub fn sai_schema() -> PipelineSchema {
    PipelineSchema::from_document(sai_schema_document()).expect("fixture schema is valid")
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Builds `{router_interface_id = "Ethernet/32"}`.
pub fn scenario_criterion(schema: &PipelineSchema) -> MatchCriterion {
    MatchCriterion::builder(schema)
        .match_exact(ROUTER_INTERFACE_ID, FieldValue::text("Ethernet/32"))
        .build()
        .expect("scenario criterion")
}

/// Builds `set_port_and_src_mac(src_mac = 0x90fb760098, port = "Ethernet32")`.
pub fn scenario_action(schema: &PipelineSchema) -> ActionDescriptor {
    ActionBuilder::new(schema, SET_PORT_AND_SRC_MAC)
        .param(SRC_MAC, FieldValue::from_u64(SCENARIO_MAC, MAC_WIDTH).expect("mac fits"))
        .param(PORT, FieldValue::text("Ethernet32"))
        .build()
        .expect("scenario action")
}

/// Assembles the permanent scenario rule.
pub fn scenario_rule(schema: &PipelineSchema) -> Rule {
    Rule::builder()
        .with_selector(Selector::new(scenario_criterion(schema)))
        .with_treatment(Treatment::new(scenario_action(schema)))
        .for_table(ROUTER_INTERFACE_TABLE)
        .with_priority(SCENARIO_PRIORITY)
        .for_device(SCENARIO_DEVICE)
        .from_app(SCENARIO_APP)
        .make_permanent()
        .build()
        .expect("scenario rule")
}

/// Returns the scenario rule in declarative form.
pub fn scenario_definition() -> RuleDefinition {
    RuleDefinition {
        device: SCENARIO_DEVICE.to_string(),
        table: ROUTER_INTERFACE_TABLE.into(),
        priority: SCENARIO_PRIORITY,
        timeout_secs: None,
        match_fields: BTreeMap::from([(
            ROUTER_INTERFACE_ID.into(),
            ValueLiteral::from("Ethernet/32"),
        )]),
        action: ActionDefinition {
            name: SET_PORT_AND_SRC_MAC.into(),
            params: BTreeMap::from([
                (SRC_MAC.into(), ValueLiteral::from("0x90fb760098")),
                (PORT.into(), ValueLiteral::from("Ethernet32")),
            ]),
        },
    }
}

/// Returns an activation config holding the given definitions.
pub fn app_config(rules: Vec<RuleDefinition>) -> AppConfig {
    AppConfig {
        app_id: AppId::new(SCENARIO_APP),
        schema: sai_schema(),
        rules,
        properties: BTreeMap::from([("someProperty".to_string(), "Some Default String Value".to_string())]),
    }
}
