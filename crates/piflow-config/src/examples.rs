// crates/piflow-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical piflow.toml example.
// Purpose: Provide a loadable reference configuration for docs and tests.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Canonical examples kept in sync with the config model by the test suite.

/// Returns a complete `piflow.toml` installing the router-interface rule on
/// `device:leaf1` with a SAI-style inline schema.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[app]
id = "org.foo.app"

[app.properties]
someProperty = "Some Default String Value"

[pipeline]
source = "inline"

[pipeline.schema]
id = "sai"

[[pipeline.schema.match_fields]]
id = "router_interface_id"
width = { kind = "string" }

[[pipeline.schema.actions]]
id = "ingress.routing.set_port_and_src_mac"
params = [
  { id = "port", width = { kind = "string" } },
  { id = "src_mac", width = { kind = "bits", bits = 48 } },
]

[[pipeline.schema.tables]]
id = "ingress.routing.router_interface_table"
match_fields = ["router_interface_id"]
actions = ["ingress.routing.set_port_and_src_mac"]

[[rules]]
device = "device:leaf1"
table = "ingress.routing.router_interface_table"
priority = 777

[rules.match]
router_interface_id = "Ethernet/32"

[rules.action]
name = "ingress.routing.set_port_and_src_mac"

[rules.action.params]
src_mac = "0x90fb760098"
port = "Ethernet32"

[audit]
sink = "stderr"
"#,
    )
}
