use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::schemas::{Tool, ToolHandler, ToolSchema};
use crate::toolbelts::web_search;

static TOOL_REGISTRY: Lazy<HashMap<&'static str, ToolHandler>> = Lazy::new(|| {
    let mut map = HashMap::new();

    for (name, handler) in web_search::TOOL_ENTRIES {
        map.insert(*name, *handler);
    }

    map
});

static TOOL_SCHEMAS: Lazy<Vec<ToolSchema>> = Lazy::new(|| {
    let mut schemas = Vec::new();
    schemas.extend(web_search::TOOL_SCHEMAS.iter().cloned());
    schemas
});

/// Whether `name` maps to a registered tool. Calls to anything else are
/// dropped by the turn controller without reaching `use_tool`.
pub fn has_tool(name: &str) -> bool {
    TOOL_REGISTRY.contains_key(name)
}

pub async fn use_tool(name: &str, args: Value) -> Result<String> {
    let handler = TOOL_REGISTRY
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Tool '{}' not found", name))?;
    handler(args).await
}

pub fn get_tools() -> Vec<Tool> {
    TOOL_SCHEMAS.iter().map(|s| s.to_tool()).collect()
}
