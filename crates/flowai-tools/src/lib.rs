//! Tool registry for flowai-rs: descriptors registered once, looked up
//! by id.

use flowai_core::{Tool, ToolError};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor under its declared id. Ids are unique; a second
    /// registration under the same id is an error.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let id = tool.spec().id.clone();
        if self.tools.contains_key(&id) {
            return Err(ToolError::Validation(format!("duplicate tool id: {id}")));
        }
        self.tools.insert(id, tool);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(id)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
