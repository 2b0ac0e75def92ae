//! Method Registry
//!
//! Single source of truth for what the service can do. Built once at startup,
//! then frozen behind an `Arc` and only read.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::context::MethodContext;
use super::error::DispatchError;
use super::protocol::ToolDefinition;
use super::schema::ParamSchema;

// ============================================================================
// Method Types
// ============================================================================

/// Result type for method execution
pub type MethodResult = Result<Value, DispatchError>;

/// Boxed future for async method execution
pub type MethodFuture = Pin<Box<dyn Future<Output = MethodResult> + Send>>;

/// Method handler function type
pub type MethodHandler = Arc<dyn Fn(MethodContext, Value) -> MethodFuture + Send + Sync>;

/// A registered method with metadata and handler
pub struct RegisteredMethod {
    pub name: String,
    pub description: String,
    pub params_schema: ParamSchema,
    pub result_schema: Option<Value>,
    /// Advertised by `tools/list` and callable through `tools/call`.
    pub exposed_as_tool: bool,
    pub handler: MethodHandler,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Method already registered: {0}")]
    DuplicateMethod(String),

    #[error("Invalid params schema for {method}: {message}")]
    InvalidSchema { method: String, message: String },
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<String, RegisteredMethod>,
    /// Registration order, so listings are stable.
    order: Vec<String>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: RegisteredMethod) -> Result<(), RegistryError> {
        if self.methods.contains_key(&method.name) {
            return Err(RegistryError::DuplicateMethod(method.name));
        }
        self.order.push(method.name.clone());
        self.methods.insert(method.name.clone(), method);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&RegisteredMethod, DispatchError> {
        self.methods
            .get(name)
            .ok_or_else(|| DispatchError::MethodNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Externally visible methods as MCP tool definitions.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.iter()
            .filter(|method| method.exposed_as_tool)
            .map(|method| ToolDefinition {
                name: method.name.clone(),
                description: method.description.clone(),
                input_schema: method.params_schema.as_json().clone(),
            })
            .collect()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredMethod> {
        self.order.iter().filter_map(|name| self.methods.get(name))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn tool_count(&self) -> usize {
        self.iter().filter(|method| method.exposed_as_tool).count()
    }
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a method
pub struct MethodBuilder {
    name: String,
    description: String,
    params_schema: Option<Value>,
    result_schema: Option<Value>,
    exposed_as_tool: bool,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params_schema: None,
            result_schema: None,
            exposed_as_tool: false,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn params_schema(mut self, schema: Value) -> Self {
        self.params_schema = Some(schema);
        self
    }

    pub fn result_schema(mut self, schema: Value) -> Self {
        self.result_schema = Some(schema);
        self
    }

    /// Advertise the method through `tools/list`.
    pub fn tool(mut self) -> Self {
        self.exposed_as_tool = true;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> Result<RegisteredMethod, RegistryError>
    where
        F: Fn(MethodContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        let params_schema = match self.params_schema {
            Some(raw) => {
                ParamSchema::compile(raw).map_err(|message| RegistryError::InvalidSchema {
                    method: self.name.clone(),
                    message,
                })?
            }
            None => ParamSchema::any_object(),
        };
        Ok(RegisteredMethod {
            name: self.name,
            description: self.description,
            params_schema,
            result_schema: self.result_schema,
            exposed_as_tool: self.exposed_as_tool,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        })
    }
}
