//! Named methods with typed signatures and optional handlers.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use codec::{ObjectId, Signature, Value};

use crate::args::Args;
use crate::error::{RpcError, RpcResult};

/// A decoded, authorized invocation ready for a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    /// Address of the sending connection.
    pub source: SocketAddr,
    pub method: String,
    /// Target object, [`ObjectId::NONE`] when not object-scoped.
    pub object: ObjectId,
    /// Full parameter list; connection slots already filled with `source`.
    pub params: Vec<Value>,
}

impl RpcCall {
    /// Typed cursor over [`params`](Self::params).
    #[must_use]
    pub fn args(&self) -> Args<'_> {
        Args::new(&self.method, &self.params)
    }
}

/// Callback bound to a method.
pub type Handler = Box<dyn FnMut(&RpcCall)>;

struct Method {
    name: String,
    signature: Signature,
    handler: Option<Handler>,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Methods a node can send or receive, in registration order.
///
/// The order is what the protocol authority uses to assign ids, so every
/// node of one deployment should register the same methods in the same order.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: Vec<Method>,
    by_name: HashMap<String, usize>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method without a handler; calls surface as events.
    pub fn register(&mut self, name: impl Into<String>, signature: Signature) -> RpcResult<()> {
        self.insert(name.into(), signature, None)
    }

    /// Registers a method whose calls go straight to `handler`.
    pub fn register_with_handler(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        handler: impl FnMut(&RpcCall) + 'static,
    ) -> RpcResult<()> {
        self.insert(name.into(), signature, Some(Box::new(handler)))
    }

    /// Binds or replaces the handler of an existing method.
    pub fn set_handler(
        &mut self,
        name: &str,
        handler: impl FnMut(&RpcCall) + 'static,
    ) -> RpcResult<()> {
        let index = self.index_of(name)?;
        self.methods[index].handler = Some(Box::new(handler));
        Ok(())
    }

    fn insert(
        &mut self,
        name: String,
        signature: Signature,
        handler: Option<Handler>,
    ) -> RpcResult<()> {
        if self.by_name.contains_key(&name) {
            return Err(RpcError::DuplicateMethod { name });
        }
        self.by_name.insert(name.clone(), self.methods.len());
        self.methods.push(Method {
            name,
            signature,
            handler,
        });
        Ok(())
    }

    fn index_of(&self, name: &str) -> RpcResult<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RpcError::UnknownMethod {
                name: name.to_owned(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn signature(&self, name: &str) -> RpcResult<&Signature> {
        self.index_of(name).map(|index| &self.methods[index].signature)
    }

    /// Method names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|method| method.name.as_str())
    }

    /// `(name, signature)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Signature)> {
        self.methods
            .iter()
            .map(|method| (method.name.as_str(), &method.signature))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Runs the bound handler. Returns `false` when the method has none.
    pub fn invoke(&mut self, call: &RpcCall) -> bool {
        let Some(&index) = self.by_name.get(&call.method) else {
            return false;
        };
        match self.methods[index].handler.as_mut() {
            Some(handler) => {
                handler(call);
                true
            }
            None => false,
        }
    }
}
