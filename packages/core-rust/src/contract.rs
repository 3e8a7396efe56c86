//! Service contract declarations.
//!
//! A service implementation describes itself through [`ServiceDefinition`]:
//! the interfaces it implements (one of which carries the contract marker)
//! and the concrete methods it provides. The host pairs the two tables by
//! name and parameter signature when it builds its operation registry.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Declarative metadata carried by a service contract interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAttributes {
    pub service_name: &'static str,
    pub service_namespace: &'static str,
    pub code_generator_version: &'static str,
}

/// Name and parameter-type shape of a method.
///
/// Two signatures match when both the name and the ordered parameter types
/// are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: &'static str,
    pub params: Vec<&'static str>,
}

impl MethodSignature {
    #[must_use]
    pub fn new(name: &'static str, params: &[&'static str]) -> Self {
        Self {
            name,
            params: params.to_vec(),
        }
    }

    /// Signature of a single-argument method taking `Req`.
    #[must_use]
    pub fn typed<Req>(name: &'static str) -> Self {
        Self::new(name, &[type_name::<Req>()])
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// An interface directly implemented by a service type.
///
/// Only an interface with `contract` set is considered a service contract;
/// the others are ignored when building the operation registry.
#[derive(Debug, Clone)]
pub struct ServiceInterface {
    pub name: &'static str,
    pub contract: Option<ContractAttributes>,
    /// Public methods in declaration order. Names may repeat (overloads).
    pub methods: Vec<MethodSignature>,
}

impl ServiceInterface {
    /// A contract interface carrying the given attributes.
    #[must_use]
    pub fn contract(name: &'static str, attributes: ContractAttributes) -> Self {
        Self {
            name,
            contract: Some(attributes),
            methods: Vec::new(),
        }
    }

    /// A plain interface without the contract marker.
    #[must_use]
    pub fn plain(name: &'static str) -> Self {
        Self {
            name,
            contract: None,
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, signature: MethodSignature) -> Self {
        self.methods.push(signature);
        self
    }
}

/// Type-erased call into a concrete service method.
pub type Invoker<S> = Arc<dyn Fn(&S, Value) -> anyhow::Result<Value> + Send + Sync>;

/// A concrete method on the service implementation.
pub struct ServiceMethod<S> {
    pub signature: MethodSignature,
    pub invoker: Invoker<S>,
}

impl<S> ServiceMethod<S> {
    pub fn new<F>(signature: MethodSignature, invoker: F) -> Self
    where
        F: Fn(&S, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            signature,
            invoker: Arc::new(invoker),
        }
    }

    /// Wraps a strongly typed method. The request payload is deserialized
    /// into `Req` and the returned `Resp` serialized back into a [`Value`].
    pub fn typed<Req, Resp, F>(name: &'static str, method: F) -> Self
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        F: Fn(&S, Req) -> anyhow::Result<Resp> + Send + Sync + 'static,
    {
        Self::new(MethodSignature::typed::<Req>(name), move |service, payload| {
            let request: Req = serde_json::from_value(payload)?;
            let response = method(service, request)?;
            Ok(serde_json::to_value(response)?)
        })
    }
}

impl<S> Clone for ServiceMethod<S> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            invoker: Arc::clone(&self.invoker),
        }
    }
}

impl<S> fmt::Debug for ServiceMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMethod")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Statically declared operation table of a service implementation.
///
/// The service author lists the interfaces the type implements and the
/// methods it provides; nothing is discovered at runtime.
pub trait ServiceDefinition: Send + Sync + Sized + 'static {
    /// Interfaces directly implemented by this type, in declaration order.
    fn interfaces() -> Vec<ServiceInterface>;

    /// Concrete methods provided by this type.
    fn methods() -> Vec<ServiceMethod<Self>>;

    /// Name used in diagnostics.
    fn type_name() -> &'static str {
        type_name::<Self>()
    }
}
