//! Service metadata and the operation registry.
//!
//! Built once per host from a [`ServiceDefinition`]: the first interface
//! carrying the contract marker supplies the service identity and the list
//! of operations; each operation is bound to the implementation method with
//! the same name and parameter signature.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use svchost_core::{MethodSignature, ServiceDefinition, Value};
use tracing::{debug, error};

use super::error::HostError;

type BoundInvoker = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

// ---------------------------------------------------------------------------
// OperationHandler
// ---------------------------------------------------------------------------

/// An operation bound to a concrete method of a service instance.
pub struct OperationHandler {
    name: String,
    signature: MethodSignature,
    service_type: &'static str,
    invoker: BoundInvoker,
}

impl OperationHandler {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    #[must_use]
    pub fn service_type(&self) -> &'static str {
        self.service_type
    }

    /// Invokes the bound implementation method with a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns whatever the implementation method returns, including
    /// payload conversion failures.
    pub fn invoke(&self, request: Value) -> anyhow::Result<Value> {
        (self.invoker)(request)
    }
}

impl fmt::Debug for OperationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandler")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("service_type", &self.service_type)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ServiceMetadata
// ---------------------------------------------------------------------------

/// Identity of a service plus its registry of operations. Immutable once
/// built.
#[derive(Debug)]
pub struct ServiceMetadata {
    service_name: String,
    service_namespace: String,
    code_generator_version: String,
    operations: HashMap<String, OperationHandler>,
}

impl ServiceMetadata {
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    #[must_use]
    pub fn service_namespace(&self) -> &str {
        &self.service_namespace
    }

    #[must_use]
    pub fn code_generator_version(&self) -> &str {
        &self.code_generator_version
    }

    #[must_use]
    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationHandler> {
        self.operations.get(name)
    }

    /// Exact lookup first, then a case-insensitive match. An exact-case
    /// match always wins; among operations differing only by case, the
    /// lexicographically smallest name is chosen.
    #[must_use]
    pub fn find_operation(&self, name: &str) -> Option<&OperationHandler> {
        self.operations.get(name).or_else(|| {
            self.operations
                .values()
                .filter(|op| op.name.eq_ignore_ascii_case(name))
                .min_by(|a, b| a.name.cmp(&b.name))
        })
    }

    /// Operation names in sorted order.
    #[must_use]
    pub fn operation_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Serializable description of the service, served by the metadata
    /// handler.
    #[must_use]
    pub fn describe(&self) -> ServiceDescription {
        let mut operations: Vec<_> = self
            .operations
            .values()
            .map(|op| OperationDescription {
                name: op.name.clone(),
                params: op.signature.params.iter().map(ToString::to_string).collect(),
            })
            .collect();
        operations.sort_by(|a, b| a.name.cmp(&b.name));

        ServiceDescription {
            service_name: self.service_name.clone(),
            service_namespace: self.service_namespace.clone(),
            code_generator_version: self.code_generator_version.clone(),
            operations,
        }
    }
}

/// Serializable view of [`ServiceMetadata`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceDescription {
    pub service_name: String,
    pub service_namespace: String,
    pub code_generator_version: String,
    pub operations: Vec<OperationDescription>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationDescription {
    pub name: String,
    pub params: Vec<String>,
}

// ---------------------------------------------------------------------------
// Registry construction
// ---------------------------------------------------------------------------

/// Builds the metadata for `service`.
///
/// Returns `Ok(None)` when no implemented interface carries the contract
/// marker. Contract methods without a matching implementation method are
/// skipped and not exposed.
///
/// # Errors
///
/// Returns `HostError::ContractViolation` if the contract declares the same
/// method name twice.
pub fn build_service_metadata<S: ServiceDefinition>(
    service: &Arc<S>,
) -> Result<Option<ServiceMetadata>, HostError> {
    let Some((interface, contract)) = S::interfaces()
        .into_iter()
        .find_map(|iface| iface.contract.clone().map(|c| (iface, c)))
    else {
        debug!(service_type = S::type_name(), "no service contract found");
        return Ok(None);
    };

    let methods = S::methods();
    let mut seen = HashSet::new();
    let mut operations = HashMap::new();

    for contract_method in &interface.methods {
        let name = contract_method.name;
        if !seen.insert(name) {
            let err = HostError::ContractViolation {
                operation: name.to_string(),
                service_type: interface.name.to_string(),
            };
            error!("{err}");
            return Err(err);
        }

        let Some(method) = methods.iter().find(|m| m.signature == *contract_method) else {
            debug!(
                operation = name,
                signature = %contract_method,
                "no implementation method matches contract method, skipping"
            );
            continue;
        };

        let bound = Arc::clone(service);
        let invoker = Arc::clone(&method.invoker);
        operations.insert(
            name.to_string(),
            OperationHandler {
                name: name.to_string(),
                signature: method.signature.clone(),
                service_type: S::type_name(),
                invoker: Arc::new(move |request| invoker(&bound, request)),
            },
        );
    }

    Ok(Some(ServiceMetadata {
        service_name: contract.service_name.to_string(),
        service_namespace: contract.service_namespace.to_string(),
        code_generator_version: contract.code_generator_version.to_string(),
        operations,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;
    use svchost_core::{ContractAttributes, ServiceInterface, ServiceMethod};

    use super::*;
    use crate::test_support::{calculator_contract, Calculator, NoContractService};

    #[test]
    fn builds_operations_for_implemented_contract_methods() {
        let metadata = build_service_metadata(&Arc::new(Calculator::default()))
            .unwrap()
            .unwrap();

        assert_eq!(metadata.service_name(), "CalculatorService");
        assert_eq!(metadata.service_namespace(), "http://example.com/calc");
        assert_eq!(metadata.code_generator_version(), "1.2.0");
        // `divide` is declared but not implemented; `audit` is implemented
        // but not on the contract.
        assert_eq!(metadata.operation_names(), vec!["add", "explode", "negate"]);
        assert!(!metadata.has_operation("divide"));
        assert!(!metadata.has_operation("audit"));
    }

    #[test]
    fn bound_operation_invokes_service_instance() {
        let calc = Arc::new(Calculator { offset: 10 });
        let metadata = build_service_metadata(&calc).unwrap().unwrap();

        let out = metadata
            .operation("add")
            .unwrap()
            .invoke(json!({"a": 1, "b": 2}))
            .unwrap();
        assert_eq!(out, json!({"value": 13}));
    }

    #[test]
    fn find_operation_ignores_case() {
        let metadata = build_service_metadata(&Arc::new(Calculator::default()))
            .unwrap()
            .unwrap();
        assert_eq!(metadata.find_operation("ADD").unwrap().name(), "add");
        assert!(metadata.operation("ADD").is_none());
        assert!(metadata.find_operation("missing").is_none());
    }

    struct CaseVariants;

    impl ServiceDefinition for CaseVariants {
        fn interfaces() -> Vec<ServiceInterface> {
            vec![calculator_contract()
                .method(MethodSignature::new("sum", &[]))
                .method(MethodSignature::new("Sum", &[]))
                .method(MethodSignature::new("SUM", &[]))]
        }

        fn methods() -> Vec<ServiceMethod<Self>> {
            ["sum", "Sum", "SUM"]
                .into_iter()
                .map(|name| {
                    ServiceMethod::new(MethodSignature::new(name, &[]), move |_: &Self, _| {
                        Ok(json!(name))
                    })
                })
                .collect()
        }
    }

    #[test]
    fn find_operation_prefers_exact_case_then_smallest_name() {
        let metadata = build_service_metadata(&Arc::new(CaseVariants)).unwrap().unwrap();
        assert_eq!(metadata.operation_count(), 3);

        for exact in ["sum", "Sum", "SUM"] {
            assert_eq!(metadata.find_operation(exact).unwrap().name(), exact);
        }
        // "SUM" < "Sum" < "sum" in byte order.
        assert_eq!(metadata.find_operation("sUm").unwrap().name(), "SUM");
    }

    #[test]
    fn no_contract_yields_no_metadata() {
        let metadata = build_service_metadata(&Arc::new(NoContractService)).unwrap();
        assert!(metadata.is_none());
    }

    struct Overloaded;

    impl ServiceDefinition for Overloaded {
        fn interfaces() -> Vec<ServiceInterface> {
            vec![calculator_contract()
                .method(MethodSignature::new("add", &["i64", "i64"]))
                .method(MethodSignature::new("add", &["f64", "f64"]))]
        }

        fn methods() -> Vec<ServiceMethod<Self>> {
            vec![ServiceMethod::new(
                MethodSignature::new("add", &["f64", "f64"]),
                |_: &Self, v| Ok(v),
            )]
        }
    }

    #[test]
    fn duplicate_contract_method_name_fails() {
        let err = build_service_metadata(&Arc::new(Overloaded)).unwrap_err();
        match err {
            HostError::ContractViolation {
                operation,
                service_type,
            } => {
                assert_eq!(operation, "add");
                assert_eq!(service_type, "CalculatorContract");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct PlainFirst;

    impl ServiceDefinition for PlainFirst {
        fn interfaces() -> Vec<ServiceInterface> {
            vec![
                ServiceInterface::plain("Closeable").method(MethodSignature::new("close", &[])),
                ServiceInterface::contract(
                    "PingContract",
                    ContractAttributes {
                        service_name: "PingService",
                        service_namespace: "urn:ping",
                        code_generator_version: "0.1",
                    },
                )
                .method(MethodSignature::new("ping", &[])),
            ]
        }

        fn methods() -> Vec<ServiceMethod<Self>> {
            vec![
                ServiceMethod::new(MethodSignature::new("close", &[]), |_: &Self, _| {
                    Ok(Value::Null)
                }),
                ServiceMethod::new(MethodSignature::new("ping", &[]), |_: &Self, _| {
                    Ok(json!("pong"))
                }),
            ]
        }
    }

    #[test]
    fn only_contract_interface_contributes_operations() {
        let metadata = build_service_metadata(&Arc::new(PlainFirst)).unwrap().unwrap();
        assert_eq!(metadata.service_name(), "PingService");
        assert_eq!(metadata.operation_names(), vec!["ping"]);
    }

    #[test]
    fn describe_lists_sorted_operations() {
        let metadata = build_service_metadata(&Arc::new(Calculator::default()))
            .unwrap()
            .unwrap();
        let description = metadata.describe();
        let names: Vec<_> = description.operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["add", "explode", "negate"]);
        assert_eq!(description.operations[0].params.len(), 1);
    }

    // Registry sized by a runtime-chosen subset of implemented methods.
    struct Generated;

    thread_local! {
        static IMPLEMENTED: std::cell::RefCell<Vec<bool>> = const { std::cell::RefCell::new(Vec::new()) };
    }

    const NAMES: [&str; 8] = ["op0", "op1", "op2", "op3", "op4", "op5", "op6", "op7"];

    impl ServiceDefinition for Generated {
        fn interfaces() -> Vec<ServiceInterface> {
            let count = IMPLEMENTED.with(|i| i.borrow().len());
            let contract = NAMES[..count].iter().fold(calculator_contract(), |iface, name| {
                iface.method(MethodSignature::new(*name, &["Req"]))
            });
            vec![contract]
        }

        fn methods() -> Vec<ServiceMethod<Self>> {
            IMPLEMENTED.with(|i| {
                i.borrow()
                    .iter()
                    .zip(NAMES)
                    .filter(|(implemented, _)| **implemented)
                    .map(|(_, name)| {
                        ServiceMethod::new(MethodSignature::new(name, &["Req"]), |_: &Self, v| {
                            Ok(v)
                        })
                    })
                    .collect()
            })
        }
    }

    proptest! {
        #[test]
        fn registry_holds_exactly_the_implemented_contract_methods(
            implemented in proptest::collection::vec(any::<bool>(), 0..=NAMES.len())
        ) {
            IMPLEMENTED.with(|i| *i.borrow_mut() = implemented.clone());

            let metadata = build_service_metadata(&Arc::new(Generated)).unwrap().unwrap();
            let expected: Vec<&str> = implemented
                .iter()
                .zip(NAMES)
                .filter(|(on, _)| **on)
                .map(|(_, name)| name)
                .collect();

            prop_assert_eq!(metadata.operation_count(), expected.len());
            prop_assert_eq!(metadata.operation_names(), expected);
        }
    }
}
