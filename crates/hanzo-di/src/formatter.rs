//! Diagnostic messages
//!
//! Every error the engine raises for a failed resolution carries a message
//! built by an [`ExceptionFormatter`]. The default formatter names the
//! failing service, lists the activation path from the innermost request to
//! the root, and closes with suggestions.

use crate::binding::Binding;
use crate::context::Context;
use crate::request::Request;
use crate::service::ServiceType;
use std::fmt::Write;
use std::sync::Arc;

/// Builds the messages of resolution errors
pub trait ExceptionFormatter: Send + Sync {
	fn no_matching_bindings(&self, request: &Request) -> String;

	fn ambiguous_bindings(&self, request: &Request, candidates: &[Arc<Binding>]) -> String;

	fn provider_returned_null(&self, context: &Context) -> String;

	/// Message for a `get` whose resolution succeeded without an instance.
	fn no_instance_resolved(&self, service: &ServiceType) -> String;

	fn cyclical_dependency(&self, context: &Context, path: &str) -> String;

	fn unsatisfied_constructor(&self, context: &Context, implementation: &ServiceType) -> String;
}

/// Renders the activation path of `request`, innermost first.
///
/// ```text
/// Activation path:
///   2) Injection of dependency IWeapon into parameter weapon of constructor of type Samurai
///   1) Request for Samurai
/// ```
pub fn format_activation_path(request: &Request) -> String {
	let mut chain = vec![request];
	let mut current = request;
	while let Some(parent) = current.parent_request() {
		chain.push(parent.as_ref());
		current = parent.as_ref();
	}

	let mut out = String::from("Activation path:\n");
	let total = chain.len();
	for (index, request) in chain.into_iter().enumerate() {
		let line = match request.target() {
			Some(target) => format!(
				"Injection of dependency {} into {}",
				request.service(),
				target.description()
			),
			None => format!("Request for {}", request.service()),
		};
		let _ = writeln!(out, "  {}) {}", total - index, line);
	}
	out
}

fn suggestions(out: &mut String, lines: &[String]) {
	out.push_str("\nSuggestions:\n");
	for (index, line) in lines.iter().enumerate() {
		let _ = writeln!(out, "  {}) {}", index + 1, line);
	}
}

/// Formatter producing multi-line messages with activation path and suggestions
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionFormatter;

impl ExceptionFormatter for DefaultExceptionFormatter {
	fn no_matching_bindings(&self, request: &Request) -> String {
		let service = request.service();
		let mut out = format!(
			"Error activating {}\nNo matching bindings are available, and the type is not self-bindable.\n",
			service
		);
		out.push_str(&format_activation_path(request));
		let mut hints = vec![format!("Ensure that you have defined a binding for {}.", service)];
		if request.constraint().is_some() {
			hints.push("Ensure a binding satisfies the request's name or metadata constraint.".to_string());
		}
		if service.is_interface() {
			hints.push("Interfaces cannot be self-bound; bind them to a concrete type.".to_string());
		} else {
			hints.push(format!(
				"Declare a plan for {} so it can be bound to itself implicitly.",
				service
			));
		}
		hints.push("Ensure you have not accidentally created more than one kernel.".to_string());
		suggestions(&mut out, &hints);
		out
	}

	fn ambiguous_bindings(&self, request: &Request, candidates: &[Arc<Binding>]) -> String {
		let service = request.service();
		let mut out = format!(
			"Error activating {}\nMore than one matching bindings are available.\nMatching bindings:\n",
			service
		);
		for (index, binding) in candidates.iter().enumerate() {
			let _ = writeln!(out, "  {}) {}", index + 1, binding.description());
		}
		out.push_str(&format_activation_path(request));
		suggestions(
			&mut out,
			&[
				format!("Ensure that you have defined a binding for {} only once.", service),
				"Add conditions or names so that exactly one binding applies.".to_string(),
			],
		);
		out
	}

	fn provider_returned_null(&self, context: &Context) -> String {
		let mut out = format!(
			"Error activating {} using {}\nProvider returned null.\n",
			context.request().service(),
			context.binding().description()
		);
		out.push_str(&format_activation_path(context.request()));
		suggestions(
			&mut out,
			&[
				"Ensure that the provider handles creation requests properly.".to_string(),
				"Enable allow_null_injection in the kernel settings if null is expected.".to_string(),
			],
		);
		out
	}

	fn no_instance_resolved(&self, service: &ServiceType) -> String {
		let mut out = format!("Error activating {}\nResolution produced no instance.\n", service);
		suggestions(
			&mut out,
			&["Use try_get when a null instance is acceptable.".to_string()],
		);
		out
	}

	fn cyclical_dependency(&self, context: &Context, path: &str) -> String {
		let mut out = format!(
			"Error activating {} using {}\nA cyclical dependency was detected between the constructors of two services.\nCycle: {}\n",
			context.request().service(),
			context.binding().description(),
			path
		);
		out.push_str(&format_activation_path(context.request()));
		suggestions(
			&mut out,
			&[
				"Ensure that you have not declared a dependency for the service on any implementations of the service.".to_string(),
				"Move one side of the cycle to property or method injection and give it a non-transient scope.".to_string(),
			],
		);
		out
	}

	fn unsatisfied_constructor(&self, context: &Context, implementation: &ServiceType) -> String {
		let mut out = format!(
			"Error activating {} using {}\nNo constructor was available to create an instance of the implementation type {}.\n",
			context.request().service(),
			context.binding().description(),
			implementation
		);
		out.push_str(&format_activation_path(context.request()));
		suggestions(
			&mut out,
			&[
				format!("Declare a constructor for {} in its plan.", implementation),
				"Ensure every parameter of the marked constructor can be resolved.".to_string(),
			],
		);
		out
	}
}
