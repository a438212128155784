// Workflow definition registry
//
// Static mapping from workflow-type key to an ordered list of step
// definitions. Read-only at runtime; in-flight instances carry their own
// snapshot of the steps, so nothing here is consulted after trigger time.

use serde_json::json;
use std::collections::HashMap;

use crate::workflow::{StepDefinition, StepKind, WorkflowDefinition};

/// Registry of workflow definitions, looked up by workflow-type key.
#[derive(Clone, Default)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, WorkflowDefinition>,
}

impl DefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in workflow types registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("threat-analysis", threat_analysis());
        registry.register("incident-response", incident_response());
        registry.register("security-report", security_report());
        registry.register("vulnerability-scan", vulnerability_scan());
        registry
    }

    /// Register a definition under a workflow-type key
    pub fn register(&mut self, workflow_type: impl Into<String>, definition: WorkflowDefinition) {
        self.definitions.insert(workflow_type.into(), definition);
    }

    /// Resolve a workflow type to its definition
    pub fn resolve(&self, workflow_type: &str) -> Option<&WorkflowDefinition> {
        self.definitions.get(workflow_type)
    }

    /// Check if a workflow type is registered
    pub fn has(&self, workflow_type: &str) -> bool {
        self.definitions.contains_key(workflow_type)
    }

    /// All registered workflow-type keys
    pub fn types(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<_> = self.definitions.keys().collect();
        f.debug_struct("DefinitionRegistry")
            .field("types", &types)
            .finish()
    }
}

fn threat_analysis() -> WorkflowDefinition {
    WorkflowDefinition {
        name: "Threat Analysis".to_string(),
        steps: vec![
            StepDefinition::new(
                "analyze",
                StepKind::AiAnalysis,
                json!({
                    "prompt": "Analyze the following threat indicators. Assess severity, likely attack vectors, and potential impact."
                }),
            ),
            StepDefinition::new(
                "correlate",
                StepKind::ThreatCorrelation,
                json!({ "correlationType": "similar" }),
            ),
            StepDefinition::new(
                "recommend",
                StepKind::ResponseGeneration,
                json!({
                    "prompt": "Generate prioritized recommendations for mitigating the analyzed threat."
                }),
            ),
        ],
    }
}

fn incident_response() -> WorkflowDefinition {
    WorkflowDefinition {
        name: "Incident Response".to_string(),
        steps: vec![
            StepDefinition::new(
                "assess",
                StepKind::AiAnalysis,
                json!({
                    "prompt": "Assess the severity and scope of this security incident."
                }),
            ),
            StepDefinition::new(
                "alert",
                StepKind::Notification,
                json!({
                    "title": "Security incident under response",
                    "severity": "high"
                }),
            ),
            StepDefinition::new(
                "contain",
                StepKind::ResponseGeneration,
                json!({
                    "prompt": "Produce a containment and eradication plan for this incident."
                }),
            ),
            StepDefinition::new(
                "ticket",
                StepKind::Integration,
                json!({ "type": "api", "system": "ticketing" }),
            ),
        ],
    }
}

fn security_report() -> WorkflowDefinition {
    WorkflowDefinition {
        name: "Security Report".to_string(),
        steps: vec![
            StepDefinition::new(
                "gather",
                StepKind::DataCollection,
                json!({ "sources": [] }),
            ),
            StepDefinition::new(
                "summarize",
                StepKind::AiAnalysis,
                json!({
                    "prompt": "Summarize the collected security data into an executive report."
                }),
            ),
            StepDefinition::new(
                "deliver",
                StepKind::Notification,
                json!({
                    "title": "Security report ready",
                    "severity": "info"
                }),
            ),
        ],
    }
}

fn vulnerability_scan() -> WorkflowDefinition {
    WorkflowDefinition {
        name: "Vulnerability Scan".to_string(),
        steps: vec![
            StepDefinition::new(
                "discover",
                StepKind::DataCollection,
                json!({ "sources": [] }),
            ),
            StepDefinition::new(
                "validate",
                StepKind::AiAnalysis,
                json!({
                    "prompt": "Validate and prioritize the discovered vulnerabilities by exploitability and impact."
                }),
            ),
            StepDefinition::new(
                "correlate",
                StepKind::ThreatCorrelation,
                json!({ "correlationType": "similar" }),
            ),
            StepDefinition::new(
                "report",
                StepKind::ResponseGeneration,
                json!({
                    "prompt": "Generate a remediation plan for the prioritized vulnerabilities."
                }),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = DefinitionRegistry::with_builtins();
        assert!(registry.has("threat-analysis"));
        assert!(registry.has("incident-response"));
        assert!(registry.has("security-report"));
        assert!(registry.has("vulnerability-scan"));
        assert_eq!(registry.types().len(), 4);
    }

    #[test]
    fn threat_analysis_has_three_steps() {
        let registry = DefinitionRegistry::with_builtins();
        let def = registry.resolve("threat-analysis").unwrap();
        assert_eq!(def.steps.len(), 3);
        assert_eq!(def.steps[0].kind, StepKind::AiAnalysis);
        assert_eq!(def.steps[1].kind, StepKind::ThreatCorrelation);
        assert_eq!(def.steps[2].kind, StepKind::ResponseGeneration);
    }

    #[test]
    fn unknown_type_does_not_resolve() {
        let registry = DefinitionRegistry::with_builtins();
        assert!(registry.resolve("does-not-exist").is_none());
    }

    #[test]
    fn custom_registration() {
        let mut registry = DefinitionRegistry::new();
        registry.register(
            "custom",
            WorkflowDefinition {
                name: "Custom".to_string(),
                steps: vec![StepDefinition::new(
                    "only",
                    StepKind::Notification,
                    json!({}),
                )],
            },
        );
        assert_eq!(registry.resolve("custom").unwrap().steps.len(), 1);
    }
}
