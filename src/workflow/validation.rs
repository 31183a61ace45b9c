//! Structural validation, dependency ordering and parameter resolution

use super::models::{ParameterType, UserParameter, Workflow};
use super::WorkflowError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};

/// Outcome of validating a workflow document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check a workflow for structural problems.
///
/// Errors make the workflow unusable; warnings are surfaced to the user
/// but do not block preparation.
pub fn validate(workflow: &Workflow) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if workflow.name.trim().is_empty() {
        errors.push("Workflow name is empty".to_string());
    }
    if workflow.steps.is_empty() {
        warnings.push("Workflow has no steps".to_string());
    }

    let mut ids: HashSet<&str> = HashSet::new();
    for step in &workflow.steps {
        if step.id.trim().is_empty() {
            errors.push(format!("Step '{}' has an empty id", step.name));
        } else if !ids.insert(step.id.as_str()) {
            errors.push(format!("Duplicate step id '{}'", step.id));
        }
    }

    for step in &workflow.steps {
        for dep in &step.depends_on {
            if dep == &step.id {
                errors.push(format!("Step '{}' depends on itself", step.id));
            } else if !ids.contains(dep.as_str()) {
                errors.push(format!(
                    "Step '{}' depends on unknown step '{}'",
                    step.id, dep
                ));
            }
        }
        if workflow.binding(&step.service).is_none() {
            warnings.push(format!(
                "Step '{}' uses service '{}' with no service binding",
                step.id, step.service
            ));
        }
    }

    if let Err(WorkflowError::CycleDetected { steps }) = dependency_levels(workflow, false) {
        errors.push(format!(
            "Dependency cycle between steps: {}",
            steps.join(", ")
        ));
    }

    let mut names: HashSet<&str> = HashSet::new();
    for param in &workflow.user_parameters {
        if !names.insert(param.name.as_str()) {
            errors.push(format!("Duplicate parameter '{}'", param.name));
        }
        if param.param_type == ParameterType::Select
            && param.options.as_ref().map_or(true, |o| o.is_empty())
        {
            errors.push(format!(
                "Select parameter '{}' has no options",
                param.name
            ));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Group step ids into levels that can run once every earlier level is done.
///
/// Within a level ids are sorted, so the order is deterministic.
/// Dependencies on unknown steps are ignored here; `validate` reports them.
pub fn execution_order(workflow: &Workflow) -> Result<Vec<Vec<String>>, WorkflowError> {
    dependency_levels(workflow, true)
}

/// Kahn's algorithm over the `depends_on` edges.
fn dependency_levels(
    workflow: &Workflow,
    include_self_edges: bool,
) -> Result<Vec<Vec<String>>, WorkflowError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for step in &workflow.steps {
        in_degree.entry(step.id.as_str()).or_insert(0);
        dependents.entry(step.id.as_str()).or_default();
    }

    for step in &workflow.steps {
        let mut seen: HashSet<&str> = HashSet::new();
        for dep in &step.depends_on {
            if !in_degree.contains_key(dep.as_str()) || !seen.insert(dep.as_str()) {
                continue;
            }
            if dep == &step.id && !include_self_edges {
                continue;
            }
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(step.id.as_str());
            *in_degree.entry(step.id.as_str()).or_insert(0) += 1;
        }
    }

    let mut initial: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();
    initial.sort();
    let mut queue: VecDeque<&str> = initial.into();

    let mut levels = Vec::new();
    let mut placed = 0usize;

    while !queue.is_empty() {
        let level: Vec<&str> = queue.drain(..).collect();
        let mut next = Vec::new();

        for &id in &level {
            if let Some(children) = dependents.get(id) {
                for &child in children {
                    if let Some(deg) = in_degree.get_mut(child) {
                        *deg -= 1;
                        if *deg == 0 {
                            next.push(child);
                        }
                    }
                }
            }
        }

        placed += level.len();
        levels.push(level.into_iter().map(str::to_string).collect());

        next.sort();
        queue.extend(next);
    }

    if placed < in_degree.len() {
        let mut stuck: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        stuck.sort();
        return Err(WorkflowError::CycleDetected { steps: stuck });
    }

    Ok(levels)
}

/// Merge supplied values with parameter defaults and type-check them.
///
/// Supplied values win over defaults. Values for undeclared parameters are
/// rejected so typos surface before preparation.
pub fn resolve_parameters(
    workflow: &Workflow,
    supplied: &Map<String, Value>,
) -> Result<Map<String, Value>, WorkflowError> {
    for key in supplied.keys() {
        if !workflow.user_parameters.iter().any(|p| &p.name == key) {
            return Err(WorkflowError::UnknownParameter(key.clone()));
        }
    }

    let mut resolved = Map::new();
    for param in &workflow.user_parameters {
        let value = supplied
            .get(&param.name)
            .filter(|v| !v.is_null())
            .or(param.default_value.as_ref());

        match value {
            Some(v) => {
                check_value(param, v)?;
                resolved.insert(param.name.clone(), v.clone());
            }
            None if param.required => {
                return Err(WorkflowError::MissingParameter(param.name.clone()));
            }
            None => {}
        }
    }

    Ok(resolved)
}

fn check_value(param: &UserParameter, value: &Value) -> Result<(), WorkflowError> {
    let invalid = |reason: &str| WorkflowError::InvalidParameter {
        name: param.name.clone(),
        expected: param.param_type,
        reason: reason.to_string(),
    };

    match param.param_type {
        ParameterType::String => value.as_str().map(|_| ()).ok_or_else(|| invalid("not a string")),
        ParameterType::Number => value.as_f64().map(|_| ()).ok_or_else(|| invalid("not a number")),
        ParameterType::Boolean => value.as_bool().map(|_| ()).ok_or_else(|| invalid("not a boolean")),
        ParameterType::Email => {
            let s = value.as_str().ok_or_else(|| invalid("not a string"))?;
            if is_email(s) {
                Ok(())
            } else {
                Err(invalid("not an email address"))
            }
        }
        ParameterType::Date => {
            let s = value.as_str().ok_or_else(|| invalid("not a string"))?;
            let ok = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                || chrono::DateTime::parse_from_rfc3339(s).is_ok();
            if ok {
                Ok(())
            } else {
                Err(invalid("expected YYYY-MM-DD or RFC 3339"))
            }
        }
        ParameterType::File => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(invalid("expected a file id or path")),
        },
        ParameterType::Select => {
            let s = value.as_str().ok_or_else(|| invalid("not a string"))?;
            let allowed = param.options.as_deref().unwrap_or_default();
            if allowed.iter().any(|o| o == s) {
                Ok(())
            } else {
                Err(invalid("not one of the allowed options"))
            }
        }
    }
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::models::{ServiceBinding, WorkflowStep};
    use serde_json::json;

    fn digest_workflow() -> Workflow {
        let mut wf = Workflow::new("Weekly digest", "Summarise a sheet and mail it");
        wf.steps = vec![
            WorkflowStep::new("read", "Read sheet", "sheets", "read_range"),
            WorkflowStep::new("doc", "Write doc", "docs", "create_document").after("read"),
            WorkflowStep::new("mail", "Send mail", "gmail", "send_email")
                .after("read")
                .after("doc"),
        ];
        wf.service_bindings = ["sheets", "docs", "gmail"]
            .iter()
            .map(|s| ServiceBinding {
                service: s.to_string(),
                scopes: vec![],
                endpoint: String::new(),
                auth_required: true,
            })
            .collect();
        wf
    }

    fn param(name: &str, param_type: ParameterType, required: bool) -> UserParameter {
        UserParameter {
            name: name.to_string(),
            param_type,
            description: String::new(),
            required,
            default_value: None,
            options: None,
        }
    }

    #[test]
    fn test_valid_workflow() {
        let report = validate(&digest_workflow());
        assert!(report.valid, "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unknown_dependency_and_self_dependency() {
        let mut wf = digest_workflow();
        wf.steps[0].depends_on.push("ghost".to_string());
        wf.steps[1].depends_on.push("doc".to_string());

        let report = validate(&wf);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("unknown step 'ghost'")));
        assert!(report.errors.iter().any(|e| e.contains("'doc' depends on itself")));
        // self edge is reported once, not also as a cycle
        assert!(!report.errors.iter().any(|e| e.contains("cycle")));
    }

    #[test]
    fn test_duplicate_ids() {
        let mut wf = digest_workflow();
        wf.steps[2].id = "read".to_string();
        let report = validate(&wf);
        assert!(report.errors.iter().any(|e| e.contains("Duplicate step id 'read'")));
    }

    #[test]
    fn test_cycle_reported() {
        let mut wf = digest_workflow();
        wf.steps[0].depends_on.push("mail".to_string());
        let report = validate(&wf);
        assert!(!report.valid);
        let cycle = report.errors.iter().find(|e| e.contains("cycle")).unwrap();
        assert!(cycle.contains("read"));
        assert!(cycle.contains("mail"));
    }

    #[test]
    fn test_missing_binding_is_warning() {
        let mut wf = digest_workflow();
        wf.service_bindings.retain(|b| b.service != "gmail");
        let report = validate(&wf);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("gmail"));
    }

    #[test]
    fn test_select_without_options() {
        let mut wf = digest_workflow();
        wf.user_parameters.push(param("format", ParameterType::Select, true));
        let report = validate(&wf);
        assert!(report.errors.iter().any(|e| e.contains("no options")));
    }

    #[test]
    fn test_empty_name_and_step_id() {
        let mut wf = digest_workflow();
        wf.name = "   ".to_string();
        wf.steps[0].id = String::new();
        let report = validate(&wf);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e == "Workflow name is empty"));
        assert!(report
            .errors
            .iter()
            .any(|e| e == "Step 'Read sheet' has an empty id"));
    }

    #[test]
    fn test_no_steps_is_warning() {
        let wf = Workflow::new("Empty", "");
        let report = validate(&wf);
        assert!(report.valid);
        assert_eq!(report.warnings, vec!["Workflow has no steps"]);
    }

    #[test]
    fn test_duplicate_parameter_names() {
        let mut wf = digest_workflow();
        wf.user_parameters = vec![
            param("recipient", ParameterType::Email, true),
            param("recipient", ParameterType::String, false),
        ];
        let report = validate(&wf);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Duplicate parameter 'recipient'"]);
    }

    #[test]
    fn test_execution_order_levels() {
        let levels = execution_order(&digest_workflow()).unwrap();
        assert_eq!(
            levels,
            vec![vec!["read"], vec!["doc"], vec!["mail"]]
        );
    }

    #[test]
    fn test_execution_order_parallel_level_sorted() {
        let mut wf = Workflow::new("fan-out", "");
        wf.steps = vec![
            WorkflowStep::new("root", "Root", "drive", "list_files"),
            WorkflowStep::new("z", "Z", "gmail", "send_email").after("root"),
            WorkflowStep::new("a", "A", "sheets", "append_row").after("root"),
        ];
        let levels = execution_order(&wf).unwrap();
        assert_eq!(levels, vec![vec!["root"], vec!["a", "z"]]);
    }

    #[test]
    fn test_execution_order_cycle() {
        let mut wf = Workflow::new("loop", "");
        wf.steps = vec![
            WorkflowStep::new("a", "A", "drive", "x").after("b"),
            WorkflowStep::new("b", "B", "drive", "y").after("a"),
            WorkflowStep::new("c", "C", "drive", "z"),
        ];
        let err = execution_order(&wf).unwrap_err();
        match err {
            WorkflowError::CycleDetected { steps } => assert_eq!(steps, vec!["a", "b"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_parameters_defaults_and_overrides() {
        let mut wf = digest_workflow();
        let mut day = param("day", ParameterType::Select, false);
        day.options = Some(vec!["monday".into(), "friday".into()]);
        day.default_value = Some(json!("friday"));
        wf.user_parameters = vec![param("recipient", ParameterType::Email, true), day];

        let supplied = json!({"recipient": "team@example.com"});
        let resolved = resolve_parameters(&wf, supplied.as_object().unwrap()).unwrap();
        assert_eq!(resolved["recipient"], "team@example.com");
        assert_eq!(resolved["day"], "friday");

        let supplied = json!({"recipient": "team@example.com", "day": "monday"});
        let resolved = resolve_parameters(&wf, supplied.as_object().unwrap()).unwrap();
        assert_eq!(resolved["day"], "monday");
    }

    #[test]
    fn test_resolve_parameters_errors() {
        let mut wf = digest_workflow();
        wf.user_parameters = vec![
            param("recipient", ParameterType::Email, true),
            param("count", ParameterType::Number, false),
            param("start", ParameterType::Date, false),
        ];

        let err = resolve_parameters(&wf, &Map::new()).unwrap_err();
        assert!(matches!(err, WorkflowError::MissingParameter(ref n) if n == "recipient"));

        let bad_email = json!({"recipient": "not-an-email"});
        let err = resolve_parameters(&wf, bad_email.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidParameter { expected: ParameterType::Email, .. }));

        let bad_number = json!({"recipient": "a@b.co", "count": "three"});
        assert!(resolve_parameters(&wf, bad_number.as_object().unwrap()).is_err());

        let good_date = json!({"recipient": "a@b.co", "start": "2026-10-19"});
        assert!(resolve_parameters(&wf, good_date.as_object().unwrap()).is_ok());

        let unknown = json!({"recipient": "a@b.co", "typo": 1});
        let err = resolve_parameters(&wf, unknown.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownParameter(ref n) if n == "typo"));
    }

    #[test]
    fn test_resolve_boolean_and_file() {
        let mut wf = digest_workflow();
        wf.user_parameters = vec![
            param("notify", ParameterType::Boolean, false),
            param("attachment", ParameterType::File, false),
        ];

        let good = json!({"notify": true, "attachment": "drive:1AbC"});
        let resolved = resolve_parameters(&wf, good.as_object().unwrap()).unwrap();
        assert_eq!(resolved["notify"], true);

        let bad_bool = json!({"notify": "yes"});
        let err = resolve_parameters(&wf, bad_bool.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidParameter { expected: ParameterType::Boolean, .. }));

        let blank_file = json!({"attachment": "  "});
        let err = resolve_parameters(&wf, blank_file.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidParameter { expected: ParameterType::File, .. }));
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("alice@example.com"));
        assert!(!is_email("alice@localhost"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a@b@c.com"));
        assert!(!is_email("alice@.com"));
    }
}
