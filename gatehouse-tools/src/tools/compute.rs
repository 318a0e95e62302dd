//! Local computation tool bodies. The gateway wraps these as opaque
//! functions; only the audit and dispatch plumbing around them carries
//! invariants.

use crate::audit::AuditSink;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Solve a linear equation in one variable, e.g. `2*x + 6 = 10` or
/// `3*x - 9` (implicitly `= 0`). Returns the solution set as strings:
/// empty for contradictions, `["any"]` for identities.
fn solve_linear(expression: &str, variable: &str) -> Result<Vec<String>, ToolError> {
    let (lhs, rhs) = match expression.split_once('=') {
        Some((l, r)) => (l, r),
        None => (expression, "0"),
    };
    let (la, lb) = parse_side(lhs, variable)?;
    let (ra, rb) = parse_side(rhs, variable)?;

    let a = la - ra;
    let b = lb - rb;
    if a == 0.0 {
        return Ok(if b == 0.0 { vec!["any".to_string()] } else { Vec::new() });
    }
    Ok(vec![format_solution(-b / a)])
}

fn parse_side(side: &str, variable: &str) -> Result<(f64, f64), ToolError> {
    let cleaned: String = side.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(ToolError::Validation("empty expression side".into()));
    }

    let mut coefficient = 0.0;
    let mut constant = 0.0;
    for term in cleaned.replace('-', "+-").split('+') {
        if term.is_empty() {
            continue;
        }
        if let Some(stripped) = term.strip_suffix(variable) {
            let stripped = stripped.strip_suffix('*').unwrap_or(stripped);
            coefficient += match stripped {
                "" => 1.0,
                "-" => -1.0,
                other => other.parse::<f64>().map_err(|_| {
                    ToolError::Validation(format!("unsupported term: {term}"))
                })?,
            };
        } else {
            constant += term
                .parse::<f64>()
                .map_err(|_| ToolError::Validation(format!("unsupported term: {term}")))?;
        }
    }
    Ok((coefficient, constant))
}

fn format_solution(x: f64) -> String {
    if x == x.trunc() && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

#[derive(Deserialize)]
struct SolveEquationInput {
    expression: String,
    #[serde(default = "default_variable")]
    variable: String,
}

fn default_variable() -> String {
    "x".to_string()
}

pub struct SolveEquationTool {
    audit: Arc<dyn AuditSink>,
}

impl SolveEquationTool {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl Tool for SolveEquationTool {
    fn name(&self) -> &'static str {
        "solve_equation"
    }

    fn description(&self) -> &'static str {
        "Solve a linear equation in one variable"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {"type": "string"},
                "variable": {"type": "string"}
            },
            "required": ["expression"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: SolveEquationInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let solutions = solve_linear(&input.expression, &input.variable)?;

        self.audit
            .append(
                "solve_equation",
                json!({"expression": input.expression, "variable": input.variable}),
            )
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"solutions": solutions})),
            error: None,
        })
    }
}

#[derive(Deserialize)]
struct VectorNormInput {
    values: Vec<f64>,
}

pub struct VectorNormTool {
    audit: Arc<dyn AuditSink>,
}

impl VectorNormTool {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl Tool for VectorNormTool {
    fn name(&self) -> &'static str {
        "vector_norm"
    }

    fn description(&self) -> &'static str {
        "Compute the Euclidean norm of a vector"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "values": {"type": "array", "items": {"type": "number"}}
            },
            "required": ["values"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: VectorNormInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let norm = input.values.iter().map(|v| v * v).sum::<f64>().sqrt();

        self.audit
            .append("vector_norm", json!({"values": input.values, "norm": norm}))
            .await?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({"norm": norm})),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_implicit_zero_form() {
        assert_eq!(solve_linear("2*x + 6", "x").unwrap(), vec!["-3"]);
    }

    #[test]
    fn solves_both_sides() {
        assert_eq!(solve_linear("2*x + 1 = x - 3", "x").unwrap(), vec!["-4"]);
        assert_eq!(solve_linear("x = 5", "x").unwrap(), vec!["5"]);
    }

    #[test]
    fn handles_bare_and_negated_variables() {
        assert_eq!(solve_linear("-x + 4", "x").unwrap(), vec!["4"]);
        assert_eq!(solve_linear("x + x - 8", "x").unwrap(), vec!["4"]);
    }

    #[test]
    fn identity_and_contradiction() {
        assert_eq!(solve_linear("x = x", "x").unwrap(), vec!["any"]);
        assert!(solve_linear("x + 1 = x", "x").unwrap().is_empty());
    }

    #[test]
    fn fractional_solution() {
        assert_eq!(solve_linear("2*x = 5", "x").unwrap(), vec!["2.5"]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(solve_linear("what", "x").is_err());
    }
}
