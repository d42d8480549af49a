use serde::{Deserialize, Serialize};

/// Ordered steps that together answer a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
}

/// A plan plus the results of the steps run so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanProgress {
    pub plan: Plan,
    pub past_steps: Vec<String>,
}

impl PlanProgress {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            past_steps: Vec::new(),
        }
    }

    pub fn current_step(&self) -> usize {
        self.past_steps.len()
    }

    pub fn next_step(&self) -> Option<&str> {
        self.plan
            .steps
            .get(self.current_step())
            .map(String::as_str)
    }

    pub fn is_finished(&self) -> bool {
        self.current_step() >= self.plan.steps.len()
    }

    pub fn record(&mut self, result: impl Into<String>) {
        self.past_steps.push(result.into());
    }

    /// Numbered steps, each finished one followed by its result.
    pub fn render(&self) -> String {
        self.plan
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let mut line = format!("#{}. Planned step: {}\n", i + 1, step);
                if let Some(result) = self.past_steps.get(i) {
                    line.push_str(&format!("Result: {}\n", result));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
