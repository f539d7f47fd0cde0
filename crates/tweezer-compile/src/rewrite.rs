//! Rewrite engine for operation sequences.
//!
//! A [`RuleSet`] is an ordered list of [`RewriteRule`]s. Each rule looks at a
//! fixed-size window of consecutive operations and either declines or hands
//! back a replacement. The engine scans left to right; at every position the
//! first rule (in priority order) that matches wins, and scanning resumes at
//! the start of the replacement so its output is itself rewritten.
//!
//! Loop bodies are visited in place when a rule provides a template form,
//! which lets decompositions lower symbolic bodies before they are unrolled.

use tracing::{debug, instrument, trace};
use tweezer_ir::{Circuit, Operation, Template};

use crate::error::{CompileError, CompileResult};

/// Default bound on rewrite iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Window matcher over concrete operations.
pub type OperationRule = fn(&[Operation]) -> CompileResult<Option<Vec<Operation>>>;

/// Window matcher over loop-body templates.
pub type TemplateRule = fn(&[Template]) -> CompileResult<Option<Vec<Template>>>;

/// A single rewrite rule.
///
/// Matchers return `Ok(None)` to decline. A matcher that returns a
/// replacement equal to its window never settles and trips the engine's
/// iteration bound.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRule {
    /// Rule name, recorded each time it fires.
    pub name: &'static str,
    /// Number of consecutive operations the rule inspects.
    pub window: usize,
    /// Matcher for top-level operations.
    pub on_operations: OperationRule,
    /// Optional matcher for loop-body templates.
    pub on_templates: Option<TemplateRule>,
}

impl RewriteRule {
    /// Create a rule over concrete operations only.
    pub fn new(name: &'static str, window: usize, on_operations: OperationRule) -> Self {
        Self {
            name,
            window: window.max(1),
            on_operations,
            on_templates: None,
        }
    }

    /// Also apply this rule inside loop bodies.
    #[must_use]
    pub fn with_templates(mut self, on_templates: TemplateRule) -> Self {
        self.on_templates = Some(on_templates);
        self
    }
}

/// An ordered collection of rewrite rules. Earlier rules take priority.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Append a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule in place.
    pub fn add_rule(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    /// Name of the rule set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Result of a rewrite operation.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    /// The rewritten circuit.
    pub circuit: Circuit,
    /// Whether any rewrite was applied.
    pub changed: bool,
    /// Number of rewrites applied.
    pub rewrite_count: usize,
    /// Names of rules that were applied, in firing order.
    pub applied_rules: Vec<String>,
}

/// Applies a [`RuleSet`] to circuits.
#[derive(Debug, Clone)]
pub struct RewriteEngine {
    rules: RuleSet,
    max_iterations: usize,
}

impl RewriteEngine {
    /// Create an engine with the default iteration bound.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum iterations for convergence.
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// The rule set driving this engine.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The iteration bound.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// One left-to-right scan over the circuit.
    ///
    /// Replacements are rescanned immediately, so a terminating rule set
    /// leaves nothing matchable behind. At most `max_iterations` rules may
    /// fire at one position before the scan moves on, and the whole scan
    /// may fire `max_iterations` times per input operation. Unrolling a
    /// loop adds its output length to that allowance. Running out of
    /// either reports [`CompileError::NonTerminatingRewrite`].
    #[instrument(skip(self, circuit), fields(ruleset = %self.rules.name()))]
    pub fn rewrite(&self, circuit: &Circuit) -> CompileResult<RewriteResult> {
        let mut ops = circuit.operations().to_vec();
        let mut budget = Budget::new(self.rules.name(), self.max_iterations, weight(&ops));

        self.rewrite_seq(&mut ops, &mut budget)?;

        let changed = budget.count > 0;
        let rewritten = if changed {
            circuit.with_operations(ops)?
        } else {
            circuit.clone()
        };

        debug!("{} rewrites applied", budget.count);

        Ok(RewriteResult {
            circuit: rewritten,
            changed,
            rewrite_count: budget.count,
            applied_rules: budget.applied,
        })
    }

    /// Rewrite until a scan changes nothing.
    #[instrument(skip(self, circuit), fields(ruleset = %self.rules.name()))]
    pub fn fixpoint(&self, circuit: &Circuit) -> CompileResult<RewriteResult> {
        let mut current = circuit.clone();
        let mut rewrite_count = 0;
        let mut applied_rules = Vec::new();

        for iteration in 0..self.max_iterations {
            let pass = self.rewrite(&current)?;
            if !pass.changed {
                debug!(
                    "Converged after {} scans, {} rewrites",
                    iteration + 1,
                    rewrite_count
                );
                return Ok(RewriteResult {
                    circuit: pass.circuit,
                    changed: rewrite_count > 0,
                    rewrite_count,
                    applied_rules,
                });
            }
            rewrite_count += pass.rewrite_count;
            applied_rules.extend(pass.applied_rules);
            current = pass.circuit;
        }

        Err(CompileError::NonTerminatingRewrite {
            ruleset: self.rules.name().to_string(),
            iterations: self.max_iterations,
        })
    }

    fn rewrite_seq<T: Rewritable>(&self, items: &mut Vec<T>, budget: &mut Budget) -> CompileResult<()> {
        let mut pos = 0;
        let mut streak = 0;
        while pos < items.len() {
            if let Some((rule, replacement)) = self.first_match(items, pos)? {
                trace!("{} fired at {}", rule.name, pos);
                streak += 1;
                if streak > self.max_iterations {
                    return Err(budget.exhausted());
                }
                let window = pos..pos + rule.window;
                let grant = if items[window.clone()].iter().any(T::is_loop) {
                    replacement.len()
                } else {
                    0
                };
                budget.spend(rule.name, grant)?;
                items.splice(window, replacement);
                continue;
            }
            if let Some(body) = items[pos].body_mut() {
                self.rewrite_seq(body, budget)?;
            }
            pos += 1;
            streak = 0;
        }
        Ok(())
    }

    fn first_match<T: Rewritable>(
        &self,
        items: &[T],
        pos: usize,
    ) -> CompileResult<Option<(&RewriteRule, Vec<T>)>> {
        for rule in self.rules.rules() {
            let end = pos + rule.window;
            if end > items.len() {
                continue;
            }
            if let Some(replacement) = T::apply(rule, &items[pos..end])? {
                return Ok(Some((rule, replacement)));
            }
        }
        Ok(None)
    }
}

/// Rewrite a circuit once with the given rule set.
pub fn rewrite(circuit: &Circuit, rules: &RuleSet) -> CompileResult<RewriteResult> {
    RewriteEngine::new(rules.clone()).rewrite(circuit)
}

/// Rewrite a circuit to a fixpoint with the default iteration bound.
pub fn fixpoint(circuit: &Circuit, rules: &RuleSet) -> CompileResult<RewriteResult> {
    RewriteEngine::new(rules.clone()).fixpoint(circuit)
}

/// Items the engine can scan: top-level operations and loop-body templates.
trait Rewritable: Clone {
    fn apply(rule: &RewriteRule, window: &[Self]) -> CompileResult<Option<Vec<Self>>>;
    fn body_mut(&mut self) -> Option<&mut Vec<Template>>;
    fn is_loop(&self) -> bool;
}

impl Rewritable for Operation {
    fn apply(rule: &RewriteRule, window: &[Self]) -> CompileResult<Option<Vec<Self>>> {
        (rule.on_operations)(window)
    }

    fn body_mut(&mut self) -> Option<&mut Vec<Template>> {
        match self {
            Operation::Loop(block) => Some(&mut block.body),
            _ => None,
        }
    }

    fn is_loop(&self) -> bool {
        matches!(self, Operation::Loop(_))
    }
}

impl Rewritable for Template {
    fn apply(rule: &RewriteRule, window: &[Self]) -> CompileResult<Option<Vec<Self>>> {
        match rule.on_templates {
            Some(matcher) => matcher(window),
            None => Ok(None),
        }
    }

    fn body_mut(&mut self) -> Option<&mut Vec<Template>> {
        match self {
            Template::Loop(block) => Some(&mut block.body),
            _ => None,
        }
    }

    fn is_loop(&self) -> bool {
        matches!(self, Template::Loop(_))
    }
}

fn weight(ops: &[Operation]) -> usize {
    ops.iter()
        .map(|op| match op {
            Operation::Loop(block) => 1 + block.template_count(),
            _ => 1,
        })
        .sum()
}

struct Budget {
    ruleset: String,
    max_iterations: usize,
    remaining: usize,
    count: usize,
    applied: Vec<String>,
}

impl Budget {
    fn new(ruleset: &str, max_iterations: usize, weight: usize) -> Self {
        Self {
            ruleset: ruleset.to_string(),
            max_iterations,
            remaining: max_iterations.saturating_mul(weight + 1),
            count: 0,
            applied: Vec::new(),
        }
    }

    /// Record one firing. `grant` extends the allowance afterwards.
    fn spend(&mut self, rule: &str, grant: usize) -> CompileResult<()> {
        if self.remaining == 0 {
            return Err(self.exhausted());
        }
        self.remaining = (self.remaining - 1).saturating_add(grant);
        self.count += 1;
        self.applied.push(rule.to_string());
        Ok(())
    }

    fn exhausted(&self) -> CompileError {
        CompileError::NonTerminatingRewrite {
            ruleset: self.ruleset.clone(),
            iterations: self.max_iterations,
        }
    }
}
