//! Flow steps.
//!
//! A rule's flow is a tree: `match` and `rewrite` leaves under `all` / `any`
//! composites. Children are evaluated in declared order and composites
//! short-circuit, so later children may never run.

use crate::rewrite::context::RewriteContext;
use crate::rewrite::error::RewriteError;
use crate::rewrite::matcher;
use crate::rewrite::rewriter::Rewriter;
use crate::template::Template;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Match the current template; binds captures on success.
    Match(Template),
    /// Replace the current template with the expanded target.
    Rewrite(Template),
    /// Succeeds when every child succeeds; stops at the first failure.
    All(Vec<Step>),
    /// Succeeds at the first child that succeeds; failed children are rolled back.
    Any(Vec<Step>),
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Match(_) => "match",
            Step::Rewrite(_) => "rewrite",
            Step::All(_) => "all",
            Step::Any(_) => "any",
        }
    }

    /// Evaluate against `current`, replacing it on rewrite.
    ///
    /// `Ok(false)` is a normal negative result. `Err` aborts the whole rule.
    pub fn evaluate(
        &self,
        current: &mut Template,
        ctx: &mut RewriteContext,
        rewriter: Rewriter<'_>,
    ) -> Result<bool, RewriteError> {
        let outcome = match self {
            Step::Match(pattern) => matcher::matches(current, pattern, ctx),
            Step::Rewrite(target) => {
                *current = rewriter.rewrite(target, ctx)?;
                true
            }
            Step::All(children) => {
                let mut all = true;
                for child in children {
                    if !child.evaluate(current, ctx, rewriter)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            Step::Any(children) => {
                let mut any = false;
                for child in children {
                    let template = current.clone();
                    let snapshot = ctx.snapshot();
                    if child.evaluate(current, ctx, rewriter)? {
                        any = true;
                        break;
                    }
                    *current = template;
                    ctx.restore(snapshot);
                }
                any
            }
        };
        tracing::trace!(step = self.kind(), outcome, "Flow step evaluated");
        Ok(outcome)
    }

    /// Visit this step and every descendant, parents first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Step)) {
        f(self);
        if let Step::All(children) | Step::Any(children) = self {
            for child in children {
                child.visit(f);
            }
        }
    }

    /// Number of steps in the tree.
    pub fn size(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }
}
