//! Post-processing hook chain.
//!
//! External code can observe or transform the text emitted for each
//! top-level declaration. Hooks form an explicit ordered list per
//! declaration kind rather than a subclassing surface: `register`
//! appends, `run` folds left-to-right, each hook receiving the previous
//! result and returning the next. The threaded text is the only channel
//! between hooks.
//!
//! Registration happens at pipeline setup; there is no hot-registration
//! during a run.

use lux_ast::Declaration;
use rustc_hash::FxHashMap;

/// What a hook list is keyed by: a declaration kind, or the standalone
/// single-expression emission path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    Class,
    Enum,
    Typedef,
    Abstract,
    Expression,
}

impl HookKind {
    pub fn of(decl: &Declaration) -> Self {
        match decl {
            Declaration::Class(_) => HookKind::Class,
            Declaration::Enum(_) => HookKind::Enum,
            Declaration::Typedef(_) => HookKind::Typedef,
            Declaration::Abstract(_) => HookKind::Abstract,
        }
    }
}

/// Read-only view of the pipeline handed to every hook invocation.
pub struct CompilerHandle<'a> {
    /// Name of the compilation unit, as used in diagnostics.
    pub file: &'a str,
}

/// One transformer. Receives the accumulated text so far and the
/// declaration being emitted (`None` on the single-expression path).
pub type HookFn = Box<dyn Fn(String, &CompilerHandle<'_>, Option<&Declaration>) -> String>;

#[derive(Default)]
pub struct HookChain {
    chains: FxHashMap<HookKind, Vec<HookFn>>,
}

impl HookChain {
    pub fn new() -> Self {
        HookChain::default()
    }

    /// Append a hook to the list for `kind`. Order of registration is
    /// order of execution.
    pub fn register(&mut self, kind: HookKind, hook: HookFn) {
        self.chains.entry(kind).or_default().push(hook);
    }

    pub fn is_empty(&self, kind: HookKind) -> bool {
        self.chains.get(&kind).is_none_or(|c| c.is_empty())
    }

    /// Fold the registered hooks for `kind` over `initial`.
    pub fn run(
        &self,
        kind: HookKind,
        initial: String,
        handle: &CompilerHandle<'_>,
        decl: Option<&Declaration>,
    ) -> String {
        let Some(chain) = self.chains.get(&kind) else {
            return initial;
        };
        chain
            .iter()
            .fold(initial, |text, hook| hook(text, handle, decl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_hooks_in_registration_order() {
        let mut hooks = HookChain::new();
        hooks.register(HookKind::Class, Box::new(|text, _, _| format!("{text}a")));
        hooks.register(HookKind::Class, Box::new(|text, _, _| format!("{text}b")));
        let handle = CompilerHandle { file: "Main.lx" };
        let result = hooks.run(HookKind::Class, "x".to_string(), &handle, None);
        assert_eq!(result, "xab");
    }

    #[test]
    fn kinds_are_independent() {
        let mut hooks = HookChain::new();
        hooks.register(HookKind::Enum, Box::new(|_, _, _| "replaced".to_string()));
        let handle = CompilerHandle { file: "Main.lx" };
        let untouched = hooks.run(HookKind::Class, "x".to_string(), &handle, None);
        assert_eq!(untouched, "x");
        assert!(hooks.is_empty(HookKind::Class));
        assert!(!hooks.is_empty(HookKind::Enum));
    }
}
