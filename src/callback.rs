//! Callback chains: the plugin extension mechanism.
//!
//! Every stage of request handling runs through a named chain of hooks.
//! A hook receives the mutable chain arguments and returns `Option` -
//! `None` defers to the next hook (or the chain's fallback), `Some`
//! produces a chain-specific result.
//!
//! [`run_chain`] is the single execution engine. Its behavior is shaped
//! by three policies:
//!
//! - `combine` folds a hook's output into the arguments for the next
//!   hook (notify chains ignore outputs; transform chains write the
//!   output back),
//! - `done` decides whether a hook's output ends the chain,
//! - `fallback` produces the default result when no hook satisfied
//!   `done`.
//!
//! There is no per-hook isolation: a hook that panics aborts the whole
//! request. Hooks run in plugin registration order.

use crate::entry::{Entry, ParserFn};
use crate::renderer::Render;
use crate::request::{Request, Response, Site};
use crate::router::PathInfo;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Hooks
// ============================================================================

/// A single registered hook: the owning plugin's name plus the function.
pub struct Hook<A, O> {
    pub plugin: &'static str,
    func: Box<dyn Fn(&mut A) -> Option<O> + Send + Sync>,
}

impl<A, O> Hook<A, O> {
    pub fn new(
        plugin: &'static str,
        func: impl Fn(&mut A) -> Option<O> + Send + Sync + 'static,
    ) -> Self {
        Self {
            plugin,
            func: Box::new(func),
        }
    }

    pub fn call(&self, args: &mut A) -> Option<O> {
        (self.func)(args)
    }
}

// ============================================================================
// Chain Runner
// ============================================================================

/// Execute a callback chain.
///
/// Hooks run in order; after each one, `done` inspects the output and a
/// true result stops the chain with that output as the final result.
/// Otherwise `combine` folds the output into the arguments and the next
/// hook runs. If the chain exhausts without satisfying `done`, the
/// result comes from `fallback`.
pub fn run_chain<A, O>(
    hooks: &[Hook<A, O>],
    args: &mut A,
    mut combine: impl FnMut(&mut A, O),
    done: impl Fn(&Option<O>) -> bool,
    fallback: impl FnOnce(&mut A) -> Option<O>,
) -> Option<O> {
    let mut output = None;
    for hook in hooks {
        output = hook.call(args);
        if done(&output) {
            return output;
        }
        if let Some(value) = output.take() {
            combine(args, value);
        }
    }
    if done(&output) { output } else { fallback(args) }
}

/// Run a chain for its side effects only, ignoring hook outputs.
pub fn notify<A>(hooks: &[Hook<A, ()>], args: &mut A) {
    run_chain(hooks, args, |_, _| {}, |_| false, |_| None);
}

/// First hook returning `Some` wins; otherwise the default applies.
pub fn first_of<A, O>(hooks: &[Hook<A, O>], args: &mut A, default: impl FnOnce(&mut A) -> O) -> O {
    match run_chain(
        hooks,
        args,
        |_, _| {},
        |output| output.is_some(),
        |args| Some(default(args)),
    ) {
        Some(output) => output,
        // the fallback always yields Some
        None => unreachable!(),
    }
}

/// First hook returning `Some` wins; `None` when every hook defers.
pub fn first_opt<A, O>(hooks: &[Hook<A, O>], args: &mut A) -> Option<O> {
    run_chain(hooks, args, |_, _| {}, |output| output.is_some(), |_| None)
}

// ============================================================================
// Chain Arguments
// ============================================================================

/// Arguments for the `entries` chain: the walked file list before it
/// becomes entries. Hooks drop or add paths in place.
pub struct EntryFiles {
    pub site: Site,
    pub files: Vec<PathBuf>,
}

/// Arguments for the `filestat` chain: which timestamp does this entry
/// file carry? The fallback asks the filesystem.
pub struct FileStat {
    pub config: Arc<crate::config::SiteConfig>,
    pub path: PathBuf,
}

/// Arguments for the `sortlist` and `truncatelist` chains.
pub struct ListArgs {
    pub entries: Vec<Entry>,
    pub truncate: bool,
    pub num_entries: usize,
}

/// Arguments for the `compile_filelist` chain: the (url, querystring)
/// pairs queued for static compilation. Hooks append pairs in place.
pub struct CompileList {
    pub site: Site,
    pub urls: Vec<(String, String)>,
    pub themes: Vec<String>,
    pub index_themes: Vec<String>,
    pub incremental: bool,
}

// ============================================================================
// Registry
// ============================================================================

/// The process-global callback registry: one ordered hook list per
/// chain, plus the per-extension entry parser table.
///
/// Built once at startup from the configured plugin list; append-only,
/// never rebuilt without a process restart.
#[derive(Default)]
pub struct Registry {
    pub start: Vec<Hook<Request, ()>>,
    pub handle: Vec<Hook<Request, Response>>,
    pub pathinfo: Vec<Hook<Request, PathInfo>>,
    pub filelist: Vec<Hook<Request, Vec<Entry>>>,
    pub entries: Vec<Hook<EntryFiles, ()>>,
    pub filestat: Vec<Hook<FileStat, DateTime<Local>>>,
    pub sortlist: Vec<Hook<ListArgs, Vec<Entry>>>,
    pub truncatelist: Vec<Hook<ListArgs, Vec<Entry>>>,
    pub prepare: Vec<Hook<Request, ()>>,
    pub renderer: Vec<Hook<Request, Box<dyn Render>>>,
    pub compile_filelist: Vec<Hook<CompileList, ()>>,
    pub end: Vec<Hook<Request, ()>>,

    parsers: BTreeMap<String, ParserFn>,
}

impl Registry {
    /// A registry with no hooks and the built-in `txt` entry parser.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_parser("txt", Box::new(crate::entry::parse_text_entry));
        registry
    }

    /// Register an entry parser for a file extension. Later
    /// registrations override earlier ones.
    pub fn register_parser(&mut self, extension: &str, parser: ParserFn) {
        self.parsers.insert(extension.to_string(), parser);
    }

    pub fn parser_for(&self, extension: &str) -> Option<&ParserFn> {
        self.parsers.get(extension)
    }

    /// Registered entry file extensions, in stable order.
    pub fn extensions(&self) -> Vec<String> {
        self.parsers.keys().cloned().collect()
    }
}

/// A plugin contributes hooks to chains and parsers to the extension
/// table. Activation order in `[plugins].load` is hook order.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn register(&self, registry: &mut Registry);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Args {
        value: i32,
        trace: Vec<&'static str>,
    }

    #[test]
    fn test_empty_chain_runs_fallback_on_original_input() {
        let hooks: Vec<Hook<Args, i32>> = Vec::new();
        let mut args = Args {
            value: 7,
            trace: vec![],
        };
        let result = first_of(&hooks, &mut args, |args| args.value * 10);
        assert_eq!(result, 70);
    }

    #[test]
    fn test_first_of_stops_at_first_some() {
        let hooks = vec![
            Hook::new("a", |args: &mut Args| {
                args.trace.push("a");
                None
            }),
            Hook::new("b", |args: &mut Args| {
                args.trace.push("b");
                Some(1)
            }),
            Hook::new("c", |args: &mut Args| {
                args.trace.push("c");
                Some(2)
            }),
        ];
        let mut args = Args {
            value: 0,
            trace: vec![],
        };
        let result = first_of(&hooks, &mut args, |_| 99);
        assert_eq!(result, 1);
        // the third hook never ran
        assert_eq!(args.trace, vec!["a", "b"]);
    }

    #[test]
    fn test_first_opt_none_when_all_defer() {
        let hooks = vec![
            Hook::new("a", |_: &mut Args| None),
            Hook::new("b", |_: &mut Args| None),
        ];
        let mut args = Args {
            value: 0,
            trace: vec![],
        };
        assert_eq!(first_opt::<_, i32>(&hooks, &mut args), None);
    }

    #[test]
    fn test_notify_runs_every_hook_in_order() {
        let hooks = vec![
            Hook::new("a", |args: &mut Args| {
                args.trace.push("a");
                Some(())
            }),
            Hook::new("b", |args: &mut Args| {
                args.trace.push("b");
                None
            }),
            Hook::new("c", |args: &mut Args| {
                args.trace.push("c");
                Some(())
            }),
        ];
        let mut args = Args {
            value: 0,
            trace: vec![],
        };
        notify(&hooks, &mut args);
        assert_eq!(args.trace, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_transform_chain_feeds_output_forward() {
        // each hook doubles the running value; combine writes it back
        let hooks = vec![
            Hook::new("a", |args: &mut Args| Some(args.value * 2)),
            Hook::new("b", |args: &mut Args| Some(args.value * 2)),
        ];
        let mut args = Args {
            value: 3,
            trace: vec![],
        };
        run_chain(
            &hooks,
            &mut args,
            |args, output| args.value = output,
            |_| false,
            |_| None,
        );
        assert_eq!(args.value, 12);
    }

    #[test]
    fn test_registry_seeds_txt_parser() {
        let registry = Registry::new();
        assert!(registry.parser_for("txt").is_some());
        assert!(registry.parser_for("md").is_none());
        assert_eq!(registry.extensions(), vec!["txt".to_string()]);
    }
}
