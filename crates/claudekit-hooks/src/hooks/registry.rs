//! Closed hook registry
//!
//! The one place a hook is wired up. Dispatch, `list`, `test`, and the
//! setup tooling all read this table, so a new hook added here is
//! immediately visible everywhere.

use crate::hooks::check_any::{CheckAnyChangedHook, CHECK_ANY_CHANGED};
use crate::hooks::checkpoint::{CreateCheckpointHook, CREATE_CHECKPOINT};
use crate::hooks::codebase_map::{CodebaseMapHook, CODEBASE_MAP};
use crate::hooks::lint::{LintChangedHook, LintProjectHook, LINT_CHANGED, LINT_PROJECT};
use crate::hooks::testing::{TestChangedHook, TestProjectHook, TEST_CHANGED, TEST_PROJECT};
use crate::hooks::todos::{CheckTodosHook, CHECK_TODOS};
use crate::hooks::typecheck::{
    TypecheckChangedHook, TypecheckProjectHook, TYPECHECK_CHANGED, TYPECHECK_PROJECT,
};
use crate::hooks::{Hook, HookDescriptor};

/// One registry row: descriptor plus handler constructor
pub struct Registration {
    pub descriptor: &'static HookDescriptor,
    build: fn() -> Box<dyn Hook>,
}

impl Registration {
    /// Instantiate the handler
    pub fn handler(&self) -> Box<dyn Hook> {
        (self.build)()
    }
}

/// The closed set of hook ids this engine knows
static REGISTRY: &[Registration] = &[
    Registration {
        descriptor: &TYPECHECK_CHANGED,
        build: || Box::new(TypecheckChangedHook),
    },
    Registration {
        descriptor: &LINT_CHANGED,
        build: || Box::new(LintChangedHook),
    },
    Registration {
        descriptor: &CHECK_ANY_CHANGED,
        build: || Box::new(CheckAnyChangedHook),
    },
    Registration {
        descriptor: &TEST_CHANGED,
        build: || Box::new(TestChangedHook),
    },
    Registration {
        descriptor: &TYPECHECK_PROJECT,
        build: || Box::new(TypecheckProjectHook),
    },
    Registration {
        descriptor: &LINT_PROJECT,
        build: || Box::new(LintProjectHook),
    },
    Registration {
        descriptor: &TEST_PROJECT,
        build: || Box::new(TestProjectHook),
    },
    Registration {
        descriptor: &CREATE_CHECKPOINT,
        build: || Box::new(CreateCheckpointHook),
    },
    Registration {
        descriptor: &CHECK_TODOS,
        build: || Box::new(CheckTodosHook),
    },
    Registration {
        descriptor: &CODEBASE_MAP,
        build: || Box::new(CodebaseMapHook),
    },
];

/// All registrations, in listing order
pub fn all_hooks() -> &'static [Registration] {
    REGISTRY
}

/// Look up one hook by id
pub fn find_hook(id: &str) -> Option<&'static Registration> {
    REGISTRY
        .iter()
        .find(|registration| registration.descriptor.id == id)
}

/// The friendly listing printed for unknown ids
pub fn render_hook_listing() -> String {
    let mut out = String::from("Available hooks:\n");
    for registration in REGISTRY {
        out.push_str(&format!(
            "  {:<18} {}\n",
            registration.descriptor.id, registration.descriptor.description
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_has_the_ten_hooks() {
        assert_eq!(all_hooks().len(), 10);
    }

    #[test]
    fn ids_are_unique_and_resolvable() {
        let mut seen = HashSet::new();
        for registration in all_hooks() {
            assert!(seen.insert(registration.descriptor.id), "duplicate id");
            let found = find_hook(registration.descriptor.id).unwrap();
            assert_eq!(found.descriptor.id, registration.descriptor.id);
            // Handler self-reports the same descriptor it is registered under
            assert_eq!(found.handler().descriptor().id, registration.descriptor.id);
        }
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(find_hook("no-such-hook").is_none());
    }

    #[test]
    fn listing_mentions_every_id() {
        let listing = render_hook_listing();
        for registration in all_hooks() {
            assert!(listing.contains(registration.descriptor.id));
        }
    }
}
