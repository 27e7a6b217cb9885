//! Sample packages for fyzz.
//!
//! Each submodule registers one package (or single module) into a
//! [`Registry`]. [`registry`] returns all of them; the `fyzz` binary serves
//! this registry.
//!
//! | name            | shape                         | purpose                              |
//! |-----------------|-------------------------------|--------------------------------------|
//! | `pyfyzzexample` | package, one submodule        | the classic add/subtract example     |
//! | `arith`         | single module                 | self-defending functions             |
//! | `textkit`       | package, several submodules   | mixed raises, skips, re-exports      |
//! | `untyped`       | single module                 | nothing annotated                    |
//! | `brokenpkg`     | listed, fails on import       | import failure path                  |

use fyzz_core::runtime::Registry;

pub mod arith;
pub mod pyfyzzexample;
pub mod textkit;
pub mod untyped;

/// Name of the package that is listed but cannot be imported.
pub const BROKEN_PACKAGE: &str = "brokenpkg";

/// Every sample package.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    pyfyzzexample::register(&mut registry);
    arith::register(&mut registry);
    textkit::register(&mut registry);
    untyped::register(&mut registry);
    registry.register_broken(
        BROKEN_PACKAGE,
        "ModuleNotFoundError: No module named 'missing_dependency'",
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use fyzz_core::runtime::Reflector;

    #[test]
    fn all_samples_are_listed() {
        let registry = registry();
        assert_eq!(
            registry.top_level_names(),
            vec!["arith", "brokenpkg", "pyfyzzexample", "textkit", "untyped"]
        );
    }

    #[test]
    fn broken_package_is_listed_but_fails_to_import() {
        let registry = registry();
        assert!(registry.is_importable(BROKEN_PACKAGE));
        assert!(registry.import_module(BROKEN_PACKAGE).is_err());
    }
}
