//! Two-tier analyzer construction by class name.
//!
//! The builtin tier maps class names straight to constructors. The local
//! tier groups constructors by module, where the module name is derived
//! from the class name ([`module_name_for`]): `LteRrcAnalyzer` lives in
//! module `lte_rrc_analyzer`. A name is resolved by trying the builtin tier
//! first and the local tier second.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use sieve_types::AnalyzerId;

use crate::analyzer::Analyzer;
use crate::engine::Engine;
use crate::error::{ConstructError, EngineError};

type Constructor = Box<dyn Fn(&[Value]) -> Result<Rc<dyn Analyzer>, ConstructError>>;

/// Constructor tables for the builtin and local tiers.
#[derive(Default)]
pub struct Factory {
    builtin: BTreeMap<String, Constructor>,
    local: BTreeMap<String, BTreeMap<String, Constructor>>,
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("builtin", &self.builtin.keys().collect::<Vec<_>>())
            .field("local", &self.local_modules())
            .finish()
    }
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constructor to the builtin tier.
    pub fn register_builtin<A, F>(&mut self, kind: &str, ctor: F) -> &mut Self
    where
        A: Analyzer,
        F: Fn(&[Value]) -> Result<A, ConstructError> + 'static,
    {
        self.builtin.insert(kind.to_string(), erase(ctor));
        self
    }

    /// Adds a constructor for `kind` to the local module `module`.
    pub fn register_local<A, F>(&mut self, module: &str, kind: &str, ctor: F) -> &mut Self
    where
        A: Analyzer,
        F: Fn(&[Value]) -> Result<A, ConstructError> + 'static,
    {
        self.local
            .entry(module.to_string())
            .or_default()
            .insert(kind.to_string(), erase(ctor));
        self
    }

    /// Builtin class names, sorted.
    pub fn builtin_kinds(&self) -> Vec<&str> {
        self.builtin.keys().map(String::as_str).collect()
    }

    /// Local modules and the class names each provides, sorted.
    pub fn local_modules(&self) -> Vec<(&str, Vec<&str>)> {
        self.local
            .iter()
            .map(|(module, kinds)| (module.as_str(), kinds.keys().map(String::as_str).collect()))
            .collect()
    }

    /// Constructs `name` with `args` and installs it into `engine`.
    ///
    /// A tier fails when it has no constructor for the name, the constructor
    /// errors, the product reports a different class name, or installing it
    /// fails. Only when both tiers fail is the name unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnresolvedDependency`] carrying both tiers'
    /// failure reasons.
    pub fn construct(
        &self,
        engine: &Engine,
        name: &str,
        args: &[Value],
    ) -> Result<AnalyzerId, EngineError> {
        let builtin = match self.try_builtin(engine, name, args) {
            Ok(id) => return Ok(id),
            Err(reason) => reason,
        };
        tracing::debug!(analyzer = %name, reason = %builtin, "builtin tier failed; trying local modules");

        let local = match self.try_local(engine, name, args) {
            Ok(id) => return Ok(id),
            Err(reason) => reason,
        };

        Err(EngineError::UnresolvedDependency {
            name: name.to_string(),
            builtin,
            local,
        })
    }

    fn try_builtin(&self, engine: &Engine, name: &str, args: &[Value]) -> Result<AnalyzerId, String> {
        let ctor = self
            .builtin
            .get(name)
            .ok_or_else(|| format!("no builtin analyzer named '{name}'"))?;
        admit(engine, name, ctor, args)
    }

    fn try_local(&self, engine: &Engine, name: &str, args: &[Value]) -> Result<AnalyzerId, String> {
        let module = module_name_for(name);
        let kinds = self
            .local
            .get(&module)
            .ok_or_else(|| format!("no local module '{module}'"))?;
        let ctor = kinds
            .get(name)
            .ok_or_else(|| format!("module '{module}' does not define '{name}'"))?;
        admit(engine, name, ctor, args)
    }
}

fn erase<A, F>(ctor: F) -> Constructor
where
    A: Analyzer,
    F: Fn(&[Value]) -> Result<A, ConstructError> + 'static,
{
    Box::new(move |args| ctor(args).map(|analyzer| Rc::new(analyzer) as Rc<dyn Analyzer>))
}

fn admit(
    engine: &Engine,
    name: &str,
    ctor: &Constructor,
    args: &[Value],
) -> Result<AnalyzerId, String> {
    let construction = |reason: String| {
        EngineError::Construction {
            kind: name.to_string(),
            reason,
        }
        .to_string()
    };
    let instance = ctor(args).map_err(|err| construction(err.to_string()))?;
    if instance.kind() != name {
        return Err(construction(format!("constructor produced '{}'", instance.kind())));
    }
    engine.install_shared(instance).map_err(|err| err.to_string())
}

/// Derives a local module name from a CamelCase class name.
///
/// Every uppercase letter is lowercased and, unless it starts the name,
/// prefixed with an underscore. Runs of capitals are split letter by letter.
///
/// ```
/// use sieve_engine::module_name_for;
///
/// assert_eq!(module_name_for("LteRrcAnalyzer"), "lte_rrc_analyzer");
/// assert_eq!(module_name_for("msg_logger"), "msg_logger");
/// ```
pub fn module_name_for(kind: &str) -> String {
    let mut module = String::with_capacity(kind.len() + 4);
    for ch in kind.chars() {
        if ch.is_uppercase() {
            if !module.is_empty() {
                module.push('_');
            }
            module.extend(ch.to_lowercase());
        } else {
            module.push(ch);
        }
    }
    module
}
