use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Core modules, in initialization order.
///
/// `users` owns the identity tables every other module references, so it
/// always comes first regardless of registration order.
const CORE_MODULE_ORDER: &[&str] = &["users"];

/// Module registry for managing module lifecycle with core/custom separation
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    /// Register a core module with the registry
    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    /// Register a custom module with the registry
    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// All registered modules: core modules in `CORE_MODULE_ORDER` (unlisted
    /// core modules after them), then custom modules in registration order.
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        let mut ordered: Vec<&Arc<dyn Module>> = Vec::new();

        for &name in CORE_MODULE_ORDER {
            if let Some(module) = self.core_modules.iter().find(|m| m.name() == name) {
                ordered.push(module);
            }
        }
        for module in &self.core_modules {
            if !CORE_MODULE_ORDER.contains(&module.name()) {
                ordered.push(module);
            }
        }
        ordered.extend(self.custom_modules.iter());
        ordered
    }

    /// Get a module by name (searches both core and custom modules)
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules().into_iter().find(|module| module.name() == name)
    }

    /// Get the number of core modules
    pub fn core_module_count(&self) -> usize {
        self.core_modules.len()
    }

    /// Get the number of custom modules
    pub fn custom_module_count(&self) -> usize {
        self.custom_modules.len()
    }

    /// Initialize every module, core modules first
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            core = self.core_module_count(),
            custom = self.custom_module_count(),
            "initializing modules"
        );

        for module in self.modules() {
            tracing::info!(module = module.name(), "initializing module");
            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start every module, core modules first
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.modules() {
            tracing::info!(module = module.name(), "starting module");
            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop every module in reverse start order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        for module in self.modules().into_iter().rev() {
            tracing::info!(module = module.name(), "stopping module");
            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect migrations from all modules, tagged with the owning module.
    ///
    /// Order follows [`ModuleRegistry::modules`], then the order each module
    /// returns them in, so tables referenced by later modules exist first.
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        self.modules()
            .into_iter()
            .flat_map(|module| {
                let name = module.name().to_string();
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (name.clone(), migration))
            })
            .collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
