pub mod authors;
pub mod error;
pub mod session;
pub mod users;

use booker_kernel::ModuleRegistry;

use crate::context::AppContext;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &AppContext) {
    registry.register_core(users::create_module(ctx.clone()));
    registry.register_custom(authors::create_module(ctx.clone()));
}
