pub mod field;
pub mod files;
pub mod navigation;
pub mod session;
pub mod signature;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub(crate) fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for entry in system::definitions()
        .into_iter()
        .chain(field::definitions())
        .chain(navigation::definitions())
        .chain(files::definitions())
        .chain(signature::definitions())
        .chain(session::definitions())
    {
        registry.register(entry);
    }
    registry
}
