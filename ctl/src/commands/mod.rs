use std::{io::Read, path::Path};

use anyhow::Context;

mod new_jwt;
mod pool;
mod roles;
mod validate;

pub use new_jwt::{NewJwtParams, new_jwt};
pub use pool::{PoolParams, pool};
pub use roles::{RolesCommand, roles};
pub use validate::{ValidateParams, validate};

/// Reads a resource file, or stdin when the path is `-`.
fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}
