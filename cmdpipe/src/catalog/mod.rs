//! Wrappers for common system commands.
//!
//! Each wrapper is a small value type that renders itself as a
//! [`Command`](crate::stages::Command) through
//! [`ToCommand`](crate::stages::ToCommand), which makes it
//! [`Runnable`](crate::stages::Runnable). Per-command settings such as
//! elevation or a chroot are applied on the rendered command:
//!
//! ```rust,ignore
//! Mkdir::new("/mnt/target/boot")
//!     .create_parents()
//!     .to_command()
//!     .elevate()
//!     .run_noout(&ctx)
//!     .await?;
//! ```

mod dd;
mod fs;
mod mount;

pub use dd::Dd;
pub use fs::{Cat, Cp, Mkdir, Mv, Rm, Rmdir};
pub use mount::{Mount, Umount};

use std::path::Path;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
