// ABOUTME: Build context creation for image builds.
// ABOUTME: Tars a recipe directory, or wraps a single in-memory recipe.

use super::recipe::RECIPE_FILE;
use crate::runtime::BuildContext;
use std::io;
use std::path::PathBuf;

/// What an image is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSource {
    /// A directory holding a `Dockerfile` and anything it copies in.
    Directory(PathBuf),
    /// A recipe with no other context files.
    Recipe(String),
}

impl BuildSource {
    /// Tar the source into a build context.
    pub fn into_context(self) -> io::Result<BuildContext> {
        let mut builder = tar::Builder::new(Vec::new());
        match self {
            BuildSource::Directory(dir) => {
                builder.follow_symlinks(true);
                builder.append_dir_all(".", &dir)?;
            }
            BuildSource::Recipe(recipe) => {
                let bytes = recipe.into_bytes();
                let mut header = tar::Header::new_gnu();
                header.set_size(bytes.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append_data(&mut header, RECIPE_FILE, bytes.as_slice())?;
            }
        }
        Ok(BuildContext(builder.into_inner()?))
    }
}
