use super::history::ImageRef;
use super::service::GenerationService;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Where produced images are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactSource {
    /// Download through the service's `/view` endpoint.
    #[default]
    Download,
    /// Read from the service's output directory on a shared filesystem.
    SharedDirectory { path: PathBuf },
}

impl ArtifactSource {
    /// Reads the raw bytes of `image`.
    pub fn read<S: GenerationService>(
        &self,
        service: &S,
        image: &ImageRef,
    ) -> Result<Vec<u8>, ClientError> {
        match self {
            ArtifactSource::Download => service.fetch_artifact(image),
            ArtifactSource::SharedDirectory { path } => {
                let source = contained_path(path, &image.subfolder, &image.filename)?;
                fs::read(&source).map_err(|e| io_error(&source, e))
            }
        }
    }
}

/// Writes `bytes` verbatim to `destination`, creating parent directories.
pub(super) fn write_artifact(destination: &Path, bytes: &[u8]) -> Result<(), ClientError> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
    }
    fs::write(destination, bytes).map_err(|e| io_error(destination, e))
}

/// Joins service-supplied `subfolder` and `filename` onto `root`.
///
/// Names are rejected unless every component is a plain name, so the result
/// always stays below `root`. `subfolder` may be empty, `filename` may not.
pub(super) fn contained_path(root: &Path, subfolder: &str, filename: &str) -> Result<PathBuf, ClientError> {
    let is_plain = |name: &str| {
        Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    };
    let mut path = root.to_path_buf();
    if !subfolder.is_empty() {
        path.push(subfolder);
    }
    path.push(filename);

    if !is_plain(subfolder) || filename.is_empty() || !is_plain(filename) {
        return Err(ClientError::ArtifactIo {
            path: path.display().to_string(),
            message: "artifact name escapes its directory".to_string(),
        });
    }
    Ok(path)
}

fn io_error(path: &Path, e: std::io::Error) -> ClientError {
    ClientError::ArtifactIo {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
