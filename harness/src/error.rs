//! Harness-specific error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("failed to create docker client: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("failed to create docker network: {0}")]
    NetworkCreate(#[source] bollard::errors::Error),

    #[error("docker engine error: {0}")]
    Engine(#[from] bollard::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

impl HarnessError {
    /// Build an engine error carrying a Docker API status code. Handy for
    /// exercising the classification paths without a daemon.
    pub fn server_error(status_code: u16, message: &str) -> Self {
        HarnessError::Engine(bollard::errors::Error::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        })
    }

    fn status_code(&self) -> Option<u16> {
        let source = match self {
            HarnessError::Connect(e) | HarnessError::NetworkCreate(e) | HarnessError::Engine(e) => e,
            HarnessError::Io(_) => return None,
        };
        match source {
            bollard::errors::Error::DockerResponseServerError { status_code, .. } => {
                Some(*status_code)
            }
            _ => None,
        }
    }

    /// A concurrent operation (typically another prune) holds the resource.
    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status_code() == Some(304)
    }

    /// Stop errors that mean the container is already gone or already
    /// stopped. These are expected during teardown and not worth logging.
    pub fn is_benign_stop_error(&self) -> bool {
        self.is_not_modified() || self.is_not_found()
    }
}
