use thiserror::Error;

#[derive(Error, Debug)]
pub enum RobomuxError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera unavailable: {details}")]
    CameraUnavailable { details: String },

    #[error("Missing model assets:\n{diagnostic}")]
    AssetMissing { diagnostic: String },

    #[error("Hardware error: {details}")]
    Hardware { details: String },

    #[error("Worker '{name}' has a leaked task that is still live; start refused")]
    WorkerBusy { name: &'static str },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl RobomuxError {
    pub fn camera<S: Into<String>>(details: S) -> Self {
        Self::CameraUnavailable {
            details: details.into(),
        }
    }

    pub fn hardware<S: Into<String>>(details: S) -> Self {
        Self::Hardware {
            details: details.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RobomuxError>;
