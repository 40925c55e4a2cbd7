//! Audio input error types.

/// Error type for microphone operations.
#[derive(Debug)]
pub enum AudioError {
    /// Failed to initialize the input device
    DeviceInit(String),
    /// Failed to create the input stream
    StreamCreate(String),
    /// No input device available
    NoDevice,
    /// The microphone is already held by another session
    Busy,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DeviceInit(msg) => write!(f, "Device init error: {}", msg),
            AudioError::StreamCreate(msg) => write!(f, "Stream create error: {}", msg),
            AudioError::NoDevice => write!(f, "No microphone available"),
            AudioError::Busy => write!(f, "Microphone already in use"),
        }
    }
}

impl std::error::Error for AudioError {}
