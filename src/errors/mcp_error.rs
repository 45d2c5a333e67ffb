use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum McpError {
    #[error("No JSON body provided")]
    MissingBody,
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    pub fn http_status(&self) -> u16 {
        match self {
            McpError::MissingBody | McpError::UnknownMethod(_) | McpError::InvalidParams(_) => 400,
            McpError::Io(_) => 500,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            McpError::MissingBody => ErrorCode::ParseError,
            McpError::UnknownMethod(_) => ErrorCode::MethodNotFound,
            McpError::InvalidParams(_) => ErrorCode::InvalidParams,
            McpError::Io(_) => ErrorCode::InternalError,
        }
    }
}
