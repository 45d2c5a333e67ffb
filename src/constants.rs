pub mod endpoints {
    pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
    pub const POWERBI_API: &str = "https://api.powerbi.com/v1.0/myorg";
    pub const FABRIC_API: &str = "https://api.fabric.microsoft.com/v1";
    pub const POWERBI_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";
}

pub mod env {
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const TENANT_ID: &str = "TENANT_ID";
    pub const SCOPE: &str = "POWERBI_SCOPE";
    pub const AUTHORITY_HOST: &str = "POWERBI_AUTHORITY_HOST";
    pub const POWERBI_API: &str = "POWERBI_API_BASE";
    pub const FABRIC_API: &str = "FABRIC_API_BASE";
    pub const POLL_MAX_ATTEMPTS: &str = "POWERBI_POLL_MAX_ATTEMPTS";
    pub const HTTP_TIMEOUT_MS: &str = "POWERBI_HTTP_TIMEOUT_MS";
}

pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 10_000;
    pub const DEFAULT_PORT: u16 = 8000;
    pub const USER_AGENT: &str = "powerbi-mcp/1.0";
}

pub mod limits {
    pub const ERROR_BODY_MAX_BYTES: usize = 200;
    pub const LOG_BODY_MAX_BYTES: usize = 1024;
}

pub mod polling {
    pub const DEFAULT_RETRY_AFTER_SECS: u64 = 30;
    pub const MAX_ATTEMPTS: u32 = 5;
    pub const STATUS_SUCCEEDED: &str = "Succeeded";
    pub const STATUS_FAILED: &str = "Failed";
    pub const RESULT_SEGMENT: &str = "result";
}

pub mod model {
    pub const DEFINITION_EXTENSION: &str = ".tmdl";
    pub const RULE_WIDTH: usize = 40;
}

pub mod service {
    pub const NAME: &str = "Power BI MCP Server";
    pub const SERVER_NAME: &str = "powerbi-mcp";
    pub const VERSION: &str = "1.0.0";
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
}
