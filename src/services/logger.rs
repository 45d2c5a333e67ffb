use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" | "trace" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    fn from_env() -> Self {
        let raw = std::env::var("POWERBI_LOG_LEVEL")
            .or_else(|_| std::env::var("LOG_LEVEL"))
            .unwrap_or_else(|_| "info".to_string());
        Self::parse(&raw)
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
    level: LogLevel,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            level: LogLevel::from_env(),
        }
    }

    pub fn with_level(context: &str, level: LogLevel) -> Self {
        Self {
            context: context.to_string(),
            level,
        }
    }

    pub fn child(&self, suffix: &str) -> Self {
        let context = if suffix.is_empty() {
            self.context.clone()
        } else {
            format!("{}:{}", self.context, suffix)
        };
        Self {
            context,
            level: self.level,
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    fn log(&self, level: LogLevel, message: &str, meta: Option<&Value>) {
        if !self.enabled(level) {
            return;
        }
        eprintln!("{}", self.format_line(level, message, meta));
    }

    fn format_line(&self, level: LogLevel, message: &str, meta: Option<&Value>) -> String {
        let meta_suffix = meta
            .filter(|m| !m.is_null())
            .map(|m| format!(" {}", m))
            .unwrap_or_default();
        format!(
            "[{}] {} [{}] {}{}",
            chrono::Utc::now().to_rfc3339(),
            level.label(),
            self.context,
            message,
            meta_suffix
        )
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Debug, message, meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_is_inclusive() {
        let logger = Logger::with_level("powerbi-mcp", LogLevel::Warn);
        assert!(logger.enabled(LogLevel::Error));
        assert!(logger.enabled(LogLevel::Warn));
        assert!(!logger.enabled(LogLevel::Info));
    }

    #[test]
    fn child_context_is_colon_joined() {
        let logger = Logger::with_level("powerbi-mcp", LogLevel::Info).child("token");
        let line = logger.format_line(
            LogLevel::Info,
            "Token obtained",
            Some(&serde_json::json!({"expires_in": 3599})),
        );
        assert!(line.contains("INFO [powerbi-mcp:token] Token obtained {\"expires_in\":3599}"));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse(" WARN "), LogLevel::Warn);
    }
}
