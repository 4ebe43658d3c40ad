use crate::util::file_logger::FileLogger;

/// Persist a client-reported log entry
pub fn write_client_log(
    level: &str,
    source: &str,
    category: Option<&str>,
    msg: &str,
    detail: Option<&str>,
) {
    FileLogger::global().write_client_log(level, source, category, msg, detail);
}

/// Audit trail entry for destructive operations
pub fn audit(operation: &str, target: &str, summary: &str) {
    FileLogger::global().write_audit(operation, target, summary);
}
