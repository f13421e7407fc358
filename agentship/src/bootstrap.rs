//! Process-startup environment resolution.
//!
//! Every env var the core reads directly — `MCP_SERVERS_CONFIG`,
//! `AGENT_SESSION_STORE_URI`, `AGENT_SHORT_TERM_MEMORY`,
//! `MCP_TOKEN_ENCRYPTION_KEY`, `MCP_DEFAULT_USER_ID` — is read with plain
//! `std::env::var` at the point of use. [`init_env`] should run once before
//! any of that, so `.env` / XDG `config.toml` values participate with the
//! same env > `.env` > XDG precedence `agentship-config` already implements
//! for the wider corpus; a value already present in the process environment
//! always wins.

/// App name used for the XDG config directory (`~/.config/agentship/config.toml`).
pub const APP_NAME: &str = "agentship";

/// Name of the `AGENT_SHORT_TERM_MEMORY` value that selects the Postgres-backed
/// checkpointer; any other value (including unset) selects the in-memory one.
pub const SHORT_TERM_MEMORY_DATABASE: &str = "Database";

/// Loads `.env` and XDG `config.toml` and applies them to the process
/// environment (existing env vars are never overwritten). Safe to call more
/// than once; each call only fills in variables still missing from the
/// environment.
pub fn init_env() -> Result<(), agentship_config::LoadError> {
    agentship_config::load_and_apply(APP_NAME, None)
}

/// Reads `AGENT_SHORT_TERM_MEMORY` and reports whether it selects the
/// Postgres-backed checkpointer.
pub fn short_term_memory_is_database() -> bool {
    std::env::var("AGENT_SHORT_TERM_MEMORY")
        .map(|v| v == SHORT_TERM_MEMORY_DATABASE)
        .unwrap_or(false)
}

/// Reads `AGENT_SESSION_STORE_URI`, the Postgres connection string consulted
/// when [`short_term_memory_is_database`] is true.
pub fn session_store_uri() -> Option<String> {
    std::env::var("AGENT_SESSION_STORE_URI").ok()
}

/// Reads `MCP_DEFAULT_USER_ID`, the owner used by discovery tooling that
/// calls the MCP client manager without a real agent owner. An empty
/// owner degenerates to a shared client.
pub fn mcp_default_user_id() -> String {
    std::env::var("MCP_DEFAULT_USER_ID").unwrap_or_else(|_| String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_term_memory_defaults_to_in_memory() {
        std::env::remove_var("AGENT_SHORT_TERM_MEMORY");
        assert!(!short_term_memory_is_database());
    }

    #[test]
    fn short_term_memory_database_selects_postgres() {
        std::env::set_var("AGENT_SHORT_TERM_MEMORY", "Database");
        assert!(short_term_memory_is_database());
        std::env::remove_var("AGENT_SHORT_TERM_MEMORY");
    }

    #[test]
    fn mcp_default_user_id_defaults_to_empty() {
        std::env::remove_var("MCP_DEFAULT_USER_ID");
        assert_eq!(mcp_default_user_id(), "");
    }
}
