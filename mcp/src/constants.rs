pub const GITHUB_RAW_BASE_URL: &'static str =
    "https://raw.githubusercontent.com/dcodesdev/shuttle/refs/heads/main";
pub const SHUTTLE_DOCS_SEARCH_BASE_URL: &'static str = "https://shuttle-docs.dcodes.dev";
pub const INSTALL_SHUTTLE_MCP_COMMAND: &'static str =
    "cargo install --git https://github.com/dcodesdev/shuttle shuttle-mcp";
