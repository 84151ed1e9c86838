#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub port: u16,
    pub log_requests: bool,
    /// Directory served under /static (album placeholder images and the
    /// like). None disables static file serving.
    pub static_dir_path: Option<String>,
}
