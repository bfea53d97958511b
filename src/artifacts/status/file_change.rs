use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum WorkspaceChangeType {
    #[default]
    None,
    Untracked,
    Modified,
    Deleted,
}

impl WorkspaceChangeType {
    /// Two-column code used by the short status format
    pub fn short_code(&self) -> &'static str {
        match self {
            WorkspaceChangeType::None => "  ",
            WorkspaceChangeType::Untracked => "??",
            WorkspaceChangeType::Modified => " M",
            WorkspaceChangeType::Deleted => " D",
        }
    }
}

impl std::fmt::Display for WorkspaceChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.short_code();
        let colored_code = match self {
            WorkspaceChangeType::None => code.normal(),
            _ => code.red(),
        };

        write!(f, "{colored_code}")
    }
}
