/// Scheduling priority requested for a task's thread.
///
/// Each platform maps the levels onto its own scale; targets without
/// per-thread priorities ignore the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Lowest,
    BelowNormal,
    #[default]
    Normal,
    AboveNormal,
    Highest,
}
