/// Errors from [`GlobIndex`](crate::GlobIndex) maintenance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlobIndexError {
    /// The value is stored under a node with an all-digit label, but that
    /// node's numbered bucket does not hold it. Happens when the node was
    /// created by splitting another node.
    #[error("value under key {key:?} is missing from its numbered bucket")]
    NumberedValueMissing { key: String },
}
