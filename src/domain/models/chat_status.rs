#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChatStatus {
    #[default]
    Idle,
    Submitted,
    Streaming,
    Error,
}

impl ChatStatus {
    /// A request is in flight.
    pub fn is_loading(&self) -> bool {
        return *self == ChatStatus::Submitted || *self == ChatStatus::Streaming;
    }
}
