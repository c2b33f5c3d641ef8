/// Session/dialog lifecycle state. Every pending state (`Being*`) has a
/// corresponding finalized state reached by stripping the `Being` prefix;
/// [`SessionState::finalize`] implements that mapping directly rather
/// than via string manipulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    NotSet,
    BeingEstablished,
    Established,
    BeingCleared,
    Cleared,
    BeingRejected,
    Rejected,
    BeingCancelled,
    Cancelled,
    BeingFailed,
    Failed,
    BeingDenied,
    Denied,
    BeingDropped,
    Dropped,
    BeingRedirected,
    Redirected,
    BeingReferred,
    Referred,
    BeingNeglected,
    Neglected,
    BeingProbed,
    Probed,
    TimedOut,
    BeingRegistered,
    BeingUnregistered,
    Registered,
    Unregistered,
}

impl SessionState {
    /// Strip the pending `Being` prefix, per spec.md §3's `FinalizeMe` map.
    pub const fn finalize(self) -> Self {
        match self {
            Self::BeingEstablished => Self::Established,
            Self::BeingCleared => Self::Cleared,
            Self::BeingRejected => Self::Rejected,
            Self::BeingCancelled => Self::Cancelled,
            Self::BeingFailed => Self::Failed,
            Self::BeingDenied => Self::Denied,
            Self::BeingDropped => Self::Dropped,
            Self::BeingRedirected => Self::Redirected,
            Self::BeingReferred => Self::Referred,
            Self::BeingNeglected => Self::Neglected,
            Self::BeingProbed => Self::Probed,
            Self::BeingRegistered => Self::Registered,
            Self::BeingUnregistered => Self::Unregistered,
            other => other,
        }
    }

    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::BeingEstablished
                | Self::BeingCleared
                | Self::BeingRejected
                | Self::BeingCancelled
                | Self::BeingFailed
                | Self::BeingDenied
                | Self::BeingDropped
                | Self::BeingRedirected
                | Self::BeingReferred
                | Self::BeingNeglected
                | Self::BeingProbed
                | Self::BeingRegistered
                | Self::BeingUnregistered
        )
    }

    pub const fn is_finalized(self) -> bool {
        !self.is_pending()
    }
}
