use ue_sip_core::Method;

/// Direction a transaction was created in, from this UE's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Identifies a transaction the way spec.md §4.2 matches messages:
/// Call-ID first, then method/branch/CSeq. ReINVITE is stored under
/// `Method::ReInvite` even though it appears as `INVITE` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionKey {
    pub call_id: String,
    pub direction: Direction,
    pub method: Method,
    pub via_branch: String,
    pub cseq: u32,
}

impl TransactionKey {
    pub fn new(call_id: impl Into<String>, direction: Direction, method: Method, via_branch: impl Into<String>, cseq: u32) -> Self {
        Self { call_id: call_id.into(), direction, method, via_branch: via_branch.into(), cseq }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_different_branches_are_distinct() {
        let a = TransactionKey::new("call-1", Direction::Outbound, Method::Invite, "branch-a", 1);
        let b = TransactionKey::new("call-1", Direction::Outbound, Method::Invite, "branch-b", 1);
        assert_ne!(a, b);
    }
}
