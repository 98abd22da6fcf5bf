//! Call-initiation policy.
//!
//! Exactly one participant must originate the WebRTC handshake; if two
//! participants both created offers at the same time the session would end
//! up in a glare condition the relay does not resolve. The rule: the most
//! recent arrival originates the offer, and only when someone is already
//! waiting in the room. It is evaluated once per join, for the joining
//! connection only — existing members are never re-instructed.

/// Decide whether the connection that just joined must create the offer.
///
/// `existing_members` is the room's membership count *before* the join
/// (the snapshot returned by the registry's `join`).
pub fn should_create_offer(existing_members: usize) -> bool {
    existing_members > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_joiner_never_initiates() {
        // テスト項目: 最初の参加者はオファーを作成しない
        // given (前提条件): 参加前のメンバー数が 0
        // when (操作) / then (期待する結果):
        assert!(!should_create_offer(0));
    }

    #[test]
    fn test_second_joiner_initiates() {
        // テスト項目: 2 人目の参加者がオファーを作成する
        // given (前提条件): 参加前のメンバー数が 1
        // when (操作) / then (期待する結果):
        assert!(should_create_offer(1));
    }

    #[test]
    fn test_later_joiners_also_initiate() {
        // テスト項目: 3 人目以降の参加者にも同じルールが適用される
        // given (前提条件): 参加前のメンバー数が 2 以上
        // when (操作) / then (期待する結果):
        assert!(should_create_offer(2));
        assert!(should_create_offer(7));
    }
}
