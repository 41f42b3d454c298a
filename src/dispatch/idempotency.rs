// ==========================================
// 待打包订单发运系统 - 幂等键
// ==========================================
// key = SHA-256(客户简称 ␟ 参考号 ␟ UCC1 ␟ UCC2 ...)，小写十六进制
// UCC 顺序参与计算：同一参考号换了托盘组合即视为新的发运
// ==========================================

use crate::domain::ShipmentGroup;
use sha2::{Digest, Sha256};

const FIELD_SEPARATOR: [u8; 1] = [0x1f];

pub fn idempotency_key(client_code: &str, group: &ShipmentGroup) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_code.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(group.referencia.as_bytes());
    for ucc in &group.uccs {
        hasher.update(FIELD_SEPARATOR);
        hasher.update(ucc.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipment::fixtures::row;
    use crate::engine::{group_by_reference, ItemCapacity};

    fn group(uccs: &[&str]) -> ShipmentGroup {
        let rows: Vec<_> = uccs
            .iter()
            .enumerate()
            .map(|(i, u)| row(i + 2, "REF-A", u))
            .collect();
        group_by_reference(&rows, ItemCapacity::Unbounded).remove(0)
    }

    #[test]
    fn test_key_is_stable_and_hex() {
        let key = idempotency_key("SOR", &group(&["U1", "U2"]));

        assert_eq!(key, idempotency_key("SOR", &group(&["U1", "U2"])));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_depends_on_client_and_items() {
        let base = idempotency_key("SOR", &group(&["U1", "U2"]));

        assert_ne!(base, idempotency_key("ABC", &group(&["U1", "U2"])));
        assert_ne!(base, idempotency_key("SOR", &group(&["U2", "U1"])));
        assert_ne!(base, idempotency_key("SOR", &group(&["U1U2"])));
    }
}
