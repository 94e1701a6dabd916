// ==========================================
// 工厂运营追溯核心 - 单件领域模型
// ==========================================
// 单件身份创建后不可变，事件只引用不拥有
// ==========================================

use crate::domain::types::IdentifierSpace;
use serde::{Deserialize, Serialize};

// ==========================================
// UnitHandle - 已解析的单件句柄
// ==========================================
/// 单件句柄
///
/// 只能由 `UnitResolver` 成功解析后得到，因此时间线重建永远不会拿到空句柄。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitHandle {
    pub unit_id: String,                 // 内部ID
    pub material_ref: Option<String>,    // 物料/型号
    pub matched_space: IdentifierSpace,  // 命中的标识空间
    pub matched_identifier: String,      // 命中的外部标识
}

// ==========================================
// UnitRecord - 事件源返回的单件记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub unit_id: String,
    pub material_ref: Option<String>,
}

impl UnitRecord {
    /// 绑定命中的标识空间，生成句柄
    pub fn into_handle(self, space: IdentifierSpace, identifier: &str) -> UnitHandle {
        UnitHandle {
            unit_id: self.unit_id,
            material_ref: self.material_ref,
            matched_space: space,
            matched_identifier: identifier.to_string(),
        }
    }
}
