// ==========================================
// 工厂运营追溯核心 - 单件解析器
// ==========================================
// 优先级: SERIAL -> ALIAS -> LABEL_CODE
// 命中即返回，不跨空间合并结果
// ==========================================

use crate::domain::types::IdentifierSpace;
use crate::domain::unit::UnitHandle;
use crate::repository::error::RepositoryResult;
use crate::repository::event_source::EventSource;

/// 单件解析器
pub struct UnitResolver<'a> {
    source: &'a dyn EventSource,
}

impl<'a> UnitResolver<'a> {
    pub fn new(source: &'a dyn EventSource) -> Self {
        Self { source }
    }

    /// 按优先级解析扫描到的标识
    ///
    /// # 返回
    /// - Ok(Some(UnitHandle)): 首个命中的标识空间
    /// - Ok(None): 三个标识空间均未命中
    /// - Err: 事件源失败（不会继续尝试后续空间）
    pub async fn resolve(&self, identifier: &str) -> RepositoryResult<Option<UnitHandle>> {
        for space in IdentifierSpace::PRIORITY {
            let found = match space {
                IdentifierSpace::Serial => self.source.resolve_by_serial(identifier).await?,
                IdentifierSpace::Alias => self.source.resolve_by_alias(identifier).await?,
                IdentifierSpace::LabelCode => self.source.resolve_by_label_code(identifier).await?,
            };

            match found {
                Some(record) => {
                    tracing::info!(
                        identifier,
                        unit_id = %record.unit_id,
                        space = %space,
                        "单件解析成功"
                    );
                    return Ok(Some(record.into_handle(space, identifier)));
                }
                None => tracing::debug!(identifier, space = %space, "标识空间未命中"),
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::UnitRecord;
    use crate::repository::MemoryEventSource;

    fn record(unit_id: &str) -> UnitRecord {
        UnitRecord {
            unit_id: unit_id.to_string(),
            material_ref: Some("MDL-X".to_string()),
        }
    }

    #[tokio::test]
    async fn test_serial_wins_over_alias_and_label() {
        let source = MemoryEventSource::new();
        source.add_serial("CODE-1", record("U-SERIAL")).unwrap();
        source.add_alias("CODE-1", record("U-ALIAS")).unwrap();
        source.add_label_code("CODE-1", record("U-LABEL")).unwrap();

        let handle = UnitResolver::new(&source).resolve("CODE-1").await.unwrap().unwrap();
        assert_eq!(handle.unit_id, "U-SERIAL");
        assert_eq!(handle.matched_space, IdentifierSpace::Serial);
        // 命中后不再查询后续空间
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_label_code() {
        let source = MemoryEventSource::new();
        source.add_label_code("LBL-77", record("U-9")).unwrap();

        let handle = UnitResolver::new(&source).resolve("LBL-77").await.unwrap().unwrap();
        assert_eq!(handle.unit_id, "U-9");
        assert_eq!(handle.matched_space, IdentifierSpace::LabelCode);
        assert_eq!(handle.matched_identifier, "LBL-77");
    }

    #[tokio::test]
    async fn test_unknown_identifier_resolves_to_none() {
        let source = MemoryEventSource::new();
        source.add_serial("SN-1", record("U-1")).unwrap();
        assert!(UnitResolver::new(&source).resolve("SN-404").await.unwrap().is_none());
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_source_failure_is_not_treated_as_not_found() {
        let source = MemoryEventSource::new();
        source.fail_all(true);
        assert!(UnitResolver::new(&source).resolve("SN-1").await.is_err());
    }
}
