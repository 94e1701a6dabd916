// ==========================================
// 工厂运营追溯核心 - 检查点目录
// ==========================================
// 职责: 检查点定义的外部化配置，加载一次后按名称查找
// 存储: config_kv 表 key = checkpoint_catalog（JSON 数组）
// ==========================================

use crate::domain::checkpoint::CheckpointDefinition;
use serde::{Deserialize, Serialize};

/// 检查点目录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointCatalog {
    definitions: Vec<CheckpointDefinition>,
}

impl CheckpointCatalog {
    /// 由定义列表创建；同名定义以后者为准
    pub fn new(definitions: Vec<CheckpointDefinition>) -> Self {
        let mut catalog = Self::default();
        for def in definitions {
            catalog.upsert(def);
        }
        catalog
    }

    /// 从 JSON 解析
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let definitions: Vec<CheckpointDefinition> = serde_json::from_str(raw)?;
        Ok(Self::new(definitions))
    }

    /// 插入或替换同名定义
    pub fn upsert(&mut self, def: CheckpointDefinition) {
        match self.definitions.iter_mut().find(|d| d.name == def.name) {
            Some(existing) => *existing = def,
            None => self.definitions.push(def),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CheckpointDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn definitions(&self) -> &[CheckpointDefinition] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
